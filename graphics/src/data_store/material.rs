use std::collections::HashMap;

use lumen_core::math::Mat4;

use crate::handle::RenderHandleReference;
use crate::render_data::{RenderMaterial, RenderMeshData, RenderSkinJointMatrices, RenderSubmesh};

use super::MaterialDataStore;

/// In-memory [`MaterialDataStore`].
#[derive(Debug, Default)]
pub struct DefaultMaterialDataStore {
    name: String,
    mesh_data: Vec<RenderMeshData>,
    submeshes: Vec<RenderSubmesh>,
    skin_joints: Vec<RenderSkinJointMatrices>,
    materials: Vec<RenderMaterial>,
    material_ids: HashMap<u64, u32>,
    custom_resources: Vec<Vec<RenderHandleReference>>,
    custom_resource_ids: HashMap<u64, u32>,
}

impl DefaultMaterialDataStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl MaterialDataStore for DefaultMaterialDataStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn clear(&mut self) {
        self.mesh_data.clear();
        self.submeshes.clear();
        self.skin_joints.clear();
        self.materials.clear();
        self.material_ids.clear();
        self.custom_resources.clear();
        self.custom_resource_ids.clear();
    }

    fn add_mesh_data(&mut self, mesh_data: RenderMeshData) -> u32 {
        self.mesh_data.push(mesh_data);
        (self.mesh_data.len() - 1) as u32
    }

    fn mesh_data(&self) -> &[RenderMeshData] {
        &self.mesh_data
    }

    fn add_submesh(&mut self, submesh: RenderSubmesh) {
        self.submeshes.push(submesh);
    }

    fn submeshes(&self) -> &[RenderSubmesh] {
        &self.submeshes
    }

    fn add_skin_joint_matrices(&mut self, matrices: &[Mat4], prev_matrices: &[Mat4]) -> u32 {
        self.skin_joints.push(RenderSkinJointMatrices {
            matrices: matrices.to_vec(),
            prev_matrices: prev_matrices.to_vec(),
        });
        (self.skin_joints.len() - 1) as u32
    }

    fn skin_joint_matrices(&self) -> &[RenderSkinJointMatrices] {
        &self.skin_joints
    }

    fn add_material_data(&mut self, material: RenderMaterial) -> u32 {
        if let Some(&index) = self.material_ids.get(&material.data.id) {
            return index;
        }
        let id = material.data.id;
        let index = self.add_material_instance_data(material);
        self.material_ids.insert(id, index);
        index
    }

    fn add_material_instance_data(&mut self, material: RenderMaterial) -> u32 {
        let id = material.data.id;
        self.materials.push(material);
        let index = (self.materials.len() - 1) as u32;
        self.material_ids.entry(id).or_insert(index);
        index
    }

    fn material_index(&self, id: u64) -> Option<u32> {
        self.material_ids.get(&id).copied()
    }

    fn materials(&self) -> &[RenderMaterial] {
        &self.materials
    }

    fn add_material_custom_resources(
        &mut self,
        id: u64,
        resources: Vec<RenderHandleReference>,
    ) -> u32 {
        if let Some(&index) = self.custom_resource_ids.get(&id) {
            return index;
        }
        self.custom_resources.push(resources);
        let index = (self.custom_resources.len() - 1) as u32;
        self.custom_resource_ids.insert(id, index);
        index
    }

    fn material_custom_resource_index(&self, id: u64) -> Option<u32> {
        self.custom_resource_ids.get(&id).copied()
    }

    fn material_custom_resources(&self) -> &[Vec<RenderHandleReference>] {
        &self.custom_resources
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_data::RenderMaterialData;

    fn material(id: u64) -> RenderMaterial {
        RenderMaterial {
            data: RenderMaterialData {
                id,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn materials_dedup_by_id() {
        let mut store = DefaultMaterialDataStore::new("materials");
        let a = store.add_material_data(material(7));
        let b = store.add_material_data(material(9));
        assert_eq!(store.add_material_data(material(7)), a);
        assert_ne!(a, b);
        assert_eq!(store.materials().len(), 2);
    }

    #[test]
    fn instance_data_always_appends() {
        let mut store = DefaultMaterialDataStore::new("materials");
        let first = store.add_material_data(material(3));
        let second = store.add_material_instance_data(material(3));
        assert_ne!(first, second);
        assert_eq!(store.material_index(3), Some(first));
    }

    #[test]
    fn clear_resets_indices() {
        let mut store = DefaultMaterialDataStore::new("materials");
        store.add_material_data(material(1));
        store.clear();
        assert_eq!(store.material_index(1), None);
        assert_eq!(store.add_material_data(material(2)), 0);
    }
}
