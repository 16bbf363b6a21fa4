#![allow(dead_code)]

use std::sync::Arc;

use lumen_core::gltf::{
    ComponentType, ElementType, GltfAccessor, GltfBuffer, GltfBufferView, GltfCamera, GltfData,
    GltfLight, GltfLightKind, GltfMaterial, GltfMesh, GltfNode, GltfNodeTransform,
    GltfPrimitive, GltfProjection, GltfScene,
};
use lumen_core::math::{Aabb, Vec3};
use lumen_ecs::{Entity, NodeComponent, TransformComponent, World, WorldMatrixComponent};
use lumen_graphics::data_store::RenderDataStoreManager;
use lumen_graphics::dummy::{
    DummyGpuResourceManager, DummyRenderNodeGraphManager, DummyShaderManager,
};
use lumen_graphics::render_data::{
    RenderCamera, RenderLight, RenderScene, RenderSubmesh, SceneRenderDataStoreNames,
};
use lumen_scene::components::{MeshComponent, Submesh, register_scene_components};
use lumen_scene::render_system::{RenderContext, RenderSystem, RenderSystemConfig};
use parking_lot::Mutex;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Render system wired to dummy backends, with handles to inspect them.
pub struct Harness {
    pub system: RenderSystem,
    pub gpu: Arc<DummyGpuResourceManager>,
    pub shaders: Arc<DummyShaderManager>,
    pub graphs: Arc<DummyRenderNodeGraphManager>,
    pub stores: Arc<Mutex<RenderDataStoreManager>>,
    pub names: SceneRenderDataStoreNames,
}

impl Harness {
    pub fn new(config: RenderSystemConfig) -> Self {
        init_logger();
        let names = config.data_store_names.clone();
        let gpu = Arc::new(DummyGpuResourceManager::new());
        let shaders = Arc::new(DummyShaderManager::new());
        let graphs = Arc::new(DummyRenderNodeGraphManager::new());
        let stores = Arc::new(Mutex::new(RenderDataStoreManager::with_default_stores(
            &names,
        )));
        let system = RenderSystem::new(
            RenderContext {
                gpu: gpu.clone(),
                shaders: shaders.clone(),
                render_node_graphs: graphs.clone(),
                data_stores: Arc::clone(&stores),
            },
            config,
        );
        Self {
            system,
            gpu,
            shaders,
            graphs,
            stores,
            names,
        }
    }

    /// Runs one queued frame and asserts it was extracted.
    pub fn frame(&mut self, world: &World) {
        assert!(self.system.update(world, true, 0, 16_000));
    }

    pub fn cameras(&self) -> Vec<RenderCamera> {
        let stores = self.stores.lock();
        stores
            .camera_store(&self.names.camera)
            .map(|s| s.cameras().to_vec())
            .unwrap_or_default()
    }

    pub fn lights(&self) -> Vec<RenderLight> {
        let stores = self.stores.lock();
        stores
            .light_store(&self.names.light)
            .map(|s| s.lights().to_vec())
            .unwrap_or_default()
    }

    pub fn submeshes(&self) -> Vec<RenderSubmesh> {
        let stores = self.stores.lock();
        stores
            .material_store(&self.names.material)
            .map(|s| s.submeshes().to_vec())
            .unwrap_or_default()
    }

    pub fn mesh_data_count(&self) -> usize {
        let stores = self.stores.lock();
        stores
            .material_store(&self.names.material)
            .map_or(0, |s| s.mesh_data().len())
    }

    pub fn material_ids(&self) -> Vec<u64> {
        let stores = self.stores.lock();
        stores
            .material_store(&self.names.material)
            .map(|s| s.materials().iter().map(|m| m.data.id).collect())
            .unwrap_or_default()
    }

    pub fn scene(&self) -> RenderScene {
        let stores = self.stores.lock();
        stores
            .scene_store(&self.names.scene)
            .map(|s| s.scene().clone())
            .unwrap_or_default()
    }

    /// Camera id each ordered render node graph of the last frame renders,
    /// `None` for the scene graph.
    pub fn graph_cameras(&self) -> Vec<Option<u64>> {
        let created = self.graphs.created();
        self.scene()
            .render_node_graphs
            .iter()
            .map(|graph| created[graph.handle().index() as usize].camera_id)
            .collect()
    }
}

pub fn world() -> World {
    let mut world = World::new();
    register_scene_components(&mut world);
    world
}

/// Root node at `position` with its world matrix already resolved.
pub fn spawn_node(world: &mut World, position: Vec3) -> Entity {
    let entity = world.spawn();
    let transform = TransformComponent::from_position(position);
    world.insert(entity, NodeComponent::default()).unwrap();
    world
        .insert(
            entity,
            WorldMatrixComponent {
                matrix: transform.to_matrix(),
            },
        )
        .unwrap();
    world.insert(entity, transform).unwrap();
    entity
}

pub fn unit_box() -> Aabb {
    Aabb::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0))
}

/// Mesh resource entity with one unit-box submesh per material.
pub fn spawn_mesh(world: &mut World, materials: &[Option<Entity>]) -> Entity {
    let submeshes = materials
        .iter()
        .map(|&material| Submesh::new(unit_box(), 36, material))
        .collect();
    let entity = world.spawn();
    world
        .insert(entity, MeshComponent::from_submeshes(submeshes))
        .unwrap();
    entity
}

/// In-memory glTF asset whose accessors all live in one embedded buffer.
pub struct AssetBuilder {
    pub data: GltfData,
    bytes: Vec<u8>,
}

impl AssetBuilder {
    pub fn new(filepath: &str) -> Self {
        Self {
            data: GltfData::new(filepath),
            bytes: Vec::new(),
        }
    }

    /// Appends `bytes` as a new buffer view and returns its index.
    pub fn view(&mut self, bytes: &[u8]) -> usize {
        while self.bytes.len() % 4 != 0 {
            self.bytes.push(0);
        }
        self.data.buffer_views.push(GltfBufferView {
            buffer: 0,
            byte_offset: self.bytes.len(),
            byte_length: bytes.len(),
            byte_stride: None,
        });
        self.bytes.extend_from_slice(bytes);
        self.data.buffer_views.len() - 1
    }

    pub fn floats(&mut self, values: &[f32], element_type: ElementType) -> usize {
        let view = self.view(bytemuck::cast_slice(values));
        self.data.accessors.push(GltfAccessor {
            buffer_view: Some(view),
            component_type: ComponentType::Float,
            element_type,
            count: values.len() / element_type.component_count(),
            ..Default::default()
        });
        self.data.accessors.len() - 1
    }

    pub fn indices(&mut self, values: &[u16]) -> usize {
        let view = self.view(bytemuck::cast_slice(values));
        self.data.accessors.push(GltfAccessor {
            buffer_view: Some(view),
            component_type: ComponentType::UnsignedShort,
            element_type: ElementType::Scalar,
            count: values.len(),
            ..Default::default()
        });
        self.data.accessors.len() - 1
    }

    pub fn finish(mut self) -> GltfData {
        self.data.buffers.push(GltfBuffer {
            uri: None,
            byte_length: self.bytes.len(),
            data: Some(Arc::from(self.bytes.as_slice())),
        });
        self.data
    }
}

/// One mesh with two triangle submeshes using materials 0 and 1, a
/// directional light and a perspective camera, all in scene 0. `indices` is
/// the index list of the second submesh.
pub fn scene_asset(indices: &[u16]) -> GltfData {
    let mut builder = AssetBuilder::new("mem/scene.gltf");
    let positions = builder.floats(
        &[
            -1.0, -1.0, 0.0, //
            1.0, -1.0, 0.0, //
            1.0, 1.0, 0.0, //
            -1.0, 1.0, 0.0,
        ],
        ElementType::Vec3,
    );
    let first = builder.indices(&[0, 1, 2]);
    let second = builder.indices(indices);
    let mut data = builder.finish();

    for color in [[1.0, 0.0, 0.0, 1.0], [0.0, 0.0, 1.0, 1.0]] {
        data.materials.push(GltfMaterial {
            base_color_factor: color,
            ..Default::default()
        });
    }
    let primitive = |indices, material| GltfPrimitive {
        position: Some(positions),
        indices: Some(indices),
        material: Some(material),
        ..Default::default()
    };
    data.meshes.push(GltfMesh {
        name: Some("quad".into()),
        primitives: vec![primitive(first, 0), primitive(second, 1)],
        weights: Vec::new(),
    });
    data.lights.push(GltfLight {
        name: Some("sun".into()),
        kind: GltfLightKind::Directional,
        color: [1.0, 1.0, 1.0],
        intensity: 2.0,
        range: None,
    });
    data.cameras.push(GltfCamera {
        name: Some("view".into()),
        projection: GltfProjection::Perspective {
            yfov: 1.0,
            aspect_ratio: None,
            znear: 0.1,
            zfar: Some(100.0),
        },
    });

    let at = |z: f32| GltfNodeTransform::Trs {
        translation: [0.0, 0.0, z],
        rotation: [0.0, 0.0, 0.0, 1.0],
        scale: [1.0; 3],
    };
    data.nodes.push(GltfNode {
        name: Some("quad".into()),
        mesh: Some(0),
        transform: at(0.0),
        ..Default::default()
    });
    data.nodes.push(GltfNode {
        name: Some("sun".into()),
        light: Some(0),
        transform: at(10.0),
        ..Default::default()
    });
    data.nodes.push(GltfNode {
        name: Some("view".into()),
        camera: Some(0),
        transform: at(5.0),
        ..Default::default()
    });
    data.scenes.push(GltfScene {
        name: Some("main".into()),
        nodes: vec![0, 1, 2],
    });
    data
}
