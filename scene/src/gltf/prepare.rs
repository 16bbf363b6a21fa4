//! Task graph construction.
//!
//! One builder per resource kind. A source index whose synthesized uri is
//! already present in the world is bound to the existing entity and gets no
//! task; everything else becomes a task tagged with the phase its kind runs
//! in.

use std::collections::HashMap;
use std::sync::Arc;

use lumen_core::gltf::{
    DecodedImage, GltfAnimationPath, GltfData, GltfInterpolation, resolve_buffers,
};
use lumen_core::math::Mat4;
use lumen_ecs::{Entity, NameComponent};
use lumen_graphics::render_data::{IndexBufferBinding, VertexBufferBinding};
use lumen_graphics::{
    BufferUsage, Format, GpuBufferDesc, GpuImageDesc, ImageUsage, RenderHandleReference,
};
use lumen_graphics::types::full_mip_count;

use super::conversions::{
    DEPTH_SHADER_PATH, MATERIAL_SHADER_PATH, convert_material, material_graphics_state,
    sampler_desc,
};
use super::gather::{
    GatheredCubemap, GatheredMesh, KeyframeData, gather_cubemap, gather_image, gather_keyframes,
    gather_mesh, gather_skin,
};
use super::importer::ImportFlags;
use super::result::{GltfImportResult, ImportError, TextureBinding};
use super::tasks::{ImportContext, ImportPhase, Slot, TaskList, gather_fn, import_fn, slot};
use super::{ResourceKind, resource_uri};
use crate::components::{
    AnimationComponent, AnimationInputComponent, AnimationInterpolation, AnimationOutputComponent,
    AnimationPath, AnimationTrackComponent, MaterialShaderRef, MeshComponent,
    RenderHandleComponent, SkinIbmComponent, Submesh,
};

type Buffers = Slot<Vec<Arc<[u8]>>>;

/// Inputs shared by every builder.
pub(crate) struct Preparation<'a> {
    pub data: Arc<GltfData>,
    pub flags: ImportFlags,
    pub resources_name: &'a str,
    /// Entities already carrying a uri, by uri.
    pub existing: &'a HashMap<String, Entity>,
}

impl Preparation<'_> {
    fn uri(&self, kind: ResourceKind, index: usize) -> String {
        resource_uri(&self.data.filepath, self.resources_name, kind, index)
    }

    /// Builds every task the flags ask for and binds reused entities into
    /// `result`.
    pub fn build(&self, result: &mut GltfImportResult) -> TaskList {
        let mut tasks = TaskList::default();
        let buffers = self.buffers_task(&mut tasks);
        if self.flags.contains(ImportFlags::SAMPLERS) {
            self.sampler_tasks(&mut tasks, result);
        }
        if self.flags.contains(ImportFlags::IMAGES) {
            self.image_tasks(&mut tasks, result, &buffers);
        }
        if self.flags.contains(ImportFlags::SPECULAR_RADIANCE_CUBEMAPS) {
            self.cubemap_tasks(&mut tasks, result, &buffers);
        }
        if self.flags.contains(ImportFlags::TEXTURES) {
            self.texture_tasks(&mut tasks);
        }
        if self.flags.contains(ImportFlags::MATERIALS) {
            self.material_tasks(&mut tasks, result);
        }
        if self.flags.contains(ImportFlags::ANIMATIONS) {
            self.animation_tasks(&mut tasks, result, &buffers);
        }
        if self.flags.contains(ImportFlags::SKINS) {
            self.skin_tasks(&mut tasks, result, &buffers);
        }
        if self.flags.contains(ImportFlags::MESHES) {
            self.mesh_tasks(&mut tasks, result, &buffers);
        }
        tasks
    }

    /// Slot of the resolved buffers, filled by a task only when a requested
    /// kind reads buffer data.
    fn buffers_task(&self, tasks: &mut TaskList) -> Buffers {
        let buffers: Buffers = slot();
        if !self.flags.intersects(ImportFlags::BUFFER_READERS) {
            return buffers;
        }
        let data = Arc::clone(&self.data);
        let output = Arc::clone(&buffers);
        let gather = gather_fn(move || {
            let resolved =
                resolve_buffers(&data).map_err(|e| ImportError::gltf("buffers", e))?;
            let _ = output.set(resolved);
            Ok(())
        });
        tasks.push("buffers", ImportPhase::Buffers, Some(gather), None);
        buffers
    }

    fn sampler_tasks(&self, tasks: &mut TaskList, result: &mut GltfImportResult) {
        for (index, sampler) in self.data.samplers.iter().enumerate() {
            let uri = self.uri(ResourceKind::Sampler, index);
            if let Some(&entity) = self.existing.get(&uri) {
                result.samplers[index] = Some(entity);
                continue;
            }
            let desc = sampler_desc(sampler);
            let name = sampler.name.clone();
            let import = import_fn(move |ctx| {
                let handle = ctx
                    .gpu
                    .create_sampler(&uri, &desc)
                    .map_err(|e| ImportError::gpu(format!("sampler {index}"), e))?;
                let entity = spawn_with_handle(ctx, &uri, name.as_deref(), handle)?;
                ctx.result.samplers[index] = Some(entity);
                Ok(())
            });
            tasks.push(resource_name("sampler", index), ImportPhase::Samplers, None, Some(import));
        }
    }

    fn image_tasks(&self, tasks: &mut TaskList, result: &mut GltfImportResult, buffers: &Buffers) {
        for (index, image) in self.data.images.iter().enumerate() {
            let uri = self.uri(ResourceKind::Image, index);
            if let Some(&entity) = self.existing.get(&uri) {
                result.images[index] = Some(entity);
                continue;
            }
            let decoded: Slot<DecodedImage> = slot();
            let gather = {
                let data = Arc::clone(&self.data);
                let buffers = Arc::clone(buffers);
                let decoded = Arc::clone(&decoded);
                gather_fn(move || {
                    let resource = format!("image {index}");
                    let buffers = buffers
                        .get()
                        .ok_or_else(|| ImportError::missing(&resource, "buffers"))?;
                    let image = gather_image(&data, buffers, index)
                        .map_err(|e| ImportError::gltf(&resource, e))?;
                    let _ = decoded.set(image);
                    Ok(())
                })
            };
            let name = image.name.clone();
            let import = import_fn(move |ctx| {
                let resource = format!("image {index}");
                let image = decoded
                    .get()
                    .ok_or_else(|| ImportError::missing(&resource, "decoded pixels"))?;
                let desc = GpuImageDesc::new_2d(image.width, image.height, Format::R8G8B8A8Unorm)
                    .with_mip_count(full_mip_count(image.width, image.height))
                    .with_usage(
                        ImageUsage::SAMPLED | ImageUsage::TRANSFER_DST | ImageUsage::TRANSFER_SRC,
                    );
                let handle = ctx
                    .gpu
                    .create_image_with_data(&uri, &desc, &image.pixels)
                    .map_err(|e| ImportError::gpu(&resource, e))?;
                let entity = spawn_with_handle(ctx, &uri, name.as_deref(), handle)?;
                ctx.result.images[index] = Some(entity);
                Ok(())
            });
            tasks.push(
                resource_name("image", index),
                ImportPhase::Images,
                Some(gather),
                Some(import),
            );
        }
    }

    fn cubemap_tasks(
        &self,
        tasks: &mut TaskList,
        result: &mut GltfImportResult,
        buffers: &Buffers,
    ) {
        for (index, light) in self.data.image_based_lights.iter().enumerate() {
            let uri = self.uri(ResourceKind::Cubemap, index);
            if let Some(&entity) = self.existing.get(&uri) {
                result.specular_radiance_cubemaps[index] = Some(entity);
                continue;
            }
            let faces: Slot<GatheredCubemap> = slot();
            let gather = {
                let data = Arc::clone(&self.data);
                let buffers = Arc::clone(buffers);
                let faces = Arc::clone(&faces);
                gather_fn(move || {
                    let resource = format!("cubemap {index}");
                    let buffers = buffers
                        .get()
                        .ok_or_else(|| ImportError::missing(&resource, "buffers"))?;
                    let cubemap = gather_cubemap(&data, buffers, index)
                        .map_err(|e| ImportError::gltf(&resource, e))?;
                    let _ = faces.set(cubemap);
                    Ok(())
                })
            };
            let name = light.name.clone();
            let import = import_fn(move |ctx| {
                let resource = format!("cubemap {index}");
                let cubemap = faces
                    .get()
                    .ok_or_else(|| ImportError::missing(&resource, "decoded faces"))?;
                let desc = GpuImageDesc::new_cube(cubemap.size, Format::R8G8B8A8Unorm)
                    .with_mip_count(cubemap.mip_count)
                    .with_usage(ImageUsage::SAMPLED | ImageUsage::TRANSFER_DST);
                let handle = ctx
                    .gpu
                    .create_image_with_data(&uri, &desc, &cubemap.pixels)
                    .map_err(|e| ImportError::gpu(&resource, e))?;
                let entity = spawn_with_handle(ctx, &uri, name.as_deref(), handle)?;
                ctx.result.specular_radiance_cubemaps[index] = Some(entity);
                Ok(())
            });
            tasks.push(
                resource_name("cubemap", index),
                ImportPhase::Images,
                Some(gather),
                Some(import),
            );
        }
    }

    /// Texture bindings are always rebuilt; an image or sampler that is
    /// missing leaves its half of the binding empty.
    fn texture_tasks(&self, tasks: &mut TaskList) {
        for (index, texture) in self.data.textures.iter().enumerate() {
            let (image, sampler) = (texture.image, texture.sampler);
            let import = import_fn(move |ctx| {
                let binding = TextureBinding {
                    image: entity_at(&ctx.result.images, image),
                    sampler: entity_at(&ctx.result.samplers, sampler),
                };
                if image.is_some() && binding.image.is_none() {
                    log::debug!("glTF import: texture {index} has no image");
                }
                ctx.result.textures[index] = binding;
                Ok(())
            });
            tasks.push(resource_name("texture", index), ImportPhase::Textures, None, Some(import));
        }
    }

    fn material_tasks(&self, tasks: &mut TaskList, result: &mut GltfImportResult) {
        for (index, material) in self.data.materials.iter().enumerate() {
            let uri = self.uri(ResourceKind::Material, index);
            if let Some(&entity) = self.existing.get(&uri) {
                result.materials[index] = Some(entity);
                continue;
            }
            let data = Arc::clone(&self.data);
            let name = material.name.clone();
            let import = import_fn(move |ctx| {
                let source = &data.materials[index];
                let mut component = convert_material(source, &ctx.result.textures);
                component.material_shader = MaterialShaderRef {
                    shader: ctx.handle_entity(MATERIAL_SHADER_PATH, |s, p| s.shader(p))?,
                    graphics_state: ctx
                        .handle_entity(material_graphics_state(source), |s, p| {
                            s.graphics_state(p)
                        })?,
                };
                component.depth_shader = MaterialShaderRef {
                    shader: ctx.handle_entity(DEPTH_SHADER_PATH, |s, p| s.shader(p))?,
                    graphics_state: None,
                };
                let entity = ctx.spawn_resource(&uri, name.as_deref())?;
                ctx.world.insert(entity, component)?;
                ctx.result.materials[index] = Some(entity);
                Ok(())
            });
            tasks.push(
                resource_name("material", index),
                ImportPhase::Materials,
                None,
                Some(import),
            );
        }
    }

    fn animation_tasks(
        &self,
        tasks: &mut TaskList,
        result: &mut GltfImportResult,
        buffers: &Buffers,
    ) {
        let mut keyframes: HashMap<(usize, KeyframeRole), Slot<Entity>> = HashMap::new();
        for (index, animation) in self.data.animations.iter().enumerate() {
            let uri = self.uri(ResourceKind::Animation, index);
            if let Some(&entity) = self.existing.get(&uri) {
                result.animations[index] = Some(entity);
                continue;
            }

            let mut samplers = Vec::with_capacity(animation.samplers.len());
            for sampler in &animation.samplers {
                let input = self.keyframe_task(
                    tasks,
                    &mut keyframes,
                    buffers,
                    sampler.input,
                    KeyframeRole::Input,
                );
                let output = self.keyframe_task(
                    tasks,
                    &mut keyframes,
                    buffers,
                    sampler.output,
                    KeyframeRole::Output,
                );
                samplers.push((input, output, animation_interpolation(sampler.interpolation)));
            }

            let data = Arc::clone(&self.data);
            let import = import_fn(move |ctx| {
                let resource = format!("animation {index}");
                let source = &data.animations[index];
                let name = source.name.clone().unwrap_or_else(|| uri.clone());
                let mut tracks = Vec::with_capacity(source.channels.len());
                let mut duration = 0.0f32;
                for (channel_index, channel) in source.channels.iter().enumerate() {
                    let (input, output, interpolation) =
                        samplers.get(channel.sampler).ok_or_else(|| {
                            ImportError::missing(&resource, format!("sampler {}", channel.sampler))
                        })?;
                    let input = *input.get().ok_or_else(|| {
                        ImportError::missing(
                            &resource,
                            format!("keyframe times of channel {channel_index}"),
                        )
                    })?;
                    let output = *output.get().ok_or_else(|| {
                        ImportError::missing(
                            &resource,
                            format!("keyframe values of channel {channel_index}"),
                        )
                    })?;
                    if let Some(times) = ctx.world.read::<AnimationInputComponent>()?.get(input) {
                        duration = times.timestamps.iter().copied().fold(duration, f32::max);
                    }
                    let track = ctx.world.spawn();
                    ctx.world.insert(
                        track,
                        NameComponent::new(format!("{name}/track {channel_index}")),
                    )?;
                    ctx.world.insert(
                        track,
                        AnimationTrackComponent {
                            target_node: channel.target_node,
                            target: None,
                            path: animation_path(channel.path),
                            interpolation: *interpolation,
                            input,
                            output,
                        },
                    )?;
                    tracks.push(track);
                }
                let entity = ctx.spawn_resource(&uri, Some(&name))?;
                ctx.world.insert(
                    entity,
                    AnimationComponent {
                        name,
                        tracks,
                        duration,
                    },
                )?;
                ctx.result.animations[index] = Some(entity);
                Ok(())
            });
            tasks.push(
                resource_name("animation", index),
                ImportPhase::Animations,
                None,
                Some(import),
            );
        }
    }

    /// Keyframe entity slot of `accessor`, shared by every sampler reading
    /// it in the same role.
    fn keyframe_task(
        &self,
        tasks: &mut TaskList,
        keyframes: &mut HashMap<(usize, KeyframeRole), Slot<Entity>>,
        buffers: &Buffers,
        accessor: usize,
        role: KeyframeRole,
    ) -> Slot<Entity> {
        if let Some(entity) = keyframes.get(&(accessor, role)) {
            return Arc::clone(entity);
        }
        let entity: Slot<Entity> = slot();
        keyframes.insert((accessor, role), Arc::clone(&entity));

        let uri = self.uri(role.kind(), accessor);
        if let Some(&existing) = self.existing.get(&uri) {
            let _ = entity.set(existing);
            return entity;
        }

        let decoded: Slot<KeyframeData> = slot();
        let gather = {
            let data = Arc::clone(&self.data);
            let buffers = Arc::clone(buffers);
            let decoded = Arc::clone(&decoded);
            gather_fn(move || {
                let resource = format!("keyframes {accessor}");
                let buffers = buffers
                    .get()
                    .ok_or_else(|| ImportError::missing(&resource, "buffers"))?;
                let keyframes = gather_keyframes(&data, buffers, accessor)
                    .map_err(|e| ImportError::gltf(&resource, e))?;
                let _ = decoded.set(keyframes);
                Ok(())
            })
        };
        let output = Arc::clone(&entity);
        let import = import_fn(move |ctx| {
            let keyframes = decoded.get().ok_or_else(|| {
                ImportError::missing(format!("keyframes {accessor}"), "decoded values")
            })?;
            let spawned = ctx.spawn_resource(&uri, None)?;
            match role {
                KeyframeRole::Input => ctx.world.insert(
                    spawned,
                    AnimationInputComponent {
                        timestamps: keyframes.values.clone(),
                    },
                )?,
                KeyframeRole::Output => ctx.world.insert(
                    spawned,
                    AnimationOutputComponent {
                        components: keyframes.components,
                        values: keyframes.values.clone(),
                    },
                )?,
            }
            let _ = output.set(spawned);
            Ok(())
        });
        tasks.push(
            format!("{} {accessor}", role.kind().as_str()),
            ImportPhase::AnimationSamplers,
            Some(gather),
            Some(import),
        );
        entity
    }

    fn skin_tasks(&self, tasks: &mut TaskList, result: &mut GltfImportResult, buffers: &Buffers) {
        for (index, skin) in self.data.skins.iter().enumerate() {
            let uri = self.uri(ResourceKind::Skin, index);
            if let Some(&entity) = self.existing.get(&uri) {
                result.skins[index] = Some(entity);
                continue;
            }
            let matrices: Slot<Vec<Mat4>> = slot();
            let gather = {
                let data = Arc::clone(&self.data);
                let buffers = Arc::clone(buffers);
                let matrices = Arc::clone(&matrices);
                gather_fn(move || {
                    let resource = format!("skin {index}");
                    let buffers = buffers
                        .get()
                        .ok_or_else(|| ImportError::missing(&resource, "buffers"))?;
                    let ibm = gather_skin(&data, buffers, index)
                        .map_err(|e| ImportError::gltf(&resource, e))?;
                    let _ = matrices.set(ibm);
                    Ok(())
                })
            };
            let name = skin.name.clone();
            let joint_nodes = skin.joints.clone();
            let import = import_fn(move |ctx| {
                let matrices = matrices.get().ok_or_else(|| {
                    ImportError::missing(format!("skin {index}"), "inverse bind matrices")
                })?;
                let entity = ctx.spawn_resource(&uri, name.as_deref())?;
                ctx.world.insert(
                    entity,
                    SkinIbmComponent {
                        matrices: matrices.clone(),
                        joint_nodes,
                    },
                )?;
                ctx.result.skins[index] = Some(entity);
                Ok(())
            });
            tasks.push(
                resource_name("skin", index),
                ImportPhase::Skins,
                Some(gather),
                Some(import),
            );
        }
    }

    fn mesh_tasks(&self, tasks: &mut TaskList, result: &mut GltfImportResult, buffers: &Buffers) {
        for (index, mesh) in self.data.meshes.iter().enumerate() {
            let uri = self.uri(ResourceKind::Mesh, index);
            if let Some(&entity) = self.existing.get(&uri) {
                result.meshes[index] = Some(entity);
                continue;
            }
            let gathered: Slot<GatheredMesh> = slot();
            let gather = {
                let data = Arc::clone(&self.data);
                let buffers = Arc::clone(buffers);
                let gathered = Arc::clone(&gathered);
                gather_fn(move || {
                    lumen_core::profile_scope!("gather_mesh");
                    let resource = format!("mesh {index}");
                    let buffers = buffers
                        .get()
                        .ok_or_else(|| ImportError::missing(&resource, "buffers"))?;
                    let mesh = gather_mesh(&data, buffers, index)
                        .map_err(|e| ImportError::gltf(&resource, e))?;
                    let _ = gathered.set(mesh);
                    Ok(())
                })
            };
            let name = mesh.name.clone();
            let import = import_fn(move |ctx| {
                let resource = format!("mesh {index}");
                let mesh = gathered
                    .get()
                    .ok_or_else(|| ImportError::missing(&resource, "decoded geometry"))?;
                let component = upload_mesh(ctx, &uri, &resource, mesh)?;
                let entity = ctx.spawn_resource(&uri, name.as_deref())?;
                ctx.world.insert(entity, component)?;
                ctx.result.meshes[index] = Some(entity);
                Ok(())
            });
            tasks.push(
                resource_name("mesh", index),
                ImportPhase::Meshes,
                Some(gather),
                Some(import),
            );
        }
    }
}

fn resource_name(kind: &str, index: usize) -> String {
    format!("{kind} {index}")
}

fn entity_at(list: &[Option<Entity>], index: Option<usize>) -> Option<Entity> {
    index.and_then(|i| list.get(i).copied().flatten())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum KeyframeRole {
    Input,
    Output,
}

impl KeyframeRole {
    fn kind(self) -> ResourceKind {
        match self {
            Self::Input => ResourceKind::AnimationInput,
            Self::Output => ResourceKind::AnimationOutput,
        }
    }
}

fn animation_path(path: GltfAnimationPath) -> AnimationPath {
    match path {
        GltfAnimationPath::Translation => AnimationPath::Translation,
        GltfAnimationPath::Rotation => AnimationPath::Rotation,
        GltfAnimationPath::Scale => AnimationPath::Scale,
        GltfAnimationPath::Weights => AnimationPath::Weights,
    }
}

fn animation_interpolation(interpolation: GltfInterpolation) -> AnimationInterpolation {
    match interpolation {
        GltfInterpolation::Linear => AnimationInterpolation::Linear,
        GltfInterpolation::Step => AnimationInterpolation::Step,
        GltfInterpolation::CubicSpline => AnimationInterpolation::CubicSpline,
    }
}

fn spawn_with_handle(
    ctx: &mut ImportContext<'_>,
    uri: &str,
    name: Option<&str>,
    handle: RenderHandleReference,
) -> Result<Entity, ImportError> {
    let entity = ctx.spawn_resource(uri, name)?;
    ctx.world.insert(entity, RenderHandleComponent::new(handle))?;
    Ok(entity)
}

/// Uploads gathered geometry and builds the mesh component around it.
fn upload_mesh(
    ctx: &ImportContext<'_>,
    uri: &str,
    resource: &str,
    mesh: &GatheredMesh,
) -> Result<MeshComponent, ImportError> {
    let create = |suffix: &str, usage: BufferUsage, bytes: &[u8]| {
        let desc = GpuBufferDesc::new(bytes.len() as u64, usage | BufferUsage::TRANSFER_DST);
        ctx.gpu
            .create_buffer(&format!("{uri}/{suffix}"), &desc, bytes)
            .map_err(|e| ImportError::gpu(resource, e))
    };
    let vertex_buffer = if mesh.vertex_data.is_empty() {
        None
    } else {
        Some(create("vertices", BufferUsage::VERTEX, &mesh.vertex_data)?)
    };
    let index_buffer = if mesh.index_data.is_empty() {
        None
    } else {
        Some(create("indices", BufferUsage::INDEX, &mesh.index_data)?)
    };

    let submeshes = mesh
        .primitives
        .iter()
        .map(|primitive| {
            let material = primitive
                .material
                .and_then(|m| ctx.result.materials.get(m).copied().flatten());
            let mut submesh = Submesh::new(primitive.aabb, primitive.vertex_count, material);
            submesh.index_count = primitive.index_count;
            submesh.flags = primitive.flags;
            submesh.morph_target_count = primitive.morph_target_count;
            if let Some(buffer) = &vertex_buffer {
                submesh.vertex_buffers = primitive
                    .vertex_streams
                    .iter()
                    .map(|range| VertexBufferBinding {
                        buffer: buffer.clone(),
                        byte_offset: range.offset,
                        byte_size: range.size,
                    })
                    .collect();
            }
            if let (Some(buffer), Some(range)) = (&index_buffer, primitive.indices) {
                submesh.index_buffer = Some(IndexBufferBinding {
                    buffer: buffer.clone(),
                    byte_offset: range.offset,
                    byte_size: range.size,
                    index_type: primitive.index_type,
                });
            }
            submesh
        })
        .collect();

    let mut component = MeshComponent::from_submeshes(submeshes);
    component.joint_bounds = mesh.joint_bounds.clone();
    Ok(component)
}

#[cfg(test)]
mod tests {
    use lumen_core::gltf::{
        GltfAnimation, GltfAnimationChannel, GltfAnimationSampler, GltfSampler, GltfTexture,
    };

    use super::*;

    fn animated() -> GltfData {
        let mut data = GltfData::new("mem/animated.gltf");
        let sampler = |input, output| GltfAnimationSampler {
            input,
            output,
            interpolation: GltfInterpolation::Linear,
        };
        let channel = |sampler| GltfAnimationChannel {
            sampler,
            target_node: Some(0),
            path: GltfAnimationPath::Translation,
        };
        data.animations.push(GltfAnimation {
            name: Some("walk".into()),
            channels: vec![channel(0), channel(1)],
            samplers: vec![sampler(0, 1), sampler(0, 2)],
        });
        data.animations.push(GltfAnimation {
            name: None,
            channels: vec![channel(0)],
            samplers: vec![sampler(0, 1)],
        });
        data
    }

    fn count(tasks: &TaskList, phase: ImportPhase) -> usize {
        tasks.tasks.iter().filter(|t| t.phase == phase).count()
    }

    #[test]
    fn shared_keyframe_accessors_get_one_task() {
        let data = Arc::new(animated());
        let existing = HashMap::new();
        let mut result = GltfImportResult::sized_for(&data);
        let tasks = Preparation {
            data,
            flags: ImportFlags::ANIMATIONS,
            resources_name: "resources",
            existing: &existing,
        }
        .build(&mut result);
        // Accessor 0 as input, accessors 1 and 2 as outputs
        assert_eq!(count(&tasks, ImportPhase::AnimationSamplers), 3);
        assert_eq!(count(&tasks, ImportPhase::Animations), 2);
        assert_eq!(count(&tasks, ImportPhase::Buffers), 1);
    }

    #[test]
    fn existing_uris_bind_without_tasks() {
        let mut data = GltfData::new("mem/samplers.gltf");
        data.samplers.push(GltfSampler::default());
        data.samplers.push(GltfSampler::default());
        data.textures.push(GltfTexture::default());
        let data = Arc::new(data);

        let mut world = lumen_ecs::World::new();
        let reused = world.spawn();
        let existing = HashMap::from([(
            resource_uri("mem/samplers.gltf", "resources", ResourceKind::Sampler, 1),
            reused,
        )]);
        let mut result = GltfImportResult::sized_for(&data);
        let tasks = Preparation {
            data,
            flags: ImportFlags::SAMPLERS | ImportFlags::TEXTURES,
            resources_name: "resources",
            existing: &existing,
        }
        .build(&mut result);

        assert_eq!(count(&tasks, ImportPhase::Samplers), 1);
        assert_eq!(count(&tasks, ImportPhase::Textures), 1);
        assert_eq!(result.samplers, vec![None, Some(reused)]);
    }

    #[test]
    fn unrequested_kinds_get_no_tasks() {
        let data = Arc::new(animated());
        let existing = HashMap::new();
        let mut result = GltfImportResult::sized_for(&data);
        let tasks = Preparation {
            data,
            flags: ImportFlags::MESHES,
            resources_name: "resources",
            existing: &existing,
        }
        .build(&mut result);
        assert_eq!(tasks.tasks.len(), 1);
        assert_eq!(tasks.tasks[0].phase, ImportPhase::Buffers);
    }

    #[test]
    fn buffers_are_skipped_when_nothing_reads_them() {
        let mut data = GltfData::new("mem/samplers.gltf");
        data.samplers.push(GltfSampler::default());
        let data = Arc::new(data);
        let existing = HashMap::new();
        let mut result = GltfImportResult::sized_for(&data);
        let tasks = Preparation {
            data,
            flags: ImportFlags::SAMPLERS,
            resources_name: "resources",
            existing: &existing,
        }
        .build(&mut result);
        assert_eq!(tasks.tasks.len(), 1);
        assert_eq!(tasks.tasks[0].phase, ImportPhase::Samplers);
    }
}
