//! Conversion of a `gltf` crate document into [`GltfData`].
//!
//! Only the JSON structure is converted here. Buffer payloads other than the
//! GLB binary chunk stay unresolved so that decoding can happen later on a
//! worker thread.

use std::sync::Arc;

use gltf_dep::json::Value;

use super::data::*;
use super::error::GltfError;

/// Parse a `.gltf` or `.glb` file.
///
/// `filepath` is recorded for relative URI resolution and resource naming.
pub fn parse_gltf(bytes: &[u8], filepath: &str) -> Result<GltfData, GltfError> {
    let gltf = gltf_dep::Gltf::from_slice(bytes)?;
    let blob: Option<Arc<[u8]>> = gltf.blob.clone().map(Arc::from);
    let document = &gltf.document;

    let mut data = GltfData::new(filepath);

    data.buffers = document
        .buffers()
        .map(|buffer| match buffer.source() {
            gltf_dep::buffer::Source::Bin => GltfBuffer {
                uri: None,
                byte_length: buffer.length(),
                data: blob.clone(),
            },
            gltf_dep::buffer::Source::Uri(uri) => GltfBuffer {
                uri: Some(uri.to_string()),
                byte_length: buffer.length(),
                data: None,
            },
        })
        .collect();

    data.buffer_views = document
        .views()
        .map(|view| GltfBufferView {
            buffer: view.buffer().index(),
            byte_offset: view.offset(),
            byte_length: view.length(),
            byte_stride: view.stride(),
        })
        .collect();

    data.accessors = document.accessors().map(|a| load_accessor(&a)).collect();

    data.samplers = document
        .samplers()
        .map(|sampler| {
            let (min_filter, mipmap_filter) = map_min_filter(sampler.min_filter());
            GltfSampler {
                name: sampler.name().map(String::from),
                mag_filter: match sampler.mag_filter() {
                    Some(gltf_dep::texture::MagFilter::Nearest) => GltfFilter::Nearest,
                    _ => GltfFilter::Linear,
                },
                min_filter,
                mipmap_filter,
                wrap_s: map_wrapping(sampler.wrap_s()),
                wrap_t: map_wrapping(sampler.wrap_t()),
            }
        })
        .collect();

    data.images = document
        .images()
        .map(|image| GltfImage {
            name: image.name().map(String::from),
            source: match image.source() {
                gltf_dep::image::Source::View { view, mime_type } => GltfImageSource::BufferView {
                    view: view.index(),
                    mime_type: mime_type.to_string(),
                },
                gltf_dep::image::Source::Uri { uri, mime_type } => GltfImageSource::Uri {
                    uri: uri.to_string(),
                    mime_type: mime_type.map(String::from),
                },
            },
        })
        .collect();

    data.textures = document
        .textures()
        .map(|texture| GltfTexture {
            name: texture.name().map(String::from),
            image: Some(texture.source().index()),
            sampler: texture.sampler().index(),
        })
        .collect();

    data.materials = document.materials().map(|m| load_material(&m)).collect();

    data.meshes = document
        .meshes()
        .map(|mesh| GltfMesh {
            name: mesh.name().map(String::from),
            primitives: mesh.primitives().map(|p| load_primitive(&p)).collect(),
            weights: mesh.weights().map(<[f32]>::to_vec).unwrap_or_default(),
        })
        .collect();

    data.nodes = document
        .nodes()
        .map(|node| GltfNode {
            name: node.name().map(String::from),
            children: node.children().map(|c| c.index()).collect(),
            transform: match node.transform() {
                gltf_dep::scene::Transform::Matrix { matrix } => {
                    let mut m = [0.0f32; 16];
                    for (c, column) in matrix.iter().enumerate() {
                        m[c * 4..c * 4 + 4].copy_from_slice(column);
                    }
                    GltfNodeTransform::Matrix(m)
                }
                gltf_dep::scene::Transform::Decomposed {
                    translation,
                    rotation,
                    scale,
                } => GltfNodeTransform::Trs {
                    translation,
                    rotation,
                    scale,
                },
            },
            mesh: node.mesh().map(|m| m.index()),
            camera: node.camera().map(|c| c.index()),
            light: node.light().map(|l| l.index()),
            skin: node.skin().map(|s| s.index()),
            weights: node.weights().map(<[f32]>::to_vec).unwrap_or_default(),
        })
        .collect();

    data.scenes = document
        .scenes()
        .map(|scene| GltfScene {
            name: scene.name().map(String::from),
            nodes: scene.nodes().map(|n| n.index()).collect(),
        })
        .collect();
    data.default_scene = document.default_scene().map(|s| s.index());

    data.skins = document
        .skins()
        .map(|skin| GltfSkin {
            name: skin.name().map(String::from),
            inverse_bind_matrices: skin.inverse_bind_matrices().map(|a| a.index()),
            joints: skin.joints().map(|j| j.index()).collect(),
            skeleton: skin.skeleton().map(|n| n.index()),
        })
        .collect();

    data.animations = document
        .animations()
        .map(|animation| GltfAnimation {
            name: animation.name().map(String::from),
            channels: animation
                .channels()
                .map(|channel| GltfAnimationChannel {
                    sampler: channel.sampler().index(),
                    target_node: Some(channel.target().node().index()),
                    path: match channel.target().property() {
                        gltf_dep::animation::Property::Translation => GltfAnimationPath::Translation,
                        gltf_dep::animation::Property::Rotation => GltfAnimationPath::Rotation,
                        gltf_dep::animation::Property::Scale => GltfAnimationPath::Scale,
                        gltf_dep::animation::Property::MorphTargetWeights => {
                            GltfAnimationPath::Weights
                        }
                    },
                })
                .collect(),
            samplers: animation
                .samplers()
                .map(|sampler| GltfAnimationSampler {
                    input: sampler.input().index(),
                    output: sampler.output().index(),
                    interpolation: match sampler.interpolation() {
                        gltf_dep::animation::Interpolation::Linear => GltfInterpolation::Linear,
                        gltf_dep::animation::Interpolation::Step => GltfInterpolation::Step,
                        gltf_dep::animation::Interpolation::CubicSpline => {
                            GltfInterpolation::CubicSpline
                        }
                    },
                })
                .collect(),
        })
        .collect();

    data.cameras = document
        .cameras()
        .map(|camera| GltfCamera {
            name: camera.name().map(String::from),
            projection: match camera.projection() {
                gltf_dep::camera::Projection::Perspective(p) => GltfProjection::Perspective {
                    yfov: p.yfov(),
                    aspect_ratio: p.aspect_ratio(),
                    znear: p.znear(),
                    zfar: p.zfar(),
                },
                gltf_dep::camera::Projection::Orthographic(o) => GltfProjection::Orthographic {
                    xmag: o.xmag(),
                    ymag: o.ymag(),
                    znear: o.znear(),
                    zfar: o.zfar(),
                },
            },
        })
        .collect();

    if let Some(lights) = document.lights() {
        data.lights = lights
            .map(|light| GltfLight {
                name: light.name().map(String::from),
                kind: match light.kind() {
                    gltf_dep::khr_lights_punctual::Kind::Directional => GltfLightKind::Directional,
                    gltf_dep::khr_lights_punctual::Kind::Point => GltfLightKind::Point,
                    gltf_dep::khr_lights_punctual::Kind::Spot {
                        inner_cone_angle,
                        outer_cone_angle,
                    } => GltfLightKind::Spot {
                        inner_cone_angle,
                        outer_cone_angle,
                    },
                },
                color: light.color(),
                intensity: light.intensity(),
                range: light.range(),
            })
            .collect();
    }

    log::debug!(
        "Parsed '{}': {} meshes, {} materials, {} images, {} animations",
        filepath,
        data.meshes.len(),
        data.materials.len(),
        data.images.len(),
        data.animations.len()
    );

    Ok(data)
}

fn load_accessor(accessor: &gltf_dep::Accessor<'_>) -> GltfAccessor {
    use gltf_dep::accessor::{DataType, Dimensions};

    GltfAccessor {
        name: accessor.name().map(String::from),
        buffer_view: accessor.view().map(|v| v.index()),
        byte_offset: accessor.offset(),
        component_type: match accessor.data_type() {
            DataType::I8 => ComponentType::Byte,
            DataType::U8 => ComponentType::UnsignedByte,
            DataType::I16 => ComponentType::Short,
            DataType::U16 => ComponentType::UnsignedShort,
            DataType::U32 => ComponentType::UnsignedInt,
            DataType::F32 => ComponentType::Float,
        },
        element_type: match accessor.dimensions() {
            Dimensions::Scalar => ElementType::Scalar,
            Dimensions::Vec2 => ElementType::Vec2,
            Dimensions::Vec3 => ElementType::Vec3,
            Dimensions::Vec4 => ElementType::Vec4,
            Dimensions::Mat2 => ElementType::Mat2,
            Dimensions::Mat3 => ElementType::Mat3,
            Dimensions::Mat4 => ElementType::Mat4,
        },
        count: accessor.count(),
        normalized: accessor.normalized(),
        min: accessor.min().map(|v| json_floats(&v)).unwrap_or_default(),
        max: accessor.max().map(|v| json_floats(&v)).unwrap_or_default(),
        sparse: accessor.sparse().is_some(),
    }
}

fn json_floats(value: &Value) -> Vec<f32> {
    value
        .as_array()
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_f64)
                .map(|v| v as f32)
                .collect()
        })
        .unwrap_or_default()
}

fn map_min_filter(filter: Option<gltf_dep::texture::MinFilter>) -> (GltfFilter, Option<GltfFilter>) {
    use gltf_dep::texture::MinFilter;
    match filter {
        Some(MinFilter::Nearest) => (GltfFilter::Nearest, None),
        Some(MinFilter::Linear) => (GltfFilter::Linear, None),
        Some(MinFilter::NearestMipmapNearest) => (GltfFilter::Nearest, Some(GltfFilter::Nearest)),
        Some(MinFilter::LinearMipmapNearest) => (GltfFilter::Linear, Some(GltfFilter::Nearest)),
        Some(MinFilter::NearestMipmapLinear) => (GltfFilter::Nearest, Some(GltfFilter::Linear)),
        Some(MinFilter::LinearMipmapLinear) | None => (GltfFilter::Linear, Some(GltfFilter::Linear)),
    }
}

fn map_wrapping(wrap: gltf_dep::texture::WrappingMode) -> GltfWrapping {
    match wrap {
        gltf_dep::texture::WrappingMode::ClampToEdge => GltfWrapping::ClampToEdge,
        gltf_dep::texture::WrappingMode::MirroredRepeat => GltfWrapping::MirroredRepeat,
        gltf_dep::texture::WrappingMode::Repeat => GltfWrapping::Repeat,
    }
}

fn texture_info(info: &gltf_dep::texture::Info<'_>) -> GltfTextureInfo {
    GltfTextureInfo {
        index: info.texture().index(),
        tex_coord: info.tex_coord(),
        transform: info.texture_transform().map(|t| GltfTextureTransform {
            offset: t.offset(),
            rotation: t.rotation(),
            scale: t.scale(),
        }),
    }
}

/// Texture reference stored as raw extension JSON (`{"index": n, "texCoord": m}`).
fn json_texture_info(value: Option<&Value>) -> Option<GltfTextureInfo> {
    let value = value?;
    let index = value.get("index")?.as_u64()? as usize;
    let tex_coord = value.get("texCoord").and_then(Value::as_u64).unwrap_or(0) as u32;
    Some(GltfTextureInfo {
        index,
        tex_coord,
        transform: None,
    })
}

fn json_f32(value: &Value, key: &str, default: f32) -> f32 {
    value
        .get(key)
        .and_then(Value::as_f64)
        .map(|v| v as f32)
        .unwrap_or(default)
}

fn load_material(material: &gltf_dep::Material<'_>) -> GltfMaterial {
    let pbr = material.pbr_metallic_roughness();
    let extensions = material.extensions();

    let clearcoat = extensions
        .and_then(|ext| ext.get("KHR_materials_clearcoat"))
        .map(|cc| GltfClearcoat {
            factor: json_f32(cc, "clearcoatFactor", 0.0),
            texture: json_texture_info(cc.get("clearcoatTexture")),
            roughness_factor: json_f32(cc, "clearcoatRoughnessFactor", 0.0),
            roughness_texture: json_texture_info(cc.get("clearcoatRoughnessTexture")),
            normal_texture: json_texture_info(cc.get("clearcoatNormalTexture")),
            normal_scale: cc
                .get("clearcoatNormalTexture")
                .map(|n| json_f32(n, "scale", 1.0))
                .unwrap_or(1.0),
        });

    let sheen = extensions
        .and_then(|ext| ext.get("KHR_materials_sheen"))
        .map(|sheen| {
            let color = json_floats(sheen.get("sheenColorFactor").unwrap_or(&Value::Null));
            GltfSheen {
                color_factor: [
                    color.first().copied().unwrap_or(0.0),
                    color.get(1).copied().unwrap_or(0.0),
                    color.get(2).copied().unwrap_or(0.0),
                ],
                color_texture: json_texture_info(sheen.get("sheenColorTexture")),
                roughness_factor: json_f32(sheen, "sheenRoughnessFactor", 0.0),
                roughness_texture: json_texture_info(sheen.get("sheenRoughnessTexture")),
            }
        });

    GltfMaterial {
        name: material.name().map(String::from),
        alpha_mode: match material.alpha_mode() {
            gltf_dep::material::AlphaMode::Opaque => GltfAlphaMode::Opaque,
            gltf_dep::material::AlphaMode::Mask => GltfAlphaMode::Mask,
            gltf_dep::material::AlphaMode::Blend => GltfAlphaMode::Blend,
        },
        alpha_cutoff: material.alpha_cutoff().unwrap_or(0.5),
        double_sided: material.double_sided(),
        unlit: material.unlit(),
        base_color_factor: pbr.base_color_factor(),
        base_color_texture: pbr.base_color_texture().map(|t| texture_info(&t)),
        metallic_factor: pbr.metallic_factor(),
        roughness_factor: pbr.roughness_factor(),
        metallic_roughness_texture: pbr.metallic_roughness_texture().map(|t| texture_info(&t)),
        normal_texture: material.normal_texture().map(|t| GltfTextureInfo {
            index: t.texture().index(),
            tex_coord: t.tex_coord(),
            transform: None,
        }),
        normal_scale: material.normal_texture().map(|t| t.scale()).unwrap_or(1.0),
        occlusion_texture: material.occlusion_texture().map(|t| GltfTextureInfo {
            index: t.texture().index(),
            tex_coord: t.tex_coord(),
            transform: None,
        }),
        occlusion_strength: material
            .occlusion_texture()
            .map(|t| t.strength())
            .unwrap_or(1.0),
        emissive_texture: material.emissive_texture().map(|t| texture_info(&t)),
        emissive_factor: material.emissive_factor(),
        emissive_strength: material.emissive_strength().unwrap_or(1.0),
        ior: material.ior().unwrap_or(1.5),
        clearcoat,
        sheen,
        specular: material.specular().map(|s| GltfSpecular {
            factor: s.specular_factor(),
            texture: s.specular_texture().map(|t| texture_info(&t)),
            color_factor: s.specular_color_factor(),
            color_texture: s.specular_color_texture().map(|t| texture_info(&t)),
        }),
        transmission: material.transmission().map(|t| GltfTransmission {
            factor: t.transmission_factor(),
            texture: t.transmission_texture().map(|t| texture_info(&t)),
        }),
    }
}

fn load_primitive(primitive: &gltf_dep::Primitive<'_>) -> GltfPrimitive {
    use gltf_dep::Semantic;

    let attribute = |semantic: Semantic| primitive.get(&semantic).map(|a| a.index());
    let mut tex_coords = Vec::new();
    while let Some(accessor) = primitive.get(&Semantic::TexCoords(tex_coords.len() as u32)) {
        tex_coords.push(accessor.index());
    }

    GltfPrimitive {
        position: attribute(Semantic::Positions),
        normal: attribute(Semantic::Normals),
        tangent: attribute(Semantic::Tangents),
        tex_coords,
        color: attribute(Semantic::Colors(0)),
        joints: attribute(Semantic::Joints(0)),
        weights: attribute(Semantic::Weights(0)),
        indices: primitive.indices().map(|a| a.index()),
        material: primitive.material().index(),
        mode: match primitive.mode() {
            gltf_dep::mesh::Mode::Points => GltfPrimitiveMode::Points,
            gltf_dep::mesh::Mode::Lines => GltfPrimitiveMode::Lines,
            gltf_dep::mesh::Mode::LineLoop => GltfPrimitiveMode::LineLoop,
            gltf_dep::mesh::Mode::LineStrip => GltfPrimitiveMode::LineStrip,
            gltf_dep::mesh::Mode::Triangles => GltfPrimitiveMode::Triangles,
            gltf_dep::mesh::Mode::TriangleStrip => GltfPrimitiveMode::TriangleStrip,
            gltf_dep::mesh::Mode::TriangleFan => GltfPrimitiveMode::TriangleFan,
        },
        targets: primitive
            .morph_targets()
            .map(|target| GltfMorphTarget {
                position: target.positions().map(|a| a.index()),
                normal: target.normals().map(|a| a.index()),
                tangent: target.tangents().map(|a| a.index()),
            })
            .collect(),
    }
}
