use std::f32::consts::FRAC_PI_2;

use lumen_core::math::{Mat4, Vec3, Vec4, flip_y, orthographic_rh, perspective_rh};
use lumen_ecs::{Entity, NodeComponent, World, WorldMatrixComponent};
use lumen_graphics::data_store::ResolvedDataStores;
use lumen_graphics::render_data::{
    CameraCullType, CameraMatrices, RenderCamera, RenderCameraFlags, RenderLight,
    RenderLightFlags, RenderPipelineType,
};
use nalgebra::Point3;

use super::{RenderSystem, SceneBoundingSphere, is_enabled, read, world_matrix_of};
use crate::components::{LAYER_DEFAULT, LayerComponent, LightComponent, LightType};

/// Distance of the directional shadow camera from the scene center, relative
/// to the scene radius.
const DIRECTIONAL_SHADOW_DISTANCE: f32 = 1.05;
const DIRECTIONAL_SHADOW_NEAR: f32 = 0.0;
const DIRECTIONAL_SHADOW_FAR: f32 = 6.0;
const MIN_SPOT_SHADOW_NEAR: f32 = 0.1;

/// Range of a light, derived from its intensity when the authored range is
/// at or below `epsilon`.
///
/// ```
/// use lumen_scene::render_system::safe_light_range;
///
/// assert_eq!(safe_light_range(8.0, 100.0, 1e-4), 8.0);
/// let derived = safe_light_range(0.0, 12.0, 1e-4);
/// assert!((derived - 32.0f32.powf(0.75)).abs() < 1e-4);
/// ```
pub fn safe_light_range(range: f32, intensity: f32, epsilon: f32) -> f32 {
    if range > epsilon {
        return range;
    }
    (intensity + 20.0).powf(1.5).sqrt()
}

/// Spot cone angles clamped into `[0, pi/2]` with `inner <= outer`.
fn clamp_spot_angles(inner: f32, outer: f32) -> (f32, f32) {
    let outer = outer.clamp(0.0, FRAC_PI_2);
    let inner = inner.clamp(0.0, outer);
    (inner, outer)
}

impl RenderSystem {
    pub(super) fn process_lights(
        &mut self,
        world: &World,
        stores: &mut ResolvedDataStores<'_>,
        scene: &SceneBoundingSphere,
    ) {
        lumen_core::profile_scope!("process_lights");

        self.queries.lights.execute(world);
        let entities = self.queries.lights.results().to_vec();
        let Some(lights) = read::<LightComponent>(world) else {
            return;
        };
        let nodes = read::<NodeComponent>(world);
        let world_matrices = read::<WorldMatrixComponent>(world);
        let layers = read::<LayerComponent>(world);
        let shadow_resolution = stores.light.shadow_quality_resolution();

        for entity in entities {
            let Some(light) = lights.get(entity) else {
                continue;
            };
            if !is_enabled(nodes.as_deref(), entity) {
                continue;
            }
            let layer_mask = layers
                .as_deref()
                .and_then(|l| l.get(entity))
                .map_or(LAYER_DEFAULT, |l| l.layer_mask);
            let world_matrix = world_matrix_of(world_matrices.as_deref(), entity);

            let mut render_light = self.render_light(entity, light, &world_matrix, layer_mask);
            if light.shadow_enabled
                && let Some(camera) = self.shadow_camera(
                    entity,
                    light,
                    &render_light,
                    &world_matrix,
                    scene,
                    shadow_resolution,
                )
            {
                render_light.shadow_camera_index = Some(stores.camera.add_camera(camera));
                render_light.flags |= RenderLightFlags::SHADOW;
            }
            stores.light.add_light(render_light);
        }
    }

    fn render_light(
        &self,
        entity: Entity,
        light: &LightComponent,
        world_matrix: &Mat4,
        layer_mask: u64,
    ) -> RenderLight {
        let position = world_matrix.column(3).xyz();
        let direction = (-world_matrix.column(2).xyz())
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(|| Vec3::new(0.0, 0.0, -1.0));
        let (spot_inner_angle, spot_outer_angle) =
            clamp_spot_angles(light.spot_inner_angle, light.spot_outer_angle);
        let flags = match light.light_type {
            LightType::Directional => RenderLightFlags::DIRECTIONAL,
            LightType::Point => RenderLightFlags::POINT,
            LightType::Spot => RenderLightFlags::SPOT,
        };

        RenderLight {
            id: entity.id(),
            layer_mask,
            position: Vec4::new(position.x, position.y, position.z, 1.0),
            direction: Vec4::new(direction.x, direction.y, direction.z, 0.0),
            color: Vec4::new(light.color.x, light.color.y, light.color.z, light.intensity),
            flags,
            spot_inner_angle,
            spot_outer_angle,
            range: safe_light_range(light.range, light.intensity, self.config.light_range_epsilon),
            shadow_factors: Vec4::new(
                light.shadow_strength,
                light.shadow_depth_bias,
                light.shadow_normal_bias,
                0.0,
            ),
            shadow_camera_index: None,
        }
    }

    /// Shadow camera of a directional or spot light. Point lights and
    /// directional lights in an empty scene have none.
    fn shadow_camera(
        &mut self,
        entity: Entity,
        light: &LightComponent,
        render_light: &RenderLight,
        world_matrix: &Mat4,
        scene: &SceneBoundingSphere,
        resolution: [u32; 2],
    ) -> Option<RenderCamera> {
        let direction = render_light.direction.xyz();
        let (view, proj, z_near, z_far) = match light.light_type {
            LightType::Directional => {
                if scene.radius <= 0.0 {
                    return None;
                }
                let eye = scene.center - direction * scene.radius * DIRECTIONAL_SHADOW_DISTANCE;
                let up = if direction.y.abs() > 0.99 {
                    Vec3::z()
                } else {
                    Vec3::y()
                };
                let view = Mat4::look_at_rh(
                    &Point3::from(eye),
                    &Point3::from(scene.center),
                    &up,
                );
                let r = scene.radius;
                let proj = flip_y(&orthographic_rh(
                    -r,
                    r,
                    -r,
                    r,
                    DIRECTIONAL_SHADOW_NEAR,
                    DIRECTIONAL_SHADOW_FAR,
                ));
                (view, proj, DIRECTIONAL_SHADOW_NEAR, DIRECTIONAL_SHADOW_FAR)
            }
            LightType::Spot => {
                let view = world_matrix.try_inverse().unwrap_or_else(Mat4::identity);
                let z_near = light.near_plane.max(MIN_SPOT_SHADOW_NEAR);
                let z_far = render_light.range.max(z_near + f32::EPSILON);
                let proj = flip_y(&perspective_rh(
                    2.0 * render_light.spot_outer_angle,
                    1.0,
                    z_near,
                    z_far,
                ));
                (view, proj, z_near, z_far)
            }
            LightType::Point => return None,
        };

        let (view_prev, proj_prev) =
            self.update_and_get_previous_frame_camera_data(entity.id(), &view, &proj);

        Some(RenderCamera {
            id: entity.id(),
            name: format!("ShadowCamera_{}", entity.id()),
            layer_mask: render_light.layer_mask,
            matrices: CameraMatrices {
                view,
                proj,
                view_prev,
                proj_prev,
            },
            world_position: view
                .try_inverse()
                .map_or_else(Vec3::zeros, |inverse| inverse.column(3).xyz()),
            render_resolution: resolution,
            z_near,
            z_far,
            flags: RenderCameraFlags::SHADOW | RenderCameraFlags::CLEAR_DEPTH,
            cull_type: CameraCullType::ViewFrustum,
            pipeline_type: RenderPipelineType::LightForward,
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::authored(5.0, 100.0, 5.0)]
    #[case::derived_from_zero(0.0, 5.0, 25.0f32.powf(0.75))]
    #[case::derived_at_epsilon(1e-4, 0.0, 20.0f32.powf(0.75))]
    fn light_range(#[case] range: f32, #[case] intensity: f32, #[case] expected: f32) {
        let actual = safe_light_range(range, intensity, 1e-4);
        assert!((actual - expected).abs() < 1e-4, "{actual} != {expected}");
    }

    #[rstest]
    #[case::in_range(0.2, 0.5, (0.2, 0.5))]
    #[case::inner_above_outer(0.9, 0.5, (0.5, 0.5))]
    #[case::outer_too_wide(0.1, 3.0, (0.1, FRAC_PI_2))]
    #[case::negative(-1.0, -1.0, (0.0, 0.0))]
    fn spot_angles(#[case] inner: f32, #[case] outer: f32, #[case] expected: (f32, f32)) {
        assert_eq!(clamp_spot_angles(inner, outer), expected);
    }
}
