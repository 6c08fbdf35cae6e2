// Copyright 2025 the Vesper contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Cascaded shadow map math: split scheme, per-cascade light matrices,
//! texel snapping.

use glam::{Mat4, Vec3};

use vesper_core::Camera;

/// Weight of the logarithmic term in the split scheme. 0 is purely linear,
/// 1 purely logarithmic.
const SPLIT_BLEND_FACTOR: f32 = 0.5;

/// When the light direction is nearly parallel to the world up axis, the
/// look-at basis degenerates; beyond this threshold a different up axis is
/// substituted.
const UP_DEGENERACY_THRESHOLD: f32 = 0.999;

/// Everything the shadow pass and the lighting shaders need per frame.
#[derive(Debug, Clone, Default)]
pub struct CascadeData {
    /// View-space far distance of each cascade, strictly increasing, the
    /// last equal to the camera's far plane.
    pub z_fars: Vec<f32>,
    /// World-to-light-clip matrix of each cascade.
    pub light_matrices: Vec<Mat4>,
}

/// Computes the far distance of each cascade by blending logarithmic and
/// linear splits.
pub fn cascade_split_z_fars(z_near: f32, z_far: f32, cascade_count: u32) -> Vec<f32> {
    let count = cascade_count.max(1);
    (1..=count)
        .map(|n| {
            let t = n as f32 / count as f32;
            let logarithmic = z_near * (z_far / z_near).powf(t);
            let linear = z_near + t * (z_far - z_near);
            SPLIT_BLEND_FACTOR * logarithmic + (1.0 - SPLIT_BLEND_FACTOR) * linear
        })
        .collect()
}

/// Computes the per-cascade split distances and light matrices for one
/// directional light.
pub fn compute_cascades(
    camera: &Camera,
    light_direction: Vec3,
    cascade_count: u32,
    shadow_map_resolution: u32,
    z_multiplier: f32,
) -> CascadeData {
    let z_fars = cascade_split_z_fars(camera.z_near(), camera.z_far(), cascade_count);
    let mut light_matrices = Vec::with_capacity(z_fars.len());

    let mut cascade_near = camera.z_near();
    for &cascade_far in &z_fars {
        light_matrices.push(cascade_light_matrix(
            &camera.with_clip_planes(cascade_near, cascade_far),
            light_direction,
            shadow_map_resolution,
            z_multiplier,
        ));
        cascade_near = cascade_far;
    }

    CascadeData {
        z_fars,
        light_matrices,
    }
}

/// Builds the world-to-light-clip matrix tightly fitting one cascade's
/// sub-frustum.
fn cascade_light_matrix(
    sub_frustum_camera: &Camera,
    light_direction: Vec3,
    shadow_map_resolution: u32,
    z_multiplier: f32,
) -> Mat4 {
    let corners = sub_frustum_camera.frustum_corners_world_space();
    let centroid = corners.iter().copied().sum::<Vec3>() / corners.len() as f32;

    let light_direction = light_direction.normalize();
    let mut up = Vec3::Y;
    if light_direction.dot(up).abs() > UP_DEGENERACY_THRESHOLD {
        up = Vec3::Z;
    }
    let light_view = Mat4::look_at_rh(centroid - light_direction, centroid, up);

    let mut min = Vec3::splat(f32::MAX);
    let mut max = Vec3::splat(f32::MIN);
    for corner in corners {
        let light_space = light_view.transform_point3(corner);
        min = min.min(light_space);
        max = max.max(light_space);
    }

    // Snap the orthographic window to shadow map texels so the cascade does
    // not shimmer as the camera translates.
    let resolution = shadow_map_resolution.max(1) as f32;
    let units_per_texel_x = (max.x - min.x) / resolution;
    let units_per_texel_y = (max.y - min.y) / resolution;
    if units_per_texel_x > 0.0 {
        min.x = (min.x / units_per_texel_x).floor() * units_per_texel_x;
        max.x = (max.x / units_per_texel_x).ceil() * units_per_texel_x;
    }
    if units_per_texel_y > 0.0 {
        min.y = (min.y / units_per_texel_y).floor() * units_per_texel_y;
        max.y = (max.y / units_per_texel_y).ceil() * units_per_texel_y;
    }

    let light_projection = Mat4::orthographic_rh(
        min.x,
        max.x,
        min.y,
        max.y,
        min.z * z_multiplier,
        max.z * z_multiplier,
    );
    light_projection * light_view
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn test_camera() -> Camera {
        Camera::perspective(std::f32::consts::FRAC_PI_3, 16.0 / 9.0, 0.1, 500.0)
    }

    #[test]
    fn splits_are_strictly_increasing_and_end_at_far_plane() {
        let camera = test_camera();
        let splits = cascade_split_z_fars(camera.z_near(), camera.z_far(), 4);
        assert_eq!(splits.len(), 4);
        for pair in splits.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert_relative_eq!(*splits.last().unwrap(), camera.z_far(), epsilon = 1e-3);
        assert!(splits[0] > camera.z_near());
    }

    #[test]
    fn splits_sit_between_linear_and_logarithmic() {
        let (near, far) = (0.1f32, 100.0f32);
        let splits = cascade_split_z_fars(near, far, 3);
        for (n, &split) in splits.iter().enumerate().take(2) {
            let t = (n as f32 + 1.0) / 3.0;
            let logarithmic = near * (far / near).powf(t);
            let linear = near + t * (far - near);
            assert!(split >= logarithmic.min(linear));
            assert!(split <= logarithmic.max(linear));
        }
    }

    #[test]
    fn cascade_windows_contain_their_sub_frusta() {
        let camera = test_camera();
        let data = compute_cascades(&camera, Vec3::new(-0.5, -1.0, -0.3), 3, 2048, 1.0);
        assert_eq!(data.light_matrices.len(), 3);

        // Every sub-frustum corner must land inside the orthographic window
        // in x/y; texel snapping only ever widens the window, so allow one
        // texel of slack.
        let slack = 1.0 + 2.0 / 2048.0;
        let mut cascade_near = camera.z_near();
        for (matrix, &cascade_far) in data.light_matrices.iter().zip(&data.z_fars) {
            let corners = camera
                .with_clip_planes(cascade_near, cascade_far)
                .frustum_corners_world_space();
            for corner in corners {
                let clip = *matrix * corner.extend(1.0);
                let ndc = clip.truncate() / clip.w;
                assert!(ndc.x.abs() <= slack, "corner outside the window: {ndc:?}");
                assert!(ndc.y.abs() <= slack, "corner outside the window: {ndc:?}");
            }
            cascade_near = cascade_far;
        }
    }

    #[test]
    fn z_multiplier_scales_both_depth_bounds() {
        let camera = test_camera();
        let direction = Vec3::new(-0.5, -1.0, -0.3);
        let tight = compute_cascades(&camera, direction, 1, 2048, 1.0);
        let stretched = compute_cascades(&camera, direction, 1, 2048, 10.0);

        // The light view's eye sits at light-space z = 0; stretching the
        // near and far bounds by the same factor keeps its relative depth
        // unchanged, while stretching only one bound shifts it.
        let corners = camera.frustum_corners_world_space();
        let centroid = corners.iter().copied().sum::<Vec3>() / corners.len() as f32;
        let eye = (centroid - direction.normalize()).extend(1.0);
        let depth_tight = (tight.light_matrices[0] * eye).z;
        let depth_stretched = (stretched.light_matrices[0] * eye).z;
        assert_relative_eq!(depth_tight, depth_stretched, epsilon = 1e-4);
    }

    #[test]
    fn vertical_light_direction_does_not_degenerate() {
        let camera = test_camera();
        let data = compute_cascades(&camera, Vec3::new(0.0, -1.0, 0.0), 2, 1024, 1.0);
        for matrix in &data.light_matrices {
            assert!(matrix.is_finite());
        }
    }

    #[test]
    fn single_cascade_covers_whole_range() {
        let camera = test_camera();
        let splits = cascade_split_z_fars(camera.z_near(), camera.z_far(), 1);
        assert_eq!(splits.len(), 1);
        assert_relative_eq!(splits[0], camera.z_far(), epsilon = 1e-3);
    }
}
