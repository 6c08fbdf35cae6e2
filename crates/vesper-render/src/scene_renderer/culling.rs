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

//! Sphere-vs-frustum culling against planes derived from the camera's
//! view-projection matrix.

use glam::{Mat4, Vec3, Vec4, Vec4Swizzles};

use vesper_core::scene::BoundingSphere;

/// Bounding spheres are inflated by 1% to absorb floating point error at
/// frustum edges; culling must never reject visible geometry.
const RADIUS_INFLATION: f32 = 1.01;

/// Six view-frustum planes with inward-facing normals.
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    planes: [Vec4; 6],
}

impl Frustum {
    /// Extracts the planes from a world-to-clip matrix (Gribb/Hartmann),
    /// for a [0, 1] clip depth range.
    pub fn from_view_projection(view_projection: &Mat4) -> Self {
        let r0 = view_projection.row(0);
        let r1 = view_projection.row(1);
        let r2 = view_projection.row(2);
        let r3 = view_projection.row(3);

        let mut planes = [
            r3 + r0, // left
            r3 - r0, // right
            r3 + r1, // bottom
            r3 - r1, // top
            r2,      // near (depth >= 0)
            r3 - r2, // far
        ];
        for plane in &mut planes {
            let length = plane.xyz().length();
            if length > 0.0 {
                *plane /= length;
            }
        }
        Self { planes }
    }

    /// True if any part of the sphere is inside the frustum.
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.xyz().dot(center) + plane.w > -radius)
    }
}

/// Whether a mesh's bounding sphere, placed by `model`, lies entirely
/// outside the frustum.
///
/// The sphere is scaled by the largest axis scale of the model matrix so
/// non-uniform scaling stays conservative.
pub fn should_cull(frustum: &Frustum, sphere: &BoundingSphere, model: &Mat4) -> bool {
    let center = model.transform_point3(sphere.center);
    let scale = model
        .x_axis
        .xyz()
        .length()
        .max(model.y_axis.xyz().length())
        .max(model.z_axis.xyz().length());
    let radius = sphere.radius * scale * RADIUS_INFLATION;
    !frustum.intersects_sphere(center, radius)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vesper_core::Camera;

    fn test_frustum() -> Frustum {
        let camera = Camera::perspective(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0);
        Frustum::from_view_projection(&camera.view_projection_matrix())
    }

    #[test]
    fn sphere_in_front_of_camera_is_kept() {
        let frustum = test_frustum();
        let sphere = BoundingSphere {
            center: Vec3::ZERO,
            radius: 1.0,
        };
        let model = Mat4::from_translation(Vec3::new(0.0, 0.0, -10.0));
        assert!(!should_cull(&frustum, &sphere, &model));
    }

    #[test]
    fn sphere_behind_camera_is_culled() {
        let frustum = test_frustum();
        let sphere = BoundingSphere {
            center: Vec3::ZERO,
            radius: 1.0,
        };
        let model = Mat4::from_translation(Vec3::new(0.0, 0.0, 10.0));
        assert!(should_cull(&frustum, &sphere, &model));
    }

    #[test]
    fn sphere_straddling_side_plane_is_kept() {
        let frustum = test_frustum();
        let sphere = BoundingSphere {
            center: Vec3::ZERO,
            radius: 2.0,
        };
        // 90 degree FOV: the left plane at z = -10 sits at x = -10.
        let model = Mat4::from_translation(Vec3::new(-11.0, 0.0, -10.0));
        assert!(!should_cull(&frustum, &sphere, &model));
    }

    #[test]
    fn sphere_beyond_far_plane_is_culled() {
        let frustum = test_frustum();
        let sphere = BoundingSphere {
            center: Vec3::ZERO,
            radius: 1.0,
        };
        let model = Mat4::from_translation(Vec3::new(0.0, 0.0, -200.0));
        assert!(should_cull(&frustum, &sphere, &model));
    }

    #[test]
    fn nonuniform_scale_uses_largest_axis() {
        let frustum = test_frustum();
        let sphere = BoundingSphere {
            center: Vec3::ZERO,
            radius: 1.0,
        };
        // Small on two axes but stretched 50x along x: the sphere pokes
        // into the frustum from the side.
        let model = Mat4::from_scale(Vec3::new(50.0, 0.1, 0.1))
            * Mat4::from_translation(Vec3::ZERO);
        let model = Mat4::from_translation(Vec3::new(-55.0, 0.0, -10.0)) * model;
        assert!(!should_cull(&frustum, &sphere, &model));
    }
}
