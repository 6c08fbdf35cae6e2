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

//! Perspective camera with right-handed view space and a [0, 1] clip depth
//! range.

use glam::{Mat4, Quat, Vec3};

/// A perspective camera.
///
/// View and projection matrices are derived lazily from position, rotation,
/// and the perspective parameters. Cascade shadow mapping clones the camera
/// with narrowed clip planes to extract per-cascade frusta.
#[derive(Debug, Clone)]
pub struct Camera {
    position: Vec3,
    rotation: Quat,
    fov_y_radians: f32,
    aspect_ratio: f32,
    z_near: f32,
    z_far: f32,
}

impl Camera {
    /// Creates a perspective camera at the origin looking down -Z.
    pub fn perspective(fov_y_radians: f32, aspect_ratio: f32, z_near: f32, z_far: f32) -> Self {
        debug_assert!(z_near > 0.0 && z_far > z_near);
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            fov_y_radians,
            aspect_ratio,
            z_near,
            z_far,
        }
    }

    /// The camera's world-space position.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Sets the camera's world-space position.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// The camera's world-space orientation.
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Sets the camera's world-space orientation.
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation;
    }

    /// The near clip plane distance.
    pub fn z_near(&self) -> f32 {
        self.z_near
    }

    /// The far clip plane distance.
    pub fn z_far(&self) -> f32 {
        self.z_far
    }

    /// The vertical field of view in radians.
    pub fn fov_y_radians(&self) -> f32 {
        self.fov_y_radians
    }

    /// The width-over-height aspect ratio.
    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    /// Sets the aspect ratio, e.g. after a viewport resize.
    pub fn set_aspect_ratio(&mut self, aspect_ratio: f32) {
        self.aspect_ratio = aspect_ratio;
    }

    /// Returns a copy of this camera with different clip planes. Used to
    /// carve per-cascade sub-frusta out of the view frustum.
    pub fn with_clip_planes(&self, z_near: f32, z_far: f32) -> Self {
        let mut camera = self.clone();
        camera.z_near = z_near;
        camera.z_far = z_far;
        camera
    }

    /// The world-to-view matrix.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position).inverse()
    }

    /// The view-to-clip matrix ([0, 1] depth range).
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_radians, self.aspect_ratio, self.z_near, self.z_far)
    }

    /// The combined world-to-clip matrix.
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// The eight world-space corners of the camera's frustum.
    pub fn frustum_corners_world_space(&self) -> [Vec3; 8] {
        let inverse = self.view_projection_matrix().inverse();
        let mut corners = [Vec3::ZERO; 8];
        let mut i = 0;
        for x in [-1.0f32, 1.0] {
            for y in [-1.0f32, 1.0] {
                for z in [0.0f32, 1.0] {
                    let corner = inverse * glam::Vec4::new(x, y, z, 1.0);
                    corners[i] = corner.truncate() / corner.w;
                    i += 1;
                }
            }
        }
        corners
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(std::f32::consts::FRAC_PI_3, 16.0 / 9.0, 0.1, 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn view_matrix_inverts_transform() {
        let mut camera = Camera::default();
        camera.set_position(Vec3::new(3.0, 2.0, 1.0));
        let eye_in_view = camera.view_matrix() * camera.position().extend(1.0);
        assert_relative_eq!(eye_in_view.truncate().length(), 0.0, epsilon = 1e-5);
    }

    #[test]
    fn frustum_corners_straddle_clip_planes() {
        let camera = Camera::perspective(std::f32::consts::FRAC_PI_2, 1.0, 1.0, 10.0);
        let corners = camera.frustum_corners_world_space();
        let near: Vec3 = corners.iter().filter(|c| c.z > -5.0).copied().sum::<Vec3>() / 4.0;
        let far: Vec3 = corners.iter().filter(|c| c.z <= -5.0).copied().sum::<Vec3>() / 4.0;
        assert_relative_eq!(near.z, -1.0, epsilon = 1e-4);
        assert_relative_eq!(far.z, -10.0, epsilon = 1e-3);
    }
}
