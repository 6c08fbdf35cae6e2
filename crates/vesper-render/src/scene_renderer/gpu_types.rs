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

//! GPU-visible structs uploaded to uniform/storage buffers and push
//! constants. Layouts are `#[repr(C)]` and match the std140/std430 rules of
//! the shaders; padding is explicit.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, UVec4, Vec4};

/// Flag bit in [`SceneUniforms::counts`].z: tint cascade boundaries.
pub const SCENE_FLAG_SHOW_CASCADES: u32 = 1 << 0;
/// Flag bit in [`SceneUniforms::counts`].z: shadow sampling disabled.
pub const SCENE_FLAG_SHADOWS_OFF: u32 = 1 << 1;

/// Per-frame scene constants, bound at set 0 binding 0.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct SceneUniforms {
    /// World-to-view matrix.
    pub view: Mat4,
    /// View-to-clip matrix.
    pub projection: Mat4,
    /// World-to-clip matrix.
    pub view_projection: Mat4,
    /// Clip-to-world matrix, used to reconstruct positions from depth.
    pub inverse_view_projection: Mat4,
    /// Camera world position, w unused.
    pub camera_position: Vec4,
    /// View-space far depths of up to eight shadow cascades.
    pub cascade_splits: [Vec4; 2],
    /// x: ambient constant, y: shadow bias, z: shadow z multiplier,
    /// w: environment blur.
    pub lighting_params: Vec4,
    /// x: light count, y: cascade count, z: scene flag bits,
    /// w: shadow map resolution.
    pub counts: UVec4,
}

/// One light in the set 0 binding 1 storage buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct GpuLight {
    /// xyz: position (point) or direction (directional); w: 0 for point,
    /// 1 for directional.
    pub position: Vec4,
    /// Linear RGB premultiplied by intensity, w unused.
    pub color: Vec4,
}

/// Push constants of the geometry and forward lighting pipelines.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct ObjectPushConstants {
    /// Model-to-world matrix.
    pub model: Mat4,
    /// x: material flag bits (see `MATERIAL_FLAG_*`), yzw unused.
    pub flags: UVec4,
}

/// Material flag: a normal map is bound.
pub const MATERIAL_FLAG_NORMAL_MAP: u32 = 1 << 0;
/// Material flag: normal map green channel follows the DirectX convention.
pub const MATERIAL_FLAG_DIRECTX_NORMALS: u32 = 1 << 1;

/// Push constants of the depth-only pipelines (pre-pass and shadows).
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct DepthPushConstants {
    /// Model-to-world matrix.
    pub model: Mat4,
}

/// Push constants of the environment backdrop pipeline.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct EnvironmentPushConstants {
    /// Rotation-only view matrix composed with the projection, so the
    /// backdrop follows the camera without translating.
    pub rotation_view_projection: Mat4,
    /// x: blur factor selecting a prefiltered mip, yzw unused.
    pub params: Vec4,
}

/// Push constants shared by the post-processing pipelines.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct PostProcessPushConstants {
    /// Tone mapping: x exposure, y operator (0 ACES LUT, 1 none,
    /// 2 Reinhard). FXAA: xy inverse output size.
    pub params: Vec4,
}

/// Push constants of the prefiltered-environment compute pipeline.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct PrefilterPushConstants {
    /// x: roughness of the target mip, y: mip side length in texels,
    /// zw unused.
    pub params: Vec4,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{align_of, size_of};

    #[test]
    fn scene_uniforms_layout() {
        assert_eq!(size_of::<SceneUniforms>(), 4 * 64 + 16 + 32 + 16 + 16);
        assert_eq!(align_of::<SceneUniforms>() % 16, 0);
    }

    #[test]
    fn gpu_light_is_two_vec4s() {
        assert_eq!(size_of::<GpuLight>(), 32);
    }

    #[test]
    fn push_constant_sizes_fit_common_limits() {
        // 128 bytes is the guaranteed push constant budget.
        assert!(size_of::<ObjectPushConstants>() <= 128);
        assert!(size_of::<EnvironmentPushConstants>() <= 128);
        assert_eq!(size_of::<DepthPushConstants>(), 64);
        assert_eq!(size_of::<PostProcessPushConstants>(), 16);
    }
}
