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

//! Scene-level data submitted to the renderer: meshes, materials,
//! environment maps, and the per-frame scene description.

use std::sync::{Arc, RwLock};

use glam::Vec3;

use crate::camera::Camera;
use crate::light::Light;
use crate::rhi::{BufferHandle, DescriptorSetHandle, ShaderHandle, TextureHandle, VertexBufferLayout};

/// A sphere enclosing a mesh in model space, used for frustum culling.
#[derive(Debug, Clone, Copy)]
pub struct BoundingSphere {
    /// Center of the sphere in model space.
    pub center: Vec3,
    /// Radius of the sphere in model units.
    pub radius: f32,
}

/// The shading model a material is lit with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderModel {
    /// Physically based shading.
    Pbr,
    /// No lighting; base color passes through.
    Unlit,
}

/// How a material's metallic/roughness data is laid out across its textures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureConvention {
    /// Separate metallic and roughness textures.
    Unpacked,
    /// Occlusion/roughness/metallic packed into one texture's channels.
    OrmPacked,
}

/// A material: shading inputs bound as one descriptor set.
#[derive(Debug, Clone)]
pub struct Material {
    /// The shading model.
    pub shader_model: ShaderModel,
    /// Texture channel packing, selects the geometry shader variant.
    pub texture_convention: TextureConvention,
    /// The material's bound textures and factors.
    pub descriptor_set: DescriptorSetHandle,
    /// Whether a normal map is bound.
    pub has_normal_map: bool,
    /// Whether the normal map uses the DirectX green channel convention.
    pub has_directx_normals: bool,
    /// Whether the material blends with the backdrop. Alpha-blended
    /// materials select a blending pipeline variant.
    pub is_alpha_blended: bool,
}

/// A renderable mesh: GPU geometry plus its culling volume.
#[derive(Debug, Clone)]
pub struct Mesh {
    /// Vertex data.
    pub vertex_buffer: BufferHandle,
    /// 32-bit index data.
    pub index_buffer: BufferHandle,
    /// Number of indices to draw.
    pub index_count: u32,
    /// Layout of the vertex data, part of the pipeline key.
    pub vertex_layout: VertexBufferLayout,
    /// The vertex shader that consumes this layout.
    pub vertex_shader: ShaderHandle,
    /// Model-space bounding sphere.
    pub bounding_sphere: BoundingSphere,
}

/// An image-based lighting environment.
///
/// The irradiance and prefiltered maps start empty and are computed by the
/// renderer the first time the environment is submitted.
#[derive(Debug)]
pub struct EnvironmentMap {
    /// The source environment cubemap.
    pub environment: TextureHandle,
    /// Cosine-convolved irradiance cubemap, filled by the renderer.
    pub irradiance: RwLock<Option<TextureHandle>>,
    /// Roughness-prefiltered specular cubemap, filled by the renderer.
    pub prefiltered: RwLock<Option<TextureHandle>>,
}

impl EnvironmentMap {
    /// Wraps a source cubemap with empty derived maps.
    pub fn new(environment: TextureHandle) -> Self {
        Self {
            environment,
            irradiance: RwLock::new(None),
            prefiltered: RwLock::new(None),
        }
    }
}

/// Everything the renderer needs to know about a frame's scene, passed to
/// `begin_scene`.
#[derive(Debug, Clone)]
pub struct SceneDescription<'a> {
    /// The camera the scene is viewed through.
    pub camera: &'a Camera,
    /// The frame's light list. The first directional light casts the
    /// cascaded shadows.
    pub lights: &'a [Light],
    /// The lighting environment, if any.
    pub environment_map: Option<Arc<EnvironmentMap>>,
    /// Uniform ambient contribution.
    pub ambient_light_constant: f32,
    /// Exposure applied before tone mapping.
    pub exposure: f32,
    /// Blur factor for the environment backdrop, selects a prefiltered mip.
    pub environment_blur: f32,
}
