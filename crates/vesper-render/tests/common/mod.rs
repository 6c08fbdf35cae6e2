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

//! Shared harness for the headless-backend integration tests.

// Each integration test binary uses a different subset of these helpers.
#![allow(dead_code)]

use std::sync::Arc;

use glam::{UVec2, Vec3};

use vesper_core::rhi::{
    DescriptorSet as _, GraphicsDevice, ImageFormat, ImageLayout, ImageUsageFlags,
    MsaaSampleCount, SamplerFilter, ShaderStage, ShaderStageFlags, TextureDescriptor, TextureType,
    VertexAttributeFormat, VertexBufferLayout,
};
use vesper_core::scene::{BoundingSphere, ShaderModel, TextureConvention};
use vesper_core::{Material, Mesh, RendererSettings};
use vesper_infra::HeadlessDevice;
use vesper_render::{RendererAssets, SceneRenderer};

pub const VIEWPORT: UVec2 = UVec2::new(1920, 1080);
pub const FRAMES: u32 = 3;

pub fn device() -> Arc<HeadlessDevice> {
    let _ = env_logger::builder().is_test(true).try_init();
    Arc::new(HeadlessDevice::new(VIEWPORT, FRAMES))
}

pub fn renderer(device: &Arc<HeadlessDevice>, settings: RendererSettings) -> SceneRenderer {
    let handle: Arc<dyn GraphicsDevice> = device.clone();
    SceneRenderer::new(handle, assets(device), settings).expect("renderer construction")
}

pub fn assets(device: &HeadlessDevice) -> RendererAssets {
    RendererAssets {
        fullscreen_vertex_shader: device.create_shader(ShaderStage::Vertex, "fullscreen.vert"),
        cubemap_vertex_shader: device.create_shader(ShaderStage::Vertex, "cubemap.vert"),
        depth_only_vertex_shader: device.create_shader(ShaderStage::Vertex, "depth_only.vert"),
        shadow_vertex_shader: device.create_shader(ShaderStage::Vertex, "shadow.vert"),
        deferred_geometry_unpacked_shader: device
            .create_shader(ShaderStage::Fragment, "geometry_unpacked.frag"),
        deferred_geometry_orm_shader: device
            .create_shader(ShaderStage::Fragment, "geometry_orm.frag"),
        deferred_lighting_shader: device
            .create_shader(ShaderStage::Fragment, "deferred_lighting.frag"),
        forward_unpacked_shader: device
            .create_shader(ShaderStage::Fragment, "forward_unpacked.frag"),
        forward_orm_shader: device.create_shader(ShaderStage::Fragment, "forward_orm.frag"),
        environment_shader: device.create_shader(ShaderStage::Fragment, "environment.frag"),
        tone_mapping_shader: device.create_shader(ShaderStage::Fragment, "tone_mapping.frag"),
        fxaa_shader: device.create_shader(ShaderStage::Fragment, "fxaa.frag"),
        irradiance_compute_shader: device.create_shader(ShaderStage::Compute, "irradiance.comp"),
        prefilter_compute_shader: device.create_shader(ShaderStage::Compute, "prefilter.comp"),
        quad_mesh: mesh(device, "Fullscreen Quad"),
        cube_mesh: mesh(device, "Unit Cube"),
        brdf_lut: device
            .create_texture(&TextureDescriptor::image_2d(
                "BRDF LUT",
                ImageFormat::Rgba16Float,
                UVec2::splat(512),
                ImageUsageFlags::SAMPLED,
            ))
            .expect("brdf lut"),
        tone_mapping_lut: device
            .create_texture(&TextureDescriptor::image_2d(
                "ACES LUT",
                ImageFormat::Rgba8Unorm,
                UVec2::splat(32),
                ImageUsageFlags::SAMPLED,
            ))
            .expect("tone mapping lut"),
        fallback_cubemap: cubemap(device, "Fallback Cubemap", 1),
    }
}

pub fn cubemap(device: &HeadlessDevice, label: &str, size: u32) -> vesper_core::rhi::TextureHandle {
    device
        .create_cubemap(&TextureDescriptor {
            label: label.to_string(),
            texture_type: TextureType::Cubemap,
            format: ImageFormat::Rgba16Float,
            dimensions: UVec2::splat(size),
            layer_count: 6,
            mip_count: 1,
            sample_count: MsaaSampleCount::One,
            usage: ImageUsageFlags::SAMPLED,
            filter: SamplerFilter::Linear,
        })
        .expect("cubemap creation")
}

pub fn mesh(device: &HeadlessDevice, label: &str) -> Mesh {
    let layout = VertexBufferLayout::packed(&[
        VertexAttributeFormat::Float32x3,
        VertexAttributeFormat::Float32x3,
        VertexAttributeFormat::Float32x2,
    ]);
    let vertices = vec![0u8; layout.stride as usize * 3];
    Mesh {
        vertex_buffer: device
            .create_vertex_buffer(&vertices, &layout, label)
            .expect("vertex buffer"),
        index_buffer: device
            .create_index_buffer(&[0, 1, 2], label)
            .expect("index buffer"),
        index_count: 3,
        vertex_layout: layout,
        vertex_shader: device.create_shader(ShaderStage::Vertex, "mesh.vert"),
        bounding_sphere: BoundingSphere {
            center: Vec3::ZERO,
            radius: 1.0,
        },
    }
}

pub fn material(device: &HeadlessDevice, alpha_blended: bool) -> Material {
    let base_color = device
        .create_texture(&TextureDescriptor::image_2d(
            "Base Color",
            ImageFormat::Rgba8Unorm,
            UVec2::splat(4),
            ImageUsageFlags::SAMPLED,
        ))
        .expect("material texture");
    let descriptor_set = device.create_descriptor_set("Material");
    descriptor_set.begin_building();
    descriptor_set.add_image_sampler(
        &base_color,
        ShaderStageFlags::FRAGMENT,
        ImageLayout::ShaderReadOnly,
    );
    descriptor_set
        .end_building()
        .expect("material descriptor set");
    Material {
        shader_model: ShaderModel::Pbr,
        texture_convention: TextureConvention::Unpacked,
        descriptor_set,
        has_normal_map: false,
        has_directx_normals: false,
        is_alpha_blended: alpha_blended,
    }
}
