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

//! Pipeline cache memoization against the headless backend.

mod common;

use std::sync::Arc;

use vesper_core::rhi::{
    CullMode, DescriptorSetLayout, DescriptorType, GraphicsDevice, GraphicsPipelineDescriptor,
    ImageFormat, ImageLayout, MsaaSampleCount, PipelineState as _, RenderPass as _,
    RenderPassHandle, ShaderStage, VertexBufferLayout,
};
use vesper_infra::HeadlessDevice;
use vesper_render::graph::color_attachment;
use vesper_render::PipelineStateCache;

fn single_color_pass(device: &HeadlessDevice) -> RenderPassHandle {
    let render_pass = device.create_render_pass("Cache Test Pass");
    render_pass.begin_building();
    let index =
        render_pass.define_attachment(&color_attachment(ImageFormat::Rgba16Float, [0.0; 4]));
    render_pass.begin_subpass();
    render_pass.add_color_attachment(index, ImageLayout::ColorAttachment);
    render_pass.end_subpass();
    render_pass.end_building().unwrap();
    render_pass
}

fn descriptor(device: &HeadlessDevice, render_pass: &RenderPassHandle) -> GraphicsPipelineDescriptor {
    GraphicsPipelineDescriptor {
        label: "Cache Test".to_string(),
        render_pass: render_pass.clone(),
        subpass_index: 0,
        vertex_shader: device.create_shader(ShaderStage::Vertex, "test.vert"),
        fragment_shader: Some(device.create_shader(ShaderStage::Fragment, "test.frag")),
        descriptor_set_layouts: vec![DescriptorSetLayout {
            bindings: vec![DescriptorType::UniformBuffer],
        }],
        vertex_buffer_layout: VertexBufferLayout::default(),
        cull_mode: CullMode::Back,
        sample_count: MsaaSampleCount::One,
        alpha_blended: false,
        push_constant_size: 0,
    }
}

#[test]
fn identical_descriptors_compile_once() {
    let device = common::device();
    let render_pass = single_color_pass(&device);
    let mut cache = PipelineStateCache::new(device.clone() as Arc<dyn GraphicsDevice>);

    let request = descriptor(&device, &render_pass);
    let first = cache.get_graphics_pipeline(&request).unwrap();
    let second = cache.get_graphics_pipeline(&request).unwrap();

    assert_eq!(first.id(), second.id());
    assert_eq!(cache.graphics_pipeline_count(), 1);
}

#[test]
fn differing_state_compiles_a_new_pipeline() {
    let device = common::device();
    let render_pass = single_color_pass(&device);
    let mut cache = PipelineStateCache::new(device.clone() as Arc<dyn GraphicsDevice>);

    // Same shaders throughout so only the varied field distinguishes keys.
    let base = descriptor(&device, &render_pass);
    let back = cache.get_graphics_pipeline(&base).unwrap();

    let mut front = base.clone();
    front.cull_mode = CullMode::Front;
    let front = cache.get_graphics_pipeline(&front).unwrap();
    assert_ne!(back.id(), front.id());
    assert_eq!(cache.graphics_pipeline_count(), 2);

    let mut msaa = base.clone();
    msaa.sample_count = MsaaSampleCount::Four;
    cache.get_graphics_pipeline(&msaa).unwrap();
    assert_eq!(cache.graphics_pipeline_count(), 3);

    // The label is cosmetic and not part of the key.
    let mut relabeled = base;
    relabeled.label = "Renamed".to_string();
    cache.get_graphics_pipeline(&relabeled).unwrap();
    assert_eq!(cache.graphics_pipeline_count(), 3);
}

#[test]
fn distinct_render_passes_key_separately() {
    // Pipeline compatibility is per render pass object, even when the passes
    // have identical structure.
    let device = common::device();
    let pass_a = single_color_pass(&device);
    let pass_b = single_color_pass(&device);
    assert_ne!(pass_a.id(), pass_b.id());

    let mut cache = PipelineStateCache::new(device.clone() as Arc<dyn GraphicsDevice>);
    let mut request = descriptor(&device, &pass_a);
    cache.get_graphics_pipeline(&request).unwrap();
    request.render_pass = pass_b;
    cache.get_graphics_pipeline(&request).unwrap();
    assert_eq!(cache.graphics_pipeline_count(), 2);
}

#[test]
fn compute_pipelines_memoize_on_shader_and_layouts() {
    let device = common::device();
    let mut cache = PipelineStateCache::new(device.clone() as Arc<dyn GraphicsDevice>);

    let shader = device.create_shader(ShaderStage::Compute, "convolve.comp");
    let layouts = vec![DescriptorSetLayout {
        bindings: vec![DescriptorType::ImageSampler, DescriptorType::StorageImage],
    }];

    let first = cache
        .get_compute_pipeline("Convolve", &shader, &layouts, 16)
        .unwrap();
    let second = cache
        .get_compute_pipeline("Convolve", &shader, &layouts, 16)
        .unwrap();
    assert_eq!(first.id(), second.id());
    assert_eq!(cache.compute_pipeline_count(), 1);

    let other = device.create_shader(ShaderStage::Compute, "prefilter.comp");
    cache
        .get_compute_pipeline("Prefilter", &other, &layouts, 16)
        .unwrap();
    assert_eq!(cache.compute_pipeline_count(), 2);
}

#[test]
fn wrong_stage_surfaces_a_pipeline_error() {
    let device = common::device();
    let render_pass = single_color_pass(&device);
    let mut cache = PipelineStateCache::new(device.clone() as Arc<dyn GraphicsDevice>);

    let mut bad = descriptor(&device, &render_pass);
    bad.vertex_shader = device.create_shader(ShaderStage::Fragment, "not_a_vertex.frag");
    assert!(cache.get_graphics_pipeline(&bad).is_err());
    assert_eq!(cache.graphics_pipeline_count(), 0);
}
