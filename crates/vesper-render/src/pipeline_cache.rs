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

//! Memoizing cache for pipeline state objects.
//!
//! Pipeline compilation is the most expensive resource creation the renderer
//! performs, so every pass requests its pipelines through this cache. Keys
//! capture everything that affects pipeline compatibility; entries are never
//! evicted for the lifetime of the cache.

use std::collections::HashMap;
use std::sync::Arc;

use vesper_core::error::PipelineError;
use vesper_core::rhi::{
    ComputePipelineDescriptor, CullMode, DescriptorSetLayout, GraphicsDevice,
    GraphicsPipelineDescriptor, MsaaSampleCount, PipelineStateHandle, RenderPass as _,
    RenderPassId, Shader as _, ShaderHandle, ShaderId, VertexBufferLayout,
};

/// Identity of a graphics pipeline: two descriptors with equal keys compile
/// to interchangeable pipelines.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GraphicsPipelineKey {
    render_pass: RenderPassId,
    subpass_index: u32,
    vertex_shader: ShaderId,
    fragment_shader: Option<ShaderId>,
    descriptor_set_layouts: Vec<DescriptorSetLayout>,
    vertex_buffer_layout: VertexBufferLayout,
    cull_mode: CullMode,
    sample_count: MsaaSampleCount,
    alpha_blended: bool,
}

impl GraphicsPipelineKey {
    fn from_descriptor(descriptor: &GraphicsPipelineDescriptor) -> Self {
        Self {
            render_pass: descriptor.render_pass.id(),
            subpass_index: descriptor.subpass_index,
            vertex_shader: descriptor.vertex_shader.id(),
            fragment_shader: descriptor.fragment_shader.as_ref().map(|s| s.id()),
            descriptor_set_layouts: descriptor.descriptor_set_layouts.clone(),
            vertex_buffer_layout: descriptor.vertex_buffer_layout.clone(),
            cull_mode: descriptor.cull_mode,
            sample_count: descriptor.sample_count,
            alpha_blended: descriptor.alpha_blended,
        }
    }
}

/// Identity of a compute pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ComputePipelineKey {
    shader: ShaderId,
    descriptor_set_layouts: Vec<DescriptorSetLayout>,
}

/// Memoizes graphics and compute pipelines by their full compatibility key.
///
/// The descriptor-set shape is part of the request rather than ambient
/// state: callers pass the layouts of the sets they will bind, in set-index
/// order, inside the pipeline descriptor.
pub struct PipelineStateCache {
    device: Arc<dyn GraphicsDevice>,
    graphics: HashMap<GraphicsPipelineKey, PipelineStateHandle>,
    compute: HashMap<ComputePipelineKey, PipelineStateHandle>,
}

impl PipelineStateCache {
    /// Creates an empty cache for the given device.
    pub fn new(device: Arc<dyn GraphicsDevice>) -> Self {
        Self {
            device,
            graphics: HashMap::new(),
            compute: HashMap::new(),
        }
    }

    /// Returns the graphics pipeline for `descriptor`, compiling it on the
    /// first request and reusing it afterwards.
    pub fn get_graphics_pipeline(
        &mut self,
        descriptor: &GraphicsPipelineDescriptor,
    ) -> Result<PipelineStateHandle, PipelineError> {
        let key = GraphicsPipelineKey::from_descriptor(descriptor);
        if let Some(pipeline) = self.graphics.get(&key) {
            return Ok(pipeline.clone());
        }
        log::debug!(
            "Compiling graphics pipeline '{}' (cache size {})",
            descriptor.label,
            self.graphics.len()
        );
        let pipeline = self.device.create_graphics_pipeline(descriptor)?;
        self.graphics.insert(key, pipeline.clone());
        Ok(pipeline)
    }

    /// Returns the compute pipeline for the given shader and set layouts,
    /// compiling it on the first request.
    pub fn get_compute_pipeline(
        &mut self,
        label: &str,
        shader: &ShaderHandle,
        descriptor_set_layouts: &[DescriptorSetLayout],
        push_constant_size: u32,
    ) -> Result<PipelineStateHandle, PipelineError> {
        let key = ComputePipelineKey {
            shader: shader.id(),
            descriptor_set_layouts: descriptor_set_layouts.to_vec(),
        };
        if let Some(pipeline) = self.compute.get(&key) {
            return Ok(pipeline.clone());
        }
        log::debug!("Compiling compute pipeline '{label}'");
        let pipeline = self.device.create_compute_pipeline(&ComputePipelineDescriptor {
            label: label.to_string(),
            shader: shader.clone(),
            descriptor_set_layouts: descriptor_set_layouts.to_vec(),
            push_constant_size,
        })?;
        self.compute.insert(key, pipeline.clone());
        Ok(pipeline)
    }

    /// Number of cached graphics pipelines.
    pub fn graphics_pipeline_count(&self) -> usize {
        self.graphics.len()
    }

    /// Number of cached compute pipelines.
    pub fn compute_pipeline_count(&self) -> usize {
        self.compute.len()
    }
}

impl std::fmt::Debug for PipelineStateCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineStateCache")
            .field("graphics", &self.graphics.len())
            .field("compute", &self.compute.len())
            .finish()
    }
}
