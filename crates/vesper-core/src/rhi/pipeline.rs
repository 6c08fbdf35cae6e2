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

//! Pipeline state objects and their creation descriptors.

use std::any::Any;
use std::fmt::Debug;

use super::{
    CullMode, DescriptorSetLayout, MsaaSampleCount, PipelineStateId, RenderPassHandle,
    ShaderHandle, VertexBufferLayout,
};

/// Whether a pipeline binds to the graphics or compute bind point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineType {
    /// A graphics pipeline.
    Graphics,
    /// A compute pipeline.
    Compute,
}

/// Everything needed to compile a graphics pipeline.
#[derive(Debug, Clone)]
pub struct GraphicsPipelineDescriptor {
    /// Debug label attached to the GPU object.
    pub label: String,
    /// The render pass the pipeline renders within.
    pub render_pass: RenderPassHandle,
    /// Index of the subpass within the render pass.
    pub subpass_index: u32,
    /// The vertex shader module.
    pub vertex_shader: ShaderHandle,
    /// The fragment shader module, absent for depth-only pipelines.
    pub fragment_shader: Option<ShaderHandle>,
    /// Descriptor set layouts in set-index order.
    pub descriptor_set_layouts: Vec<DescriptorSetLayout>,
    /// Layout of the bound vertex buffer.
    pub vertex_buffer_layout: VertexBufferLayout,
    /// Triangle face culling.
    pub cull_mode: CullMode,
    /// Multisample count of the subpass's attachments.
    pub sample_count: MsaaSampleCount,
    /// Whether alpha blending is enabled on the color targets.
    pub alpha_blended: bool,
    /// Size in bytes of the push constant range, zero if unused.
    pub push_constant_size: u32,
}

/// Everything needed to compile a compute pipeline.
#[derive(Debug, Clone)]
pub struct ComputePipelineDescriptor {
    /// Debug label attached to the GPU object.
    pub label: String,
    /// The compute shader module.
    pub shader: ShaderHandle,
    /// Descriptor set layouts in set-index order.
    pub descriptor_set_layouts: Vec<DescriptorSetLayout>,
    /// Size in bytes of the push constant range, zero if unused.
    pub push_constant_size: u32,
}

/// A compiled pipeline state object.
pub trait PipelineState: Debug + Send + Sync {
    /// The pipeline's process-unique ID.
    fn id(&self) -> PipelineStateId;

    /// The bind point this pipeline targets.
    fn pipeline_type(&self) -> PipelineType;

    /// Downcasting support for backends.
    fn as_any(&self) -> &dyn Any;
}
