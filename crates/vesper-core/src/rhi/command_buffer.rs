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

//! Command buffer contract: the recording surface every pass draws through.

use std::any::Any;
use std::fmt::Debug;

use glam::{UVec2, Vec4};

use crate::error::RenderError;

use super::{
    BufferHandle, DescriptorSetHandle, FramebufferHandle, PipelineBarrier, PipelineStateHandle,
    RenderPassHandle,
};

/// A recorded stream of GPU commands.
///
/// Methods take `&self`; backends use interior mutability so recorded state
/// can live behind an `Arc`.
pub trait CommandBuffer: Debug + Send + Sync {
    /// Begins recording, resetting previous contents.
    fn begin_recording(&self) -> Result<(), RenderError>;

    /// Ends recording; the buffer becomes submittable.
    fn end_recording(&self) -> Result<(), RenderError>;

    /// Begins a render pass instance with the given framebuffer.
    fn begin_render_pass(&self, render_pass: &RenderPassHandle, framebuffer: &FramebufferHandle);

    /// Ends the current render pass instance.
    fn end_render_pass(&self);

    /// Binds a graphics or compute pipeline.
    fn bind_pipeline(&self, pipeline: &PipelineStateHandle);

    /// Binds a descriptor set at the given set index.
    fn bind_descriptor_set(&self, set: &DescriptorSetHandle, set_index: u32);

    /// Binds the vertex buffer at binding zero.
    fn bind_vertex_buffer(&self, buffer: &BufferHandle);

    /// Binds the index buffer (32-bit indices).
    fn bind_index_buffer(&self, buffer: &BufferHandle);

    /// Sets a full-target viewport and scissor.
    fn set_viewport_and_scissor(&self, dimensions: UVec2);

    /// Uploads push constants visible to all stages of the bound pipeline.
    fn push_constants(&self, data: &[u8]);

    /// Draws indexed geometry, one instance.
    fn draw_indexed(&self, index_count: u32);

    /// Draws indexed geometry with `instance_count` instances.
    fn draw_indexed_instanced(&self, index_count: u32, instance_count: u32);

    /// Dispatches compute work groups.
    fn dispatch(&self, groups_x: u32, groups_y: u32, groups_z: u32);

    /// Records a pipeline barrier with its image layout transitions.
    fn pipeline_barrier(&self, barrier: &PipelineBarrier);

    /// Opens a labeled region for frame debuggers.
    fn begin_label(&self, label: &str, color: Vec4);

    /// Closes the innermost labeled region.
    fn end_label(&self);

    /// Downcasting support for backends.
    fn as_any(&self) -> &dyn Any;
}
