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

//! The central device contract: resource creation and submission entry
//! points every backend implements.

use std::fmt::Debug;

use crate::error::{PipelineError, RenderError, ResourceError};

use super::{
    BufferHandle, CommandBufferHandle, CommandQueueHandle, ComputePipelineDescriptor,
    DescriptorSetHandle, FramebufferHandle, GraphicsPipelineDescriptor, PipelineStateHandle,
    RenderPassHandle, SwapchainHandle, TextureDescriptor, TextureHandle, VertexBufferLayout,
};

/// A logical graphics device.
///
/// All creation methods take a debug label that backends attach to the GPU
/// object for frame-debugger visibility.
pub trait GraphicsDevice: Debug + Send + Sync {
    /// The device's swapchain.
    fn swapchain(&self) -> SwapchainHandle;

    /// The queue rendering submissions go to.
    fn primary_queue(&self) -> CommandQueueHandle;

    /// Allocates a resettable command buffer.
    fn allocate_command_buffer(&self, label: &str) -> CommandBufferHandle;

    /// Creates an empty render pass ready for building.
    fn create_render_pass(&self, label: &str) -> RenderPassHandle;

    /// Creates an empty framebuffer for the given render pass.
    fn create_framebuffer(&self, render_pass: &RenderPassHandle, label: &str)
        -> FramebufferHandle;

    /// Creates an empty descriptor set ready for building.
    fn create_descriptor_set(&self, label: &str) -> DescriptorSetHandle;

    /// Creates a vertex buffer initialized with `data`.
    fn create_vertex_buffer(
        &self,
        data: &[u8],
        layout: &VertexBufferLayout,
        label: &str,
    ) -> Result<BufferHandle, ResourceError>;

    /// Creates an index buffer of 32-bit indices.
    fn create_index_buffer(&self, indices: &[u32], label: &str)
        -> Result<BufferHandle, ResourceError>;

    /// Creates a uniform buffer of `size` bytes, optionally initialized.
    fn create_uniform_buffer(
        &self,
        data: Option<&[u8]>,
        size: u64,
        label: &str,
    ) -> Result<BufferHandle, ResourceError>;

    /// Creates a storage buffer of `size` bytes, optionally initialized.
    fn create_storage_buffer(
        &self,
        data: Option<&[u8]>,
        size: u64,
        label: &str,
    ) -> Result<BufferHandle, ResourceError>;

    /// Creates a texture per the descriptor.
    fn create_texture(&self, descriptor: &TextureDescriptor)
        -> Result<TextureHandle, ResourceError>;

    /// Creates a six-layer cubemap per the descriptor.
    fn create_cubemap(&self, descriptor: &TextureDescriptor)
        -> Result<TextureHandle, ResourceError>;

    /// Compiles a graphics pipeline.
    fn create_graphics_pipeline(
        &self,
        descriptor: &GraphicsPipelineDescriptor,
    ) -> Result<PipelineStateHandle, PipelineError>;

    /// Compiles a compute pipeline.
    fn create_compute_pipeline(
        &self,
        descriptor: &ComputePipelineDescriptor,
    ) -> Result<PipelineStateHandle, PipelineError>;

    /// Records commands into a one-time buffer, submits it, and blocks until
    /// the GPU finishes. Used for startup work such as environment map
    /// precomputation.
    fn execute_one_time_and_block(
        &self,
        record: &mut dyn FnMut(&CommandBufferHandle),
    ) -> Result<(), RenderError>;

    /// Blocks until the device is idle.
    fn wait_idle(&self);
}
