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

//! The headless device: creates host-memory resources and logs submissions.

use std::sync::{Arc, Mutex};

use glam::UVec2;

use vesper_core::error::{PipelineError, RenderError, ResourceError};
use vesper_core::rhi::{
    BufferHandle, CommandBuffer as _, CommandBufferHandle, CommandQueueHandle,
    ComputePipelineDescriptor, DescriptorSetHandle, FramebufferHandle, GraphicsDevice,
    GraphicsPipelineDescriptor, PipelineStateHandle, PipelineType, RenderPass as _,
    RenderPassHandle, Shader as _, ShaderHandle, ShaderStage, SwapchainHandle, TextureDescriptor,
    TextureHandle, VertexBufferLayout,
};

use super::command::HeadlessCommandBuffer;
use super::lock;
use super::resources::{
    HeadlessBuffer, HeadlessDescriptorSet, HeadlessFramebuffer, HeadlessPipelineState,
    HeadlessRenderPass, HeadlessShader, HeadlessTexture,
};
use super::swapchain::{HeadlessQueue, HeadlessSwapchain};

/// A graphics device backed entirely by host memory.
#[derive(Debug)]
pub struct HeadlessDevice {
    swapchain: Arc<HeadlessSwapchain>,
    queue: Arc<HeadlessQueue>,
    one_time_buffers: Mutex<Vec<Arc<HeadlessCommandBuffer>>>,
}

impl HeadlessDevice {
    /// Creates a device whose swapchain has `image_count` images of the
    /// given size.
    pub fn new(dimensions: UVec2, image_count: u32) -> Self {
        log::debug!(
            "Headless device created: {}x{} swapchain, {image_count} images",
            dimensions.x,
            dimensions.y
        );
        Self {
            swapchain: Arc::new(HeadlessSwapchain::new(dimensions, image_count)),
            queue: Arc::new(HeadlessQueue::default()),
            one_time_buffers: Mutex::new(Vec::new()),
        }
    }

    /// Creates a shader module stub for the given stage.
    pub fn create_shader(&self, stage: ShaderStage, label: &str) -> ShaderHandle {
        Arc::new(HeadlessShader::new(stage, label))
    }

    /// The queue, concretely typed for submission inspection.
    pub fn headless_queue(&self) -> Arc<HeadlessQueue> {
        self.queue.clone()
    }

    /// All command buffers recorded by `execute_one_time_and_block`.
    pub fn one_time_command_buffers(&self) -> Vec<Arc<HeadlessCommandBuffer>> {
        lock(&self.one_time_buffers).clone()
    }
}

impl GraphicsDevice for HeadlessDevice {
    fn swapchain(&self) -> SwapchainHandle {
        self.swapchain.clone()
    }

    fn primary_queue(&self) -> CommandQueueHandle {
        self.queue.clone()
    }

    fn allocate_command_buffer(&self, label: &str) -> CommandBufferHandle {
        Arc::new(HeadlessCommandBuffer::new(label))
    }

    fn create_render_pass(&self, label: &str) -> RenderPassHandle {
        Arc::new(HeadlessRenderPass::new(label))
    }

    fn create_framebuffer(
        &self,
        render_pass: &RenderPassHandle,
        label: &str,
    ) -> FramebufferHandle {
        Arc::new(HeadlessFramebuffer::new(
            label,
            render_pass.attachment_count(),
        ))
    }

    fn create_descriptor_set(&self, label: &str) -> DescriptorSetHandle {
        Arc::new(HeadlessDescriptorSet::new(label))
    }

    fn create_vertex_buffer(
        &self,
        data: &[u8],
        layout: &VertexBufferLayout,
        label: &str,
    ) -> Result<BufferHandle, ResourceError> {
        if layout.stride == 0 || data.len() % layout.stride as usize != 0 {
            return Err(ResourceError::CreationFailed {
                label: label.to_string(),
                details: format!(
                    "{} bytes of vertex data do not divide by stride {}",
                    data.len(),
                    layout.stride
                ),
            });
        }
        Ok(Arc::new(HeadlessBuffer::new(
            data.len() as u64,
            Some(data),
            label,
        )))
    }

    fn create_index_buffer(
        &self,
        indices: &[u32],
        label: &str,
    ) -> Result<BufferHandle, ResourceError> {
        Ok(Arc::new(HeadlessBuffer::new(
            std::mem::size_of_val(indices) as u64,
            Some(bytemuck::cast_slice(indices)),
            label,
        )))
    }

    fn create_uniform_buffer(
        &self,
        data: Option<&[u8]>,
        size: u64,
        label: &str,
    ) -> Result<BufferHandle, ResourceError> {
        Ok(Arc::new(HeadlessBuffer::new(size, data, label)))
    }

    fn create_storage_buffer(
        &self,
        data: Option<&[u8]>,
        size: u64,
        label: &str,
    ) -> Result<BufferHandle, ResourceError> {
        Ok(Arc::new(HeadlessBuffer::new(size, data, label)))
    }

    fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
    ) -> Result<TextureHandle, ResourceError> {
        if descriptor.dimensions.x == 0 || descriptor.dimensions.y == 0 {
            return Err(ResourceError::CreationFailed {
                label: descriptor.label.clone(),
                details: "texture dimensions must be non-zero".to_string(),
            });
        }
        Ok(Arc::new(HeadlessTexture::new(descriptor)))
    }

    fn create_cubemap(
        &self,
        descriptor: &TextureDescriptor,
    ) -> Result<TextureHandle, ResourceError> {
        if descriptor.layer_count != 6 {
            return Err(ResourceError::CreationFailed {
                label: descriptor.label.clone(),
                details: format!("cubemaps need 6 layers, got {}", descriptor.layer_count),
            });
        }
        self.create_texture(descriptor)
    }

    fn create_graphics_pipeline(
        &self,
        descriptor: &GraphicsPipelineDescriptor,
    ) -> Result<PipelineStateHandle, PipelineError> {
        if descriptor.vertex_shader.stage() != ShaderStage::Vertex {
            return Err(PipelineError::CompilationFailed {
                label: Some(descriptor.label.clone()),
                details: format!(
                    "'{}' is not a vertex shader",
                    descriptor.vertex_shader.label()
                ),
            });
        }
        if let Some(fragment) = &descriptor.fragment_shader {
            if fragment.stage() != ShaderStage::Fragment {
                return Err(PipelineError::CompilationFailed {
                    label: Some(descriptor.label.clone()),
                    details: format!("'{}' is not a fragment shader", fragment.label()),
                });
            }
        }
        Ok(Arc::new(HeadlessPipelineState::new(
            PipelineType::Graphics,
            &descriptor.label,
        )))
    }

    fn create_compute_pipeline(
        &self,
        descriptor: &ComputePipelineDescriptor,
    ) -> Result<PipelineStateHandle, PipelineError> {
        if descriptor.shader.stage() != ShaderStage::Compute {
            return Err(PipelineError::CompilationFailed {
                label: Some(descriptor.label.clone()),
                details: format!("'{}' is not a compute shader", descriptor.shader.label()),
            });
        }
        Ok(Arc::new(HeadlessPipelineState::new(
            PipelineType::Compute,
            &descriptor.label,
        )))
    }

    fn execute_one_time_and_block(
        &self,
        record: &mut dyn FnMut(&CommandBufferHandle),
    ) -> Result<(), RenderError> {
        let buffer = Arc::new(HeadlessCommandBuffer::new("One-Time Commands"));
        let handle: CommandBufferHandle = buffer.clone();
        handle.begin_recording()?;
        record(&handle);
        handle.end_recording()?;
        lock(&self.one_time_buffers).push(buffer);
        Ok(())
    }

    fn wait_idle(&self) {}
}
