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

//! Rendering hardware interface: the trait contracts every backend
//! implements and the enums, flags, and descriptors shared across them.
//!
//! Resources are held through `Arc<dyn Trait>` handles. Every resource also
//! carries a process-unique typed ID used for hashing and identity (pipeline
//! cache keys, layout tracking) without reaching through the trait object.

mod barrier;
mod buffer;
mod command_buffer;
mod descriptor_set;
mod device;
mod flags;
mod format;
mod framebuffer;
mod handle;
mod pipeline;
mod queue;
mod render_pass;
mod shader;
mod swapchain;
mod texture;

pub use barrier::{AccessFlags, ImageMemoryBarrier, PipelineBarrier, PipelineStageFlags};
pub use buffer::{Buffer, VertexAttribute, VertexAttributeFormat, VertexBufferLayout};
pub use command_buffer::CommandBuffer;
pub use descriptor_set::{DescriptorSet, DescriptorSetLayout, DescriptorType};
pub use device::GraphicsDevice;
pub use flags::{ImageUsageFlags, ShaderStageFlags};
pub use format::{
    CullMode, ImageFormat, ImageLayout, MsaaSampleCount, ShaderStage, TextureType,
};
pub use framebuffer::Framebuffer;
pub use handle::{
    BufferHandle, BufferId, CommandBufferHandle, CommandQueueHandle, DescriptorSetHandle,
    DescriptorSetId, FramebufferHandle, FramebufferId, PipelineStateHandle, PipelineStateId,
    RenderPassHandle, RenderPassId, RenderTargetHandle, ShaderHandle, ShaderId, SwapchainHandle,
    TextureHandle, TextureId,
};
pub use pipeline::{
    ComputePipelineDescriptor, GraphicsPipelineDescriptor, PipelineState, PipelineType,
};
pub use queue::CommandQueue;
pub use render_pass::{
    AttachmentDescription, AttachmentIndex, AttachmentLoadOp, AttachmentStoreOp, ClearValue,
    RenderPass,
};
pub use shader::Shader;
pub use swapchain::{RenderTarget, Swapchain};
pub use texture::{SamplerFilter, Texture, TextureDescriptor};
