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

//! Shared-ownership handles and typed resource IDs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::{
    Buffer, CommandBuffer, CommandQueue, DescriptorSet, Framebuffer, PipelineState, RenderPass,
    RenderTarget, Shader, Swapchain, Texture,
};

/// Shared handle to a GPU texture.
pub type TextureHandle = Arc<dyn Texture>;
/// Shared handle to a GPU buffer.
pub type BufferHandle = Arc<dyn Buffer>;
/// Shared handle to a compiled shader module.
pub type ShaderHandle = Arc<dyn Shader>;
/// Shared handle to a descriptor set.
pub type DescriptorSetHandle = Arc<dyn DescriptorSet>;
/// Shared handle to a render pass.
pub type RenderPassHandle = Arc<dyn RenderPass>;
/// Shared handle to a framebuffer.
pub type FramebufferHandle = Arc<dyn Framebuffer>;
/// Shared handle to a pipeline state object.
pub type PipelineStateHandle = Arc<dyn PipelineState>;
/// Shared handle to a command buffer.
pub type CommandBufferHandle = Arc<dyn CommandBuffer>;
/// Shared handle to a command queue.
pub type CommandQueueHandle = Arc<dyn CommandQueue>;
/// Shared handle to a swapchain.
pub type SwapchainHandle = Arc<dyn Swapchain>;
/// Shared handle to a presentable swapchain image.
pub type RenderTargetHandle = Arc<dyn RenderTarget>;

macro_rules! define_resource_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl $name {
            /// Allocates the next process-unique ID.
            pub fn next() -> Self {
                static COUNTER: AtomicU64 = AtomicU64::new(1);
                Self(COUNTER.fetch_add(1, Ordering::Relaxed))
            }
        }
    };
}

define_resource_id!(
    /// Process-unique identifier of a texture.
    TextureId
);
define_resource_id!(
    /// Process-unique identifier of a buffer.
    BufferId
);
define_resource_id!(
    /// Process-unique identifier of a shader module.
    ShaderId
);
define_resource_id!(
    /// Process-unique identifier of a descriptor set.
    DescriptorSetId
);
define_resource_id!(
    /// Process-unique identifier of a render pass.
    RenderPassId
);
define_resource_id!(
    /// Process-unique identifier of a framebuffer.
    FramebufferId
);
define_resource_id!(
    /// Process-unique identifier of a pipeline state object.
    PipelineStateId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_per_type() {
        let a = TextureId::next();
        let b = TextureId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }
}
