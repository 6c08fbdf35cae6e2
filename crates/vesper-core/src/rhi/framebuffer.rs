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

//! Framebuffer contract: binds concrete images to a render pass's
//! attachment slots.

use std::any::Any;
use std::fmt::Debug;

use glam::UVec2;

use crate::error::ResourceError;

use super::{FramebufferId, RenderTargetHandle, TextureHandle};

/// A set of images bound to a render pass's attachments.
///
/// Built with `begin_building` / `attach_*` calls in the pass's attachment
/// index order / `end_building`.
pub trait Framebuffer: Debug + Send + Sync {
    /// The framebuffer's process-unique ID.
    fn id(&self) -> FramebufferId;

    /// Starts declaring attachments for a target of the given size.
    fn begin_building(&self, dimensions: UVec2);

    /// Binds a texture to the next attachment slot.
    fn attach_texture(&self, texture: &TextureHandle);

    /// Binds a swapchain image to the next attachment slot.
    fn attach_render_target(&self, target: &RenderTargetHandle);

    /// Finalizes the framebuffer on the backend.
    fn end_building(&self) -> Result<(), ResourceError>;

    /// Width and height of the bound attachments.
    fn dimensions(&self) -> UVec2;

    /// Downcasting support for backends.
    fn as_any(&self) -> &dyn Any;
}
