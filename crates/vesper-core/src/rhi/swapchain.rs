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

//! Swapchain and presentable image contracts.

use std::any::Any;
use std::fmt::Debug;

use glam::UVec2;

use crate::error::{RenderError, ResourceError};

use super::{ImageFormat, RenderTargetHandle, TextureHandle};

/// The chain of presentable images.
///
/// The number of images bounds the number of frames in flight; frame-local
/// renderer resources are indexed by the acquired image index.
pub trait Swapchain: Debug + Send + Sync {
    /// Blocks until the next presentable image is available and returns it.
    fn acquire_next_image(&self) -> Result<RenderTargetHandle, RenderError>;

    /// Number of images in the chain.
    fn image_count(&self) -> u32;

    /// All presentable images, indexed by image index. Needed up front when
    /// a render graph binds its output attachment to the window.
    fn render_targets(&self) -> Vec<RenderTargetHandle>;

    /// Texel format of the presentable images.
    fn format(&self) -> ImageFormat;

    /// Current dimensions of the presentable images.
    fn dimensions(&self) -> UVec2;

    /// Recreates the chain at a new size. Outstanding render targets become
    /// invalid.
    fn recreate(&self, dimensions: UVec2) -> Result<(), ResourceError>;

    /// Recreates the chain with a different present mode.
    fn set_vsync(&self, enabled: bool) -> Result<(), ResourceError>;

    /// Downcasting support for backends.
    fn as_any(&self) -> &dyn Any;
}

/// One presentable swapchain image.
pub trait RenderTarget: Debug + Send + Sync {
    /// The image's index within the swapchain.
    fn image_index(&self) -> u32;

    /// Width and height in texels.
    fn dimensions(&self) -> UVec2;

    /// The image viewed as a texture, e.g. for framebuffer attachment.
    fn as_texture(&self) -> TextureHandle;

    /// Downcasting support for backends.
    fn as_any(&self) -> &dyn Any;
}
