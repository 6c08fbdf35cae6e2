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

//! GPU texture contract and creation descriptor.

use std::any::Any;
use std::fmt::Debug;

use glam::UVec2;

use super::{ImageFormat, ImageLayout, ImageUsageFlags, MsaaSampleCount, TextureId, TextureType};

/// Filtering used when a texture is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SamplerFilter {
    /// Nearest-neighbor filtering.
    Nearest,
    /// Linear filtering.
    #[default]
    Linear,
}

/// Description of a texture to create.
#[derive(Debug, Clone)]
pub struct TextureDescriptor {
    /// Debug label attached to the GPU object.
    pub label: String,
    /// Dimensionality.
    pub texture_type: TextureType,
    /// Texel format.
    pub format: ImageFormat,
    /// Width and height in texels.
    pub dimensions: UVec2,
    /// Number of array layers (faces for cubemaps, cascades for shadow
    /// arrays).
    pub layer_count: u32,
    /// Number of mip levels.
    pub mip_count: u32,
    /// Multisample count.
    pub sample_count: MsaaSampleCount,
    /// Declared usages.
    pub usage: ImageUsageFlags,
    /// Sampler filtering when sampled.
    pub filter: SamplerFilter,
}

impl TextureDescriptor {
    /// A single-sampled 2D texture descriptor with one layer and one mip.
    pub fn image_2d(
        label: impl Into<String>,
        format: ImageFormat,
        dimensions: UVec2,
        usage: ImageUsageFlags,
    ) -> Self {
        Self {
            label: label.into(),
            texture_type: TextureType::Image2d,
            format,
            dimensions,
            layer_count: 1,
            mip_count: 1,
            sample_count: MsaaSampleCount::One,
            usage,
            filter: SamplerFilter::Linear,
        }
    }
}

/// A GPU image.
///
/// The current layout is tracked on the resource so layout transitions can
/// be derived without external bookkeeping.
pub trait Texture: Debug + Send + Sync {
    /// The texture's process-unique ID.
    fn id(&self) -> TextureId;

    /// The texel format.
    fn format(&self) -> ImageFormat;

    /// Width and height in texels.
    fn dimensions(&self) -> UVec2;

    /// Number of array layers.
    fn layer_count(&self) -> u32;

    /// Number of mip levels.
    fn mip_count(&self) -> u32;

    /// The layout the image was last transitioned to.
    fn current_layout(&self) -> ImageLayout;

    /// Records a new layout after a transition was submitted.
    fn set_current_layout(&self, layout: ImageLayout);

    /// Downcasting support for backends.
    fn as_any(&self) -> &dyn Any;
}
