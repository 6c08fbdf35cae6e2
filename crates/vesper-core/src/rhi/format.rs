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

//! Image formats, layouts, and the small fixed-choice enums of the RHI.

/// Texel format of a texture or render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// Single 8-bit unsigned normalized channel.
    R8Unorm,
    /// Four 8-bit unsigned normalized channels, RGBA order.
    Rgba8Unorm,
    /// Four 8-bit unsigned normalized channels, BGRA order (common swapchain
    /// format).
    Bgra8Unorm,
    /// Four 16-bit float channels. HDR intermediate targets.
    Rgba16Float,
    /// Four 32-bit float channels. Environment source data.
    Rgba32Float,
    /// 32-bit float depth with 8-bit stencil.
    D32FloatS8Uint,
}

impl ImageFormat {
    /// True if the format carries a depth aspect.
    pub fn is_depth_format(&self) -> bool {
        matches!(self, ImageFormat::D32FloatS8Uint)
    }

    /// Bytes per texel of the color aspect (depth formats report their
    /// packed size).
    pub fn bytes_per_texel(&self) -> u32 {
        match self {
            ImageFormat::R8Unorm => 1,
            ImageFormat::Rgba8Unorm | ImageFormat::Bgra8Unorm => 4,
            ImageFormat::Rgba16Float => 8,
            ImageFormat::Rgba32Float => 16,
            ImageFormat::D32FloatS8Uint => 5,
        }
    }
}

/// The layout an image's memory is organized for.
///
/// Transitions between layouts are issued as [`ImageMemoryBarrier`]s by the
/// render graph before each pass executes.
///
/// [`ImageMemoryBarrier`]: super::ImageMemoryBarrier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageLayout {
    /// Initial layout of freshly created images; contents undefined.
    Undefined,
    /// Layout usable by any access; required for storage image writes.
    General,
    /// Optimal for color attachment output.
    ColorAttachment,
    /// Optimal for depth/stencil attachment output.
    DepthStencilAttachment,
    /// Optimal for sampling in a shader.
    ShaderReadOnly,
    /// Optimal for transfer reads.
    TransferSrc,
    /// Optimal for transfer writes.
    TransferDst,
    /// Layout required for presentation.
    Present,
}

/// Dimensionality of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureType {
    /// A regular 2D image.
    Image2d,
    /// An array of 2D layers, e.g. one layer per shadow cascade.
    Image2dArray,
    /// A six-layer cubemap.
    Cubemap,
}

/// Multisample count of a render target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MsaaSampleCount {
    /// Single-sampled.
    #[default]
    One,
    /// Four samples per texel.
    Four,
}

impl MsaaSampleCount {
    /// The numeric sample count.
    pub fn count(&self) -> u32 {
        match self {
            MsaaSampleCount::One => 1,
            MsaaSampleCount::Four => 4,
        }
    }
}

/// Triangle face culling mode of a graphics pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CullMode {
    /// No culling.
    None,
    /// Cull back faces.
    #[default]
    Back,
    /// Cull front faces. Used by depth-only shadow rendering to reduce
    /// peter-panning.
    Front,
}

/// A single programmable pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// Vertex shader stage.
    Vertex,
    /// Fragment shader stage.
    Fragment,
    /// Compute shader stage.
    Compute,
}
