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

//! Synchronization primitives recorded into command buffers: pipeline
//! barriers and image layout transitions.

use super::{ImageLayout, TextureHandle};

/// Pipeline stages a barrier waits on or unblocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PipelineStageFlags {
    bits: u32,
}

impl PipelineStageFlags {
    /// The start of the pipeline.
    pub const TOP_OF_PIPE: Self = Self { bits: 1 << 0 };
    /// Fragment shading.
    pub const FRAGMENT_SHADER: Self = Self { bits: 1 << 1 };
    /// Early and late depth/stencil tests.
    pub const DEPTH_STENCIL_TESTS: Self = Self { bits: 1 << 2 };
    /// Color attachment writes.
    pub const COLOR_ATTACHMENT_OUTPUT: Self = Self { bits: 1 << 3 };
    /// Compute shading.
    pub const COMPUTE_SHADER: Self = Self { bits: 1 << 4 };
    /// Transfer operations.
    pub const TRANSFER: Self = Self { bits: 1 << 5 };
    /// The end of the pipeline.
    pub const BOTTOM_OF_PIPE: Self = Self { bits: 1 << 6 };

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Combines two stage masks.
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }
}

impl std::ops::BitOr for PipelineStageFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

/// Memory access kinds made available or visible by a barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccessFlags {
    bits: u32,
}

impl AccessFlags {
    /// No access.
    pub const NONE: Self = Self { bits: 0 };
    /// Shader sampled/storage reads.
    pub const SHADER_READ: Self = Self { bits: 1 << 0 };
    /// Shader storage writes.
    pub const SHADER_WRITE: Self = Self { bits: 1 << 1 };
    /// Color attachment writes.
    pub const COLOR_ATTACHMENT_WRITE: Self = Self { bits: 1 << 2 };
    /// Depth/stencil attachment reads.
    pub const DEPTH_STENCIL_READ: Self = Self { bits: 1 << 3 };
    /// Depth/stencil attachment writes.
    pub const DEPTH_STENCIL_WRITE: Self = Self { bits: 1 << 4 };
    /// Transfer reads.
    pub const TRANSFER_READ: Self = Self { bits: 1 << 5 };
    /// Transfer writes.
    pub const TRANSFER_WRITE: Self = Self { bits: 1 << 6 };

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Combines two access masks.
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }
}

impl std::ops::BitOr for AccessFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

/// A layout transition on a single image, covering all its mips and layers.
#[derive(Debug, Clone)]
pub struct ImageMemoryBarrier {
    /// The image being transitioned.
    pub texture: TextureHandle,
    /// The layout the image is currently in.
    pub old_layout: ImageLayout,
    /// The layout the image transitions to.
    pub new_layout: ImageLayout,
    /// Accesses that must complete before the transition.
    pub src_access: AccessFlags,
    /// Accesses that wait for the transition.
    pub dst_access: AccessFlags,
}

/// A pipeline barrier with any number of image layout transitions.
#[derive(Debug, Clone)]
pub struct PipelineBarrier {
    /// Stages that must drain before the barrier.
    pub src_stage: PipelineStageFlags,
    /// Stages that wait on the barrier.
    pub dst_stage: PipelineStageFlags,
    /// Image transitions performed by the barrier.
    pub image_barriers: Vec<ImageMemoryBarrier>,
}
