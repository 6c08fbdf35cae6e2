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

//! Render pass contract: attachment descriptions and builder-style subpass
//! declaration.

use std::any::Any;
use std::fmt::Debug;

use super::{ImageFormat, ImageLayout, MsaaSampleCount, RenderPassId};

/// What happens to an attachment's contents when a pass begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentLoadOp {
    /// Clear to the attachment's clear value.
    Clear,
    /// Preserve existing contents (required for write inputs).
    Load,
    /// Contents are undefined at pass start.
    DontCare,
}

/// What happens to an attachment's contents when a pass ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentStoreOp {
    /// Write results back to memory.
    Store,
    /// Results may be discarded.
    DontCare,
}

/// The value an attachment is cleared to when its load op is `Clear`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    /// Clear color as RGBA.
    Color([f32; 4]),
    /// Clear depth and stencil.
    DepthStencil {
        /// Depth clear value.
        depth: f32,
        /// Stencil clear value.
        stencil: u32,
    },
}

/// Index of an attachment within a render pass, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttachmentIndex(pub u32);

/// Full description of one render pass attachment.
#[derive(Debug, Clone)]
pub struct AttachmentDescription {
    /// Texel format of the attachment.
    pub format: ImageFormat,
    /// Layout the image is in when the pass begins.
    pub initial_layout: ImageLayout,
    /// Layout the pass transitions the image to on completion.
    pub final_layout: ImageLayout,
    /// Load behavior at pass start.
    pub load_op: AttachmentLoadOp,
    /// Store behavior at pass end.
    pub store_op: AttachmentStoreOp,
    /// Clear value used when `load_op` is `Clear`.
    pub clear_value: ClearValue,
    /// Multisample count of the attachment.
    pub sample_count: MsaaSampleCount,
}

/// A compiled render pass: the attachment and subpass structure that
/// framebuffers and graphics pipelines are created against.
///
/// Built with `begin_building` / `define_attachment` / subpass declarations /
/// `end_building`.
pub trait RenderPass: Debug + Send + Sync {
    /// The pass's process-unique ID. Part of the pipeline cache key.
    fn id(&self) -> RenderPassId;

    /// Starts declaring the pass.
    fn begin_building(&self);

    /// Registers an attachment and returns its index.
    fn define_attachment(&self, description: &AttachmentDescription) -> AttachmentIndex;

    /// Opens a subpass.
    fn begin_subpass(&self);

    /// Adds a color attachment reference to the open subpass.
    fn add_color_attachment(&self, index: AttachmentIndex, layout: ImageLayout);

    /// Adds a resolve attachment reference to the open subpass, paired with
    /// the previously added color attachment.
    fn add_resolve_attachment(&self, index: AttachmentIndex, layout: ImageLayout);

    /// Sets the depth/stencil attachment of the open subpass.
    fn add_depth_stencil_attachment(&self, index: AttachmentIndex, layout: ImageLayout);

    /// Closes the open subpass.
    fn end_subpass(&self);

    /// Finalizes the pass on the backend.
    fn end_building(&self) -> Result<(), crate::error::ResourceError>;

    /// Number of attachments declared.
    fn attachment_count(&self) -> u32;

    /// The declared attachment descriptions, in index order.
    fn attachment_descriptions(&self) -> Vec<AttachmentDescription>;

    /// Downcasting support for backends.
    fn as_any(&self) -> &dyn Any;
}
