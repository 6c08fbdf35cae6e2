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

//! Declarative description of one render graph pass: its local attachments,
//! the attachments it consumes from other passes, and its output size.

use glam::UVec2;

use vesper_core::rhi::{AttachmentDescription, ImageLayout};

/// How large a pass's attachments are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassDimensions {
    /// Attachments track the viewport size and are recreated on resize.
    Viewport,
    /// Attachments have a fixed size, e.g. the shadow map resolution.
    Fixed(UVec2),
}

/// The role of a locally created attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LocalAttachmentKind {
    Color,
    /// Single-sampled resolve target of the preceding color attachment.
    Resolve,
    DepthStencil,
}

/// An attachment created by the pass itself.
#[derive(Debug, Clone)]
pub(crate) struct LocalAttachment {
    pub name: String,
    pub kind: LocalAttachmentKind,
    pub description: AttachmentDescription,
    /// Number of array layers of the backing texture (cascade arrays).
    pub layer_count: u32,
}

/// A reference to an attachment owned by another pass.
#[derive(Debug, Clone)]
pub(crate) struct InputLink {
    /// Name of the pass that created the attachment.
    pub source_pass: String,
    /// Name of the attachment within the source pass.
    pub attachment: String,
    /// For read inputs: the layout the attachment must be in while sampled.
    pub layout: ImageLayout,
}

/// A single pass of a render graph.
///
/// A pass declares *what* it reads and writes; the graph materializes the
/// physical render pass, textures, and framebuffers, and the executor
/// supplies the draw commands. The `kind` tag tells the executor which body
/// to record.
#[derive(Debug)]
pub struct RenderGraphPass<K> {
    kind: K,
    name: String,
    dimensions: PassDimensions,
    pub(crate) attachments: Vec<LocalAttachment>,
    pub(crate) read_inputs: Vec<InputLink>,
    pub(crate) write_inputs: Vec<InputLink>,
    pub(crate) dependencies: Vec<String>,
}

impl<K> RenderGraphPass<K> {
    /// Creates an empty pass.
    pub fn new(kind: K, name: impl Into<String>, dimensions: PassDimensions) -> Self {
        Self {
            kind,
            name: name.into(),
            dimensions,
            attachments: Vec::new(),
            read_inputs: Vec::new(),
            write_inputs: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    /// The pass's kind tag.
    pub fn kind(&self) -> &K {
        &self.kind
    }

    /// The pass's unique name within its graph.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The pass's output size.
    pub fn dimensions(&self) -> PassDimensions {
        self.dimensions
    }

    /// Declares a color attachment created and written by this pass.
    pub fn create_color_attachment(
        &mut self,
        name: impl Into<String>,
        description: AttachmentDescription,
    ) -> &mut Self {
        self.attachments.push(LocalAttachment {
            name: name.into(),
            kind: LocalAttachmentKind::Color,
            description,
            layer_count: 1,
        });
        self
    }

    /// Declares a single-sampled resolve attachment paired with the most
    /// recently declared color attachment.
    pub fn create_resolve_attachment(
        &mut self,
        name: impl Into<String>,
        description: AttachmentDescription,
    ) -> &mut Self {
        self.attachments.push(LocalAttachment {
            name: name.into(),
            kind: LocalAttachmentKind::Resolve,
            description,
            layer_count: 1,
        });
        self
    }

    /// Declares a depth/stencil attachment created and written by this pass.
    pub fn create_depth_stencil_attachment(
        &mut self,
        name: impl Into<String>,
        description: AttachmentDescription,
    ) -> &mut Self {
        self.attachments.push(LocalAttachment {
            name: name.into(),
            kind: LocalAttachmentKind::DepthStencil,
            description,
            layer_count: 1,
        });
        self
    }

    /// Declares a layered depth/stencil attachment, one layer per shadow
    /// cascade.
    pub fn create_layered_depth_stencil_attachment(
        &mut self,
        name: impl Into<String>,
        description: AttachmentDescription,
        layer_count: u32,
    ) -> &mut Self {
        self.attachments.push(LocalAttachment {
            name: name.into(),
            kind: LocalAttachmentKind::DepthStencil,
            description,
            layer_count,
        });
        self
    }

    /// Declares that this pass samples `attachment` of `source_pass`. The
    /// graph transitions the attachment to `layout` before this pass runs
    /// and exposes it through the pass's read-input descriptor set, in link
    /// order.
    pub fn link_read_input(
        &mut self,
        source_pass: impl Into<String>,
        attachment: impl Into<String>,
        layout: ImageLayout,
    ) -> &mut Self {
        self.read_inputs.push(InputLink {
            source_pass: source_pass.into(),
            attachment: attachment.into(),
            layout,
        });
        self
    }

    /// Declares that this pass renders into `attachment` of `source_pass`,
    /// preserving its contents. The attachment joins this pass's framebuffer
    /// after the local attachments, in link order.
    pub fn link_write_input(
        &mut self,
        source_pass: impl Into<String>,
        attachment: impl Into<String>,
    ) -> &mut Self {
        self.write_inputs.push(InputLink {
            source_pass: source_pass.into(),
            attachment: attachment.into(),
            layout: ImageLayout::ColorAttachment,
        });
        self
    }

    /// Declares an execution-order dependency on another pass without
    /// consuming any of its attachments.
    pub fn add_dependency(&mut self, pass: impl Into<String>) -> &mut Self {
        self.dependencies.push(pass.into());
        self
    }

    pub(crate) fn find_attachment(&self, name: &str) -> Option<&LocalAttachment> {
        self.attachments.iter().find(|a| a.name == name)
    }
}
