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

//! Command buffer recording as an inspectable event stream.

use std::any::Any;
use std::sync::Mutex;

use glam::{UVec2, Vec4};

use vesper_core::error::RenderError;
use vesper_core::rhi::{
    Buffer as _, BufferHandle, BufferId, CommandBuffer, DescriptorSet as _, DescriptorSetHandle,
    DescriptorSetId, Framebuffer as _, FramebufferHandle, FramebufferId, ImageLayout,
    PipelineBarrier, PipelineState as _, PipelineStateHandle, PipelineStateId, RenderPass as _,
    RenderPassHandle, RenderPassId, Texture as _, TextureId,
};

use super::lock;

/// One recorded command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// A render pass instance began.
    BeginRenderPass {
        /// The pass structure rendered against.
        render_pass: RenderPassId,
        /// The attachment images rendered into.
        framebuffer: FramebufferId,
    },
    /// The open render pass instance ended.
    EndRenderPass,
    /// A pipeline was bound.
    BindPipeline(PipelineStateId),
    /// A descriptor set was bound.
    BindDescriptorSet {
        /// The bound set.
        set: DescriptorSetId,
        /// The set index it was bound at.
        set_index: u32,
    },
    /// A vertex buffer was bound.
    BindVertexBuffer(BufferId),
    /// An index buffer was bound.
    BindIndexBuffer(BufferId),
    /// Viewport and scissor were set.
    SetViewportAndScissor(UVec2),
    /// Push constants were uploaded.
    PushConstants(Vec<u8>),
    /// An indexed draw, one instance.
    DrawIndexed {
        /// Number of indices drawn.
        index_count: u32,
    },
    /// An instanced indexed draw.
    DrawIndexedInstanced {
        /// Number of indices drawn per instance.
        index_count: u32,
        /// Number of instances.
        instance_count: u32,
    },
    /// A compute dispatch.
    Dispatch {
        /// Work groups in x.
        groups_x: u32,
        /// Work groups in y.
        groups_y: u32,
        /// Work groups in z.
        groups_z: u32,
    },
    /// A pipeline barrier with its image transitions.
    PipelineBarrier {
        /// Per-image `(texture, old, new)` layout transitions.
        transitions: Vec<(TextureId, ImageLayout, ImageLayout)>,
    },
    /// A debug label region opened.
    BeginLabel(String),
    /// The innermost debug label region closed.
    EndLabel,
}

#[derive(Debug, Default)]
struct RecordingState {
    recording: bool,
    commands: Vec<Command>,
}

/// A command buffer that records [`Command`] events.
#[derive(Debug)]
pub struct HeadlessCommandBuffer {
    label: String,
    state: Mutex<RecordingState>,
}

impl HeadlessCommandBuffer {
    pub(crate) fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            state: Mutex::new(RecordingState::default()),
        }
    }

    /// A copy of the recorded command stream.
    pub fn commands(&self) -> Vec<Command> {
        lock(&self.state).commands.clone()
    }

    /// The buffer's debug label.
    pub fn label(&self) -> &str {
        &self.label
    }

    fn record(&self, command: Command) {
        let mut state = lock(&self.state);
        debug_assert!(
            state.recording,
            "command recorded outside begin/end_recording on '{}'",
            self.label
        );
        state.commands.push(command);
    }
}

impl CommandBuffer for HeadlessCommandBuffer {
    fn begin_recording(&self) -> Result<(), RenderError> {
        let mut state = lock(&self.state);
        state.commands.clear();
        state.recording = true;
        Ok(())
    }

    fn end_recording(&self) -> Result<(), RenderError> {
        lock(&self.state).recording = false;
        Ok(())
    }

    fn begin_render_pass(&self, render_pass: &RenderPassHandle, framebuffer: &FramebufferHandle) {
        self.record(Command::BeginRenderPass {
            render_pass: render_pass.id(),
            framebuffer: framebuffer.id(),
        });
    }

    fn end_render_pass(&self) {
        self.record(Command::EndRenderPass);
    }

    fn bind_pipeline(&self, pipeline: &PipelineStateHandle) {
        self.record(Command::BindPipeline(pipeline.id()));
    }

    fn bind_descriptor_set(&self, set: &DescriptorSetHandle, set_index: u32) {
        self.record(Command::BindDescriptorSet {
            set: set.id(),
            set_index,
        });
    }

    fn bind_vertex_buffer(&self, buffer: &BufferHandle) {
        self.record(Command::BindVertexBuffer(buffer.id()));
    }

    fn bind_index_buffer(&self, buffer: &BufferHandle) {
        self.record(Command::BindIndexBuffer(buffer.id()));
    }

    fn set_viewport_and_scissor(&self, dimensions: UVec2) {
        self.record(Command::SetViewportAndScissor(dimensions));
    }

    fn push_constants(&self, data: &[u8]) {
        self.record(Command::PushConstants(data.to_vec()));
    }

    fn draw_indexed(&self, index_count: u32) {
        self.record(Command::DrawIndexed { index_count });
    }

    fn draw_indexed_instanced(&self, index_count: u32, instance_count: u32) {
        self.record(Command::DrawIndexedInstanced {
            index_count,
            instance_count,
        });
    }

    fn dispatch(&self, groups_x: u32, groups_y: u32, groups_z: u32) {
        self.record(Command::Dispatch {
            groups_x,
            groups_y,
            groups_z,
        });
    }

    fn pipeline_barrier(&self, barrier: &PipelineBarrier) {
        self.record(Command::PipelineBarrier {
            transitions: barrier
                .image_barriers
                .iter()
                .map(|image| (image.texture.id(), image.old_layout, image.new_layout))
                .collect(),
        });
    }

    fn begin_label(&self, label: &str, _color: Vec4) {
        self.record(Command::BeginLabel(label.to_string()));
    }

    fn end_label(&self) {
        self.record(Command::EndLabel);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
