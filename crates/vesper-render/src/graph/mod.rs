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

//! A declarative render graph.
//!
//! Passes describe the attachments they create and the attachments of other
//! passes they read or continue writing. Finalizing the graph validates
//! every cross-pass reference, topologically orders the passes, and
//! materializes the physical GPU resources: one render pass per graph pass,
//! and per frame in flight a set of attachment textures, a framebuffer, and
//! a descriptor set exposing the pass's read inputs.
//!
//! Execution walks the sorted passes, emitting image layout transitions for
//! consumed attachments before each pass begins, and hands the recording of
//! the pass body to a [`PassExecutor`] keyed by the pass's kind tag.

mod pass;

pub use pass::{PassDimensions, RenderGraphPass};

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;

use glam::{UVec2, Vec4};

use vesper_core::error::{GraphError, RenderError};
use vesper_core::rhi::{
    AccessFlags, AttachmentDescription, AttachmentLoadOp, CommandBuffer as _, CommandBufferHandle,
    DescriptorSet as _, DescriptorSetHandle, Framebuffer as _, FramebufferHandle, GraphicsDevice,
    ImageFormat, ImageLayout, ImageMemoryBarrier, ImageUsageFlags, MsaaSampleCount,
    PipelineBarrier, PipelineStageFlags, RenderPass as _, RenderPassHandle, RenderTargetHandle,
    SamplerFilter, ShaderStageFlags, Texture as _, TextureDescriptor, TextureHandle, TextureType,
};

use pass::{InputLink, LocalAttachmentKind};

/// Where the graph's output attachment lands.
#[derive(Debug)]
pub enum OutputBinding {
    /// The output attachment is bound to the swapchain images; the graph
    /// presents directly.
    Window(Vec<RenderTargetHandle>),
    /// The output attachment is an offscreen texture per frame, exposed as
    /// a sampleable descriptor set for composition by a host UI.
    Offscreen,
}

/// Everything a pass body needs while recording.
pub struct PassContext<'a> {
    /// The command buffer being recorded into.
    pub command_buffer: &'a CommandBufferHandle,
    /// The physical render pass the pipeline must be compatible with.
    pub render_pass: &'a RenderPassHandle,
    /// The frame-in-flight index being recorded.
    pub frame_index: u32,
    /// The pass's output dimensions.
    pub dimensions: UVec2,
    /// The pass's read inputs bound as image samplers, in link order.
    pub read_inputs: Option<&'a DescriptorSetHandle>,
}

/// Records the body of a pass identified by its kind tag.
pub trait PassExecutor<K> {
    /// Records draw or dispatch commands for one pass. The render pass
    /// instance is already begun and the viewport is set.
    fn execute_pass(&mut self, kind: &K, ctx: &PassContext<'_>) -> Result<(), RenderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GraphState {
    Idle,
    Building,
    Built,
}

struct PhysicalFrame {
    /// One entry per local attachment; `None` for the window-bound output
    /// slot.
    textures: Vec<Option<TextureHandle>>,
    framebuffer: FramebufferHandle,
    read_set: Option<DescriptorSetHandle>,
}

struct PhysicalPass {
    render_pass: RenderPassHandle,
    frames: Vec<PhysicalFrame>,
    dimensions: UVec2,
}

/// A render graph over pass kind `K`.
///
/// Construction is bracketed by [`begin_building`](Self::begin_building) and
/// [`end_building`](Self::end_building); all structural errors surface from
/// the latter, before any frame executes.
pub struct RenderGraph<K> {
    device: Arc<dyn GraphicsDevice>,
    state: GraphState,
    passes: Vec<RenderGraphPass<K>>,
    name_index: HashMap<String, usize>,
    output_pass: Option<usize>,
    output_attachment: Option<(String, String)>,
    output_binding: OutputBinding,
    viewport_dimensions: UVec2,
    frames_in_flight: u32,
    order: Vec<usize>,
    physical: Vec<PhysicalPass>,
    viewport_sets: Vec<DescriptorSetHandle>,
}

impl<K> RenderGraph<K> {
    /// Creates an empty graph.
    pub fn new(device: Arc<dyn GraphicsDevice>) -> Self {
        Self {
            device,
            state: GraphState::Idle,
            passes: Vec::new(),
            name_index: HashMap::new(),
            output_pass: None,
            output_attachment: None,
            output_binding: OutputBinding::Offscreen,
            viewport_dimensions: UVec2::ZERO,
            frames_in_flight: 0,
            order: Vec::new(),
            physical: Vec::new(),
            viewport_sets: Vec::new(),
        }
    }

    /// Starts declaring a new topology, discarding any previous one.
    ///
    /// `frames_in_flight` is ignored for window output, where the number of
    /// provided render targets decides.
    pub fn begin_building(
        &mut self,
        viewport_dimensions: UVec2,
        frames_in_flight: u32,
        output_binding: OutputBinding,
    ) {
        self.passes.clear();
        self.name_index.clear();
        self.output_pass = None;
        self.output_attachment = None;
        self.order.clear();
        self.physical.clear();
        self.viewport_sets.clear();
        self.viewport_dimensions = viewport_dimensions;
        self.frames_in_flight = match &output_binding {
            OutputBinding::Window(targets) => targets.len() as u32,
            OutputBinding::Offscreen => frames_in_flight,
        };
        self.output_binding = output_binding;
        self.state = GraphState::Building;
    }

    /// Adds a pass to the topology under construction.
    pub fn add_pass(&mut self, pass: RenderGraphPass<K>) -> Result<(), GraphError> {
        if self.state != GraphState::Building {
            return Err(GraphError::NotBuilding);
        }
        if self.name_index.contains_key(pass.name()) {
            return Err(GraphError::DuplicatePass {
                pass: pass.name().to_string(),
            });
        }
        self.name_index.insert(pass.name().to_string(), self.passes.len());
        self.passes.push(pass);
        Ok(())
    }

    /// Adds a pass and marks it as the graph's output pass.
    pub fn add_output_pass(&mut self, pass: RenderGraphPass<K>) -> Result<(), GraphError> {
        let index = self.passes.len();
        self.add_pass(pass)?;
        self.output_pass = Some(index);
        Ok(())
    }

    /// Names the attachment whose contents the graph produces. For window
    /// output this must be an attachment of the output pass; for offscreen
    /// output it may name any pass's attachment (diagnostic views).
    pub fn set_output_attachment(
        &mut self,
        pass: impl Into<String>,
        attachment: impl Into<String>,
    ) -> Result<(), GraphError> {
        if self.state != GraphState::Building {
            return Err(GraphError::NotBuilding);
        }
        self.output_attachment = Some((pass.into(), attachment.into()));
        Ok(())
    }

    /// Validates the declared topology, orders the passes, and creates the
    /// physical GPU resources. All structural errors surface here.
    pub fn end_building(&mut self) -> Result<(), GraphError> {
        if self.state != GraphState::Building {
            return Err(GraphError::NotBuilding);
        }
        if self.output_pass.is_none() || self.output_attachment.is_none() {
            return Err(GraphError::OutputNotSet);
        }

        self.validate_links()?;
        self.order = self.topological_order()?;
        self.build_physical()?;

        self.state = GraphState::Built;
        log::info!(
            "Render graph built: {} passes, {} frames in flight, viewport {}x{}",
            self.passes.len(),
            self.frames_in_flight,
            self.viewport_dimensions.x,
            self.viewport_dimensions.y
        );
        Ok(())
    }

    /// Records the whole graph for one frame.
    pub fn execute(
        &self,
        command_buffer: &CommandBufferHandle,
        frame_index: u32,
        executor: &mut dyn PassExecutor<K>,
    ) -> Result<(), RenderError> {
        debug_assert_eq!(self.state, GraphState::Built);
        let frame = frame_index as usize;

        for &pass_index in &self.order {
            let pass = &self.passes[pass_index];
            let physical = &self.physical[pass_index];
            let phys_frame = &physical.frames[frame];

            self.transition_inputs(command_buffer, pass, frame);

            command_buffer.begin_label(pass.name(), Vec4::new(0.7, 0.7, 0.2, 1.0));
            command_buffer.begin_render_pass(&physical.render_pass, &phys_frame.framebuffer);
            command_buffer.set_viewport_and_scissor(physical.dimensions);

            let ctx = PassContext {
                command_buffer,
                render_pass: &physical.render_pass,
                frame_index,
                dimensions: physical.dimensions,
                read_inputs: phys_frame.read_set.as_ref(),
            };
            executor.execute_pass(pass.kind(), &ctx)?;

            command_buffer.end_render_pass();
            command_buffer.end_label();

            // The render pass's final layouts take effect on its attachments.
            for (attachment, texture) in pass.attachments.iter().zip(&phys_frame.textures) {
                if let Some(texture) = texture {
                    texture.set_current_layout(working_layout(attachment.kind));
                }
            }
            for link in &pass.write_inputs {
                if let Some(texture) = self.link_texture(link, frame) {
                    let layout = if texture.format().is_depth_format() {
                        ImageLayout::DepthStencilAttachment
                    } else {
                        ImageLayout::ColorAttachment
                    };
                    texture.set_current_layout(layout);
                }
            }
        }
        Ok(())
    }

    /// Recreates the viewport-sized physical resources at a new size,
    /// keeping the topology and execution order intact.
    ///
    /// For window output the recreated swapchain's targets must be supplied.
    pub fn resize_resources(
        &mut self,
        viewport_dimensions: UVec2,
        window_targets: Option<Vec<RenderTargetHandle>>,
    ) -> Result<(), GraphError> {
        debug_assert_eq!(self.state, GraphState::Built);
        self.viewport_dimensions = viewport_dimensions;
        if let Some(targets) = window_targets {
            self.output_binding = OutputBinding::Window(targets);
        }

        let resized: Vec<bool> = self
            .passes
            .iter()
            .map(|p| p.dimensions() == PassDimensions::Viewport)
            .collect();

        for index in 0..self.passes.len() {
            if resized[index] {
                self.build_pass_textures(index)?;
            }
        }
        for index in 0..self.passes.len() {
            let touches_resized = resized[index]
                || self.passes[index]
                    .write_inputs
                    .iter()
                    .any(|l| resized[self.name_index[&l.source_pass]]);
            if touches_resized {
                self.build_pass_framebuffers(index)?;
            }
            let reads_resized = self.passes[index]
                .read_inputs
                .iter()
                .any(|l| resized[self.name_index[&l.source_pass]]);
            if reads_resized {
                self.build_pass_read_sets(index)?;
            }
        }
        self.build_viewport_sets()?;

        log::info!(
            "Render graph resources resized to {}x{}",
            viewport_dimensions.x,
            viewport_dimensions.y
        );
        Ok(())
    }

    /// The texture backing `attachment` of `pass` for one frame, if it is
    /// not window-bound.
    pub fn attachment_texture(
        &self,
        pass: &str,
        attachment: &str,
        frame_index: u32,
    ) -> Option<TextureHandle> {
        let index = *self.name_index.get(pass)?;
        let slot = self.passes[index]
            .attachments
            .iter()
            .position(|a| a.name == attachment)?;
        self.physical[index].frames[frame_index as usize].textures[slot].clone()
    }

    /// The texture holding the graph's output for one frame (offscreen
    /// output only).
    pub fn output_texture(&self, frame_index: u32) -> Option<TextureHandle> {
        let (pass, attachment) = self.output_attachment.as_ref()?;
        self.attachment_texture(pass, attachment, frame_index)
    }

    /// A descriptor set sampling the graph's output for one frame
    /// (offscreen output only).
    pub fn output_descriptor_set(&self, frame_index: u32) -> Option<DescriptorSetHandle> {
        self.viewport_sets.get(frame_index as usize).cloned()
    }

    /// The physical render pass of a graph pass, for pipeline creation
    /// outside of execution (e.g. warm-up).
    pub fn pass_render_pass(&self, pass: &str) -> Option<RenderPassHandle> {
        let index = *self.name_index.get(pass)?;
        Some(self.physical[index].render_pass.clone())
    }

    /// Number of frames in flight the physical resources are replicated for.
    pub fn frames_in_flight(&self) -> u32 {
        self.frames_in_flight
    }

    /// The current viewport dimensions.
    pub fn viewport_dimensions(&self) -> UVec2 {
        self.viewport_dimensions
    }

    /// The pass names in execution order.
    pub fn execution_order(&self) -> Vec<&str> {
        self.order.iter().map(|&i| self.passes[i].name()).collect()
    }

    fn validate_links(&self) -> Result<(), GraphError> {
        for pass in &self.passes {
            let links = pass.read_inputs.iter().chain(&pass.write_inputs);
            for link in links {
                let source = self.name_index.get(&link.source_pass).ok_or_else(|| {
                    GraphError::UnknownPass {
                        pass: link.source_pass.clone(),
                    }
                })?;
                if self.passes[*source].find_attachment(&link.attachment).is_none() {
                    return Err(GraphError::UnknownAttachment {
                        pass: link.source_pass.clone(),
                        attachment: link.attachment.clone(),
                    });
                }
            }
            for dependency in &pass.dependencies {
                if !self.name_index.contains_key(dependency) {
                    return Err(GraphError::UnknownPass {
                        pass: dependency.clone(),
                    });
                }
            }
        }

        let (output_pass, output_attachment) = self
            .output_attachment
            .as_ref()
            .ok_or(GraphError::OutputNotSet)?;
        let output_index = self
            .name_index
            .get(output_pass)
            .ok_or_else(|| GraphError::UnknownPass {
                pass: output_pass.clone(),
            })?;
        if self.passes[*output_index]
            .find_attachment(output_attachment)
            .is_none()
        {
            return Err(GraphError::UnknownAttachment {
                pass: output_pass.clone(),
                attachment: output_attachment.clone(),
            });
        }
        Ok(())
    }

    /// Kahn's algorithm, seeded in insertion order for deterministic output.
    fn topological_order(&self) -> Result<Vec<usize>, GraphError> {
        let count = self.passes.len();
        let mut incoming = vec![0usize; count];
        let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); count];

        for (index, pass) in self.passes.iter().enumerate() {
            for source_name in pass
                .read_inputs
                .iter()
                .chain(&pass.write_inputs)
                .map(|l| &l.source_pass)
                .chain(&pass.dependencies)
            {
                let source = self.name_index[source_name];
                outgoing[source].push(index);
                incoming[index] += 1;
            }
        }

        let mut queue: VecDeque<usize> = (0..count).filter(|&i| incoming[i] == 0).collect();
        let mut order = Vec::with_capacity(count);
        while let Some(index) = queue.pop_front() {
            order.push(index);
            for &next in &outgoing[index] {
                incoming[next] -= 1;
                if incoming[next] == 0 {
                    queue.push_back(next);
                }
            }
        }

        if order.len() != count {
            let stuck = (0..count)
                .find(|&i| incoming[i] > 0)
                .map(|i| self.passes[i].name().to_string())
                .unwrap_or_default();
            return Err(GraphError::CycleDetected { pass: stuck });
        }
        Ok(order)
    }

    fn build_physical(&mut self) -> Result<(), GraphError> {
        self.physical.clear();
        for index in 0..self.passes.len() {
            let render_pass = self.build_render_pass(index)?;
            self.physical.push(PhysicalPass {
                render_pass,
                frames: Vec::new(),
                dimensions: self.pass_dimensions(index),
            });
            self.build_pass_textures(index)?;
        }
        // Framebuffers and read sets reference other passes' textures, so
        // they are created once every pass's textures exist.
        for index in 0..self.passes.len() {
            self.build_pass_framebuffers(index)?;
            self.build_pass_read_sets(index)?;
        }
        self.build_viewport_sets()?;
        Ok(())
    }

    fn pass_dimensions(&self, index: usize) -> UVec2 {
        match self.passes[index].dimensions() {
            PassDimensions::Viewport => self.viewport_dimensions,
            PassDimensions::Fixed(dims) => dims,
        }
    }

    fn is_window_output_slot(&self, pass_index: usize, attachment: &str) -> bool {
        if !matches!(self.output_binding, OutputBinding::Window(_)) {
            return false;
        }
        match (&self.output_pass, &self.output_attachment) {
            (Some(output_pass), Some((_, output_attachment))) => {
                *output_pass == pass_index && output_attachment == attachment
            }
            _ => false,
        }
    }

    fn build_render_pass(&self, index: usize) -> Result<RenderPassHandle, GraphError> {
        let pass = &self.passes[index];
        let render_pass = self
            .device
            .create_render_pass(&format!("{} Render Pass", pass.name()));
        render_pass.begin_building();

        let mut indices = Vec::new();
        for attachment in &pass.attachments {
            let final_layout = if self.is_window_output_slot(index, &attachment.name) {
                ImageLayout::Present
            } else {
                working_layout(attachment.kind)
            };
            let description = AttachmentDescription {
                initial_layout: ImageLayout::Undefined,
                final_layout,
                ..attachment.description.clone()
            };
            indices.push(render_pass.define_attachment(&description));
        }
        let mut write_indices = Vec::new();
        for link in &pass.write_inputs {
            let source = &self.passes[self.name_index[&link.source_pass]];
            let source_attachment = source
                .find_attachment(&link.attachment)
                .ok_or_else(|| GraphError::UnknownAttachment {
                    pass: link.source_pass.clone(),
                    attachment: link.attachment.clone(),
                })?;
            let layout = working_layout(source_attachment.kind);
            let description = AttachmentDescription {
                load_op: AttachmentLoadOp::Load,
                initial_layout: layout,
                final_layout: layout,
                ..source_attachment.description.clone()
            };
            write_indices.push((render_pass.define_attachment(&description), source_attachment.kind));
        }

        render_pass.begin_subpass();
        for (attachment, attachment_index) in pass.attachments.iter().zip(&indices) {
            match attachment.kind {
                LocalAttachmentKind::Color => {
                    render_pass.add_color_attachment(*attachment_index, ImageLayout::ColorAttachment)
                }
                LocalAttachmentKind::Resolve => render_pass
                    .add_resolve_attachment(*attachment_index, ImageLayout::ColorAttachment),
                LocalAttachmentKind::DepthStencil => render_pass.add_depth_stencil_attachment(
                    *attachment_index,
                    ImageLayout::DepthStencilAttachment,
                ),
            }
        }
        for (attachment_index, kind) in &write_indices {
            match kind {
                LocalAttachmentKind::DepthStencil => render_pass.add_depth_stencil_attachment(
                    *attachment_index,
                    ImageLayout::DepthStencilAttachment,
                ),
                _ => render_pass
                    .add_color_attachment(*attachment_index, ImageLayout::ColorAttachment),
            }
        }
        render_pass.end_subpass();
        render_pass.end_building()?;
        Ok(render_pass)
    }

    fn build_pass_textures(&mut self, index: usize) -> Result<(), GraphError> {
        let dimensions = self.pass_dimensions(index);
        self.physical[index].dimensions = dimensions;

        let mut frames = Vec::with_capacity(self.frames_in_flight as usize);
        for _frame in 0..self.frames_in_flight {
            let pass = &self.passes[index];
            let mut textures = Vec::with_capacity(pass.attachments.len());
            for attachment in &pass.attachments {
                if self.is_window_output_slot(index, &attachment.name) {
                    textures.push(None);
                    continue;
                }
                let usage = if attachment.description.format.is_depth_format() {
                    ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT | ImageUsageFlags::SAMPLED
                } else {
                    ImageUsageFlags::COLOR_ATTACHMENT | ImageUsageFlags::SAMPLED
                };
                let texture = self.device.create_texture(&TextureDescriptor {
                    label: format!("{} {}", self.passes[index].name(), attachment.name),
                    texture_type: if attachment.layer_count > 1 {
                        TextureType::Image2dArray
                    } else {
                        TextureType::Image2d
                    },
                    format: attachment.description.format,
                    dimensions,
                    layer_count: attachment.layer_count,
                    mip_count: 1,
                    sample_count: attachment.description.sample_count,
                    usage,
                    filter: SamplerFilter::Linear,
                })?;
                textures.push(Some(texture));
            }
            frames.push(textures);
        }

        let device = self.device.clone();
        let physical = &mut self.physical[index];
        if physical.frames.is_empty() {
            let render_pass = physical.render_pass.clone();
            physical.frames = frames
                .into_iter()
                .map(|textures| PhysicalFrame {
                    textures,
                    // Placeholder; replaced by `build_pass_framebuffers`.
                    framebuffer: device.create_framebuffer(&render_pass, "pending"),
                    read_set: None,
                })
                .collect();
        } else {
            for (frame, textures) in physical.frames.iter_mut().zip(frames) {
                frame.textures = textures;
            }
        }
        Ok(())
    }

    fn build_pass_framebuffers(&mut self, index: usize) -> Result<(), GraphError> {
        let dimensions = self.physical[index].dimensions;
        for frame in 0..self.frames_in_flight as usize {
            let framebuffer = self.device.create_framebuffer(
                &self.physical[index].render_pass,
                &format!("{} Framebuffer", self.passes[index].name()),
            );
            framebuffer.begin_building(dimensions);
            for (slot, attachment) in self.passes[index].attachments.iter().enumerate() {
                if let Some(texture) = &self.physical[index].frames[frame].textures[slot] {
                    framebuffer.attach_texture(texture);
                } else if let OutputBinding::Window(targets) = &self.output_binding {
                    framebuffer.attach_render_target(&targets[frame]);
                } else {
                    return Err(GraphError::UnknownAttachment {
                        pass: self.passes[index].name().to_string(),
                        attachment: attachment.name.clone(),
                    });
                }
            }
            for link in &self.passes[index].write_inputs {
                let texture = self.link_texture(link, frame).ok_or_else(|| {
                    GraphError::UnknownAttachment {
                        pass: link.source_pass.clone(),
                        attachment: link.attachment.clone(),
                    }
                })?;
                framebuffer.attach_texture(&texture);
            }
            framebuffer.end_building()?;
            self.physical[index].frames[frame].framebuffer = framebuffer;
        }
        Ok(())
    }

    fn build_pass_read_sets(&mut self, index: usize) -> Result<(), GraphError> {
        if self.passes[index].read_inputs.is_empty() {
            return Ok(());
        }
        for frame in 0..self.frames_in_flight as usize {
            let set = self.device.create_descriptor_set(&format!(
                "{} Read Inputs",
                self.passes[index].name()
            ));
            set.begin_building();
            for link in &self.passes[index].read_inputs {
                let texture = self.link_texture(link, frame).ok_or_else(|| {
                    GraphError::UnknownAttachment {
                        pass: link.source_pass.clone(),
                        attachment: link.attachment.clone(),
                    }
                })?;
                set.add_image_sampler(&texture, ShaderStageFlags::FRAGMENT, link.layout);
            }
            set.end_building()?;
            self.physical[index].frames[frame].read_set = Some(set);
        }
        Ok(())
    }

    fn build_viewport_sets(&mut self) -> Result<(), GraphError> {
        self.viewport_sets.clear();
        if !matches!(self.output_binding, OutputBinding::Offscreen) {
            return Ok(());
        }
        for frame in 0..self.frames_in_flight {
            let texture = self
                .output_texture(frame)
                .ok_or(GraphError::OutputNotSet)?;
            let set = self.device.create_descriptor_set("Graph Output");
            set.begin_building();
            set.add_image_sampler(&texture, ShaderStageFlags::FRAGMENT, ImageLayout::ShaderReadOnly);
            set.end_building()?;
            self.viewport_sets.push(set);
        }
        Ok(())
    }

    fn link_texture(&self, link: &InputLink, frame: usize) -> Option<TextureHandle> {
        self.attachment_texture(&link.source_pass, &link.attachment, frame as u32)
    }

    /// Emits the layout transitions a pass's inputs require, as one barrier.
    fn transition_inputs(&self, command_buffer: &CommandBufferHandle, pass: &RenderGraphPass<K>, frame: usize) {
        let mut image_barriers = Vec::new();
        let mut src_stage = PipelineStageFlags::TOP_OF_PIPE;
        let mut dst_stage = PipelineStageFlags::FRAGMENT_SHADER;

        for link in &pass.read_inputs {
            let Some(texture) = self.link_texture(link, frame) else {
                continue;
            };
            let old_layout = texture.current_layout();
            if old_layout == link.layout {
                continue;
            }
            let depth = texture.format().is_depth_format();
            src_stage = src_stage.union(if depth {
                PipelineStageFlags::DEPTH_STENCIL_TESTS
            } else {
                PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
            });
            texture.set_current_layout(link.layout);
            image_barriers.push(ImageMemoryBarrier {
                texture,
                old_layout,
                new_layout: link.layout,
                src_access: if depth {
                    AccessFlags::DEPTH_STENCIL_WRITE
                } else {
                    AccessFlags::COLOR_ATTACHMENT_WRITE
                },
                dst_access: AccessFlags::SHADER_READ,
            });
        }

        for link in &pass.write_inputs {
            let Some(texture) = self.link_texture(link, frame) else {
                continue;
            };
            let depth = texture.format().is_depth_format();
            let wanted = if depth {
                ImageLayout::DepthStencilAttachment
            } else {
                ImageLayout::ColorAttachment
            };
            let old_layout = texture.current_layout();
            if old_layout == wanted {
                continue;
            }
            src_stage = src_stage.union(PipelineStageFlags::FRAGMENT_SHADER);
            dst_stage = dst_stage.union(if depth {
                PipelineStageFlags::DEPTH_STENCIL_TESTS
            } else {
                PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
            });
            texture.set_current_layout(wanted);
            image_barriers.push(ImageMemoryBarrier {
                texture,
                old_layout,
                new_layout: wanted,
                src_access: AccessFlags::SHADER_READ,
                dst_access: if depth {
                    AccessFlags::DEPTH_STENCIL_WRITE
                } else {
                    AccessFlags::COLOR_ATTACHMENT_WRITE
                },
            });
        }

        if !image_barriers.is_empty() {
            command_buffer.pipeline_barrier(&PipelineBarrier {
                src_stage,
                dst_stage,
                image_barriers,
            });
        }
    }
}

impl<K> std::fmt::Debug for RenderGraph<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderGraph")
            .field("state", &self.state)
            .field("passes", &self.passes.len())
            .field("frames_in_flight", &self.frames_in_flight)
            .finish()
    }
}

/// The layout an attachment sits in while its owning pass renders.
fn working_layout(kind: LocalAttachmentKind) -> ImageLayout {
    match kind {
        LocalAttachmentKind::DepthStencil => ImageLayout::DepthStencilAttachment,
        _ => ImageLayout::ColorAttachment,
    }
}

/// Convenience constructor for single-sampled cleared color attachments.
pub fn color_attachment(format: ImageFormat, clear: [f32; 4]) -> AttachmentDescription {
    AttachmentDescription {
        format,
        initial_layout: ImageLayout::Undefined,
        final_layout: ImageLayout::ColorAttachment,
        load_op: AttachmentLoadOp::Clear,
        store_op: vesper_core::rhi::AttachmentStoreOp::Store,
        clear_value: vesper_core::rhi::ClearValue::Color(clear),
        sample_count: MsaaSampleCount::One,
    }
}

/// Convenience constructor for cleared depth/stencil attachments.
pub fn depth_attachment(format: ImageFormat) -> AttachmentDescription {
    AttachmentDescription {
        format,
        initial_layout: ImageLayout::Undefined,
        final_layout: ImageLayout::DepthStencilAttachment,
        load_op: AttachmentLoadOp::Clear,
        store_op: vesper_core::rhi::AttachmentStoreOp::Store,
        clear_value: vesper_core::rhi::ClearValue::DepthStencil {
            depth: 1.0,
            stencil: 0,
        },
        sample_count: MsaaSampleCount::One,
    }
}
