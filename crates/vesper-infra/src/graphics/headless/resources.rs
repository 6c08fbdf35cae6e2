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

//! Host-memory resource implementations: buffers, textures, shaders,
//! descriptor sets, render passes, framebuffers, and pipeline states.

use std::any::Any;
use std::sync::Mutex;

use glam::UVec2;

use vesper_core::error::ResourceError;
use vesper_core::rhi::{
    AttachmentDescription, AttachmentIndex, Buffer, BufferHandle, BufferId, DescriptorSet,
    DescriptorSetId, DescriptorSetLayout, DescriptorType, Framebuffer, FramebufferId,
    ImageFormat, ImageLayout, PipelineState, PipelineStateId, PipelineType, RenderPass,
    RenderPassId, RenderTarget as _, RenderTargetHandle, Shader, ShaderId, ShaderStage,
    ShaderStageFlags, Texture as _, TextureDescriptor, TextureHandle, TextureId,
};

use super::lock;

/// A buffer backed by a `Vec<u8>`.
#[derive(Debug)]
pub struct HeadlessBuffer {
    id: BufferId,
    label: String,
    data: Mutex<Vec<u8>>,
}

impl HeadlessBuffer {
    pub(crate) fn new(size: u64, initial: Option<&[u8]>, label: &str) -> Self {
        let mut data = vec![0u8; size as usize];
        if let Some(initial) = initial {
            data[..initial.len()].copy_from_slice(initial);
        }
        Self {
            id: BufferId::next(),
            label: label.to_string(),
            data: Mutex::new(data),
        }
    }

    /// A copy of the buffer's current contents.
    pub fn contents(&self) -> Vec<u8> {
        lock(&self.data).clone()
    }
}

impl Buffer for HeadlessBuffer {
    fn id(&self) -> BufferId {
        self.id
    }

    fn allocated_size(&self) -> u64 {
        lock(&self.data).len() as u64
    }

    fn copy_data(&self, data: &[u8]) -> Result<(), ResourceError> {
        let mut contents = lock(&self.data);
        if data.len() > contents.len() {
            return Err(ResourceError::AllocationFailed {
                size: data.len() as u64,
                details: format!(
                    "upload exceeds '{}' allocation of {} bytes",
                    self.label,
                    contents.len()
                ),
            });
        }
        contents[..data.len()].copy_from_slice(data);
        Ok(())
    }

    fn reallocate(&self, new_size: u64) -> Result<(), ResourceError> {
        *lock(&self.data) = vec![0u8; new_size as usize];
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A texture tracking its descriptor and current layout.
#[derive(Debug)]
pub struct HeadlessTexture {
    id: TextureId,
    format: ImageFormat,
    dimensions: UVec2,
    layer_count: u32,
    mip_count: u32,
    layout: Mutex<ImageLayout>,
}

impl HeadlessTexture {
    pub(crate) fn new(descriptor: &TextureDescriptor) -> Self {
        Self {
            id: TextureId::next(),
            format: descriptor.format,
            dimensions: descriptor.dimensions,
            layer_count: descriptor.layer_count,
            mip_count: descriptor.mip_count,
            layout: Mutex::new(ImageLayout::Undefined),
        }
    }
}

impl vesper_core::rhi::Texture for HeadlessTexture {
    fn id(&self) -> TextureId {
        self.id
    }

    fn format(&self) -> ImageFormat {
        self.format
    }

    fn dimensions(&self) -> UVec2 {
        self.dimensions
    }

    fn layer_count(&self) -> u32 {
        self.layer_count
    }

    fn mip_count(&self) -> u32 {
        self.mip_count
    }

    fn current_layout(&self) -> ImageLayout {
        *lock(&self.layout)
    }

    fn set_current_layout(&self, layout: ImageLayout) {
        *lock(&self.layout) = layout;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A shader module stub carrying only identity and stage.
#[derive(Debug)]
pub struct HeadlessShader {
    id: ShaderId,
    stage: ShaderStage,
    label: String,
}

impl HeadlessShader {
    pub(crate) fn new(stage: ShaderStage, label: &str) -> Self {
        Self {
            id: ShaderId::next(),
            stage,
            label: label.to_string(),
        }
    }
}

impl Shader for HeadlessShader {
    fn id(&self) -> ShaderId {
        self.id
    }

    fn stage(&self) -> ShaderStage {
        self.stage
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// What a descriptor binding currently points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BoundResource {
    Buffer(BufferId),
    Image {
        texture: TextureId,
        mip_level: Option<u32>,
    },
}

#[derive(Debug, Clone)]
struct Binding {
    descriptor_type: DescriptorType,
    resource: BoundResource,
}

#[derive(Debug, Default)]
struct SetState {
    building: bool,
    built: bool,
    bindings: Vec<Binding>,
}

/// A descriptor set remembering its binding declarations and what each
/// binding points at.
#[derive(Debug)]
pub struct HeadlessDescriptorSet {
    id: DescriptorSetId,
    label: String,
    state: Mutex<SetState>,
}

impl HeadlessDescriptorSet {
    pub(crate) fn new(label: &str) -> Self {
        Self {
            id: DescriptorSetId::next(),
            label: label.to_string(),
            state: Mutex::new(SetState::default()),
        }
    }

    /// The buffer currently bound at `binding`, if it is a buffer binding.
    pub fn bound_buffer(&self, binding: u32) -> Option<BufferId> {
        match lock(&self.state).bindings.get(binding as usize)?.resource {
            BoundResource::Buffer(id) => Some(id),
            BoundResource::Image { .. } => None,
        }
    }

    /// The texture currently bound at `binding`, if it is an image binding.
    pub fn bound_texture(&self, binding: u32) -> Option<TextureId> {
        match lock(&self.state).bindings.get(binding as usize)?.resource {
            BoundResource::Image { texture, .. } => Some(texture),
            BoundResource::Buffer(_) => None,
        }
    }

    /// Number of declared bindings.
    pub fn binding_count(&self) -> usize {
        lock(&self.state).bindings.len()
    }

    fn add(&self, descriptor_type: DescriptorType, resource: BoundResource) {
        let mut state = lock(&self.state);
        debug_assert!(state.building, "binding added outside begin/end_building");
        state.bindings.push(Binding {
            descriptor_type,
            resource,
        });
    }

    fn update(
        &self,
        binding: u32,
        expected: DescriptorType,
        resource: BoundResource,
    ) -> Result<(), ResourceError> {
        let mut state = lock(&self.state);
        match state.bindings.get_mut(binding as usize) {
            Some(slot) if slot.descriptor_type == expected => {
                slot.resource = resource;
                Ok(())
            }
            _ => Err(ResourceError::InvalidBinding { binding }),
        }
    }
}

impl DescriptorSet for HeadlessDescriptorSet {
    fn id(&self) -> DescriptorSetId {
        self.id
    }

    fn begin_building(&self) {
        let mut state = lock(&self.state);
        state.building = true;
        state.built = false;
        state.bindings.clear();
    }

    fn add_uniform_buffer(&self, buffer: &BufferHandle, _stages: ShaderStageFlags) {
        self.add(
            DescriptorType::UniformBuffer,
            BoundResource::Buffer(buffer.id()),
        );
    }

    fn add_storage_buffer(&self, buffer: &BufferHandle, _stages: ShaderStageFlags) {
        self.add(
            DescriptorType::StorageBuffer,
            BoundResource::Buffer(buffer.id()),
        );
    }

    fn add_image_sampler(
        &self,
        texture: &TextureHandle,
        _stages: ShaderStageFlags,
        _layout: ImageLayout,
    ) {
        self.add(
            DescriptorType::ImageSampler,
            BoundResource::Image {
                texture: texture.id(),
                mip_level: None,
            },
        );
    }

    fn add_storage_image(
        &self,
        texture: &TextureHandle,
        _stages: ShaderStageFlags,
        _layout: ImageLayout,
    ) {
        self.add(
            DescriptorType::StorageImage,
            BoundResource::Image {
                texture: texture.id(),
                mip_level: Some(0),
            },
        );
    }

    fn end_building(&self) -> Result<(), ResourceError> {
        let mut state = lock(&self.state);
        if state.bindings.is_empty() {
            return Err(ResourceError::IncompleteDescription(format!(
                "descriptor set '{}' has no bindings",
                self.label
            )));
        }
        state.building = false;
        state.built = true;
        Ok(())
    }

    fn update_uniform_buffer_binding(
        &self,
        binding: u32,
        buffer: &BufferHandle,
    ) -> Result<(), ResourceError> {
        self.update(
            binding,
            DescriptorType::UniformBuffer,
            BoundResource::Buffer(buffer.id()),
        )
    }

    fn update_storage_buffer_binding(
        &self,
        binding: u32,
        buffer: &BufferHandle,
    ) -> Result<(), ResourceError> {
        self.update(
            binding,
            DescriptorType::StorageBuffer,
            BoundResource::Buffer(buffer.id()),
        )
    }

    fn update_image_sampler_binding(
        &self,
        binding: u32,
        texture: &TextureHandle,
        _layout: ImageLayout,
    ) -> Result<(), ResourceError> {
        self.update(
            binding,
            DescriptorType::ImageSampler,
            BoundResource::Image {
                texture: texture.id(),
                mip_level: None,
            },
        )
    }

    fn update_storage_image_binding(
        &self,
        binding: u32,
        texture: &TextureHandle,
        mip_level: u32,
        _layout: ImageLayout,
    ) -> Result<(), ResourceError> {
        self.update(
            binding,
            DescriptorType::StorageImage,
            BoundResource::Image {
                texture: texture.id(),
                mip_level: Some(mip_level),
            },
        )
    }

    fn layout(&self) -> DescriptorSetLayout {
        DescriptorSetLayout {
            bindings: lock(&self.state)
                .bindings
                .iter()
                .map(|binding| binding.descriptor_type)
                .collect(),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Default)]
struct SubpassRefs {
    colors: Vec<u32>,
    resolves: Vec<u32>,
    depth_stencil: Option<u32>,
}

#[derive(Debug, Default)]
struct PassState {
    building: bool,
    subpass_open: bool,
    attachments: Vec<AttachmentDescription>,
    subpasses: Vec<SubpassRefs>,
}

/// A render pass remembering its attachment and subpass structure.
#[derive(Debug)]
pub struct HeadlessRenderPass {
    id: RenderPassId,
    label: String,
    state: Mutex<PassState>,
}

impl HeadlessRenderPass {
    pub(crate) fn new(label: &str) -> Self {
        Self {
            id: RenderPassId::next(),
            label: label.to_string(),
            state: Mutex::new(PassState::default()),
        }
    }

    /// Color attachment indices of one subpass, in reference order.
    pub fn subpass_colors(&self, subpass: usize) -> Vec<u32> {
        lock(&self.state)
            .subpasses
            .get(subpass)
            .map(|refs| refs.colors.clone())
            .unwrap_or_default()
    }

    /// Resolve attachment indices of one subpass.
    pub fn subpass_resolves(&self, subpass: usize) -> Vec<u32> {
        lock(&self.state)
            .subpasses
            .get(subpass)
            .map(|refs| refs.resolves.clone())
            .unwrap_or_default()
    }

    /// Depth/stencil attachment index of one subpass.
    pub fn subpass_depth_stencil(&self, subpass: usize) -> Option<u32> {
        lock(&self.state)
            .subpasses
            .get(subpass)
            .and_then(|refs| refs.depth_stencil)
    }
}

impl RenderPass for HeadlessRenderPass {
    fn id(&self) -> RenderPassId {
        self.id
    }

    fn begin_building(&self) {
        let mut state = lock(&self.state);
        *state = PassState::default();
        state.building = true;
    }

    fn define_attachment(&self, description: &AttachmentDescription) -> AttachmentIndex {
        let mut state = lock(&self.state);
        state.attachments.push(description.clone());
        AttachmentIndex(state.attachments.len() as u32 - 1)
    }

    fn begin_subpass(&self) {
        let mut state = lock(&self.state);
        state.subpasses.push(SubpassRefs::default());
        state.subpass_open = true;
    }

    fn add_color_attachment(&self, index: AttachmentIndex, _layout: ImageLayout) {
        let mut state = lock(&self.state);
        if let Some(subpass) = state.subpasses.last_mut() {
            subpass.colors.push(index.0);
        }
    }

    fn add_resolve_attachment(&self, index: AttachmentIndex, _layout: ImageLayout) {
        let mut state = lock(&self.state);
        if let Some(subpass) = state.subpasses.last_mut() {
            subpass.resolves.push(index.0);
        }
    }

    fn add_depth_stencil_attachment(&self, index: AttachmentIndex, _layout: ImageLayout) {
        let mut state = lock(&self.state);
        if let Some(subpass) = state.subpasses.last_mut() {
            subpass.depth_stencil = Some(index.0);
        }
    }

    fn end_subpass(&self) {
        lock(&self.state).subpass_open = false;
    }

    fn end_building(&self) -> Result<(), ResourceError> {
        let mut state = lock(&self.state);
        if state.subpass_open {
            return Err(ResourceError::IncompleteDescription(format!(
                "render pass '{}' ended with an open subpass",
                self.label
            )));
        }
        if state.subpasses.is_empty() {
            return Err(ResourceError::IncompleteDescription(format!(
                "render pass '{}' declares no subpasses",
                self.label
            )));
        }
        for subpass in &state.subpasses {
            let out_of_range = subpass
                .colors
                .iter()
                .chain(&subpass.resolves)
                .chain(subpass.depth_stencil.as_ref())
                .any(|&index| index as usize >= state.attachments.len());
            if out_of_range {
                return Err(ResourceError::IncompleteDescription(format!(
                    "render pass '{}' references an undeclared attachment",
                    self.label
                )));
            }
        }
        state.building = false;
        Ok(())
    }

    fn attachment_count(&self) -> u32 {
        lock(&self.state).attachments.len() as u32
    }

    fn attachment_descriptions(&self) -> Vec<AttachmentDescription> {
        lock(&self.state).attachments.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Default)]
struct FramebufferState {
    dimensions: UVec2,
    attachments: Vec<TextureId>,
    built: bool,
}

/// A framebuffer remembering the images bound to each attachment slot.
#[derive(Debug)]
pub struct HeadlessFramebuffer {
    id: FramebufferId,
    label: String,
    expected_attachments: u32,
    state: Mutex<FramebufferState>,
}

impl HeadlessFramebuffer {
    pub(crate) fn new(label: &str, expected_attachments: u32) -> Self {
        Self {
            id: FramebufferId::next(),
            label: label.to_string(),
            expected_attachments,
            state: Mutex::new(FramebufferState::default()),
        }
    }

    /// The bound attachment texture IDs, in slot order.
    pub fn attachment_ids(&self) -> Vec<TextureId> {
        lock(&self.state).attachments.clone()
    }
}

impl Framebuffer for HeadlessFramebuffer {
    fn id(&self) -> FramebufferId {
        self.id
    }

    fn begin_building(&self, dimensions: UVec2) {
        let mut state = lock(&self.state);
        state.dimensions = dimensions;
        state.attachments.clear();
        state.built = false;
    }

    fn attach_texture(&self, texture: &TextureHandle) {
        lock(&self.state).attachments.push(texture.id());
    }

    fn attach_render_target(&self, target: &RenderTargetHandle) {
        lock(&self.state).attachments.push(target.as_texture().id());
    }

    fn end_building(&self) -> Result<(), ResourceError> {
        let mut state = lock(&self.state);
        if state.attachments.len() as u32 != self.expected_attachments {
            return Err(ResourceError::IncompleteDescription(format!(
                "framebuffer '{}' binds {} attachments, render pass declares {}",
                self.label,
                state.attachments.len(),
                self.expected_attachments
            )));
        }
        state.built = true;
        Ok(())
    }

    fn dimensions(&self) -> UVec2 {
        lock(&self.state).dimensions
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A compiled pipeline stub.
#[derive(Debug)]
pub struct HeadlessPipelineState {
    id: PipelineStateId,
    pipeline_type: PipelineType,
    #[allow(dead_code)]
    label: String,
}

impl HeadlessPipelineState {
    pub(crate) fn new(pipeline_type: PipelineType, label: &str) -> Self {
        Self {
            id: PipelineStateId::next(),
            pipeline_type,
            label: label.to_string(),
        }
    }
}

impl PipelineState for HeadlessPipelineState {
    fn id(&self) -> PipelineStateId {
        self.id
    }

    fn pipeline_type(&self) -> PipelineType {
        self.pipeline_type
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
