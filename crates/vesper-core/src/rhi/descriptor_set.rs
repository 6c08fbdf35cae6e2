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

//! Descriptor set contract: builder-style binding declaration and
//! post-build rebinding of individual slots.

use std::any::Any;
use std::fmt::Debug;

use crate::error::ResourceError;

use super::{
    BufferHandle, DescriptorSetId, ImageLayout, ShaderStageFlags, TextureHandle,
};

/// The kind of resource bound at one descriptor slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorType {
    /// A uniform buffer binding.
    UniformBuffer,
    /// A storage buffer binding.
    StorageBuffer,
    /// A combined image/sampler binding.
    ImageSampler,
    /// A storage image binding (compute writes).
    StorageImage,
}

/// The shape of a descriptor set: the descriptor types of its bindings in
/// binding-index order.
///
/// Two sets with the same layout are interchangeable for pipeline
/// compatibility, which makes this the pipeline cache's notion of a
/// descriptor layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DescriptorSetLayout {
    /// Descriptor type per binding index.
    pub bindings: Vec<DescriptorType>,
}

/// A bound set of shader-visible resources.
///
/// Built with `begin_building` / `add_*` / `end_building`; bindings receive
/// consecutive indices in declaration order. Individual bindings can be
/// re-pointed at new resources after the build, e.g. when a storage buffer
/// grows and is reallocated.
pub trait DescriptorSet: Debug + Send + Sync {
    /// The set's process-unique ID.
    fn id(&self) -> DescriptorSetId;

    /// Starts declaring bindings. Clears any previous declaration.
    fn begin_building(&self);

    /// Declares a uniform buffer at the next binding index.
    fn add_uniform_buffer(&self, buffer: &BufferHandle, stages: ShaderStageFlags);

    /// Declares a storage buffer at the next binding index.
    fn add_storage_buffer(&self, buffer: &BufferHandle, stages: ShaderStageFlags);

    /// Declares a combined image/sampler at the next binding index, sampled
    /// in `layout`.
    fn add_image_sampler(
        &self,
        texture: &TextureHandle,
        stages: ShaderStageFlags,
        layout: ImageLayout,
    );

    /// Declares a storage image at the next binding index, accessed in
    /// `layout`.
    fn add_storage_image(
        &self,
        texture: &TextureHandle,
        stages: ShaderStageFlags,
        layout: ImageLayout,
    );

    /// Finalizes the declared bindings into a backend descriptor set.
    fn end_building(&self) -> Result<(), ResourceError>;

    /// Re-points a uniform buffer binding at a new buffer.
    fn update_uniform_buffer_binding(
        &self,
        binding: u32,
        buffer: &BufferHandle,
    ) -> Result<(), ResourceError>;

    /// Re-points a storage buffer binding at a new buffer.
    fn update_storage_buffer_binding(
        &self,
        binding: u32,
        buffer: &BufferHandle,
    ) -> Result<(), ResourceError>;

    /// Re-points an image/sampler binding at a new texture.
    fn update_image_sampler_binding(
        &self,
        binding: u32,
        texture: &TextureHandle,
        layout: ImageLayout,
    ) -> Result<(), ResourceError>;

    /// Re-points a storage image binding at one mip level of a texture.
    fn update_storage_image_binding(
        &self,
        binding: u32,
        texture: &TextureHandle,
        mip_level: u32,
        layout: ImageLayout,
    ) -> Result<(), ResourceError>;

    /// The shape of the built set.
    fn layout(&self) -> DescriptorSetLayout;

    /// Downcasting support for backends.
    fn as_any(&self) -> &dyn Any;
}
