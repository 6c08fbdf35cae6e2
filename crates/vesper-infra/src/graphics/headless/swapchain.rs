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

//! Headless swapchain and queue: presentable images cycle round-robin and
//! submissions are logged instead of executed.

use std::any::Any;
use std::sync::{Arc, Mutex};

use glam::UVec2;

use vesper_core::error::{RenderError, ResourceError};
use vesper_core::rhi::{
    CommandBufferHandle, CommandQueue, ImageFormat, ImageUsageFlags, RenderTarget,
    RenderTargetHandle, Swapchain, Texture as _, TextureDescriptor, TextureHandle,
};

use super::lock;
use super::resources::HeadlessTexture;

const SWAPCHAIN_FORMAT: ImageFormat = ImageFormat::Bgra8Unorm;

/// One presentable headless image.
#[derive(Debug)]
struct HeadlessRenderTarget {
    image_index: u32,
    texture: TextureHandle,
}

impl RenderTarget for HeadlessRenderTarget {
    fn image_index(&self) -> u32 {
        self.image_index
    }

    fn dimensions(&self) -> UVec2 {
        self.texture.dimensions()
    }

    fn as_texture(&self) -> TextureHandle {
        self.texture.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug)]
struct SwapState {
    dimensions: UVec2,
    vsync: bool,
    next_image: u32,
    targets: Vec<RenderTargetHandle>,
}

/// A swapchain of host-memory images, acquired round-robin.
#[derive(Debug)]
pub struct HeadlessSwapchain {
    image_count: u32,
    state: Mutex<SwapState>,
}

impl HeadlessSwapchain {
    pub(crate) fn new(dimensions: UVec2, image_count: u32) -> Self {
        Self {
            image_count,
            state: Mutex::new(SwapState {
                dimensions,
                vsync: true,
                next_image: 0,
                targets: make_targets(dimensions, image_count),
            }),
        }
    }

    /// Whether vsync is currently requested.
    pub fn vsync_enabled(&self) -> bool {
        lock(&self.state).vsync
    }
}

fn make_targets(dimensions: UVec2, image_count: u32) -> Vec<RenderTargetHandle> {
    (0..image_count)
        .map(|image_index| {
            let texture = Arc::new(HeadlessTexture::new(&TextureDescriptor::image_2d(
                format!("Swapchain Image [{image_index}]"),
                SWAPCHAIN_FORMAT,
                dimensions,
                ImageUsageFlags::COLOR_ATTACHMENT,
            )));
            Arc::new(HeadlessRenderTarget {
                image_index,
                texture,
            }) as RenderTargetHandle
        })
        .collect()
}

impl Swapchain for HeadlessSwapchain {
    fn acquire_next_image(&self) -> Result<RenderTargetHandle, RenderError> {
        let mut state = lock(&self.state);
        let index = state.next_image as usize;
        state.next_image = (state.next_image + 1) % self.image_count;
        Ok(state.targets[index].clone())
    }

    fn image_count(&self) -> u32 {
        self.image_count
    }

    fn render_targets(&self) -> Vec<RenderTargetHandle> {
        lock(&self.state).targets.clone()
    }

    fn format(&self) -> ImageFormat {
        SWAPCHAIN_FORMAT
    }

    fn dimensions(&self) -> UVec2 {
        lock(&self.state).dimensions
    }

    fn recreate(&self, dimensions: UVec2) -> Result<(), ResourceError> {
        let mut state = lock(&self.state);
        state.dimensions = dimensions;
        state.targets = make_targets(dimensions, self.image_count);
        state.next_image = 0;
        log::debug!(
            "Headless swapchain recreated at {}x{} ({} images)",
            dimensions.x,
            dimensions.y,
            self.image_count
        );
        Ok(())
    }

    fn set_vsync(&self, enabled: bool) -> Result<(), ResourceError> {
        lock(&self.state).vsync = enabled;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A queue logging submissions and presented image indices.
#[derive(Debug, Default)]
pub struct HeadlessQueue {
    submissions: Mutex<Vec<(u32, CommandBufferHandle)>>,
    presents: Mutex<Vec<u32>>,
}

impl HeadlessQueue {
    /// Image indices of all submissions, in order.
    pub fn submissions(&self) -> Vec<u32> {
        lock(&self.submissions)
            .iter()
            .map(|(index, _)| *index)
            .collect()
    }

    /// The most recently submitted command buffer.
    pub fn last_submission(&self) -> Option<CommandBufferHandle> {
        lock(&self.submissions)
            .last()
            .map(|(_, buffer)| buffer.clone())
    }

    /// Image indices of all presents, in order.
    pub fn presents(&self) -> Vec<u32> {
        lock(&self.presents).clone()
    }
}

impl CommandQueue for HeadlessQueue {
    fn submit(
        &self,
        command_buffer: &CommandBufferHandle,
        target: &RenderTargetHandle,
    ) -> Result<(), RenderError> {
        lock(&self.submissions).push((target.image_index(), command_buffer.clone()));
        Ok(())
    }

    fn present(&self, target: &RenderTargetHandle) -> Result<(), RenderError> {
        lock(&self.presents).push(target.image_index());
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
