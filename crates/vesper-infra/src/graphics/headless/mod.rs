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

//! The headless backend: implements every rendering contract with plain
//! host memory. Command buffers record an inspectable event stream, images
//! track their layouts, and descriptor sets remember what they bind, which
//! is what the renderer's tests assert against.

mod command;
mod device;
mod resources;
mod swapchain;

pub use command::{Command, HeadlessCommandBuffer};
pub use device::HeadlessDevice;
pub use resources::{
    HeadlessBuffer, HeadlessDescriptorSet, HeadlessFramebuffer, HeadlessRenderPass,
    HeadlessTexture,
};
pub use swapchain::{HeadlessQueue, HeadlessSwapchain};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks a mutex, recovering the guard if a panicking test poisoned it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
