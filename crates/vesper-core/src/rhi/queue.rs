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

//! Command queue contract.

use std::any::Any;
use std::fmt::Debug;

use crate::error::RenderError;

use super::{CommandBufferHandle, RenderTargetHandle};

/// A queue accepting recorded command buffers for execution.
pub trait CommandQueue: Debug + Send + Sync {
    /// Submits a recorded command buffer whose results target the given
    /// swapchain image.
    fn submit(
        &self,
        command_buffer: &CommandBufferHandle,
        target: &RenderTargetHandle,
    ) -> Result<(), RenderError>;

    /// Presents a swapchain image previously targeted by a submission.
    fn present(&self, target: &RenderTargetHandle) -> Result<(), RenderError>;

    /// Downcasting support for backends.
    fn as_any(&self) -> &dyn Any;
}
