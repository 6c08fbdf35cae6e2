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

//! # Vesper Infra
//!
//! Concrete implementations of the backend contracts declared in
//! `vesper-core`. Currently ships the headless backend, which records
//! command streams and tracks resource state without a GPU; it backs the
//! renderer's test suites and server-side validation runs.

#![warn(missing_docs)]

pub mod graphics;

pub use graphics::headless::{
    Command, HeadlessBuffer, HeadlessCommandBuffer, HeadlessDescriptorSet, HeadlessDevice,
    HeadlessFramebuffer, HeadlessQueue, HeadlessRenderPass, HeadlessSwapchain, HeadlessTexture,
};
