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

//! # Vesper Render
//!
//! The scene renderer and its supporting machinery: a declarative render
//! graph with automatic layout transitions, a memoizing pipeline state
//! cache, and the deferred/forward scene rendering paths built on top of
//! the backend-agnostic contracts in `vesper-core`.

#![warn(missing_docs)]

pub mod graph;
pub mod pipeline_cache;
pub mod scene_renderer;

pub use graph::{OutputBinding, PassContext, PassDimensions, PassExecutor, RenderGraph};
pub use pipeline_cache::PipelineStateCache;
pub use scene_renderer::{OverlayContext, OverlayHook, RendererAssets, ScenePass, SceneRenderer};
