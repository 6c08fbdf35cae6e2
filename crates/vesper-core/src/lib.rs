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

//! # Vesper Core
//!
//! Foundational crate containing the backend-agnostic rendering contracts
//! (device, command buffer, swapchain, resource traits) and the scene data
//! model (meshes, materials, lights, cameras, renderer settings) shared by
//! every backend and by the scene renderer.

#![warn(missing_docs)]

pub mod camera;
pub mod error;
pub mod light;
pub mod rhi;
pub mod scene;
pub mod settings;

pub use camera::Camera;
pub use light::{Light, LightType};
pub use scene::{BoundingSphere, EnvironmentMap, Material, Mesh, SceneDescription};
pub use settings::{DebugView, RendererSettings, RendererType};
