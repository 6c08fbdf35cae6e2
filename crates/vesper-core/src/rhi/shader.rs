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

//! Compiled shader module contract.

use std::any::Any;
use std::fmt::Debug;

use super::{ShaderId, ShaderStage};

/// A compiled shader module for a single pipeline stage.
pub trait Shader: Debug + Send + Sync {
    /// The shader's process-unique ID. Part of the pipeline cache key.
    fn id(&self) -> ShaderId;

    /// The stage the module was compiled for.
    fn stage(&self) -> ShaderStage;

    /// Debug label of the module.
    fn label(&self) -> &str;

    /// Downcasting support for backends.
    fn as_any(&self) -> &dyn Any;
}
