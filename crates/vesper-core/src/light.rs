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

//! Light sources submitted to the scene renderer each frame.

use glam::Vec3;

/// The kind of a light source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightType {
    /// A point light radiating from a world-space position.
    Point,
    /// A directional light; `position` holds its direction instead.
    Directional,
}

/// A single light source.
///
/// The first directional light in a frame's light list drives the cascaded
/// shadow maps.
#[derive(Debug, Clone, Copy)]
pub struct Light {
    /// World-space position for point lights, normalized direction for
    /// directional lights.
    pub position: Vec3,
    /// Linear RGB color pre-multiplied by intensity.
    pub color: Vec3,
    /// The kind of light.
    pub light_type: LightType,
}

impl Light {
    /// Creates a point light.
    pub fn point(position: Vec3, color: Vec3) -> Self {
        Self {
            position,
            color,
            light_type: LightType::Point,
        }
    }

    /// Creates a directional light shining along `direction`.
    pub fn directional(direction: Vec3, color: Vec3) -> Self {
        Self {
            position: direction.normalize(),
            color,
            light_type: LightType::Directional,
        }
    }
}
