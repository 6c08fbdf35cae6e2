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

//! User-facing renderer configuration.

use std::fmt;

/// Which rendering path the scene renderer uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererType {
    /// Forward shading with multisampled color targets.
    Forward,
    /// Deferred shading through a G-buffer.
    Deferred,
}

/// Diagnostic views that replace or alter the final image.
///
/// G-buffer and depth views rebind the presented attachment to an
/// intermediate target; the tone-mapping views alter the tone-mapping pass
/// behavior instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DebugView {
    /// The regular shaded output.
    #[default]
    None,
    /// The G-buffer base color target.
    GBufferAlbedo,
    /// The G-buffer roughness target.
    GBufferRoughness,
    /// The G-buffer metallic target.
    GBufferMetallic,
    /// The G-buffer emission target.
    GBufferEmission,
    /// The G-buffer world-space normal target.
    GBufferNormal,
    /// The scene depth target.
    SceneDepth,
    /// Shaded output with cascade boundaries tinted per cascade.
    CascadeBoundaries,
    /// Shaded output with tone mapping disabled.
    ToneMappingOff,
    /// Shaded output tone mapped with the Reinhard operator instead of the
    /// ACES LUT.
    ToneMappingReinhard,
}

impl DebugView {
    /// True if this view presents a geometry-pass attachment directly.
    pub fn is_gbuffer_view(&self) -> bool {
        matches!(
            self,
            DebugView::GBufferAlbedo
                | DebugView::GBufferRoughness
                | DebugView::GBufferMetallic
                | DebugView::GBufferEmission
                | DebugView::GBufferNormal
                | DebugView::SceneDepth
        )
    }
}

impl fmt::Display for DebugView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DebugView::None => "None",
            DebugView::GBufferAlbedo => "G-Buffer Albedo",
            DebugView::GBufferRoughness => "G-Buffer Roughness",
            DebugView::GBufferMetallic => "G-Buffer Metallic",
            DebugView::GBufferEmission => "G-Buffer Emission",
            DebugView::GBufferNormal => "G-Buffer Normals",
            DebugView::SceneDepth => "Scene Depth",
            DebugView::CascadeBoundaries => "Shadow Cascades",
            DebugView::ToneMappingOff => "Tone Mapping Off",
            DebugView::ToneMappingReinhard => "Tone Mapping Reinhard",
        };
        write!(f, "{name}")
    }
}

/// Renderer configuration applied between frames.
///
/// The scene renderer diffs consecutive settings and rebuilds only what the
/// changed fields require (graph topology, swapchain, shadow resources).
#[derive(Debug, Clone, PartialEq)]
pub struct RendererSettings {
    /// The active rendering path.
    pub renderer_type: RendererType,
    /// Whether presentation waits for vertical sync.
    pub vsync_enabled: bool,
    /// Whether meshes outside the view frustum are skipped.
    pub frustum_culling_enabled: bool,
    /// Whether the cascaded shadow maps are rendered and sampled.
    pub shadows_enabled: bool,
    /// Number of shadow cascades (at most [`MAX_SHADOW_CASCADES`]).
    pub shadow_cascade_count: u32,
    /// Side length in texels of each cascade's shadow map.
    pub shadow_map_resolution: u32,
    /// Depth bias applied when sampling the shadow maps.
    pub shadow_map_bias: f32,
    /// Multiplier on the light-space depth range of each cascade.
    pub shadow_z_multiplier: f32,
    /// The active diagnostic view.
    pub debug_view: DebugView,
}

/// Upper bound on `shadow_cascade_count`, matching the fixed size of the
/// per-frame cascade matrix buffer.
pub const MAX_SHADOW_CASCADES: u32 = 8;

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            renderer_type: RendererType::Deferred,
            vsync_enabled: true,
            frustum_culling_enabled: true,
            shadows_enabled: true,
            shadow_cascade_count: 3,
            shadow_map_resolution: 4096,
            shadow_map_bias: 0.02,
            shadow_z_multiplier: 1.0,
            debug_view: DebugView::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_fit_cascade_bound() {
        let settings = RendererSettings::default();
        assert!(settings.shadow_cascade_count <= MAX_SHADOW_CASCADES);
        assert_eq!(settings.renderer_type, RendererType::Deferred);
    }

    #[test]
    fn gbuffer_views_are_classified() {
        assert!(DebugView::GBufferNormal.is_gbuffer_view());
        assert!(DebugView::SceneDepth.is_gbuffer_view());
        assert!(!DebugView::CascadeBoundaries.is_gbuffer_view());
        assert!(!DebugView::None.is_gbuffer_view());
    }
}
