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

//! The scene renderer: drives the render graph through deferred or forward
//! topologies, owns the per-frame GPU resources, and turns submitted meshes
//! into recorded frames.
//!
//! A frame is bracketed as `begin_scene` / `submit`* / `end_scene`; closing
//! the bracket records, submits, and presents the frame. Calling these out
//! of order is a programmer error and panics; GPU and graph failures are
//! returned as [`RenderError`].

pub mod cascades;
pub mod culling;
pub mod gpu_types;
mod ibl;
mod passes;

use std::sync::Arc;

use glam::{Mat4, UVec2, UVec4, Vec4};

use vesper_core::error::RenderError;
use vesper_core::rhi::{
    AccessFlags, AttachmentDescription, AttachmentLoadOp, AttachmentStoreOp, Buffer as _,
    BufferHandle, ClearValue, CommandBuffer as _, CommandBufferHandle, CommandQueue as _,
    DescriptorSet as _, DescriptorSetHandle, Framebuffer as _, FramebufferHandle, GraphicsDevice,
    ImageFormat, ImageLayout, ImageMemoryBarrier, MsaaSampleCount, PipelineBarrier,
    PipelineStageFlags, RenderPass as _, RenderPassHandle, RenderTarget as _, RenderTargetHandle,
    ShaderHandle, ShaderStageFlags, Swapchain as _, Texture as _, TextureHandle,
};
use vesper_core::{
    DebugView, LightType, Material, Mesh, RendererSettings, RendererType, SceneDescription,
};
use vesper_core::settings::MAX_SHADOW_CASCADES;

use crate::graph::{
    color_attachment, depth_attachment, OutputBinding, PassDimensions, RenderGraph,
    RenderGraphPass,
};
use crate::pipeline_cache::PipelineStateCache;
use crate::scene_renderer::culling::Frustum;
use crate::scene_renderer::gpu_types::{
    GpuLight, ObjectPushConstants, SceneUniforms, MATERIAL_FLAG_DIRECTX_NORMALS,
    MATERIAL_FLAG_NORMAL_MAP, SCENE_FLAG_SHADOWS_OFF, SCENE_FLAG_SHOW_CASCADES,
};
use crate::scene_renderer::passes::{DrawCommand, ScenePassRecorder};

/// What a graph pass renders; the executor dispatches on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenePass {
    /// Forward path depth pre-pass (multisampled, no culling).
    DepthPrePass,
    /// Depth-only cascaded shadow rendering into a layered map.
    CascadedShadows,
    /// Deferred geometry into the G-buffer.
    GBuffer,
    /// Fullscreen deferred shading from the G-buffer.
    DeferredLighting,
    /// Per-draw forward shading.
    ForwardLighting,
    /// Environment backdrop over the lit image.
    Environment {
        /// Sample count of the attachments being written.
        sample_count: MsaaSampleCount,
    },
    /// HDR to display-range mapping.
    ToneMapping,
    /// Antialiasing over the tone-mapped image (deferred path only).
    Fxaa,
}

/// Shaders, shared meshes, and lookup textures the renderer is constructed
/// with. Asset loading itself is out of scope; anything implementing the
/// device traits can supply these.
#[derive(Debug, Clone)]
pub struct RendererAssets {
    /// Fullscreen-triangle/quad vertex shader for post-processing.
    pub fullscreen_vertex_shader: ShaderHandle,
    /// Skybox cube vertex shader.
    pub cubemap_vertex_shader: ShaderHandle,
    /// Position-only vertex shader for the forward depth pre-pass.
    pub depth_only_vertex_shader: ShaderHandle,
    /// Depth-only vertex shader selecting a cascade by instance index.
    pub shadow_vertex_shader: ShaderHandle,
    /// G-buffer fill, separate metallic/roughness textures.
    pub deferred_geometry_unpacked_shader: ShaderHandle,
    /// G-buffer fill, ORM-packed textures.
    pub deferred_geometry_orm_shader: ShaderHandle,
    /// Fullscreen deferred shading.
    pub deferred_lighting_shader: ShaderHandle,
    /// Forward shading, separate metallic/roughness textures.
    pub forward_unpacked_shader: ShaderHandle,
    /// Forward shading, ORM-packed textures.
    pub forward_orm_shader: ShaderHandle,
    /// Environment backdrop fragment shader.
    pub environment_shader: ShaderHandle,
    /// Tone mapping fragment shader (ACES LUT plus debug operators).
    pub tone_mapping_shader: ShaderHandle,
    /// FXAA fragment shader.
    pub fxaa_shader: ShaderHandle,
    /// Irradiance convolution compute shader.
    pub irradiance_compute_shader: ShaderHandle,
    /// Environment prefilter compute shader.
    pub prefilter_compute_shader: ShaderHandle,
    /// Unit quad for fullscreen passes.
    pub quad_mesh: Mesh,
    /// Unit cube for the environment backdrop.
    pub cube_mesh: Mesh,
    /// Split-sum BRDF lookup table.
    pub brdf_lut: TextureHandle,
    /// ACES tone mapping 3D lookup table.
    pub tone_mapping_lut: TextureHandle,
    /// 1x1 black cubemap bound wherever no environment is submitted.
    pub fallback_cubemap: TextureHandle,
}

/// Arguments handed to the overlay hook each frame.
pub struct OverlayContext<'a> {
    /// The frame's command buffer, inside an open window render pass.
    pub command_buffer: &'a CommandBufferHandle,
    /// The window render pass, for the overlay's pipeline creation.
    pub render_pass: &'a RenderPassHandle,
    /// The framebuffer over the acquired swapchain image.
    pub framebuffer: &'a FramebufferHandle,
    /// Swapchain dimensions.
    pub dimensions: UVec2,
    /// The finished scene image, bound for sampling.
    pub viewport_input: &'a DescriptorSetHandle,
}

/// A host-UI callback recorded between the scene and presentation.
pub type OverlayHook = Box<dyn FnMut(&OverlayContext<'_>) + Send>;

/// Initial size of the per-frame light storage buffer; grows by doubling.
const LIGHTS_BUFFER_INITIAL_SIZE: u64 = 1024;
/// Fixed size of the cascade matrix buffer (eight mat4s).
const SHADOW_MATRIX_BUFFER_SIZE: u64 = MAX_SHADOW_CASCADES as u64 * 64;

/// Binding index of the light storage buffer in the scene set.
const LIGHTS_BINDING: u32 = 1;
/// Binding indices of the environment-derived textures in the scene set.
const IRRADIANCE_BINDING: u32 = 3;
const PREFILTERED_BINDING: u32 = 4;
const ENVIRONMENT_BINDING: u32 = 6;

const SHADOW_PASS: &str = "Shadow Pass";
const SHADOW_MAP: &str = "Shadow Map";
const GEOMETRY_PASS: &str = "Geometry Pass";
const DEPTH_PRE_PASS: &str = "Depth Pre-Pass";
const LIGHTING_PASS: &str = "Lighting Pass";
const ENVIRONMENT_PASS: &str = "Environment Pass";
const TONE_MAPPING_PASS: &str = "Tone Mapping Pass";
const FXAA_PASS: &str = "FXAA Pass";

/// Per-frame-in-flight GPU state.
struct FrameContext {
    command_buffer: CommandBufferHandle,
    scene_uniform_buffer: BufferHandle,
    lights_buffer: BufferHandle,
    lights_capacity: u64,
    shadow_matrix_buffer: BufferHandle,
    scene_set: DescriptorSetHandle,
    draws: Vec<DrawCommand>,
}

impl FrameContext {
    fn new(
        device: &Arc<dyn GraphicsDevice>,
        assets: &RendererAssets,
        frame_index: u32,
    ) -> Result<Self, RenderError> {
        let scene_uniform_buffer = device.create_uniform_buffer(
            None,
            std::mem::size_of::<SceneUniforms>() as u64,
            &format!("Scene Uniforms [{frame_index}]"),
        )?;
        let lights_buffer = device.create_storage_buffer(
            None,
            LIGHTS_BUFFER_INITIAL_SIZE,
            &format!("Scene Lights [{frame_index}]"),
        )?;
        let shadow_matrix_buffer = device.create_uniform_buffer(
            None,
            SHADOW_MATRIX_BUFFER_SIZE,
            &format!("Cascade Matrices [{frame_index}]"),
        )?;

        let scene_set = device.create_descriptor_set(&format!("Scene Data [{frame_index}]"));
        scene_set.begin_building();
        scene_set.add_uniform_buffer(&scene_uniform_buffer, ShaderStageFlags::VERTEX_FRAGMENT);
        scene_set.add_storage_buffer(&lights_buffer, ShaderStageFlags::FRAGMENT);
        scene_set.add_uniform_buffer(&shadow_matrix_buffer, ShaderStageFlags::VERTEX_FRAGMENT);
        scene_set.add_image_sampler(
            &assets.fallback_cubemap,
            ShaderStageFlags::FRAGMENT,
            ImageLayout::ShaderReadOnly,
        );
        scene_set.add_image_sampler(
            &assets.fallback_cubemap,
            ShaderStageFlags::FRAGMENT,
            ImageLayout::ShaderReadOnly,
        );
        scene_set.add_image_sampler(
            &assets.brdf_lut,
            ShaderStageFlags::FRAGMENT,
            ImageLayout::ShaderReadOnly,
        );
        scene_set.add_image_sampler(
            &assets.fallback_cubemap,
            ShaderStageFlags::FRAGMENT,
            ImageLayout::ShaderReadOnly,
        );
        scene_set.add_image_sampler(
            &assets.tone_mapping_lut,
            ShaderStageFlags::FRAGMENT,
            ImageLayout::ShaderReadOnly,
        );
        scene_set.end_building()?;

        Ok(Self {
            command_buffer: device
                .allocate_command_buffer(&format!("Frame Commands [{frame_index}]")),
            scene_uniform_buffer,
            lights_buffer,
            lights_capacity: LIGHTS_BUFFER_INITIAL_SIZE,
            shadow_matrix_buffer,
            scene_set,
            draws: Vec::new(),
        })
    }
}

/// State captured by `begin_scene` and consumed when the frame renders.
struct CurrentFrame {
    frame_index: u32,
    target: RenderTargetHandle,
    frustum: Frustum,
    cascade_count: u32,
    exposure: f32,
    environment_blur: f32,
    environment_rotation: Mat4,
}

/// Window render pass and framebuffers the overlay records into.
struct WindowPassResources {
    render_pass: RenderPassHandle,
    framebuffers: Vec<FramebufferHandle>,
}

/// The scene renderer.
pub struct SceneRenderer {
    device: Arc<dyn GraphicsDevice>,
    assets: RendererAssets,
    settings: RendererSettings,
    pipeline_cache: PipelineStateCache,
    graph: RenderGraph<ScenePass>,
    contexts: Vec<FrameContext>,
    viewport_dimensions: UVec2,
    overlay: Option<OverlayHook>,
    window_pass: Option<WindowPassResources>,
    viewport_slot: Option<DescriptorSetHandle>,
    current: Option<CurrentFrame>,
    scene_open: bool,
}

impl SceneRenderer {
    /// Creates the renderer, its per-frame resources, and the render graph
    /// for the given settings.
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        assets: RendererAssets,
        settings: RendererSettings,
    ) -> Result<Self, RenderError> {
        let swapchain = device.swapchain();
        swapchain.set_vsync(settings.vsync_enabled)?;
        let viewport_dimensions = swapchain.dimensions();
        let frame_count = swapchain.image_count();

        let contexts = (0..frame_count)
            .map(|index| FrameContext::new(&device, &assets, index))
            .collect::<Result<Vec<_>, _>>()?;

        let mut renderer = Self {
            pipeline_cache: PipelineStateCache::new(device.clone()),
            graph: RenderGraph::new(device.clone()),
            device,
            assets,
            settings,
            contexts,
            viewport_dimensions,
            overlay: None,
            window_pass: None,
            viewport_slot: None,
            current: None,
            scene_open: false,
        };
        renderer.rebuild_graph()?;
        Ok(renderer)
    }

    /// Opens a frame: acquires the next swapchain image, uploads the
    /// frame's scene constants, lights, and cascade matrices, and prepares
    /// culling.
    pub fn begin_scene(&mut self, scene: &SceneDescription<'_>) -> Result<(), RenderError> {
        assert!(
            !self.scene_open,
            "begin_scene called while a scene is already open"
        );
        let swapchain = self.device.swapchain();
        let target = swapchain.acquire_next_image()?;
        let frame_index = target.image_index();
        assert_eq!(
            self.contexts.len() as u32,
            swapchain.image_count(),
            "frame contexts must match the swapchain image count"
        );

        self.bind_environment(scene, frame_index)?;
        self.upload_lights(scene, frame_index)?;
        let cascade_data = self.upload_cascades(scene, frame_index)?;
        self.upload_scene_uniforms(scene, &cascade_data, frame_index)?;

        let camera = scene.camera;
        let rotation_only_view = Mat4::from_quat(camera.rotation()).inverse();
        self.contexts[frame_index as usize].draws.clear();
        self.current = Some(CurrentFrame {
            frame_index,
            target,
            frustum: Frustum::from_view_projection(&camera.view_projection_matrix()),
            cascade_count: cascade_data.light_matrices.len() as u32,
            exposure: scene.exposure,
            environment_blur: scene.environment_blur,
            environment_rotation: camera.projection_matrix() * rotation_only_view,
        });
        self.scene_open = true;
        Ok(())
    }

    /// Submits one mesh for the open frame. Meshes outside the view frustum
    /// are dropped here when culling is enabled.
    ///
    /// # Panics
    /// If called outside a `begin_scene`/`end_scene` bracket.
    pub fn submit(&mut self, mesh: &Mesh, material: &Material, transform: Mat4) {
        let current = match self.current.as_ref() {
            Some(current) if self.scene_open => current,
            _ => panic!("submit called outside of a begin_scene/end_scene bracket"),
        };
        if self.settings.frustum_culling_enabled
            && culling::should_cull(&current.frustum, &mesh.bounding_sphere, &transform)
        {
            return;
        }

        let mut flags = 0;
        if material.has_normal_map {
            flags |= MATERIAL_FLAG_NORMAL_MAP;
        }
        if material.has_directx_normals {
            flags |= MATERIAL_FLAG_DIRECTX_NORMALS;
        }
        let frame_index = current.frame_index as usize;
        self.contexts[frame_index].draws.push(DrawCommand {
            mesh: mesh.clone(),
            material: material.clone(),
            push: ObjectPushConstants {
                model: transform,
                flags: UVec4::new(flags, 0, 0, 0),
            },
        });
    }

    /// Closes the open frame's submission phase, orders draws for recording
    /// (alpha-blended materials last), then records, submits, and presents
    /// the frame.
    ///
    /// # Panics
    /// If no scene is open.
    pub fn end_scene(&mut self) -> Result<(), RenderError> {
        assert!(self.scene_open, "end_scene called without begin_scene");
        let current = match self.current.as_ref() {
            Some(current) => current,
            None => panic!("end_scene called without begin_scene"),
        };
        let frame_index = current.frame_index as usize;
        self.contexts[frame_index]
            .draws
            .sort_by_key(|draw| draw.material.is_alpha_blended);
        self.scene_open = false;
        self.render_scene()
    }

    /// Records, submits, and presents the closed frame.
    fn render_scene(&mut self) -> Result<(), RenderError> {
        assert!(!self.scene_open, "render_scene called before end_scene");
        let current = match self.current.take() {
            Some(current) => current,
            None => panic!("render_scene called without a begun scene"),
        };
        let frame_index = current.frame_index;
        let cmd = self.contexts[frame_index as usize].command_buffer.clone();

        cmd.begin_recording()?;
        {
            let context = &self.contexts[frame_index as usize];
            let mut recorder = ScenePassRecorder {
                assets: &self.assets,
                settings: &self.settings,
                cache: &mut self.pipeline_cache,
                scene_set: &context.scene_set,
                draws: &context.draws,
                cascade_count: current.cascade_count,
                exposure: current.exposure,
                environment_blur: current.environment_blur,
                environment_rotation: current.environment_rotation,
            };
            self.graph.execute(&cmd, frame_index, &mut recorder)?;
        }
        self.record_overlay(&cmd, &current)?;
        cmd.end_recording()?;

        let queue = self.device.primary_queue();
        queue.submit(&cmd, &current.target)?;
        queue.present(&current.target)?;

        // Publish the sampleable image the host UI should show next; the
        // just-rendered frame's image may still be in flight.
        let next = (frame_index + 1) % self.graph.frames_in_flight();
        self.viewport_slot = self.graph.output_descriptor_set(next);
        Ok(())
    }

    /// Applies new settings, rebuilding only what the changed fields
    /// require.
    pub fn set_renderer_settings(
        &mut self,
        new_settings: RendererSettings,
    ) -> Result<(), RenderError> {
        if new_settings == self.settings {
            return Ok(());
        }
        let old = self.settings.clone();

        let vsync_changed = new_settings.vsync_enabled != old.vsync_enabled;
        if vsync_changed {
            self.device.wait_idle();
            self.device.swapchain().set_vsync(new_settings.vsync_enabled)?;
        }

        let overlay_present = self.overlay.is_some();
        let old_rebinding = Self::debug_output_rebinding(overlay_present, &old);
        let new_rebinding = Self::debug_output_rebinding(overlay_present, &new_settings);
        let rebuild = new_settings.renderer_type != old.renderer_type
            || new_settings.shadow_cascade_count != old.shadow_cascade_count
            || new_settings.shadow_map_resolution != old.shadow_map_resolution
            || old_rebinding != new_rebinding
            || (vsync_changed && self.overlay.is_none());

        if new_settings.debug_view.is_gbuffer_view() && self.overlay.is_none() {
            log::warn!(
                "G-buffer debug views need offscreen output; '{}' ignored",
                new_settings.debug_view
            );
        }

        self.settings = new_settings;
        if rebuild {
            self.device.wait_idle();
            self.rebuild_graph()?;
        }
        if vsync_changed && self.overlay.is_some() {
            self.create_window_pass()?;
        }
        Ok(())
    }

    /// Resizes the viewport: recreates the swapchain and the graph's
    /// viewport-sized resources without rebuilding the topology.
    pub fn resize_viewport(&mut self, dimensions: UVec2) -> Result<(), RenderError> {
        if dimensions == self.viewport_dimensions || dimensions.x == 0 || dimensions.y == 0 {
            return Ok(());
        }
        self.device.wait_idle();
        let swapchain = self.device.swapchain();
        swapchain.recreate(dimensions)?;

        let window_targets = if self.overlay.is_none() {
            Some(swapchain.render_targets())
        } else {
            None
        };
        self.graph.resize_resources(dimensions, window_targets)?;
        if self.overlay.is_some() {
            self.create_window_pass()?;
        }
        self.viewport_dimensions = dimensions;
        self.viewport_slot = None;
        log::info!("Viewport resized to {}x{}", dimensions.x, dimensions.y);
        Ok(())
    }

    /// Installs a host-UI overlay. The graph switches to offscreen output,
    /// sampled by the overlay and composed into the window.
    pub fn set_overlay_hook(&mut self, hook: OverlayHook) -> Result<(), RenderError> {
        self.device.wait_idle();
        self.overlay = Some(hook);
        self.create_window_pass()?;
        self.rebuild_graph()?;
        Ok(())
    }

    /// The descriptor set sampling the most recently finished scene image,
    /// if the renderer outputs offscreen. Rotates each `end_scene`.
    pub fn viewport_texture(&self) -> Option<DescriptorSetHandle> {
        self.viewport_slot.clone()
    }

    /// The active settings.
    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    /// Current viewport dimensions.
    pub fn viewport_dimensions(&self) -> UVec2 {
        self.viewport_dimensions
    }

    /// The pass names in the order the graph executes them.
    pub fn pass_execution_order(&self) -> Vec<&str> {
        self.graph.execution_order()
    }

    /// The pipeline cache, for inspection.
    pub fn pipeline_cache(&self) -> &PipelineStateCache {
        &self.pipeline_cache
    }

    /// One frame's light storage buffer, for inspection.
    pub fn lights_buffer(&self, frame_index: u32) -> BufferHandle {
        self.contexts[frame_index as usize].lights_buffer.clone()
    }

    /// One frame's scene data descriptor set, for inspection.
    pub fn scene_descriptor_set(&self, frame_index: u32) -> DescriptorSetHandle {
        self.contexts[frame_index as usize].scene_set.clone()
    }

    fn bind_environment(
        &mut self,
        scene: &SceneDescription<'_>,
        frame_index: u32,
    ) -> Result<(), RenderError> {
        let context = &self.contexts[frame_index as usize];
        match &scene.environment_map {
            Some(environment) => {
                ibl::compute_environment_ibl(
                    &self.device,
                    &mut self.pipeline_cache,
                    &self.assets,
                    environment,
                )?;
                let context = &self.contexts[frame_index as usize];
                let irradiance = environment
                    .irradiance
                    .read()
                    .ok()
                    .and_then(|guard| guard.clone());
                let prefiltered = environment
                    .prefiltered
                    .read()
                    .ok()
                    .and_then(|guard| guard.clone());
                if let (Some(irradiance), Some(prefiltered)) = (irradiance, prefiltered) {
                    context.scene_set.update_image_sampler_binding(
                        IRRADIANCE_BINDING,
                        &irradiance,
                        ImageLayout::ShaderReadOnly,
                    )?;
                    context.scene_set.update_image_sampler_binding(
                        PREFILTERED_BINDING,
                        &prefiltered,
                        ImageLayout::ShaderReadOnly,
                    )?;
                }
                context.scene_set.update_image_sampler_binding(
                    ENVIRONMENT_BINDING,
                    &environment.environment,
                    ImageLayout::ShaderReadOnly,
                )?;
            }
            None => {
                for binding in [IRRADIANCE_BINDING, PREFILTERED_BINDING, ENVIRONMENT_BINDING] {
                    context.scene_set.update_image_sampler_binding(
                        binding,
                        &self.assets.fallback_cubemap,
                        ImageLayout::ShaderReadOnly,
                    )?;
                }
            }
        }
        Ok(())
    }

    fn upload_lights(
        &mut self,
        scene: &SceneDescription<'_>,
        frame_index: u32,
    ) -> Result<(), RenderError> {
        let gpu_lights: Vec<GpuLight> = scene
            .lights
            .iter()
            .map(|light| GpuLight {
                position: light.position.extend(match light.light_type {
                    LightType::Point => 0.0,
                    LightType::Directional => 1.0,
                }),
                color: light.color.extend(0.0),
            })
            .collect();

        let context = &mut self.contexts[frame_index as usize];
        let needed = (gpu_lights.len() * std::mem::size_of::<GpuLight>()) as u64;
        if needed > context.lights_capacity {
            let mut capacity = context.lights_capacity;
            while capacity < needed {
                capacity *= 2;
            }
            log::debug!(
                "Growing light buffer [{frame_index}]: {} -> {capacity} bytes",
                context.lights_capacity
            );
            context.lights_buffer.reallocate(capacity)?;
            context.lights_capacity = capacity;
            context
                .scene_set
                .update_storage_buffer_binding(LIGHTS_BINDING, &context.lights_buffer)?;
        }
        if !gpu_lights.is_empty() {
            context
                .lights_buffer
                .copy_data(bytemuck::cast_slice(&gpu_lights))?;
        }
        Ok(())
    }

    fn upload_cascades(
        &mut self,
        scene: &SceneDescription<'_>,
        frame_index: u32,
    ) -> Result<cascades::CascadeData, RenderError> {
        let directional = scene
            .lights
            .iter()
            .find(|light| light.light_type == LightType::Directional);

        let cascade_data = match directional {
            Some(light) if self.settings.shadows_enabled => cascades::compute_cascades(
                scene.camera,
                light.position,
                self.settings.shadow_cascade_count,
                self.settings.shadow_map_resolution,
                self.settings.shadow_z_multiplier,
            ),
            _ => cascades::CascadeData::default(),
        };

        let mut matrices = [Mat4::IDENTITY; MAX_SHADOW_CASCADES as usize];
        for (slot, matrix) in matrices.iter_mut().zip(&cascade_data.light_matrices) {
            *slot = *matrix;
        }
        let bytes: Vec<u8> = matrices
            .iter()
            .flat_map(|matrix| bytemuck::bytes_of(matrix).to_vec())
            .collect();
        self.contexts[frame_index as usize]
            .shadow_matrix_buffer
            .copy_data(&bytes)?;
        Ok(cascade_data)
    }

    fn upload_scene_uniforms(
        &mut self,
        scene: &SceneDescription<'_>,
        cascade_data: &cascades::CascadeData,
        frame_index: u32,
    ) -> Result<(), RenderError> {
        let camera = scene.camera;
        let view = camera.view_matrix();
        let projection = camera.projection_matrix();
        let view_projection = projection * view;

        let mut splits = [Vec4::ZERO; 2];
        for (index, &z_far) in cascade_data
            .z_fars
            .iter()
            .take(MAX_SHADOW_CASCADES as usize)
            .enumerate()
        {
            splits[index / 4][index % 4] = z_far;
        }

        let mut flags = 0;
        if self.settings.debug_view == DebugView::CascadeBoundaries {
            flags |= SCENE_FLAG_SHOW_CASCADES;
        }
        if cascade_data.light_matrices.is_empty() {
            flags |= SCENE_FLAG_SHADOWS_OFF;
        }

        let uniforms = SceneUniforms {
            view,
            projection,
            view_projection,
            inverse_view_projection: view_projection.inverse(),
            camera_position: camera.position().extend(1.0),
            cascade_splits: splits,
            lighting_params: Vec4::new(
                scene.ambient_light_constant,
                self.settings.shadow_map_bias,
                self.settings.shadow_z_multiplier,
                scene.environment_blur,
            ),
            counts: UVec4::new(
                scene.lights.len() as u32,
                cascade_data.light_matrices.len() as u32,
                flags,
                self.settings.shadow_map_resolution,
            ),
        };
        self.contexts[frame_index as usize]
            .scene_uniform_buffer
            .copy_data(bytemuck::bytes_of(&uniforms))?;
        Ok(())
    }

    fn record_overlay(
        &mut self,
        cmd: &CommandBufferHandle,
        current: &CurrentFrame,
    ) -> Result<(), RenderError> {
        let (Some(window), Some(hook)) = (self.window_pass.as_ref(), self.overlay.as_mut()) else {
            return Ok(());
        };
        let Some(output_texture) = self.graph.output_texture(current.frame_index) else {
            return Ok(());
        };
        let Some(viewport_set) = self.graph.output_descriptor_set(current.frame_index) else {
            return Ok(());
        };

        // Make the finished scene image sampleable by the overlay.
        let old_layout = output_texture.current_layout();
        if old_layout != ImageLayout::ShaderReadOnly {
            output_texture.set_current_layout(ImageLayout::ShaderReadOnly);
            cmd.pipeline_barrier(&PipelineBarrier {
                src_stage: PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                dst_stage: PipelineStageFlags::FRAGMENT_SHADER,
                image_barriers: vec![ImageMemoryBarrier {
                    texture: output_texture,
                    old_layout,
                    new_layout: ImageLayout::ShaderReadOnly,
                    src_access: AccessFlags::COLOR_ATTACHMENT_WRITE,
                    dst_access: AccessFlags::SHADER_READ,
                }],
            });
        }

        let dimensions = current.target.dimensions();
        let framebuffer = &window.framebuffers[current.frame_index as usize];
        cmd.begin_label("Overlay", Vec4::new(0.9, 0.4, 0.1, 1.0));
        cmd.begin_render_pass(&window.render_pass, framebuffer);
        cmd.set_viewport_and_scissor(dimensions);
        hook(&OverlayContext {
            command_buffer: cmd,
            render_pass: &window.render_pass,
            framebuffer,
            dimensions,
            viewport_input: &viewport_set,
        });
        cmd.end_render_pass();
        cmd.end_label();
        Ok(())
    }

    /// Builds the window render pass and per-image framebuffers the overlay
    /// records into.
    fn create_window_pass(&mut self) -> Result<(), RenderError> {
        let swapchain = self.device.swapchain();
        let render_pass = self.device.create_render_pass("Window Pass");
        render_pass.begin_building();
        let index = render_pass.define_attachment(&AttachmentDescription {
            format: swapchain.format(),
            initial_layout: ImageLayout::Undefined,
            final_layout: ImageLayout::Present,
            load_op: AttachmentLoadOp::Clear,
            store_op: AttachmentStoreOp::Store,
            clear_value: ClearValue::Color([0.0, 0.0, 0.0, 1.0]),
            sample_count: MsaaSampleCount::One,
        });
        render_pass.begin_subpass();
        render_pass.add_color_attachment(index, ImageLayout::ColorAttachment);
        render_pass.end_subpass();
        render_pass.end_building()?;

        let mut framebuffers = Vec::new();
        for target in swapchain.render_targets() {
            let framebuffer = self
                .device
                .create_framebuffer(&render_pass, "Window Framebuffer");
            framebuffer.begin_building(target.dimensions());
            framebuffer.attach_render_target(&target);
            framebuffer.end_building()?;
            framebuffers.push(framebuffer);
        }
        self.window_pass = Some(WindowPassResources {
            render_pass,
            framebuffers,
        });
        Ok(())
    }

    /// The pass/attachment the output should present, when a diagnostic
    /// view rebinds it away from the default output.
    fn debug_output_rebinding(
        overlay_present: bool,
        settings: &RendererSettings,
    ) -> Option<(&'static str, &'static str)> {
        if !overlay_present || settings.renderer_type != RendererType::Deferred {
            return None;
        }
        match settings.debug_view {
            DebugView::GBufferAlbedo => Some((GEOMETRY_PASS, "Albedo")),
            DebugView::GBufferRoughness => Some((GEOMETRY_PASS, "Roughness")),
            DebugView::GBufferMetallic => Some((GEOMETRY_PASS, "Metallic")),
            DebugView::GBufferEmission => Some((GEOMETRY_PASS, "Emission")),
            DebugView::GBufferNormal => Some((GEOMETRY_PASS, "Normals")),
            DebugView::SceneDepth => Some((GEOMETRY_PASS, "Depth")),
            _ => None,
        }
    }

    fn rebuild_graph(&mut self) -> Result<(), RenderError> {
        let swapchain = self.device.swapchain();
        let output_binding = if self.overlay.is_some() {
            OutputBinding::Offscreen
        } else {
            OutputBinding::Window(swapchain.render_targets())
        };
        let output_format = swapchain.format();
        let frames = swapchain.image_count();

        self.graph
            .begin_building(self.viewport_dimensions, frames, output_binding);
        match self.settings.renderer_type {
            RendererType::Deferred => self.declare_deferred_passes(output_format)?,
            RendererType::Forward => self.declare_forward_passes(output_format)?,
        }
        if let Some((pass, attachment)) =
            Self::debug_output_rebinding(self.overlay.is_some(), &self.settings)
        {
            self.graph.set_output_attachment(pass, attachment)?;
        }
        self.graph.end_building()?;
        self.viewport_slot = None;
        Ok(())
    }

    fn shadow_pass(&self) -> RenderGraphPass<ScenePass> {
        let resolution = self.settings.shadow_map_resolution.max(1);
        let mut pass = RenderGraphPass::new(
            ScenePass::CascadedShadows,
            SHADOW_PASS,
            PassDimensions::Fixed(UVec2::splat(resolution)),
        );
        pass.create_layered_depth_stencil_attachment(
            SHADOW_MAP,
            depth_attachment(ImageFormat::D32FloatS8Uint),
            self.settings.shadow_cascade_count.max(1),
        );
        pass
    }

    fn declare_deferred_passes(&mut self, output_format: ImageFormat) -> Result<(), RenderError> {
        self.graph.add_pass(self.shadow_pass())?;

        let mut geometry =
            RenderGraphPass::new(ScenePass::GBuffer, GEOMETRY_PASS, PassDimensions::Viewport);
        geometry
            .create_color_attachment(
                "Albedo",
                color_attachment(ImageFormat::Rgba8Unorm, [0.0, 0.0, 0.0, 1.0]),
            )
            .create_color_attachment(
                "Metallic",
                color_attachment(ImageFormat::R8Unorm, [0.0; 4]),
            )
            .create_color_attachment(
                "Roughness",
                color_attachment(ImageFormat::R8Unorm, [1.0; 4]),
            )
            .create_color_attachment(
                "Emission",
                color_attachment(ImageFormat::Rgba8Unorm, [0.0, 0.0, 0.0, 1.0]),
            )
            .create_color_attachment(
                "Normals",
                color_attachment(ImageFormat::Rgba8Unorm, [0.5, 0.5, 1.0, 1.0]),
            )
            .create_depth_stencil_attachment(
                "Depth",
                depth_attachment(ImageFormat::D32FloatS8Uint),
            );
        self.graph.add_pass(geometry)?;

        let mut lighting = RenderGraphPass::new(
            ScenePass::DeferredLighting,
            LIGHTING_PASS,
            PassDimensions::Viewport,
        );
        lighting.create_color_attachment(
            "Lighting",
            color_attachment(ImageFormat::Rgba16Float, [0.0, 0.0, 0.0, 1.0]),
        );
        for attachment in ["Albedo", "Metallic", "Roughness", "Emission", "Normals", "Depth"] {
            lighting.link_read_input(GEOMETRY_PASS, attachment, ImageLayout::ShaderReadOnly);
        }
        lighting.link_read_input(SHADOW_PASS, SHADOW_MAP, ImageLayout::ShaderReadOnly);
        self.graph.add_pass(lighting)?;

        let mut environment = RenderGraphPass::new(
            ScenePass::Environment {
                sample_count: MsaaSampleCount::One,
            },
            ENVIRONMENT_PASS,
            PassDimensions::Viewport,
        );
        environment
            .link_write_input(LIGHTING_PASS, "Lighting")
            .link_write_input(GEOMETRY_PASS, "Depth");
        self.graph.add_pass(environment)?;

        let mut tone_mapping = RenderGraphPass::new(
            ScenePass::ToneMapping,
            TONE_MAPPING_PASS,
            PassDimensions::Viewport,
        );
        tone_mapping
            .create_color_attachment(
                "Tone Mapped",
                color_attachment(ImageFormat::Rgba8Unorm, [0.0, 0.0, 0.0, 1.0]),
            )
            .link_read_input(LIGHTING_PASS, "Lighting", ImageLayout::ShaderReadOnly)
            .add_dependency(ENVIRONMENT_PASS);
        self.graph.add_pass(tone_mapping)?;

        let mut fxaa = RenderGraphPass::new(ScenePass::Fxaa, FXAA_PASS, PassDimensions::Viewport);
        fxaa.create_color_attachment(
            "Output",
            color_attachment(output_format, [0.0, 0.0, 0.0, 1.0]),
        )
        .link_read_input(TONE_MAPPING_PASS, "Tone Mapped", ImageLayout::ShaderReadOnly);
        self.graph.add_output_pass(fxaa)?;
        self.graph.set_output_attachment(FXAA_PASS, "Output")?;
        Ok(())
    }

    fn declare_forward_passes(&mut self, output_format: ImageFormat) -> Result<(), RenderError> {
        self.graph.add_pass(self.shadow_pass())?;

        let mut depth_pre = RenderGraphPass::new(
            ScenePass::DepthPrePass,
            DEPTH_PRE_PASS,
            PassDimensions::Viewport,
        );
        let mut msaa_depth = depth_attachment(ImageFormat::D32FloatS8Uint);
        msaa_depth.sample_count = MsaaSampleCount::Four;
        depth_pre.create_depth_stencil_attachment("Depth", msaa_depth);
        self.graph.add_pass(depth_pre)?;

        let mut lighting = RenderGraphPass::new(
            ScenePass::ForwardLighting,
            LIGHTING_PASS,
            PassDimensions::Viewport,
        );
        let mut msaa_lighting =
            color_attachment(ImageFormat::Rgba16Float, [0.0, 0.0, 0.0, 1.0]);
        msaa_lighting.sample_count = MsaaSampleCount::Four;
        lighting
            .create_color_attachment("Lighting", msaa_lighting)
            .link_write_input(DEPTH_PRE_PASS, "Depth")
            .link_read_input(SHADOW_PASS, SHADOW_MAP, ImageLayout::ShaderReadOnly);
        self.graph.add_pass(lighting)?;

        let mut environment = RenderGraphPass::new(
            ScenePass::Environment {
                sample_count: MsaaSampleCount::Four,
            },
            ENVIRONMENT_PASS,
            PassDimensions::Viewport,
        );
        environment
            .create_resolve_attachment(
                "Resolved Lighting",
                color_attachment(ImageFormat::Rgba16Float, [0.0, 0.0, 0.0, 1.0]),
            )
            .link_write_input(LIGHTING_PASS, "Lighting")
            .link_write_input(DEPTH_PRE_PASS, "Depth");
        self.graph.add_pass(environment)?;

        let mut tone_mapping = RenderGraphPass::new(
            ScenePass::ToneMapping,
            TONE_MAPPING_PASS,
            PassDimensions::Viewport,
        );
        tone_mapping
            .create_color_attachment(
                "Output",
                color_attachment(output_format, [0.0, 0.0, 0.0, 1.0]),
            )
            .link_read_input(
                ENVIRONMENT_PASS,
                "Resolved Lighting",
                ImageLayout::ShaderReadOnly,
            );
        self.graph.add_output_pass(tone_mapping)?;
        self.graph.set_output_attachment(TONE_MAPPING_PASS, "Output")?;
        Ok(())
    }
}

impl std::fmt::Debug for SceneRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneRenderer")
            .field("settings", &self.settings)
            .field("viewport", &self.viewport_dimensions)
            .field("frames", &self.contexts.len())
            .finish()
    }
}
