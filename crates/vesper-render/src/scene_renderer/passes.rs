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

//! Pass bodies: translates each graph pass kind into pipeline requests and
//! draw commands for the current frame's submissions.

use glam::{Mat4, Vec4};

use vesper_core::error::RenderError;
use vesper_core::rhi::{
    CommandBuffer as _, CullMode, DescriptorSet as _, DescriptorSetHandle,
    GraphicsPipelineDescriptor, MsaaSampleCount, ShaderHandle,
};
use vesper_core::scene::{ShaderModel, TextureConvention};
use vesper_core::{Material, Mesh, RendererSettings};

use crate::graph::{PassContext, PassExecutor};
use crate::pipeline_cache::PipelineStateCache;
use crate::scene_renderer::gpu_types::{
    DepthPushConstants, EnvironmentPushConstants, ObjectPushConstants, PostProcessPushConstants,
};
use crate::scene_renderer::{RendererAssets, ScenePass};
use vesper_core::DebugView;

/// One culled, submitted draw for the current frame.
#[derive(Debug, Clone)]
pub(crate) struct DrawCommand {
    pub mesh: Mesh,
    pub material: Material,
    pub push: ObjectPushConstants,
}

/// Records pass bodies for one frame. Borrows the renderer's pipeline cache
/// mutably; everything else is read-only frame state.
pub(crate) struct ScenePassRecorder<'a> {
    pub assets: &'a RendererAssets,
    pub settings: &'a RendererSettings,
    pub cache: &'a mut PipelineStateCache,
    pub scene_set: &'a DescriptorSetHandle,
    pub draws: &'a [DrawCommand],
    pub cascade_count: u32,
    pub exposure: f32,
    pub environment_blur: f32,
    pub environment_rotation: Mat4,
}

impl PassExecutor<ScenePass> for ScenePassRecorder<'_> {
    fn execute_pass(&mut self, kind: &ScenePass, ctx: &PassContext<'_>) -> Result<(), RenderError> {
        match kind {
            ScenePass::GBuffer => self.record_geometry(ctx),
            ScenePass::DepthPrePass => self.record_depth_pre_pass(ctx),
            ScenePass::CascadedShadows => self.record_shadows(ctx),
            ScenePass::DeferredLighting => self.record_deferred_lighting(ctx),
            ScenePass::ForwardLighting => self.record_forward_lighting(ctx),
            ScenePass::Environment { sample_count } => self.record_environment(ctx, *sample_count),
            ScenePass::ToneMapping => self.record_tone_mapping(ctx),
            ScenePass::Fxaa => self.record_fxaa(ctx),
        }
    }
}

impl ScenePassRecorder<'_> {
    fn geometry_fragment_shader(&self, material: &Material) -> ShaderHandle {
        match material.texture_convention {
            TextureConvention::Unpacked => self.assets.deferred_geometry_unpacked_shader.clone(),
            TextureConvention::OrmPacked => self.assets.deferred_geometry_orm_shader.clone(),
        }
    }

    fn forward_fragment_shader(&self, material: &Material) -> ShaderHandle {
        match material.texture_convention {
            TextureConvention::Unpacked => self.assets.forward_unpacked_shader.clone(),
            TextureConvention::OrmPacked => self.assets.forward_orm_shader.clone(),
        }
    }

    fn record_geometry(&mut self, ctx: &PassContext<'_>) -> Result<(), RenderError> {
        for draw in self.draws {
            if draw.material.shader_model != ShaderModel::Pbr {
                continue;
            }
            let fragment = self.geometry_fragment_shader(&draw.material);
            let pipeline = self.cache.get_graphics_pipeline(&GraphicsPipelineDescriptor {
                label: "Deferred Geometry".to_string(),
                render_pass: ctx.render_pass.clone(),
                subpass_index: 0,
                vertex_shader: draw.mesh.vertex_shader.clone(),
                fragment_shader: Some(fragment),
                descriptor_set_layouts: vec![
                    self.scene_set.layout(),
                    draw.material.descriptor_set.layout(),
                ],
                vertex_buffer_layout: draw.mesh.vertex_layout.clone(),
                cull_mode: CullMode::Back,
                sample_count: MsaaSampleCount::One,
                alpha_blended: draw.material.is_alpha_blended,
                push_constant_size: std::mem::size_of::<ObjectPushConstants>() as u32,
            })?;

            let cmd = ctx.command_buffer;
            cmd.bind_pipeline(&pipeline);
            cmd.bind_descriptor_set(self.scene_set, 0);
            cmd.bind_descriptor_set(&draw.material.descriptor_set, 1);
            cmd.bind_vertex_buffer(&draw.mesh.vertex_buffer);
            cmd.bind_index_buffer(&draw.mesh.index_buffer);
            cmd.push_constants(bytemuck::bytes_of(&draw.push));
            cmd.draw_indexed(draw.mesh.index_count);
        }
        Ok(())
    }

    fn record_depth_pre_pass(&mut self, ctx: &PassContext<'_>) -> Result<(), RenderError> {
        for draw in self.draws {
            if draw.material.shader_model != ShaderModel::Pbr {
                continue;
            }
            let pipeline = self.cache.get_graphics_pipeline(&GraphicsPipelineDescriptor {
                label: "Depth Pre-Pass".to_string(),
                render_pass: ctx.render_pass.clone(),
                subpass_index: 0,
                vertex_shader: self.assets.depth_only_vertex_shader.clone(),
                fragment_shader: None,
                descriptor_set_layouts: vec![self.scene_set.layout()],
                vertex_buffer_layout: draw.mesh.vertex_layout.clone(),
                cull_mode: CullMode::None,
                sample_count: MsaaSampleCount::Four,
                alpha_blended: false,
                push_constant_size: std::mem::size_of::<DepthPushConstants>() as u32,
            })?;

            let push = DepthPushConstants {
                model: draw.push.model,
            };
            let cmd = ctx.command_buffer;
            cmd.bind_pipeline(&pipeline);
            cmd.bind_descriptor_set(self.scene_set, 0);
            cmd.bind_vertex_buffer(&draw.mesh.vertex_buffer);
            cmd.bind_index_buffer(&draw.mesh.index_buffer);
            cmd.push_constants(bytemuck::bytes_of(&push));
            cmd.draw_indexed(draw.mesh.index_count);
        }
        Ok(())
    }

    /// Depth-only, one instance per cascade; the vertex shader selects the
    /// cascade matrix and target layer from the instance index. Front faces
    /// are culled to push acne toward surfaces facing away from the light.
    fn record_shadows(&mut self, ctx: &PassContext<'_>) -> Result<(), RenderError> {
        // Zero cascades when shadows are off or the scene has no
        // directional light.
        if self.cascade_count == 0 {
            return Ok(());
        }
        for draw in self.draws {
            if draw.material.shader_model != ShaderModel::Pbr {
                continue;
            }
            let pipeline = self.cache.get_graphics_pipeline(&GraphicsPipelineDescriptor {
                label: "Cascaded Shadows".to_string(),
                render_pass: ctx.render_pass.clone(),
                subpass_index: 0,
                vertex_shader: self.assets.shadow_vertex_shader.clone(),
                fragment_shader: None,
                descriptor_set_layouts: vec![self.scene_set.layout()],
                vertex_buffer_layout: draw.mesh.vertex_layout.clone(),
                cull_mode: CullMode::Front,
                sample_count: MsaaSampleCount::One,
                alpha_blended: false,
                push_constant_size: std::mem::size_of::<DepthPushConstants>() as u32,
            })?;

            let push = DepthPushConstants {
                model: draw.push.model,
            };
            let cmd = ctx.command_buffer;
            cmd.bind_pipeline(&pipeline);
            cmd.bind_descriptor_set(self.scene_set, 0);
            cmd.bind_vertex_buffer(&draw.mesh.vertex_buffer);
            cmd.bind_index_buffer(&draw.mesh.index_buffer);
            cmd.push_constants(bytemuck::bytes_of(&push));
            cmd.draw_indexed_instanced(draw.mesh.index_count, self.cascade_count);
        }
        Ok(())
    }

    fn record_deferred_lighting(&mut self, ctx: &PassContext<'_>) -> Result<(), RenderError> {
        let read_set = required_read_inputs(ctx)?;
        let pipeline = self.cache.get_graphics_pipeline(&GraphicsPipelineDescriptor {
            label: "Deferred Lighting".to_string(),
            render_pass: ctx.render_pass.clone(),
            subpass_index: 0,
            vertex_shader: self.assets.fullscreen_vertex_shader.clone(),
            fragment_shader: Some(self.assets.deferred_lighting_shader.clone()),
            descriptor_set_layouts: vec![self.scene_set.layout(), read_set.layout()],
            vertex_buffer_layout: self.assets.quad_mesh.vertex_layout.clone(),
            cull_mode: CullMode::None,
            sample_count: MsaaSampleCount::One,
            alpha_blended: false,
            push_constant_size: 0,
        })?;

        let cmd = ctx.command_buffer;
        cmd.bind_pipeline(&pipeline);
        cmd.bind_descriptor_set(self.scene_set, 0);
        cmd.bind_descriptor_set(read_set, 1);
        cmd.bind_vertex_buffer(&self.assets.quad_mesh.vertex_buffer);
        cmd.bind_index_buffer(&self.assets.quad_mesh.index_buffer);
        cmd.draw_indexed(self.assets.quad_mesh.index_count);
        Ok(())
    }

    fn record_forward_lighting(&mut self, ctx: &PassContext<'_>) -> Result<(), RenderError> {
        let read_set = required_read_inputs(ctx)?;
        for draw in self.draws {
            if draw.material.shader_model != ShaderModel::Pbr {
                continue;
            }
            let fragment = self.forward_fragment_shader(&draw.material);
            let pipeline = self.cache.get_graphics_pipeline(&GraphicsPipelineDescriptor {
                label: "Forward Lighting".to_string(),
                render_pass: ctx.render_pass.clone(),
                subpass_index: 0,
                vertex_shader: draw.mesh.vertex_shader.clone(),
                fragment_shader: Some(fragment),
                descriptor_set_layouts: vec![
                    self.scene_set.layout(),
                    draw.material.descriptor_set.layout(),
                    read_set.layout(),
                ],
                vertex_buffer_layout: draw.mesh.vertex_layout.clone(),
                cull_mode: CullMode::Back,
                sample_count: MsaaSampleCount::Four,
                alpha_blended: draw.material.is_alpha_blended,
                push_constant_size: std::mem::size_of::<ObjectPushConstants>() as u32,
            })?;

            let cmd = ctx.command_buffer;
            cmd.bind_pipeline(&pipeline);
            cmd.bind_descriptor_set(self.scene_set, 0);
            cmd.bind_descriptor_set(&draw.material.descriptor_set, 1);
            cmd.bind_descriptor_set(read_set, 2);
            cmd.bind_vertex_buffer(&draw.mesh.vertex_buffer);
            cmd.bind_index_buffer(&draw.mesh.index_buffer);
            cmd.push_constants(bytemuck::bytes_of(&draw.push));
            cmd.draw_indexed(draw.mesh.index_count);
        }
        Ok(())
    }

    fn record_environment(
        &mut self,
        ctx: &PassContext<'_>,
        sample_count: MsaaSampleCount,
    ) -> Result<(), RenderError> {
        let pipeline = self.cache.get_graphics_pipeline(&GraphicsPipelineDescriptor {
            label: "Environment Backdrop".to_string(),
            render_pass: ctx.render_pass.clone(),
            subpass_index: 0,
            vertex_shader: self.assets.cubemap_vertex_shader.clone(),
            fragment_shader: Some(self.assets.environment_shader.clone()),
            descriptor_set_layouts: vec![self.scene_set.layout()],
            vertex_buffer_layout: self.assets.cube_mesh.vertex_layout.clone(),
            cull_mode: CullMode::None,
            sample_count,
            alpha_blended: false,
            push_constant_size: std::mem::size_of::<EnvironmentPushConstants>() as u32,
        })?;

        let push = EnvironmentPushConstants {
            rotation_view_projection: self.environment_rotation,
            params: Vec4::new(self.environment_blur, 0.0, 0.0, 0.0),
        };
        let cmd = ctx.command_buffer;
        cmd.bind_pipeline(&pipeline);
        cmd.bind_descriptor_set(self.scene_set, 0);
        cmd.bind_vertex_buffer(&self.assets.cube_mesh.vertex_buffer);
        cmd.bind_index_buffer(&self.assets.cube_mesh.index_buffer);
        cmd.push_constants(bytemuck::bytes_of(&push));
        cmd.draw_indexed(self.assets.cube_mesh.index_count);
        Ok(())
    }

    fn record_tone_mapping(&mut self, ctx: &PassContext<'_>) -> Result<(), RenderError> {
        let operator = match self.settings.debug_view {
            DebugView::ToneMappingOff => 1.0,
            DebugView::ToneMappingReinhard => 2.0,
            _ => 0.0,
        };
        let push = PostProcessPushConstants {
            params: Vec4::new(self.exposure, operator, 0.0, 0.0),
        };
        self.draw_fullscreen(ctx, &self.assets.tone_mapping_shader.clone(), &push)
    }

    fn record_fxaa(&mut self, ctx: &PassContext<'_>) -> Result<(), RenderError> {
        let push = PostProcessPushConstants {
            params: Vec4::new(
                1.0 / ctx.dimensions.x.max(1) as f32,
                1.0 / ctx.dimensions.y.max(1) as f32,
                0.0,
                0.0,
            ),
        };
        self.draw_fullscreen(ctx, &self.assets.fxaa_shader.clone(), &push)
    }

    fn draw_fullscreen(
        &mut self,
        ctx: &PassContext<'_>,
        fragment: &ShaderHandle,
        push: &PostProcessPushConstants,
    ) -> Result<(), RenderError> {
        let read_set = required_read_inputs(ctx)?;
        let pipeline = self.cache.get_graphics_pipeline(&GraphicsPipelineDescriptor {
            label: "Fullscreen".to_string(),
            render_pass: ctx.render_pass.clone(),
            subpass_index: 0,
            vertex_shader: self.assets.fullscreen_vertex_shader.clone(),
            fragment_shader: Some(fragment.clone()),
            descriptor_set_layouts: vec![self.scene_set.layout(), read_set.layout()],
            vertex_buffer_layout: self.assets.quad_mesh.vertex_layout.clone(),
            cull_mode: CullMode::None,
            sample_count: MsaaSampleCount::One,
            alpha_blended: false,
            push_constant_size: std::mem::size_of::<PostProcessPushConstants>() as u32,
        })?;

        let cmd = ctx.command_buffer;
        cmd.bind_pipeline(&pipeline);
        cmd.bind_descriptor_set(self.scene_set, 0);
        cmd.bind_descriptor_set(read_set, 1);
        cmd.bind_vertex_buffer(&self.assets.quad_mesh.vertex_buffer);
        cmd.bind_index_buffer(&self.assets.quad_mesh.index_buffer);
        cmd.push_constants(bytemuck::bytes_of(push));
        cmd.draw_indexed(self.assets.quad_mesh.index_count);
        Ok(())
    }
}

fn required_read_inputs<'a>(ctx: &'a PassContext<'_>) -> Result<&'a DescriptorSetHandle, RenderError> {
    ctx.read_inputs.ok_or_else(|| {
        RenderError::CommandSubmissionFailed(
            "pass requires read inputs but the graph linked none".to_string(),
        )
    })
}
