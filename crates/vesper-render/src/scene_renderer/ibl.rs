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

//! Image-based lighting precomputation: cosine-convolved irradiance and
//! roughness-prefiltered specular cubemaps, derived from a scene's
//! environment map with blocking one-time compute submissions.

use std::sync::Arc;

use glam::{UVec2, Vec4};

use vesper_core::error::{RenderError, ResourceError};
use vesper_core::rhi::{
    AccessFlags, CommandBuffer as _, DescriptorSet as _, GraphicsDevice, ImageFormat, ImageLayout,
    ImageMemoryBarrier, ImageUsageFlags, MsaaSampleCount, PipelineBarrier, PipelineStageFlags,
    SamplerFilter, ShaderStageFlags, Texture as _, TextureDescriptor, TextureHandle, TextureType,
};
use vesper_core::EnvironmentMap;

use crate::pipeline_cache::PipelineStateCache;
use crate::scene_renderer::gpu_types::PrefilterPushConstants;
use crate::scene_renderer::RendererAssets;

/// Side length of the irradiance cubemap faces.
const IRRADIANCE_SIZE: u32 = 64;
/// Work group side length of the irradiance compute shader.
const IRRADIANCE_GROUP_SIZE: u32 = 8;
/// Side length of the prefiltered cubemap's top mip.
const PREFILTERED_SIZE: u32 = 128;
/// Mip chain length of the prefiltered cubemap (128 down to 4).
pub(crate) const PREFILTERED_MIP_COUNT: u32 = 6;
/// Work group side length of the prefilter compute shader.
const PREFILTER_GROUP_SIZE: u32 = 32;

/// Computes the irradiance and prefiltered cubemaps of `environment` if they
/// are not present yet. Blocks until the GPU work completes; meant for the
/// first frame a new environment is submitted.
pub(crate) fn compute_environment_ibl(
    device: &Arc<dyn GraphicsDevice>,
    cache: &mut PipelineStateCache,
    assets: &RendererAssets,
    environment: &EnvironmentMap,
) -> Result<(), RenderError> {
    {
        let irradiance = environment
            .irradiance
            .read()
            .map_err(|_| poisoned("irradiance"))?;
        if irradiance.is_some() {
            return Ok(());
        }
    }
    log::info!("Computing image-based lighting for a new environment map");

    let irradiance = device.create_cubemap(&TextureDescriptor {
        label: "Irradiance Map".to_string(),
        texture_type: TextureType::Cubemap,
        format: ImageFormat::Rgba16Float,
        dimensions: UVec2::splat(IRRADIANCE_SIZE),
        layer_count: 6,
        mip_count: 1,
        sample_count: MsaaSampleCount::One,
        usage: ImageUsageFlags::STORAGE | ImageUsageFlags::SAMPLED,
        filter: SamplerFilter::Linear,
    })?;
    let prefiltered = device.create_cubemap(&TextureDescriptor {
        label: "Prefiltered Environment Map".to_string(),
        texture_type: TextureType::Cubemap,
        format: ImageFormat::Rgba16Float,
        dimensions: UVec2::splat(PREFILTERED_SIZE),
        layer_count: 6,
        mip_count: PREFILTERED_MIP_COUNT,
        sample_count: MsaaSampleCount::One,
        usage: ImageUsageFlags::STORAGE | ImageUsageFlags::SAMPLED,
        filter: SamplerFilter::Linear,
    })?;

    let irradiance_set = device.create_descriptor_set("Irradiance Compute Inputs");
    irradiance_set.begin_building();
    irradiance_set.add_image_sampler(
        &environment.environment,
        ShaderStageFlags::COMPUTE,
        ImageLayout::ShaderReadOnly,
    );
    irradiance_set.add_storage_image(&irradiance, ShaderStageFlags::COMPUTE, ImageLayout::General);
    irradiance_set.end_building()?;

    // One set per prefiltered mip; each writes a different storage mip.
    let mut prefilter_sets = Vec::with_capacity(PREFILTERED_MIP_COUNT as usize);
    for mip in 0..PREFILTERED_MIP_COUNT {
        let set = device.create_descriptor_set("Prefilter Compute Inputs");
        set.begin_building();
        set.add_image_sampler(
            &environment.environment,
            ShaderStageFlags::COMPUTE,
            ImageLayout::ShaderReadOnly,
        );
        set.add_storage_image(&prefiltered, ShaderStageFlags::COMPUTE, ImageLayout::General);
        set.end_building()?;
        set.update_storage_image_binding(1, &prefiltered, mip, ImageLayout::General)?;
        prefilter_sets.push(set);
    }

    let irradiance_pipeline = cache.get_compute_pipeline(
        "Irradiance Convolution",
        &assets.irradiance_compute_shader,
        &[irradiance_set.layout()],
        0,
    )?;
    let prefilter_pipeline = cache.get_compute_pipeline(
        "Environment Prefilter",
        &assets.prefilter_compute_shader,
        &[prefilter_sets[0].layout()],
        std::mem::size_of::<PrefilterPushConstants>() as u32,
    )?;

    device.execute_one_time_and_block(&mut |cmd| {
        prepare_layouts(cmd, &environment.environment, &irradiance, &prefiltered);

        cmd.begin_label("Irradiance Convolution", Vec4::new(0.2, 0.6, 0.9, 1.0));
        cmd.bind_pipeline(&irradiance_pipeline);
        cmd.bind_descriptor_set(&irradiance_set, 0);
        let groups = IRRADIANCE_SIZE / IRRADIANCE_GROUP_SIZE;
        cmd.dispatch(groups, groups, 6);
        cmd.end_label();

        cmd.begin_label("Environment Prefilter", Vec4::new(0.2, 0.6, 0.9, 1.0));
        cmd.bind_pipeline(&prefilter_pipeline);
        for (mip, set) in prefilter_sets.iter().enumerate() {
            let dimension = (PREFILTERED_SIZE >> mip).max(1);
            let push = PrefilterPushConstants {
                params: Vec4::new(
                    mip as f32 / PREFILTERED_MIP_COUNT as f32,
                    dimension as f32,
                    0.0,
                    0.0,
                ),
            };
            cmd.bind_descriptor_set(set, 0);
            cmd.push_constants(bytemuck::bytes_of(&push));
            let groups = (dimension / PREFILTER_GROUP_SIZE).max(1);
            cmd.dispatch(groups, groups, 6);
        }
        cmd.end_label();

        finalize_layouts(cmd, &irradiance, &prefiltered);
    })?;

    *environment
        .irradiance
        .write()
        .map_err(|_| poisoned("irradiance"))? = Some(irradiance);
    *environment
        .prefiltered
        .write()
        .map_err(|_| poisoned("prefiltered"))? = Some(prefiltered);
    Ok(())
}

/// Transitions the source map for sampling and the destination maps for
/// storage writes.
fn prepare_layouts(
    cmd: &vesper_core::rhi::CommandBufferHandle,
    environment: &TextureHandle,
    irradiance: &TextureHandle,
    prefiltered: &TextureHandle,
) {
    let mut image_barriers = Vec::new();
    if environment.current_layout() != ImageLayout::ShaderReadOnly {
        image_barriers.push(ImageMemoryBarrier {
            texture: environment.clone(),
            old_layout: environment.current_layout(),
            new_layout: ImageLayout::ShaderReadOnly,
            src_access: AccessFlags::TRANSFER_WRITE,
            dst_access: AccessFlags::SHADER_READ,
        });
        environment.set_current_layout(ImageLayout::ShaderReadOnly);
    }
    for target in [irradiance, prefiltered] {
        image_barriers.push(ImageMemoryBarrier {
            texture: target.clone(),
            old_layout: ImageLayout::Undefined,
            new_layout: ImageLayout::General,
            src_access: AccessFlags::NONE,
            dst_access: AccessFlags::SHADER_WRITE,
        });
        target.set_current_layout(ImageLayout::General);
    }
    cmd.pipeline_barrier(&PipelineBarrier {
        src_stage: PipelineStageFlags::TOP_OF_PIPE,
        dst_stage: PipelineStageFlags::COMPUTE_SHADER,
        image_barriers,
    });
}

/// Transitions the computed maps for sampling by the lighting passes.
fn finalize_layouts(
    cmd: &vesper_core::rhi::CommandBufferHandle,
    irradiance: &TextureHandle,
    prefiltered: &TextureHandle,
) {
    let image_barriers = [irradiance, prefiltered]
        .into_iter()
        .map(|target| {
            target.set_current_layout(ImageLayout::ShaderReadOnly);
            ImageMemoryBarrier {
                texture: target.clone(),
                old_layout: ImageLayout::General,
                new_layout: ImageLayout::ShaderReadOnly,
                src_access: AccessFlags::SHADER_WRITE,
                dst_access: AccessFlags::SHADER_READ,
            }
        })
        .collect();
    cmd.pipeline_barrier(&PipelineBarrier {
        src_stage: PipelineStageFlags::COMPUTE_SHADER,
        dst_stage: PipelineStageFlags::FRAGMENT_SHADER,
        image_barriers,
    });
}

fn poisoned(which: &str) -> RenderError {
    RenderError::Resource(ResourceError::BackendError(format!(
        "{which} map lock poisoned"
    )))
}
