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

//! Full frames through the scene renderer on the headless backend: recorded
//! command streams, culling, light uploads, topology switches, and the
//! overlay path.

mod common;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use glam::{Mat4, UVec2, Vec3};

use vesper_core::rhi::{
    Buffer as _, CommandBuffer as _, DescriptorSet as _, GraphicsDevice as _, Swapchain as _,
    Texture as _,
};
use vesper_core::scene::ShaderModel;
use vesper_core::{
    Camera, DebugView, EnvironmentMap, Light, LightType, RendererSettings, RendererType,
    SceneDescription,
};
use vesper_infra::{Command, HeadlessCommandBuffer, HeadlessDevice, HeadlessSwapchain};
use vesper_render::SceneRenderer;

fn scene<'a>(camera: &'a Camera, lights: &'a [Light]) -> SceneDescription<'a> {
    SceneDescription {
        camera,
        lights,
        environment_map: None,
        ambient_light_constant: 0.1,
        exposure: 1.0,
        environment_blur: 0.0,
    }
}

fn directional_light() -> Light {
    Light {
        position: Vec3::new(0.3, -1.0, 0.2),
        color: Vec3::ONE,
        light_type: LightType::Directional,
    }
}

/// Runs one full frame and returns the submitted command stream.
fn render_one_frame(
    renderer: &mut SceneRenderer,
    device: &HeadlessDevice,
    scene: &SceneDescription<'_>,
    draws: &[(vesper_core::Mesh, vesper_core::Material, Mat4)],
) -> Vec<Command> {
    renderer.begin_scene(scene).unwrap();
    for (mesh, material, transform) in draws {
        renderer.submit(mesh, material, *transform);
    }
    renderer.end_scene().unwrap();
    let submitted = device
        .headless_queue()
        .last_submission()
        .expect("a command buffer was submitted");
    submitted
        .as_any()
        .downcast_ref::<HeadlessCommandBuffer>()
        .unwrap()
        .commands()
}

fn pass_labels(commands: &[Command]) -> Vec<String> {
    commands
        .iter()
        .filter_map(|c| match c {
            Command::BeginLabel(name) => Some(name.clone()),
            _ => None,
        })
        .collect()
}

fn count_draws(commands: &[Command]) -> (usize, usize) {
    let indexed = commands
        .iter()
        .filter(|c| matches!(c, Command::DrawIndexed { .. }))
        .count();
    let instanced = commands
        .iter()
        .filter(|c| matches!(c, Command::DrawIndexedInstanced { .. }))
        .count();
    (indexed, instanced)
}

#[test]
fn deferred_frame_records_every_pass() {
    let device = common::device();
    let mut renderer = common::renderer(&device, RendererSettings::default());
    let camera = Camera::default();
    let lights = [directional_light()];

    let mesh = common::mesh(&device, "Sphere");
    let material = common::material(&device, false);
    let commands = render_one_frame(
        &mut renderer,
        &device,
        &scene(&camera, &lights),
        &[(mesh, material, Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)))],
    );

    assert_eq!(
        pass_labels(&commands),
        vec![
            "Shadow Pass",
            "Geometry Pass",
            "Lighting Pass",
            "Environment Pass",
            "Tone Mapping Pass",
            "FXAA Pass",
        ]
    );

    // One geometry draw, four fullscreen/backdrop draws, and one instanced
    // shadow draw covering all cascades.
    let (indexed, instanced) = count_draws(&commands);
    assert_eq!(indexed, 5);
    assert_eq!(instanced, 1);
    assert!(commands.contains(&Command::DrawIndexedInstanced {
        index_count: 3,
        instance_count: 3,
    }));
}

#[test]
fn empty_scene_still_renders_the_full_chain() {
    let device = common::device();
    let mut renderer = common::renderer(&device, RendererSettings::default());
    let camera = Camera::default();
    let lights = [directional_light()];

    let commands = render_one_frame(&mut renderer, &device, &scene(&camera, &lights), &[]);

    // Lighting, environment, tone mapping, FXAA; nothing from geometry or
    // shadows.
    let (indexed, instanced) = count_draws(&commands);
    assert_eq!(indexed, 4);
    assert_eq!(instanced, 0);
}

#[test]
fn end_scene_submits_and_presents_the_frame() {
    let device = common::device();
    let mut renderer = common::renderer(&device, RendererSettings::default());
    let camera = Camera::default();

    renderer.begin_scene(&scene(&camera, &[])).unwrap();
    renderer.end_scene().unwrap();

    let queue = device.headless_queue();
    assert_eq!(queue.submissions(), vec![0]);
    assert_eq!(queue.presents(), vec![0]);
}

#[test]
fn unlit_materials_are_skipped_by_the_mesh_passes() {
    let device = common::device();
    let mut renderer = common::renderer(&device, RendererSettings::default());
    let camera = Camera::default();
    let lights = [directional_light()];

    let mesh = common::mesh(&device, "Sphere");
    let mut material = common::material(&device, false);
    material.shader_model = ShaderModel::Unlit;
    let commands = render_one_frame(
        &mut renderer,
        &device,
        &scene(&camera, &lights),
        &[(mesh, material, Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)))],
    );

    // Only the fullscreen/backdrop draws remain; the geometry and shadow
    // passes render PBR materials exclusively.
    let (indexed, instanced) = count_draws(&commands);
    assert_eq!(indexed, 4);
    assert_eq!(instanced, 0);
}

#[test]
fn shadow_pass_skips_its_draws_without_a_directional_light() {
    let device = common::device();
    let mut renderer = common::renderer(&device, RendererSettings::default());
    let camera = Camera::default();
    let point = Light {
        position: Vec3::new(2.0, 3.0, 1.0),
        color: Vec3::ONE,
        light_type: LightType::Point,
    };

    let mesh = common::mesh(&device, "Sphere");
    let material = common::material(&device, false);
    let commands = render_one_frame(
        &mut renderer,
        &device,
        &scene(&camera, &[point]),
        &[(mesh, material, Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)))],
    );

    // Shadows are enabled but no cascades exist; the pass still runs for
    // its attachment, recording nothing.
    assert!(pass_labels(&commands).contains(&"Shadow Pass".to_string()));
    let (indexed, instanced) = count_draws(&commands);
    assert_eq!(indexed, 5);
    assert_eq!(instanced, 0);
}

#[test]
fn frames_cycle_through_swapchain_images() {
    let device = common::device();
    let mut renderer = common::renderer(&device, RendererSettings::default());
    let camera = Camera::default();

    for _ in 0..2 {
        render_one_frame(&mut renderer, &device, &scene(&camera, &[]), &[]);
    }
    let queue = device.headless_queue();
    assert_eq!(queue.submissions(), vec![0, 1]);
    assert_eq!(queue.presents(), vec![0, 1]);
}

#[test]
fn meshes_outside_the_frustum_are_culled() {
    let device = common::device();
    let mut renderer = common::renderer(&device, RendererSettings::default());
    let camera = Camera::default();
    let lights = [directional_light()];

    let mesh = common::mesh(&device, "Sphere");
    let material = common::material(&device, false);
    // Default camera looks down -Z; +Z is behind it.
    let behind = Mat4::from_translation(Vec3::new(0.0, 0.0, 10.0));
    let commands = render_one_frame(
        &mut renderer,
        &device,
        &scene(&camera, &lights),
        &[(mesh, material, behind)],
    );

    let (indexed, instanced) = count_draws(&commands);
    assert_eq!(indexed, 4);
    assert_eq!(instanced, 0);
}

#[test]
fn culling_can_be_disabled() {
    let device = common::device();
    let settings = RendererSettings {
        frustum_culling_enabled: false,
        ..RendererSettings::default()
    };
    let mut renderer = common::renderer(&device, settings);
    let camera = Camera::default();

    let mesh = common::mesh(&device, "Sphere");
    let material = common::material(&device, false);
    let behind = Mat4::from_translation(Vec3::new(0.0, 0.0, 10.0));
    let commands = render_one_frame(
        &mut renderer,
        &device,
        &scene(&camera, &[]),
        &[(mesh, material, behind)],
    );

    let (indexed, _) = count_draws(&commands);
    assert_eq!(indexed, 5);
}

#[test]
fn light_buffer_grows_by_doubling() {
    let device = common::device();
    let mut renderer = common::renderer(&device, RendererSettings::default());
    let camera = Camera::default();

    let lights: Vec<Light> = (0..200)
        .map(|i| Light {
            position: Vec3::new(i as f32, 1.0, 0.0),
            color: Vec3::ONE,
            light_type: LightType::Point,
        })
        .collect();

    assert_eq!(renderer.lights_buffer(0).allocated_size(), 1024);
    render_one_frame(&mut renderer, &device, &scene(&camera, &lights), &[]);
    // 200 lights at 32 bytes each need 6400 bytes; 1024 doubles to 8192.
    assert_eq!(renderer.lights_buffer(0).allocated_size(), 8192);
    // Other frames keep their initial allocation.
    assert_eq!(renderer.lights_buffer(1).allocated_size(), 1024);
}

#[test]
fn alpha_blended_draws_are_recorded_last() {
    let device = common::device();
    let mut renderer = common::renderer(&device, RendererSettings::default());
    let camera = Camera::default();

    let mesh = common::mesh(&device, "Sphere");
    let blended = common::material(&device, true);
    let opaque = common::material(&device, false);
    let blended_set = blended.descriptor_set.id();
    let opaque_set = opaque.descriptor_set.id();
    let in_front = Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0));

    // Submit the blended mesh first; the sort must still order it last.
    let commands = render_one_frame(
        &mut renderer,
        &device,
        &scene(&camera, &[]),
        &[
            (mesh.clone(), blended, in_front),
            (mesh, opaque, in_front),
        ],
    );

    let geometry_start = commands
        .iter()
        .position(|c| *c == Command::BeginLabel("Geometry Pass".to_string()))
        .unwrap();
    let geometry_end = geometry_start
        + commands[geometry_start..]
            .iter()
            .position(|c| *c == Command::EndLabel)
            .unwrap();
    let material_binds: Vec<_> = commands[geometry_start..geometry_end]
        .iter()
        .filter_map(|c| match c {
            Command::BindDescriptorSet { set, set_index: 1 } => Some(*set),
            _ => None,
        })
        .collect();
    assert_eq!(material_binds, vec![opaque_set, blended_set]);
}

#[test]
fn forward_path_uses_its_own_topology() {
    let device = common::device();
    let settings = RendererSettings {
        renderer_type: RendererType::Forward,
        ..RendererSettings::default()
    };
    let mut renderer = common::renderer(&device, settings);

    assert_eq!(
        renderer.pass_execution_order(),
        vec![
            "Shadow Pass",
            "Depth Pre-Pass",
            "Lighting Pass",
            "Environment Pass",
            "Tone Mapping Pass",
        ]
    );

    let camera = Camera::default();
    let lights = [directional_light()];
    let mesh = common::mesh(&device, "Sphere");
    let material = common::material(&device, false);
    let commands = render_one_frame(
        &mut renderer,
        &device,
        &scene(&camera, &lights),
        &[(mesh, material, Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)))],
    );

    // Depth pre-pass draw, forward lighting draw, environment cube, tone
    // mapping quad; shadows are instanced.
    let (indexed, instanced) = count_draws(&commands);
    assert_eq!(indexed, 4);
    assert_eq!(instanced, 1);
}

#[test]
fn switching_renderer_type_rebuilds_the_graph() {
    let device = common::device();
    let mut renderer = common::renderer(&device, RendererSettings::default());
    assert!(renderer
        .pass_execution_order()
        .contains(&"Geometry Pass"));

    let forward = RendererSettings {
        renderer_type: RendererType::Forward,
        ..renderer.settings().clone()
    };
    renderer.set_renderer_settings(forward).unwrap();
    let order = renderer.pass_execution_order();
    assert!(order.contains(&"Depth Pre-Pass"));
    assert!(!order.contains(&"Geometry Pass"));
    assert!(!order.contains(&"FXAA Pass"));

    // The rebuilt graph still renders.
    let camera = Camera::default();
    render_one_frame(&mut renderer, &device, &scene(&camera, &[]), &[]);
}

#[test]
fn vsync_toggle_reaches_the_swapchain() {
    let device = common::device();
    let mut renderer = common::renderer(&device, RendererSettings::default());

    let swapchain = device.swapchain();
    let headless = swapchain
        .as_any()
        .downcast_ref::<HeadlessSwapchain>()
        .unwrap();
    assert!(headless.vsync_enabled());

    let no_vsync = RendererSettings {
        vsync_enabled: false,
        ..renderer.settings().clone()
    };
    renderer.set_renderer_settings(no_vsync).unwrap();
    assert!(!headless.vsync_enabled());
    assert!(!renderer.settings().vsync_enabled);
}

#[test]
fn resize_updates_viewport_and_swapchain() {
    let device = common::device();
    let mut renderer = common::renderer(&device, RendererSettings::default());

    let new_size = UVec2::new(1280, 720);
    renderer.resize_viewport(new_size).unwrap();
    assert_eq!(renderer.viewport_dimensions(), new_size);
    assert_eq!(device.swapchain().dimensions(), new_size);

    // A zero-sized request (minimized window) is ignored.
    renderer.resize_viewport(UVec2::ZERO).unwrap();
    assert_eq!(renderer.viewport_dimensions(), new_size);

    let camera = Camera::default();
    let commands = render_one_frame(&mut renderer, &device, &scene(&camera, &[]), &[]);
    assert!(commands.contains(&Command::SetViewportAndScissor(new_size)));
}

#[test]
fn disabled_shadows_keep_the_pass_but_skip_its_draws() {
    let device = common::device();
    let settings = RendererSettings {
        shadows_enabled: false,
        ..RendererSettings::default()
    };
    let mut renderer = common::renderer(&device, settings);
    let camera = Camera::default();
    let lights = [directional_light()];

    let mesh = common::mesh(&device, "Sphere");
    let material = common::material(&device, false);
    let commands = render_one_frame(
        &mut renderer,
        &device,
        &scene(&camera, &lights),
        &[(mesh, material, Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)))],
    );

    // The pass still executes (its attachment feeds the lighting pass) but
    // records no shadow geometry.
    assert!(pass_labels(&commands).contains(&"Shadow Pass".to_string()));
    let (_, instanced) = count_draws(&commands);
    assert_eq!(instanced, 0);
}

#[test]
fn environment_ibl_is_computed_once_per_map() {
    let device = common::device();
    let mut renderer = common::renderer(&device, RendererSettings::default());
    let camera = Camera::default();
    let environment = Arc::new(EnvironmentMap::new(common::cubemap(
        &device,
        "Sky",
        512,
    )));

    let mut description = scene(&camera, &[]);
    description.environment_map = Some(environment.clone());

    render_one_frame(&mut renderer, &device, &description, &[]);
    render_one_frame(&mut renderer, &device, &description, &[]);

    // Both derived maps exist and the convolution ran exactly once.
    assert!(environment.irradiance.read().unwrap().is_some());
    assert!(environment.prefiltered.read().unwrap().is_some());
    let one_time = device.one_time_command_buffers();
    assert_eq!(one_time.len(), 1);

    let dispatches: Vec<(u32, u32, u32)> = one_time[0]
        .commands()
        .iter()
        .filter_map(|c| match c {
            Command::Dispatch {
                groups_x,
                groups_y,
                groups_z,
            } => Some((*groups_x, *groups_y, *groups_z)),
            _ => None,
        })
        .collect();
    // Irradiance convolution, then one prefilter dispatch per mip.
    assert_eq!(
        dispatches,
        vec![
            (8, 8, 6),
            (4, 4, 6),
            (2, 2, 6),
            (1, 1, 6),
            (1, 1, 6),
            (1, 1, 6),
            (1, 1, 6),
        ]
    );

    let irradiance = environment.irradiance.read().unwrap().clone().unwrap();
    assert_eq!(irradiance.dimensions(), UVec2::splat(64));
    let prefiltered = environment.prefiltered.read().unwrap().clone().unwrap();
    assert_eq!(prefiltered.dimensions(), UVec2::splat(128));
    assert_eq!(prefiltered.mip_count(), 6);
}

#[test]
fn overlay_hook_runs_after_the_scene() {
    let device = common::device();
    let mut renderer = common::renderer(&device, RendererSettings::default());

    let invocations = Arc::new(AtomicU32::new(0));
    let counter = invocations.clone();
    renderer
        .set_overlay_hook(Box::new(move |ctx| {
            assert_ne!(ctx.dimensions, UVec2::ZERO);
            counter.fetch_add(1, Ordering::SeqCst);
        }))
        .unwrap();

    let camera = Camera::default();
    let commands = render_one_frame(&mut renderer, &device, &scene(&camera, &[]), &[]);
    assert_eq!(invocations.load(Ordering::SeqCst), 1);
    assert_eq!(pass_labels(&commands).last().map(String::as_str), Some("Overlay"));
    // With the overlay installed the scene renders offscreen and the host UI
    // can sample it.
    assert!(renderer.viewport_texture().is_some());
}

#[test]
fn gbuffer_debug_view_rebinds_the_output_under_an_overlay() {
    let device = common::device();
    let mut renderer = common::renderer(&device, RendererSettings::default());
    renderer.set_overlay_hook(Box::new(|_| {})).unwrap();

    let debug = RendererSettings {
        debug_view: DebugView::GBufferNormal,
        ..renderer.settings().clone()
    };
    renderer.set_renderer_settings(debug).unwrap();

    let camera = Camera::default();
    let commands = render_one_frame(&mut renderer, &device, &scene(&camera, &[]), &[]);
    assert!(pass_labels(&commands).contains(&"Geometry Pass".to_string()));
    assert!(renderer.viewport_texture().is_some());

    // Switching back restores the default output without error.
    let normal = RendererSettings {
        debug_view: DebugView::None,
        ..renderer.settings().clone()
    };
    renderer.set_renderer_settings(normal).unwrap();
    render_one_frame(&mut renderer, &device, &scene(&camera, &[]), &[]);
}
