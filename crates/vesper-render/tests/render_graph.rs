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

//! Render graph construction, validation, execution, and resize behavior
//! against the headless backend.

mod common;

use std::sync::Arc;

use glam::UVec2;

use vesper_core::error::{GraphError, RenderError};
use vesper_core::rhi::{
    CommandBuffer as _, GraphicsDevice, ImageFormat, ImageLayout, Swapchain as _, Texture as _,
};
use vesper_infra::{Command, HeadlessCommandBuffer, HeadlessDevice};
use vesper_render::graph::{color_attachment, depth_attachment};
use vesper_render::{OutputBinding, PassContext, PassDimensions, PassExecutor, RenderGraph};
use vesper_render::graph::RenderGraphPass;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TestPass {
    Producer,
    Consumer,
    Output,
}

/// Records which passes ran and whether they saw read inputs.
#[derive(Default)]
struct RecordingExecutor {
    ran: Vec<(TestPass, bool, UVec2)>,
}

impl PassExecutor<TestPass> for RecordingExecutor {
    fn execute_pass(
        &mut self,
        kind: &TestPass,
        ctx: &PassContext<'_>,
    ) -> Result<(), RenderError> {
        self.ran.push((*kind, ctx.read_inputs.is_some(), ctx.dimensions));
        Ok(())
    }
}

fn graph_device() -> Arc<dyn GraphicsDevice> {
    common::device()
}

fn producer_pass(name: &str) -> RenderGraphPass<TestPass> {
    let mut pass = RenderGraphPass::new(TestPass::Producer, name, PassDimensions::Viewport);
    pass.create_color_attachment(
        "Color",
        color_attachment(ImageFormat::Rgba16Float, [0.0; 4]),
    );
    pass
}

fn output_pass(name: &str) -> RenderGraphPass<TestPass> {
    let mut pass = RenderGraphPass::new(TestPass::Output, name, PassDimensions::Viewport);
    pass.create_color_attachment("Output", color_attachment(ImageFormat::Bgra8Unorm, [0.0; 4]));
    pass
}

#[test]
fn duplicate_pass_names_are_rejected() {
    let mut graph = RenderGraph::new(graph_device());
    graph.begin_building(common::VIEWPORT, 2, OutputBinding::Offscreen);
    graph.add_pass(producer_pass("A")).unwrap();
    let result = graph.add_pass(producer_pass("A"));
    assert!(matches!(result, Err(GraphError::DuplicatePass { pass }) if pass == "A"));
}

#[test]
fn link_to_unknown_pass_fails_at_end_building() {
    let mut graph = RenderGraph::new(graph_device());
    graph.begin_building(common::VIEWPORT, 2, OutputBinding::Offscreen);
    let mut consumer = output_pass("Consumer");
    consumer.link_read_input("Ghost", "Color", ImageLayout::ShaderReadOnly);
    graph.add_output_pass(consumer).unwrap();
    graph.set_output_attachment("Consumer", "Output").unwrap();
    let result = graph.end_building();
    assert!(matches!(result, Err(GraphError::UnknownPass { pass }) if pass == "Ghost"));
}

#[test]
fn link_to_unknown_attachment_fails_at_end_building() {
    let mut graph = RenderGraph::new(graph_device());
    graph.begin_building(common::VIEWPORT, 2, OutputBinding::Offscreen);
    graph.add_pass(producer_pass("Producer")).unwrap();
    let mut consumer = output_pass("Consumer");
    consumer.link_read_input("Producer", "Nope", ImageLayout::ShaderReadOnly);
    graph.add_output_pass(consumer).unwrap();
    graph.set_output_attachment("Consumer", "Output").unwrap();
    let result = graph.end_building();
    assert!(
        matches!(result, Err(GraphError::UnknownAttachment { attachment, .. }) if attachment == "Nope")
    );
}

#[test]
fn missing_output_fails_at_end_building() {
    let mut graph = RenderGraph::new(graph_device());
    graph.begin_building(common::VIEWPORT, 2, OutputBinding::Offscreen);
    graph.add_pass(producer_pass("Producer")).unwrap();
    assert!(matches!(graph.end_building(), Err(GraphError::OutputNotSet)));
}

#[test]
fn dependency_cycles_are_detected() {
    let mut graph = RenderGraph::new(graph_device());
    graph.begin_building(common::VIEWPORT, 2, OutputBinding::Offscreen);

    let mut a = producer_pass("A");
    a.add_dependency("B");
    graph.add_pass(a).unwrap();
    let mut b = producer_pass("B");
    b.add_dependency("A");
    graph.add_pass(b).unwrap();
    graph.add_output_pass(output_pass("Out")).unwrap();
    graph.set_output_attachment("Out", "Output").unwrap();

    let result = graph.end_building();
    assert!(matches!(result, Err(GraphError::CycleDetected { .. })));
}

#[test]
fn execution_follows_topological_order_of_links() {
    let device = common::device();
    let mut graph = RenderGraph::new(device.clone() as Arc<dyn GraphicsDevice>);
    graph.begin_building(common::VIEWPORT, 2, OutputBinding::Offscreen);

    // Insertion order is deliberately output-first; links must still order
    // producer before consumer before output.
    let mut out = output_pass("Out");
    out.link_read_input("Consumer", "Color", ImageLayout::ShaderReadOnly);
    graph.add_output_pass(out).unwrap();
    let mut consumer =
        RenderGraphPass::new(TestPass::Consumer, "Consumer", PassDimensions::Viewport);
    consumer
        .create_color_attachment("Color", color_attachment(ImageFormat::Rgba16Float, [0.0; 4]))
        .link_read_input("Producer", "Color", ImageLayout::ShaderReadOnly);
    graph.add_pass(consumer).unwrap();
    graph.add_pass(producer_pass("Producer")).unwrap();
    graph.set_output_attachment("Out", "Output").unwrap();
    graph.end_building().unwrap();

    assert_eq!(graph.execution_order(), vec!["Producer", "Consumer", "Out"]);

    let cmd = device.allocate_command_buffer("Frame");
    cmd.begin_recording().unwrap();
    let mut recorder = RecordingExecutor::default();
    graph.execute(&cmd, 0, &mut recorder).unwrap();
    cmd.end_recording().unwrap();

    let kinds: Vec<TestPass> = recorder.ran.iter().map(|(kind, _, _)| *kind).collect();
    assert_eq!(
        kinds,
        vec![TestPass::Producer, TestPass::Consumer, TestPass::Output]
    );
    // Only the passes with read links get a read-input set.
    assert!(!recorder.ran[0].1);
    assert!(recorder.ran[1].1);
    assert!(recorder.ran[2].1);
}

#[test]
fn read_inputs_are_transitioned_before_their_consumer() {
    let device = common::device();
    let mut graph = RenderGraph::new(device.clone() as Arc<dyn GraphicsDevice>);
    graph.begin_building(common::VIEWPORT, 1, OutputBinding::Offscreen);
    graph.add_pass(producer_pass("Producer")).unwrap();
    let mut out = output_pass("Out");
    out.link_read_input("Producer", "Color", ImageLayout::ShaderReadOnly);
    graph.add_output_pass(out).unwrap();
    graph.set_output_attachment("Out", "Output").unwrap();
    graph.end_building().unwrap();

    let cmd = device.allocate_command_buffer("Frame");
    cmd.begin_recording().unwrap();
    graph.execute(&cmd, 0, &mut RecordingExecutor::default()).unwrap();
    cmd.end_recording().unwrap();

    let headless = cmd
        .as_any()
        .downcast_ref::<HeadlessCommandBuffer>()
        .unwrap();
    let commands = headless.commands();

    let producer_texture = graph.attachment_texture("Producer", "Color", 0).unwrap();
    let consumer_label = commands
        .iter()
        .position(|c| *c == Command::BeginLabel("Out".to_string()))
        .unwrap();
    let barrier = commands[..consumer_label]
        .iter()
        .find_map(|c| match c {
            Command::PipelineBarrier { transitions } => transitions
                .iter()
                .find(|(id, _, _)| *id == producer_texture.id()),
            _ => None,
        })
        .expect("no transition for the consumed attachment");
    assert_eq!(barrier.1, ImageLayout::ColorAttachment);
    assert_eq!(barrier.2, ImageLayout::ShaderReadOnly);
    assert_eq!(producer_texture.current_layout(), ImageLayout::ShaderReadOnly);
}

#[test]
fn offscreen_output_is_sampleable_per_frame() {
    let mut graph = RenderGraph::new(graph_device());
    graph.begin_building(common::VIEWPORT, 3, OutputBinding::Offscreen);
    graph.add_output_pass(output_pass("Out")).unwrap();
    graph.set_output_attachment("Out", "Output").unwrap();
    graph.end_building().unwrap();

    assert_eq!(graph.frames_in_flight(), 3);
    for frame in 0..3 {
        let texture = graph.output_texture(frame).expect("offscreen output texture");
        assert_eq!(texture.dimensions(), common::VIEWPORT);
        assert!(graph.output_descriptor_set(frame).is_some());
    }
}

#[test]
fn window_output_binds_swapchain_images_instead() {
    let device = common::device();
    let targets = device.swapchain().render_targets();
    let mut graph = RenderGraph::new(device.clone() as Arc<dyn GraphicsDevice>);
    graph.begin_building(common::VIEWPORT, 0, OutputBinding::Window(targets));
    graph.add_output_pass(output_pass("Out")).unwrap();
    graph.set_output_attachment("Out", "Output").unwrap();
    graph.end_building().unwrap();

    // Frames in flight come from the swapchain image count, and there is no
    // offscreen output to sample.
    assert_eq!(graph.frames_in_flight(), common::FRAMES);
    assert!(graph.output_texture(0).is_none());
    assert!(graph.output_descriptor_set(0).is_none());
}

#[test]
fn resize_rebuilds_viewport_resources_only() {
    let device: Arc<HeadlessDevice> = common::device();
    let mut graph = RenderGraph::new(device.clone() as Arc<dyn GraphicsDevice>);
    graph.begin_building(common::VIEWPORT, 2, OutputBinding::Offscreen);

    let mut shadow = RenderGraphPass::new(
        TestPass::Producer,
        "Shadow",
        PassDimensions::Fixed(UVec2::splat(2048)),
    );
    shadow.create_depth_stencil_attachment("Depth", depth_attachment(ImageFormat::D32FloatS8Uint));
    graph.add_pass(shadow).unwrap();
    let mut out = output_pass("Out");
    out.link_read_input("Shadow", "Depth", ImageLayout::ShaderReadOnly);
    graph.add_output_pass(out).unwrap();
    graph.set_output_attachment("Out", "Output").unwrap();
    graph.end_building().unwrap();

    let shadow_before = graph.attachment_texture("Shadow", "Depth", 0).unwrap();
    let order_before: Vec<String> = graph
        .execution_order()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let new_size = UVec2::new(1280, 720);
    graph.resize_resources(new_size, None).unwrap();

    let shadow_after = graph.attachment_texture("Shadow", "Depth", 0).unwrap();
    let output_after = graph.attachment_texture("Out", "Output", 0).unwrap();
    assert_eq!(shadow_before.id(), shadow_after.id());
    assert_eq!(shadow_after.dimensions(), UVec2::splat(2048));
    assert_eq!(output_after.dimensions(), new_size);
    assert_eq!(graph.viewport_dimensions(), new_size);
    let order_after: Vec<String> = graph
        .execution_order()
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(order_before, order_after);
}
