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

//! Defines the hierarchy of error types for the rendering subsystem.

use std::fmt;

/// An error related to the creation or use of a GPU resource (buffers,
/// textures, descriptor sets, render passes, framebuffers).
#[derive(Debug)]
pub enum ResourceError {
    /// The backend failed to create the resource.
    CreationFailed {
        /// A descriptive label for the resource, if available.
        label: String,
        /// Detailed error messages from the backend.
        details: String,
    },
    /// A buffer (re)allocation failed.
    AllocationFailed {
        /// The requested size in bytes.
        size: u64,
        /// Detailed error messages from the backend.
        details: String,
    },
    /// A descriptor-set binding index does not exist or holds a different
    /// descriptor type than the update requested.
    InvalidBinding {
        /// The offending binding index.
        binding: u32,
    },
    /// A builder-style resource was finalized without being begun, or a
    /// required piece of its description is missing.
    IncompleteDescription(String),
    /// An error originating from the specific graphics backend implementation.
    BackendError(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::CreationFailed { label, details } => {
                write!(f, "Failed to create resource '{label}': {details}")
            }
            ResourceError::AllocationFailed { size, details } => {
                write!(f, "Failed to allocate {size} bytes: {details}")
            }
            ResourceError::InvalidBinding { binding } => {
                write!(f, "Invalid descriptor set binding index {binding}")
            }
            ResourceError::IncompleteDescription(msg) => {
                write!(f, "Incomplete resource description: {msg}")
            }
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
        }
    }
}

impl std::error::Error for ResourceError {}

/// An error related to the creation of a graphics or compute pipeline.
#[derive(Debug)]
pub enum PipelineError {
    /// The graphics backend failed to compile the full pipeline state object.
    CompilationFailed {
        /// A descriptive label for the pipeline, if available.
        label: Option<String>,
        /// Detailed error messages from the backend.
        details: String,
    },
    /// The vertex buffer layout does not match what the vertex shader expects.
    IncompatibleVertexLayout(String),
    /// A required graphics feature is not supported by the device.
    FeatureNotSupported(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::CompilationFailed { label, details } => {
                write!(
                    f,
                    "Pipeline compilation failed for '{}': {}",
                    label.as_deref().unwrap_or("Unknown"),
                    details
                )
            }
            PipelineError::IncompatibleVertexLayout(msg) => {
                write!(f, "Incompatible vertex buffer layout: {msg}")
            }
            PipelineError::FeatureNotSupported(msg) => {
                write!(f, "Feature not supported: {msg}")
            }
        }
    }
}

impl std::error::Error for PipelineError {}

/// An error raised while building a render graph. All graph errors are
/// detected when the graph is finalized, before any frame executes.
#[derive(Debug)]
pub enum GraphError {
    /// An input link references a pass name that does not exist in the graph.
    UnknownPass {
        /// The referenced pass name.
        pass: String,
    },
    /// An input link references an attachment name its owning pass never
    /// created.
    UnknownAttachment {
        /// The pass that owns (or was expected to own) the attachment.
        pass: String,
        /// The referenced attachment name.
        attachment: String,
    },
    /// The pass dependencies form a cycle, so no execution order exists.
    CycleDetected {
        /// A pass that participates in the cycle.
        pass: String,
    },
    /// Two passes were added under the same name.
    DuplicatePass {
        /// The name used twice.
        pass: String,
    },
    /// The graph was finalized without an output pass or without naming the
    /// output pass's presentable attachment.
    OutputNotSet,
    /// A builder call arrived outside a `begin_building`/`end_building` pair.
    NotBuilding,
    /// A GPU resource needed by the graph could not be created.
    Resource(ResourceError),
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::UnknownPass { pass } => {
                write!(f, "Render graph references unknown pass '{pass}'")
            }
            GraphError::UnknownAttachment { pass, attachment } => {
                write!(
                    f,
                    "Render graph references unknown attachment '{attachment}' on pass '{pass}'"
                )
            }
            GraphError::CycleDetected { pass } => {
                write!(f, "Render graph contains a dependency cycle through pass '{pass}'")
            }
            GraphError::DuplicatePass { pass } => {
                write!(f, "Render graph already contains a pass named '{pass}'")
            }
            GraphError::OutputNotSet => {
                write!(f, "Render graph was finalized without an output attachment")
            }
            GraphError::NotBuilding => {
                write!(f, "Render graph builder call outside begin_building/end_building")
            }
            GraphError::Resource(err) => {
                write!(f, "Render graph resource creation failed: {err}")
            }
        }
    }
}

impl std::error::Error for GraphError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GraphError::Resource(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResourceError> for GraphError {
    fn from(err: ResourceError) -> Self {
        GraphError::Resource(err)
    }
}

/// A high-level error that can occur while rendering a frame.
#[derive(Debug)]
pub enum RenderError {
    /// Failed to acquire the next image from the swapchain for rendering.
    SurfaceAcquisitionFailed(String),
    /// Recording or submitting a command buffer failed.
    CommandSubmissionFailed(String),
    /// An error occurred while managing a GPU resource.
    Resource(ResourceError),
    /// An error occurred while creating a pipeline state object.
    Pipeline(PipelineError),
    /// An error occurred while (re)building the render graph.
    Graph(GraphError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::SurfaceAcquisitionFailed(msg) => {
                write!(f, "Failed to acquire surface for rendering: {msg}")
            }
            RenderError::CommandSubmissionFailed(msg) => {
                write!(f, "Command buffer submission failed: {msg}")
            }
            RenderError::Resource(err) => {
                write!(f, "Graphics resource operation failed: {err}")
            }
            RenderError::Pipeline(err) => {
                write!(f, "Pipeline state creation failed: {err}")
            }
            RenderError::Graph(err) => {
                write!(f, "Render graph operation failed: {err}")
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Resource(err) => Some(err),
            RenderError::Pipeline(err) => Some(err),
            RenderError::Graph(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResourceError> for RenderError {
    fn from(err: ResourceError) -> Self {
        RenderError::Resource(err)
    }
}

impl From<PipelineError> for RenderError {
    fn from(err: PipelineError) -> Self {
        RenderError::Pipeline(err)
    }
}

impl From<GraphError> for RenderError {
    fn from(err: GraphError) -> Self {
        RenderError::Graph(err)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn resource_error_display() {
        let err = ResourceError::CreationFailed {
            label: "GBuffer Albedo".to_string(),
            details: "format unsupported".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "Failed to create resource 'GBuffer Albedo': format unsupported"
        );
    }

    #[test]
    fn graph_error_display_and_source() {
        let err = GraphError::UnknownAttachment {
            pass: "Lighting Pass".to_string(),
            attachment: "Albedo".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "Render graph references unknown attachment 'Albedo' on pass 'Lighting Pass'"
        );

        let wrapped: GraphError = ResourceError::BackendError("oom".to_string()).into();
        assert!(wrapped.source().is_some());
    }

    #[test]
    fn render_error_wrapping_graph_error() {
        let graph_err = GraphError::CycleDetected {
            pass: "Tone Mapping Pass".to_string(),
        };
        let render_err: RenderError = graph_err.into();
        assert_eq!(
            format!("{render_err}"),
            "Render graph operation failed: Render graph contains a dependency cycle through pass 'Tone Mapping Pass'"
        );
        assert!(render_err.source().is_some());
    }
}
