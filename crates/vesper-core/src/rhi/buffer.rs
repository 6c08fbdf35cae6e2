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

//! GPU buffer contract and vertex buffer layout description.

use std::any::Any;
use std::fmt::Debug;

use crate::error::ResourceError;

use super::BufferId;

/// A GPU buffer (vertex, index, uniform, or storage).
pub trait Buffer: Debug + Send + Sync {
    /// The buffer's process-unique ID.
    fn id(&self) -> BufferId;

    /// The currently allocated size in bytes.
    fn allocated_size(&self) -> u64;

    /// Uploads `data` to the start of the buffer. `data` must fit within the
    /// allocated size.
    fn copy_data(&self, data: &[u8]) -> Result<(), ResourceError>;

    /// Replaces the backing allocation with one of `new_size` bytes. Existing
    /// contents are discarded; descriptor sets referencing this buffer must
    /// re-bind it afterwards.
    fn reallocate(&self, new_size: u64) -> Result<(), ResourceError>;

    /// Downcasting support for backends.
    fn as_any(&self) -> &dyn Any;
}

/// The data format of one vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexAttributeFormat {
    /// Two 32-bit floats (e.g. texture coordinates).
    Float32x2,
    /// Three 32-bit floats (e.g. positions, normals).
    Float32x3,
    /// Four 32-bit floats (e.g. tangents with handedness).
    Float32x4,
}

impl VertexAttributeFormat {
    /// Size of the attribute in bytes.
    pub fn size(&self) -> u32 {
        match self {
            VertexAttributeFormat::Float32x2 => 8,
            VertexAttributeFormat::Float32x3 => 12,
            VertexAttributeFormat::Float32x4 => 16,
        }
    }
}

/// One attribute within a vertex buffer layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// Shader input location.
    pub location: u32,
    /// Byte offset from the start of the vertex.
    pub offset: u32,
    /// The attribute's data format.
    pub format: VertexAttributeFormat,
}

/// The layout of the vertices inside a vertex buffer.
///
/// Part of the pipeline cache key, so it implements `Hash`/`Eq`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct VertexBufferLayout {
    /// Byte stride between consecutive vertices.
    pub stride: u32,
    /// The attributes of one vertex, in location order.
    pub attributes: Vec<VertexAttribute>,
}

impl VertexBufferLayout {
    /// Builds a tightly packed layout from attribute formats, assigning
    /// locations and offsets in order.
    pub fn packed(formats: &[VertexAttributeFormat]) -> Self {
        let mut attributes = Vec::with_capacity(formats.len());
        let mut offset = 0;
        for (location, format) in formats.iter().enumerate() {
            attributes.push(VertexAttribute {
                location: location as u32,
                offset,
                format: *format,
            });
            offset += format.size();
        }
        Self {
            stride: offset,
            attributes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_layout_accumulates_offsets() {
        let layout = VertexBufferLayout::packed(&[
            VertexAttributeFormat::Float32x3,
            VertexAttributeFormat::Float32x3,
            VertexAttributeFormat::Float32x2,
        ]);
        assert_eq!(layout.stride, 32);
        assert_eq!(layout.attributes[1].offset, 12);
        assert_eq!(layout.attributes[2].offset, 24);
        assert_eq!(layout.attributes[2].location, 2);
    }
}
