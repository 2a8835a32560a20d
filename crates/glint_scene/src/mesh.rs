//! # Mesh Data
//!
//! CPU-side vertex data, a Wavefront OBJ reader for triangle meshes, and
//! the [`MeshComponent`] that references uploaded vertex buffers by handle.

use std::path::Path;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::error::{SceneError, SceneResult};

// =============================================================================
// VERTEX FORMAT
// =============================================================================

/// Vertex layout shared with the shaders: position then normal.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position in model space [x, y, z]
    pub position: [f32; 3],
    /// Normal direction [nx, ny, nz]
    pub normal: [f32; 3],
}

impl Vertex {
    /// Byte stride of one vertex.
    pub const STRIDE: usize = std::mem::size_of::<Self>();

    /// Creates a vertex.
    #[must_use]
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
        }
    }
}

/// Non-indexed triangle list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Three vertices per triangle.
    pub vertices: Vec<Vertex>,
}

impl Mesh {
    /// Reads an OBJ file. See [`parse_obj`](Self::parse_obj).
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Io`] if the file cannot be read, otherwise as
    /// [`parse_obj`](Self::parse_obj).
    pub fn load_obj(path: impl AsRef<Path>) -> SceneResult<Self> {
        let path = path.as_ref();
        tracing::info!(path = %path.display(), "reading object file");
        let text = std::fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_obj(&text)
    }

    /// Parses the subset of OBJ needed for flat triangle meshes.
    ///
    /// - `v` and `vn` rows are collected
    /// - `f` rows are `v//vn` or `v/vt/vn` triples; texture indices are ignored
    /// - comment, object and smoothing rows are skipped
    /// - faces with more than three corners and unknown rows are skipped
    ///   with a warning
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Obj`] on malformed numbers or face indices that
    /// refer to missing positions or normals.
    pub fn parse_obj(text: &str) -> SceneResult<Self> {
        let mut positions = Vec::new();
        let mut normals = Vec::new();
        let mut vertices = Vec::new();

        for (number, line) in text.lines().enumerate() {
            let line_no = number + 1;
            let mut fields = line.split_whitespace();
            let Some(row_type) = fields.next() else { continue };

            match row_type {
                "#" | "o" | "s" | "g" => {}
                _ if row_type.starts_with('#') => {}
                "v" => positions.push(parse_vec3(fields, line_no)?),
                "vn" => normals.push(parse_vec3(fields, line_no)?),
                "f" => {
                    let corners: Vec<&str> = fields.collect();
                    if corners.len() != 3 {
                        tracing::warn!(line = line_no, corners = corners.len(), "non-triangle faces not supported");
                        continue;
                    }
                    for corner in corners {
                        let (position, normal) = parse_corner(corner, line_no)?;
                        let position = lookup(&positions, position, line_no, "position")?;
                        let normal = lookup(&normals, normal, line_no, "normal")?;
                        vertices.push(Vertex::new(position, normal));
                    }
                }
                other => tracing::warn!(line = line_no, row_type = other, "unknown OBJ row type"),
            }
        }

        tracing::debug!(vertices = vertices.len(), "parsed OBJ mesh");
        Ok(Self { vertices })
    }

    /// Number of vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Returns `true` if the mesh has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Vertex data as raw bytes, ready for upload.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

fn obj_error(line: usize, message: impl Into<String>) -> SceneError {
    SceneError::Obj {
        line,
        message: message.into(),
    }
}

fn parse_vec3<'a>(mut fields: impl Iterator<Item = &'a str>, line: usize) -> SceneResult<Vec3> {
    let mut axis = || -> SceneResult<f32> {
        let field = fields.next().ok_or_else(|| obj_error(line, "expected three coordinates"))?;
        field
            .parse()
            .map_err(|_| obj_error(line, format!("invalid coordinate {field:?}")))
    };
    Ok(Vec3::new(axis()?, axis()?, axis()?))
}

/// Splits `v//vn` or `v/vt/vn` into 0-based position and normal indices.
fn parse_corner(corner: &str, line: usize) -> SceneResult<(usize, usize)> {
    let (position, normal) = corner
        .split_once('/')
        .and_then(|(position, rest)| Some((position, rest.split_once('/')?.1)))
        .ok_or_else(|| obj_error(line, format!("face corner {corner:?} has no normal")))?;

    let index = |field: &str| -> SceneResult<usize> {
        field
            .parse::<usize>()
            .ok()
            .and_then(|index| index.checked_sub(1))
            .ok_or_else(|| obj_error(line, format!("invalid face index {field:?}")))
    };
    Ok((index(position)?, index(normal)?))
}

fn lookup(table: &[Vec3], index: usize, line: usize, what: &str) -> SceneResult<Vec3> {
    table
        .get(index)
        .copied()
        .ok_or_else(|| obj_error(line, format!("{what} index {} out of range", index + 1)))
}

// =============================================================================
// COMPONENT
// =============================================================================

/// Opaque handle to a vertex buffer owned by the renderer backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub u32);

/// Renderable mesh: a vertex buffer handle and how many vertices to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshComponent {
    /// Uploaded vertex buffer.
    pub buffer: BufferHandle,
    /// Vertices to draw as a triangle list.
    pub vertex_count: u32,
}

/// Backend that owns vertex buffers.
pub trait MeshUploader {
    /// Uploads raw vertex bytes and returns the new buffer's handle.
    fn upload(&mut self, bytes: &[u8]) -> BufferHandle;
}

impl MeshComponent {
    /// Uploads `mesh` through `uploader`.
    ///
    /// Meshes with more than `u32::MAX` vertices are cropped.
    pub fn upload(uploader: &mut impl MeshUploader, mesh: &Mesh) -> Self {
        let vertex_count = u32::try_from(mesh.len()).unwrap_or_else(|_| {
            tracing::warn!(vertices = mesh.len(), "mesh too large, cropping");
            u32::MAX
        });
        let cropped = vertex_count as usize * Vertex::STRIDE;
        let bytes = &mesh.as_bytes()[..cropped.min(mesh.as_bytes().len())];
        Self {
            buffer: uploader.upload(bytes),
            vertex_count,
        }
    }
}

/// Uploader that keeps vertex bytes in host memory.
///
/// Used by headless runs and tests in place of a GPU backend.
#[derive(Debug, Default)]
pub struct HostBuffers {
    buffers: Vec<Vec<u8>>,
}

impl HostBuffers {
    /// Creates an empty buffer pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes of an uploaded buffer.
    #[must_use]
    pub fn get(&self, handle: BufferHandle) -> Option<&[u8]> {
        self.buffers.get(handle.0 as usize).map(Vec::as_slice)
    }

    /// Decodes the vertices of an uploaded buffer.
    #[must_use]
    pub fn vertices(&self, handle: BufferHandle) -> Option<Vec<Vertex>> {
        let bytes = self.get(handle)?;
        Some(
            bytes
                .chunks_exact(Vertex::STRIDE)
                .map(bytemuck::pod_read_unaligned)
                .collect(),
        )
    }

    /// Number of uploaded buffers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Returns `true` if nothing was uploaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }
}

impl MeshUploader for HostBuffers {
    fn upload(&mut self, bytes: &[u8]) -> BufferHandle {
        // Buffer count stays far below u32::MAX in practice
        let handle = BufferHandle(u32::try_from(self.buffers.len()).unwrap_or(u32::MAX));
        self.buffers.push(bytes.to_vec());
        handle
    }
}
