use std::io::Cursor;

use bytemuck::{Pod, Zeroable};

use crate::build::BuildError;
use crate::device::{VertexElement, VertexFormat};

/// Interleaved vertex shared by every drawable.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Default, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub uv: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub const STRIDE: u32 = std::mem::size_of::<Vertex>() as u32;

    /// Input layout of the vertex stage.
    pub const LAYOUT: [VertexElement; 3] = [
        VertexElement { semantic: "POSITION", format: VertexFormat::Float32x3, offset: 0 },
        VertexElement { semantic: "UV", format: VertexFormat::Float32x3, offset: 12 },
        VertexElement { semantic: "NORMAL", format: VertexFormat::Float32x3, offset: 24 },
    ];
}

/// Decoded mesh: unique vertices plus 32-bit indices into them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    #[inline]
    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}

/// Turns raw mesh file bytes into `MeshData`.
pub trait MeshDecoder: Send + Sync {
    fn decode(&self, name: &str, bytes: &[u8]) -> Result<MeshData, BuildError>;
}

/// Wavefront OBJ decoder.
///
/// Faces are triangulated and vertices deduplicated on their
/// position/uv/normal triple. All objects in the file are merged into one
/// mesh. Texture V is flipped to a top-left origin.
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjDecoder;

impl MeshDecoder for ObjDecoder {
    fn decode(&self, name: &str, bytes: &[u8]) -> Result<MeshData, BuildError> {
        let options = tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        };

        // Materials are irrelevant here; a missing .mtl must not fail the mesh.
        let (models, _) = tobj::load_obj_buf(&mut Cursor::new(bytes), &options, |_| {
            Err(tobj::LoadError::OpenFileFailed)
        })
        .map_err(|e| BuildError::decode(name, e))?;

        let mut mesh = MeshData::default();
        for model in &models {
            let m = &model.mesh;
            let base = mesh.vertices.len() as u32;
            let count = m.positions.len() / 3;

            for i in 0..count {
                let position = [m.positions[3 * i], m.positions[3 * i + 1], m.positions[3 * i + 2]];
                let uv = match m.texcoords.get(2 * i..2 * i + 2) {
                    Some(t) => [t[0], 1.0 - t[1], 0.0],
                    None => [0.0; 3],
                };
                let normal = match m.normals.get(3 * i..3 * i + 3) {
                    Some(n) => [n[0], n[1], n[2]],
                    None => [0.0; 3],
                };
                mesh.vertices.push(Vertex { position, uv, normal });
            }

            mesh.indices.extend(m.indices.iter().map(|i| base + i));
        }

        if mesh.vertices.is_empty() || mesh.indices.is_empty() {
            return Err(BuildError::decode(name, "mesh has no faces"));
        }

        log::debug!(
            "decoded mesh {name}: {} vertices, {} indices",
            mesh.vertices.len(),
            mesh.indices.len()
        );
        Ok(mesh)
    }
}
