use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use crate::triangulate::Triangle;

/// GPU-ready terrain vertex.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct TerrainVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

/// Indexed triangle list for one renderable piece of terrain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderMesh {
    pub vertices: Vec<TerrainVertex>,
    pub indices: Vec<u32>,
}

impl RenderMesh {
    /// Build an indexed mesh, sharing vertices with identical positions.
    ///
    /// `position` maps a triangle point to the vertex position (for example
    /// into a body's local frame); `uv` derives texture coordinates from the
    /// original point.
    pub fn from_triangles(
        tris: &[Triangle],
        position: impl Fn(Vec2) -> Vec2,
        uv: impl Fn(Vec2) -> Vec2,
    ) -> Self {
        let mut mesh = RenderMesh::default();
        let mut lookup: HashMap<(u32, u32), u32> = HashMap::new();
        for tri in tris {
            for &p in tri {
                let key = (p.x.to_bits(), p.y.to_bits());
                let index = *lookup.entry(key).or_insert_with(|| {
                    mesh.vertices.push(TerrainVertex {
                        position: position(p).to_array(),
                        uv: uv(p).to_array(),
                    });
                    (mesh.vertices.len() - 1) as u32
                });
                mesh.indices.push(index);
            }
        }
        mesh
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Raw vertex bytes for upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}
