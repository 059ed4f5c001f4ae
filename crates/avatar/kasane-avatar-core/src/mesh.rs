//! Persistent per-drawable vertex buffers and renderer upload.
//!
//! The synchronizer owns the authoritative buffers; the renderer only ever
//! receives copies via `upload`. Buffers are sized once at load (vertex
//! counts never change) and rewritten in place each frame: positions and
//! alpha only. UV and RGB channels are set at load and never touched again.

use crate::backend::ModelBackend;
use crate::error::RendererError;
use crate::ids::{MeshId, TextureHandle};
use crate::renderer::{Renderer, Vertex};

#[derive(Debug)]
struct MeshSlot {
    mesh: MeshId,
    texture_slot: u32,
    vertices: Vec<Vertex>,
}

/// One fixed-size vertex buffer and renderer mesh resource per drawable.
#[derive(Debug)]
pub struct MeshSync {
    slots: Vec<MeshSlot>,
}

impl MeshSync {
    /// Allocate one renderer mesh per drawable from the backend's current
    /// state (the backend must have been updated once before this).
    pub fn new(
        backend: &dyn ModelBackend,
        renderer: &mut dyn Renderer,
    ) -> Result<Self, RendererError> {
        let mut slots = Vec::with_capacity(backend.drawable_count());
        for i in 0..backend.drawable_count() {
            let d = backend.drawable(i);
            let positions = backend.positions(i);
            let alpha = backend.opacity(i);
            let mut vertices = Vec::with_capacity(positions.len());
            for (p, uv) in positions.iter().zip(d.uvs.iter()) {
                vertices.push(Vertex {
                    x: p[0],
                    y: p[1],
                    u: uv[0],
                    v: uv[1],
                    r: 1.0,
                    g: 1.0,
                    b: 1.0,
                    a: alpha,
                });
            }
            let mesh = renderer.create_mesh(&vertices, &d.indices)?;
            slots.push(MeshSlot {
                mesh,
                texture_slot: d.texture_slot,
                vertices,
            });
        }
        Ok(Self { slots })
    }

    /// Rewrite positions and alpha in place from the backend's latest state.
    pub fn refresh(&mut self, backend: &dyn ModelBackend) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            let positions = backend.positions(i);
            let alpha = backend.opacity(i);
            for (vertex, p) in slot.vertices.iter_mut().zip(positions.iter()) {
                vertex.x = p[0];
                vertex.y = p[1];
                vertex.a = alpha;
            }
        }
    }

    /// Push every buffer to its renderer mesh resource.
    pub fn upload(&self, renderer: &mut dyn Renderer) -> Result<(), RendererError> {
        for slot in &self.slots {
            renderer.upload_vertices(slot.mesh, &slot.vertices)?;
        }
        Ok(())
    }

    /// Bind `texture` to every mesh using the given model texture slot.
    pub fn bind_texture(
        &self,
        renderer: &mut dyn Renderer,
        texture_slot: u32,
        texture: TextureHandle,
    ) {
        for slot in &self.slots {
            if slot.texture_slot == texture_slot {
                renderer.bind_texture(slot.mesh, texture);
            }
        }
    }

    #[inline]
    pub fn mesh(&self, drawable: usize) -> MeshId {
        self.slots[drawable].mesh
    }

    /// Authoritative vertex data for one drawable (read-only).
    pub fn vertices(&self, drawable: usize) -> &[Vertex] {
        &self.slots[drawable].vertices
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
