//! A renderer test double that records every call and keeps uploaded vertex
//! buffers for inspection.

use std::collections::HashMap;

use kasane_avatar_core::{
    BlendMode, MeshId, Renderer, RendererError, StencilTest, TextureHandle, Transform2D, Vertex,
};

/// One recorded renderer call.
#[derive(Clone, Debug, PartialEq)]
pub enum RenderEvent {
    CreateMesh {
        mesh: MeshId,
        vertices: usize,
        indices: usize,
    },
    UploadVertices {
        mesh: MeshId,
    },
    BindTexture {
        mesh: MeshId,
        texture: TextureHandle,
    },
    DrawMesh {
        mesh: MeshId,
        /// True when the draw happened inside a mask pass bracket.
        in_mask_pass: bool,
    },
    SetBlendMode(BlendMode),
    BeginMaskPass {
        threshold: f32,
    },
    EndMaskPass,
    SetStencilTest(StencilTest),
    ClearStencil,
}

/// Recording [`Renderer`] implementation used across integration tests.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    pub events: Vec<RenderEvent>,
    /// Latest uploaded vertex buffer per mesh.
    pub vertex_buffers: HashMap<MeshId, Vec<Vertex>>,
    /// When set, the next `create_mesh` fails (resource exhaustion path).
    pub fail_next_mesh: bool,
    blend: BlendMode,
    next_mesh: u32,
    in_mask_pass: bool,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count<F: Fn(&RenderEvent) -> bool>(&self, pred: F) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    /// Number of stencil mask passes issued so far.
    pub fn mask_passes(&self) -> usize {
        self.count(|e| matches!(e, RenderEvent::BeginMaskPass { .. }))
    }

    /// Number of blend-mode changes issued so far.
    pub fn blend_switches(&self) -> usize {
        self.count(|e| matches!(e, RenderEvent::SetBlendMode(_)))
    }

    /// Meshes drawn outside mask passes, in call order.
    pub fn drawn_meshes(&self) -> Vec<MeshId> {
        self.events
            .iter()
            .filter_map(|e| match e {
                RenderEvent::DrawMesh {
                    mesh,
                    in_mask_pass: false,
                } => Some(*mesh),
                _ => None,
            })
            .collect()
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }
}

impl Renderer for RecordingRenderer {
    fn create_mesh(
        &mut self,
        vertices: &[Vertex],
        indices: &[u16],
    ) -> Result<MeshId, RendererError> {
        if self.fail_next_mesh {
            self.fail_next_mesh = false;
            return Err(RendererError::MeshAllocation("simulated exhaustion".into()));
        }
        let mesh = MeshId(self.next_mesh);
        self.next_mesh += 1;
        self.events.push(RenderEvent::CreateMesh {
            mesh,
            vertices: vertices.len(),
            indices: indices.len(),
        });
        self.vertex_buffers.insert(mesh, vertices.to_vec());
        Ok(mesh)
    }

    fn upload_vertices(&mut self, mesh: MeshId, vertices: &[Vertex]) -> Result<(), RendererError> {
        self.events.push(RenderEvent::UploadVertices { mesh });
        self.vertex_buffers.insert(mesh, vertices.to_vec());
        Ok(())
    }

    fn bind_texture(&mut self, mesh: MeshId, texture: TextureHandle) {
        self.events.push(RenderEvent::BindTexture { mesh, texture });
    }

    fn draw_mesh(&mut self, mesh: MeshId, _transform: &Transform2D) {
        self.events.push(RenderEvent::DrawMesh {
            mesh,
            in_mask_pass: self.in_mask_pass,
        });
    }

    fn blend_mode(&self) -> BlendMode {
        self.blend
    }

    fn set_blend_mode(&mut self, mode: BlendMode) {
        self.blend = mode;
        self.events.push(RenderEvent::SetBlendMode(mode));
    }

    fn begin_mask_pass(&mut self, alpha_threshold: f32) -> Result<(), RendererError> {
        self.in_mask_pass = true;
        self.events.push(RenderEvent::BeginMaskPass {
            threshold: alpha_threshold,
        });
        Ok(())
    }

    fn end_mask_pass(&mut self) {
        self.in_mask_pass = false;
        self.events.push(RenderEvent::EndMaskPass);
    }

    fn set_stencil_test(&mut self, test: StencilTest) {
        self.events.push(RenderEvent::SetStencilTest(test));
    }

    fn clear_stencil(&mut self) {
        self.events.push(RenderEvent::ClearStencil);
    }
}
