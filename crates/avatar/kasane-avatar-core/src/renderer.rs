//! Abstract renderer resource interface.
//!
//! The host implements [`Renderer`] over its own graphics stack; the core
//! only ever hands it copies of buffers it owns (`MeshSync` keeps the
//! authoritative vertex data). Global blend/stencil state is mutated during
//! `Avatar::draw` and restored before the call returns.

use serde::{Deserialize, Serialize};

use crate::error::RendererError;
use crate::ids::{MeshId, TextureHandle};

/// Interleaved vertex as uploaded to the renderer. UV and RGB channels are
/// written once at load; per-frame updates touch only x, y and a.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
    pub u: f32,
    pub v: f32,
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// Per-drawable blend mode. Each maps to a fixed source/destination
/// blend-factor pair, see [`BlendMode::factors`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlendMode {
    #[default]
    Normal,
    Additive,
    Multiplicative,
}

/// Fixed-function blend factors a host maps onto its graphics API.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstColor,
}

impl BlendMode {
    /// The (source, destination) factor pair for this mode.
    pub fn factors(self) -> (BlendFactor, BlendFactor) {
        match self {
            BlendMode::Normal => (BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha),
            BlendMode::Additive => (BlendFactor::SrcAlpha, BlendFactor::One),
            BlendMode::Multiplicative => (BlendFactor::DstColor, BlendFactor::OneMinusSrcAlpha),
        }
    }
}

/// 2D affine draw transform: position, rotation, scale, origin offset, shear.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform2D {
    pub x: f32,
    pub y: f32,
    /// Rotation in radians.
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub origin_x: f32,
    pub origin_y: f32,
    pub shear_x: f32,
    pub shear_y: f32,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            origin_x: 0.0,
            origin_y: 0.0,
            shear_x: 0.0,
            shear_y: 0.0,
        }
    }
}

impl Transform2D {
    /// Identity transform at the given position.
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            ..Self::default()
        }
    }
}

/// Stencil comparison applied to subsequent draw calls.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StencilTest {
    Disabled,
    /// Pass where the stencil value is >= the given count.
    AtLeast(u32),
}

/// Host renderer capability surface.
///
/// Mask passes use increment semantics: between `begin_mask_pass` and
/// `end_mask_pass`, draw calls increment the stencil buffer wherever the
/// fragment alpha reaches the given threshold (fragments below it are
/// discarded). The active shader swap implied by the pass is the host's
/// concern and must not leak out of the begin/end bracket.
pub trait Renderer {
    /// Allocate a mesh resource with fixed topology; the vertex count never
    /// changes afterwards.
    fn create_mesh(&mut self, vertices: &[Vertex], indices: &[u16])
        -> Result<MeshId, RendererError>;

    /// Overwrite the full vertex buffer of an existing mesh.
    fn upload_vertices(&mut self, mesh: MeshId, vertices: &[Vertex]) -> Result<(), RendererError>;

    fn bind_texture(&mut self, mesh: MeshId, texture: TextureHandle);

    fn draw_mesh(&mut self, mesh: MeshId, transform: &Transform2D);

    fn blend_mode(&self) -> BlendMode;

    fn set_blend_mode(&mut self, mode: BlendMode);

    fn begin_mask_pass(&mut self, alpha_threshold: f32) -> Result<(), RendererError>;

    fn end_mask_pass(&mut self);

    fn set_stencil_test(&mut self, test: StencilTest);

    fn clear_stencil(&mut self);
}
