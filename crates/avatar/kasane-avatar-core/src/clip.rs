//! Stencil mask compositing for masked drawables.
//!
//! Before a masked drawable's real draw, its mask references are rendered
//! into the stencil buffer with increment semantics. Nested masks resolve by
//! explicit post-order traversal: a mask's own masks are composited before
//! the mask itself. The pass count travels by return value, which keeps the
//! traversal reentrant. Recursion depth is bounded because the mask graph is
//! validated acyclic and depth-limited at load.

use crate::backend::ModelBackend;
use crate::config::{Config, MaskCombine};
use crate::error::RendererError;
use crate::mesh::MeshSync;
use crate::renderer::{Renderer, StencilTest, Transform2D};

/// Composite all mask references of `drawable` into a cleared stencil buffer.
/// Returns the stencil test the real draw must use and the total number of
/// stencil passes issued (nested masks included).
pub fn composite(
    renderer: &mut dyn Renderer,
    meshes: &MeshSync,
    backend: &dyn ModelBackend,
    drawable: usize,
    transform: &Transform2D,
    cfg: &Config,
) -> Result<(StencilTest, u32), RendererError> {
    let masks = &backend.drawable(drawable).masks;
    renderer.clear_stencil();
    let mut passes = 0u32;
    for &mask in masks {
        passes += stencil_mask(renderer, meshes, backend, mask, transform, cfg)?;
    }
    let required = match cfg.mask_combine {
        MaskCombine::All => masks.len() as u32,
        MaskCombine::Any => 1,
    };
    Ok((StencilTest::AtLeast(required), passes))
}

/// Post-order: composite `mask`'s own masks, then draw `mask` itself into the
/// stencil. Returns the number of passes issued for this subtree.
fn stencil_mask(
    renderer: &mut dyn Renderer,
    meshes: &MeshSync,
    backend: &dyn ModelBackend,
    mask: usize,
    transform: &Transform2D,
    cfg: &Config,
) -> Result<u32, RendererError> {
    let mut passes = 0u32;
    for &nested in &backend.drawable(mask).masks {
        passes += stencil_mask(renderer, meshes, backend, nested, transform, cfg)?;
    }
    renderer.begin_mask_pass(cfg.mask_alpha_threshold)?;
    renderer.draw_mesh(meshes.mesh(mask), transform);
    renderer.end_mask_pass();
    Ok(passes + 1)
}
