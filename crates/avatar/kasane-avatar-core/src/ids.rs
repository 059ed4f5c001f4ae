//! Opaque handles shared with the host renderer.
//!
//! Drawables and parts are addressed by plain `usize` indices (index-stable
//! for the model lifetime); only renderer-owned resources get newtypes.

use serde::{Deserialize, Serialize};

/// Handle of a mesh resource allocated by the renderer. Allocation is the
/// renderer's concern; the core only stores and passes these back.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct MeshId(pub u32);

/// Handle of a host-owned texture bound to one or more meshes. The core never
/// loads or frees textures.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct TextureHandle(pub u64);
