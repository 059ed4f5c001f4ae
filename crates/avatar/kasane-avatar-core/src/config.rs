//! Core configuration for kasane-avatar-core.

use serde::{Deserialize, Serialize};

/// How a drawable's stencil test combines multiple mask references.
///
/// The two variants reproduce the two behaviors observed across model
/// generations; see DESIGN.md for why `All` is the default.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaskCombine {
    /// Pass only where every referenced mask covered the pixel
    /// (stencil >= direct mask count).
    All,
    /// Pass where any referenced mask covered the pixel (stencil >= 1).
    Any,
}

/// Configuration for masking behavior and idle-animation tuning.
/// Keep this minimal; expand as needed without breaking API.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Stencil combine rule for drawables with more than one mask reference.
    pub mask_combine: MaskCombine,
    /// Fragments below this alpha are discarded during mask passes.
    pub mask_alpha_threshold: f32,
    /// Maximum mask nesting depth accepted at model load.
    pub max_mask_depth: usize,
    /// Fade-in applied when switching expressions, in seconds.
    pub expression_fade_in: f32,
    /// Seed for the eye-blink interval jitter (deterministic per instance).
    pub blink_seed: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mask_combine: MaskCombine::All,
            mask_alpha_threshold: 0.03,
            max_mask_depth: 32,
            expression_fade_in: 0.5,
            blink_seed: 0x6b61_7361,
        }
    }
}
