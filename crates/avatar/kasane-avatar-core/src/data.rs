//! Canonical decoded asset data model (model, motion, expression, physics,
//! pose). Decoding proprietary formats is an external concern; these are the
//! in-memory shapes the load operations accept. JSON helpers live in
//! `stored_model.rs`.

use serde::{Deserialize, Serialize};

use crate::renderer::BlendMode;

/// 2D control point for cubic-bezier timing (normalized 0..1 domain).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

/// Per-keypoint transitions: control points for cubic-bezier timing.
/// Use `in` (arrival to this point) and `out` (departure from this point).
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Transitions {
    #[serde(default)]
    #[serde(rename = "in")]
    pub r#in: Option<Vec2>,
    #[serde(default)]
    #[serde(rename = "out")]
    pub r#out: Option<Vec2>,
}

fn one() -> f32 {
    1.0
}

// ----- model -----

/// A named scalar animation input/output with load-time range metadata.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ParameterDef {
    pub id: String,
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

/// A part groups drawables for pose fading and draw-order tie-breaks.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PartDef {
    pub id: String,
    #[serde(default = "one")]
    pub opacity: f32,
}

/// Summed piecewise-linear vertex displacement driven by one parameter.
/// `deltas[k][v]` is the offset of vertex `v` at parameter key `k`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct VertexDeform {
    pub param: String,
    pub keys: Vec<f32>,
    pub deltas: Vec<Vec<[f32; 2]>>,
}

/// Piecewise-linear scalar binding driven by one parameter (opacity,
/// visibility, order shift).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ScalarCurve {
    pub param: String,
    pub keys: Vec<f32>,
    pub values: Vec<f32>,
}

/// One renderable mesh region. Topology (positions/uvs/indices) is fixed for
/// the model lifetime; only derived positions/opacity/order change per frame.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DrawableDef {
    pub id: String,
    #[serde(default)]
    pub part: Option<usize>,
    #[serde(default)]
    pub texture_slot: u32,
    #[serde(default)]
    pub blend_mode: BlendMode,
    pub render_order: i32,
    pub positions: Vec<[f32; 2]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u16>,
    /// Indices of drawables whose coverage clips this one (stencil pre-pass).
    #[serde(default)]
    pub masks: Vec<usize>,
    #[serde(default)]
    pub deforms: Vec<VertexDeform>,
    #[serde(default)]
    pub opacity: Option<ScalarCurve>,
    /// Visibility flag curve; values >= 0.5 mean visible. Absent = always on.
    #[serde(default)]
    pub visibility: Option<ScalarCurve>,
    /// Dynamic z offset added to `render_order` (rounded to integer).
    #[serde(default)]
    pub order_shift: Option<ScalarCurve>,
    #[serde(default = "one")]
    pub base_opacity: f32,
}

/// Canonical model description consumed by `KeyformBackend`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ModelData {
    pub name: String,
    /// Canvas width/height in model units.
    pub canvas: [f32; 2],
    pub parameters: Vec<ParameterDef>,
    #[serde(default)]
    pub parts: Vec<PartDef>,
    pub drawables: Vec<DrawableDef>,
}

impl ScalarCurve {
    fn validate(&self, what: &str, owner: &str) -> Result<(), String> {
        if self.keys.is_empty() || self.keys.len() != self.values.len() {
            return Err(format!(
                "{what} curve of '{owner}' must have equal, non-zero key/value counts"
            ));
        }
        ensure_sorted(&self.keys, what, owner)
    }
}

fn ensure_sorted(keys: &[f32], what: &str, owner: &str) -> Result<(), String> {
    let mut last = f32::NEG_INFINITY;
    for &k in keys {
        if !k.is_finite() || k < last {
            return Err(format!(
                "{what} keys of '{owner}' must be finite and non-decreasing"
            ));
        }
        last = k;
    }
    Ok(())
}

impl ModelData {
    /// Validate basic invariants: unique parameter ids with
    /// min <= default <= max, consistent drawable topology, in-range part and
    /// mask references, and an acyclic mask graph.
    pub fn validate_basic(&self) -> Result<(), String> {
        if self.canvas[0] <= 0.0 || self.canvas[1] <= 0.0 {
            return Err("canvas dimensions must be positive".into());
        }
        for (i, p) in self.parameters.iter().enumerate() {
            if !(p.min <= p.default && p.default <= p.max) {
                return Err(format!(
                    "parameter '{}' violates min <= default <= max",
                    p.id
                ));
            }
            if self.parameters[..i].iter().any(|q| q.id == p.id) {
                return Err(format!("duplicate parameter id '{}'", p.id));
            }
        }
        for d in &self.drawables {
            let n = d.positions.len();
            if n == 0 {
                return Err(format!("drawable '{}' has no vertices", d.id));
            }
            if d.uvs.len() != n {
                return Err(format!("drawable '{}' uv count != vertex count", d.id));
            }
            if d.indices.is_empty() || d.indices.len() % 3 != 0 {
                return Err(format!(
                    "drawable '{}' index count must be a positive multiple of 3",
                    d.id
                ));
            }
            if d.indices.iter().any(|&ix| ix as usize >= n) {
                return Err(format!("drawable '{}' has out-of-range indices", d.id));
            }
            if let Some(part) = d.part {
                if part >= self.parts.len() {
                    return Err(format!("drawable '{}' references unknown part", d.id));
                }
            }
            for deform in &d.deforms {
                if deform.keys.is_empty() || deform.keys.len() != deform.deltas.len() {
                    return Err(format!(
                        "deform on '{}' must have equal, non-zero key/delta counts",
                        d.id
                    ));
                }
                ensure_sorted(&deform.keys, "deform", &d.id)?;
                if deform.deltas.iter().any(|row| row.len() != n) {
                    return Err(format!(
                        "deform on '{}' has delta rows not matching vertex count",
                        d.id
                    ));
                }
            }
            if let Some(c) = &d.opacity {
                c.validate("opacity", &d.id)?;
            }
            if let Some(c) = &d.visibility {
                c.validate("visibility", &d.id)?;
            }
            if let Some(c) = &d.order_shift {
                c.validate("order-shift", &d.id)?;
            }
        }
        self.validate_masks()
    }

    /// Mask references must stay in range, never self-reference, and form an
    /// acyclic graph (cycles would make the stencil traversal unbounded).
    fn validate_masks(&self) -> Result<(), String> {
        let n = self.drawables.len();
        for (i, d) in self.drawables.iter().enumerate() {
            for &m in &d.masks {
                if m >= n {
                    return Err(format!("drawable '{}' has out-of-range mask reference", d.id));
                }
                if m == i {
                    return Err(format!("drawable '{}' masks itself", d.id));
                }
            }
        }
        // Iterative three-color DFS over the mask graph.
        const WHITE: u8 = 0;
        const GRAY: u8 = 1;
        const BLACK: u8 = 2;
        let mut color = vec![WHITE; n];
        for start in 0..n {
            if color[start] != WHITE {
                continue;
            }
            let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
            color[start] = GRAY;
            while let Some((node, next)) = stack.pop() {
                let masks = &self.drawables[node].masks;
                if next < masks.len() {
                    let m = masks[next];
                    stack.push((node, next + 1));
                    match color[m] {
                        WHITE => {
                            color[m] = GRAY;
                            stack.push((m, 0));
                        }
                        GRAY => {
                            return Err(format!(
                                "mask reference cycle through drawable '{}'",
                                self.drawables[m].id
                            ));
                        }
                        _ => {}
                    }
                } else {
                    color[node] = BLACK;
                }
            }
        }
        Ok(())
    }

    /// Longest mask nesting chain, used to enforce `Config::max_mask_depth`.
    /// Assumes `validate_masks` passed (the graph is acyclic).
    pub fn mask_depth(&self) -> usize {
        fn depth(drawables: &[DrawableDef], i: usize, memo: &mut [Option<usize>]) -> usize {
            if let Some(d) = memo[i] {
                return d;
            }
            let d = drawables[i]
                .masks
                .iter()
                .map(|&m| 1 + depth(drawables, m, memo))
                .max()
                .unwrap_or(0);
            memo[i] = Some(d);
            d
        }
        let mut memo = vec![None; self.drawables.len()];
        (0..self.drawables.len())
            .map(|i| depth(&self.drawables, i, &mut memo))
            .max()
            .unwrap_or(0)
    }
}

// ----- motion -----

/// A single keypoint in normalized time [0..1].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Keypoint {
    /// Normalized time in [0,1] within the clip duration.
    pub stamp: f32,
    pub value: f32,
    #[serde(default)]
    pub transitions: Option<Transitions>,
}

/// A time-indexed curve over one parameter.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MotionTrack {
    pub param: String,
    pub points: Vec<Keypoint>,
}

/// A named motion clip played by the motion player.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MotionData {
    pub name: String,
    /// Duration in milliseconds (authoritative for mapping normalized stamps).
    #[serde(rename = "duration")]
    pub duration_ms: u32,
    /// Fade-in/out in seconds; the load operation may override these.
    #[serde(default)]
    pub fade_in: f32,
    #[serde(default)]
    pub fade_out: f32,
    pub tracks: Vec<MotionTrack>,
}

impl MotionData {
    /// Validate basic invariants (monotonic stamps in [0,1], non-zero duration).
    pub fn validate_basic(&self) -> Result<(), String> {
        if self.duration_ms == 0 {
            return Err("MotionData.duration must be > 0 ms".into());
        }
        if !self.fade_in.is_finite() || self.fade_in < 0.0 {
            return Err("MotionData.fade_in must be finite and >= 0".into());
        }
        if !self.fade_out.is_finite() || self.fade_out < 0.0 {
            return Err("MotionData.fade_out must be finite and >= 0".into());
        }
        for track in &self.tracks {
            let mut last = -f32::INFINITY;
            for p in &track.points {
                if !p.stamp.is_finite() || p.stamp < 0.0 || p.stamp > 1.0 {
                    return Err(format!(
                        "keypoint stamp must be in [0,1] and finite for '{}'",
                        track.param
                    ));
                }
                if p.stamp < last {
                    return Err(format!(
                        "keypoint stamps must be non-decreasing for '{}'",
                        track.param
                    ));
                }
                last = p.stamp;
            }
        }
        Ok(())
    }
}

// ----- expression -----

/// One additive parameter offset of an expression.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExpressionEntry {
    pub param: String,
    pub delta: f32,
}

/// A named, static parameter delta set applied independently of motion
/// playback.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExpressionData {
    pub entries: Vec<ExpressionEntry>,
}

impl ExpressionData {
    pub fn validate_basic(&self) -> Result<(), String> {
        for e in &self.entries {
            if !e.delta.is_finite() {
                return Err(format!("expression delta for '{}' must be finite", e.param));
            }
        }
        Ok(())
    }
}

// ----- physics -----

/// Parameter contribution to a pendulum's target tilt, in degrees.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PhysicsInput {
    pub param: String,
    pub scale: f32,
    #[serde(default = "one")]
    pub weight: f32,
}

/// Parameter written from a pendulum's swing angle, in degrees.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PhysicsOutput {
    pub param: String,
    pub scale: f32,
    #[serde(default = "one")]
    pub weight: f32,
}

/// One damped pendulum driven by input parameters.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PhysicsSetting {
    /// Pendulum arm length in model units.
    pub length: f32,
    /// Angular velocity damping per second.
    pub damping: f32,
    pub inputs: Vec<PhysicsInput>,
    pub outputs: Vec<PhysicsOutput>,
}

/// A physics rig definition: independent pendulums over the parameter vector.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PhysicsData {
    pub settings: Vec<PhysicsSetting>,
}

impl PhysicsData {
    pub fn validate_basic(&self) -> Result<(), String> {
        for (i, s) in self.settings.iter().enumerate() {
            if !(s.length.is_finite() && s.length > 0.0) {
                return Err(format!("physics setting {i} needs a positive length"));
            }
            if !(s.damping.is_finite() && s.damping >= 0.0) {
                return Err(format!("physics setting {i} needs non-negative damping"));
            }
        }
        Ok(())
    }
}

// ----- pose -----

/// One part of a mutual-exclusion group. The driving parameter defaults to
/// the part id when absent.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PosePart {
    pub part: String,
    #[serde(default)]
    pub param: Option<String>,
}

/// Mutual-exclusion opacity groups across parts.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PoseData {
    /// Cross-fade time in seconds when the visible part of a group changes.
    #[serde(default = "default_fade_time")]
    pub fade_time: f32,
    pub groups: Vec<Vec<PosePart>>,
}

fn default_fade_time() -> f32 {
    0.5
}

impl PoseData {
    pub fn validate_basic(&self) -> Result<(), String> {
        if !self.fade_time.is_finite() || self.fade_time < 0.0 {
            return Err("PoseData.fade_time must be finite and >= 0".into());
        }
        for (i, group) in self.groups.iter().enumerate() {
            if group.is_empty() {
                return Err(format!("pose group {i} is empty"));
            }
        }
        Ok(())
    }
}
