//! Avatar: one model instance and its per-frame evaluation pipeline.
//!
//! The modulator order encodes the priority rules between animation sources
//! writing to the same parameters. It is an explicit, named constant
//! ([`EVAL_ORDER`]) driving `update`, not implicit call-order coupling.

use crate::backend::ModelBackend;
use crate::breath::BreathController;
use crate::clip;
use crate::config::Config;
use crate::data::{ExpressionData, ModelData, MotionData, PhysicsData, PoseData};
use crate::error::AvatarError;
use crate::expression::ExpressionPlayer;
use crate::eye_blink::{EyeBlink, DEFAULT_EYE_PARAMS};
use crate::ids::TextureHandle;
use crate::keyform::KeyformBackend;
use crate::mesh::MeshSync;
use crate::motion::{MotionPlayer, PlayMode};
use crate::order;
use crate::param::ParamStore;
use crate::physics::PhysicsRig;
use crate::pose::PoseController;
use crate::renderer::{BlendMode, Renderer, StencilTest, Transform2D};

/// One stage of the per-frame evaluation pipeline.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Snapshot bracket + motion curves (+ eye-blink when the player is idle).
    Motion,
    /// Additive expression deltas.
    Expression,
    /// Breath oscillator and physics (only while movement is enabled).
    Movement,
    /// Part opacity groups.
    Pose,
    /// Deferred parameter sets (caller overrides win over procedural writes).
    Deferred,
    /// Backend recompute, mesh rewrite, draw-order resolve.
    ModelUpdate,
}

/// Fixed evaluation order of the modulator pipeline.
pub const EVAL_ORDER: [Stage; 6] = [
    Stage::Motion,
    Stage::Expression,
    Stage::Movement,
    Stage::Pose,
    Stage::Deferred,
    Stage::ModelUpdate,
];

/// The elapsed-time clock wraps after one year.
const ELAPSED_WRAP: f64 = 31_536_000.0;

/// A loaded model instance: parameter store, backend, mesh buffers, and the
/// animation subsystems. Single-threaded; one `update` + `draw` per frame.
pub struct Avatar {
    cfg: Config,
    backend: Box<dyn ModelBackend>,
    params: ParamStore,
    meshes: MeshSync,
    draw_order: Vec<usize>,
    motion: MotionPlayer,
    expression: ExpressionPlayer,
    breath: BreathController,
    eye_blink: EyeBlink,
    physics: Option<PhysicsRig>,
    pose: Option<PoseController>,
    /// Elapsed-time clock driving the breath oscillator.
    elapsed: f64,
    movement_enabled: bool,
    eye_blink_enabled: bool,
}

impl Avatar {
    /// Build an instance over an arbitrary backend. Allocates one renderer
    /// mesh per drawable; validates the mask graph against the config.
    pub fn new(
        mut backend: Box<dyn ModelBackend>,
        renderer: &mut dyn Renderer,
        cfg: Config,
    ) -> Result<Self, AvatarError> {
        validate_mask_graph(&*backend, cfg.max_mask_depth)?;
        let params = ParamStore::new(backend.parameters());
        backend.update(params.values());
        let meshes = MeshSync::new(&*backend, renderer)?;
        let mut draw_order = Vec::with_capacity(backend.drawable_count());
        order::resolve(&*backend, &mut draw_order);

        let mut breath = BreathController::with_defaults();
        breath.bind(&params);
        let mut eye_blink = EyeBlink::new(cfg.blink_seed);
        eye_blink.bind(&params, &DEFAULT_EYE_PARAMS);

        let expression = ExpressionPlayer::new(cfg.expression_fade_in);
        log::debug!(
            "avatar ready: {} drawables, {} parameters",
            backend.drawable_count(),
            params.len()
        );
        Ok(Self {
            cfg,
            backend,
            params,
            meshes,
            draw_order,
            motion: MotionPlayer::default(),
            expression,
            breath,
            eye_blink,
            physics: None,
            pose: None,
            elapsed: 0.0,
            movement_enabled: true,
            eye_blink_enabled: true,
        })
    }

    /// Convenience: build over the canonical keyform backend.
    pub fn from_model(
        data: ModelData,
        renderer: &mut dyn Renderer,
        cfg: Config,
    ) -> Result<Self, AvatarError> {
        let backend = KeyformBackend::new(data)?;
        Self::new(Box::new(backend), renderer, cfg)
    }

    // ----- per-frame -----

    /// Advance all animation sources by `dt` seconds and recompute drawable
    /// state. Runs the pipeline stages in [`EVAL_ORDER`].
    pub fn update(&mut self, dt: f32) {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        self.elapsed = (self.elapsed + dt as f64) % ELAPSED_WRAP;

        for stage in EVAL_ORDER {
            match stage {
                Stage::Motion => {
                    // The restore/save bracket runs even with no motion
                    // active, so later stages never accumulate across frames.
                    self.params.restore();
                    let wrote = self.motion.update(dt, &mut self.params);
                    if !wrote && self.movement_enabled && self.eye_blink_enabled {
                        self.eye_blink.update(dt, &mut self.params);
                    }
                    self.params.save();
                }
                Stage::Expression => self.expression.update(dt, &mut self.params),
                Stage::Movement => {
                    if self.movement_enabled {
                        self.breath.update(self.elapsed, &mut self.params);
                        if let Some(physics) = self.physics.as_mut() {
                            physics.update(dt, &mut self.params);
                        }
                    }
                }
                Stage::Pose => {
                    if let Some(pose) = &self.pose {
                        pose.update(dt, &self.params, &mut *self.backend);
                    }
                }
                Stage::Deferred => self.params.flush_deferred(),
                Stage::ModelUpdate => {
                    self.backend.update(self.params.values());
                    self.meshes.refresh(&*self.backend);
                    order::resolve(&*self.backend, &mut self.draw_order);
                }
            }
        }
    }

    /// Upload the current vertex buffers and draw every drawable in resolved
    /// order, compositing clip masks and switching blend modes as needed.
    /// Global blend state is restored and the stencil test disabled before
    /// returning, also on failure.
    pub fn draw(
        &mut self,
        renderer: &mut dyn Renderer,
        transform: &Transform2D,
    ) -> Result<(), AvatarError> {
        self.meshes.upload(renderer)?;
        let restore_blend = renderer.blend_mode();
        let mut current_blend = restore_blend;
        let result = self.draw_pass(renderer, transform, &mut current_blend);
        if result.is_err() {
            // A failed pass may leave a stencil test behind.
            renderer.set_stencil_test(StencilTest::Disabled);
        }
        if current_blend != restore_blend {
            renderer.set_blend_mode(restore_blend);
        }
        result.map_err(AvatarError::from)
    }

    fn draw_pass(
        &self,
        renderer: &mut dyn Renderer,
        transform: &Transform2D,
        current_blend: &mut BlendMode,
    ) -> Result<(), crate::error::RendererError> {
        for &i in &self.draw_order {
            let drawable = self.backend.drawable(i);
            let masked = !drawable.masks.is_empty();
            if masked {
                let (test, _passes) = clip::composite(
                    renderer,
                    &self.meshes,
                    &*self.backend,
                    i,
                    transform,
                    &self.cfg,
                )?;
                renderer.set_stencil_test(test);
            }
            // Only re-issue the blend mode when it actually changes.
            if drawable.blend_mode != *current_blend {
                renderer.set_blend_mode(drawable.blend_mode);
                *current_blend = drawable.blend_mode;
            }
            renderer.draw_mesh(self.meshes.mesh(i), transform);
            if masked {
                renderer.set_stencil_test(StencilTest::Disabled);
            }
        }
        Ok(())
    }

    // ----- parameters -----

    pub fn set_parameter(&mut self, id: &str, value: f32, weight: f32) -> Result<(), AvatarError> {
        self.params.set(id, value, weight)
    }

    /// Queue a parameter set applied after the procedural stages of the next
    /// `update` (caller overrides win within that frame). At most one entry
    /// per id is kept; the last call wins.
    pub fn set_parameter_deferred(
        &mut self,
        id: &str,
        value: f32,
        weight: f32,
    ) -> Result<(), AvatarError> {
        self.params.set_deferred(id, value, weight)
    }

    pub fn add_parameter(&mut self, id: &str, delta: f32, weight: f32) -> Result<(), AvatarError> {
        self.params.add(id, delta, weight)
    }

    pub fn multiply_parameter(
        &mut self,
        id: &str,
        factor: f32,
        weight: f32,
    ) -> Result<(), AvatarError> {
        self.params.multiply(id, factor, weight)
    }

    pub fn parameter(&self, id: &str) -> Result<f32, AvatarError> {
        self.params.get(id)
    }

    // ----- motions and expressions -----

    /// Register a motion under `name`, replacing any prior definition.
    /// `fade` is the (fade-in, fade-out) pair in seconds.
    pub fn load_motion(
        &mut self,
        name: &str,
        fade: (f32, f32),
        data: MotionData,
    ) -> Result<(), AvatarError> {
        data.validate_basic().map_err(AvatarError::AssetLoad)?;
        self.motion.load(name, fade, data);
        Ok(())
    }

    pub fn set_motion(&mut self, name: &str, mode: PlayMode) -> Result<(), AvatarError> {
        self.motion.start(name, mode)
    }

    pub fn clear_motion(&mut self) {
        self.motion.clear();
    }

    pub fn motion_names(&self) -> Vec<&str> {
        self.motion.names()
    }

    /// Name of the motion currently playing, if any.
    pub fn active_motion(&self) -> Option<&str> {
        self.motion.active_name()
    }

    pub fn load_expression(&mut self, name: &str, data: ExpressionData) -> Result<(), AvatarError> {
        data.validate_basic().map_err(AvatarError::AssetLoad)?;
        self.expression.load(name, data);
        Ok(())
    }

    pub fn set_expression(&mut self, name: &str) -> Result<(), AvatarError> {
        self.expression.set(name)
    }

    pub fn clear_expression(&mut self) {
        self.expression.clear();
    }

    pub fn expression_names(&self) -> Vec<&str> {
        self.expression.names()
    }

    /// Name of the active expression, if any.
    pub fn active_expression(&self) -> Option<&str> {
        self.expression.active_name()
    }

    // ----- physics and pose -----

    /// Install a physics rig, replacing any prior one.
    pub fn load_physics(&mut self, data: PhysicsData) -> Result<(), AvatarError> {
        self.physics = Some(PhysicsRig::new(data, &self.params)?);
        Ok(())
    }

    /// Install pose constraints, replacing any prior ones.
    pub fn load_pose(&mut self, data: PoseData) -> Result<(), AvatarError> {
        self.pose = Some(PoseController::new(&data, &self.params, &*self.backend)?);
        Ok(())
    }

    // ----- toggles and introspection -----

    /// Enable/disable movement animation (breath, physics, and the eye-blink
    /// gate).
    pub fn set_movement_enabled(&mut self, enabled: bool) {
        self.movement_enabled = enabled;
    }

    pub fn movement_enabled(&self) -> bool {
        self.movement_enabled
    }

    pub fn set_eye_blink_enabled(&mut self, enabled: bool) {
        self.eye_blink_enabled = enabled;
    }

    pub fn eye_blink_enabled(&self) -> bool {
        self.eye_blink_enabled
    }

    /// Bind a host texture to every mesh on the given model texture slot.
    pub fn set_texture(
        &mut self,
        renderer: &mut dyn Renderer,
        texture_slot: u32,
        texture: TextureHandle,
    ) {
        self.meshes.bind_texture(renderer, texture_slot, texture);
    }

    /// Canvas width/height in model units.
    pub fn canvas_size(&self) -> [f32; 2] {
        self.backend.canvas_size()
    }

    /// Draw order resolved by the last `update` (drawable indices).
    pub fn draw_order(&self) -> &[usize] {
        &self.draw_order
    }

    /// Authoritative vertex data for one drawable (read-only).
    pub fn vertices(&self, drawable: usize) -> &[crate::renderer::Vertex] {
        self.meshes.vertices(drawable)
    }

    pub fn drawable_count(&self) -> usize {
        self.backend.drawable_count()
    }
}

/// Mask references must be in range and acyclic, and nesting must stay under
/// `max_depth`. Runs against the trait so every backend generation is
/// covered.
fn validate_mask_graph(backend: &dyn ModelBackend, max_depth: usize) -> Result<(), AvatarError> {
    let n = backend.drawable_count();
    for i in 0..n {
        for &m in &backend.drawable(i).masks {
            if m >= n {
                return Err(AvatarError::AssetLoad(format!(
                    "drawable {i} has out-of-range mask reference {m}"
                )));
            }
        }
    }
    // depth[i]: longest chain below i; usize::MAX marks "in progress".
    let mut depth: Vec<Option<usize>> = vec![None; n];
    for start in 0..n {
        let d = mask_depth(backend, start, &mut depth)?;
        if d > max_depth {
            return Err(AvatarError::AssetLoad(format!(
                "mask nesting depth {d} exceeds configured maximum {max_depth}"
            )));
        }
    }
    Ok(())
}

fn mask_depth(
    backend: &dyn ModelBackend,
    node: usize,
    depth: &mut Vec<Option<usize>>,
) -> Result<usize, AvatarError> {
    match depth[node] {
        Some(usize::MAX) => {
            return Err(AvatarError::AssetLoad(format!(
                "mask reference cycle through drawable {node}"
            )))
        }
        Some(d) => return Ok(d),
        None => {}
    }
    depth[node] = Some(usize::MAX);
    let mut longest = 0;
    for &m in &backend.drawable(node).masks {
        longest = longest.max(1 + mask_depth(backend, m, depth)?);
    }
    depth[node] = Some(longest);
    Ok(longest)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// it should keep the modulator priority order stable
    #[test]
    fn eval_order_is_the_documented_constant() {
        assert_eq!(
            EVAL_ORDER,
            [
                Stage::Motion,
                Stage::Expression,
                Stage::Movement,
                Stage::Pose,
                Stage::Deferred,
                Stage::ModelUpdate,
            ]
        );
    }
}
