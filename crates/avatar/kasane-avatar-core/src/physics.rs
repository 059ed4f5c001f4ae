//! Pendulum physics over the parameter vector.
//!
//! Each setting is an independent damped pendulum whose rest direction is
//! tilted by weighted input parameters (degrees); the swing angle is written
//! back to output parameters every frame. Integration is fixed-substep Euler
//! so large frame deltas stay stable.

use crate::data::PhysicsData;
use crate::error::AvatarError;
use crate::param::ParamStore;

const GRAVITY: f32 = 9.8;
/// Integration substep ceiling, seconds.
const MAX_STEP: f32 = 1.0 / 120.0;
/// Frame deltas above this are truncated before integration.
const MAX_FRAME: f32 = 0.1;

#[derive(Debug, Default, Clone, Copy)]
struct Pendulum {
    /// Swing angle in radians.
    angle: f32,
    velocity: f32,
}

/// Physics solver state bound to parameter indices at load.
#[derive(Debug)]
pub struct PhysicsRig {
    data: PhysicsData,
    inputs: Vec<Vec<usize>>,
    outputs: Vec<Vec<usize>>,
    states: Vec<Pendulum>,
}

impl PhysicsRig {
    /// Bind a validated definition to the store; unknown parameter ids are a
    /// load error.
    pub fn new(data: PhysicsData, params: &ParamStore) -> Result<Self, AvatarError> {
        data.validate_basic().map_err(AvatarError::AssetLoad)?;
        let mut inputs = Vec::with_capacity(data.settings.len());
        let mut outputs = Vec::with_capacity(data.settings.len());
        for setting in &data.settings {
            let resolve = |id: &str| {
                params.try_index_of(id).ok_or_else(|| {
                    AvatarError::AssetLoad(format!("physics references unknown parameter '{id}'"))
                })
            };
            inputs.push(
                setting
                    .inputs
                    .iter()
                    .map(|i| resolve(&i.param))
                    .collect::<Result<Vec<_>, _>>()?,
            );
            outputs.push(
                setting
                    .outputs
                    .iter()
                    .map(|o| resolve(&o.param))
                    .collect::<Result<Vec<_>, _>>()?,
            );
        }
        let states = vec![Pendulum::default(); data.settings.len()];
        log::debug!("physics rig loaded: {} settings", data.settings.len());
        Ok(Self {
            data,
            inputs,
            outputs,
            states,
        })
    }

    /// Integrate all pendulums by `dt` and write output parameters.
    pub fn update(&mut self, dt: f32, params: &mut ParamStore) {
        let dt = dt.clamp(0.0, MAX_FRAME);
        if dt <= 0.0 {
            return;
        }
        for (si, setting) in self.data.settings.iter().enumerate() {
            let mut tilt = 0.0f32;
            for (input, &idx) in setting.inputs.iter().zip(&self.inputs[si]) {
                tilt += params.value_at(idx) * input.scale * input.weight;
            }
            let tilt = tilt.to_radians();

            let state = &mut self.states[si];
            let mut remaining = dt;
            while remaining > 0.0 {
                let h = remaining.min(MAX_STEP);
                let accel = -(GRAVITY / setting.length) * (state.angle - tilt).sin()
                    - setting.damping * state.velocity;
                state.velocity += accel * h;
                state.angle += state.velocity * h;
                remaining -= h;
            }

            let swing = state.angle.to_degrees();
            for (output, &idx) in setting.outputs.iter().zip(&self.outputs[si]) {
                params.set_at(idx, swing * output.scale, output.weight);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ParameterDef, PhysicsInput, PhysicsOutput, PhysicsSetting};

    fn params() -> ParamStore {
        ParamStore::new(&[
            ParameterDef {
                id: "ParamAngleX".into(),
                min: -30.0,
                max: 30.0,
                default: 0.0,
            },
            ParameterDef {
                id: "ParamHairFront".into(),
                min: -30.0,
                max: 30.0,
                default: 0.0,
            },
        ])
    }

    fn rig_data() -> PhysicsData {
        PhysicsData {
            settings: vec![PhysicsSetting {
                length: 0.5,
                damping: 2.0,
                inputs: vec![PhysicsInput {
                    param: "ParamAngleX".into(),
                    scale: 1.0,
                    weight: 1.0,
                }],
                outputs: vec![PhysicsOutput {
                    param: "ParamHairFront".into(),
                    scale: 1.0,
                    weight: 1.0,
                }],
            }],
        }
    }

    #[test]
    fn unknown_parameter_fails_load() {
        let params = params();
        let mut data = rig_data();
        data.settings[0].outputs[0].param = "Nope".into();
        assert!(matches!(
            PhysicsRig::new(data, &params),
            Err(AvatarError::AssetLoad(_))
        ));
    }

    #[test]
    fn rest_state_stays_at_rest() {
        let mut params = params();
        let mut rig = PhysicsRig::new(rig_data(), &params).unwrap();
        rig.update(0.016, &mut params);
        assert_eq!(params.get("ParamHairFront").unwrap(), 0.0);
    }

    #[test]
    fn swing_converges_toward_input_tilt() {
        let mut params = params();
        let mut rig = PhysicsRig::new(rig_data(), &params).unwrap();
        params.set("ParamAngleX", 20.0, 1.0).unwrap();
        for _ in 0..600 {
            rig.update(0.016, &mut params);
        }
        let settled = params.get("ParamHairFront").unwrap();
        assert!(
            (settled - 20.0).abs() < 1.0,
            "pendulum should settle near the tilt, got {settled}"
        );
    }
}
