//! Breath oscillator: sinusoidal idle offsets over the wrapped elapsed-time
//! clock. Offsets are applied with `add`, so the motion stage's snapshot
//! bracket keeps them from accumulating across frames.

use std::f64::consts::TAU;

use crate::param::ParamStore;

/// One sinusoidal channel: `bias + amplitude * sin(tau * t / period + phase)`,
/// applied to `param` with `weight`.
#[derive(Clone, Debug)]
pub struct BreathChannel {
    pub param: String,
    pub bias: f32,
    pub amplitude: f32,
    /// Cycle length in seconds.
    pub period: f32,
    pub phase: f32,
    pub weight: f32,
}

impl BreathChannel {
    fn new(param: &str, bias: f32, amplitude: f32, period: f32, weight: f32) -> Self {
        Self {
            param: param.to_string(),
            bias,
            amplitude,
            period,
            phase: 0.0,
            weight,
        }
    }
}

/// Procedural breathing over a fixed channel set, bound to parameter indices
/// once at model load. Channels whose parameter the model lacks are skipped.
#[derive(Debug)]
pub struct BreathController {
    channels: Vec<BreathChannel>,
    bound: Vec<Option<usize>>,
}

impl BreathController {
    pub fn new(channels: Vec<BreathChannel>) -> Self {
        Self {
            bound: vec![None; channels.len()],
            channels,
        }
    }

    /// The stock idle set: three head angles and the body sway at half
    /// weight, plus the breath cycle itself at full weight.
    pub fn with_defaults() -> Self {
        Self::new(vec![
            BreathChannel::new("ParamAngleX", 0.0, 15.0, 6.5345, 0.5),
            BreathChannel::new("ParamAngleY", 0.0, 8.0, 3.5345, 0.5),
            BreathChannel::new("ParamAngleZ", 0.0, 10.0, 5.5345, 0.5),
            BreathChannel::new("ParamBodyAngleX", 0.0, 4.0, 15.5345, 0.5),
            BreathChannel::new("ParamBreath", 0.5, 0.5, 3.2345, 1.0),
        ])
    }

    /// Resolve channel parameters against the store.
    pub fn bind(&mut self, params: &ParamStore) {
        for (channel, slot) in self.channels.iter().zip(self.bound.iter_mut()) {
            *slot = params.try_index_of(&channel.param);
        }
    }

    pub fn channels(&self) -> &[BreathChannel] {
        &self.channels
    }

    /// Apply channel offsets for the given elapsed-time clock value.
    /// The phase is reduced in f64 so a long-lived clock keeps precision.
    pub fn update(&self, elapsed: f64, params: &mut ParamStore) {
        for (channel, slot) in self.channels.iter().zip(self.bound.iter()) {
            let Some(i) = *slot else {
                continue;
            };
            let period = channel.period.max(f32::EPSILON) as f64;
            let angle = TAU * (elapsed % period) / period + channel.phase as f64;
            let value = channel.bias + channel.amplitude * angle.sin() as f32;
            params.add_at(i, value, channel.weight);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ParameterDef;

    fn params() -> ParamStore {
        ParamStore::new(&[
            ParameterDef {
                id: "ParamAngleX".into(),
                min: -30.0,
                max: 30.0,
                default: 0.0,
            },
            ParameterDef {
                id: "ParamBreath".into(),
                min: 0.0,
                max: 1.0,
                default: 0.0,
            },
        ])
    }

    #[test]
    fn unknown_channels_are_skipped() {
        let mut params = params();
        let mut breath = BreathController::with_defaults();
        breath.bind(&params);
        breath.update(1.0, &mut params);
        // Only the two known parameters moved; no panic for the rest.
        assert!(params.get("ParamBreath").unwrap() >= 0.0);
    }

    #[test]
    fn quarter_period_hits_peak() {
        let mut params = params();
        let mut breath = BreathController::new(vec![BreathChannel::new(
            "ParamAngleX",
            0.0,
            10.0,
            4.0,
            1.0,
        )]);
        breath.bind(&params);
        breath.update(1.0, &mut params); // sin(tau/4) = 1
        assert!((params.get("ParamAngleX").unwrap() - 10.0).abs() < 1e-4);
    }
}
