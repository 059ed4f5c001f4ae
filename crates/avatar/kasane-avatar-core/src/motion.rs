//! Motion registry and playback.
//!
//! The player owns the named motion registry and at most one active motion.
//! Loaded motions are held behind `Rc`, so replacing a name mid-playback
//! never disturbs the active clip; the next `start` picks up the new data.
//! The parameter snapshot bracket around this player lives in the engine
//! pipeline, not here.

use std::rc::Rc;

use hashbrown::HashMap;

use crate::data::MotionData;
use crate::error::AvatarError;
use crate::param::ParamStore;
use crate::sampling::sample_track;

/// Playback mode for `set_motion`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlayMode {
    /// Play once with the motion's fade-in/out envelope.
    PlayOnce,
    /// Play once, then restart from the motion's fade-in when it finishes.
    Loop,
    /// Play once without fade-out and hold the final sampled values.
    PreserveNoLoop,
}

impl TryFrom<i32> for PlayMode {
    type Error = AvatarError;

    /// Integer mapping for host bindings: 0 = PlayOnce, 1 = Loop,
    /// 2 = PreserveNoLoop.
    fn try_from(mode: i32) -> Result<Self, AvatarError> {
        match mode {
            0 => Ok(PlayMode::PlayOnce),
            1 => Ok(PlayMode::Loop),
            2 => Ok(PlayMode::PreserveNoLoop),
            other => Err(AvatarError::InvalidMode(other)),
        }
    }
}

#[derive(Debug)]
struct ActiveMotion {
    name: String,
    data: Rc<MotionData>,
    mode: PlayMode,
    /// Seconds since the motion started.
    time: f32,
}

/// Fade envelope evaluation: (apply weight, sample time, finished).
fn envelope(time: f32, duration: f32, mode: PlayMode, fade_in: f32, fade_out: f32) -> (f32, f32, bool) {
    let win = if fade_in <= 0.0 {
        1.0
    } else {
        (time / fade_in).clamp(0.0, 1.0)
    };
    match mode {
        PlayMode::PreserveNoLoop => {
            // No fade-out: the final keyframe keeps full influence, then the
            // clip deactivates and the snapshot holds the pose.
            let finished = time >= duration;
            (win, time.min(duration), finished)
        }
        PlayMode::PlayOnce | PlayMode::Loop => {
            if time <= duration {
                (win, time, false)
            } else if fade_out <= 0.0 {
                (0.0, duration, true)
            } else {
                let wout = ((duration + fade_out - time) / fade_out).clamp(0.0, 1.0);
                (win * wout, duration, time >= duration + fade_out)
            }
        }
    }
}

/// Keyframe motion player (one active clip, named registry, loop handoff).
#[derive(Debug, Default)]
pub struct MotionPlayer {
    registry: HashMap<String, Rc<MotionData>>,
    active: Option<ActiveMotion>,
    /// When set, this motion restarts at its fade-in after the active clip
    /// finishes.
    loop_target: Option<String>,
}

impl MotionPlayer {
    /// Register a motion under `name`, replacing any prior definition.
    /// `fade` overrides the clip's own fade-in/out seconds.
    pub fn load(&mut self, name: &str, fade: (f32, f32), mut data: MotionData) {
        data.fade_in = fade.0;
        data.fade_out = fade.1;
        log::debug!("motion '{name}' loaded ({} ms)", data.duration_ms);
        self.registry.insert(name.to_string(), Rc::new(data));
    }

    pub fn is_loaded(&self) -> bool {
        !self.registry.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.registry.keys().map(String::as_str).collect()
    }

    pub fn active_name(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.name.as_str())
    }

    /// Start a registered motion. The currently active motion (if any) is
    /// left untouched when the name is unknown.
    pub fn start(&mut self, name: &str, mode: PlayMode) -> Result<(), AvatarError> {
        if self.registry.is_empty() {
            return Err(AvatarError::NotInitialized("motion"));
        }
        let data = self
            .registry
            .get(name)
            .cloned()
            .ok_or_else(|| AvatarError::NameNotFound {
                kind: "motion",
                name: name.to_string(),
            })?;
        self.loop_target = match mode {
            PlayMode::Loop => Some(name.to_string()),
            _ => None,
        };
        log::debug!("motion '{name}' started ({mode:?})");
        self.active = Some(ActiveMotion {
            name: name.to_string(),
            data,
            mode,
            time: 0.0,
        });
        Ok(())
    }

    /// Stop playback and clear any loop target.
    pub fn clear(&mut self) {
        self.active = None;
        self.loop_target = None;
    }

    /// Advance by `dt` and apply curve values to the store, blended by the
    /// fade envelope. Returns true when any parameter was written; false
    /// means the player is idle (nothing active, or fully faded out).
    pub fn update(&mut self, dt: f32, params: &mut ParamStore) -> bool {
        // Loop handoff: restart the loop target once the previous pass ended.
        if self.active.is_none() {
            let Some(target) = self.loop_target.clone() else {
                return false;
            };
            match self.registry.get(&target).cloned() {
                Some(data) => {
                    self.active = Some(ActiveMotion {
                        name: target,
                        data,
                        mode: PlayMode::Loop,
                        time: 0.0,
                    });
                }
                None => {
                    // Loop target was replaced away; drop it.
                    self.loop_target = None;
                    return false;
                }
            }
        }

        let (wrote, finished) = match self.active.as_mut() {
            Some(active) => {
                active.time += dt;
                let duration = active.data.duration_ms as f32 / 1000.0;
                let (weight, sample_t, finished) = envelope(
                    active.time,
                    duration,
                    active.mode,
                    active.data.fade_in,
                    active.data.fade_out,
                );
                if weight <= 0.0 {
                    (false, finished)
                } else {
                    let u = if duration > 0.0 {
                        (sample_t / duration).clamp(0.0, 1.0)
                    } else {
                        0.0
                    };
                    let mut any = false;
                    for track in &active.data.tracks {
                        if track.points.is_empty() {
                            continue;
                        }
                        // Tracks may target parameters this model lacks.
                        let Some(i) = params.try_index_of(&track.param) else {
                            continue;
                        };
                        params.set_at(i, sample_track(track, u), weight);
                        any = true;
                    }
                    (any, finished)
                }
            }
            None => (false, false),
        };

        if finished {
            self.active = None;
        }
        wrote
    }
}
