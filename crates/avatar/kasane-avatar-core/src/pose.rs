//! Pose constraints: mutual-exclusion opacity groups over parts.
//!
//! Per group, the part whose driving parameter is highest fades toward full
//! opacity at the configured rate; the rest fade out under a background
//! opacity clamp so a half-switched group never shows two parts at once.

use crate::backend::ModelBackend;
use crate::data::PoseData;
use crate::error::AvatarError;
use crate::param::ParamStore;

/// Above this visible-part opacity, background parts are clamped hard.
const PHI: f32 = 0.5;
/// Opacity ceiling for background parts while a switch is in flight.
const BACK_OPACITY: f32 = 0.15;

#[derive(Debug)]
struct PoseEntry {
    part: usize,
    param: Option<usize>,
}

/// Pose controller bound to part and parameter indices at load.
#[derive(Debug)]
pub struct PoseController {
    fade_time: f32,
    groups: Vec<Vec<PoseEntry>>,
}

impl PoseController {
    /// Resolve part ids (and driving parameters, defaulting to the part id)
    /// against the backend and store. Unknown part ids are a load error;
    /// a missing driving parameter leaves the entry passive.
    pub fn new(
        data: &PoseData,
        params: &ParamStore,
        backend: &dyn ModelBackend,
    ) -> Result<Self, AvatarError> {
        data.validate_basic().map_err(AvatarError::AssetLoad)?;
        let part_index = |id: &str| {
            (0..backend.part_count())
                .find(|&p| backend.part_id(p) == id)
                .ok_or_else(|| AvatarError::AssetLoad(format!("pose references unknown part '{id}'")))
        };
        let mut groups = Vec::with_capacity(data.groups.len());
        for group in &data.groups {
            let mut entries = Vec::with_capacity(group.len());
            for member in group {
                let part = part_index(&member.part)?;
                let param_id = member.param.as_deref().unwrap_or(&member.part);
                entries.push(PoseEntry {
                    part,
                    param: params.try_index_of(param_id),
                });
            }
            groups.push(entries);
        }
        log::debug!("pose loaded: {} groups", groups.len());
        Ok(Self {
            fade_time: data.fade_time,
            groups,
        })
    }

    /// Fade part opacities toward the selected member of each group.
    pub fn update(&self, dt: f32, params: &ParamStore, backend: &mut dyn ModelBackend) {
        for group in &self.groups {
            let Some((visible, _)) = group
                .iter()
                .enumerate()
                .map(|(k, e)| (k, e.param.map(|i| params.value_at(i)).unwrap_or(0.0)))
                .max_by(|a, b| a.1.total_cmp(&b.1))
            else {
                continue;
            };

            let entry = &group[visible];
            let new_opacity = if self.fade_time <= 0.0 {
                1.0
            } else {
                (backend.part_opacity(entry.part) + dt / self.fade_time).min(1.0)
            };
            backend.set_part_opacity(entry.part, new_opacity);

            for (k, other) in group.iter().enumerate() {
                if k == visible {
                    continue;
                }
                let mut opacity = backend.part_opacity(other.part).min(1.0 - new_opacity);
                if new_opacity > PHI {
                    opacity = opacity.min(BACK_OPACITY);
                }
                backend.set_part_opacity(other.part, opacity);
            }
        }
    }
}
