//! Expression registry and application.
//!
//! Expressions are named, static parameter delta sets applied additively on
//! top of whatever the motion stage produced. They sit outside the motion
//! player's snapshot bracket, so their offsets are re-applied fresh every
//! frame and never accumulate.

use std::rc::Rc;

use hashbrown::HashMap;

use crate::data::ExpressionData;
use crate::error::AvatarError;
use crate::param::ParamStore;

#[derive(Debug)]
struct ActiveExpression {
    name: String,
    data: Rc<ExpressionData>,
    /// Seconds since the expression was set (drives the fade-in).
    time: f32,
}

/// Expression player (one active delta set, named registry).
#[derive(Debug)]
pub struct ExpressionPlayer {
    registry: HashMap<String, Rc<ExpressionData>>,
    active: Option<ActiveExpression>,
    /// Fade-in seconds applied when switching expressions.
    fade_in: f32,
}

impl ExpressionPlayer {
    pub fn new(fade_in: f32) -> Self {
        Self {
            registry: HashMap::new(),
            active: None,
            fade_in: fade_in.max(0.0),
        }
    }

    /// Register an expression under `name`, replacing any prior definition.
    pub fn load(&mut self, name: &str, data: ExpressionData) {
        log::debug!("expression '{name}' loaded ({} entries)", data.entries.len());
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

    /// Activate a registered expression; restarts its fade-in.
    pub fn set(&mut self, name: &str) -> Result<(), AvatarError> {
        if self.registry.is_empty() {
            return Err(AvatarError::NotInitialized("expression"));
        }
        let data = self
            .registry
            .get(name)
            .cloned()
            .ok_or_else(|| AvatarError::NameNotFound {
                kind: "expression",
                name: name.to_string(),
            })?;
        log::debug!("expression '{name}' set");
        self.active = Some(ActiveExpression {
            name: name.to_string(),
            data,
            time: 0.0,
        });
        Ok(())
    }

    pub fn clear(&mut self) {
        self.active = None;
    }

    /// Apply the active expression's deltas, weighted by the fade-in.
    pub fn update(&mut self, dt: f32, params: &mut ParamStore) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        active.time += dt;
        let weight = if self.fade_in <= 0.0 {
            1.0
        } else {
            (active.time / self.fade_in).clamp(0.0, 1.0)
        };
        for entry in &active.data.entries {
            // Entries may target parameters this model lacks.
            if let Some(i) = params.try_index_of(&entry.param) {
                params.add_at(i, entry.delta, weight);
            }
        }
    }
}
