//! Named-float parameter registry with blend-weighted writes.
//!
//! The store owns the current value vector, a snapshot buffer used by the
//! motion stage (save/restore bracket), and the deferred-set queue that lets
//! caller overrides win over procedural animation within the same frame.
//! All writes clamp into the parameter's [min, max] range.

use hashbrown::HashMap;

use crate::data::ParameterDef;
use crate::error::AvatarError;

/// Registry of model parameters, keyed by string id and addressed by index on
/// hot paths. Created once at model load; never resized.
#[derive(Debug)]
pub struct ParamStore {
    defs: Vec<ParameterDef>,
    values: Vec<f32>,
    saved: Vec<f32>,
    /// At most one deferred (value, weight) pair per parameter; later calls
    /// within a frame replace earlier ones.
    deferred: Vec<Option<(f32, f32)>>,
    index: HashMap<String, usize>,
}

impl ParamStore {
    /// Build the store from load-time definitions. Definitions must already
    /// satisfy uniqueness and min <= default <= max (`ModelData::validate_basic`).
    pub fn new(defs: &[ParameterDef]) -> Self {
        let values: Vec<f32> = defs.iter().map(|d| d.default).collect();
        let index = defs
            .iter()
            .enumerate()
            .map(|(i, d)| (d.id.clone(), i))
            .collect();
        Self {
            saved: values.clone(),
            deferred: vec![None; defs.len()],
            values,
            defs: defs.to_vec(),
            index,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Current value vector, in definition order.
    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn defs(&self) -> &[ParameterDef] {
        &self.defs
    }

    /// Resolve an id to its dense index, or `ParameterNotFound`.
    pub fn index_of(&self, id: &str) -> Result<usize, AvatarError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| AvatarError::ParameterNotFound(id.to_string()))
    }

    /// Resolve an id, ignoring unknown identifiers (used by modulators whose
    /// data may target parameters this model does not have).
    #[inline]
    pub fn try_index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    #[inline]
    pub fn value_at(&self, index: usize) -> f32 {
        self.values[index]
    }

    #[inline]
    fn clamp(&self, index: usize, value: f32) -> f32 {
        let def = &self.defs[index];
        value.clamp(def.min, def.max)
    }

    /// Weighted overwrite: `new = old*(1-weight) + value*weight`.
    #[inline]
    pub fn set_at(&mut self, index: usize, value: f32, weight: f32) {
        let old = self.values[index];
        self.values[index] = self.clamp(index, old * (1.0 - weight) + value * weight);
    }

    /// Weighted addition: `new = old + delta*weight`.
    #[inline]
    pub fn add_at(&mut self, index: usize, delta: f32, weight: f32) {
        let old = self.values[index];
        self.values[index] = self.clamp(index, old + delta * weight);
    }

    /// Weighted multiplication: `new = old * (factor*weight + (1-weight))`.
    #[inline]
    pub fn multiply_at(&mut self, index: usize, factor: f32, weight: f32) {
        let old = self.values[index];
        self.values[index] = self.clamp(index, old * (factor * weight + (1.0 - weight)));
    }

    pub fn set(&mut self, id: &str, value: f32, weight: f32) -> Result<(), AvatarError> {
        let i = self.index_of(id)?;
        self.set_at(i, value, weight);
        Ok(())
    }

    pub fn add(&mut self, id: &str, delta: f32, weight: f32) -> Result<(), AvatarError> {
        let i = self.index_of(id)?;
        self.add_at(i, delta, weight);
        Ok(())
    }

    pub fn multiply(&mut self, id: &str, factor: f32, weight: f32) -> Result<(), AvatarError> {
        let i = self.index_of(id)?;
        self.multiply_at(i, factor, weight);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<f32, AvatarError> {
        Ok(self.values[self.index_of(id)?])
    }

    /// Queue a deferred set; applied with `set` semantics when the pipeline
    /// flushes the queue, after all procedural stages.
    pub fn set_deferred(&mut self, id: &str, value: f32, weight: f32) -> Result<(), AvatarError> {
        let i = self.index_of(id)?;
        self.deferred[i] = Some((value, weight));
        Ok(())
    }

    /// Apply queued deferred sets in definition order, then clear the queue.
    pub fn flush_deferred(&mut self) {
        for i in 0..self.deferred.len() {
            if let Some((value, weight)) = self.deferred[i].take() {
                self.set_at(i, value, weight);
            }
        }
    }

    /// Copy current values into the snapshot buffer (no allocation).
    #[inline]
    pub fn save(&mut self) {
        self.saved.copy_from_slice(&self.values);
    }

    /// Restore current values from the snapshot buffer.
    #[inline]
    pub fn restore(&mut self) {
        self.values.copy_from_slice(&self.saved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ParamStore {
        ParamStore::new(&[
            ParameterDef {
                id: "A".into(),
                min: -10.0,
                max: 10.0,
                default: 0.0,
            },
            ParameterDef {
                id: "B".into(),
                min: 0.0,
                max: 1.0,
                default: 1.0,
            },
        ])
    }

    #[test]
    fn full_weight_set_is_exact() {
        let mut s = store();
        s.set("A", 4.0, 1.0).unwrap();
        assert_eq!(s.get("A").unwrap(), 4.0);
    }

    #[test]
    fn zero_weight_set_is_noop() {
        let mut s = store();
        s.set("A", 4.0, 0.0).unwrap();
        assert_eq!(s.get("A").unwrap(), 0.0);
    }

    #[test]
    fn writes_clamp_to_range() {
        let mut s = store();
        s.set("A", 99.0, 1.0).unwrap();
        assert_eq!(s.get("A").unwrap(), 10.0);
        s.add("B", -5.0, 1.0).unwrap();
        assert_eq!(s.get("B").unwrap(), 0.0);
    }

    #[test]
    fn multiply_blends_toward_identity() {
        let mut s = store();
        s.set("A", 2.0, 1.0).unwrap();
        s.multiply("A", 3.0, 0.5).unwrap();
        // factor*w + (1-w) = 2.0
        assert!((s.get("A").unwrap() - 4.0).abs() < 1e-6);
    }

    #[test]
    fn deferred_last_write_wins_and_clears() {
        let mut s = store();
        s.set_deferred("A", 1.0, 1.0).unwrap();
        s.set_deferred("A", 2.0, 1.0).unwrap();
        assert_eq!(s.get("A").unwrap(), 0.0);
        s.flush_deferred();
        assert_eq!(s.get("A").unwrap(), 2.0);
        s.set("A", 0.0, 1.0).unwrap();
        s.flush_deferred();
        assert_eq!(s.get("A").unwrap(), 0.0);
    }

    #[test]
    fn unknown_id_is_an_error() {
        let mut s = store();
        assert!(matches!(
            s.set("nope", 1.0, 1.0),
            Err(AvatarError::ParameterNotFound(_))
        ));
        assert!(matches!(
            s.get("nope"),
            Err(AvatarError::ParameterNotFound(_))
        ));
    }

    #[test]
    fn save_restore_roundtrip() {
        let mut s = store();
        s.set("A", 3.0, 1.0).unwrap();
        s.save();
        s.set("A", -3.0, 1.0).unwrap();
        s.restore();
        assert_eq!(s.get("A").unwrap(), 3.0);
    }
}
