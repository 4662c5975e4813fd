use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of achievement slots per role.
pub const SLOT_COUNT: usize = 28;

/// Value of a slot whose achievement is complete.
pub const COMPLETE: f64 = 100.0;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum VectorError {
    #[error("expected {SLOT_COUNT} slots, got {0}")]
    WrongLength(usize),
    #[error("slot {slot} holds {value}, expected a finite value in [0, 100]")]
    OutOfRange { slot: usize, value: f64 },
}

/// Per-user, per-role completion percentages, indexed by achievement slot.
///
/// Values live in `[0, 100]`. A slot that reaches exactly `100.0` is complete
/// and stays there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProgressVector([f64; SLOT_COUNT]);

impl Default for ProgressVector {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl ProgressVector {
    /// A fresh vector for a user who just acquired a role.
    #[must_use]
    pub fn zeroed() -> Self {
        Self([0.0; SLOT_COUNT])
    }

    /// Build a vector from persisted values.
    ///
    /// # Errors
    ///
    /// Returns `VectorError::WrongLength` if `values` does not hold exactly
    /// `SLOT_COUNT` entries, or `VectorError::OutOfRange` for any value that is
    /// not finite or lies outside `[0, 100]`.
    pub fn from_values(values: &[f64]) -> Result<Self, VectorError> {
        let array: [f64; SLOT_COUNT] = values
            .try_into()
            .map_err(|_| VectorError::WrongLength(values.len()))?;
        for (slot, value) in array.iter().copied().enumerate() {
            if !value.is_finite() || !(0.0..=COMPLETE).contains(&value) {
                return Err(VectorError::OutOfRange { slot, value });
            }
        }
        Ok(Self(array))
    }

    #[must_use]
    pub fn values(&self) -> &[f64; SLOT_COUNT] {
        &self.0
    }

    /// Progress of a single slot, or `None` for an index past the end.
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<f64> {
        self.0.get(slot).copied()
    }

    #[must_use]
    pub fn is_complete(&self, slot: usize) -> bool {
        self.get(slot).is_some_and(|v| v >= COMPLETE)
    }

    /// Number of slots at 100%.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.0.iter().filter(|v| **v >= COMPLETE).count()
    }

    /// Component-wise maximum of two vectors.
    ///
    /// Used to keep a persisted vector from moving backwards.
    #[must_use]
    pub fn ratchet(&self, other: &ProgressVector) -> ProgressVector {
        let mut out = self.0;
        for (slot, value) in out.iter_mut().enumerate() {
            *value = value.max(other.0[slot]);
        }
        Self(out)
    }

    /// Slots whose value in `other` is lower than in `self`.
    #[must_use]
    pub fn regressions(&self, other: &ProgressVector) -> Vec<usize> {
        (0..SLOT_COUNT)
            .filter(|slot| other.0[*slot] < self.0[*slot])
            .collect()
    }

    pub(crate) fn set(&mut self, slot: usize, value: f64) {
        self.0[slot] = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_values_checks_length_and_range() {
        assert!(ProgressVector::from_values(&[0.0; SLOT_COUNT]).is_ok());
        assert_eq!(
            ProgressVector::from_values(&[0.0; 27]).unwrap_err(),
            VectorError::WrongLength(27)
        );

        let mut values = [0.0; SLOT_COUNT];
        values[3] = 100.5;
        assert!(matches!(
            ProgressVector::from_values(&values),
            Err(VectorError::OutOfRange { slot: 3, .. })
        ));
        values[3] = f64::NAN;
        assert!(ProgressVector::from_values(&values).is_err());
    }

    #[test]
    fn ratchet_keeps_the_higher_value_per_slot() {
        let mut a = ProgressVector::zeroed();
        a.set(0, 100.0);
        a.set(1, 20.0);
        let mut b = ProgressVector::zeroed();
        b.set(1, 40.0);

        let merged = a.ratchet(&b);
        assert_eq!(merged.get(0), Some(100.0));
        assert_eq!(merged.get(1), Some(40.0));
        assert_eq!(a.regressions(&b), vec![0]);
        assert!(merged.regressions(&a.ratchet(&merged)).is_empty());
    }

    #[test]
    fn completed_count_only_counts_full_slots() {
        let mut v = ProgressVector::zeroed();
        v.set(0, 100.0);
        v.set(5, 99.999);
        assert_eq!(v.completed_count(), 1);
        assert!(v.is_complete(0));
        assert!(!v.is_complete(5));
        assert!(!v.is_complete(SLOT_COUNT));
    }
}
