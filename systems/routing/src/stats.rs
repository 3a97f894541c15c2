//! Route counters and their persisted form.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Size in bytes of the persisted counter block.
pub const STATE_SIZE: usize = 16;

/// Failures raised while restoring router state.
#[derive(Debug, Error)]
pub enum StateError {
    /// The buffer is shorter than the counter block.
    #[error("router state needs {expected} bytes, found {found}")]
    Truncated {
        /// Bytes required.
        expected: usize,
        /// Bytes available.
        found: usize,
    },
    /// The counter block could not be encoded or decoded.
    #[error("router state codec failed")]
    Codec(#[from] bincode::Error),
}

/// Diagnostic counters of issued route queries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RoutingStats {
    total: i32,
    enemy: i32,
}

impl RoutingStats {
    /// Creates counters with explicit values.
    #[must_use]
    pub const fn new(total: i32, enemy: i32) -> Self {
        Self { total, enemy }
    }

    /// Number of route computations of any kind.
    #[must_use]
    pub const fn total_routes_calculated(&self) -> i32 {
        self.total
    }

    /// Number of route computations issued for noncitizens.
    #[must_use]
    pub const fn enemy_routes_calculated(&self) -> i32 {
        self.enemy
    }

    pub(crate) fn record(&mut self) {
        self.total = self.total.saturating_add(1);
    }

    pub(crate) fn record_enemy(&mut self) {
        self.record();
        self.enemy = self.enemy.saturating_add(1);
    }

    /// Encodes the counters as `[0, enemy, total, 0]` little-endian `i32`s.
    pub fn save(&self) -> Result<Vec<u8>, StateError> {
        let persisted = PersistedStats {
            reserved_head: 0,
            enemy: self.enemy,
            total: self.total,
            reserved_tail: 0,
        };
        Ok(bincode::serialize(&persisted)?)
    }

    /// Restores counters written by [`RoutingStats::save`]; reserved slots are
    /// ignored whatever they contain.
    pub fn load(bytes: &[u8]) -> Result<Self, StateError> {
        if bytes.len() < STATE_SIZE {
            return Err(StateError::Truncated {
                expected: STATE_SIZE,
                found: bytes.len(),
            });
        }
        let persisted: PersistedStats = bincode::deserialize(&bytes[..STATE_SIZE])?;
        Ok(Self {
            total: persisted.total,
            enemy: persisted.enemy,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedStats {
    reserved_head: i32,
    enemy: i32,
    total: i32,
    reserved_tail: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_writes_reserved_slots_as_zero() {
        let bytes = RoutingStats::new(17, 3).save().expect("encode");
        assert_eq!(bytes.len(), STATE_SIZE);
        assert_eq!(&bytes[0..4], &[0, 0, 0, 0]);
        assert_eq!(&bytes[4..8], &3_i32.to_le_bytes());
        assert_eq!(&bytes[8..12], &17_i32.to_le_bytes());
        assert_eq!(&bytes[12..16], &[0, 0, 0, 0]);
    }

    #[test]
    fn load_skips_reserved_slots() {
        let mut bytes = RoutingStats::new(17, 3).save().expect("encode");
        bytes[0] = 0xAA;
        bytes[15] = 0x55;
        assert_eq!(RoutingStats::load(&bytes).expect("decode"), RoutingStats::new(17, 3));
    }

    #[test]
    fn load_rejects_short_buffers() {
        assert!(matches!(
            RoutingStats::load(&[0; 10]),
            Err(StateError::Truncated {
                expected: STATE_SIZE,
                found: 10
            })
        ));
    }
}
