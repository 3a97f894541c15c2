use civitas_core::{CombatSide, Grid, GridOffset};

const FRIENDLY_CHECKED: u8 = 0x80;
const FRIENDLY_PRESENT: u8 = 0x01;
const ENEMY_CHECKED: u8 = 0x40;
const ENEMY_PRESENT: u8 = 0x02;

const fn flags(side: CombatSide) -> (u8, u8) {
    match side {
        CombatSide::Friendly => (FRIENDLY_CHECKED, FRIENDLY_PRESENT),
        CombatSide::Enemy => (ENEMY_CHECKED, ENEMY_PRESENT),
    }
}

/// Per-tile memo of combat occupancy, valid for a single clock timestamp.
#[derive(Debug)]
pub(crate) struct FightingCache {
    status: Grid<u8>,
    last_check: Option<u64>,
}

impl FightingCache {
    pub(crate) fn new() -> Self {
        Self {
            status: Grid::new(),
            last_check: None,
        }
    }

    /// Drops every memoised answer when `now` differs from the previous reset.
    pub(crate) fn reset(&mut self, now: u64) {
        if self.last_check != Some(now) {
            self.status.clear();
            self.last_check = Some(now);
        }
    }

    /// Returns whether `side` is fighting on `offset`, running `probe` at most
    /// once per tile and side until the next reset.
    pub(crate) fn has_fighting<F>(&mut self, offset: GridOffset, side: CombatSide, probe: F) -> bool
    where
        F: FnOnce() -> bool,
    {
        let (checked, present) = flags(side);
        let status = &mut self.status[offset];
        if *status & checked == 0 {
            *status |= checked;
            if probe() {
                *status |= present;
            }
        }
        *status & present != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn probes_once_per_timestamp() {
        let mut cache = FightingCache::new();
        let offset = GridOffset::new(500);
        let probes = Cell::new(0);
        let probe = || {
            probes.set(probes.get() + 1);
            true
        };

        cache.reset(10);
        assert!(cache.has_fighting(offset, CombatSide::Friendly, probe));
        assert!(cache.has_fighting(offset, CombatSide::Friendly, probe));
        cache.reset(10);
        assert!(cache.has_fighting(offset, CombatSide::Friendly, probe));
        assert_eq!(probes.get(), 1, "same timestamp must reuse the memo");

        cache.reset(11);
        assert!(cache.has_fighting(offset, CombatSide::Friendly, probe));
        assert_eq!(probes.get(), 2, "new timestamp must re-probe");
    }

    #[test]
    fn sides_are_cached_independently() {
        let mut cache = FightingCache::new();
        let offset = GridOffset::new(900);
        cache.reset(0);

        assert!(!cache.has_fighting(offset, CombatSide::Friendly, || false));
        assert!(cache.has_fighting(offset, CombatSide::Enemy, || true));
        assert!(!cache.has_fighting(offset, CombatSide::Friendly, || true));
        assert!(cache.has_fighting(offset, CombatSide::Enemy, || false));
    }
}
