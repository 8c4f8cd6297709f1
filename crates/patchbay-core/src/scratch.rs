//! Pre-allocated scratch buffers for pulling upstream signal.
//!
//! A node that reads from upstream needs somewhere to put the upstream buffer
//! while it renders its own. Because a feedback patch can re-enter the same
//! node while an outer render of it is still pulling, scratch space is split
//! into one lane set per render depth: a render at level `n` only ever touches
//! lane set `n - 1`, so nested passes never alias.

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};

use crate::MAX_BLOCK_SAMPLES;
use crate::guard::{GuardToken, MAX_RENDER_DEPTH};

/// Borrowed scratch lane, sized to the buffer being rendered.
pub type ScratchLease<'a> = MappedMutexGuard<'a, [f32]>;

/// Fixed set of scratch lanes per render depth, allocated once.
pub struct ScratchBank {
    lanes_per_level: usize,
    lanes: Box<[Mutex<Vec<f32>>]>,
}

impl ScratchBank {
    /// Allocates `lanes_per_level` lanes of [`MAX_BLOCK_SAMPLES`] for every
    /// render depth up to [`MAX_RENDER_DEPTH`].
    pub fn new(lanes_per_level: usize) -> Self {
        let lanes = (0..lanes_per_level * MAX_RENDER_DEPTH)
            .map(|_| Mutex::new(vec![0.0; MAX_BLOCK_SAMPLES]))
            .collect();
        Self {
            lanes_per_level,
            lanes,
        }
    }

    /// Number of lanes available at each depth.
    pub fn lanes_per_level(&self) -> usize {
        self.lanes_per_level
    }

    /// Leases lane `lane` for the render level held by `token`, trimmed to
    /// `len` samples and zeroed.
    ///
    /// Returns `None` if the lane does not exist, `len` exceeds the lane
    /// capacity, or the lane is already leased. Callers treat `None` as
    /// "no upstream signal".
    pub fn lease(&self, token: &GuardToken<'_>, lane: usize, len: usize) -> Option<ScratchLease<'_>> {
        if lane >= self.lanes_per_level || len > MAX_BLOCK_SAMPLES {
            return None;
        }
        let slot = self.lanes.get(token.lane_set() * self.lanes_per_level + lane)?;
        let guard = slot.try_lock()?;
        let mut lease = MutexGuard::map(guard, |buf| &mut buf[..len]);
        lease.fill(0.0);
        Some(lease)
    }
}

impl core::fmt::Debug for ScratchBank {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ScratchBank")
            .field("lanes_per_level", &self.lanes_per_level)
            .field("levels", &MAX_RENDER_DEPTH)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::CycleGuard;

    #[test]
    fn nested_levels_get_distinct_lanes() {
        let bank = ScratchBank::new(1);
        let guard = CycleGuard::new();
        let outer = guard.enter().unwrap();
        let mut a = bank.lease(&outer, 0, 16).unwrap();
        let inner = guard.enter().unwrap();
        let mut b = bank.lease(&inner, 0, 16).unwrap();
        a[0] = 1.0;
        b[0] = 2.0;
        assert_eq!(a[0], 1.0);
        assert_eq!(b[0], 2.0);
    }

    #[test]
    fn same_lane_cannot_be_leased_twice() {
        let bank = ScratchBank::new(2);
        let guard = CycleGuard::new();
        let token = guard.enter().unwrap();
        let _held = bank.lease(&token, 1, 8).unwrap();
        assert!(bank.lease(&token, 1, 8).is_none());
        assert!(bank.lease(&token, 0, 8).is_some());
    }

    #[test]
    fn oversized_or_missing_lane_is_refused() {
        let bank = ScratchBank::new(1);
        let guard = CycleGuard::new();
        let token = guard.enter().unwrap();
        assert!(bank.lease(&token, 0, MAX_BLOCK_SAMPLES + 1).is_none());
        assert!(bank.lease(&token, 3, 8).is_none());
    }

    #[test]
    fn lease_is_zeroed() {
        let bank = ScratchBank::new(1);
        let guard = CycleGuard::new();
        let token = guard.enter().unwrap();
        {
            let mut lease = bank.lease(&token, 0, 4).unwrap();
            lease.fill(0.7);
        }
        let lease = bank.lease(&token, 0, 4).unwrap();
        assert!(lease.iter().all(|&s| s == 0.0));
    }
}
