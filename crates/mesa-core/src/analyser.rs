//! Analyser tap: a ring buffer of the most recent time-domain samples.
//!
//! Every bus that feeds a VU meter (the master bus and each channel strip)
//! writes its mono-summed output into a tap. The metering engine snapshots
//! the tap once per frame tick and computes RMS from the snapshot, so the
//! audio path never blocks on the UI.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

/// Default tap size: large enough for a stable RMS reading.
pub const DEFAULT_TAP_SIZE: usize = 1024;

/// Ring buffer exposing the last `size` samples written to a bus.
#[derive(Debug, Clone)]
pub struct AnalyserTap {
    ring: Vec<f32>,
    write_pos: usize,
}

impl AnalyserTap {
    /// Create a tap holding `size` samples.
    ///
    /// # Panics
    ///
    /// Panics if `size` is 0.
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "tap size must be > 0");
        Self {
            ring: vec![0.0; size],
            write_pos: 0,
        }
    }

    /// Number of samples the tap retains.
    pub fn len(&self) -> usize {
        self.ring.len()
    }

    /// Whether the tap retains zero samples (never true by construction).
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Append a block of samples, overwriting the oldest.
    #[inline]
    pub fn write_block(&mut self, samples: &[f32]) {
        for &s in samples {
            self.ring[self.write_pos] = s;
            self.write_pos = (self.write_pos + 1) % self.ring.len();
        }
    }

    /// Copy the retained samples into `out` in chronological order.
    ///
    /// `out` must be exactly `len()` samples long.
    pub fn snapshot(&self, out: &mut [f32]) {
        debug_assert_eq!(out.len(), self.ring.len());
        let len = self.ring.len();
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.ring[(self.write_pos + i) % len];
        }
    }

    /// Reset the tap to silence.
    pub fn clear(&mut self) {
        self.ring.fill(0.0);
        self.write_pos = 0;
    }
}

impl Default for AnalyserTap {
    fn default() -> Self {
        Self::new(DEFAULT_TAP_SIZE)
    }
}
