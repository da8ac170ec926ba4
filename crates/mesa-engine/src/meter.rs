//! VU metering with attack/release ballistics.
//!
//! Meters read the most recent time-domain snapshot of a bus, compute RMS,
//! compand it so quiet material still registers, and smooth the result with
//! asymmetric attack and release so bars jump fast and fall gracefully.

use std::collections::HashMap;

/// Threshold above which a meter counts as carrying signal.
pub const ACTIVE_THRESHOLD: f32 = 0.03;

/// Exponent applied to the raw RMS. Values below one lift low levels.
const COMPAND_EXPONENT: f32 = 0.6;

/// A time-domain snapshot in either of the two formats taps produce.
#[derive(Debug, Clone, Copy)]
pub enum TimeDomainData<'a> {
    /// Samples already in [-1, 1].
    Float(&'a [f32]),
    /// Unsigned bytes centred on 128, the fallback snapshot format.
    Byte(&'a [u8]),
}

impl TimeDomainData<'_> {
    /// RMS of the snapshot, with byte data rescaled to [-1, 1] first.
    pub fn rms(&self) -> f32 {
        match self {
            Self::Float(samples) => {
                if samples.is_empty() {
                    return 0.0;
                }
                let sum: f32 = samples.iter().map(|&x| x * x).sum();
                (sum / samples.len() as f32).sqrt()
            }
            Self::Byte(bytes) => {
                if bytes.is_empty() {
                    return 0.0;
                }
                let sum: f32 = bytes
                    .iter()
                    .map(|&b| {
                        let x = (f32::from(b) - 128.0) / 128.0;
                        x * x
                    })
                    .sum();
                (sum / bytes.len() as f32).sqrt()
            }
        }
    }
}

/// Which ballistics and fill curve a meter uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeterScale {
    /// The master bus meter.
    Master,
    /// A channel strip meter.
    Channel,
}

impl MeterScale {
    fn attack(self) -> f32 {
        match self {
            Self::Master => 0.6,
            Self::Channel => 0.7,
        }
    }

    fn release(self) -> f32 {
        match self {
            Self::Master => 0.2,
            Self::Channel => 0.25,
        }
    }

    /// Convert a smoothed level to a bar fill percentage.
    ///
    /// Channel meters run slightly hot so a full fader reads near the top.
    fn fill(self, level: f32) -> f32 {
        match self {
            Self::Master => level * 100.0,
            Self::Channel => (level * 120.0).min(100.0),
        }
    }
}

/// One meter update, ready for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterReading {
    /// Smoothed, companded level in [0, 1].
    pub level: f32,
    /// Bar fill percentage in [0, 100].
    pub fill_percent: f32,
    /// Whether the bus is carrying audible signal.
    pub active: bool,
}

/// Smoothed meter state for any number of buses, keyed by id.
#[derive(Debug, Default)]
pub struct MeterBank {
    smoothed: HashMap<String, f32>,
}

impl MeterBank {
    /// Create an empty bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the meter `id` from a snapshot and return the new reading.
    pub fn update(&mut self, id: &str, scale: MeterScale, data: TimeDomainData<'_>) -> MeterReading {
        let level = data.rms().powf(COMPAND_EXPONENT);
        let previous = self.smoothed.get(id).copied().unwrap_or(0.0);
        let coeff = if level > previous {
            scale.attack()
        } else {
            scale.release()
        };
        let smoothed = previous + (level - previous) * coeff;
        self.smoothed.insert(id.to_owned(), smoothed);

        MeterReading {
            level: smoothed,
            fill_percent: scale.fill(smoothed),
            active: smoothed > ACTIVE_THRESHOLD,
        }
    }

    /// Current smoothed level for `id`, if it has ever been updated.
    pub fn level(&self, id: &str) -> Option<f32> {
        self.smoothed.get(id).copied()
    }

    /// Drop the state for a removed bus.
    pub fn remove(&mut self, id: &str) {
        self.smoothed.remove(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn silence_reads_zero_and_inactive() {
        let mut bank = MeterBank::new();
        let reading = bank.update("m", MeterScale::Master, TimeDomainData::Float(&[0.0; 256]));
        assert_eq!(reading.level, 0.0);
        assert_eq!(reading.fill_percent, 0.0);
        assert!(!reading.active);
    }

    #[test]
    fn byte_snapshot_matches_float_equivalent() {
        // 160 as a byte is (160-128)/128 = 0.25.
        let float_rms = TimeDomainData::Float(&[0.25; 64]).rms();
        let byte_rms = TimeDomainData::Byte(&[160; 64]).rms();
        assert!((float_rms - byte_rms).abs() < 1e-6);
    }

    #[test]
    fn companding_lifts_quiet_signal() {
        let rms = TimeDomainData::Float(&[0.1; 64]).rms();
        let level = rms.powf(COMPAND_EXPONENT);
        assert!(level > rms);
    }

    #[test]
    fn attack_is_faster_than_release() {
        let mut bank = MeterBank::new();
        let loud = [0.8f32; 256];
        let quiet = [0.0f32; 256];

        let rise = bank
            .update("ch", MeterScale::Channel, TimeDomainData::Float(&loud))
            .level;
        let peak_target = TimeDomainData::Float(&loud).rms().powf(COMPAND_EXPONENT);
        // One attack step covers 70% of the distance.
        assert!((rise - peak_target * 0.7).abs() < 1e-4);

        let fall = bank
            .update("ch", MeterScale::Channel, TimeDomainData::Float(&quiet))
            .level;
        assert!((fall - rise * 0.75).abs() < 1e-4, "release leaves 75%");
    }

    #[test]
    fn channel_fill_saturates_at_100() {
        let mut bank = MeterBank::new();
        let mut reading = MeterReading {
            level: 0.0,
            fill_percent: 0.0,
            active: false,
        };
        for _ in 0..50 {
            reading = bank.update("ch", MeterScale::Channel, TimeDomainData::Float(&[1.0; 256]));
        }
        assert_eq!(reading.fill_percent, 100.0);
        assert!(reading.active);
    }

    #[test]
    fn meters_are_independent_per_id() {
        let mut bank = MeterBank::new();
        bank.update("a", MeterScale::Channel, TimeDomainData::Float(&[0.9; 64]));
        let b = bank.update("b", MeterScale::Channel, TimeDomainData::Float(&[0.0; 64]));
        assert_eq!(b.level, 0.0);
    }

    #[test]
    fn removed_meter_restarts_from_zero() {
        let mut bank = MeterBank::new();
        bank.update("ch", MeterScale::Channel, TimeDomainData::Float(&[0.9; 64]));
        bank.remove("ch");
        assert!(bank.level("ch").is_none());
        let reading = bank.update("ch", MeterScale::Channel, TimeDomainData::Float(&[0.0; 64]));
        assert_eq!(reading.level, 0.0);
    }

    proptest! {
        /// Holding a steady signal converges the meter to its companded RMS.
        #[test]
        fn steady_signal_converges(amplitude in 0.05f32..=1.0) {
            let samples = vec![amplitude; 256];
            let target = TimeDomainData::Float(&samples).rms().powf(COMPAND_EXPONENT);
            let mut bank = MeterBank::new();
            let mut level = 0.0;
            for _ in 0..200 {
                level = bank
                    .update("m", MeterScale::Master, TimeDomainData::Float(&samples))
                    .level;
            }
            prop_assert!((level - target).abs() < 1e-3);
        }

        /// Levels never leave [0, 1] for inputs in [-1, 1].
        #[test]
        fn level_stays_normalized(samples in prop::collection::vec(-1.0f32..=1.0, 1..512)) {
            let mut bank = MeterBank::new();
            for _ in 0..10 {
                let reading =
                    bank.update("m", MeterScale::Master, TimeDomainData::Float(&samples));
                prop_assert!((0.0..=1.0).contains(&reading.level));
                prop_assert!((0.0..=100.0).contains(&reading.fill_percent));
            }
        }
    }
}
