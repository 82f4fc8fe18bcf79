use std::time::Duration;

use crate::foundation::error::{PlaybackError, PlaybackResult};

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Exact display duration of one frame, as a reduced rational number of seconds.
///
/// APNG stores delays as `delay_num / delay_den` seconds; keeping the ratio instead of a float
/// means thresholds re-derived every tick are always identical.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
pub struct FrameDuration {
    num: u32,
    den: u32,
}

impl FrameDuration {
    /// Create a validated duration of `num / den` seconds. Both parts must be non-zero.
    pub fn new(num: u32, den: u32) -> PlaybackResult<Self> {
        if den == 0 {
            return Err(PlaybackError::invalid_config(
                "frame duration denominator must be > 0",
            ));
        }
        if num == 0 {
            return Err(PlaybackError::invalid_config("frame duration must be > 0"));
        }
        Ok(Self::reduced(num, den))
    }

    /// Create a duration of `ms` milliseconds.
    pub fn from_millis(ms: u32) -> PlaybackResult<Self> {
        Self::new(ms, 1000)
    }

    /// Interpret an APNG `fcTL` delay.
    ///
    /// A zero denominator means 1/100 s units. A zero numerator ("as fast as possible") maps to
    /// `zero_fallback`.
    pub fn from_apng_delay(num: u16, den: u16, zero_fallback: FrameDuration) -> Self {
        if num == 0 {
            return zero_fallback;
        }
        let den = if den == 0 { 100 } else { den };
        Self::reduced(u32::from(num), u32::from(den))
    }

    fn reduced(num: u32, den: u32) -> Self {
        let g = gcd(u64::from(num), u64::from(den)) as u32;
        Self {
            num: num / g,
            den: den / g,
        }
    }

    /// Numerator (seconds).
    pub fn num(self) -> u32 {
        self.num
    }

    /// Denominator, always non-zero.
    pub fn den(self) -> u32 {
        self.den
    }

    /// Convert to floating-point seconds (display only).
    pub fn as_secs_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Convert to a [`Duration`], rounded to the nearest nanosecond.
    pub fn to_std(self) -> Duration {
        let n = u128::from(self.num) * u128::from(NANOS_PER_SEC);
        let d = u128::from(self.den);
        let nanos = (n + d / 2) / d;
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

/// Integer time units shared by every duration of one frame store.
///
/// `units_per_sec` is a common multiple of 1e9 and every frame denominator, so both frame
/// durations and [`Duration`] elapsed values convert without remainder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Timebase {
    units_per_sec: u64,
    exact: bool,
}

impl Timebase {
    pub(crate) fn for_durations(durations: impl IntoIterator<Item = FrameDuration>) -> Self {
        let mut units = NANOS_PER_SEC;
        for d in durations {
            match lcm_checked(units, u64::from(d.den)) {
                Some(v) => units = v,
                None => {
                    tracing::warn!(
                        den = d.den,
                        "frame denominators exceed the exact timebase; rounding to nanoseconds"
                    );
                    return Self {
                        units_per_sec: NANOS_PER_SEC,
                        exact: false,
                    };
                }
            }
        }
        Self {
            units_per_sec: units,
            exact: true,
        }
    }

    pub(crate) fn units_per_sec(self) -> u64 {
        self.units_per_sec
    }

    pub(crate) fn is_exact(self) -> bool {
        self.exact
    }

    pub(crate) fn units_of(self, d: FrameDuration) -> u128 {
        let n = u128::from(d.num) * u128::from(self.units_per_sec);
        let den = u128::from(d.den);
        if self.exact {
            n / den
        } else {
            ((n + den / 2) / den).max(1)
        }
    }

    pub(crate) fn units_of_std(self, d: Duration) -> u128 {
        d.as_nanos() * u128::from(self.units_per_sec / NANOS_PER_SEC)
    }

    /// Convert units back to a [`Duration`], truncating below one nanosecond.
    pub(crate) fn to_std(self, units: u128) -> Duration {
        let nanos = units / u128::from(self.units_per_sec / NANOS_PER_SEC);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a.max(1)
}

fn lcm_checked(a: u64, b: u64) -> Option<u64> {
    (a / gcd(a, b)).checked_mul(b)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/time.rs"]
mod tests;
