//! Discrete time quantities shared by every window, slice, and duration in the
//! domain model. Kept as a newtype over `u64` so that ticks, windows and
//! durations can never be silently mixed with a bare integer index.

#[derive(Clone, Copy)]
#[derive(Debug)]
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Time {
    pub value_ns: u64,
}

impl Time {
    const MICRO_TO_NANO: u64 = 1_000;
    const MILLI_TO_NANO: u64 = 1_000_000;
    const SECS_TO_NANO: u64 = 1_000_000_000;

    pub const fn zero() -> Self {
        Self { value_ns: 0 }
    }

    pub const fn nanos(value_ns: u64) -> Self {
        Self { value_ns }
    }

    pub const fn micros(value_us: u64) -> Self {
        Self { value_ns: value_us * Self::MICRO_TO_NANO }
    }

    pub const fn millis(value_ms: u64) -> Self {
        Self { value_ns: value_ms * Self::MILLI_TO_NANO }
    }

    pub fn as_nanos(&self) -> u64 {
        self.value_ns
    }

    pub fn as_micros(&self) -> u64 {
        self.value_ns / Self::MICRO_TO_NANO
    }

    pub fn as_millis(&self) -> u64 {
        self.value_ns / Self::MILLI_TO_NANO
    }

    pub fn saturating_sub(self, rhs: Self) -> Self {
        Self { value_ns: self.value_ns.saturating_sub(rhs.value_ns) }
    }

    pub fn min(self, other: Self) -> Self {
        if self <= other { self } else { other }
    }

    pub fn max(self, other: Self) -> Self {
        if self >= other { self } else { other }
    }
}

impl std::ops::Add for Time {
    type Output = Time;

    fn add(self, rhs: Self) -> Self::Output {
        Self::Output { value_ns: self.value_ns + rhs.value_ns }
    }
}

impl std::ops::Sub for Time {
    type Output = Time;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::Output { value_ns: self.value_ns - rhs.value_ns }
    }
}

impl std::ops::Mul<u64> for Time {
    type Output = Time;

    fn mul(self, rhs: u64) -> Self::Output {
        Self::Output { value_ns: self.value_ns * rhs }
    }
}

impl std::ops::Mul<Time> for u64 {
    type Output = Time;

    fn mul(self, rhs: Time) -> Self::Output {
        rhs * self
    }
}

impl std::ops::Div for Time {
    type Output = u64;

    fn div(self, rhs: Self) -> Self::Output {
        self.value_ns / rhs.value_ns
    }
}

impl std::ops::Div<u64> for Time {
    type Output = Time;

    fn div(self, rhs: u64) -> Self::Output {
        Time { value_ns: self.value_ns / rhs }
    }
}

impl std::iter::Sum for Time {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Time::zero(), |acc, val| acc + val)
    }
}

impl std::fmt::Display for Time {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ns", self.value_ns)
    }
}

impl serde::Serialize for Time {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        format!("{} ns", self.value_ns).serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for Time {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let pieces: Vec<_> = raw.trim().split_whitespace().collect();

        match pieces.as_slice() {
            [value] => {
                let value_ns: u64 = value.parse()
                    .map_err(|err| serde::de::Error::custom(format!("invalid time: {err}")))?;

                Ok(Time { value_ns })
            }
            [value, unit] => {
                let value: u64 = value.parse()
                    .map_err(|err| serde::de::Error::custom(format!("invalid time: {err}")))?;

                let scale = match *unit {
                    "s" => Self::SECS_TO_NANO,
                    "ms" => Self::MILLI_TO_NANO,
                    "us" => Self::MICRO_TO_NANO,
                    "ns" => 1,
                    other => return Err(serde::de::Error::custom(format!("unknown time unit: {other}"))),
                };

                Ok(Time { value_ns: value * scale })
            }
            _ => Err(serde::de::Error::custom("expected '<value>' or '<value> <unit>'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_round_trips() {
        let a = Time::millis(5);
        let b = Time::micros(250);

        assert_eq!(a + b, Time::nanos(5_250_000));
        assert_eq!((a + b) - a, b);
        assert_eq!(a * 2, Time::millis(10));
        assert_eq!(a / Time::micros(250), 20);
    }

    #[test]
    fn serde_round_trip_with_unit() {
        let t = Time::millis(3);
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "\"3000000 ns\"");

        let back: Time = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn serde_parses_bare_nanoseconds() {
        let back: Time = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(back, Time::nanos(42));
    }
}
