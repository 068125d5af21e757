//! Priority tiers for teardown callbacks.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Priority of a teardown tier.
///
/// Tiers drain from the highest value to the lowest. The named variants sit
/// at `100`, `0` and `-100`; the gaps leave room for [`Priority::Custom`]
/// values in between. Comparison is by numeric value, so `Custom(100)` is the
/// same tier as `High`.
#[derive(Debug, Clone, Copy, Default)]
pub enum Priority {
    /// Drained first (`100`).
    High,
    /// Default tier (`0`).
    #[default]
    Normal,
    /// Drained last (`-100`).
    Low,
    /// Any other position in the drain order.
    Custom(i32),
}

impl Priority {
    pub const HIGH_VALUE: i32 = 100;
    pub const NORMAL_VALUE: i32 = 0;
    pub const LOW_VALUE: i32 = -100;

    /// Numeric rank of this priority.
    pub const fn value(self) -> i32 {
        match self {
            Self::High => Self::HIGH_VALUE,
            Self::Normal => Self::NORMAL_VALUE,
            Self::Low => Self::LOW_VALUE,
            Self::Custom(v) => v,
        }
    }

    /// Build a priority from a raw value, folding onto a named variant when
    /// one matches.
    pub const fn from_value(value: i32) -> Self {
        match value {
            Self::HIGH_VALUE => Self::High,
            Self::NORMAL_VALUE => Self::Normal,
            Self::LOW_VALUE => Self::Low,
            v => Self::Custom(v),
        }
    }
}

impl From<i32> for Priority {
    fn from(value: i32) -> Self {
        Self::from_value(value)
    }
}

impl From<Priority> for i32 {
    fn from(priority: Priority) -> Self {
        priority.value()
    }
}

impl PartialEq for Priority {
    fn eq(&self, other: &Self) -> bool {
        self.value() == other.value()
    }
}

impl Eq for Priority {}

impl Hash for Priority {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value().hash(state);
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value().cmp(&other.value())
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match Self::from_value(self.value()) {
            Self::High => write!(f, "high"),
            Self::Normal => write!(f, "normal"),
            Self::Low => write!(f, "low"),
            Self::Custom(v) => write!(f, "{}", v),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high" => Ok(Self::High),
            "normal" => Ok(Self::Normal),
            "low" => Ok(Self::Low),
            other => other
                .parse::<i32>()
                .map(Self::from_value)
                .map_err(|_| format!("Unknown priority: {}", s)),
        }
    }
}

/// Named tiers serialize as their name, others as the bare integer.
impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match Self::from_value(self.value()) {
            Self::Custom(v) => serializer.serialize_i32(v),
            named => serializer.collect_str(&named),
        }
    }
}

/// Accepts anything `FromStr` does, or an integer.
impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PriorityVisitor;

        impl Visitor<'_> for PriorityVisitor {
            type Value = Priority;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("\"high\", \"normal\", \"low\" or an integer")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Priority, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Priority, E> {
                i32::try_from(v)
                    .map(Priority::from_value)
                    .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Priority, E> {
                i32::try_from(v)
                    .map(Priority::from_value)
                    .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
            }
        }

        deserializer.deserialize_any(PriorityVisitor)
    }
}
