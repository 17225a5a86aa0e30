//! Fixed-point math utilities for deterministic spatial queries.
//!
//! World positions use fixed-point arithmetic so that clustering and
//! distance comparisons give bit-identical results on every platform.
//! One tile is one world unit.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all world-space math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Fixed-point 2D vector (a world position).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Numbers are written as plain decimals so RON scenarios stay readable,
/// and read back from either decimals or integers.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Serialize a fixed-point number as an `f64`.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(value.to_num::<f64>())
    }

    /// Deserialize a fixed-point number from an `f64`.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Fixed::checked_from_num(value)
            .ok_or_else(|| serde::de::Error::custom(format!("{value} out of fixed-point range")))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a vector from integer world coordinates.
    #[must_use]
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Calculate squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// Check whether `other` lies strictly closer than `radius`.
    #[must_use]
    pub fn is_within(self, other: Self, radius: Fixed) -> bool {
        self.distance_squared(other) < radius.saturating_mul(radius)
    }
}

/// Mean of a set of positions.
///
/// Returns `None` for an empty set.
#[must_use]
pub fn centroid<I>(positions: I) -> Option<Vec2Fixed>
where
    I: IntoIterator<Item = Vec2Fixed>,
{
    let mut sum_x = Fixed::ZERO;
    let mut sum_y = Fixed::ZERO;
    let mut count = 0i32;

    for pos in positions {
        sum_x += pos.x;
        sum_y += pos.y;
        count += 1;
    }

    if count == 0 {
        return None;
    }

    let n = Fixed::from_num(count);
    Some(Vec2Fixed::new(sum_x / n, sum_y / n))
}
