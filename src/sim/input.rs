//! Per-player input for one tick

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

use crate::math::{FVec2, Fixed};

/// Buttons held during a tick
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputKeys(u8);

impl InputKeys {
    pub const NONE: Self = Self(0);
    pub const FIRE: Self = Self(1);
    pub const BOMB: Self = Self(1 << 1);
    pub const CLICK: Self = Self(1 << 2);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

impl BitOr for InputKeys {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for InputKeys {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for InputKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [(Self::FIRE, "fire"), (Self::BOMB, "bomb"), (Self::CLICK, "click")]
            .into_iter()
            .filter(|(k, _)| self.contains(*k))
            .map(|(_, n)| n)
            .collect();
        write!(f, "InputKeys({})", names.join(" | "))
    }
}

/// Input for one player
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputFrame {
    /// Movement stick, each axis in [-1, 1]
    pub velocity: FVec2,
    /// Aim at a world position (mouse)
    pub target_absolute: Option<FVec2>,
    /// Aim along a direction (right stick)
    pub target_relative: Option<FVec2>,
    pub keys: InputKeys,
}

impl InputFrame {
    pub fn moving(velocity: FVec2) -> Self {
        Self {
            velocity,
            ..Self::default()
        }
    }

    pub fn with_keys(mut self, keys: InputKeys) -> Self {
        self.keys |= keys;
        self
    }

    pub fn aiming(mut self, direction: FVec2) -> Self {
        self.target_relative = Some(direction);
        self
    }

    /// Movement clamped to unit length
    pub fn clamped_velocity(&self) -> FVec2 {
        if self.velocity.length_squared() > Fixed::ONE {
            self.velocity.normalise()
        } else {
            self.velocity
        }
    }

    /// Aim angle seen from `from`; relative aim wins over absolute
    pub fn aim_angle(&self, from: FVec2) -> Option<Fixed> {
        let direction = match (self.target_relative, self.target_absolute) {
            (Some(d), _) => d,
            (None, Some(target)) => target - from,
            (None, None) => return None,
        };
        if direction == FVec2::ZERO {
            return None;
        }
        Some(direction.angle())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys() {
        let keys = InputKeys::FIRE | InputKeys::CLICK;
        assert!(keys.contains(InputKeys::FIRE));
        assert!(!keys.contains(InputKeys::BOMB));
        assert!(InputKeys::default().is_empty());
        assert_eq!(format!("{keys:?}"), "InputKeys(fire | click)");
    }

    #[test]
    fn test_aim_prefers_relative() {
        let frame = InputFrame {
            target_absolute: Some(FVec2::from_ints(0, 10)),
            target_relative: Some(FVec2::from_ints(1, 0)),
            ..InputFrame::default()
        };
        assert_eq!(frame.aim_angle(FVec2::ZERO), Some(Fixed::ZERO));
        assert_eq!(InputFrame::default().aim_angle(FVec2::ZERO), None);
    }

    #[test]
    fn test_velocity_clamped() {
        let frame = InputFrame::moving(FVec2::from_ints(3, 4));
        let v = frame.clamped_velocity();
        assert!((v.length() - Fixed::ONE).abs() < Fixed::from_ratio(1, 1000));
        let slow = InputFrame::moving(FVec2::new(Fixed::HALF, Fixed::ZERO));
        assert_eq!(slow.clamped_velocity(), slow.velocity);
    }

    #[test]
    fn test_serde_round_trip() {
        let frame = InputFrame::moving(FVec2::from_ints(1, 0)).with_keys(InputKeys::BOMB);
        let json = serde_json::to_string(&frame).unwrap();
        let back: InputFrame = serde_json::from_str(&json).unwrap();
        assert_eq!(back, frame);
    }
}
