//! TrackingControl - peer-supplied sampling configuration
//!
//! Sent by the remote host; replaces the previous control wholesale.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::Nanos;

/// One independently gateable device class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlBit {
    LeftAim,
    LeftGrip,
    RightAim,
    RightGrip,
    LeftHand,
    RightHand,
    Face,
    Battery,
}

impl ControlBit {
    /// Number of control bits
    pub const COUNT: usize = 8;

    /// All bits in index order
    pub const ALL: [ControlBit; Self::COUNT] = [
        ControlBit::LeftAim,
        ControlBit::LeftGrip,
        ControlBit::RightAim,
        ControlBit::RightGrip,
        ControlBit::LeftHand,
        ControlBit::RightHand,
        ControlBit::Face,
        ControlBit::Battery,
    ];

    /// Position of the bit in [`TrackingControl::enabled`]
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ControlBit::LeftAim => "left_aim",
            ControlBit::LeftGrip => "left_grip",
            ControlBit::RightAim => "right_aim",
            ControlBit::RightGrip => "right_grip",
            ControlBit::LeftHand => "left_hand",
            ControlBit::RightHand => "right_hand",
            ControlBit::Face => "face",
            ControlBit::Battery => "battery",
        }
    }
}

impl fmt::Display for ControlBit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Peer-requested tracking configuration
///
/// `offset` is the requested prediction lookahead in nanoseconds. It is stored
/// exactly as received; clamping happens where it is used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingControl {
    /// Enable bit per [`ControlBit`]
    pub enabled: [bool; ControlBit::COUNT],

    /// Requested prediction offset (ns)
    #[serde(rename = "offset_ns")]
    pub offset: Nanos,
}

impl TrackingControl {
    /// Control with the given bits set
    pub fn with_enabled(bits: &[ControlBit], offset: Nanos) -> Self {
        let mut control = Self {
            enabled: [false; ControlBit::COUNT],
            offset,
        };
        for bit in bits {
            control.set(*bit, true);
        }
        control
    }

    /// Control with every bit set
    pub fn all_enabled(offset: Nanos) -> Self {
        Self {
            enabled: [true; ControlBit::COUNT],
            offset,
        }
    }

    #[inline]
    pub fn is_enabled(&self, bit: ControlBit) -> bool {
        self.enabled[bit.index()]
    }

    #[inline]
    pub fn set(&mut self, bit: ControlBit, on: bool) {
        self.enabled[bit.index()] = on;
    }

    /// Iterator over the enabled bits
    pub fn enabled_bits(&self) -> impl Iterator<Item = ControlBit> + '_ {
        ControlBit::ALL
            .into_iter()
            .filter(move |bit| self.is_enabled(*bit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_all_order() {
        for (i, bit) in ControlBit::ALL.iter().enumerate() {
            assert_eq!(bit.index(), i);
        }
    }

    #[test]
    fn test_with_enabled() {
        let control = TrackingControl::with_enabled(&[ControlBit::Face, ControlBit::Battery], 7);
        assert!(control.is_enabled(ControlBit::Face));
        assert!(control.is_enabled(ControlBit::Battery));
        assert!(!control.is_enabled(ControlBit::LeftAim));
        assert_eq!(control.offset, 7);
        assert_eq!(control.enabled_bits().count(), 2);
    }

    #[test]
    fn test_offset_kept_unclamped() {
        let json = r#"{"enabled":[true,false,false,false,false,false,false,false],"offset_ns":-5000000000}"#;
        let control: TrackingControl = serde_json::from_str(json).unwrap();
        assert_eq!(control.offset, -5_000_000_000);
        assert!(control.is_enabled(ControlBit::LeftAim));
    }
}
