use std::fmt;

use serde::{Deserialize, Serialize};

/// Bytes per touch record.
pub const TOUCH_RECORD_LEN: usize = 8;

/// One decoded touch, in chip coordinates with both axes mirrored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Touch {
    /// Tracking id, stable while the finger stays down
    pub id: u8,
    /// Horizontal position
    pub x: i32,
    /// Vertical position
    pub y: i32,
    /// Contact area
    pub size: u16,
}

impl Touch {
    /// Decode an 8-byte record `[id, x_lo, x_hi, y_lo, y_hi, size_lo,
    /// size_hi, reserved]` against `resolution`.
    ///
    /// The sensor is mounted rotated, so each coordinate is reported as
    /// `resolution - raw`.
    pub fn decode(record: [u8; TOUCH_RECORD_LEN], resolution: Resolution) -> Self {
        let [id, x_lo, x_hi, y_lo, y_hi, size_lo, size_hi, _] = record;
        Self {
            id,
            x: i32::from(resolution.x) - i32::from(u16::from_le_bytes([x_lo, x_hi])),
            y: i32::from(resolution.y) - i32::from(u16::from_le_bytes([y_lo, y_hi])),
            size: u16::from_le_bytes([size_lo, size_hi]),
        }
    }
}

/// Touch panel resolution reported by the chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    /// Horizontal resolution
    pub x: u16,
    /// Vertical resolution
    pub y: u16,
}

impl Resolution {
    /// Create a resolution.
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }

    /// Decode two little-endian fields.
    pub fn from_le_bytes(bytes: [u8; 4]) -> Self {
        let [x_lo, x_hi, y_lo, y_hi] = bytes;
        Self {
            x: u16::from_le_bytes([x_lo, x_hi]),
            y: u16::from_le_bytes([y_lo, y_hi]),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_mirrors_both_axes() {
        let touch = Touch::decode([3, 0x10, 0x00, 0x20, 0x01, 0x2C, 0x00, 0], Resolution::new(1920, 515));
        assert_eq!(
            touch,
            Touch {
                id: 3,
                x: 1920 - 0x10,
                y: 515 - 0x120,
                size: 44
            }
        );
    }

    #[test]
    fn out_of_range_raw_goes_negative() {
        let touch = Touch::decode([0, 0xFF, 0x0F, 0, 0, 0, 0, 0], Resolution::new(100, 100));
        assert_eq!(touch.x, 100 - 0x0FFF);
        assert_eq!(touch.y, 100);
    }

    #[test]
    fn resolution_bytes() {
        assert_eq!(
            Resolution::from_le_bytes([0x80, 0x07, 0x03, 0x02]),
            Resolution::new(1920, 515)
        );
    }
}
