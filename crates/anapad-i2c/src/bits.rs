//! Pure bit helpers over an in-memory byte.
//!
//! Ranges are inclusive `[lsb, msb]`. Every helper validates its indices and
//! returns [`ConfigurationError`] instead of silently masking.

use anapad_errors::ConfigurationError;

/// Highest valid bit index in a byte.
pub const MAX_BIT: u8 = 7;

/// Reject a bit index outside `0..=7`.
#[inline]
pub fn check_index(index: u8) -> Result<(), ConfigurationError> {
    if index > MAX_BIT {
        return Err(ConfigurationError::BitIndexOutOfRange { index });
    }
    Ok(())
}

/// Reject an inverted range or a range leaving the byte.
#[inline]
pub fn check_range(msb: u8, lsb: u8) -> Result<(), ConfigurationError> {
    if msb < lsb || msb > MAX_BIT {
        return Err(ConfigurationError::InvalidBitRange { msb, lsb });
    }
    Ok(())
}

/// Mask covering `[lsb, msb]`, for a range already validated.
#[inline]
fn range_mask(msb: u8, lsb: u8) -> u8 {
    let width = u32::from(msb - lsb) + 1;
    let ones = ((1u16 << width) - 1) as u8;
    ones << lsb
}

/// Read one bit.
#[inline]
pub fn get_bit(byte: u8, index: u8) -> Result<bool, ConfigurationError> {
    check_index(index)?;
    Ok((byte >> index) & 1 == 1)
}

/// Return `byte` with one bit set.
#[inline]
pub fn set_bit(byte: u8, index: u8) -> Result<u8, ConfigurationError> {
    check_index(index)?;
    Ok(byte | (1 << index))
}

/// Return `byte` with one bit cleared.
#[inline]
pub fn reset_bit(byte: u8, index: u8) -> Result<u8, ConfigurationError> {
    check_index(index)?;
    Ok(byte & !(1 << index))
}

/// Extract the value stored in `[lsb, msb]`, shifted down to bit 0.
#[inline]
pub fn get_bits(byte: u8, msb: u8, lsb: u8) -> Result<u8, ConfigurationError> {
    check_range(msb, lsb)?;
    Ok((byte & range_mask(msb, lsb)) >> lsb)
}

/// Return `byte` with `[lsb, msb]` replaced by `value`.
///
/// Bits outside the range are preserved. `value` must fit in the range
/// width.
#[inline]
pub fn set_bits(byte: u8, value: u8, msb: u8, lsb: u8) -> Result<u8, ConfigurationError> {
    check_range(msb, lsb)?;
    let width = msb - lsb + 1;
    if width < 8 && value >> width != 0 {
        return Err(ConfigurationError::ValueTooWide { value, width });
    }
    let mask = range_mask(msb, lsb);
    Ok((byte & !mask) | ((value << lsb) & mask))
}
