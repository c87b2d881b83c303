use std::fmt;

/// Width of a register address on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterWidth {
    /// One address byte
    Bits8,
    /// Two address bytes, high byte first
    Bits16,
}

impl RegisterWidth {
    /// Number of address bytes sent before data.
    #[must_use]
    pub const fn byte_len(self) -> usize {
        match self {
            RegisterWidth::Bits8 => 1,
            RegisterWidth::Bits16 => 2,
        }
    }
}

/// A register on a slave, tagged with its address width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterAddress {
    /// 8-bit register address
    Bits8(u8),
    /// 16-bit register address
    Bits16(u16),
}

impl RegisterAddress {
    /// Address width.
    #[must_use]
    pub const fn width(self) -> RegisterWidth {
        match self {
            RegisterAddress::Bits8(_) => RegisterWidth::Bits8,
            RegisterAddress::Bits16(_) => RegisterWidth::Bits16,
        }
    }

    /// Numeric address, widened.
    #[must_use]
    pub const fn value(self) -> u16 {
        match self {
            RegisterAddress::Bits8(a) => a as u16,
            RegisterAddress::Bits16(a) => a,
        }
    }

    /// Register `by` positions after this one, in the same width.
    #[must_use]
    pub const fn offset(self, by: u16) -> Self {
        match self {
            RegisterAddress::Bits8(a) => RegisterAddress::Bits8(a.wrapping_add(by as u8)),
            RegisterAddress::Bits16(a) => RegisterAddress::Bits16(a.wrapping_add(by)),
        }
    }

    /// Append the on-wire address bytes to `out`.
    pub fn encode_into(self, out: &mut Vec<u8>) {
        match self {
            RegisterAddress::Bits8(a) => out.push(a),
            RegisterAddress::Bits16(a) => out.extend_from_slice(&a.to_be_bytes()),
        }
    }

    /// On-wire address bytes.
    #[must_use]
    pub fn encode(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width().byte_len());
        self.encode_into(&mut out);
        out
    }
}

impl fmt::Display for RegisterAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterAddress::Bits8(a) => write!(f, "{a:#04x}"),
            RegisterAddress::Bits16(a) => write!(f, "{a:#06x}"),
        }
    }
}
