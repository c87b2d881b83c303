//! GT9110 configuration block.

use std::fs;
use std::path::Path;

use anapad_errors::{AnapadResult, ProtocolError};

/// Bytes in the configuration block, `0x8047..=0x80FE`.
pub const CONFIGURATION_LEN: usize = 184;

/// Marker written after the checksum telling the chip to load the block.
pub const FRESH_MARKER: u8 = 0x01;

/// The chip's configuration block, excluding checksum and marker.
#[derive(Clone, PartialEq, Eq)]
pub struct TouchscreenConfiguration {
    bytes: Vec<u8>,
}

impl TouchscreenConfiguration {
    /// Wrap a configuration block.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::ConfigurationLength`] unless `bytes` is
    /// exactly [`CONFIGURATION_LEN`] long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() != CONFIGURATION_LEN {
            return Err(ProtocolError::ConfigurationLength {
                expected: CONFIGURATION_LEN,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    /// Load a raw block from a binary file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, or a length error.
    pub fn from_file(path: impl AsRef<Path>) -> AnapadResult<Self> {
        let bytes = fs::read(path)?;
        Ok(Self::from_bytes(&bytes)?)
    }

    /// Block contents.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Two's complement of the byte sum, so that block plus checksum sums
    /// to zero mod 256.
    pub fn checksum(&self) -> u8 {
        let sum = self.bytes.iter().fold(0u8, |sum, &b| sum.wrapping_add(b));
        (!sum).wrapping_add(1)
    }

    /// Block followed by checksum and fresh marker, as written to the chip.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut wire = Vec::with_capacity(CONFIGURATION_LEN + 2);
        wire.extend_from_slice(&self.bytes);
        wire.push(self.checksum());
        wire.push(FRESH_MARKER);
        wire
    }

    /// Configuration version byte.
    pub fn version(&self) -> u8 {
        self.bytes.first().copied().unwrap_or(0)
    }
}

impl std::fmt::Debug for TouchscreenConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TouchscreenConfiguration")
            .field("version", &self.version())
            .field("checksum", &self.checksum())
            .finish_non_exhaustive()
    }
}
