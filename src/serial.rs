//! Certificate serial numbers.
//!
//! The default scheme is 8 bytes from the thread-local CSPRNG. The leading
//! octet is forced into `0x01..=0x7f` so the value is a positive, non-zero,
//! minimally encoded DER INTEGER. Uniqueness is probabilistic.

use rand::RngCore;

use crate::error::CryptoError;

/// Number of bytes in a serial produced by [`SerialNumber::random`].
pub const RANDOM_SERIAL_LEN: usize = 8;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SerialNumber(Vec<u8>);

impl SerialNumber {
    pub fn random() -> Self {
        let mut bytes = [0u8; RANDOM_SERIAL_LEN];
        rand::rng().fill_bytes(&mut bytes);
        bytes[0] = (bytes[0] & 0x7f).max(1);
        Self(bytes.to_vec())
    }

    /// A 4-byte tag followed by 4 random bytes.
    ///
    /// Kept for issuers that must keep producing the tagged format. The tag's
    /// first byte must be in `0x01..=0x7f`.
    pub fn legacy_tagged(tag: [u8; 4]) -> Self {
        let mut bytes = [0u8; 8];
        bytes[..4].copy_from_slice(&tag);
        rand::rng().fill_bytes(&mut bytes[4..]);
        Self(bytes.to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_x509(&self) -> Result<x509_cert::serial_number::SerialNumber, CryptoError> {
        Ok(x509_cert::serial_number::SerialNumber::new(&self.0)?)
    }
}
