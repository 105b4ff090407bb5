//! Commit-reveal secret and its SHA-256 commitment.
//!
//! The commitment is published before betting outcomes are known; the seed is
//! published only after the ledger's reveal delay. `Seed` deliberately has a
//! redacted `Debug` so it never leaks into logs before reveal.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum HexError {
    #[error("invalid hex: {0}")]
    Invalid(#[from] hex::FromHexError),

    #[error("expected 32 bytes, got {0}")]
    Length(usize),
}

fn parse_32(text: &str) -> Result<[u8; 32], HexError> {
    let trimmed = text.strip_prefix("0x").unwrap_or(text);
    let bytes = hex::decode(trimmed)?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| HexError::Length(len))
}

/// 256-bit secret that keys the bout's random stream.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seed(#[serde(with = "hex_array")] [u8; 32]);

impl Seed {
    /// Draw a fresh seed from the operating system CSPRNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn commitment(&self) -> Commitment {
        Commitment::of(self)
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(text: &str) -> Result<Self, HexError> {
        parse_32(text).map(Self)
    }
}

impl std::fmt::Debug for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Seed(<redacted>)")
    }
}

/// SHA-256 of a [`Seed`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Commitment(#[serde(with = "hex_array")] [u8; 32]);

impl Commitment {
    pub fn of(seed: &Seed) -> Self {
        let digest = Sha256::digest(seed.as_bytes());
        Self(digest.into())
    }

    /// True if `seed` is the secret behind this commitment.
    pub fn verify(&self, seed: &Seed) -> bool {
        Self::of(seed) == *self
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(text: &str) -> Result<Self, HexError> {
        parse_32(text).map(Self)
    }
}

impl std::fmt::Debug for Commitment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Commitment({})", self.to_hex())
    }
}

impl std::fmt::Display for Commitment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

mod hex_array {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_32(&text).map_err(serde::de::Error::custom)
    }
}
