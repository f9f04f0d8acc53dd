//! Facade state that survives a destroy/recreate cycle.
//!
//! Only facing and flash are persisted. Picture mode and session state
//! start from their defaults on recreation.
//!
//! Two encodings are provided: an 8-byte binary form (facing code then
//! flash code, each a little-endian `i32`) and TOML text. Both reject
//! anything that is not a complete, known snapshot.

use crate::capture::{FacingMode, FlashMode, UnknownModeCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Length of the binary encoding.
pub const ENCODED_LEN: usize = 8;

/// Errors from decoding or encoding a [`SavedState`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateError {
    /// The binary form has the wrong length.
    #[error("saved state must be {expected} bytes, got {actual}")]
    Length {
        /// Always [`ENCODED_LEN`].
        expected: usize,
        /// Length of the rejected input.
        actual: usize,
    },
    /// A code with no matching facing or flash mode.
    #[error(transparent)]
    UnknownCode(#[from] UnknownModeCode),
    /// The text encoder rejected the snapshot.
    #[error("failed to encode saved state: {0}")]
    Encode(String),
    /// The text is not a snapshot.
    #[error("failed to decode saved state: {0}")]
    Decode(String),
}

/// Snapshot of the persisted facade settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SavedState {
    /// Facing to restore.
    pub facing: FacingMode,
    /// Flash mode to restore.
    pub flash: FlashMode,
}

impl SavedState {
    /// Creates a snapshot.
    pub fn new(facing: FacingMode, flash: FlashMode) -> Self {
        Self { facing, flash }
    }

    /// Builds a snapshot from raw integer codes.
    pub fn from_codes(facing: i32, flash: i32) -> Result<Self, StateError> {
        Ok(Self {
            facing: FacingMode::try_from(facing)?,
            flash: FlashMode::try_from(flash)?,
        })
    }

    /// Packs both codes as little-endian `i32`s, facing first.
    pub fn to_bytes(&self) -> [u8; ENCODED_LEN] {
        let mut bytes = [0u8; ENCODED_LEN];
        bytes[..4].copy_from_slice(&self.facing.code().to_le_bytes());
        bytes[4..].copy_from_slice(&self.flash.code().to_le_bytes());
        bytes
    }

    /// Inverse of [`SavedState::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StateError> {
        let bytes: &[u8; ENCODED_LEN] = bytes.try_into().map_err(|_| StateError::Length {
            expected: ENCODED_LEN,
            actual: bytes.len(),
        })?;

        let mut facing = [0u8; 4];
        let mut flash = [0u8; 4];
        facing.copy_from_slice(&bytes[..4]);
        flash.copy_from_slice(&bytes[4..]);

        Self::from_codes(i32::from_le_bytes(facing), i32::from_le_bytes(flash))
    }

    /// Encodes as TOML text.
    pub fn encode(&self) -> Result<String, StateError> {
        toml::to_string(self).map_err(|e| StateError::Encode(e.to_string()))
    }

    /// Decodes TOML text produced by [`SavedState::encode`].
    pub fn decode(text: &str) -> Result<Self, StateError> {
        toml::from_str(text).map_err(|e| StateError::Decode(e.to_string()))
    }
}
