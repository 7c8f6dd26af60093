//! Relative locktime values and their BIP-68 sequence encoding
//!
//! CSV closures and the VTXO tree expiry field both carry a relative
//! locktime. The consensus interpretation of sequence numbers (disable bit,
//! type flag, 512-second granularity) is owned by `bitcoin::Sequence`; this
//! module only maps between that encoding and the `(type, value)` pair the
//! reports print.

use bitcoin::{relative, Sequence};

/// Unit of a relative locktime. Height-based is the default/zero type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelativeLocktimeType {
    #[default]
    Blocks,
    Seconds,
}

impl RelativeLocktimeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelativeLocktimeType::Blocks => "Blocks",
            RelativeLocktimeType::Seconds => "Seconds",
        }
    }
}

/// A relative locktime as a unit plus magnitude. For `Seconds` the magnitude
/// is in seconds and must be a multiple of 512 to be encodable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RelativeLocktime {
    pub kind: RelativeLocktimeType,
    pub value: u32,
}

/// Errors raised when a relative locktime cannot be encoded as a sequence
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LocktimeError {
    #[error("relative locktime of {0} blocks exceeds the 16-bit sequence range")]
    BlocksOutOfRange(u32),

    #[error("relative locktime of {0} seconds exceeds the encodable range")]
    SecondsOutOfRange(u32),

    #[error("relative locktime seconds must be a multiple of 512, got {0}")]
    SecondsNotAligned(u32),
}

impl RelativeLocktime {
    /// Reads a consensus sequence number as a relative locktime. Returns
    /// `None` when the sequence does not encode one (disable bit set).
    pub fn from_sequence(sequence: Sequence) -> Option<Self> {
        match sequence.to_relative_lock_time()? {
            relative::LockTime::Blocks(height) => Some(RelativeLocktime {
                kind: RelativeLocktimeType::Blocks,
                value: u32::from(height.value()),
            }),
            relative::LockTime::Time(time) => Some(RelativeLocktime {
                kind: RelativeLocktimeType::Seconds,
                value: u32::from(time.value()) * 512,
            }),
        }
    }

    /// Encodes this locktime as a BIP-68 sequence number.
    pub fn to_sequence(&self) -> Result<Sequence, LocktimeError> {
        match self.kind {
            RelativeLocktimeType::Blocks => {
                let height = u16::try_from(self.value)
                    .map_err(|_| LocktimeError::BlocksOutOfRange(self.value))?;
                Ok(Sequence::from_height(height))
            }
            RelativeLocktimeType::Seconds => {
                if self.value % 512 != 0 {
                    return Err(LocktimeError::SecondsNotAligned(self.value));
                }
                let intervals = u16::try_from(self.value / 512)
                    .map_err(|_| LocktimeError::SecondsOutOfRange(self.value))?;
                Ok(Sequence::from_512_second_intervals(intervals))
            }
        }
    }
}
