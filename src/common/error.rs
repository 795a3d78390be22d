use std::fmt::{Display, Error, Formatter};

use super::codec::Mode;
use super::metadata::{ECLevel, Version};

// Error
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum QRError {
    // Encoder
    CapacityExceeded { ec_level: ECLevel, mode: Mode, version: Option<Version>, max_size: usize },
    InvalidVersion(i16),
    UnsupportedCharacter { mode: Mode, byte: u8 },

    // Symbol dump
    BadMagic,
    TruncatedDump,
    InvalidSideLength(u8),
    CorruptStream,

    // Block rectifier
    TooManyErrors,
}

impl Display for QRError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        match *self {
            Self::CapacityExceeded { ec_level, mode, version, max_size } => match version {
                Some(v) => write!(
                    f,
                    "Data too long for version {} at ec level {ec_level:?}: {mode:?} mode holds at most {max_size} characters",
                    *v
                ),
                None => write!(
                    f,
                    "Data too long for any version at ec level {ec_level:?}: {mode:?} mode holds at most {max_size} characters",
                ),
            },
            Self::InvalidVersion(v) => write!(f, "Invalid version {v}, expected 1-40"),
            Self::UnsupportedCharacter { mode, byte } => {
                write!(f, "Byte 0x{byte:02X} is not encodable in {mode:?} mode")
            }
            Self::BadMagic => f.write_str("Dump does not start with the QRR magic"),
            Self::TruncatedDump => f.write_str("Dump is shorter than its header demands"),
            Self::InvalidSideLength(s) => write!(f, "Side length {s} matches no version"),
            Self::CorruptStream => f.write_str("Compressed dump stream is corrupt"),
            Self::TooManyErrors => f.write_str("Too many errors to correct successfully"),
        }
    }
}

impl std::error::Error for QRError {}

pub type QRResult<T> = Result<T, QRError>;
