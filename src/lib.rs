//! # qrgrid
//!
//! A QR code (ISO/IEC 18004, Model 2) symbol encoder. Input bytes go in;
//! an abstract matrix of dark/light modules comes out, ready for any
//! renderer. The full pipeline is covered: mode analysis, version selection,
//! bitstream assembly, Reed-Solomon error correction over GF(256), function
//! pattern and payload placement, penalty-scored masking, and format/version
//! information.
//!
//! ## Quick start
//!
//! ```rust
//! use qrgrid::{encode, ECLevel};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let symbol = encode(b"HELLO WORLD", ECLevel::M)?;
//! assert_eq!(symbol.width(), 21);
//! for r in 0..symbol.width() as i16 {
//!     for c in 0..symbol.width() as i16 {
//!         let _dark = symbol.is_dark(r, c);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Full configuration
//!
//! ```rust
//! use qrgrid::{ECLevel, MaskPattern, QRBuilder, Version};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let symbol = QRBuilder::new(b"HELLO WORLD")
//!     .version(Version(2))        // fixed version; smallest fitting one when unset
//!     .ec_level(ECLevel::Q)       // defaults to ECLevel::M
//!     .mask(MaskPattern::new(3))  // fixed mask; best-penalty search when unset
//!     .build()?;
//! assert_eq!(symbol.version(), Version(2));
//! # Ok(())
//! # }
//! ```
//!
//! ## Exchange dumps
//!
//! A symbol can travel as a compact binary frame (optionally DEFLATE or GZIP
//! wrapped) and be reconstructed bit for bit:
//!
//! ```rust
//! use qrgrid::{dump, encode, ECLevel};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let symbol = encode(b"persist me", ECLevel::L)?;
//! let bytes = dump::pack(&symbol);
//! let map = dump::unpack(&bytes)?;
//! assert_eq!(map.version(), symbol.version());
//! # Ok(())
//! # }
//! ```

#![allow(clippy::suspicious_arithmetic_impl, clippy::suspicious_op_assign_impl)]

pub mod builder;
pub(crate) mod common;
pub mod dump;

pub use builder::{QRBuilder, Symbol};
pub use common::codec::{Eci, Mode};
pub use common::error::{QRError, QRResult};
pub use common::mask::MaskPattern;
pub use common::metadata::{ECLevel, Metadata, Version};

/// Encodes `data` at the given error correction level with every other
/// setting at its default: auto version, greedy mode analysis, best-penalty
/// mask.
pub fn encode(data: &[u8], ec_level: ECLevel) -> QRResult<Symbol> {
    QRBuilder::new(data).ec_level(ec_level).build()
}
