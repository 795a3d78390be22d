//! Compact binary exchange form of a symbol: a `QRR` header and the module
//! matrix, quiet zone included, packed row-major MSB first. Optionally the
//! whole frame travels inside a DEFLATE or GZIP stream.

use std::io::{Read, Write};

use flate2::read::{DeflateDecoder, GzDecoder};
use flate2::write::{DeflateEncoder, GzEncoder};

use crate::builder::Symbol;
use crate::common::error::{QRError, QRResult};
use crate::common::metadata::Version;

// Compression
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub enum Compression {
    #[default]
    None,
    Deflate,
    Gzip,
}

// Module map
//------------------------------------------------------------------------------

/// The matrix recovered from a dump: plain dark/light modules plus the
/// version implied by the side length.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ModuleMap {
    side: usize,
    ver: Version,
    bits: Vec<u8>,
}

impl ModuleMap {
    pub fn version(&self) -> Version {
        self.ver
    }

    pub fn width(&self) -> usize {
        self.side - 2 * QUIET_ZONE
    }

    pub fn is_dark(&self, r: i16, c: i16) -> bool {
        let w = self.width() as i16;
        debug_assert!(0 <= r && r < w, "Row out of bounds: Row {r}, Width {w}");
        debug_assert!(0 <= c && c < w, "Column out of bounds: Column {c}, Width {w}");

        let pos = (r as usize + QUIET_ZONE) * self.side + c as usize + QUIET_ZONE;
        self.bits[pos >> 3] & (0b10000000 >> (pos & 7)) != 0
    }
}

// Packing
//------------------------------------------------------------------------------

pub fn pack(sym: &Symbol) -> Vec<u8> {
    let side = sym.width() + 2 * QUIET_ZONE;
    let mut out = Vec::with_capacity(HEADER_LEN + (side * side).div_ceil(8));
    out.extend_from_slice(&DUMP_MAGIC);
    out.push(0);
    out.push(side as u8);

    let mut acc = 0u8;
    let mut nbits = 0;
    for r in 0..side {
        for c in 0..side {
            let in_symbol = (QUIET_ZONE..side - QUIET_ZONE).contains(&r)
                && (QUIET_ZONE..side - QUIET_ZONE).contains(&c);
            let dark =
                in_symbol && sym.is_dark((r - QUIET_ZONE) as i16, (c - QUIET_ZONE) as i16);
            acc = (acc << 1) | dark as u8;
            nbits += 1;
            if nbits == 8 {
                out.push(acc);
                acc = 0;
                nbits = 0;
            }
        }
    }
    if nbits > 0 {
        out.push(acc << (8 - nbits));
    }
    out
}

pub fn unpack(bytes: &[u8]) -> QRResult<ModuleMap> {
    if bytes.len() < HEADER_LEN {
        return Err(QRError::TruncatedDump);
    }
    if bytes[..3] != DUMP_MAGIC {
        return Err(QRError::BadMagic);
    }

    let side = bytes[4] as usize;
    let quiet = 2 * QUIET_ZONE;
    if side < 21 + quiet || (side - 21 - quiet) % 4 != 0 {
        return Err(QRError::InvalidSideLength(bytes[4]));
    }
    let ver = Version(((side - 21 - quiet) / 4 + 1) as i16);
    if !ver.is_valid() {
        return Err(QRError::InvalidSideLength(bytes[4]));
    }

    let expected = HEADER_LEN + (side * side).div_ceil(8);
    if bytes.len() < expected {
        return Err(QRError::TruncatedDump);
    }
    Ok(ModuleMap { side, ver, bits: bytes[HEADER_LEN..expected].to_vec() })
}

pub fn pack_with(sym: &Symbol, compression: Compression) -> Vec<u8> {
    let raw = pack(sym);
    match compression {
        Compression::None => raw,
        Compression::Deflate => {
            let mut enc = DeflateEncoder::new(Vec::new(), flate2::Compression::default());
            enc.write_all(&raw)
                .and_then(|()| enc.finish())
                .expect("Writing to a Vec cannot fail")
        }
        Compression::Gzip => {
            let mut enc = GzEncoder::new(Vec::new(), flate2::Compression::default());
            enc.write_all(&raw)
                .and_then(|()| enc.finish())
                .expect("Writing to a Vec cannot fail")
        }
    }
}

pub fn unpack_with(bytes: &[u8], compression: Compression) -> QRResult<ModuleMap> {
    match compression {
        Compression::None => unpack(bytes),
        Compression::Deflate => {
            let mut buf = Vec::new();
            DeflateDecoder::new(bytes)
                .read_to_end(&mut buf)
                .map_err(|_| QRError::CorruptStream)?;
            unpack(&buf)
        }
        Compression::Gzip => {
            let mut buf = Vec::new();
            GzDecoder::new(bytes).read_to_end(&mut buf).map_err(|_| QRError::CorruptStream)?;
            unpack(&buf)
        }
    }
}

/// Sniffs the framing: the QRR magic means a raw dump, the gzip magic a GZIP
/// stream, anything else raw DEFLATE.
pub fn unpack_auto(bytes: &[u8]) -> QRResult<ModuleMap> {
    if bytes.starts_with(&DUMP_MAGIC) {
        unpack(bytes)
    } else if bytes.starts_with(&GZIP_MAGIC) {
        unpack_with(bytes, Compression::Gzip)
    } else {
        unpack_with(bytes, Compression::Deflate)
    }
}

// Global constants
//------------------------------------------------------------------------------

static DUMP_MAGIC: [u8; 3] = *b"QRR";

static GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

const HEADER_LEN: usize = 5;

const QUIET_ZONE: usize = 4;

#[cfg(test)]
mod dump_tests {
    use test_case::test_case;

    use super::{pack, pack_with, unpack, unpack_auto, unpack_with, Compression, QRError};
    use crate::builder::{QRBuilder, Symbol};
    use crate::common::metadata::{ECLevel, Version};

    fn build(data: &[u8], ver: Version) -> Symbol {
        QRBuilder::new(data).version(ver).ec_level(ECLevel::M).build().unwrap()
    }

    fn assert_matrix_eq(sym: &Symbol, map: &super::ModuleMap) {
        assert_eq!(map.version(), sym.version());
        assert_eq!(map.width(), sym.width());
        let w = sym.width() as i16;
        for r in 0..w {
            for c in 0..w {
                assert_eq!(map.is_dark(r, c), sym.is_dark(r, c), "({r}, {c})");
            }
        }
    }

    #[test]
    fn test_header_layout() {
        let sym = build(b"HELLO", Version(1));
        let bytes = pack(&sym);
        assert_eq!(&bytes[..3], b"QRR");
        assert_eq!(bytes[3], 0);
        assert_eq!(bytes[4], 29);
        assert_eq!(bytes.len(), 5 + (29 * 29usize).div_ceil(8));
    }

    #[test]
    fn test_quiet_zone_is_light() {
        let sym = build(b"QUIET", Version(2));
        let bytes = pack(&sym);
        // The first four rows are entirely inside the quiet zone
        let side = bytes[4] as usize;
        for bit in 0..4 * side {
            assert_eq!(bytes[5 + (bit >> 3)] & (0x80 >> (bit & 7)), 0);
        }
    }

    #[test_case(Version(1))]
    #[test_case(Version(2))]
    #[test_case(Version(7))]
    fn test_roundtrip(ver: Version) {
        let sym = build(b"ROUND TRIP 123", ver);
        let map = unpack(&pack(&sym)).unwrap();
        assert_matrix_eq(&sym, &map);
    }

    #[test_case(Compression::None)]
    #[test_case(Compression::Deflate)]
    #[test_case(Compression::Gzip)]
    fn test_compressed_roundtrip(compression: Compression) {
        let sym = build(b"COMPRESSED ROUND TRIP", Version(3));
        let bytes = pack_with(&sym, compression);
        let map = unpack_with(&bytes, compression).unwrap();
        assert_matrix_eq(&sym, &map);
        let map = unpack_auto(&bytes).unwrap();
        assert_matrix_eq(&sym, &map);
    }

    #[test]
    fn test_bad_magic() {
        let sym = build(b"x", Version(1));
        let mut bytes = pack(&sym);
        bytes[0] = b'q';
        // An unrecognized frame is assumed to be DEFLATE and fails there
        assert_eq!(unpack(&bytes), Err(QRError::BadMagic));
        assert_eq!(unpack_auto(&bytes), Err(QRError::CorruptStream));
    }

    #[test]
    fn test_truncated() {
        let sym = build(b"x", Version(1));
        let bytes = pack(&sym);
        assert_eq!(unpack(&bytes[..4]), Err(QRError::TruncatedDump));
        assert_eq!(unpack(&bytes[..bytes.len() - 1]), Err(QRError::TruncatedDump));
    }

    #[test]
    fn test_invalid_side() {
        let sym = build(b"x", Version(1));
        let mut bytes = pack(&sym);
        bytes[4] = 30;
        assert_eq!(unpack(&bytes), Err(QRError::InvalidSideLength(30)));
        bytes[4] = 20;
        assert_eq!(unpack(&bytes), Err(QRError::InvalidSideLength(20)));
    }
}
