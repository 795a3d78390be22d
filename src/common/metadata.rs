use std::fmt::{Display, Error, Formatter};
use std::ops::Deref;

use super::codec::Mode;
use super::mask::MaskPattern;

// Version
//------------------------------------------------------------------------------

/// QR symbol size class 1-40; side length is `21 + 4 * (version - 1)` modules.
#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord)]
pub struct Version(pub i16);

impl Deref for Version {
    type Target = i16;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Version {
    pub const fn width(self) -> i16 {
        self.0 * 4 + 17
    }

    pub const fn is_valid(self) -> bool {
        1 <= self.0 && self.0 <= 40
    }

    /// Modules left over for data after all function patterns and info areas
    /// are stamped.
    const fn raw_data_modules(self) -> usize {
        let v = self.0 as usize;
        let mut raw = (16 * v + 128) * v + 64;
        if v >= 2 {
            let na = v / 7 + 2;
            raw -= (25 * na - 10) * na - 55;
            if v >= 7 {
                raw -= 36;
            }
        }
        raw
    }

    pub const fn total_codewords(self) -> usize {
        self.raw_data_modules() >> 3
    }

    /// Data modules beyond the last full codeword; always placed light.
    pub const fn remainder_bits(self) -> usize {
        self.raw_data_modules() & 7
    }

    pub const fn ecc_per_block(self, ecl: ECLevel) -> usize {
        ECC_PER_BLOCK[ecl as usize][self.0 as usize] as usize
    }

    pub const fn block_count(self, ecl: ECLevel) -> usize {
        BLOCK_COUNT[ecl as usize][self.0 as usize] as usize
    }

    pub const fn data_codewords(self, ecl: ECLevel) -> usize {
        self.total_codewords() - self.ecc_per_block(ecl) * self.block_count(ecl)
    }

    pub const fn data_bit_capacity(self, ecl: ECLevel) -> usize {
        self.data_codewords(ecl) << 3
    }

    /// Block structure as (short data len, short count, long data len, long
    /// count); long blocks carry exactly one extra data codeword.
    pub const fn data_codewords_per_block(self, ecl: ECLevel) -> (usize, usize, usize, usize) {
        let total = self.total_codewords();
        let blocks = self.block_count(ecl);
        let long_count = total % blocks;
        let short_size = total / blocks - self.ecc_per_block(ecl);
        let long_size = if long_count > 0 { short_size + 1 } else { 0 };
        (short_size, blocks - long_count, long_size, long_count)
    }

    pub const fn mode_bits(self) -> usize {
        4
    }

    /// Character count indicator width; widens at versions 10 and 27.
    pub const fn char_cnt_bits(self, mode: Mode) -> usize {
        let band = match self.0 {
            1..=9 => 0,
            10..=26 => 1,
            _ => 2,
        };
        match mode {
            Mode::Numeric => [10, 12, 14][band],
            Mode::Alphanumeric => [9, 11, 13][band],
            Mode::Byte => [8, 16, 16][band],
            Mode::Kanji => [8, 10, 12][band],
        }
    }

    /// Maximum character count a single segment of `mode` can hold at this
    /// version and ec level.
    pub fn char_capacity(self, mode: Mode, ecl: ECLevel) -> usize {
        let payload = self.data_bit_capacity(ecl) - self.mode_bits() - self.char_cnt_bits(mode);
        match mode {
            Mode::Numeric => {
                let partial = match payload % 10 {
                    0..=3 => 0,
                    4..=6 => 1,
                    _ => 2,
                };
                payload / 10 * 3 + partial
            }
            Mode::Alphanumeric => payload / 11 * 2 + if payload % 11 >= 6 { 1 } else { 0 },
            Mode::Byte => payload >> 3,
            Mode::Kanji => payload / 13,
        }
    }

    /// Alignment pattern center coordinates, shared by rows and columns.
    pub fn alignment_positions(self) -> Vec<i16> {
        let v = self.0 as usize;
        if v == 1 {
            return Vec::new();
        }
        let n = v / 7 + 2;
        let step = ((v * 8 + n * 3 + 5) / (n * 4 - 4) * 2) as i16;
        let mut poses = vec![6; n];
        let mut p = self.width() - 7;
        for pos in poses[1..].iter_mut().rev() {
            *pos = p;
            p -= step;
        }
        poses
    }

    /// 18-bit version information: 6 version bits followed by their BCH(18,6)
    /// remainder.
    pub const fn info(self) -> u32 {
        let v = self.0 as u32;
        let mut rem = v;
        let mut i = 0;
        while i < 12 {
            rem = (rem << 1) ^ ((rem >> 11) * VERSION_GEN_POLY);
            i += 1;
        }
        (v << 12) | rem
    }
}

// Error correction level
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord)]
pub enum ECLevel {
    L = 0,
    M = 1,
    Q = 2,
    H = 3,
}

impl ECLevel {
    /// The 2-bit value recorded in format information; not the table index.
    pub const fn format_bits(self) -> u32 {
        self as u32 ^ 1
    }
}

// Format information
//------------------------------------------------------------------------------

/// 15-bit format information: 2 ec level bits and 3 mask bits, their
/// BCH(15,5) remainder, the whole XORed with the fixed format mask.
pub fn format_info(ecl: ECLevel, mask: MaskPattern) -> u32 {
    let data = ecl.format_bits() << 3 | *mask as u32;
    let mut rem = data;
    for _ in 0..10 {
        rem = (rem << 1) ^ ((rem >> 9) * FORMAT_GEN_POLY);
    }
    ((data << 10) | rem) ^ FORMAT_MASK
}

// Metadata
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct Metadata {
    pub version: Option<Version>,
    pub ec_level: ECLevel,
    pub mask: Option<MaskPattern>,
}

impl Metadata {
    pub fn new(version: Option<Version>, ec_level: ECLevel, mask: Option<MaskPattern>) -> Self {
        Self { version, ec_level, mask }
    }
}

impl Display for Metadata {
    fn fmt(&self, f: &mut Formatter) -> Result<(), Error> {
        write!(f, "{{ Version: ")?;
        match self.version {
            Some(v) => write!(f, "{}", *v)?,
            None => write!(f, "None")?,
        }
        write!(f, ", Ec level: {:?}, Mask: ", self.ec_level)?;
        match self.mask {
            Some(m) => write!(f, "{}", *m)?,
            None => write!(f, "None")?,
        }
        write!(f, " }}")
    }
}

// Global constants
//------------------------------------------------------------------------------

pub static FORMAT_INFO_BIT_LEN: usize = 15;

pub static VERSION_INFO_BIT_LEN: usize = 18;

static FORMAT_GEN_POLY: u32 = 0x537;

static FORMAT_MASK: u32 = 0x5412;

const VERSION_GEN_POLY: u32 = 0x1F25;

// Model 2 tables indexed by [ec level][version]; version 0 is a filler.
#[rustfmt::skip]
const ECC_PER_BLOCK: [[u8; 41]; 4] = [
    [
        0, 7, 10, 15, 20, 26, 18, 20, 24, 30, 18, 20, 24, 26, 30, 22, 24, 28, 30, 28, 28, 28, 28,
        30, 30, 26, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // L
    [
        0, 10, 16, 26, 18, 24, 16, 18, 22, 22, 26, 30, 22, 22, 24, 24, 28, 28, 26, 26, 26, 26, 28,
        28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28, 28,
    ], // M
    [
        0, 13, 22, 18, 26, 18, 24, 18, 22, 20, 24, 28, 26, 24, 20, 30, 24, 28, 28, 26, 30, 28, 30,
        30, 30, 30, 28, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // Q
    [
        0, 17, 28, 22, 16, 22, 28, 26, 26, 24, 28, 24, 28, 22, 24, 24, 30, 28, 28, 26, 28, 30, 24,
        30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30, 30,
    ], // H
];

#[rustfmt::skip]
const BLOCK_COUNT: [[u8; 41]; 4] = [
    [
        0, 1, 1, 1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 4, 6, 6, 6, 6, 7, 8, 8, 9, 9, 10, 12, 12, 12,
        13, 14, 15, 16, 17, 18, 19, 19, 20, 21, 22, 24, 25,
    ], // L
    [
        0, 1, 1, 1, 2, 2, 4, 4, 4, 5, 5, 5, 8, 9, 9, 10, 10, 11, 13, 14, 16, 17, 17, 18, 20, 21,
        23, 25, 26, 28, 29, 31, 33, 35, 37, 38, 40, 43, 45, 47, 49,
    ], // M
    [
        0, 1, 1, 2, 2, 4, 4, 6, 6, 8, 8, 8, 10, 12, 16, 12, 17, 16, 18, 21, 20, 23, 23, 25, 27,
        29, 34, 34, 35, 38, 40, 43, 45, 48, 51, 53, 56, 59, 62, 65, 68,
    ], // Q
    [
        0, 1, 1, 2, 4, 4, 4, 5, 6, 8, 8, 11, 11, 16, 16, 18, 16, 19, 21, 25, 25, 25, 34, 30, 32,
        35, 37, 40, 42, 45, 48, 51, 54, 57, 60, 63, 66, 70, 74, 77, 81,
    ], // H
];

// Coordinates listed most significant bit first; negative values wrap from
// the far edge of the grid.
pub static FORMAT_INFO_COORDS_MAIN: [(i16, i16); 15] = [
    (8, 0),
    (8, 1),
    (8, 2),
    (8, 3),
    (8, 4),
    (8, 5),
    (8, 7),
    (8, 8),
    (7, 8),
    (5, 8),
    (4, 8),
    (3, 8),
    (2, 8),
    (1, 8),
    (0, 8),
];

pub static FORMAT_INFO_COORDS_SIDE: [(i16, i16); 15] = [
    (-1, 8),
    (-2, 8),
    (-3, 8),
    (-4, 8),
    (-5, 8),
    (-6, 8),
    (-7, 8),
    (8, -8),
    (8, -7),
    (8, -6),
    (8, -5),
    (8, -4),
    (8, -3),
    (8, -2),
    (8, -1),
];

pub static VERSION_INFO_COORDS_TR: [(i16, i16); 18] = [
    (5, -9),
    (5, -10),
    (5, -11),
    (4, -9),
    (4, -10),
    (4, -11),
    (3, -9),
    (3, -10),
    (3, -11),
    (2, -9),
    (2, -10),
    (2, -11),
    (1, -9),
    (1, -10),
    (1, -11),
    (0, -9),
    (0, -10),
    (0, -11),
];

pub static VERSION_INFO_COORDS_BL: [(i16, i16); 18] = [
    (-9, 5),
    (-10, 5),
    (-11, 5),
    (-9, 4),
    (-10, 4),
    (-11, 4),
    (-9, 3),
    (-10, 3),
    (-11, 3),
    (-9, 2),
    (-10, 2),
    (-11, 2),
    (-9, 1),
    (-10, 1),
    (-11, 1),
    (-9, 0),
    (-10, 0),
    (-11, 0),
];


#[cfg(test)]
mod format_info_tests {
    use super::*;

    #[test]
    fn test_known_format_infos() {
        assert_eq!(format_info(ECLevel::M, MaskPattern::new(0)), 0x5412);
        assert_eq!(format_info(ECLevel::L, MaskPattern::new(0)), 0x77C4);
    }

    #[test]
    fn test_format_infos_distinct() {
        let mut seen = Vec::new();
        for ecl in [ECLevel::L, ECLevel::M, ECLevel::Q, ECLevel::H] {
            for m in 0..8 {
                let info = format_info(ecl, MaskPattern::new(m));
                assert!(info < (1 << 15));
                assert!(!seen.contains(&info));
                seen.push(info);
            }
        }
    }

    #[test]
    fn test_metadata_display() {
        let meta = Metadata::new(Some(Version(1)), ECLevel::L, Some(MaskPattern::new(3)));
        assert_eq!(meta.to_string(), "{ Version: 1, Ec level: L, Mask: 3 }");
        let meta = Metadata::new(None, ECLevel::M, None);
        assert_eq!(meta.to_string(), "{ Version: None, Ec level: M, Mask: None }");
    }
}
