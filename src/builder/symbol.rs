use crate::common::bits::BitStream;
use crate::common::iter::EncRegionIter;
use crate::common::mask::MaskPattern;
use crate::common::metadata::{
    format_info, ECLevel, Metadata, Version, FORMAT_INFO_BIT_LEN, FORMAT_INFO_COORDS_MAIN,
    FORMAT_INFO_COORDS_SIDE, VERSION_INFO_BIT_LEN, VERSION_INFO_COORDS_BL, VERSION_INFO_COORDS_TR,
};

// Module
//------------------------------------------------------------------------------

/// One cell of the grid, tagged by its role; `true` is dark.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) enum Module {
    Empty,
    Func(bool),
    Version(bool),
    Format(bool),
    Data(bool),
}

impl Module {
    pub fn is_dark(self) -> bool {
        match self {
            Module::Empty => false,
            Module::Func(d) | Module::Version(d) | Module::Format(d) | Module::Data(d) => d,
        }
    }
}

// Symbol
//------------------------------------------------------------------------------

/// A finished (or under-construction) QR symbol: the square module grid plus
/// the metadata a renderer or scanner derives it from.
#[derive(Debug, Clone)]
pub struct Symbol {
    grid: Box<[Module; MAX_GRID_SIZE]>,
    w: usize,
    ver: Version,
    ecl: ECLevel,
    mask: Option<MaskPattern>,
}

impl Symbol {
    pub(crate) fn new(ver: Version, ecl: ECLevel) -> Self {
        debug_assert!(ver.is_valid(), "Invalid version");

        let w = ver.width() as usize;
        Self { grid: Box::new([Module::Empty; MAX_GRID_SIZE]), w, ver, ecl, mask: None }
    }

    pub fn version(&self) -> Version {
        self.ver
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn ec_level(&self) -> ECLevel {
        self.ecl
    }

    pub fn mask(&self) -> Option<MaskPattern> {
        self.mask
    }

    pub fn metadata(&self) -> Metadata {
        Metadata::new(Some(self.ver), self.ecl, self.mask)
    }

    /// The single semantic contract with renderers: `true` is a dark module.
    pub fn is_dark(&self, r: i16, c: i16) -> bool {
        self.get(r, c).is_dark()
    }

    pub fn count_dark_modules(&self) -> usize {
        let sz = self.w * self.w;
        self.grid[..sz].iter().filter(|m| m.is_dark()).count()
    }

    fn coord_to_index(&self, r: i16, c: i16) -> usize {
        let w = self.w as i16;
        debug_assert!(-w <= r && r < w, "Row out of bounds: Row {r}, Width {w}");
        debug_assert!(-w <= c && c < w, "Column out of bounds: Column {c}, Width {w}");

        let r = if r < 0 { r + w } else { r };
        let c = if c < 0 { c + w } else { c };
        (r * w + c) as _
    }

    pub(crate) fn get(&self, r: i16, c: i16) -> Module {
        self.grid[self.coord_to_index(r, c)]
    }

    pub(crate) fn set(&mut self, r: i16, c: i16, module: Module) {
        let index = self.coord_to_index(r, c);
        self.grid[index] = module;
    }

    #[cfg(test)]
    pub(crate) fn to_debug_str(&self) -> String {
        let w = self.w as i16;
        let mut res = String::with_capacity((w * (w + 1)) as usize);
        res.push('\n');
        for i in 0..w {
            for j in 0..w {
                let c = match self.get(i, j) {
                    Module::Empty => '.',
                    Module::Func(true) => 'f',
                    Module::Func(false) => 'F',
                    Module::Version(true) => 'v',
                    Module::Version(false) => 'V',
                    Module::Format(true) => 'm',
                    Module::Format(false) => 'M',
                    Module::Data(true) => 'd',
                    Module::Data(false) => 'D',
                };
                res.push(c);
            }
            res.push('\n');
        }
        res
    }
}

#[cfg(test)]
mod symbol_util_tests {
    use super::{Module, Symbol};
    use crate::common::metadata::{ECLevel, Version};

    #[test]
    fn test_index_wrap() {
        let mut sym = Symbol::new(Version(1), ECLevel::L);
        let w = sym.w as i16;
        sym.set(-1, -1, Module::Func(true));
        assert_eq!(sym.get(w - 1, w - 1), Module::Func(true));
        sym.set(0, 0, Module::Func(true));
        assert_eq!(sym.get(-w, -w), Module::Func(true));
    }

    #[test]
    #[should_panic]
    fn test_row_out_of_bound() {
        let sym = Symbol::new(Version(1), ECLevel::L);
        let w = sym.w as i16;
        sym.get(w, 0);
    }

    #[test]
    #[should_panic]
    fn test_col_out_of_bound() {
        let sym = Symbol::new(Version(1), ECLevel::L);
        let w = sym.w as i16;
        sym.get(0, w);
    }

    #[test]
    #[should_panic]
    fn test_row_index_overwrap() {
        let sym = Symbol::new(Version(1), ECLevel::L);
        let w = sym.w as i16;
        sym.get(-(w + 1), 0);
    }
}

// Finder patterns
//------------------------------------------------------------------------------

impl Symbol {
    fn draw_finder_patterns(&mut self) {
        self.draw_finder_pattern_at(3, 3);
        self.draw_finder_pattern_at(3, -4);
        self.draw_finder_pattern_at(-4, 3);
    }

    // Draws the 7x7 finder centered at (r, c) together with its separator ring
    fn draw_finder_pattern_at(&mut self, r: i16, c: i16) {
        let (dr_top, dr_bottom) = if r > 0 { (-3, 4) } else { (-4, 3) };
        let (dc_left, dc_right) = if c > 0 { (-3, 4) } else { (-4, 3) };
        for i in dr_top..=dr_bottom {
            for j in dc_left..=dc_right {
                self.set(
                    r + i,
                    c + j,
                    match (i, j) {
                        (4 | -4, _) | (_, 4 | -4) => Module::Func(false),
                        (3 | -3, _) | (_, 3 | -3) => Module::Func(true),
                        (2 | -2, _) | (_, 2 | -2) => Module::Func(false),
                        _ => Module::Func(true),
                    },
                );
            }
        }
    }
}

#[cfg(test)]
mod finder_pattern_tests {
    use super::Symbol;
    use crate::common::metadata::{ECLevel, Version};

    #[test]
    fn test_finder_patterns() {
        let mut sym = Symbol::new(Version(1), ECLevel::L);
        sym.draw_finder_patterns();
        assert_eq!(
            sym.to_debug_str(),
            "\n\
             fffffffF.....Ffffffff\n\
             fFFFFFfF.....FfFFFFFf\n\
             fFfffFfF.....FfFfffFf\n\
             fFfffFfF.....FfFfffFf\n\
             fFfffFfF.....FfFfffFf\n\
             fFFFFFfF.....FfFFFFFf\n\
             fffffffF.....Ffffffff\n\
             FFFFFFFF.....FFFFFFFF\n\
             .....................\n\
             .....................\n\
             .....................\n\
             .....................\n\
             .....................\n\
             FFFFFFFF.............\n\
             fffffffF.............\n\
             fFFFFFfF.............\n\
             fFfffFfF.............\n\
             fFfffFfF.............\n\
             fFfffFfF.............\n\
             fFFFFFfF.............\n\
             fffffffF.............\n"
        );
    }
}

// Timing patterns
//------------------------------------------------------------------------------

impl Symbol {
    fn draw_timing_patterns(&mut self) {
        let last = self.w as i16 - 9;
        self.draw_line(6, 8, 6, last);
        self.draw_line(8, 6, last, 6);
    }

    fn draw_line(&mut self, r1: i16, c1: i16, r2: i16, c2: i16) {
        debug_assert!(r1 == r2 || c1 == c2, "Line is neither vertical nor horizontal");

        if r1 == r2 {
            for j in c1..=c2 {
                self.set(r1, j, Module::Func(j & 1 == 0));
            }
        } else {
            for i in r1..=r2 {
                self.set(i, c1, Module::Func(i & 1 == 0));
            }
        }
    }
}

#[cfg(test)]
mod timing_pattern_tests {
    use super::Symbol;
    use crate::common::metadata::{ECLevel, Version};

    #[test]
    fn test_timing_patterns() {
        let mut sym = Symbol::new(Version(1), ECLevel::L);
        sym.draw_timing_patterns();
        assert_eq!(
            sym.to_debug_str(),
            "\n\
             .....................\n\
             .....................\n\
             .....................\n\
             .....................\n\
             .....................\n\
             .....................\n\
             ........fFfFf........\n\
             .....................\n\
             ......f..............\n\
             ......F..............\n\
             ......f..............\n\
             ......F..............\n\
             ......f..............\n\
             .....................\n\
             .....................\n\
             .....................\n\
             .....................\n\
             .....................\n\
             .....................\n\
             .....................\n\
             .....................\n"
        );
    }
}

// Alignment patterns
//------------------------------------------------------------------------------

impl Symbol {
    fn draw_alignment_patterns(&mut self) {
        let poses = self.ver.alignment_positions();
        for &r in &poses {
            for &c in &poses {
                self.draw_alignment_pattern_at(r, c)
            }
        }
    }

    fn draw_alignment_pattern_at(&mut self, r: i16, c: i16) {
        let w = self.w as i16;
        // Centers under a finder pattern are left out
        if (r == 6 && (c == 6 || c == w - 7)) || (r == w - 7 && c == 6) {
            return;
        }
        for i in -2..=2 {
            for j in -2..=2 {
                self.set(
                    r + i,
                    c + j,
                    match (i, j) {
                        (-2 | 2, _) | (_, -2 | 2) | (0, 0) => Module::Func(true),
                        _ => Module::Func(false),
                    },
                )
            }
        }
    }

    pub(crate) fn draw_all_function_patterns(&mut self) {
        self.draw_finder_patterns();
        self.draw_timing_patterns();
        self.draw_alignment_patterns();
    }
}


// Format & version info
//------------------------------------------------------------------------------

impl Symbol {
    fn reserve_format_area(&mut self) {
        self.draw_format_info((1 << FORMAT_INFO_BIT_LEN) - 1);
    }

    fn draw_format_info(&mut self, format_info: u32) {
        self.draw_number(
            format_info,
            FORMAT_INFO_BIT_LEN,
            Module::Format(false),
            Module::Format(true),
            &FORMAT_INFO_COORDS_MAIN,
        );
        self.draw_number(
            format_info,
            FORMAT_INFO_BIT_LEN,
            Module::Format(false),
            Module::Format(true),
            &FORMAT_INFO_COORDS_SIDE,
        );
        // The module above the bottom-left finder is always dark
        self.set(-8, 8, Module::Format(true));
    }

    fn draw_version_info(&mut self) {
        if *self.ver < 7 {
            return;
        }
        let ver_info = self.ver.info();
        self.draw_number(
            ver_info,
            VERSION_INFO_BIT_LEN,
            Module::Version(false),
            Module::Version(true),
            &VERSION_INFO_COORDS_TR,
        );
        self.draw_number(
            ver_info,
            VERSION_INFO_BIT_LEN,
            Module::Version(false),
            Module::Version(true),
            &VERSION_INFO_COORDS_BL,
        );
    }

    fn draw_number(
        &mut self,
        number: u32,
        bit_len: usize,
        off_clr: Module,
        on_clr: Module,
        coords: &[(i16, i16)],
    ) {
        let mut mask = 1 << (bit_len - 1);
        for (r, c) in coords {
            let module = if number & mask == 0 { off_clr } else { on_clr };
            self.set(*r, *c, module);
            mask >>= 1;
        }
    }
}


// Encoding region
//------------------------------------------------------------------------------

impl Symbol {
    pub(crate) fn draw_encoding_region(&mut self, payload: BitStream) {
        self.reserve_format_area();
        self.draw_version_info();
        self.draw_payload(payload);

        let sz = self.w * self.w;
        debug_assert!(!self.grid[..sz].contains(&Module::Empty), "Empty module left after placement");
    }

    fn draw_payload(&mut self, payload: BitStream) {
        let mut coords = EncRegionIter::new(self.ver);
        for bit in payload {
            for (r, c) in coords.by_ref() {
                if matches!(self.get(r, c), Module::Empty) {
                    self.set(r, c, Module::Data(bit));
                    break;
                }
            }
        }
        self.fill_remainder_bits(coords);
    }

    // Remainder bits after the last codeword carry no data and stay light
    fn fill_remainder_bits(&mut self, coords: impl Iterator<Item = (i16, i16)>) {
        for (r, c) in coords {
            if matches!(self.get(r, c), Module::Empty) {
                self.set(r, c, Module::Data(false));
            }
        }
    }

    pub(crate) fn apply_mask(&mut self, pattern: MaskPattern) {
        self.mask = Some(pattern);
        let mask_fn = pattern.mask_function();
        let w = self.w as i16;
        for r in 0..w {
            for c in 0..w {
                if mask_fn(r, c) {
                    if let Module::Data(d) = self.get(r, c) {
                        self.set(r, c, Module::Data(!d))
                    }
                }
            }
        }
        let format_info = format_info(self.ecl, pattern);
        self.draw_format_info(format_info);
    }
}


// Global constants
//------------------------------------------------------------------------------

const MAX_GRID_SIZE: usize = 177 * 177;
