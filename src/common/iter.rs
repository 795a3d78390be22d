use super::metadata::Version;

// Iterator over the encoding region of a symbol
//------------------------------------------------------------------------------

/// Walks the module grid in the placement order of the standard: two-column
/// strips from the right edge leftward, alternating upward and downward,
/// skipping the vertical timing column. Function and reserved modules are
/// emitted too; the caller skips whatever is already occupied.
pub struct EncRegionIter {
    w: i16,
    // Right column of the current strip
    col: i16,
    row: i16,
    on_right: bool,
    upward: bool,
}

impl EncRegionIter {
    pub fn new(version: Version) -> Self {
        let w = version.width();
        Self { w, col: w - 1, row: w - 1, on_right: true, upward: true }
    }
}

impl Iterator for EncRegionIter {
    type Item = (i16, i16);
    fn next(&mut self) -> Option<Self::Item> {
        if self.col < 0 {
            return None;
        }
        let res = (self.row, if self.on_right { self.col } else { self.col - 1 });

        if self.on_right {
            self.on_right = false;
            return Some(res);
        }
        self.on_right = true;
        let at_edge = if self.upward { self.row == 0 } else { self.row == self.w - 1 };
        if at_edge {
            self.upward = !self.upward;
            self.col -= 2;
            if self.col == VERT_TIMING_COL {
                self.col -= 1;
            }
        } else {
            self.row += if self.upward { -1 } else { 1 };
        }
        Some(res)
    }
}

// Global constants
//------------------------------------------------------------------------------

static VERT_TIMING_COL: i16 = 6;
