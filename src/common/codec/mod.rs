mod encoder;
mod types;

pub use types::{Eci, Mode, PADDING_CODEWORDS};

pub(crate) use encoder::*;
pub(crate) use types::{Segment, ECI_MODE_INDICATOR, MODES, MODE_INDICATOR_BITS};
