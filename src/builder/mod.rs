mod symbol;

pub use symbol::Symbol;

use std::ops::Deref;

use crate::common::bits::BitStream;
use crate::common::codec::{encode, encode_with_version, prepare_data, Eci, Mode};
use crate::common::ec::ecc;
use crate::common::error::QRResult;
use crate::common::mask::{apply_best_mask, MaskPattern};
use crate::common::metadata::{ECLevel, Metadata, Version};

// Builder
//------------------------------------------------------------------------------

/// Configures and runs one encode: mode analysis, version selection,
/// bitstream assembly, error correction, placement, masking.
pub struct QRBuilder<'a> {
    data: &'a [u8],
    version: Option<Version>,
    ec_level: ECLevel,
    mode: Option<Mode>,
    eci: Eci,
    force_utf8: bool,
    utf8_bom: bool,
    mask: Option<MaskPattern>,
}

impl<'a> QRBuilder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            version: None,
            ec_level: ECLevel::M,
            mode: None,
            eci: Eci::Default,
            force_utf8: false,
            utf8_bom: false,
            mask: None,
        }
    }

    pub fn data(&mut self, data: &'a [u8]) -> &mut Self {
        self.data = data;
        self
    }

    pub fn version(&mut self, version: Version) -> &mut Self {
        self.version = Some(version);
        self
    }

    pub fn unset_version(&mut self) -> &mut Self {
        self.version = None;
        self
    }

    pub fn ec_level(&mut self, ec_level: ECLevel) -> &mut Self {
        self.ec_level = ec_level;
        self
    }

    /// Forces every character into one mode instead of greedy run detection.
    pub fn mode(&mut self, mode: Mode) -> &mut Self {
        self.mode = Some(mode);
        self
    }

    pub fn byte_mode(&mut self, byte_mode: bool) -> &mut Self {
        self.mode = if byte_mode { Some(Mode::Byte) } else { None };
        self
    }

    pub fn eci(&mut self, eci: Eci) -> &mut Self {
        self.eci = eci;
        self
    }

    /// Emits the UTF-8 ECI designator and encodes the payload in byte mode.
    pub fn force_utf8(&mut self, force: bool) -> &mut Self {
        self.force_utf8 = force;
        self
    }

    /// Like [`Self::force_utf8`], additionally prepending the byte order
    /// mark to the payload.
    pub fn utf8_bom(&mut self, bom: bool) -> &mut Self {
        self.utf8_bom = bom;
        self
    }

    pub fn mask(&mut self, mask: MaskPattern) -> &mut Self {
        self.mask = Some(mask);
        self
    }

    pub fn metadata(&self) -> String {
        Metadata::new(self.version, self.ec_level, self.mask).to_string()
    }
}

impl QRBuilder<'_> {
    pub fn build(&self) -> QRResult<Symbol> {
        // The UTF-8 flags pin down both the interpretation and the mode
        let utf8 = self.force_utf8 || self.utf8_bom;
        let eci = if utf8 && self.eci == Eci::Default { Eci::Utf8 } else { self.eci };
        let forced = if utf8 { Some(Mode::Byte) } else { self.mode };

        let prepared = prepare_data(self.data, forced, self.utf8_bom)?;
        let data = prepared.as_ref();

        // Serialize segments into data codewords, finding a version if none
        // was requested
        let (encoded_data, version) = match self.version {
            Some(v) => (encode_with_version(data, self.ec_level, v, eci, forced)?, v),
            None => encode(data, self.ec_level, eci, forced)?,
        };

        // Compute error correction and interleave both codeword sequences
        let mut payload = BitStream::new(version.total_codewords() << 3);
        let (data_blocks, ecc_blocks) =
            Self::compute_ecc(encoded_data.data(), version, self.ec_level);
        payload.extend(&Self::interleave(&data_blocks));
        payload.extend(&Self::interleave(&ecc_blocks));

        let mut sym = Symbol::new(version, self.ec_level);
        sym.draw_all_function_patterns();
        sym.draw_encoding_region(payload);

        match self.mask {
            Some(m) => sym.apply_mask(m),
            None => {
                apply_best_mask(&mut sym);
            }
        }

        Ok(sym)
    }

    fn compute_ecc(data: &[u8], version: Version, ec_level: ECLevel) -> (Vec<&[u8]>, Vec<Vec<u8>>) {
        let data_blocks = Self::blockify(data, version, ec_level);

        let ecc_size_per_block = version.ecc_per_block(ec_level);
        let ecc_blocks =
            data_blocks.iter().map(|b| ecc(b, ecc_size_per_block)).collect::<Vec<_>>();

        (data_blocks, ecc_blocks)
    }

    pub(crate) fn blockify(data: &[u8], version: Version, ec_level: ECLevel) -> Vec<&[u8]> {
        let (block1_size, block1_count, block2_size, block2_count) =
            version.data_codewords_per_block(ec_level);

        let total_block1_size = block1_size * block1_count;
        let total_size = total_block1_size + block2_size * block2_count;

        debug_assert!(
            total_size == data.len(),
            "Data len doesn't match total size of blocks: Data len {}, Total block size {}",
            data.len(),
            total_size
        );

        let mut data_blocks = Vec::with_capacity(block1_count + block2_count);
        data_blocks.extend(data[..total_block1_size].chunks(block1_size));
        if block2_size > 0 {
            data_blocks.extend(data[total_block1_size..].chunks(block2_size));
        }
        data_blocks
    }

    /// Codewords recoverable per symbol; the misdecode-protection codewords
    /// of the smallest versions cannot be spent on correction.
    pub fn error_correction_capacity(version: Version, ec_level: ECLevel) -> usize {
        let p = match (version, ec_level) {
            (Version(1), ECLevel::L) => 3,
            (Version(2), ECLevel::L) | (Version(1), ECLevel::M) => 2,
            (Version(1), _) | (Version(3), ECLevel::L) => 1,
            _ => 0,
        };

        let ec_bytes = version.block_count(ec_level) * version.ecc_per_block(ec_level);

        (ec_bytes - p) / 2
    }

    /// Column-wise interleave: codeword i of every block before codeword
    /// i + 1 of any; exhausted short blocks simply stop contributing.
    pub(crate) fn interleave<T: Copy, V: Deref<Target = [T]>>(blocks: &[V]) -> Vec<T> {
        let max_block_size = blocks.iter().map(|b| b.len()).max().expect("Blocks is empty");
        let total_size = blocks.iter().map(|b| b.len()).sum::<usize>();
        let mut res = Vec::with_capacity(total_size);
        for i in 0..max_block_size {
            for b in blocks {
                if i < b.len() {
                    res.push(b[i]);
                }
            }
        }
        res
    }
}
