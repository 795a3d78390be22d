use super::encoder::ecc;
use super::MAX_BLOCK_SIZE;

/// One codeword block: data codewords followed by their error correction
/// codewords in a fixed-size arena.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(crate) struct Block {
    pub data: [u8; MAX_BLOCK_SIZE],
    // Block length
    pub len: usize,
    // Data length
    pub dlen: usize,
}

impl Block {
    pub fn new(raw: &[u8], len: usize) -> Self {
        let dlen = raw.len();
        debug_assert!(len <= MAX_BLOCK_SIZE, "Block length exceeds arena: {len}");
        debug_assert!(dlen <= len, "Data longer than block: Data {dlen}, Block {len}");

        let mut data = [0u8; MAX_BLOCK_SIZE];
        data[..dlen].copy_from_slice(raw);
        let parity = ecc(raw, len - dlen);
        data[dlen..len].copy_from_slice(&parity);
        Self { data, len, dlen }
    }

    pub fn with_encoded(encoded: &[u8], dlen: usize) -> Self {
        let len = encoded.len();
        let mut data = [0u8; MAX_BLOCK_SIZE];
        data[..len].copy_from_slice(encoded);
        Self { data, len, dlen }
    }

    pub fn ec_len(&self) -> usize {
        self.len - self.dlen
    }

    pub fn full(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub fn data(&self) -> &[u8] {
        &self.data[..self.dlen]
    }

    pub fn ecc(&self) -> &[u8] {
        &self.data[self.dlen..self.len]
    }
}
