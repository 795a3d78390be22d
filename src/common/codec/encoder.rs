pub(crate) use encode::*;

// Encoder
//------------------------------------------------------------------------------

pub(crate) mod encode {
    use std::borrow::Cow;

    use encoding_rs::SHIFT_JIS;

    use super::writer::{pad_remaining_capacity, push_eci_designator, push_segment, push_terminator};
    use crate::common::bits::BitStream;
    use crate::common::codec::{Eci, Mode, Segment, MODES, MODE_INDICATOR_BITS};
    use crate::common::error::{QRError, QRResult};
    use crate::common::metadata::{ECLevel, Version};

    /// A maximal run of input bytes sharing their cheapest mode. Version
    /// independent; resolved into a [`Segment`] once the version is known.
    #[derive(Debug, PartialEq, Eq, Copy, Clone)]
    pub(crate) struct Run {
        pub mode: Mode,
        pub start: usize,
        pub end: usize,
    }

    impl Run {
        fn len(&self) -> usize {
            self.end - self.start
        }
    }

    /// Applies the input transformations that precede segmentation: UTF-8 →
    /// Shift-JIS transcoding for forced Kanji, and the optional byte order
    /// mark.
    pub(crate) fn prepare_data<'a>(
        data: &'a [u8],
        forced: Option<Mode>,
        bom: bool,
    ) -> QRResult<Cow<'a, [u8]>> {
        let mut prepared = match forced {
            Some(Mode::Kanji) => to_shift_jis(data)?,
            _ => Cow::Borrowed(data),
        };
        if bom && forced != Some(Mode::Kanji) {
            let mut owned = Vec::with_capacity(UTF8_BOM.len() + prepared.len());
            owned.extend_from_slice(&UTF8_BOM);
            owned.extend_from_slice(&prepared);
            prepared = Cow::Owned(owned);
        }
        Ok(prepared)
    }

    fn to_shift_jis(data: &[u8]) -> QRResult<Cow<'_, [u8]>> {
        if first_non_kanji_byte(data).is_none() {
            return Ok(Cow::Borrowed(data));
        }
        let text = std::str::from_utf8(data).map_err(|e| QRError::UnsupportedCharacter {
            mode: Mode::Kanji,
            byte: data[e.valid_up_to()],
        })?;
        let (encoded, _, had_errors) = SHIFT_JIS.encode(text);
        let encoded = encoded.into_owned();
        if had_errors {
            return Err(QRError::UnsupportedCharacter { mode: Mode::Kanji, byte: b'?' });
        }
        match first_non_kanji_byte(&encoded) {
            Some(byte) => Err(QRError::UnsupportedCharacter { mode: Mode::Kanji, byte }),
            None => Ok(Cow::Owned(encoded)),
        }
    }

    // The byte at which `data` stops being a stream of kanji-range Shift-JIS
    // pairs, if any
    fn first_non_kanji_byte(data: &[u8]) -> Option<u8> {
        for pair in data.chunks(2) {
            if pair.len() == 1 || !Mode::is_kanji_pair(pair[0], pair[1]) {
                return Some(pair[0]);
            }
        }
        None
    }

    /// Greedy run detection: each byte joins the cheapest mode containing it
    /// and adjacent same-mode bytes merge. Not globally optimal by design.
    pub(crate) fn segment_input(data: &[u8], forced: Option<Mode>) -> QRResult<Vec<Run>> {
        if let Some(mode) = forced {
            if mode != Mode::Kanji {
                if let Some(&byte) = data.iter().find(|b| !mode.contains(**b)) {
                    return Err(QRError::UnsupportedCharacter { mode, byte });
                }
            }
            return Ok(vec![Run { mode, start: 0, end: data.len() }]);
        }

        if data.is_empty() {
            return Ok(vec![Run { mode: Mode::Byte, start: 0, end: 0 }]);
        }

        let mut runs: Vec<Run> = Vec::new();
        for (i, &b) in data.iter().enumerate() {
            let mode = MODES
                .iter()
                .copied()
                .find(|m| m.contains(b))
                .expect("Byte mode contains every byte");
            match runs.last_mut() {
                Some(run) if run.mode == mode => run.end = i + 1,
                _ => runs.push(Run { mode, start: i, end: i + 1 }),
            }
        }
        Ok(runs)
    }

    fn bit_size(runs: &[Run], ver: Version, eci: Eci) -> usize {
        let eci_bits = if eci == Eci::Default { 0 } else { MODE_INDICATOR_BITS + 8 };
        eci_bits
            + runs
                .iter()
                .map(|r| MODE_INDICATOR_BITS + ver.char_cnt_bits(r.mode) + r.mode.encoded_len(r.len()))
                .sum::<usize>()
    }

    // The mode reported in capacity errors: the least restrictive one present
    fn dominant_mode(runs: &[Run]) -> Mode {
        runs.iter().map(|r| r.mode).max().unwrap_or(Mode::Byte)
    }

    /// Finds the smallest version whose data capacity holds the stream, then
    /// serializes it.
    pub(crate) fn encode(
        data: &[u8],
        ecl: ECLevel,
        eci: Eci,
        forced: Option<Mode>,
    ) -> QRResult<(BitStream, Version)> {
        let runs = segment_input(data, forced)?;
        let mut sz = 0;
        for v in 1..=40 {
            let ver = Version(v);
            // Indicator widths only change at the band edges
            if v == 1 || v == 10 || v == 27 {
                sz = bit_size(&runs, ver, eci);
            }
            if sz <= ver.data_bit_capacity(ecl) {
                return Ok((write_stream(data, &runs, ver, ecl, eci), ver));
            }
        }
        let mode = dominant_mode(&runs);
        Err(QRError::CapacityExceeded {
            ec_level: ecl,
            mode,
            version: None,
            max_size: Version(40).char_capacity(mode, ecl),
        })
    }

    /// Serializes the stream for a caller-fixed version, validating that the
    /// version exists and the stream fits.
    pub(crate) fn encode_with_version(
        data: &[u8],
        ecl: ECLevel,
        ver: Version,
        eci: Eci,
        forced: Option<Mode>,
    ) -> QRResult<BitStream> {
        if !ver.is_valid() {
            return Err(QRError::InvalidVersion(*ver));
        }
        let runs = segment_input(data, forced)?;
        if bit_size(&runs, ver, eci) > ver.data_bit_capacity(ecl) {
            let mode = dominant_mode(&runs);
            return Err(QRError::CapacityExceeded {
                ec_level: ecl,
                mode,
                version: Some(ver),
                max_size: ver.char_capacity(mode, ecl),
            });
        }
        Ok(write_stream(data, &runs, ver, ecl, eci))
    }

    fn write_stream(data: &[u8], runs: &[Run], ver: Version, ecl: ECLevel, eci: Eci) -> BitStream {
        let mut bs = BitStream::new(ver.data_bit_capacity(ecl));
        if eci != Eci::Default {
            push_eci_designator(eci, &mut bs);
        }
        for run in runs {
            let seg = Segment::new(run.mode, ver.char_cnt_bits(run.mode), &data[run.start..run.end]);
            push_segment(seg, &mut bs);
        }
        push_terminator(&mut bs);
        pad_remaining_capacity(&mut bs);
        bs
    }

    static UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];



}

// Writer for encoded data
//------------------------------------------------------------------------------

pub(super) mod writer {
    use crate::common::bits::BitStream;
    use crate::common::codec::{
        Eci, Mode, Segment, ECI_MODE_INDICATOR, MODE_INDICATOR_BITS, PADDING_CODEWORDS,
    };

    pub fn push_eci_designator(eci: Eci, out: &mut BitStream) {
        out.push_bits(ECI_MODE_INDICATOR, MODE_INDICATOR_BITS);
        out.push_bits(eci.assignment(), 8);
    }

    pub fn push_segment(seg: Segment, out: &mut BitStream) {
        push_header(&seg, out);
        match seg.mode {
            Mode::Numeric => push_numeric_data(seg.data, out),
            Mode::Alphanumeric => push_alphanumeric_data(seg.data, out),
            Mode::Byte => push_byte_data(seg.data, out),
            Mode::Kanji => push_kanji_data(seg.data, out),
        }
    }

    fn push_header(seg: &Segment, out: &mut BitStream) {
        out.push_bits(seg.mode as u8, MODE_INDICATOR_BITS);
        let char_cnt = seg.mode.char_count(seg.data.len());
        debug_assert!(
            char_cnt < (1 << seg.len_bits),
            "Char count exceeds bit length: Char count {char_cnt}, Char count bits {}",
            seg.len_bits
        );
        out.push_bits(char_cnt as u16, seg.len_bits);
    }

    fn push_numeric_data(data: &[u8], out: &mut BitStream) {
        for chunk in data.chunks(3) {
            let len = (chunk.len() * 10 + 2) / 3;
            out.push_bits(Mode::Numeric.encode_chunk(chunk), len);
        }
    }

    fn push_alphanumeric_data(data: &[u8], out: &mut BitStream) {
        for chunk in data.chunks(2) {
            let len = (chunk.len() * 11 + 1) / 2;
            out.push_bits(Mode::Alphanumeric.encode_chunk(chunk), len);
        }
    }

    fn push_byte_data(data: &[u8], out: &mut BitStream) {
        for chunk in data.chunks(1) {
            out.push_bits(Mode::Byte.encode_chunk(chunk), 8);
        }
    }

    fn push_kanji_data(data: &[u8], out: &mut BitStream) {
        for chunk in data.chunks_exact(2) {
            out.push_bits(Mode::Kanji.encode_chunk(chunk), 13);
        }
    }

    pub fn push_terminator(out: &mut BitStream) {
        let bit_len = out.len();
        let bit_capacity = out.capacity();
        if bit_len < bit_capacity {
            let term_len = std::cmp::min(4, bit_capacity - bit_len);
            out.push_bits(0, term_len);
        }
    }

    pub fn pad_remaining_capacity(out: &mut BitStream) {
        push_padding_bits(out);
        push_padding_codewords(out);
    }

    fn push_padding_bits(out: &mut BitStream) {
        let offset = out.len() & 7;
        if offset > 0 {
            out.push_bits(0, 8 - offset);
        }
    }

    fn push_padding_codewords(out: &mut BitStream) {
        let offset = out.len() & 7;
        debug_assert!(
            offset == 0,
            "Bit offset should be zero before padding codewords: {}",
            offset
        );

        let remain_byte_capacity = (out.capacity() - out.len()) >> 3;
        PADDING_CODEWORDS.iter().copied().cycle().take(remain_byte_capacity).for_each(|pc| {
            out.push_bits(pc, 8);
        });
    }

    #[cfg(test)]
    mod writer_tests {
        use super::{
            push_alphanumeric_data, push_byte_data, push_eci_designator, push_header,
            push_numeric_data, push_padding_bits, push_padding_codewords, push_terminator,
        };
        use crate::common::bits::BitStream;
        use crate::common::codec::{Eci, Mode, Segment, PADDING_CODEWORDS};
        use crate::common::metadata::{ECLevel, Version};

        #[test]
        fn test_push_header_v1() {
            let ver = Version(1);
            let bit_capacity = ver.data_bit_capacity(ECLevel::L);
            let exp_vecs: [&[u8]; 3] = [
                &[0b00011111, 0b11111100],
                &[0b00101111, 0b11111000],
                &[0b01001111, 0b11110000],
            ];
            let dummy_vec = vec![0; 1023];
            let modes = [Mode::Numeric, Mode::Alphanumeric, Mode::Byte];
            let dummy_idx = [1023, 511, 255];
            for ((mode, di), exp_vec) in modes.iter().zip(dummy_idx.iter()).zip(exp_vecs.iter()) {
                let mut bs = BitStream::new(bit_capacity);
                let seg = Segment::new(*mode, ver.char_cnt_bits(*mode), &dummy_vec[..*di]);
                push_header(&seg, &mut bs);
                assert_eq!(bs.data(), *exp_vec);
            }
        }

        #[test]
        fn test_push_header_v10() {
            let ver = Version(10);
            let bit_capacity = ver.data_bit_capacity(ECLevel::L);
            let exp_vecs: [&[u8]; 3] = [
                &[0b00011111, 0b11111111],
                &[0b00101111, 0b11111110],
                &[0b01001111, 0b11111111, 0b11110000],
            ];
            let dummy_vec = vec![0; 65535];
            let modes = [Mode::Numeric, Mode::Alphanumeric, Mode::Byte];
            let dummy_idx = [4095, 2047, 65535];
            for ((mode, di), exp_vec) in modes.iter().zip(dummy_idx.iter()).zip(exp_vecs.iter()) {
                let mut bs = BitStream::new(bit_capacity);
                let seg = Segment::new(*mode, ver.char_cnt_bits(*mode), &dummy_vec[..*di]);
                push_header(&seg, &mut bs);
                assert_eq!(bs.data(), *exp_vec);
            }
        }

        #[test]
        fn test_push_header_v27() {
            let ver = Version(27);
            let bit_capacity = ver.data_bit_capacity(ECLevel::L);
            let exp_vecs: [&[u8]; 3] = [
                &[0b00011111, 0b11111111, 0b11000000],
                &[0b00101111, 0b11111111, 0b10000000],
                &[0b01001111, 0b11111111, 0b11110000],
            ];
            let dummy_vec = vec![0; 65535];
            let modes = [Mode::Numeric, Mode::Alphanumeric, Mode::Byte];
            let dummy_idx = [16383, 8191, 65535];
            for ((mode, di), exp_vec) in modes.iter().zip(dummy_idx.iter()).zip(exp_vecs.iter()) {
                let mut bs = BitStream::new(bit_capacity);
                let seg = Segment::new(*mode, ver.char_cnt_bits(*mode), &dummy_vec[..*di]);
                push_header(&seg, &mut bs);
                assert_eq!(bs.data(), *exp_vec);
            }
        }

        #[test]
        fn test_push_numeric_data() {
            let bit_capacity = Version(1).data_bit_capacity(ECLevel::L);
            let mut bs = BitStream::new(bit_capacity);
            push_numeric_data("01234567".as_bytes(), &mut bs);
            assert_eq!(bs.data(), [0b00000011, 0b00010101, 0b10011000, 0b01100000]);
            let mut bs = BitStream::new(bit_capacity);
            push_numeric_data("8".as_bytes(), &mut bs);
            assert_eq!(bs.data(), [0b10000000]);
        }

        #[test]
        fn test_push_alphanumeric_data() {
            let bit_capacity = Version(1).data_bit_capacity(ECLevel::L);
            let mut bs = BitStream::new(bit_capacity);
            push_alphanumeric_data("AC-42".as_bytes(), &mut bs);
            assert_eq!(bs.data(), [0b00111001, 0b11011100, 0b11100100, 0b00100000])
        }

        #[test]
        fn test_push_byte_data() {
            let bit_capacity = Version(1).data_bit_capacity(ECLevel::L);
            let mut bs = BitStream::new(bit_capacity);
            push_byte_data("a".as_bytes(), &mut bs);
            assert_eq!(bs.data(), [0b01100001])
        }

        #[test]
        fn test_push_eci_designator() {
            let mut bs = BitStream::new(64);
            push_eci_designator(Eci::Utf8, &mut bs);
            assert_eq!(bs.len(), 12);
            assert_eq!(bs.data(), [0b01110001, 0b10100000]);
        }

        #[test]
        fn test_push_terminator() {
            let bit_capacity = Version(1).data_bit_capacity(ECLevel::L);
            let capacity = (bit_capacity + 7) >> 3;
            let mut bs = BitStream::new(bit_capacity);
            bs.push_bits(0b1, 1);
            push_terminator(&mut bs);
            assert_eq!(bs.data(), [0b10000000]);
            assert_eq!(bs.len() & 7, 5);
            for _ in 0..capacity - 1 {
                bs.push_bits(0b11111111, 8);
            }
            push_terminator(&mut bs);
            assert_eq!(bs.len() & 7, 0);
        }

        #[test]
        fn test_push_padding_bits() {
            let bit_capacity = Version(1).data_bit_capacity(ECLevel::L);
            let mut bs = BitStream::new(bit_capacity);
            bs.push_bits(0b1, 1);
            push_padding_bits(&mut bs);
            assert_eq!(bs.data(), [0b10000000]);
            assert_eq!(bs.len() & 7, 0);
        }

        #[test]
        fn test_push_padding_codewords() {
            let bit_capacity = Version(1).data_bit_capacity(ECLevel::L);
            let mut bs = BitStream::new(bit_capacity);
            bs.push_bits(0b1, 1);
            push_padding_bits(&mut bs);
            push_padding_codewords(&mut bs);
            let mut output = vec![0b10000000];
            output.extend(PADDING_CODEWORDS.iter().cycle().take(18));
            assert_eq!(bs.data(), output);
        }
    }
}
