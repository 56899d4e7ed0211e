//! Packs a byte stream against a [`CodeTable`].
//!
//! Codes are written MSB first, eight payload bits per output byte. After the
//! last code a single stop bit `1` is appended and the final byte is padded
//! with zeros, so the decoder can find where the payload ends without a
//! length header. Empty input packs to an empty stream.

use std::time::Instant;

use log::{debug, trace, warn};

use crate::code_table::{Code, CodeTable};
use crate::error::{HuffmanError, Result};

const BYTE_BITS: usize = 8;

/// Output byte under construction, kept behind a sentinel bit like a [`Code`].
pub(crate) struct BitWriter {
    out: Vec<u8>,
    cur_byte: u16,
    free_bits: usize,
    bits_written: usize,
}

impl BitWriter {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        BitWriter {
            out: Vec::with_capacity(capacity),
            cur_byte: 1,
            free_bits: BYTE_BITS,
            bits_written: 0,
        }
    }

    pub(crate) fn bits_written(&self) -> usize {
        self.bits_written
    }

    pub(crate) fn push_code(&mut self, code: Code) {
        let mut bits = code.bits();
        let mut len = code.len();
        self.bits_written += len;

        while len > 0 {
            let payload = bits ^ (1u64 << len);
            if len <= self.free_bits {
                self.cur_byte = (self.cur_byte << len) | payload as u16;
                self.free_bits -= len;
                len = 0;
                if self.free_bits == 0 {
                    self.flush();
                }
            } else {
                // Fill the byte with the leading bits, carry the rest as a
                // shorter code behind a fresh sentinel.
                let shift = len - self.free_bits;
                let head = payload >> shift;
                self.cur_byte = (self.cur_byte << self.free_bits) | head as u16;
                self.flush();
                bits = (1u64 << shift) | (payload & ((1u64 << shift) - 1));
                len = shift;
            }
        }
    }

    fn flush(&mut self) {
        // The sentinel sits in bit 8 and falls off here.
        self.out.push(self.cur_byte as u8);
        self.cur_byte = 1;
        self.free_bits = BYTE_BITS;
    }

    /// Appends the stop bit and left-justifies the last byte.
    pub(crate) fn finish(mut self) -> Vec<u8> {
        if self.bits_written == 0 {
            return self.out;
        }
        self.push_code(Code::ONE);
        if self.free_bits < BYTE_BITS {
            self.cur_byte <<= self.free_bits;
            self.flush();
        }
        self.out
    }
}

/// Packs `bytes` with the codes in `table`.
///
/// Bytes missing from `table` are written as the table's escape code followed
/// by the literal byte. Without an escape code they fail with
/// [`HuffmanError::UnmappedSymbol`].
pub fn encode(bytes: &[u8], table: &CodeTable) -> Result<Vec<u8>> {
    debug!("Starting data encoding of {} bytes...", bytes.len());
    let start_time = Instant::now();

    let mut writer = BitWriter::with_capacity(bytes.len() / 2 + 1);
    let mut literals = 0usize;

    for (offset, &byte) in bytes.iter().enumerate() {
        if let Some(code) = table.get(byte) {
            writer.push_code(code);
            continue;
        }

        let Some(escape) = table.escape() else {
            return Err(HuffmanError::UnmappedSymbol { byte, offset });
        };
        trace!("Escaping byte {:#04x} at offset {} as a literal", byte, offset);
        writer.push_code(escape);
        writer.push_code(Code::literal(byte));
        literals += 1;
    }

    if literals > 0 {
        warn!("{} bytes had no code and were written as literals", literals);
    }

    let payload_bits = writer.bits_written();
    let encoded = writer.finish();
    debug!(
        "Encoding finished in {:.2?}: {} payload bits in {} bytes",
        start_time.elapsed(),
        payload_bits,
        encoded.len()
    );
    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code_table::assign_codes;
    use crate::frequency::analyze_frequencies;
    use crate::huffman::{build_tree, build_tree_with_escape};

    fn code(s: &str) -> Code {
        s.parse().unwrap()
    }

    #[test]
    fn two_codes_share_one_byte() {
        let table =
            CodeTable::from_codes([(b'A', code("111")), (b'B', code("10"))], None).unwrap();
        // 111 10, stop bit, two bits of padding
        assert_eq!(encode(b"AB", &table).unwrap(), vec![0b1111_0100]);
    }

    #[test]
    fn single_symbol_input() {
        let table = assign_codes(&build_tree(&analyze_frequencies(b"a", 1.0).unwrap()).unwrap());
        assert_eq!(encode(b"a", &table).unwrap(), vec![0b1100_0000]);
    }

    #[test]
    fn code_spans_byte_boundary() {
        let table =
            CodeTable::from_codes([(b'x', code("01011")), (b'y', code("1"))], None).unwrap();
        // 01011 01011, stop bit
        assert_eq!(
            encode(b"xx", &table).unwrap(),
            vec![0b0101_1010, 0b1110_0000]
        );
    }

    #[test]
    fn full_byte_gets_a_stop_byte() {
        let table =
            CodeTable::from_codes([(b'p', code("0110")), (b'q', code("1"))], None).unwrap();
        assert_eq!(
            encode(b"pp", &table).unwrap(),
            vec![0b0110_0110, 0b1000_0000]
        );
    }

    #[test]
    fn empty_input_packs_to_nothing() {
        let table = CodeTable::from_codes([(b'a', code("1"))], None).unwrap();
        assert!(encode(b"", &table).unwrap().is_empty());
    }

    #[test]
    fn unmapped_byte_without_escape_fails() {
        let table = assign_codes(&build_tree(&analyze_frequencies(b"ab", 1.0).unwrap()).unwrap());
        assert_eq!(
            encode(b"abz", &table),
            Err(HuffmanError::UnmappedSymbol {
                byte: b'z',
                offset: 2
            })
        );
    }

    #[test]
    fn unmapped_byte_is_escaped_as_literal() {
        let freq = analyze_frequencies(b"aaaa", 1.0).unwrap();
        let table = assign_codes(&build_tree_with_escape(&freq).unwrap());
        // escape = "1", a = "0"
        assert_eq!(table.escape(), Some(code("1")));
        // 0, 1, 01111010 ('z'), stop bit
        assert_eq!(
            encode(b"az", &table).unwrap(),
            vec![0b0101_1110, 0b1010_0000]
        );
    }
}
