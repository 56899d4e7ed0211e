use std::time::Instant;

use log::{debug, trace};

use crate::code_table::{CodeTable, Token, tree_from_codes};
use crate::error::{HuffmanError, Result};
use crate::huffman::{HuffmanTree, Node};

/// Reads bits MSB first through a sentinel-prefixed register holding what is
/// left of the current input byte.
pub(crate) struct BitReader<'a> {
    input: &'a [u8],
    pos: usize,
    register: u16,
    consumed: usize,
}

impl<'a> BitReader<'a> {
    /// `input` must be empty or end in a byte containing the stop bit.
    pub(crate) fn new(input: &'a [u8]) -> Result<Self> {
        if input.last() == Some(&0) {
            return Err(HuffmanError::TruncatedStream { consumed_bits: 0 });
        }
        Ok(BitReader {
            input,
            pos: 0,
            register: 1,
            consumed: 0,
        })
    }

    pub(crate) fn consumed_bits(&self) -> usize {
        self.consumed
    }

    fn refill(&mut self) -> bool {
        while self.register == 1 {
            let Some(&byte) = self.input.get(self.pos) else {
                return false;
            };
            self.pos += 1;

            self.register = if self.pos == self.input.len() {
                // Drop the stop bit and the padding after it.
                let padding = byte.trailing_zeros() + 1;
                (1u16 << (8 - padding)) | (byte as u16 >> padding)
            } else {
                0x100 | byte as u16
            };
        }
        true
    }

    pub(crate) fn next_bit(&mut self) -> Option<u8> {
        if !self.refill() {
            return None;
        }
        let width = u16::BITS - 1 - self.register.leading_zeros();
        let rest = width - 1;
        let bit = (self.register >> rest) & 1;
        self.register = (1u16 << rest) | (self.register & ((1u16 << rest) - 1));
        self.consumed += 1;
        Some(bit as u8)
    }

    fn require_bit(&mut self) -> Result<u8> {
        self.next_bit().ok_or(HuffmanError::TruncatedStream {
            consumed_bits: self.consumed,
        })
    }

    pub(crate) fn read_literal(&mut self) -> Result<u8> {
        let mut byte = 0u8;
        for _ in 0..8 {
            byte = (byte << 1) | self.require_bit()?;
        }
        Ok(byte)
    }
}

fn leaf_token(node: &Node) -> Option<Token> {
    match node {
        Node::Leaf(symbol) => Some(Token::Byte(symbol.value)),
        Node::Escape { .. } => Some(Token::Escape),
        Node::Internal { .. } | Node::Vacant => None,
    }
}

/// Follows one code from the root, given its first bit.
fn walk(root: &Node, first_bit: u8, reader: &mut BitReader<'_>) -> Result<Token> {
    let mut node = root;
    let mut bit = first_bit;
    loop {
        let Node::Internal { left, right, .. } = node else {
            break;
        };
        node = if bit == 1 { &**left } else { &**right };
        match node {
            Node::Internal { .. } => bit = reader.require_bit()?,
            Node::Vacant => {
                return Err(HuffmanError::MalformedCodeTable(format!(
                    "bits up to position {} match no code",
                    reader.consumed_bits() - 1
                )));
            }
            _ => break,
        }
    }
    leaf_token(node).ok_or(HuffmanError::TruncatedStream {
        consumed_bits: reader.consumed_bits(),
    })
}

/// Unpacks a stream produced by [`encode`](crate::encode) with the same table.
pub fn decode(encoded: &[u8], table: &CodeTable) -> Result<Vec<u8>> {
    let tree = tree_from_codes(table)?;
    decode_with_tree(encoded, &tree)
}

pub(crate) fn decode_with_tree(encoded: &[u8], tree: &HuffmanTree) -> Result<Vec<u8>> {
    debug!("Starting bitstream decoding of {} bytes...", encoded.len());
    let start_time = Instant::now();

    let root = tree.root();
    // A lone leaf from `build_tree` has no branches; its code is `1`.
    let lone = leaf_token(root);

    let mut reader = BitReader::new(encoded)?;
    let mut result = Vec::with_capacity(encoded.len() * 2);

    while let Some(first_bit) = reader.next_bit() {
        let token = match lone {
            Some(token) if first_bit == 1 => token,
            Some(_) => {
                return Err(HuffmanError::MalformedCodeTable(format!(
                    "bit 0 at position {} matches no code",
                    reader.consumed_bits() - 1
                )));
            }
            None => walk(root, first_bit, &mut reader)?,
        };

        let byte = match token {
            Token::Byte(byte) => byte,
            Token::Escape => {
                let byte = reader.read_literal()?;
                trace!("Decoded literal {:#04x}", byte);
                byte
            }
        };
        result.push(byte);
    }

    debug!(
        "Bitstream decoding finished in {:.2?}: {} bits into {} bytes",
        start_time.elapsed(),
        reader.consumed_bits(),
        result.len()
    );
    Ok(result)
}
