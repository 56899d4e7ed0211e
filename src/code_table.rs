//! Codes, code tables, and the two conversions between a [`HuffmanTree`] and
//! a [`CodeTable`].
//!
//! A [`Code`] stores its bits behind a leading sentinel 1-bit, so `0b101` is
//! the two-bit code `01` and leading zeros survive in a fixed-width integer.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use log::{debug, trace};

use crate::error::{HuffmanError, Result};
use crate::frequency::{FrequencyTable, Symbol};
use crate::huffman::{HuffmanTree, Node};

/// Longest code, in bits, that fits a `u64` next to its sentinel.
pub const MAX_CODE_LEN: usize = 63;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Code {
    bits: u64,
    length: u8,
}

impl Code {
    /// The empty path: just the sentinel.
    pub(crate) const ROOT: Code = Code { bits: 1, length: 0 };

    /// The one-bit code `1`.
    pub(crate) const ONE: Code = Code {
        bits: 0b11,
        length: 1,
    };

    /// Builds a code from a sentinel-prefixed bit pattern.
    pub fn from_sentinel(bits: u64) -> Result<Code> {
        if bits == 0 {
            return Err(HuffmanError::InvalidCode(
                "sentinel bit missing".to_string(),
            ));
        }
        let length = (u64::BITS - 1 - bits.leading_zeros()) as u8;
        Ok(Code { bits, length })
    }

    /// Builds a code from its `length` low-order payload bits.
    pub fn from_payload(payload: u64, length: usize) -> Result<Code> {
        if length > MAX_CODE_LEN {
            return Err(HuffmanError::CodeTooLong { length });
        }
        if payload >> length != 0 {
            return Err(HuffmanError::InvalidCode(format!(
                "payload {:#b} wider than {} bits",
                payload, length
            )));
        }
        Ok(Code {
            bits: (1u64 << length) | payload,
            length: length as u8,
        })
    }

    /// The eight bits of a literal byte, MSB first.
    pub(crate) fn literal(byte: u8) -> Code {
        Code {
            bits: 0x100 | byte as u64,
            length: 8,
        }
    }

    /// Sentinel-prefixed bits.
    pub fn bits(&self) -> u64 {
        self.bits
    }

    pub fn payload(&self) -> u64 {
        self.bits ^ (1u64 << self.length)
    }

    pub fn len(&self) -> usize {
        self.length as usize
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// `path = (path << 1) | bit`
    pub(crate) fn push(self, bit: u64) -> Result<Code> {
        if self.len() >= MAX_CODE_LEN {
            return Err(HuffmanError::CodeTooLong {
                length: self.len() + 1,
            });
        }
        Ok(Code {
            bits: (self.bits << 1) | (bit & 1),
            length: self.length + 1,
        })
    }

    /// Payload bit `i`, counting from the first (most significant) bit.
    pub(crate) fn bit(&self, i: usize) -> u64 {
        (self.bits >> (self.len() - 1 - i)) & 1
    }

    /// True when `self` is a prefix of `other` (a code is a prefix of itself).
    pub fn is_prefix_of(&self, other: &Code) -> bool {
        self.length <= other.length && other.bits >> (other.length - self.length) == self.bits
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.len() {
            f.write_str(if self.bit(i) == 1 { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl FromStr for Code {
    type Err = HuffmanError;

    fn from_str(s: &str) -> Result<Code> {
        let mut code = Code::ROOT;
        for c in s.chars() {
            let bit = match c {
                '0' => 0,
                '1' => 1,
                _ => {
                    return Err(HuffmanError::InvalidCode(format!(
                        "unexpected {:?} in {:?}",
                        c, s
                    )));
                }
            };
            code = code.push(bit)?;
        }
        Ok(code)
    }
}

/// What a leaf of the tree stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Byte(u8),
    /// The next eight bits are a literal byte.
    Escape,
}

/// Bidirectional byte ↔ code mapping, with an optional escape code.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CodeTable {
    by_symbol: BTreeMap<u8, Code>,
    escape: Option<Code>,
    by_code: BTreeMap<Code, Token>,
}

impl CodeTable {
    /// Rebuilds a table from persisted codes, checking that they form a
    /// prefix code.
    pub fn from_codes<I>(entries: I, escape: Option<Code>) -> Result<CodeTable>
    where
        I: IntoIterator<Item = (u8, Code)>,
    {
        let mut table = CodeTable::default();
        for (byte, code) in entries {
            if table.by_symbol.insert(byte, code).is_some() {
                return Err(HuffmanError::MalformedCodeTable(format!(
                    "byte {:#04x} listed twice",
                    byte
                )));
            }
            table.insert_code(code, Token::Byte(byte))?;
        }
        if let Some(code) = escape {
            table.escape = Some(code);
            table.insert_code(code, Token::Escape)?;
        }
        table.check_prefix_free()?;
        Ok(table)
    }

    fn insert_code(&mut self, code: Code, token: Token) -> Result<()> {
        if code.is_empty() {
            return Err(HuffmanError::MalformedCodeTable(format!(
                "{:?} has an empty code",
                token
            )));
        }
        if self.by_code.insert(code, token).is_some() {
            return Err(HuffmanError::MalformedCodeTable(format!(
                "code {} assigned twice",
                code
            )));
        }
        Ok(())
    }

    fn check_prefix_free(&self) -> Result<()> {
        // In lexicographic bit order a prefix sorts directly before some
        // code it prefixes, so adjacent pairs suffice.
        let mut codes: Vec<&Code> = self.by_code.keys().collect();
        codes.sort_by_key(|code| (code.payload() << (64 - code.len()), code.len()));
        for pair in codes.windows(2) {
            if pair[0].is_prefix_of(pair[1]) {
                return Err(HuffmanError::MalformedCodeTable(format!(
                    "code {} is a prefix of {}",
                    pair[0], pair[1]
                )));
            }
        }
        Ok(())
    }

    pub fn get(&self, byte: u8) -> Option<Code> {
        self.by_symbol.get(&byte).copied()
    }

    pub fn escape(&self) -> Option<Code> {
        self.escape
    }

    pub fn token(&self, code: &Code) -> Option<Token> {
        self.by_code.get(code).copied()
    }

    /// Number of byte codes, not counting the escape code.
    pub fn len(&self) -> usize {
        self.by_symbol.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_symbol.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u8, Code)> + '_ {
        self.by_symbol.iter().map(|(&byte, &code)| (byte, code))
    }

    pub fn max_code_len(&self) -> usize {
        self.by_code.keys().map(Code::len).max().unwrap_or(0)
    }

    /// Expected code length in bits/symbol for data distributed as `freq`.
    /// Bytes without a code are ignored.
    pub fn average_code_length(&self, freq: &FrequencyTable) -> f64 {
        freq.iter()
            .filter_map(|(byte, p)| self.get(*byte).map(|code| p * code.len() as f64))
            .sum()
    }
}

/// Walks the tree and records the path to every leaf.
pub fn assign_codes(tree: &HuffmanTree) -> CodeTable {
    let mut table = CodeTable::default();
    let mut record = |token: Token, code: Code| {
        trace!("Assigning code {} to {:?}", code, token);
        match token {
            Token::Byte(byte) => {
                table.by_symbol.insert(byte, code);
            }
            Token::Escape => table.escape = Some(code),
        }
        table.by_code.insert(code, token);
    };

    let mut stack = vec![(tree.root(), Code::ROOT)];
    while let Some((node, path)) = stack.pop() {
        // HuffmanTree bounds leaf depth by MAX_CODE_LEN, so the shifts below
        // never overflow.
        let code = if path.is_empty() { Code::ONE } else { path };
        match node {
            Node::Leaf(symbol) => record(Token::Byte(symbol.value), code),
            Node::Escape { .. } => record(Token::Escape, code),
            Node::Internal { left, right, .. } => {
                let right_path = Code {
                    bits: path.bits << 1,
                    length: path.length + 1,
                };
                let left_path = Code {
                    bits: (path.bits << 1) | 1,
                    length: path.length + 1,
                };
                stack.push((&**right, right_path));
                stack.push((&**left, left_path));
            }
            Node::Vacant => {}
        }
    }

    debug!(
        "Code table built: {} symbols, escape: {}, longest code {} bits",
        table.len(),
        table.escape.is_some(),
        table.max_code_len()
    );
    table
}

/// Alias of [`assign_codes`], named for symmetry with [`tree_from_codes`].
pub fn codes_from_tree(tree: &HuffmanTree) -> CodeTable {
    assign_codes(tree)
}

enum Partial {
    Empty,
    Leaf(Node),
    Branch(Box<Partial>, Box<Partial>),
}

/// Rebuilds the tree a table describes. Leaves get frequency `2^-len`.
///
/// Branches no code reaches become [`Node::Vacant`], so any prefix-free table
/// rebuilds; the decoder reports a stream that runs into one.
pub fn tree_from_codes(table: &CodeTable) -> Result<HuffmanTree> {
    if table.by_code.is_empty() {
        return Err(HuffmanError::MalformedCodeTable("empty code table".to_string()));
    }

    let mut root = Partial::Empty;
    for (code, token) in &table.by_code {
        insert_leaf(&mut root, code, leaf_node(*token, code))?;
    }

    debug!("Rebuilt tree from {} codes", table.by_code.len());
    Ok(HuffmanTree::from_root(finalize(root)))
}

fn leaf_node(token: Token, code: &Code) -> Node {
    let frequency = 0.5f64.powi(code.len() as i32);
    match token {
        Token::Byte(value) => Node::Leaf(Symbol { value, frequency }),
        Token::Escape => Node::Escape { freq: frequency },
    }
}

fn insert_leaf(root: &mut Partial, code: &Code, leaf: Node) -> Result<()> {
    let prefix_error = || {
        HuffmanError::MalformedCodeTable(format!("code {} collides with a shorter code", code))
    };

    let mut slot = root;
    for i in 0..code.len() {
        if matches!(slot, Partial::Empty) {
            *slot = Partial::Branch(Box::new(Partial::Empty), Box::new(Partial::Empty));
        }
        slot = match slot {
            Partial::Branch(left, right) => {
                if code.bit(i) == 1 {
                    &mut **left
                } else {
                    &mut **right
                }
            }
            _ => return Err(prefix_error()),
        };
    }

    if !matches!(slot, Partial::Empty) {
        return Err(HuffmanError::MalformedCodeTable(format!(
            "code {} is a prefix of another code",
            code
        )));
    }
    *slot = Partial::Leaf(leaf);
    Ok(())
}

// Recursion depth is bounded by MAX_CODE_LEN.
fn finalize(partial: Partial) -> Box<Node> {
    match partial {
        Partial::Empty => Box::new(Node::Vacant),
        Partial::Leaf(node) => Box::new(node),
        Partial::Branch(left, right) => Box::new(Node::merge(finalize(*left), finalize(*right))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::analyze_frequencies;
    use crate::huffman::{build_tree, build_tree_with_escape};

    fn code(s: &str) -> Code {
        s.parse().unwrap()
    }

    fn table_for(input: &[u8]) -> CodeTable {
        let freq = analyze_frequencies(input, 1.0).unwrap();
        assign_codes(&build_tree(&freq).unwrap())
    }

    #[test]
    fn code_keeps_leading_zeros() {
        let c = code("001");
        assert_eq!(c.bits(), 0b1001);
        assert_eq!(c.payload(), 0b001);
        assert_eq!(c.len(), 3);
        assert_eq!(c.to_string(), "001");
        assert_eq!(Code::from_sentinel(0b1001).unwrap(), c);
        assert_eq!(Code::from_payload(1, 3).unwrap(), c);
    }

    #[test]
    fn code_constructors_reject_bad_input() {
        assert!(Code::from_sentinel(0).is_err());
        assert!(Code::from_payload(0b100, 2).is_err());
        assert!(matches!(
            Code::from_payload(0, 64),
            Err(HuffmanError::CodeTooLong { length: 64 })
        ));
        assert!("012".parse::<Code>().is_err());
    }

    #[test]
    fn prefix_relation() {
        assert!(code("10").is_prefix_of(&code("101")));
        assert!(code("10").is_prefix_of(&code("10")));
        assert!(!code("101").is_prefix_of(&code("10")));
        assert!(!code("11").is_prefix_of(&code("101")));
    }

    #[test]
    fn lone_symbol_gets_one_bit() {
        let table = table_for(b"a");
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(b'a'), Some(code("1")));
    }

    #[test]
    fn three_equal_symbols() {
        let table = table_for(b"abc");
        assert_eq!(table.get(b'c'), Some(code("1")));
        assert_eq!(table.get(b'a'), Some(code("01")));
        assert_eq!(table.get(b'b'), Some(code("00")));
        assert_eq!(table.token(&code("01")), Some(Token::Byte(b'a')));
    }

    #[test]
    fn assigned_codes_are_prefix_free() {
        let table = table_for(b"the quick brown fox jumps over the lazy dog");
        let codes: Vec<Code> = table.iter().map(|(_, c)| c).collect();
        for (i, a) in codes.iter().enumerate() {
            for (j, b) in codes.iter().enumerate() {
                if i != j {
                    assert!(!a.is_prefix_of(b), "{} prefixes {}", a, b);
                }
            }
        }
    }

    #[test]
    fn frequent_symbols_get_shorter_codes() {
        let freq = analyze_frequencies(b"aaaaaaaabbbbccd", 1.0).unwrap();
        let table = assign_codes(&build_tree(&freq).unwrap());
        assert!(table.get(b'a').unwrap().len() <= table.get(b'b').unwrap().len());
        assert!(table.get(b'b').unwrap().len() <= table.get(b'd').unwrap().len());
        let average = table.average_code_length(&freq);
        assert!(average >= crate::frequency::entropy(&freq));
    }

    #[test]
    fn escape_code_is_recorded() {
        let freq = analyze_frequencies(b"ab", 1.0).unwrap();
        let table = assign_codes(&build_tree_with_escape(&freq).unwrap());
        let escape = table.escape().unwrap();
        assert_eq!(table.token(&escape), Some(Token::Escape));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn tree_round_trips_through_table() {
        let freq = analyze_frequencies(b"mississippi river", 1.0).unwrap();
        let table = assign_codes(&build_tree(&freq).unwrap());
        let rebuilt = tree_from_codes(&table).unwrap();
        assert_eq!(codes_from_tree(&rebuilt), table);
    }

    #[test]
    fn lone_code_rebuilds_with_a_vacant_sibling() {
        let table = CodeTable::from_codes([(b'x', code("0"))], None).unwrap();
        let tree = tree_from_codes(&table).unwrap();
        let Node::Internal { left, right, .. } = tree.root() else {
            panic!("root should be internal");
        };
        assert_eq!(**left, Node::Vacant);
        assert!(right.is_leaf());
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(codes_from_tree(&tree), table);
    }

    #[test]
    fn from_codes_rejects_prefix_collisions() {
        let result = CodeTable::from_codes([(b'a', code("1")), (b'b', code("10"))], None);
        assert!(matches!(result, Err(HuffmanError::MalformedCodeTable(_))));

        let result = CodeTable::from_codes([(b'a', code("01")), (b'b', code("01"))], None);
        assert!(matches!(result, Err(HuffmanError::MalformedCodeTable(_))));

        let result = CodeTable::from_codes([(b'a', code("0"))], Some(code("01")));
        assert!(matches!(result, Err(HuffmanError::MalformedCodeTable(_))));
    }

    #[test]
    fn incomplete_tables_rebuild() {
        for entries in [
            vec![(b'A', code("111")), (b'B', code("10"))],
            vec![(b'a', code("1")), (b'b', code("01"))],
            vec![(b'a', code("10"))],
        ] {
            let table = CodeTable::from_codes(entries, None).unwrap();
            let tree = tree_from_codes(&table).unwrap();
            assert_eq!(tree.leaf_count(), table.len());
            assert_eq!(codes_from_tree(&tree), table);
        }

        assert!(matches!(
            tree_from_codes(&CodeTable::default()),
            Err(HuffmanError::MalformedCodeTable(_))
        ));
    }
}
