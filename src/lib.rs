//! # huffman_codec
//!
//! Huffman prefix-code compression of byte streams.
//!
//! ```rust
//! use huffman_codec::{CodecConfig, HuffmanCodec};
//!
//! let data = b"abracadabra";
//! let (codec, packed) = HuffmanCodec::compress(data, &CodecConfig::default())?;
//! assert_eq!(codec.decode(&packed)?, data);
//! # Ok::<(), huffman_codec::HuffmanError>(())
//! ```
//!
//! The packed stream does not embed its code table; callers keep the
//! [`CodeTable`] next to the payload. The stages are also usable on their own:
//! [`analyze_frequencies`] → [`build_tree`] → [`assign_codes`] → [`encode`] /
//! [`decode`].

pub mod code_table;
pub mod codec;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod frequency;
pub mod huffman;

mod queue;

pub use code_table::{
    Code, CodeTable, MAX_CODE_LEN, Token, assign_codes, codes_from_tree, tree_from_codes,
};
pub use codec::HuffmanCodec;
pub use config::{CodecConfig, EscapePolicy};
pub use decoder::decode;
pub use encoder::encode;
pub use error::{HuffmanError, Result};
pub use frequency::{FrequencyTable, Symbol, analyze_frequencies, entropy};
pub use huffman::{HuffmanTree, Node, build_tree, build_tree_with_escape};
