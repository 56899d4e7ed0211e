use log::{debug, info};

use crate::code_table::{CodeTable, assign_codes, tree_from_codes};
use crate::config::{CodecConfig, EscapePolicy};
use crate::decoder::decode_with_tree;
use crate::encoder::encode;
use crate::error::Result;
use crate::frequency::{FrequencyTable, analyze_frequencies, entropy};
use crate::huffman::{HuffmanTree, build_tree, build_tree_with_escape};

/// A trained code: the tree, its table, and the frequencies it came from.
///
/// The packed format carries no table, so whoever decodes needs the same
/// [`CodeTable`] (see [`HuffmanCodec::from_table`]).
#[derive(Debug, Clone)]
pub struct HuffmanCodec {
    tree: HuffmanTree,
    table: CodeTable,
    frequencies: Option<FrequencyTable>,
}

impl HuffmanCodec {
    /// Counts the configured share of `sample` and builds a code from it.
    pub fn train(sample: &[u8], config: &CodecConfig) -> Result<Self> {
        config.validate()?;
        info!(
            "Training code on {} bytes (sample ratio {}, escape {:?})",
            sample.len(),
            config.sample_ratio,
            config.escape
        );

        let frequencies = analyze_frequencies(sample, config.sample_ratio)?;
        let tree = match config.escape {
            EscapePolicy::Reject => build_tree(&frequencies)?,
            EscapePolicy::Literal => build_tree_with_escape(&frequencies)?,
        };
        let table = assign_codes(&tree);

        debug!(
            "Trained {} codes, entropy {:.4} bits/symbol, average code {:.4} bits",
            table.len(),
            entropy(&frequencies),
            table.average_code_length(&frequencies)
        );

        Ok(HuffmanCodec {
            tree,
            table,
            frequencies: Some(frequencies),
        })
    }

    /// A codec for a table received from elsewhere.
    pub fn from_table(table: CodeTable) -> Result<Self> {
        let tree = tree_from_codes(&table)?;
        Ok(HuffmanCodec {
            tree,
            table,
            frequencies: None,
        })
    }

    /// Trains on `data` itself and packs it in one go.
    pub fn compress(data: &[u8], config: &CodecConfig) -> Result<(Self, Vec<u8>)> {
        let codec = Self::train(data, config)?;
        let packed = codec.encode(data)?;
        info!(
            "Compressed {} bytes into {} bytes",
            data.len(),
            packed.len()
        );
        Ok((codec, packed))
    }

    pub fn encode(&self, data: &[u8]) -> Result<Vec<u8>> {
        encode(data, &self.table)
    }

    pub fn decode(&self, packed: &[u8]) -> Result<Vec<u8>> {
        decode_with_tree(packed, &self.tree)
    }

    pub fn code_table(&self) -> &CodeTable {
        &self.table
    }

    pub fn tree(&self) -> &HuffmanTree {
        &self.tree
    }

    /// `None` when the codec was built from a table.
    pub fn frequencies(&self) -> Option<&FrequencyTable> {
        self.frequencies.as_ref()
    }

    pub fn entropy(&self) -> Option<f64> {
        self.frequencies.as_ref().map(entropy)
    }

    pub fn average_code_length(&self) -> Option<f64> {
        self.frequencies
            .as_ref()
            .map(|freq| self.table.average_code_length(freq))
    }
}
