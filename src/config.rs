//! Settings for training a [`HuffmanCodec`](crate::HuffmanCodec).

use crate::error::{HuffmanError, Result};

/// What the packer does with a byte that has no code of its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EscapePolicy {
    /// Fail the encode call with [`HuffmanError::UnmappedSymbol`].
    #[default]
    Reject,
    /// Reserve an escape code in the tree; unmapped bytes are written as the
    /// escape code followed by the eight literal bits of the byte.
    Literal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CodecConfig {
    /// Fraction of the input, taken from the front, used to count frequencies.
    pub sample_ratio: f64,
    pub escape: EscapePolicy,
}

impl Default for CodecConfig {
    fn default() -> Self {
        CodecConfig {
            sample_ratio: 1.0,
            escape: EscapePolicy::Reject,
        }
    }
}

impl CodecConfig {
    pub fn with_sample_ratio(mut self, sample_ratio: f64) -> Self {
        self.sample_ratio = sample_ratio;
        self
    }

    pub fn with_escape(mut self, escape: EscapePolicy) -> Self {
        self.escape = escape;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.sample_ratio > 0.0 && self.sample_ratio <= 1.0) {
            return Err(HuffmanError::InvalidSampleRatio(self.sample_ratio));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scans_everything_and_rejects_unmapped() {
        let config = CodecConfig::default();
        assert_eq!(config.sample_ratio, 1.0);
        assert_eq!(config.escape, EscapePolicy::Reject);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_ratios() {
        for ratio in [0.0, -0.5, 1.5, f64::NAN] {
            let config = CodecConfig::default().with_sample_ratio(ratio);
            assert!(matches!(
                config.validate(),
                Err(HuffmanError::InvalidSampleRatio(_))
            ));
        }
    }
}
