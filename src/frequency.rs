use std::collections::BTreeMap;

use log::{debug, trace};

use crate::error::{HuffmanError, Result};

/// Probability of each byte value seen in a sample, ordered by byte value.
pub type FrequencyTable = BTreeMap<u8, f64>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Symbol {
    pub value: u8,
    pub frequency: f64,
}

/// Counts the first `⌊len · sample_ratio⌋` bytes of `bytes` and normalizes
/// each count by the sample length.
pub fn analyze_frequencies(bytes: &[u8], sample_ratio: f64) -> Result<FrequencyTable> {
    if !(sample_ratio > 0.0 && sample_ratio <= 1.0) {
        return Err(HuffmanError::InvalidSampleRatio(sample_ratio));
    }

    let sample_len = ((bytes.len() as f64 * sample_ratio).floor() as usize).min(bytes.len());
    let sample = &bytes[..sample_len];
    if sample.is_empty() {
        return Err(HuffmanError::EmptyInput);
    }

    let mut counts = [0u64; 256];
    for &byte in sample {
        counts[byte as usize] += 1;
    }

    let total = sample.len() as f64;
    let freq: FrequencyTable = counts
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .map(|(byte, &count)| (byte as u8, count as f64 / total))
        .collect();

    debug!(
        "Sampled {} of {} bytes, {} distinct symbols",
        sample.len(),
        bytes.len(),
        freq.len()
    );
    for (byte, p) in &freq {
        trace!("Frequency of {:#04x}: {:.6}", byte, p);
    }

    Ok(freq)
}

/// Frequency table entries as symbols, in byte order.
pub fn symbols(freq: &FrequencyTable) -> impl Iterator<Item = Symbol> + '_ {
    freq.iter().map(|(&value, &frequency)| Symbol { value, frequency })
}

/// Shannon entropy in bits/symbol.
pub fn entropy(freq: &FrequencyTable) -> f64 {
    let total: f64 = freq.values().sum();
    if total <= 0.0 {
        return 0.0;
    }

    let entropy: f64 = freq
        .values()
        .filter(|&&p| p > 0.0)
        .map(|&p| {
            let p = p / total;
            -p * p.log2()
        })
        .sum();

    debug!(
        "Calculated entropy: {:.4} bits/symbol ({} symbols)",
        entropy,
        freq.len()
    );
    entropy
}
