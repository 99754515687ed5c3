use serde::{Deserialize, Serialize};

/// Which end of a short sequence receives the pad tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Padding {
    #[default]
    Pre,
    Post,
}

/// Which end of a long sequence is cut off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Truncating {
    #[default]
    Pre,
    Post,
}

/// Brings one sequence to exactly `maxlen` tokens.
///
/// A sequence already `maxlen` long is returned unchanged, so applying this
/// twice is the same as applying it once.
pub fn pad_sequence(
    seq: &[u32],
    maxlen: usize,
    padding: Padding,
    truncating: Truncating,
    value: u32,
) -> Vec<u32> {
    let kept: &[u32] = if seq.len() > maxlen {
        match truncating {
            Truncating::Pre => &seq[seq.len() - maxlen..],
            Truncating::Post => &seq[..maxlen],
        }
    } else {
        seq
    };

    let fill = std::iter::repeat(value).take(maxlen - kept.len());
    match padding {
        Padding::Pre => fill.chain(kept.iter().copied()).collect(),
        Padding::Post => kept.iter().copied().chain(fill).collect(),
    }
}

/// Pads or truncates every sequence to a common length: `maxlen`, or the
/// longest sequence when `maxlen` is `None`.
pub fn pad_sequences(
    seqs: &[Vec<u32>],
    maxlen: Option<usize>,
    padding: Padding,
    truncating: Truncating,
    value: u32,
) -> Vec<Vec<u32>> {
    let maxlen = maxlen.unwrap_or_else(|| seqs.iter().map(Vec::len).max().unwrap_or(0));
    seqs.iter()
        .map(|s| pad_sequence(s, maxlen, padding, truncating, value))
        .collect()
}

/// Replaces every id `>= num_words` with `oov_token`.
pub fn limit_vocabulary(seqs: &mut [Vec<u32>], num_words: u32, oov_token: u32) {
    for seq in seqs.iter_mut() {
        for id in seq.iter_mut() {
            if *id >= num_words {
                *id = oov_token;
            }
        }
    }
}
