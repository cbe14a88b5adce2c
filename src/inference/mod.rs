pub mod distilbert_sentiment;
pub mod loader;
pub mod t5_summarizer;

use anyhow::{anyhow, Result};

/// A pretrained two-or-more class text classifier.
pub trait SequenceClassifier: Send + Sync {
    /// Per-class logits for `text`, in the model's class-index order.
    fn logits(&self, text: &str) -> Result<Vec<f32>>;
}

/// Decoding bounds for one summarization call.
///
/// Decoding is always greedy and the input is always truncated to the model's
/// budget; only the output length varies between strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationParams {
    pub min_length: usize,
    pub max_length: usize,
}

pub trait Summarizer: Send + Sync {
    fn summarize(&self, text: &str, params: &GenerationParams) -> Result<String>;
}

/// Index of the largest logit. Ties resolve to the lowest index.
pub fn argmax(logits: &[f32]) -> Result<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &value) in logits.iter().enumerate() {
        match best {
            Some((_, top)) if top >= value => {}
            _ => best = Some((idx, value)),
        }
    }
    best.map(|(idx, _)| idx)
        .ok_or_else(|| anyhow!("classifier returned no logits"))
}

#[cfg(test)]
mod tests {
    use super::argmax;

    #[test]
    fn argmax_picks_highest_logit() {
        assert_eq!(argmax(&[-1.5, 2.25]).unwrap(), 1);
        assert_eq!(argmax(&[3.0, 0.1, -4.0]).unwrap(), 0);
    }

    #[test]
    fn argmax_ties_keep_first_index() {
        assert_eq!(argmax(&[0.5, 0.5, 0.1]).unwrap(), 0);
    }

    #[test]
    fn argmax_rejects_empty_logits() {
        assert!(argmax(&[]).is_err());
    }
}
