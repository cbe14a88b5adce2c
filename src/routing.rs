use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::extract::{extract_customer_text, word_count};
use crate::inference::{GenerationParams, Summarizer};

/// Extracted texts with at least this many words take the long-form path.
pub const LONG_FORM_MIN_WORDS: usize = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryPath {
    /// Short fragments, news-style model.
    ShortForm,
    /// Longer dialog-style transcripts.
    LongForm,
}

impl SummaryPath {
    pub fn for_word_count(words: usize) -> Self {
        if words < LONG_FORM_MIN_WORDS {
            SummaryPath::ShortForm
        } else {
            SummaryPath::LongForm
        }
    }

    pub fn params(&self) -> GenerationParams {
        match self {
            SummaryPath::ShortForm => GenerationParams {
                min_length: 5,
                max_length: 30,
            },
            SummaryPath::LongForm => GenerationParams {
                min_length: 10,
                max_length: 60,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutedSummary {
    pub path: SummaryPath,
    pub word_count: usize,
    pub summary: String,
}

/// Picks one of two summarizers by the word count of the customer's text.
pub struct SummaryRouter {
    short_form: Arc<dyn Summarizer>,
    long_form: Arc<dyn Summarizer>,
}

impl SummaryRouter {
    pub fn new(short_form: Arc<dyn Summarizer>, long_form: Arc<dyn Summarizer>) -> Self {
        Self {
            short_form,
            long_form,
        }
    }

    /// Takes the raw ticket and extracts the customer text itself.
    pub fn summarize(&self, raw_text: &str) -> Result<RoutedSummary> {
        let cleaned = extract_customer_text(raw_text);
        self.summarize_extracted(&cleaned)
    }

    pub fn summarize_extracted(&self, cleaned: &str) -> Result<RoutedSummary> {
        let words = word_count(cleaned);
        let path = SummaryPath::for_word_count(words);
        let summarizer = match path {
            SummaryPath::ShortForm => &self.short_form,
            SummaryPath::LongForm => &self.long_form,
        };
        debug!(words, ?path, "routing summary");

        let summary = summarizer.summarize(cleaned, &path.params())?;
        Ok(RoutedSummary {
            path,
            word_count: words,
            summary,
        })
    }
}
