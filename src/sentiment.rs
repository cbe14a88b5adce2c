use anyhow::{anyhow, Result};
use serde::Serialize;
use std::sync::Arc;

use crate::inference::{argmax, SequenceClassifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Negative,
    Positive,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Negative => "negative",
            Sentiment::Positive => "positive",
        }
    }

    /// `NEGATIVE`, `neg`, `Positive`... Generic names such as `LABEL_0` are
    /// not recognized.
    fn from_class_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        if name.starts_with("neg") {
            Some(Sentiment::Negative)
        } else if name.starts_with("pos") {
            Some(Sentiment::Positive)
        } else {
            None
        }
    }
}

/// Maps the classifier's class indices onto the two sentiment labels.
///
/// Swapping the classifier checkpoint can reorder its classes, so the map is
/// built from the checkpoint's own label table (or an explicit override)
/// instead of assuming index 0 is negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentimentLabels {
    by_index: Vec<Sentiment>,
}

impl Default for SentimentLabels {
    /// Index 0 is negative, every other index is positive.
    fn default() -> Self {
        Self {
            by_index: vec![Sentiment::Negative, Sentiment::Positive],
        }
    }
}

/// Where the active label map came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSource {
    Override,
    Checkpoint,
    /// Index 0 negative, the rest positive.
    Fallback,
}

impl SentimentLabels {
    /// Builds a map only when every class name reads as negative or positive.
    pub fn from_class_names<S: AsRef<str>>(names: &[S]) -> Option<Self> {
        if names.is_empty() {
            return None;
        }
        let by_index = names
            .iter()
            .map(|name| Sentiment::from_class_name(name.as_ref()))
            .collect::<Option<Vec<_>>>()?;
        Some(Self { by_index })
    }

    /// An explicit override wins over the checkpoint's `id2label`; an
    /// unreadable or missing table falls back to the default map.
    pub fn resolve<S: AsRef<str>>(
        override_labels: Option<&SentimentLabels>,
        id2label: &[S],
    ) -> (Self, LabelSource) {
        if let Some(labels) = override_labels {
            return (labels.clone(), LabelSource::Override);
        }
        match Self::from_class_names(id2label) {
            Some(labels) => (labels, LabelSource::Checkpoint),
            None => (Self::default(), LabelSource::Fallback),
        }
    }

    /// Parses a comma list such as `negative,positive`.
    pub fn parse(list: &str) -> Result<Self> {
        let names: Vec<&str> = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect();
        if names.is_empty() {
            return Err(anyhow!("empty sentiment label list"));
        }
        if let Some(bad) = names.iter().find(|name| {
            let lower = name.to_ascii_lowercase();
            lower != "negative" && lower != "positive"
        }) {
            return Err(anyhow!(
                "unknown sentiment label '{bad}', expected negative or positive"
            ));
        }
        Self::from_class_names(&names).ok_or_else(|| anyhow!("invalid sentiment label list"))
    }

    /// Indices past the end of the map are positive.
    pub fn label_for(&self, index: usize) -> Sentiment {
        self.by_index
            .get(index)
            .copied()
            .unwrap_or(Sentiment::Positive)
    }
}

/// Classifies already-extracted customer text.
pub struct SentimentStep {
    classifier: Arc<dyn SequenceClassifier>,
    labels: SentimentLabels,
}

impl SentimentStep {
    pub fn new(classifier: Arc<dyn SequenceClassifier>, labels: SentimentLabels) -> Self {
        Self { classifier, labels }
    }

    pub fn classify(&self, extracted: &str) -> Result<Sentiment> {
        let logits = self.classifier.logits(extracted)?;
        Ok(self.labels.label_for(argmax(&logits)?))
    }
}
