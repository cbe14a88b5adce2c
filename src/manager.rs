use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::analysis::Analyzer;
use crate::config::AppConfig;
use crate::inference::{
    distilbert_sentiment::DistilBertSentiment, loader::DevicePreference, t5_summarizer::T5Summarizer,
};
use crate::routing::SummaryRouter;
use crate::sentiment::{LabelSource, SentimentLabels, SentimentStep};

/// Pretrained models, loaded once at startup and read-only afterwards.
pub struct ModelManager {
    pub sentiment: Arc<DistilBertSentiment>,
    pub summary_short: Arc<T5Summarizer>,
    pub summary_long: Arc<T5Summarizer>,
    pub labels: SentimentLabels,
}

impl ModelManager {
    /// Blocking: may download snapshots and maps weights into memory.
    pub fn load(cfg: &AppConfig) -> Result<Self> {
        let device = DevicePreference::parse(cfg.device.as_deref()).open()?;

        let sentiment = Arc::new(
            DistilBertSentiment::load(&cfg.sentiment_model, &device, cfg.sentiment_max_len)
                .context("failed to load sentiment model")?,
        );
        let summary_short = Arc::new(
            T5Summarizer::load(
                &cfg.summary_short_model,
                &device,
                &cfg.summary_prefix,
                cfg.summary_max_input_tokens,
            )
            .context("failed to load short-form summarizer")?,
        );
        let summary_long = Arc::new(
            T5Summarizer::load(
                &cfg.summary_long_model,
                &device,
                &cfg.summary_prefix,
                cfg.summary_max_input_tokens,
            )
            .context("failed to load long-form summarizer")?,
        );

        let (labels, source) =
            SentimentLabels::resolve(cfg.sentiment_labels.as_ref(), sentiment.id2label());
        if source == LabelSource::Fallback {
            warn!(
                id2label = ?sentiment.id2label(),
                "classifier label table is not negative/positive, assuming index 0 is negative; \
                 set SENTIMENT_LABELS to make the order explicit"
            );
        }
        info!(?labels, ?source, "sentiment label map");

        Ok(Self {
            sentiment,
            summary_short,
            summary_long,
            labels,
        })
    }

    pub fn analyzer(&self) -> Analyzer {
        Analyzer::new(
            SentimentStep::new(self.sentiment.clone(), self.labels.clone()),
            SummaryRouter::new(self.summary_short.clone(), self.summary_long.clone()),
        )
    }
}
