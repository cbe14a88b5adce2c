use anyhow::{anyhow, Context, Result};

use crate::sentiment::SentimentLabels;

/// Process configuration, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub sentiment_model: String,
    pub summary_short_model: String,
    pub summary_long_model: String,
    pub device: Option<String>,
    /// Explicit class-index map; `None` defers to the classifier's label table.
    pub sentiment_labels: Option<SentimentLabels>,
    pub sentiment_max_len: usize,
    pub summary_max_input_tokens: usize,
    pub summary_prefix: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| dotenvy::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let string = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let sentiment_labels = lookup("SENTIMENT_LABELS")
            .filter(|v| !v.trim().is_empty())
            .map(|v| SentimentLabels::parse(&v).context("invalid SENTIMENT_LABELS"))
            .transpose()?;

        Ok(Self {
            bind_addr: string("BIND_ADDR", "0.0.0.0:8000"),
            sentiment_model: string(
                "SENTIMENT_MODEL",
                "distilbert-base-uncased-finetuned-sst-2-english",
            ),
            summary_short_model: string("SUMMARY_SHORT_MODEL", "t5-small"),
            summary_long_model: string("SUMMARY_LONG_MODEL", "t5-base"),
            device: lookup("MODEL_DEVICE").filter(|v| !v.trim().is_empty()),
            sentiment_labels,
            sentiment_max_len: token_budget(lookup("SENTIMENT_MAX_LEN"), "SENTIMENT_MAX_LEN", 256)?,
            summary_max_input_tokens: token_budget(
                lookup("SUMMARY_MAX_INPUT_TOKENS"),
                "SUMMARY_MAX_INPUT_TOKENS",
                512,
            )?,
            summary_prefix: string("SUMMARY_PREFIX", "summarize: "),
        })
    }
}

fn token_budget(value: Option<String>, key: &str, default: usize) -> Result<usize> {
    let Some(raw) = value else {
        return Ok(default);
    };
    let parsed = raw
        .trim()
        .parse::<usize>()
        .with_context(|| format!("{key} must be a positive integer, got '{raw}'"))?;
    if parsed < 8 {
        return Err(anyhow!("{key} must be at least 8 tokens, got {parsed}"));
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentiment::Sentiment;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_match_reference_deployment() {
        let cfg = config_from(&[]).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:8000");
        assert_eq!(cfg.sentiment_max_len, 256);
        assert_eq!(cfg.summary_max_input_tokens, 512);
        assert_eq!(cfg.summary_prefix, "summarize: ");
        assert!(cfg.device.is_none());
        assert!(cfg.sentiment_labels.is_none());
    }

    #[test]
    fn reads_overrides() {
        let cfg = config_from(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("MODEL_DEVICE", "cpu"),
            ("SENTIMENT_LABELS", "positive,negative"),
            ("SENTIMENT_MAX_LEN", "128"),
        ])
        .unwrap();
        assert_eq!(cfg.bind_addr, "127.0.0.1:9000");
        assert_eq!(cfg.device.as_deref(), Some("cpu"));
        assert_eq!(cfg.sentiment_max_len, 128);
        let labels = cfg.sentiment_labels.unwrap();
        assert_eq!(labels.label_for(0), Sentiment::Positive);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config_from(&[("SENTIMENT_MAX_LEN", "lots")]).is_err());
        assert!(config_from(&[("SUMMARY_MAX_INPUT_TOKENS", "2")]).is_err());
        assert!(config_from(&[("SENTIMENT_LABELS", "neutral")]).is_err());
    }
}
