use anyhow::{Context, Result};
use serde::Serialize;

use crate::extract::extract_customer_text;
use crate::routing::{SummaryPath, SummaryRouter};
use crate::sentiment::{Sentiment, SentimentStep};

/// Result of analyzing one ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisResult {
    pub sentiment: Sentiment,
    pub summary: String,
    pub extracted_text: String,
    #[serde(skip)]
    pub summary_path: Option<SummaryPath>,
    /// Words in `extracted_text`, the figure summary routing is decided on.
    #[serde(skip)]
    pub word_count: usize,
}

impl AnalysisResult {
    /// Returned when no customer text survives extraction. Neither model is
    /// consulted; with nothing said there is nothing negative to report.
    fn empty() -> Self {
        Self {
            sentiment: Sentiment::Positive,
            summary: String::new(),
            extracted_text: String::new(),
            summary_path: None,
            word_count: 0,
        }
    }
}

/// Runs extraction, sentiment and summary routing for one ticket.
pub struct Analyzer {
    sentiment: SentimentStep,
    router: SummaryRouter,
}

impl Analyzer {
    pub fn new(sentiment: SentimentStep, router: SummaryRouter) -> Self {
        Self { sentiment, router }
    }

    /// Blocking; model inference runs on the calling thread.
    pub fn analyze(&self, raw_text: &str) -> Result<AnalysisResult> {
        let extracted = extract_customer_text(raw_text);
        if extracted.is_empty() {
            return Ok(AnalysisResult::empty());
        }

        let sentiment = self
            .sentiment
            .classify(&extracted)
            .context("sentiment classification failed")?;
        let routed = self
            .router
            .summarize(raw_text)
            .context("summarization failed")?;

        Ok(AnalysisResult {
            sentiment,
            summary: routed.summary,
            extracted_text: extracted,
            summary_path: Some(routed.path),
            word_count: routed.word_count,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::inference::{GenerationParams, SequenceClassifier, Summarizer};
    use crate::sentiment::SentimentLabels;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Negative whenever the text mentions anger, otherwise positive.
    pub struct KeywordClassifier {
        pub calls: AtomicUsize,
    }

    impl SequenceClassifier for KeywordClassifier {
        fn logits(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text.contains("furious") || text.contains("angry") {
                Ok(vec![3.0, -3.0])
            } else {
                Ok(vec![-3.0, 3.0])
            }
        }
    }

    /// Echoes the first few words, tagged with the path parameters it was given.
    pub struct EchoSummarizer {
        pub calls: AtomicUsize,
    }

    impl Summarizer for EchoSummarizer {
        fn summarize(&self, text: &str, params: &GenerationParams) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let head: Vec<&str> = text.split_whitespace().take(5).collect();
            Ok(format!("[{}] {}", params.max_length, head.join(" ")))
        }
    }

    pub struct FailingSummarizer;

    impl Summarizer for FailingSummarizer {
        fn summarize(&self, _text: &str, _params: &GenerationParams) -> Result<String> {
            Err(anyhow!("out of memory"))
        }
    }

    pub fn fake_analyzer() -> (Analyzer, Arc<KeywordClassifier>, Arc<EchoSummarizer>) {
        let classifier = Arc::new(KeywordClassifier {
            calls: AtomicUsize::new(0),
        });
        let summarizer = Arc::new(EchoSummarizer {
            calls: AtomicUsize::new(0),
        });
        let analyzer = Analyzer::new(
            SentimentStep::new(classifier.clone(), SentimentLabels::default()),
            SummaryRouter::new(summarizer.clone(), summarizer.clone()),
        );
        (analyzer, classifier, summarizer)
    }

    #[test]
    fn analyzes_customer_turns_only() {
        let (analyzer, _, _) = fake_analyzer();
        let result = analyzer
            .analyze("Customer: I am furious, my package never came.\nAgent: sorry to hear that.")
            .unwrap();
        assert_eq!(result.extracted_text, "I am furious, my package never came.");
        assert_eq!(result.sentiment, Sentiment::Negative);
        assert_eq!(result.summary_path, Some(SummaryPath::ShortForm));
        assert_eq!(result.word_count, 7);
        assert_eq!(result.summary, "[30] I am furious, my package");
    }

    #[test]
    fn long_tickets_take_long_form_path() {
        let (analyzer, _, _) = fake_analyzer();
        let raw = "thanks for the quick help, the replacement arrived early and \
                   works perfectly, my whole family is happy with it now";
        let result = analyzer.analyze(raw).unwrap();
        assert_eq!(result.sentiment, Sentiment::Positive);
        assert_eq!(result.summary_path, Some(SummaryPath::LongForm));
        assert_eq!(result.word_count, 20);
        assert!(result.summary.starts_with("[60]"));
    }

    #[test]
    fn empty_extraction_short_circuits() {
        let (analyzer, classifier, summarizer) = fake_analyzer();
        for raw in ["", "   \n  ", "Agent: anything else I can do?"] {
            let result = analyzer.analyze(raw).unwrap();
            assert_eq!(result, AnalysisResult::empty());
        }
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 0);
        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn each_collaborator_runs_once_per_ticket() {
        let (analyzer, classifier, summarizer) = fake_analyzer();
        analyzer.analyze("User: where is my refund").unwrap();
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
        assert_eq!(summarizer.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn summarizer_failure_propagates() {
        let classifier = Arc::new(KeywordClassifier {
            calls: AtomicUsize::new(0),
        });
        let analyzer = Analyzer::new(
            SentimentStep::new(classifier, SentimentLabels::default()),
            SummaryRouter::new(Arc::new(FailingSummarizer), Arc::new(FailingSummarizer)),
        );
        let err = analyzer.analyze("Customer: hello").unwrap_err();
        assert!(format!("{err:#}").contains("out of memory"));
    }
}
