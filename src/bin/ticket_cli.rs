use anyhow::{Context, Result};
use serde::Deserialize;
use std::{env, io::Read, process::ExitCode};

#[derive(Debug, Deserialize)]
struct Analysis {
    sentiment: String,
    summary: String,
}

/// What one run of the client ends with.
#[derive(Debug)]
enum Outcome {
    /// Nothing to send; the API was not called.
    BlankInput,
    /// Non-2xx status, transport failure or an unreadable body. Not retried.
    ApiFailure,
    Analyzed(Analysis),
}

impl Outcome {
    fn render(&self) -> String {
        match self {
            Outcome::BlankInput => "Please enter some ticket text.".to_string(),
            Outcome::ApiFailure => "Error calling API".to_string(),
            Outcome::Analyzed(analysis) => format!(
                "## Sentiment\nSentiment: {}\n\n## Summary\n{}",
                analysis.sentiment, analysis.summary
            ),
        }
    }

    fn is_success(&self) -> bool {
        matches!(self, Outcome::Analyzed(_))
    }
}

async fn analyze(client: &reqwest::Client, api_url: &str, text: &str) -> Outcome {
    if text.trim().is_empty() {
        return Outcome::BlankInput;
    }

    let response = match client
        .post(api_url)
        .json(&serde_json::json!({ "text": text }))
        .send()
        .await
    {
        Ok(res) if res.status().is_success() => res,
        _ => return Outcome::ApiFailure,
    };

    match response.json::<Analysis>().await {
        Ok(analysis) => Outcome::Analyzed(analysis),
        Err(_) => Outcome::ApiFailure,
    }
}

/// Posts a ticket to the analyzer and prints its sentiment and summary.
///
/// Text comes from the arguments, or stdin when there are none.
#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let api_url =
        dotenvy::var("API_URL").unwrap_or_else(|_| "http://localhost:8000/analyze".to_string());

    let mut text = env::args().skip(1).collect::<Vec<_>>().join(" ");
    if text.trim().is_empty() {
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read ticket text from stdin")?;
    }

    if !text.trim().is_empty() {
        println!("Analyzing..");
    }
    let outcome = analyze(&reqwest::Client::new(), &api_url, &text).await;

    if outcome.is_success() {
        println!("{}", outcome.render());
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("{}", outcome.render());
        Ok(ExitCode::FAILURE)
    }
}
