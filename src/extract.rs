/// Speaker labels whose turns count as customer-authored.
pub const CUSTOMER_SPEAKERS: &[&str] = &["customer", "user", "client"];

/// One transcript line, split on its first colon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogLine<'a> {
    /// Normalized (trimmed, lowercased) speaker label, if the line had a colon.
    pub speaker: Option<String>,
    pub body: &'a str,
}

impl<'a> DialogLine<'a> {
    pub fn parse(line: &'a str) -> Self {
        match line.split_once(':') {
            Some((speaker, body)) => Self {
                speaker: Some(speaker.trim().to_lowercase()),
                body: body.trim(),
            },
            None => Self {
                speaker: None,
                body: line.trim(),
            },
        }
    }

    /// Untagged lines are treated as customer narrative.
    pub fn is_customer(&self) -> bool {
        match &self.speaker {
            Some(speaker) => CUSTOMER_SPEAKERS.contains(&speaker.as_str()),
            None => true,
        }
    }
}

/// Keeps only the customer's voice from a mixed-speaker transcript.
///
/// Lines tagged with a non-customer speaker (`Agent: ...`) are dropped whole.
/// Retained bodies are joined with a single space in their original order. Blank
/// lines are retained as empty fragments, so they still contribute a separator.
pub fn extract_customer_text(text: &str) -> String {
    let kept: Vec<&str> = text
        .trim()
        .split('\n')
        .map(DialogLine::parse)
        .filter(|line| line.is_customer())
        .map(|line| line.body)
        .collect();

    kept.join(" ").trim().to_string()
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_agent_turns() {
        let text = "Agent: how can I help?\nCustomer: my order is late";
        assert_eq!(extract_customer_text(text), "my order is late");
    }

    #[test]
    fn only_first_colon_is_structural() {
        let text = "Customer: my order said 10:30am and never arrived";
        assert_eq!(
            extract_customer_text(text),
            "my order said 10:30am and never arrived"
        );
    }

    #[test]
    fn speaker_labels_are_case_and_space_insensitive() {
        let text = "  USER :first\n Client:  second \nSupport: nope";
        assert_eq!(extract_customer_text(text), "first second");
    }

    #[test]
    fn untagged_lines_pass_through() {
        let text = "  my parcel is missing  \nplease help\r\n  thanks ";
        assert_eq!(
            extract_customer_text(text),
            "my parcel is missing please help thanks"
        );
    }

    #[test]
    fn unknown_speaker_message_is_discarded_entirely() {
        let text = "Bot: Customer: sneaky\nCustomer: real";
        assert_eq!(extract_customer_text(text), "real");
    }

    #[test]
    fn empty_and_blank_input_yield_empty_string() {
        assert_eq!(extract_customer_text(""), "");
        assert_eq!(extract_customer_text(" \n\t \n "), "");
        assert_eq!(extract_customer_text("Agent: only the agent spoke"), "");
    }

    #[test]
    fn blank_interior_lines_keep_their_separator() {
        assert_eq!(extract_customer_text("a\n\nb"), "a  b");
    }

    #[test]
    fn extraction_is_idempotent() {
        let inputs = [
            "Agent: hi\nCustomer: my order is late\nit was due monday",
            "plain text only",
            "User: refund please\n\nClient: asap",
        ];
        for input in inputs {
            let once = extract_customer_text(input);
            assert_eq!(extract_customer_text(&once), once);
        }
    }

    #[test]
    fn parse_keeps_body_after_first_colon() {
        let line = DialogLine::parse("Customer: at 10:30: late");
        assert_eq!(line.speaker.as_deref(), Some("customer"));
        assert_eq!(line.body, "at 10:30: late");
        assert!(line.is_customer());
    }

    #[test]
    fn counts_whitespace_delimited_words() {
        assert_eq!(word_count(""), 0);
        assert_eq!(word_count("a  b\tc\nd"), 4);
    }
}
