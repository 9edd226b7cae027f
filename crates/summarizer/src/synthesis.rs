//! Parsing of the intro/conclusion response.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::SummarizerError;

static INTRO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)Intro:\s*(.+?)\r?\n\r?\nConclusion:").expect("intro regex is valid")
});

const CONCLUSION_MARKER: &str = "Conclusion:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntroConclusion {
    pub intro: String,
    pub conclusion: String,
}

/// Split a model response of the form `Intro: ...\n\nConclusion: ...`.
///
/// The intro runs up to the first blank-line-separated `Conclusion:` marker;
/// the conclusion is whatever follows the last one.
pub fn parse_intro_conclusion(response: &str) -> Result<IntroConclusion, SummarizerError> {
    let malformed = |reason: &'static str| {
        debug!(reason, response, "unparsable intro/conclusion response");
        SummarizerError::MalformedSynthesisResponse(reason)
    };

    let captures = INTRO
        .captures(response)
        .ok_or_else(|| malformed("no intro before a conclusion marker"))?;
    let intro = captures[1].trim().to_string();

    let (_, tail) = response
        .rsplit_once(CONCLUSION_MARKER)
        .ok_or_else(|| malformed("no conclusion marker"))?;
    let conclusion = tail.trim().to_string();

    if intro.is_empty() || conclusion.is_empty() {
        return Err(malformed("empty intro or conclusion"));
    }
    Ok(IntroConclusion { intro, conclusion })
}
