use anyhow::Result;
use regex::Regex;
use std::sync::LazyLock;

use crate::parser::DependencyParser;
use crate::schema::Token;

static CONTROL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{Cc}").expect("control character pattern is valid"));

/// Replace every control character (newlines, tabs, ...) with a space
pub fn strip_control_characters(text: &str) -> String {
    CONTROL_CHARS.replace_all(text, " ").into_owned()
}

/// Join the lowercase forms of tokens that are neither stop words nor punctuation
pub fn join_content_tokens(tokens: &[Token]) -> String {
    tokens
        .iter()
        .filter(|t| !t.is_stop && !t.is_punct)
        .map(|t| t.lower.trim())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Re-tokenize a text span and drop stop words and punctuation.
/// An empty result means nothing meaningful was left.
pub async fn remove_stop_words_and_punct<P>(parser: &P, text: &str) -> Result<String>
where
    P: DependencyParser + ?Sized,
{
    let tokens = parser.tokenize(text).await?;
    Ok(join_content_tokens(&tokens))
}
