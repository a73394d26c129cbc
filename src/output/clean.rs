use regex::Regex;
use std::sync::LazyLock;

/// Caption annotations such as `[Music]` or `[Applause]`
static ANNOTATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\[[^\]]*\]").unwrap());
static LINE_BREAKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\r\n]+").unwrap());
static SPACE_BEFORE_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([.,!?;:])").unwrap());
static LETTER_AFTER_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([.,!?;:])(\p{L})").unwrap());
static MULTI_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]{2,}").unwrap());

/// Turn raw caption text into one readable paragraph.
///
/// Removes bracketed annotations, turns line breaks into spaces, removes spaces
/// before `. , ! ? ; :` and puts exactly one space between those marks and a
/// following letter.
pub fn clean_transcript(raw: &str) -> String {
    let text = ANNOTATION.replace_all(raw, "");
    let text = LINE_BREAKS.replace_all(&text, " ");
    let text = SPACE_BEFORE_PUNCTUATION.replace_all(&text, "$1");
    let text = LETTER_AFTER_PUNCTUATION.replace_all(&text, "$1 $2");
    let text = MULTI_SPACE.replace_all(&text, " ");
    text.trim().to_string()
}
