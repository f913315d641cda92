//! Generated code cleanup
//!
//! Heuristic line filter, not a parser: it can keep prose that happens to
//! start with a code keyword and drop statements that match no known prefix.

use regex::Regex;
use std::sync::LazyLock;

/// Reasoning spans some models emit before the answer
static THINK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<think>.*?</think>").expect("valid think regex"));

/// Opening or closing fence marker, with optional language tag
static FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```[a-zA-Z]*").expect("valid fence regex"));

/// Lines that are clearly source statements
static CODE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(#|from |import |with |def |class |try|except|page\.|browser|context|print|expect)",
    )
    .expect("valid code prefix regex")
});

/// Lines that are clearly narrative
const NARRATIVE_PREFIXES: &[&str] = &[
    "Test Case",
    "<think>",
    "</think>",
    "###",
    "Alright",
    "* ",
    "- ",
    "• ",
];

/// Reduce generator output to plausible source lines
pub fn sanitize(raw_text: &str) -> String {
    let without_thinking = THINK_BLOCK.replace_all(raw_text, "");
    let without_fences = FENCE.replace_all(&without_thinking, "");

    without_fences
        .lines()
        .filter(|line| keep_line(line))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn keep_line(line: &str) -> bool {
    if CODE_PREFIX.is_match(line) {
        return true;
    }
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return false;
    }
    !NARRATIVE_PREFIXES.iter().any(|p| trimmed.starts_with(p))
}

/// Whether the generator declined to produce code
pub fn is_not_automatable(code: &str) -> bool {
    code.trim().trim_matches('.').eq_ignore_ascii_case("not automatable")
}
