//! Response post-processing.

use regex::Regex;
use std::sync::LazyLock;

/// Fenced block with an optional language tag on the opening fence
static CODE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:\w*\n)?(.*?)```").expect("code block pattern is valid")
});

/// Content of the last fenced code block in `text`, trimmed.
///
/// Returns `None` when the text holds no complete fenced block.
pub fn parse_markdown_code_block(text: &str) -> Option<String> {
    CODE_BLOCK
        .captures_iter(text)
        .last()
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Last fenced block, or the whole reply when there is none or it is empty
pub fn code_block_or_text(text: &str) -> String {
    parse_markdown_code_block(text)
        .filter(|block| !block.is_empty())
        .unwrap_or_else(|| text.to_string())
}
