/// Returns at most `max_chars` characters of `text`, never splitting a code point.
pub fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
