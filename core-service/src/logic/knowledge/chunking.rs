//! Text chunking for the knowledge corpus

/// Split text into chunks of at most `max_chars` characters.
///
/// A cut lands on the last whitespace inside the window when that
/// whitespace lies after the chunk start, so words are not broken.
/// Chunks are trimmed and empty chunks dropped.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    if max_chars == 0 {
        return Vec::new();
    }

    let chars: Vec<char> = text.chars().collect();
    let length = chars.len();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < length {
        let mut end = (start + max_chars).min(length);

        if end < length {
            if let Some(offset) = chars[start..end].iter().rposition(|c| c.is_whitespace()) {
                if offset > 0 {
                    end = start + offset;
                }
            }
        }

        let chunk: String = chars[start..end].iter().collect();
        let chunk = chunk.trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }

        start = end;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_single_chunk() {
        assert_eq!(chunk_text("  Watch for new payees.  ", 500), vec!["Watch for new payees."]);
    }

    #[test]
    fn test_cuts_on_whitespace() {
        let chunks = chunk_text("alpha beta gamma delta", 12);
        assert_eq!(chunks, vec!["alpha beta", "gamma delta"]);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 12);
        }
    }

    #[test]
    fn test_long_word_is_hard_cut() {
        let chunks = chunk_text("abcdefghijkl mn op", 5);
        assert_eq!(chunks, vec!["abcde", "fghij", "kl", "mn", "op"]);
    }

    #[test]
    fn test_multibyte_counts_chars() {
        let text = "é".repeat(12);
        let chunks = chunk_text(&text, 5);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 5));
    }

    #[test]
    fn test_empty_and_blank() {
        assert!(chunk_text("", 500).is_empty());
        assert!(chunk_text("   \n\n  ", 500).is_empty());
        assert!(chunk_text("text", 0).is_empty());
    }

    #[test]
    fn test_budget_respected_on_real_prose() {
        let text = "Repeated failed authentication attempts within a short window often precede \
                    account takeover. Analysts should compare device fingerprints. "
            .repeat(20);
        let chunks = chunk_text(&text, 500);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 500));
        assert!(chunks.iter().all(|c| !c.starts_with(' ') && !c.ends_with(' ')));
    }
}
