//! Sentence extraction from retrieved chunks

/// Split on sentence-ending punctuation followed by whitespace, or on
/// newline runs. Parts are returned untrimmed; empty parts are kept.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut prev: Option<char> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let after_terminal = matches!(prev, Some('.' | '!' | '?'));

        // Some(true): any whitespace run; Some(false): newline run
        let run = if c.is_whitespace() && after_terminal {
            Some(true)
        } else if c == '\n' {
            Some(false)
        } else {
            None
        };

        match run {
            Some(any_whitespace) => {
                let mut end = i + c.len_utf8();
                let mut last = c;
                while let Some(&(j, d)) = chars.peek() {
                    let in_run = if any_whitespace { d.is_whitespace() } else { d == '\n' };
                    if !in_run {
                        break;
                    }
                    end = j + d.len_utf8();
                    last = d;
                    chars.next();
                }
                parts.push(&text[start..i]);
                start = end;
                prev = Some(last);
            }
            None => prev = Some(c),
        }
    }

    parts.push(&text[start..]);
    parts
}

/// Up to `max_sentences` sentences containing a query token
/// (case-insensitive substring), else the chunk's first sentences.
pub fn extract_relevant_sentences(chunk: &str, query_tokens: &[String], max_sentences: usize) -> Vec<String> {
    let parts = split_sentences(chunk);
    let tokens: Vec<String> = query_tokens
        .iter()
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect();

    let mut selected: Vec<String> = Vec::new();
    for part in &parts {
        if part.is_empty() || selected.len() >= max_sentences {
            continue;
        }
        let low = part.to_lowercase();
        if tokens.iter().any(|t| low.contains(t.as_str())) {
            selected.push(part.trim().to_string());
        }
    }

    if selected.is_empty() {
        for part in &parts {
            let trimmed = part.trim();
            if !trimmed.is_empty() {
                selected.push(trimmed.to_string());
            }
            if selected.len() >= max_sentences {
                break;
            }
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_split_on_terminal_punctuation() {
        assert_eq!(
            split_sentences("First one. Second one!  Third? end"),
            vec!["First one.", "Second one!", "Third?", "end"]
        );
    }

    #[test]
    fn test_split_on_newlines() {
        assert_eq!(split_sentences("# Title\n\nBody line\n  indented"), vec!["# Title", "Body line", "  indented"]);
    }

    #[test]
    fn test_no_split_inside_numbers_or_without_space() {
        assert_eq!(split_sentences("Amount 1.5x baseline.Next"), vec!["Amount 1.5x baseline.Next"]);
    }

    #[test]
    fn test_trailing_separator_leaves_empty_part() {
        assert_eq!(split_sentences("Done.\n"), vec!["Done.", ""]);
    }

    #[test]
    fn test_matching_sentences_capped() {
        let chunk = "Fraud rings reuse devices. Weather is mild. Fraud signals stack. Fraud again.";
        let picked = extract_relevant_sentences(chunk, &tokens(&["fraud"]), 2);
        assert_eq!(picked, vec!["Fraud rings reuse devices.", "Fraud signals stack."]);
    }

    #[test]
    fn test_fallback_to_first_sentences() {
        let chunk = "\nAlpha text. Beta text. Gamma text.";
        let picked = extract_relevant_sentences(chunk, &tokens(&["zzz"]), 2);
        assert_eq!(picked, vec!["Alpha text.", "Beta text."]);
    }

    #[test]
    fn test_case_insensitive_substring() {
        let picked = extract_relevant_sentences("QR-based payments carry risk.", &tokens(&["qr"]), 2);
        assert_eq!(picked, vec!["QR-based payments carry risk."]);
    }
}
