//! WordPiece tokenizer for BERT-family sentence encoders
//!
//! Uncased: lowercases, splits on whitespace and punctuation, then greedy
//! longest-match-first against `vocab.txt`. Accent stripping is not done.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::KnowledgeError;

const CLS: &str = "[CLS]";
const SEP: &str = "[SEP]";
const UNK: &str = "[UNK]";
const CONTINUATION: &str = "##";
const MAX_WORD_CHARS: usize = 100;

#[derive(Debug, Clone)]
pub struct WordPieceTokenizer {
    vocab: HashMap<String, i64>,
    cls_id: i64,
    sep_id: i64,
    unk_id: i64,
    max_len: usize,
}

impl WordPieceTokenizer {
    /// One token per line, id = line number
    pub fn from_vocab_file(path: &Path, max_len: usize) -> Result<Self, KnowledgeError> {
        if !path.exists() {
            return Err(KnowledgeError::NotFound(path.display().to_string()));
        }
        let text = fs::read_to_string(path)?;
        Self::from_vocab(text.lines().map(str::to_string), max_len)
    }

    pub fn from_vocab(tokens: impl IntoIterator<Item = String>, max_len: usize) -> Result<Self, KnowledgeError> {
        let vocab: HashMap<String, i64> = tokens
            .into_iter()
            .enumerate()
            .map(|(i, t)| (t.trim_end().to_string(), i as i64))
            .collect();

        let id = |token: &str| {
            vocab
                .get(token)
                .copied()
                .ok_or_else(|| KnowledgeError::Embedding(format!("vocabulary lacks {}", token)))
        };
        let cls_id = id(CLS)?;
        let sep_id = id(SEP)?;
        let unk_id = id(UNK)?;

        Ok(Self {
            vocab,
            cls_id,
            sep_id,
            unk_id,
            max_len: max_len.max(2),
        })
    }

    /// `[CLS] pieces.. [SEP]`, truncated to `max_len` ids
    pub fn encode(&self, text: &str) -> Vec<i64> {
        let mut ids = vec![self.cls_id];
        let budget = self.max_len - 2;

        'words: for word in basic_tokens(text) {
            for id in self.word_pieces(&word) {
                if ids.len() - 1 >= budget {
                    break 'words;
                }
                ids.push(id);
            }
        }

        ids.push(self.sep_id);
        ids
    }

    fn word_pieces(&self, word: &str) -> Vec<i64> {
        let chars: Vec<char> = word.chars().collect();
        if chars.len() > MAX_WORD_CHARS {
            return vec![self.unk_id];
        }

        let mut pieces = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let mut end = chars.len();
            let mut found = None;
            while start < end {
                let mut candidate: String = chars[start..end].iter().collect();
                if start > 0 {
                    candidate.insert_str(0, CONTINUATION);
                }
                if let Some(&id) = self.vocab.get(&candidate) {
                    found = Some(id);
                    break;
                }
                end -= 1;
            }

            match found {
                Some(id) => pieces.push(id),
                None => return vec![self.unk_id],
            }
            start = end;
        }
        pieces
    }
}

/// Lowercase, split on whitespace, isolate punctuation
fn basic_tokens(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_whitespace() || c.is_control() {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
        } else if c.is_ascii_punctuation() || (!c.is_alphanumeric() && !c.is_ascii()) {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            tokens.push(c.to_string());
        } else {
            current.push(c);
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer(max_len: usize) -> WordPieceTokenizer {
        let vocab = ["[PAD]", "[UNK]", "[CLS]", "[SEP]", "fraud", "signal", "qr", "pay", "##ment", ".", "new"];
        WordPieceTokenizer::from_vocab(vocab.iter().map(|s| s.to_string()), max_len).unwrap()
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(basic_tokens("QR-Payment, new!"), vec!["qr", "-", "payment", ",", "new", "!"]);
    }

    #[test]
    fn test_encode_with_subwords() {
        let t = tokenizer(32);
        assert_eq!(t.encode("Fraud signal. QR payment"), vec![2, 4, 5, 9, 6, 7, 8, 3]);
    }

    #[test]
    fn test_unknown_word() {
        let t = tokenizer(32);
        assert_eq!(t.encode("zebra"), vec![2, 1, 3]);
    }

    #[test]
    fn test_truncation() {
        let t = tokenizer(4);
        assert_eq!(t.encode("fraud signal new qr"), vec![2, 4, 5, 3]);
    }

    #[test]
    fn test_vocab_requires_special_tokens() {
        let result = WordPieceTokenizer::from_vocab(vec!["fraud".to_string()], 16);
        assert!(result.is_err());
    }
}
