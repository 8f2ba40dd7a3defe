//! Flat inner-product vector index
//!
//! Exact search over L2-normalized rows, so the inner product is cosine
//! similarity. Slot `i` always corresponds to chunk `i`.
//!
//! ## File format (little-endian)
//! ```text
//! magic "FSVI" | version u32 | model_id_len u32 | model_id | dimension u32
//! | count u64 | count * dimension f32 | crc32 u32 (over all preceding bytes)
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::embedder::{is_l2_normalized, is_zero};
use crate::error::KnowledgeError;

pub const INDEX_MAGIC: &[u8; 4] = b"FSVI";
pub const INDEX_FORMAT_VERSION: u32 = 1;

/// One search result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub slot: usize,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorIndex {
    model_id: String,
    dimension: usize,
    data: Vec<f32>,
}

impl VectorIndex {
    pub fn new(model_id: impl Into<String>, dimension: usize) -> Self {
        Self {
            model_id: model_id.into(),
            dimension,
            data: Vec::new(),
        }
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.data.len() / self.dimension
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn vector(&self, slot: usize) -> Option<&[f32]> {
        let start = slot.checked_mul(self.dimension)?;
        self.data.get(start..start + self.dimension)
    }

    /// Append a normalized row; returns its slot
    pub fn add(&mut self, vector: &[f32]) -> Result<usize, KnowledgeError> {
        validate_row(vector, self.dimension)?;
        let slot = self.len();
        self.data.extend_from_slice(vector);
        Ok(slot)
    }

    /// Top-`k` rows by inner product, highest first; equal scores keep slot order
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, KnowledgeError> {
        if query.len() != self.dimension {
            return Err(KnowledgeError::Dimension {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if self.dimension == 0 {
            return Ok(Vec::new());
        }

        let mut hits: Vec<SearchHit> = self
            .data
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(slot, row)| SearchHit {
                slot,
                score: inner_product(query, row),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.slot.cmp(&b.slot))
        });
        hits.truncate(k);
        Ok(hits)
    }

    // ========================================================================
    // PERSISTENCE
    // ========================================================================

    pub fn to_bytes(&self) -> Vec<u8> {
        let id = self.model_id.as_bytes();
        let mut bytes = Vec::with_capacity(28 + id.len() + self.data.len() * 4);

        bytes.extend_from_slice(INDEX_MAGIC);
        bytes.extend_from_slice(&INDEX_FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&(id.len() as u32).to_le_bytes());
        bytes.extend_from_slice(id);
        bytes.extend_from_slice(&(self.dimension as u32).to_le_bytes());
        bytes.extend_from_slice(&(self.len() as u64).to_le_bytes());
        for &value in &self.data {
            bytes.extend_from_slice(&value.to_le_bytes());
        }

        let crc = crc32fast::hash(&bytes);
        bytes.extend_from_slice(&crc.to_le_bytes());
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KnowledgeError> {
        if bytes.len() < 4 {
            return Err(KnowledgeError::Format("file too short".into()));
        }
        let (body, trailer) = bytes.split_at(bytes.len() - 4);
        let expected = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
        let actual = crc32fast::hash(body);
        if expected != actual {
            return Err(KnowledgeError::Checksum { expected, actual });
        }

        let mut reader = ByteReader::new(body);
        if reader.take(4)? != INDEX_MAGIC {
            return Err(KnowledgeError::Format("bad magic".into()));
        }
        let version = reader.u32()?;
        if version != INDEX_FORMAT_VERSION {
            return Err(KnowledgeError::Format(format!("unsupported format version {}", version)));
        }

        let id_len = reader.u32()? as usize;
        let model_id = String::from_utf8(reader.take(id_len)?.to_vec())
            .map_err(|_| KnowledgeError::Format("model id is not UTF-8".into()))?;
        let dimension = reader.u32()? as usize;
        let count = usize::try_from(reader.u64()?)
            .map_err(|_| KnowledgeError::Format("row count overflow".into()))?;

        let floats = count
            .checked_mul(dimension)
            .ok_or_else(|| KnowledgeError::Format("index size overflow".into()))?;
        let raw = reader.take(floats.saturating_mul(4))?;
        if !reader.is_done() {
            return Err(KnowledgeError::Format("trailing bytes after rows".into()));
        }

        let data: Vec<f32> = raw
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        if data.iter().any(|v| !v.is_finite()) {
            return Err(KnowledgeError::Format("index contains non-finite values".into()));
        }

        Ok(Self {
            model_id,
            dimension,
            data,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), KnowledgeError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_bytes())?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, KnowledgeError> {
        if !path.exists() {
            return Err(KnowledgeError::NotFound(path.display().to_string()));
        }
        Self::from_bytes(&fs::read(path)?)
    }
}

fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum::<f64>() as f32
}

fn validate_row(vector: &[f32], dimension: usize) -> Result<(), KnowledgeError> {
    if vector.len() != dimension {
        return Err(KnowledgeError::Dimension {
            expected: dimension,
            actual: vector.len(),
        });
    }
    if vector.iter().any(|v| !v.is_finite()) {
        return Err(KnowledgeError::Embedding("vector contains non-finite values".into()));
    }
    if !is_zero(vector) && !is_l2_normalized(vector) {
        return Err(KnowledgeError::Embedding("vector must be L2-normalized".into()));
    }
    Ok(())
}

/// Cursor over the index body
struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], KnowledgeError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| KnowledgeError::Format("unexpected end of file".into()))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u32(&mut self) -> Result<u32, KnowledgeError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn u64(&mut self) -> Result<u64, KnowledgeError> {
        let b = self.take(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(b);
        Ok(u64::from_le_bytes(buf))
    }

    fn is_done(&self) -> bool {
        self.pos == self.bytes.len()
    }
}
