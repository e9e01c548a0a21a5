//! Word similarity index.
//!
//! Flags messages that read like a known seed phrase (scam templates, slurs
//! with creative spelling, etc). Text is embedded as a signed, hashed bag of
//! character n-grams and compared by cosine similarity.

use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::config::WordBlockerConfig;
use crate::error::{LinkGuardError, Result, StoreErrorKind};
use crate::parser::rule_lines;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// FNV-1a over UTF-16 code units
fn fnv1a32(units: &[u16]) -> u32 {
    units.iter().fold(FNV_OFFSET_BASIS, |hash, &unit| {
        (hash ^ u32::from(unit)).wrapping_mul(FNV_PRIME)
    })
}

/// Embed text as an L2-normalized vector of `dimensions` buckets.
///
/// Text is lowercased, whitespace runs collapse to one space, and the result
/// is padded with a space on each side before sliding an n-gram window of
/// `max(2, ngram_size)` UTF-16 units over it.
pub fn text_to_vector(text: &str, dimensions: usize, ngram_size: usize) -> Vec<f64> {
    let mut vec = vec![0.0; dimensions];
    let input = text
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if input.is_empty() || dimensions == 0 {
        return vec;
    }

    let padded: Vec<u16> = format!(" {} ", input).encode_utf16().collect();
    let size = ngram_size.max(2);
    for gram in padded.windows(size) {
        let h = fnv1a32(gram);
        let idx = h as usize % dimensions;
        vec[idx] += if h & 1 == 0 { 1.0 } else { -1.0 };
    }

    normalize_vector(&mut vec);
    vec
}

fn normalize_vector(values: &mut [f64]) {
    let norm: f64 = values.iter().map(|v| v * v).sum();
    if norm <= 0.0 {
        return;
    }
    let inv = 1.0 / norm.sqrt();
    values.iter_mut().for_each(|v| *v *= inv);
}

fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f64 = a.iter().map(|v| v * v).sum::<f64>().sqrt();
    let nb: f64 = b.iter().map(|v| v * v).sum::<f64>().sqrt();
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na * nb)
}

/// A seed phrase close enough to the checked text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityHit {
    pub score: f64,
    pub phrase: String,
    pub id: String,
}

/// Readiness of the index
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityStatus {
    pub enabled: bool,
    /// `ready`, `disabled_in_config` or `no_seed_phrases`
    pub reason: String,
    pub seed_count: usize,
    pub score_threshold: f64,
}

struct Seed {
    id: String,
    phrase: String,
    vector: Vec<f64>,
}

/// In-memory similarity index over seed phrases
pub struct SimilarityIndex {
    config: WordBlockerConfig,
    seeds: Vec<Seed>,
    status: SimilarityStatus,
}

impl SimilarityIndex {
    /// Build an index from seed phrases.
    pub fn from_seeds<I, S>(seeds: I, config: WordBlockerConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if !config.enabled {
            return Self::disabled("disabled_in_config", config);
        }

        let seeds: Vec<Seed> = seeds
            .into_iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty())
            .enumerate()
            .map(|(i, phrase)| Seed {
                id: format!("seed-{}", i),
                vector: text_to_vector(&phrase, config.vector_dimensions, config.ngram_size),
                phrase,
            })
            .collect();

        if seeds.is_empty() {
            return Self::disabled("no_seed_phrases", config);
        }

        let status = SimilarityStatus {
            enabled: true,
            reason: "ready".to_string(),
            seed_count: seeds.len(),
            score_threshold: config.score_threshold,
        };
        tracing::info!(seeds = seeds.len(), "word similarity index ready");
        Self {
            config,
            seeds,
            status,
        }
    }

    /// Load seed phrases from a file (one per line, `#` comments).
    /// A missing file yields a disabled index.
    pub fn from_file(path: impl AsRef<Path>, config: WordBlockerConfig) -> Result<Self> {
        let path = path.as_ref();
        if !config.enabled {
            return Ok(Self::disabled("disabled_in_config", config));
        }
        if !path.exists() {
            tracing::warn!(path = %path.display(), "seed phrase file not found");
            return Ok(Self::disabled("no_seed_phrases", config));
        }

        let text = fs::read_to_string(path).map_err(|e| {
            LinkGuardError::store(
                StoreErrorKind::FileError,
                format!("Failed to read seeds '{}': {}", path.display(), e),
            )
        })?;
        let seeds: Vec<&str> = rule_lines(&text).map(|(_, line)| line).collect();
        Ok(Self::from_seeds(seeds, config))
    }

    fn disabled(reason: &str, config: WordBlockerConfig) -> Self {
        let status = SimilarityStatus {
            enabled: false,
            reason: reason.to_string(),
            seed_count: 0,
            score_threshold: config.score_threshold,
        };
        Self {
            config,
            seeds: Vec::new(),
            status,
        }
    }

    pub fn status(&self) -> &SimilarityStatus {
        &self.status
    }

    /// Best seed phrase scoring at least the threshold, if any.
    pub fn find_similar(&self, text: &str) -> Option<SimilarityHit> {
        self.find_top(text).into_iter().next()
    }

    /// Up to `top_k` seed phrases scoring at least the threshold, best first.
    pub fn find_top(&self, text: &str) -> Vec<SimilarityHit> {
        if !self.status.enabled {
            return Vec::new();
        }

        let content = text.trim();
        if content.is_empty() || content.encode_utf16().count() < self.config.min_text_length {
            return Vec::new();
        }

        let query = text_to_vector(
            content,
            self.config.vector_dimensions,
            self.config.ngram_size,
        );

        let mut scored: Vec<(f64, &Seed)> = self
            .seeds
            .iter()
            .map(|seed| (cosine_similarity(&query, &seed.vector), seed))
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        scored
            .into_iter()
            .take(self.config.top_k.max(1))
            .filter(|(score, _)| *score >= self.config.score_threshold)
            .map(|(score, seed)| SimilarityHit {
                score,
                phrase: seed.phrase.clone(),
                id: seed.id.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WordBlockerConfig {
        WordBlockerConfig::default()
    }

    #[test]
    fn test_fnv1a_known_values() {
        assert_eq!(fnv1a32(&[]), 0x811c_9dc5);
        let a: Vec<u16> = "a".encode_utf16().collect();
        assert_eq!(fnv1a32(&a), 0xe40c_292c);
    }

    #[test]
    fn test_vector_is_normalized() {
        let v = text_to_vector("free nitro here", 384, 3);
        let norm: f64 = v.iter().map(|x| x * x).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_vector_ignores_case_and_whitespace() {
        let a = text_to_vector("Free   Nitro", 384, 3);
        let b = text_to_vector("free nitro", 384, 3);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let v = text_to_vector("   ", 16, 3);
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_find_similar_hit_and_miss() {
        let index = SimilarityIndex::from_seeds(
            ["claim your free nitro gift now", "selling cheap accounts dm me"],
            config(),
        );
        assert_eq!(index.status().seed_count, 2);

        let hit = index.find_similar("Claim your FREE nitro gift now!").unwrap();
        assert_eq!(hit.phrase, "claim your free nitro gift now");
        assert_eq!(hit.id, "seed-0");
        assert!(hit.score > 0.8);

        assert!(index.find_similar("what time is the raid tonight").is_none());
    }

    #[test]
    fn test_find_top_respects_top_k() {
        let mut cfg = config();
        cfg.top_k = 2;
        cfg.score_threshold = 0.0;
        let index = SimilarityIndex::from_seeds(["alpha beta gamma", "alpha beta", "zzz"], cfg);

        let hits = index.find_top("alpha beta gamma");
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].phrase, "alpha beta gamma");
        assert!(hits[0].score >= hits[1].score);
    }

    #[test]
    fn test_short_text_skipped() {
        let mut cfg = config();
        cfg.min_text_length = 10;
        let index = SimilarityIndex::from_seeds(["spam"], cfg);
        assert!(index.find_similar("spam").is_none());
    }

    #[test]
    fn test_disabled_states() {
        let mut cfg = config();
        cfg.enabled = false;
        let index = SimilarityIndex::from_seeds(["spam spam"], cfg);
        assert_eq!(index.status().reason, "disabled_in_config");
        assert!(index.find_similar("spam spam").is_none());

        let index = SimilarityIndex::from_seeds(Vec::<String>::new(), config());
        assert_eq!(index.status().reason, "no_seed_phrases");
        assert!(!index.status().enabled);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("word_similarity.txt");
        fs::write(&path, "# seeds\nbuy cheap followers today\n\n").unwrap();

        let index = SimilarityIndex::from_file(&path, config()).unwrap();
        assert_eq!(index.status().seed_count, 1);
        assert!(index.find_similar("buy cheap followers today").is_some());

        let missing = SimilarityIndex::from_file(dir.path().join("nope.txt"), config()).unwrap();
        assert_eq!(missing.status().reason, "no_seed_phrases");
    }
}
