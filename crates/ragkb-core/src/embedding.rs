//! Embedding capability trait and vector similarity.
//!
//! Defines the [`Embedder`] trait that every embedding backend implements,
//! plus [`cosine_similarity`], the only distance metric the knowledge base
//! uses.
//!
//! Concrete HTTP backends (Ollama, OpenAI-compatible) live in the `ragkb`
//! app crate.

use anyhow::Result;
use async_trait::async_trait;

/// An external model that turns text into vectors.
///
/// `embed` must return exactly one vector per input text, in input order.
/// Retry policy, if any, belongs to the implementation; callers treat any
/// error as final.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Backend identifier for logs (e.g. `"ollama"`).
    fn name(&self) -> &str;

    /// Embed a batch of texts with the given model.
    async fn embed(&self, model: &str, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`:
/// - `1.0` = identical direction
/// - `0.0` = orthogonal (unrelated)
/// - `-1.0` = opposite direction
///
/// Returns `0.0`, never an error, for vectors of different lengths, when
/// either vector has zero magnitude (including empty vectors), or when a
/// non-finite component makes the ratio undefined. Sums are
/// accumulated in `f64`.
///
/// ```rust
/// use ragkb_core::embedding::cosine_similarity;
///
/// assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-9);
/// assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 0.0]), 0.0);
/// ```
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let sim = dot / (norm_a.sqrt() * norm_b.sqrt());
    if !sim.is_finite() {
        return 0.0;
    }
    sim.clamp(-1.0, 1.0)
}
