//! Text embedding for search queries.
//!
//! With the `fastembed-embeddings` feature (default) queries are embedded with
//! all-MiniLM-L6-v2, the model the index was built with. Without it, a
//! deterministic feature-hashing embedder keeps the tools usable against
//! indexes produced by the same hashing scheme.

use std::sync::Arc;

use crate::error::SearchError;

/// Output dimension of all-MiniLM-L6-v2.
pub const EMBEDDING_DIM: usize = 384;

/// Turns text into a query vector.
pub trait Embedder: Send + Sync {
    /// Embeds one text.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Embedding`] if the model fails.
    fn embed(&self, text: &str) -> Result<Vec<f32>, SearchError>;

    /// Vector length produced by [`Embedder::embed`].
    fn dimensions(&self) -> usize;

    /// Short model name for logs.
    fn name(&self) -> &'static str;
}

/// Feature-hashing embedder.
///
/// Lowercased alphanumeric tokens are hashed (FNV-1a) into buckets with a
/// hash-derived sign, then the vector is L2-normalised.
#[derive(Debug, Clone, Copy)]
pub struct HashEmbedder {
    dimensions: usize,
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(EMBEDDING_DIM)
    }
}

impl HashEmbedder {
    /// Creates an embedder producing `dimensions`-long vectors (at least 1).
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn fnv1a(token: &str) -> u64 {
        token.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, b| {
            (hash ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
        })
    }
}

impl Embedder for HashEmbedder {
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn embed(&self, text: &str) -> Result<Vec<f32>, SearchError> {
        let mut vector = vec![0.0_f32; self.dimensions];
        let lowered = text.to_lowercase();
        for token in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let hash = Self::fnv1a(token);
            let bucket = (hash % self.dimensions as u64) as usize;
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &'static str {
        "hash"
    }
}

#[cfg(feature = "fastembed-embeddings")]
pub use fast::FastEmbedder;

#[cfg(feature = "fastembed-embeddings")]
mod fast {
    use std::sync::Mutex;

    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
    use tracing::info;

    use super::{EMBEDDING_DIM, Embedder};
    use crate::error::SearchError;

    /// all-MiniLM-L6-v2 via ONNX Runtime.
    ///
    /// The model is downloaded to the fastembed cache on first use.
    pub struct FastEmbedder {
        model: Mutex<TextEmbedding>,
    }

    impl FastEmbedder {
        /// Loads the model.
        ///
        /// # Errors
        ///
        /// Returns [`SearchError::Embedding`] if the model cannot be loaded.
        pub fn new() -> Result<Self, SearchError> {
            let model = TextEmbedding::try_new(
                InitOptions::new(EmbeddingModel::AllMiniLML6V2)
                    .with_show_download_progress(false),
            )
            .map_err(|e| SearchError::Embedding {
                message: e.to_string(),
            })?;
            info!("loaded all-MiniLM-L6-v2 embedding model");
            Ok(Self {
                model: Mutex::new(model),
            })
        }
    }

    impl Embedder for FastEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>, SearchError> {
            let mut model = self.model.lock().map_err(|_| SearchError::Embedding {
                message: "embedding model lock poisoned".to_string(),
            })?;
            model
                .embed(vec![text], None)
                .map_err(|e| SearchError::Embedding {
                    message: e.to_string(),
                })?
                .into_iter()
                .next()
                .ok_or_else(|| SearchError::Embedding {
                    message: "model returned no embedding".to_string(),
                })
        }

        fn dimensions(&self) -> usize {
            EMBEDDING_DIM
        }

        fn name(&self) -> &'static str {
            "all-MiniLM-L6-v2"
        }
    }
}

/// Builds the embedder for this build's feature set.
///
/// # Errors
///
/// Returns [`SearchError::Embedding`] if the model cannot be loaded.
#[cfg(feature = "fastembed-embeddings")]
pub fn default_embedder() -> Result<Arc<dyn Embedder>, SearchError> {
    Ok(Arc::new(FastEmbedder::new()?))
}

/// Builds the embedder for this build's feature set.
///
/// # Errors
///
/// Never fails without the `fastembed-embeddings` feature.
#[cfg(not(feature = "fastembed-embeddings"))]
pub fn default_embedder() -> Result<Arc<dyn Embedder>, SearchError> {
    Ok(Arc::new(HashEmbedder::default()))
}
