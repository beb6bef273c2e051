// ============================================================
// Layer 6 — Sentence Embedder
// ============================================================
// Used by the embedding resolver and dataset construction.
//
// The ONNX-backed implementation is compiled only with the
// `fastembed` cargo feature; without it `load_embedder` reports
// how to enable it.

use anyhow::Result;

use crate::domain::traits::Embedder;

#[cfg(feature = "fastembed")]
pub use backend::FastEmbedder;

#[cfg(feature = "fastembed")]
mod backend {
    use anyhow::{anyhow, Context, Result};
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
    use std::sync::Mutex;
    use std::time::Instant;

    use crate::domain::traits::Embedder;

    /// all-MiniLM-L6-v2 (384 dims, normalised output).
    pub struct FastEmbedder {
        model: Mutex<TextEmbedding>,
    }

    impl FastEmbedder {
        pub fn new() -> Result<Self> {
            let start = Instant::now();
            let options = InitOptions::new(EmbeddingModel::AllMiniLML6V2)
                .with_show_download_progress(true);
            let model = TextEmbedding::try_new(options)
                .context("Failed to initialize FastEmbed model all-MiniLM-L6-v2")?;

            tracing::info!("FastEmbed model all-MiniLM-L6-v2 loaded in {:?}", start.elapsed());
            Ok(Self { model: Mutex::new(model) })
        }
    }

    impl Embedder for FastEmbedder {
        fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            if texts.is_empty() {
                return Ok(Vec::new());
            }
            let mut guard = self
                .model
                .lock()
                .map_err(|_| anyhow!("Embedding model lock poisoned"))?;
            let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
            guard.embed(refs, None).context("Failed to generate embeddings")
        }
    }
}

/// The embedder used by the CLI pipelines.
#[cfg(feature = "fastembed")]
pub fn load_embedder() -> Result<Box<dyn Embedder>> {
    Ok(Box::new(FastEmbedder::new()?))
}

#[cfg(not(feature = "fastembed"))]
pub fn load_embedder() -> Result<Box<dyn Embedder>> {
    anyhow::bail!("Sentence embeddings need the `fastembed` feature (cargo build --features fastembed)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(feature = "fastembed"))]
    #[test]
    fn test_missing_feature_is_reported() {
        let err = load_embedder().err().map(|e| e.to_string()).unwrap_or_default();
        assert!(err.contains("fastembed"));
    }

    #[cfg(feature = "fastembed")]
    #[test]
    #[ignore] // Requires model download
    fn test_fastembed_dimensions() {
        let embedder = FastEmbedder::new().unwrap();
        let out = embedder.embed(&["PayPal".to_string(), "DHL".to_string()]).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].len(), 384);
    }
}
