// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Loads the span model's pretrained `tokenizer.json` and adapts
// it to the QaTokenizer trait.
//
// Two configured copies of the same tokenizer are kept:
//   pair    (question, context) → "only second" truncation, so
//           the question always survives and the context is cut
//           to fit max length; optional fixed padding
//   single  page text alone     → plain longest-first truncation
//           (only-second truncation rejects single sequences)
//
// Offsets are requested per character so they line up with the
// character-indexed answer spans of the dataset.

use anyhow::{anyhow, bail, Result};
use std::path::Path;
use tokenizers::{
    PaddingParams, PaddingStrategy, Tokenizer, TruncationParams, TruncationStrategy,
};

use crate::domain::traits::{PairEncoding, QaTokenizer};

const PAD_CANDIDATES: [&str; 2] = ["[PAD]", "<pad>"];

pub struct HfQaTokenizer {
    pair:   Tokenizer,
    single: Tokenizer,
}

impl HfQaTokenizer {
    /// Load from a `tokenizer.json` file or a model directory that
    /// contains one.
    pub fn load(path: &Path, max_length: usize, pad_to_max: bool) -> Result<Self> {
        let file = if path.is_dir() { path.join("tokenizer.json") } else { path.to_path_buf() };
        let base = Tokenizer::from_file(&file)
            .map_err(|e| anyhow!("Cannot load tokenizer from '{}': {}", file.display(), e))?;
        tracing::info!("Loaded tokenizer from '{}'", file.display());
        Self::from_tokenizer(base, max_length, pad_to_max)
    }

    pub fn from_tokenizer(base: Tokenizer, max_length: usize, pad_to_max: bool) -> Result<Self> {
        if max_length == 0 {
            bail!("Tokenizer max length must be positive");
        }

        let mut pair = base.clone();
        pair.with_truncation(Some(TruncationParams {
            max_length,
            strategy: TruncationStrategy::OnlySecond,
            ..Default::default()
        }))
        .map_err(|e| anyhow!("Invalid pair truncation: {e}"))?;

        if pad_to_max {
            let (pad_token, pad_id) = PAD_CANDIDATES
                .iter()
                .find_map(|t| base.token_to_id(t).map(|id| (t.to_string(), id)))
                .ok_or_else(|| anyhow!("Tokenizer has no padding token"))?;
            pair.with_padding(Some(PaddingParams {
                strategy: PaddingStrategy::Fixed(max_length),
                pad_id,
                pad_token,
                ..Default::default()
            }));
        } else {
            pair.with_padding(None);
        }

        let mut single = base;
        single
            .with_truncation(Some(TruncationParams {
                max_length,
                strategy: TruncationStrategy::LongestFirst,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("Invalid truncation: {e}"))?;
        single.with_padding(None);

        Ok(Self { pair, single })
    }
}

impl QaTokenizer for HfQaTokenizer {
    fn encode_pair(&self, question: &str, context: &str) -> Result<PairEncoding> {
        let enc = self
            .pair
            .encode_char_offsets((question, context), true)
            .map_err(|e| anyhow!("Pair tokenisation failed: {e}"))?;

        Ok(PairEncoding {
            input_ids:      enc.get_ids().to_vec(),
            attention_mask: enc.get_attention_mask().to_vec(),
            offsets:        enc.get_offsets().to_vec(),
            sequence_ids:   enc.get_sequence_ids(),
        })
    }

    fn encode_text(&self, text: &str) -> Result<Vec<u32>> {
        let enc = self
            .single
            .encode(text, true)
            .map_err(|e| anyhow!("Tokenisation failed: {e}"))?;
        Ok(enc.get_ids().to_vec())
    }

    fn decode(&self, ids: &[u32]) -> Result<String> {
        self.single
            .decode(ids, true)
            .map_err(|e| anyhow!("Decode failed: {e}"))
    }
}
