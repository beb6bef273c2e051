// ============================================================
// Layer 5 — Span Model Adapter
// ============================================================
// Wraps a restored BrandQaModel behind the QaModel trait: one
// encoded (question, context) pair in, one start/end logit per
// token out. Span selection happens in the inference engine.

use anyhow::{anyhow, ensure, Result};
use burn::{prelude::*, tensor::TensorData};

use crate::domain::traits::{PairEncoding, QaModel, SpanLogits};
use crate::infra::checkpoint::CheckpointManager;
use crate::ml::model::BrandQaModel;

pub type InferBackend = burn::backend::Wgpu;

pub struct BurnQaModel<B: Backend> {
    model:       BrandQaModel<B>,
    max_seq_len: usize,
    device:      B::Device,
}

impl<B: Backend> BurnQaModel<B> {
    pub fn new(model: BrandQaModel<B>, device: B::Device) -> Self {
        let max_seq_len = model.max_seq_len;
        Self { model, max_seq_len, device }
    }

    /// Rebuild the architecture from the saved config and load the
    /// newest weights. Dropout is disabled for inference.
    pub fn from_checkpoint(ckpt: &CheckpointManager, device: B::Device) -> Result<Self> {
        let cfg   = ckpt.load_config()?.with_dropout(0.0);
        let model = ckpt.load_model(cfg.init::<B>(&device), &device)?;
        tracing::info!(
            "Span model loaded from '{}' (d_model={}, layers={}, max_seq_len={})",
            ckpt.dir().display(),
            cfg.d_model,
            cfg.num_layers,
            cfg.max_seq_len
        );
        Ok(Self::new(model, device))
    }

    pub fn max_seq_len(&self) -> usize {
        self.max_seq_len
    }

    fn int_tensor(&self, values: &[u32]) -> Tensor<B, 2, Int> {
        let data: Vec<i64> = values.iter().map(|&x| x as i64).collect();
        Tensor::<B, 2, Int>::from_data(TensorData::new(data, [1, values.len()]), &self.device)
    }
}

impl<B: Backend> QaModel for BurnQaModel<B> {
    fn span_logits(&self, encoding: &PairEncoding) -> Result<SpanLogits> {
        let seq_len = encoding.len();
        ensure!(seq_len > 0, "Cannot run the span model on an empty encoding");
        ensure!(
            seq_len <= self.max_seq_len,
            "Encoding has {} tokens but the model accepts at most {}",
            seq_len,
            self.max_seq_len
        );
        ensure!(
            encoding.attention_mask.len() == seq_len,
            "Attention mask length {} does not match {} input ids",
            encoding.attention_mask.len(),
            seq_len
        );

        let input_ids      = self.int_tensor(&encoding.input_ids);
        let attention_mask = self.int_tensor(&encoding.attention_mask);
        let output = self.model.forward(input_ids, attention_mask);

        let start = output.start_logits.reshape([seq_len]).into_data().to_vec::<f32>()
            .map_err(|e| anyhow!("Cannot read start logits: {e:?}"))?;
        let end = output.end_logits.reshape([seq_len]).into_data().to_vec::<f32>()
            .map_err(|e| anyhow!("Cannot read end logits: {e:?}"))?;

        Ok(SpanLogits { start, end })
    }
}
