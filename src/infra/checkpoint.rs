// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Restores a trained span model using Burn's CompactRecorder.
// Training happens elsewhere; this crate only reads checkpoints.
//
// Directory layout:
//   <model_dir>/
//     model_config.json      ← BrandQaConfig (architecture)
//     latest_epoch.json      ← number of the newest weights file
//     model_epoch_1.mpk      ← weights (CompactRecorder adds the extension)
//     model_epoch_2.mpk
//     ...
//
// The config is needed first: the model is rebuilt from it and the
// weights are loaded into that shape. Loading fails if they differ.

use anyhow::{Context, Result};
use burn::{
    prelude::*,
    record::{CompactRecorder, Recorder},
};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::ml::model::{BrandQaConfig, BrandQaModel};

const CONFIG_FILE: &str = "model_config.json";
const LATEST_FILE: &str = "latest_epoch.json";

pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load the newest weights into `model`, which must already have
    /// the checkpoint's architecture.
    pub fn load_model<B: Backend>(
        &self,
        model:  BrandQaModel<B>,
        device: &B::Device,
    ) -> Result<BrandQaModel<B>> {
        let epoch = self.latest_epoch()?;
        let path  = self.weights_path(epoch);

        tracing::info!("Loading checkpoint from epoch {}", epoch);

        let record = CompactRecorder::new()
            .load(path.clone(), device)
            .with_context(|| format!("Cannot load checkpoint '{}'", path.display()))?;

        Ok(model.load_record(record))
    }

    pub fn load_config(&self) -> Result<BrandQaConfig> {
        let path = self.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path).with_context(|| {
            format!("Cannot read model config from '{}'", path.display())
        })?;
        serde_json::from_str(&json)
            .with_context(|| format!("Malformed model config '{}'", path.display()))
    }

    fn latest_epoch(&self) -> Result<usize> {
        let path = self.dir.join(LATEST_FILE);
        let s = fs::read_to_string(&path)
            .with_context(|| format!("Cannot find '{}'", path.display()))?;
        Ok(serde_json::from_str::<usize>(s.trim())?)
    }

    fn weights_path(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("model_epoch_{epoch}"))
    }
}

// Checkpoints are produced by external training tooling; tests
// write their own to exercise loading.
#[cfg(test)]
impl CheckpointManager {
    /// Write weights for `epoch` and point `latest_epoch.json` at them.
    pub(crate) fn save_model<B: Backend>(&self, model: &BrandQaModel<B>, epoch: usize) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        let path = self.weights_path(epoch);
        CompactRecorder::new()
            .record(model.clone().into_record(), path.clone())
            .with_context(|| format!("Failed to save checkpoint to '{}'", path.display()))?;

        fs::write(self.dir.join(LATEST_FILE), serde_json::to_string(&epoch)?)
            .with_context(|| format!("Failed to write {LATEST_FILE}"))?;

        tracing::debug!("Saved checkpoint: epoch {}", epoch);
        Ok(())
    }

    pub(crate) fn save_config(&self, cfg: &BrandQaConfig) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;
        fs::write(&path, json)
            .with_context(|| format!("Cannot write config to '{}'", path.display()))?;

        tracing::debug!("Saved model config to '{}'", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_roundtrip() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path().join("model"));
        let cfg  = BrandQaConfig::new(100).with_d_model(16).with_num_layers(2);

        ckpt.save_config(&cfg).unwrap();
        let back = ckpt.load_config().unwrap();
        assert_eq!(back.vocab_size, 100);
        assert_eq!(back.d_model, 16);
        assert_eq!(back.num_layers, 2);
        assert_eq!(back.max_seq_len, 384);
    }

    #[test]
    fn test_missing_checkpoint_is_an_error() {
        let dir  = tempfile::tempdir().unwrap();
        let ckpt = CheckpointManager::new(dir.path());
        assert!(ckpt.load_config().is_err());
        assert!(ckpt.latest_epoch().is_err());
    }
}
