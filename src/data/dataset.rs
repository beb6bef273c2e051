use serde::{Deserialize, Serialize};

use crate::domain::traits::PairEncoding;

/// One tokenized training sample with its aligned answer span.
/// Sequence format: [CLS] question [SEP] context [SEP] [PAD]...
/// `(0, 0)` marks a sample whose answer is not in the truncated context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenizedSample {
    pub id:                   String,
    pub input_ids:            Vec<u32>,
    pub attention_mask:       Vec<u32>,
    pub offset_mapping:       Vec<(usize, usize)>,
    pub token_start_position: usize,
    pub token_end_position:   usize,
}

impl TokenizedSample {
    pub fn from_encoding(
        id:          String,
        encoding:    PairEncoding,
        token_start: usize,
        token_end:   usize,
    ) -> Self {
        Self {
            id,
            input_ids:            encoding.input_ids,
            attention_mask:       encoding.attention_mask,
            offset_mapping:       encoding.offsets,
            token_start_position: token_start,
            token_end_position:   token_end,
        }
    }

    pub fn has_answer(&self) -> bool {
        (self.token_start_position, self.token_end_position) != (0, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(start: usize, end: usize) -> TokenizedSample {
        TokenizedSample {
            id:                   "s".into(),
            input_ids:            vec![101, 7, 102, 8, 9, 10, 102],
            attention_mask:       vec![1; 7],
            offset_mapping:       vec![(0, 0); 7],
            token_start_position: start,
            token_end_position:   end,
        }
    }

    #[test]
    fn test_has_answer() {
        assert!(sample(3, 4).has_answer());
        assert!(!sample(0, 0).has_answer());
    }

    #[test]
    fn test_serializes_offsets_as_pairs() {
        let json = serde_json::to_string(&sample(3, 4)).unwrap();
        assert!(json.contains("\"offset_mapping\":[[0,0],"));
        let back: TokenizedSample = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample(3, 4));
    }
}
