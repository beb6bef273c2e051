// ============================================================
// Layer 4 — Answer Span Aligner
// ============================================================
// Converts a character-level answer span into token indices of the
// tokenized [question, context] pair, so an extractive QA model
// can be trained to point at it.
//
//   1. Find the context segment [cs, ce] from the sequence ids.
//   2. If the answer lies entirely before offset[cs].start or
//      entirely after offset[ce].end, emit (0, 0).
//   3. Walk forward from cs while token.start <= start_char; the
//      token before the cursor is the start token.
//      Walk backward from ce while token.end >= end_char; the token
//      after the cursor is the end token.
//
// The scans keep the first/last qualifying index in their own
// direction, which is what truncated offset mappings require.

use anyhow::Result;

use crate::data::dataset::TokenizedSample;
use crate::domain::sample::{AnswerSpan, Sample};
use crate::domain::traits::{PairEncoding, QaTokenizer};

/// Token span `(token_start, token_end)` for `span`, or `(0, 0)` when
/// the answer is absent or outside the truncated context.
pub fn align_answer(encoding: &PairEncoding, span: &AnswerSpan) -> (usize, usize) {
    if span.is_unanswerable() {
        return (0, 0);
    }
    let Some((context_start, context_end)) = encoding.context_range() else {
        return (0, 0);
    };

    let offsets    = &encoding.offsets;
    let start_char = span.char_start;
    let end_char   = span.char_end();

    if offsets[context_start].0 > end_char || offsets[context_end].1 < start_char {
        return (0, 0);
    }

    let mut idx = context_start;
    while idx <= context_end && offsets[idx].0 <= start_char {
        idx += 1;
    }
    let token_start = idx.saturating_sub(1);

    let mut idx = context_end as isize;
    while idx >= context_start as isize && offsets[idx as usize].1 >= end_char {
        idx -= 1;
    }
    let token_end = (idx + 1) as usize;

    (token_start, token_end)
}

/// Tokenize every sample and attach its aligned token span.
pub fn align_dataset<T: QaTokenizer + ?Sized>(
    tokenizer: &T,
    samples:   &[Sample],
) -> Result<Vec<TokenizedSample>> {
    let mut out        = Vec::with_capacity(samples.len());
    let mut unanswered = 0usize;

    for sample in samples {
        let encoding = tokenizer.encode_pair(sample.question.trim(), &sample.context)?;
        let span     = sample.answer_span();
        let (token_start, token_end) = align_answer(&encoding, &span);
        let tokenized = TokenizedSample::from_encoding(sample.id.clone(), encoding, token_start, token_end);
        if !tokenized.has_answer() {
            unanswered += 1;
        }
        out.push(tokenized);
    }

    tracing::info!(
        "Aligned {} samples ({} without an answer in the truncated context)",
        out.len(),
        unanswered
    );
    Ok(out)
}
