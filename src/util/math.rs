//! Numeric helpers for score decoding.

/// Logistic sigmoid.
#[inline]
pub fn sigmoid(value: f32) -> f32 {
    1.0 / (1.0 + (-value).exp())
}

/// Replaces `values` with their softmax.
///
/// The maximum logit is subtracted before exponentiating, so large logits do
/// not overflow. NaN logits get zero probability. If every logit is `-inf`
/// the result is uniform; if some are `+inf` the mass is split among them.
/// An empty slice is left untouched.
pub fn softmax_in_place(values: &mut [f32]) {
    if values.is_empty() {
        return;
    }
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);

    if max == f32::INFINITY {
        for v in values.iter_mut() {
            *v = if *v == f32::INFINITY { 1.0 } else { 0.0 };
        }
    } else if max == f32::NEG_INFINITY {
        values.fill(1.0);
    } else {
        for v in values.iter_mut() {
            let e = (*v - max).exp();
            *v = if e.is_nan() { 0.0 } else { e };
        }
    }

    // The max entry contributes exp(0) = 1, so the sum is at least 1.
    let sum: f32 = values.iter().sum();
    let inv = 1.0 / sum;
    for v in values.iter_mut() {
        *v *= inv;
    }
}

/// Index and value of the largest element; ties resolve to the lowest index.
///
/// NaN entries never win. Returns `None` for an empty slice.
pub fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    let mut iter = values.iter().copied().enumerate();
    let (mut best_idx, mut best) = iter.next()?;
    for (idx, value) in iter {
        if value > best || (best.is_nan() && !value.is_nan()) {
            best_idx = idx;
            best = value;
        }
    }
    Some((best_idx, best))
}
