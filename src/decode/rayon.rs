//! Row-parallel grid decoding (feature-gated).
//!
//! Each grid row is decoded independently; the per-row results are joined in
//! row order so the output matches the sequential decoder exactly.

use crate::decode::GridDecoder;
use crate::detection::Detection;
use crate::output::OutputView;
use rayon::prelude::*;

pub(crate) fn decode_rows_par(decoder: &GridDecoder, view: OutputView<'_>) -> Vec<Detection> {
    let rows: Vec<Vec<Detection>> = (0..view.layout().grid_height())
        .into_par_iter()
        .map(|cell_y| decoder.decode_row(view, cell_y))
        .collect();
    rows.into_iter().flatten().collect()
}
