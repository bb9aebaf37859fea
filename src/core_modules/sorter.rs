// THEORY:
// The `sorter` is the directional sort engine. It owns no state of its own; it
// orchestrates the lower modules across one of three scan geometries and hands back a
// brand new image.
//
// Key architectural principles:
// 1.  **Copy, never mutate**: the input image is cloned up front and only the clone is
//     written to. Validation (mask shape) happens before the clone, so a failed call
//     leaves nothing half-written.
// 2.  **One mask per call**: the mask is computed once over the whole image, or taken
//     from the caller when several passes want to share it.
// 3.  **Extract, reorder, write back**: each traversal line is copied into an owned
//     `Vec<Rgb<u8>>`, its qualifying runs are reordered in place inside that vector, and
//     the vector is written back to the same coordinates. Lines never share pixels, so
//     the order in which lines are processed does not matter.
// 4.  **Determinism**: no randomness lives here. Identical inputs give identical outputs.

use crate::core_modules::mask::{Mask, MaskKind, generate_mask};
use crate::core_modules::reorder::{SortKind, reorder};
use crate::core_modules::segmenter::segmenter::find_runs;
use crate::core_modules::traversal::{Coord, Direction};
use crate::error::{Result, SortError};
use image::{Rgb, RgbImage};
use log::debug;
use serde::{Deserialize, Serialize};

/// Resolved parameters for a single directional transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SortParams {
    /// Criterion used to build the mask when none is supplied.
    pub mask_kind: MaskKind,
    /// Metric that orders the pixels of each run.
    pub sort_kind: SortKind,
    /// Mask threshold. Values outside 0..=255 saturate the mask instead of failing.
    pub threshold: i32,
    /// Runs shorter than this are left exactly as they are.
    pub min_segment_len: usize,
    /// Sort descending instead of ascending.
    pub reverse: bool,
}

impl Default for SortParams {
    fn default() -> Self {
        Self {
            mask_kind: MaskKind::Luminance,
            sort_kind: SortKind::Hue,
            threshold: 100,
            min_segment_len: 5,
            reverse: false,
        }
    }
}

/// Sorts runs along every row.
pub fn sort_rows(buffer: &RgbImage, params: &SortParams, mask: Option<&Mask>) -> Result<RgbImage> {
    sort_along(buffer, Direction::Rows, params, mask)
}

/// Sorts runs along every column.
pub fn sort_columns(
    buffer: &RgbImage,
    params: &SortParams,
    mask: Option<&Mask>,
) -> Result<RgbImage> {
    sort_along(buffer, Direction::Columns, params, mask)
}

/// Sorts runs along every anti-diagonal of constant `x - y`.
pub fn sort_diagonals(
    buffer: &RgbImage,
    params: &SortParams,
    mask: Option<&Mask>,
) -> Result<RgbImage> {
    sort_along(buffer, Direction::Diagonals, params, mask)
}

/// Sorts runs along every traversal line of `direction` and returns the new image.
///
/// When `mask` is `None` it is generated from `buffer` with `params.mask_kind` and
/// `params.threshold`. A supplied mask must match the image dimensions exactly.
pub fn sort_along(
    buffer: &RgbImage,
    direction: Direction,
    params: &SortParams,
    mask: Option<&Mask>,
) -> Result<RgbImage> {
    let (width, height) = buffer.dimensions();

    let generated;
    let mask = match mask {
        Some(mask) => {
            check_mask_shape(mask, buffer)?;
            mask
        }
        None => {
            generated = generate_mask(params.mask_kind, buffer, params.threshold);
            &generated
        }
    };

    let mut output = buffer.clone();
    let mut lines_touched = 0usize;
    let mut runs_sorted = 0usize;

    for line in direction.lines(width, height) {
        let line_mask = mask.line(&line);
        let sorted = sort_line(&mut output, &line, &line_mask, params);
        if sorted > 0 {
            lines_touched += 1;
            runs_sorted += sorted;
        }
    }

    debug!(
        "sort_along {:?}: {}x{} image, {} runs sorted on {} lines ({} pixels selected)",
        direction,
        width,
        height,
        runs_sorted,
        lines_touched,
        mask.count_selected()
    );

    Ok(output)
}

/// Reorders the qualifying runs of one line of `image`. Returns how many runs moved.
fn sort_line(
    image: &mut RgbImage,
    line: &[Coord],
    line_mask: &[bool],
    params: &SortParams,
) -> usize {
    let mut runs = find_runs(line_mask, params.min_segment_len).peekable();
    if runs.peek().is_none() {
        return 0;
    }

    let mut pixels: Vec<Rgb<u8>> = line.iter().map(|&(x, y)| *image.get_pixel(x, y)).collect();
    let mut count = 0;
    for run in runs {
        let reordered = reorder(&pixels[run.clone()], params.sort_kind, params.reverse);
        pixels[run].copy_from_slice(&reordered);
        count += 1;
    }

    for (&(x, y), pixel) in line.iter().zip(pixels) {
        image.put_pixel(x, y, pixel);
    }
    count
}

fn check_mask_shape(mask: &Mask, buffer: &RgbImage) -> Result<()> {
    let (image_width, image_height) = buffer.dimensions();
    if mask.dimensions() != (image_width, image_height) {
        return Err(SortError::MaskShapeMismatch {
            mask_width: mask.width(),
            mask_height: mask.height(),
            image_width,
            image_height,
        });
    }
    Ok(())
}
