//! Error types for pixel_sorter.

use thiserror::Error;

/// Errors the sorter reports to its caller.
///
/// Every check happens before an output buffer is written, so an `Err` never comes with
/// a partially sorted image.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SortError {
    /// A precomputed mask does not have the same dimensions as the image.
    #[error(
        "mask is {mask_width}x{mask_height} but the image is {image_width}x{image_height}"
    )]
    MaskShapeMismatch {
        mask_width: u32,
        mask_height: u32,
        image_width: u32,
        image_height: u32,
    },

    /// The parallel worker pool could not accept or answer a job.
    #[error("worker pool error: {0}")]
    Worker(String),
}

pub type Result<T> = std::result::Result<T, SortError>;
