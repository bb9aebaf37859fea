// THEORY:
// This file is the main entry point for the `pixel_sorter` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the public
// API that will be exposed to external consumers.
//
// The engine is a stack of small, stateless modules (`core_modules`): per-pixel color
// metrics, mask generation, run segmentation, keyed reordering, traversal geometry,
// and the directional sorter that ties them together. On top of that sit the
// `pipeline` (ordered multi-pass recipes) and the `parallel_pipeline` (many
// independent jobs at once). The most common entry points are re-exported here.

pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use core_modules::mask::{EdgeMap, Mask, MaskKind, edge_magnitude, generate_mask};
pub use core_modules::pixel::pixel::{grayscale, hsv, hue, luminance};
pub use core_modules::reorder::{SortKey, SortKind, reorder, reorder_by};
pub use core_modules::segmenter::segmenter::{Run, find_runs};
pub use core_modules::sorter::{SortParams, sort_along, sort_columns, sort_diagonals, sort_rows};
pub use core_modules::traversal::{Direction, TraversalLine};
pub use error::SortError;
pub use parallel_pipeline::ParallelPipeline;
pub use pipeline::{PassConfig, PipelineConfig, SortPipeline};

/// The pixel buffer every transform consumes and produces.
pub type PixelBuffer = image::RgbImage;
