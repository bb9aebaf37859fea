// THEORY:
// The `pipeline` module is the top-level API for composing sort passes. A single
// directional transform is rarely the whole effect: the classic recipe sorts rows inside
// flat regions first and then sorts bright anti-diagonals of that result in reverse.
// A `SortPipeline` runs an ordered list of such passes, feeding each pass the image the
// previous one produced.
//
// A pass may also reuse the mask of the pass before it instead of recomputing one from
// its own input. That is how several geometries get swept over the same selection.
//
// Parameters arrive already resolved. Choosing them (randomly or otherwise) belongs to
// whoever builds the `PipelineConfig`.

use crate::core_modules::mask::generate_mask;
use crate::core_modules::sorter::sort_along;
use crate::error::Result;
use image::RgbImage;
use log::debug;
use serde::{Deserialize, Serialize};

// Re-export key data structures for the public API.
pub use crate::core_modules::mask::{Mask, MaskKind};
pub use crate::core_modules::reorder::SortKind;
pub use crate::core_modules::sorter::SortParams;
pub use crate::core_modules::traversal::Direction;
pub use crate::error::SortError;

/// One directional transform inside a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassConfig {
    pub direction: Direction,
    #[serde(flatten)]
    pub params: SortParams,
    /// Use the mask of the previous pass instead of building a new one. Ignored on the
    /// first pass.
    #[serde(default)]
    pub reuse_previous_mask: bool,
}

impl PassConfig {
    pub fn new(direction: Direction, params: SortParams) -> Self {
        Self {
            direction,
            params,
            reuse_previous_mask: false,
        }
    }

    /// Same pass, sharing the mask of the pass before it.
    pub fn reusing_mask(mut self) -> Self {
        self.reuse_previous_mask = true;
        self
    }
}

/// Keys a pass accepts in a JSON recipe. `PassConfig` flattens `SortParams`, which
/// serde cannot combine with `deny_unknown_fields`, so `from_json` checks them itself.
const PASS_FIELDS: &[&str] = &[
    "direction",
    "mask_kind",
    "sort_kind",
    "threshold",
    "min_segment_len",
    "reverse",
    "reuse_previous_mask",
];

/// Configuration for the SortPipeline: the passes to run, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    pub passes: Vec<PassConfig>,
}

impl Default for PipelineConfig {
    /// Rows through flat regions by hue, then bright diagonals by hue in reverse.
    fn default() -> Self {
        Self {
            passes: vec![
                PassConfig::new(
                    Direction::Rows,
                    SortParams {
                        mask_kind: MaskKind::Edge,
                        sort_kind: SortKind::Hue,
                        threshold: 100,
                        min_segment_len: 5,
                        reverse: false,
                    },
                ),
                PassConfig::new(
                    Direction::Diagonals,
                    SortParams {
                        mask_kind: MaskKind::Luminance,
                        sort_kind: SortKind::Hue,
                        threshold: 100,
                        min_segment_len: 5,
                        reverse: true,
                    },
                ),
            ],
        }
    }
}

impl PipelineConfig {
    /// A pipeline with a single pass.
    pub fn single(direction: Direction, params: SortParams) -> Self {
        Self {
            passes: vec![PassConfig::new(direction, params)],
        }
    }

    /// Parses a pipeline recipe from JSON. Missing pass fields take their defaults, but
    /// unknown keys (a misspelled `"treshold"`, say) are rejected.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let passes = value.get("passes").and_then(serde_json::Value::as_array);
        for pass in passes.into_iter().flatten().filter_map(serde_json::Value::as_object) {
            if let Some(key) = pass.keys().find(|key| !PASS_FIELDS.contains(&key.as_str())) {
                return Err(serde::de::Error::unknown_field(key, PASS_FIELDS));
            }
        }
        serde_json::from_value(value)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Runs a fixed sequence of sort passes over images.
#[derive(Debug, Clone)]
pub struct SortPipeline {
    config: PipelineConfig,
}

impl SortPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Applies every pass in order and returns the final image. The input is untouched.
    pub fn run(&self, buffer: &RgbImage) -> Result<RgbImage> {
        let mut current = buffer.clone();
        let mut previous_mask: Option<Mask> = None;

        for (index, pass) in self.config.passes.iter().enumerate() {
            let mask = match previous_mask.take() {
                Some(mask) if pass.reuse_previous_mask => mask,
                _ => generate_mask(pass.params.mask_kind, &current, pass.params.threshold),
            };

            debug!(
                "pass {}/{}: {:?} {:?}-mask threshold={} min_len={} sort={:?} reverse={} reused_mask={}",
                index + 1,
                self.config.passes.len(),
                pass.direction,
                pass.params.mask_kind,
                pass.params.threshold,
                pass.params.min_segment_len,
                pass.params.sort_kind,
                pass.params.reverse,
                pass.reuse_previous_mask && index > 0,
            );

            current = sort_along(&current, pass.direction, &pass.params, Some(&mask))?;
            previous_mask = Some(mask);
        }

        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::sorter::{sort_diagonals, sort_rows};
    use image::Rgb;

    fn noise(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let v = x.wrapping_mul(2654435761).wrapping_add(y.wrapping_mul(40503));
            Rgb([(v >> 3) as u8, (v >> 11) as u8, (v >> 19) as u8])
        })
    }

    #[test]
    fn default_recipe_matches_two_manual_passes() {
        let image = noise(16, 12);
        let config = PipelineConfig::default();
        let piped = SortPipeline::new(config.clone()).run(&image).unwrap();

        let first = sort_rows(&image, &config.passes[0].params, None).unwrap();
        let second = sort_diagonals(&first, &config.passes[1].params, None).unwrap();
        assert_eq!(piped, second);
    }

    #[test]
    fn pipeline_is_deterministic_and_non_mutating() {
        let image = noise(9, 9);
        let snapshot = image.clone();
        let pipeline = SortPipeline::new(PipelineConfig::default());
        let a = pipeline.run(&image).unwrap();
        let b = pipeline.run(&image).unwrap();
        assert_eq!(a, b);
        assert_eq!(image, snapshot);
    }

    #[test]
    fn reused_mask_comes_from_the_previous_pass() {
        let image = noise(10, 8);
        let rows = SortParams {
            mask_kind: MaskKind::Luminance,
            sort_kind: SortKind::Luminance,
            threshold: 90,
            min_segment_len: 2,
            reverse: false,
        };
        let columns = SortParams {
            threshold: 200,
            sort_kind: SortKind::Hue,
            ..rows
        };
        let config = PipelineConfig {
            passes: vec![
                PassConfig::new(Direction::Rows, rows),
                PassConfig::new(Direction::Columns, columns).reusing_mask(),
            ],
        };
        let piped = SortPipeline::new(config).run(&image).unwrap();

        let mask = generate_mask(MaskKind::Luminance, &image, 90);
        let first = sort_along(&image, Direction::Rows, &rows, Some(&mask)).unwrap();
        let second = sort_along(&first, Direction::Columns, &columns, Some(&mask)).unwrap();
        assert_eq!(piped, second);
    }

    #[test]
    fn empty_pipeline_is_identity() {
        let image = noise(4, 4);
        let out = SortPipeline::new(PipelineConfig { passes: vec![] }).run(&image).unwrap();
        assert_eq!(out, image);
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = PipelineConfig::default();
        let json = config.to_json().unwrap();
        assert_eq!(PipelineConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn misspelled_keys_are_rejected() {
        let pass_typo = r#"{ "passes": [ { "direction": "rows", "treshold": 40 } ] }"#;
        let err = PipelineConfig::from_json(pass_typo).unwrap_err();
        assert!(err.to_string().contains("treshold"), "{err}");

        let top_typo = r#"{ "pases": [] }"#;
        assert!(PipelineConfig::from_json(top_typo).is_err());

        let spelled = r#"{ "passes": [ { "direction": "rows", "threshold": 40 } ] }"#;
        let config = PipelineConfig::from_json(spelled).unwrap();
        assert_eq!(config.passes[0].params.threshold, 40);
    }

    #[test]
    fn json_fields_fall_back_to_defaults() {
        let json = r#"{ "passes": [ { "direction": "columns", "mask_kind": "edge", "reverse": true } ] }"#;
        let config = PipelineConfig::from_json(json).unwrap();
        let pass = config.passes[0];
        assert_eq!(pass.direction, Direction::Columns);
        assert_eq!(pass.params.mask_kind, MaskKind::Edge);
        assert!(pass.params.reverse);
        assert_eq!(pass.params.threshold, SortParams::default().threshold);
        assert!(!pass.reuse_previous_mask);
    }
}
