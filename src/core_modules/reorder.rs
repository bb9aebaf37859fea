// THEORY:
// The `reorder` module permutes one run of pixels. It never invents or blends colors:
// it computes one key per pixel, finds the order that sorts those keys, and emits the
// same pixels in that order.
//
// The index sort is stable, so equal hues or equal luminances keep their original
// relative order and the output is fully deterministic. Reversal flips the whole sorted
// order, ties included, which is what a descending sort of the run looks like.

use crate::core_modules::pixel::pixel;
use image::Rgb;
use serde::{Deserialize, Serialize};

pub type SortKey = f64;

/// Which color metric orders the pixels of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKind {
    /// HSV hue in [0, 1).
    Hue,
    /// Rec. 709 luminance in [0, 255].
    Luminance,
}

impl SortKind {
    pub fn key(self, rgb: &Rgb<u8>) -> SortKey {
        match self {
            SortKind::Hue => pixel::hue(rgb) as SortKey,
            SortKind::Luminance => pixel::luminance(rgb),
        }
    }
}

/// Reorders `run` by the metric of `kind`.
pub fn reorder(run: &[Rgb<u8>], kind: SortKind, reverse: bool) -> Vec<Rgb<u8>> {
    reorder_by(run, |rgb| kind.key(rgb), reverse)
}

/// Reorders `run` by ascending `key_fn`, ties kept in input order, optionally reversed.
pub fn reorder_by<F>(run: &[Rgb<u8>], key_fn: F, reverse: bool) -> Vec<Rgb<u8>>
where
    F: Fn(&Rgb<u8>) -> SortKey,
{
    let keys: Vec<SortKey> = run.iter().map(key_fn).collect();

    let mut order: Vec<usize> = (0..run.len()).collect();
    // sort_by is stable
    order.sort_by(|&a, &b| keys[a].total_cmp(&keys[b]));
    if reverse {
        order.reverse();
    }

    order.into_iter().map(|index| run[index]).collect()
}
