// THEORY:
// The `mask` module decides which pixels are allowed to move. It produces one boolean
// per pixel, computed once over the whole image for each transform call, and the sorter
// only ever reorders pixels inside contiguous stretches of `true`.
//
// Two closed strategies:
// 1.  **Luminance**: selects pixels brighter than the threshold.
// 2.  **Edge**: runs a 3x3 Sobel operator over the grayscale plane, takes the gradient
//     magnitude, rescales it so the strongest edge is 255, and selects pixels whose
//     magnitude is BELOW the threshold. Flat regions get sorted and strong edges stay
//     put, acting as natural run boundaries.
//
// Thresholds are plain integers. Anything outside 0..=255 simply saturates the mask to
// all-true or all-false; there is no failure path in this module.

use crate::core_modules::pixel::pixel::{self, Gray};
use crate::core_modules::traversal::Coord;
use image::RgbImage;
use serde::{Deserialize, Serialize};

// Sobel smoothing weights. The derivative half of the kernel is applied as a plain
// neighbour difference first, so a flat window is exactly zero before any weighting.
const SOBEL_WEIGHTS: [Gray; 3] = [1.0, 2.0, 1.0];

/// Which selection criterion builds the mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskKind {
    /// Select flat regions: normalized Sobel magnitude below the threshold.
    Edge,
    /// Select bright regions: luminance above the threshold.
    Luminance,
}

/// A boolean selection surface with the same dimensions as the image it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    data: Vec<bool>,
}

impl Mask {
    /// Builds a mask by evaluating `select(x, y)` for every pixel.
    pub fn from_fn(width: u32, height: u32, mut select: impl FnMut(u32, u32) -> bool) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(select(x, y));
            }
        }
        Self { width, height, data }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the mask.
    pub fn get(&self, x: u32, y: u32) -> bool {
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Number of selected pixels.
    pub fn count_selected(&self) -> usize {
        self.data.iter().filter(|&&selected| selected).count()
    }

    /// The mask values along one traversal line, in line order. Every coordinate must lie
    /// inside the mask, as the lines from `Direction::lines` for the same size do.
    pub fn line(&self, line: &[Coord]) -> Vec<bool> {
        line.iter().map(|&(x, y)| self.get(x, y)).collect()
    }
}

/// Sobel magnitude rescaled to 0..=255, one byte per pixel.
#[derive(Debug, Clone)]
pub struct EdgeMap {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    /// Largest raw magnitude before rescaling. Zero means the image is perfectly flat.
    pub max_magnitude: Gray,
}

impl EdgeMap {
    /// Panics outside the map, like `Mask::get`.
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[y as usize * self.width as usize + x as usize]
    }
}

/// Builds the selection mask for `buffer` using the given criterion.
pub fn generate_mask(kind: MaskKind, buffer: &RgbImage, threshold: i32) -> Mask {
    let (width, height) = buffer.dimensions();
    match kind {
        MaskKind::Luminance => {
            let threshold = threshold as f64;
            Mask::from_fn(width, height, |x, y| {
                pixel::luminance(buffer.get_pixel(x, y)) > threshold
            })
        }
        MaskKind::Edge => {
            let edges = edge_magnitude(buffer);
            Mask::from_fn(width, height, |x, y| (edges.get(x, y) as i32) < threshold)
        }
    }
}

/// Sobel gradient magnitude of the grayscale plane, normalized so the maximum is 255.
///
/// Borders are handled by reflecting onto the edge pixel, which for a 3x3 kernel is
/// the same as clamping the neighbor index. A perfectly flat image yields all zeros.
pub fn edge_magnitude(buffer: &RgbImage) -> EdgeMap {
    let (width, height) = buffer.dimensions();
    let w = width as usize;
    let h = height as usize;

    let gray: Vec<Gray> = buffer.pixels().map(pixel::grayscale).collect();
    let mut magnitude = vec![0.0 as Gray; w * h];
    let mut max_magnitude: Gray = 0.0;

    for y in 0..h {
        let y_idx = [y.saturating_sub(1), y, (y + 1).min(h - 1)];
        for x in 0..w {
            let x_idx = [x.saturating_sub(1), x, (x + 1).min(w - 1)];

            let at = |yy: usize, xx: usize| gray[yy * w + xx];

            let mut sum_x: Gray = 0.0;
            let mut sum_y: Gray = 0.0;
            for (k, &weight) in SOBEL_WEIGHTS.iter().enumerate() {
                sum_x += weight * (at(y_idx[k], x_idx[2]) - at(y_idx[k], x_idx[0]));
                sum_y += weight * (at(y_idx[2], x_idx[k]) - at(y_idx[0], x_idx[k]));
            }

            let value = sum_x.hypot(sum_y);
            magnitude[y * w + x] = value;
            if value > max_magnitude {
                max_magnitude = value;
            }
        }
    }

    let data = if max_magnitude > 0.0 {
        magnitude
            .iter()
            // truncating cast, saturating at 255
            .map(|&value| (value / max_magnitude * 255.0) as u8)
            .collect()
    } else {
        vec![0u8; w * h]
    };

    EdgeMap {
        width,
        height,
        data,
        max_magnitude,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn split_image() -> RgbImage {
        // left half black, right half white
        RgbImage::from_fn(6, 4, |x, _| {
            if x < 3 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) }
        })
    }

    #[test]
    fn luminance_mask_selects_bright_pixels() {
        let mask = generate_mask(MaskKind::Luminance, &split_image(), 100);
        assert_eq!(mask.dimensions(), (6, 4));
        for y in 0..4 {
            for x in 0..6 {
                assert_eq!(mask.get(x, y), x >= 3);
            }
        }
    }

    #[test]
    fn luminance_threshold_is_strict() {
        let image = RgbImage::from_pixel(2, 2, Rgb([100, 100, 100]));
        // 0.2126 + 0.7152 + 0.0722 sums to 1, so luminance is ~100
        assert_eq!(generate_mask(MaskKind::Luminance, &image, 101).count_selected(), 0);
        assert_eq!(generate_mask(MaskKind::Luminance, &image, 99).count_selected(), 4);
    }

    #[test]
    fn edge_map_peaks_at_the_boundary() {
        let edges = edge_magnitude(&split_image());
        assert!(edges.max_magnitude > 0.0);
        for y in 0..4 {
            assert_eq!(edges.get(0, y), 0);
            assert_eq!(edges.get(2, y), 255);
            assert_eq!(edges.get(3, y), 255);
            assert_eq!(edges.get(5, y), 0);
        }
    }

    #[test]
    fn edge_mask_selects_flat_regions_only() {
        let mask = generate_mask(MaskKind::Edge, &split_image(), 128);
        for y in 0..4 {
            assert!(mask.get(0, y));
            assert!(!mask.get(2, y));
            assert!(!mask.get(3, y));
            assert!(mask.get(5, y));
        }
    }

    #[test]
    fn flat_image_normalizes_to_zero() {
        let image = RgbImage::from_pixel(5, 5, Rgb([40, 90, 200]));
        let edges = edge_magnitude(&image);
        assert_eq!(edges.max_magnitude, 0.0);
        assert!(edges.data.iter().all(|&v| v == 0));
        assert_eq!(generate_mask(MaskKind::Edge, &image, 1).count_selected(), 25);
        assert_eq!(generate_mask(MaskKind::Edge, &image, 0).count_selected(), 0);
    }

    #[test]
    fn uniform_colours_have_no_edges() {
        for r in (0..=255u8).step_by(15) {
            for g in (0..=255u8).step_by(17) {
                for b in [0u8, 1, 40, 128, 199, 200, 254, 255] {
                    let image = RgbImage::from_pixel(5, 4, Rgb([r, g, b]));
                    let edges = edge_magnitude(&image);
                    assert_eq!(edges.max_magnitude, 0.0, "colour {:?}", [r, g, b]);
                    assert_eq!(generate_mask(MaskKind::Edge, &image, 1).count_selected(), 20);
                }
            }
        }
    }

    #[test]
    #[should_panic]
    fn reading_outside_the_mask_panics() {
        Mask::from_fn(2, 2, |_, _| true).get(2, 0);
    }

    #[test]
    fn out_of_range_thresholds_saturate_the_mask() {
        let image = split_image();
        for kind in [MaskKind::Edge, MaskKind::Luminance] {
            let low = generate_mask(kind, &image, -50);
            let high = generate_mask(kind, &image, 10_000);
            let total = 24;
            match kind {
                MaskKind::Edge => {
                    assert_eq!(low.count_selected(), 0);
                    assert_eq!(high.count_selected(), total);
                }
                MaskKind::Luminance => {
                    assert_eq!(low.count_selected(), total);
                    assert_eq!(high.count_selected(), 0);
                }
            }
        }
    }

    #[test]
    fn empty_and_single_pixel_images_do_not_panic() {
        let empty = RgbImage::new(0, 0);
        assert_eq!(generate_mask(MaskKind::Edge, &empty, 10).count_selected(), 0);
        let wide_empty = RgbImage::new(4, 0);
        assert_eq!(generate_mask(MaskKind::Edge, &wide_empty, 10).dimensions(), (4, 0));

        let single = RgbImage::from_pixel(1, 1, Rgb([200, 10, 10]));
        assert!(generate_mask(MaskKind::Edge, &single, 10).get(0, 0));
    }

    #[test]
    fn mask_line_follows_coordinates() {
        let mask = Mask::from_fn(3, 3, |x, y| x == y);
        assert_eq!(mask.line(&vec![(0, 0), (1, 1), (2, 1)]), vec![true, true, false]);
    }
}
