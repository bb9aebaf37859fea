// THEORY (1D Pixel Metrics):
// The `pixel` module is the leaf of the sorter. It turns a single RGB pixel into the
// scalar values the rest of the engine works with, with no knowledge of neighbors.
// Anything that needs another pixel (gradients, runs, ordering) lives in higher modules
// like `mask` (neighborhoods) or `reorder` (whole runs).
//
// Metric families (all single-pixel):
// - Luminance: Rec. 709 weighted sum on the raw 0..255 scale, in f64. Used both as a
//   sort key and as the luminance mask criterion.
// - Grayscale: the same weighted sum at f32 precision, only ever fed into the Sobel
//   operator of the edge mask.
// - Hue: the HSV hue folded into [0, 1) instead of degrees, because it is a sort key
//   and only its order matters.
//
// Every function here is total over the full u8 domain. Black, white and any gray
// (zero chroma) produce a hue of exactly 0.0 rather than dividing by zero.

pub mod pixel {
    use image::Rgb;

    pub type Channel = u8;
    pub type NormalizedChannel = f32;
    pub type Luminance = f64;
    pub type Gray = f32;
    pub type Hue = f32;
    pub type SaturationHSV = f32;
    pub type ValueHSV = f32;

    const RED_WEIGHT: f64 = 0.2126;
    const GREEN_WEIGHT: f64 = 0.7152;
    const BLUE_WEIGHT: f64 = 0.0722;

    /// A "dumb" data container for one RGB pixel plus its normalized channels.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
        /// The red channel value (0.0-1.0).
        pub red_normalized: NormalizedChannel,
        /// The green channel value (0.0-1.0).
        pub green_normalized: NormalizedChannel,
        /// The blue channel value (0.0-1.0).
        pub blue_normalized: NormalizedChannel,
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Pixel {
                red,
                green,
                blue,
                red_normalized: red as NormalizedChannel / 255.0f32,
                green_normalized: green as NormalizedChannel / 255.0f32,
                blue_normalized: blue as NormalizedChannel / 255.0f32,
            }
        }

        /// =================================Metrics==================================

        /// Luminance (Rec. 709 weights) on the 0..255 scale.
        pub fn luminance(&self) -> Luminance {
            RED_WEIGHT * self.red as f64
                + GREEN_WEIGHT * self.green as f64
                + BLUE_WEIGHT * self.blue as f64
        }

        /// Single-precision grayscale, the input plane of the edge detector.
        pub fn grayscale(&self) -> Gray {
            (RED_WEIGHT as Gray) * self.red as Gray
                + (GREEN_WEIGHT as Gray) * self.green as Gray
                + (BLUE_WEIGHT as Gray) * self.blue as Gray
        }

        /// Full HSV triple, every component in [0, 1].
        ///
        /// - Saturation is 0 for black (max channel 0).
        /// - Hue is 0 for any zero-chroma pixel.
        /// - Hue comes from whichever channel is maximal, then is folded by `mod 1`.
        pub fn hsv(&self) -> (Hue, SaturationHSV, ValueHSV) {
            let (r, g, b) = (self.red_normalized, self.green_normalized, self.blue_normalized);
            let maximum_channel = r.max(g.max(b));
            let minimum_channel = r.min(g.min(b));
            let value = maximum_channel;
            let delta = maximum_channel - minimum_channel;

            let saturation = if maximum_channel > 0.0 {
                delta / maximum_channel
            } else {
                0.0
            };

            if delta <= 0.0 {
                return (0.0, saturation, value);
            }

            let sector = if r == maximum_channel {
                (g - b) / delta
            } else if g == maximum_channel {
                2.0 + (b - r) / delta
            } else {
                4.0 + (r - g) / delta
            };

            let mut hue = (sector / 6.0).rem_euclid(1.0);
            // rem_euclid of a tiny negative rounds up to exactly 1.0 in f32
            if hue >= 1.0 {
                hue = 0.0;
            }
            (hue, saturation, value)
        }

        /// Hue in [0, 1): 0 is red, 1/3 green, 2/3 blue.
        pub fn hue(&self) -> Hue {
            self.hsv().0
        }
    }

    impl From<&Rgb<u8>> for Pixel {
        fn from(rgb: &Rgb<u8>) -> Self {
            let [red, green, blue] = rgb.0;
            Pixel::new(red, green, blue)
        }
    }

    impl From<Pixel> for Rgb<u8> {
        fn from(pixel: Pixel) -> Self {
            Rgb([pixel.red, pixel.green, pixel.blue])
        }
    }

    pub fn luminance(rgb: &Rgb<u8>) -> Luminance {
        Pixel::from(rgb).luminance()
    }

    pub fn grayscale(rgb: &Rgb<u8>) -> Gray {
        Pixel::from(rgb).grayscale()
    }

    pub fn hue(rgb: &Rgb<u8>) -> Hue {
        Pixel::from(rgb).hue()
    }

    pub fn hsv(rgb: &Rgb<u8>) -> (Hue, SaturationHSV, ValueHSV) {
        Pixel::from(rgb).hsv()
    }

    /// Luminance of every pixel of a run, in order.
    pub fn luminance_of(pixels: &[Rgb<u8>]) -> Vec<Luminance> {
        pixels.iter().map(luminance).collect()
    }

    /// Grayscale of every pixel of a run, in order.
    pub fn grayscale_of(pixels: &[Rgb<u8>]) -> Vec<Gray> {
        pixels.iter().map(grayscale).collect()
    }

    /// Hue of every pixel of a run, in order.
    pub fn hue_of(pixels: &[Rgb<u8>]) -> Vec<Hue> {
        pixels.iter().map(hue).collect()
    }
}
