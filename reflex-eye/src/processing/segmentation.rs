//! Color-range segmentation

use crate::config::{ColorSpace, ThresholdConfig};
use crate::{Frame, Mask};
use image::{Luma, Rgb};
use std::borrow::Cow;
use tracing::trace;

pub const FOREGROUND: Luma<u8> = Luma([255]);

/// Turns a color frame into a binary mask by per-channel range tests
pub struct Segmenter {
    threshold: ThresholdConfig,
}

impl Segmenter {
    pub fn new(threshold: ThresholdConfig) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> &ThresholdConfig {
        &self.threshold
    }

    /// Foreground (255) where every channel lies in its inclusive range
    pub fn segment(&self, frame: &Frame) -> Mask {
        let (width, height) = frame.dimensions();
        let mut mask = Mask::new(width, height);
        if width == 0 || height == 0 {
            return mask;
        }

        let converted = self.convert(frame);
        let ranges = &self.threshold.ranges;
        let mut hits = 0usize;
        for (src, dst) in converted.pixels().zip(mask.pixels_mut()) {
            let Rgb([c0, c1, c2]) = *src;
            if ranges[0].contains(c0 as f64)
                && ranges[1].contains(c1 as f64)
                && ranges[2].contains(c2 as f64)
            {
                *dst = FOREGROUND;
                hits += 1;
            }
        }
        trace!("Segmented {} of {} pixels", hits, width as usize * height as usize);
        mask
    }

    /// Frame in the working color space, channels in threshold order
    fn convert<'a>(&self, frame: &'a Frame) -> Cow<'a, Frame> {
        match self.threshold.color_space {
            ColorSpace::Rgb => Cow::Borrowed(frame),
            ColorSpace::Hsl => {
                let mut out = frame.clone();
                for px in out.pixels_mut() {
                    px.0 = rgb_to_hsl(px.0);
                }
                Cow::Owned(out)
            }
        }
    }
}

/// 8-bit RGB to (hue, saturation, luminance)
///
/// Hue is halved to fit a byte ([0,180]); saturation and luminance span [0,255].
pub fn rgb_to_hsl([r, g, b]: [u8; 3]) -> [u8; 3] {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;

    let vmax = r.max(g).max(b);
    let vmin = r.min(g).min(b);
    let diff = vmax - vmin;
    let l = (vmax + vmin) * 0.5;

    let (mut h, s) = if diff > f32::EPSILON {
        let s = if l < 0.5 {
            diff / (vmax + vmin)
        } else {
            diff / (2.0 - vmax - vmin)
        };
        let scale = 60.0 / diff;
        let h = if vmax == r {
            (g - b) * scale
        } else if vmax == g {
            (b - r) * scale + 120.0
        } else {
            (r - g) * scale + 240.0
        };
        (h, s)
    } else {
        (0.0, 0.0)
    };
    if h < 0.0 {
        h += 360.0;
    }

    [to_byte(h * 0.5), to_byte(s * 255.0), to_byte(l * 255.0)]
}

fn to_byte(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
