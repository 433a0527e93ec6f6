//! Per-source accent colors and the 4-tone retro palettes used by the
//! cover pipeline.

use serde::{Deserialize, Serialize};

pub type Rgb = [u8; 3];

/// One theme per audio source. Each theme carries an accent color and a
/// 4-entry palette for the quantized cover: level 0 is always black,
/// level 3 a near-white tint, levels 1-2 derived from the accent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ThemeColor {
    #[default]
    Catalog,
    LocalLibrary,
    Radio,
    LiveStream,
}

impl ThemeColor {
    pub fn accent(self) -> Rgb {
        match self {
            ThemeColor::Catalog => [30, 215, 96],
            ThemeColor::LocalLibrary => [60, 160, 220],
            ThemeColor::Radio => [255, 140, 40],
            ThemeColor::LiveStream => [145, 71, 255],
        }
    }

    /// Quantization palette, darkest to lightest.
    pub fn palette(self) -> [Rgb; 4] {
        match self {
            ThemeColor::Catalog => {
                [[0, 0, 0], [10, 55, 25], [30, 215, 96], [210, 255, 220]]
            }
            ThemeColor::LocalLibrary => {
                [[0, 0, 0], [20, 53, 73], [60, 160, 220], [233, 247, 247]]
            }
            ThemeColor::Radio => {
                [[0, 0, 0], [85, 45, 10], [255, 140, 40], [255, 236, 210]]
            }
            ThemeColor::LiveStream => {
                [[0, 0, 0], [48, 24, 85], [145, 71, 255], [210, 190, 255]]
            }
        }
    }
}
