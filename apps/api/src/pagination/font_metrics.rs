//! Static glyph-advance tables for the two resume type families.
//!
//! Widths are in thousandths of an em (AFM convention) and cover printable
//! ASCII 0x20..=0x7E; index = (char as usize) - 32. Anything outside that range
//! falls back to the family's average advance. The tables follow the standard
//! Helvetica and Times metrics, which the preview's web fonts are metric-compatible
//! with closely enough for line-break decisions.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontFamily {
    Sans,
    Serif,
}

impl FromStr for FontFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sans" => Ok(FontFamily::Sans),
            "serif" => Ok(FontFamily::Serif),
            other => Err(format!("unknown font family '{other}' (expected sans or serif)")),
        }
    }
}

/// Synthetic emboldening widens every advance by this factor.
const BOLD_WIDTH_FACTOR: f32 = 1.06;

pub struct FontMetrics {
    pub family: FontFamily,
    advances: [u16; 95],
    average_advance: u16,
}

impl FontMetrics {
    /// Advance of a single character in px at `font_size_px`.
    pub fn char_width(&self, c: char, font_size_px: f32) -> f32 {
        let code = c as usize;
        let units = if (32..=126).contains(&code) {
            self.advances[code - 32]
        } else {
            self.average_advance
        };
        units as f32 * font_size_px / 1000.0
    }

    /// Width of `s` in px when set at `font_size_px`.
    pub fn measure(&self, s: &str, font_size_px: f32, bold: bool) -> f32 {
        let width: f32 = s.chars().map(|c| self.char_width(c, font_size_px)).sum();
        if bold {
            width * BOLD_WIDTH_FACTOR
        } else {
            width
        }
    }

    pub fn space_width(&self, font_size_px: f32, bold: bool) -> f32 {
        self.measure(" ", font_size_px, bold)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tables
// ────────────────────────────────────────────────────────────────────────────

#[rustfmt::skip]
static SANS: FontMetrics = FontMetrics {
    family: FontFamily::Sans,
    advances: [
        // sp !   "    #    $    %    &    '    (    )    *    +    ,    -    .    /
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
        // 0-9
        556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
        // :  ;    <    =    >    ?    @
        278, 278, 584, 584, 584, 556, 1015,
        // A-Z
        667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
        722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
        // [  \    ]    ^    _    `
        278, 278, 278, 469, 556, 333,
        // a-z
        556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
        556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
        // {  |    }    ~
        334, 260, 334, 584,
    ],
    average_advance: 520,
};

#[rustfmt::skip]
static SERIF: FontMetrics = FontMetrics {
    family: FontFamily::Serif,
    advances: [
        // sp !   "    #    $    %    &    '    (    )    *    +    ,    -    .    /
        250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
        // 0-9
        500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
        // :  ;    <    =    >    ?    @
        278, 278, 564, 564, 564, 444, 921,
        // A-Z
        722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889,
        722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611,
        // [  \    ]    ^    _    `
        333, 278, 333, 469, 500, 333,
        // a-z
        444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778,
        500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444,
        // {  |    }    ~
        480, 200, 480, 541,
    ],
    average_advance: 470,
};

pub fn metrics_for(family: FontFamily) -> &'static FontMetrics {
    match family {
        FontFamily::Sans => &SANS,
        FontFamily::Serif => &SERIF,
    }
}
