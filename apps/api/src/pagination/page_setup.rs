//! Print page geometry: paper sizes, margin presets and the usable content box.
//!
//! All lengths are CSS pixels at 96 DPI, the unit both the layout engine and
//! the external rasterizer work in.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::pagination::font_metrics::FontFamily;
use crate::pagination::packer::PackLimits;

pub const DEFAULT_SAFETY_MARGIN_PX: f32 = 20.0;
pub const DEFAULT_SECTION_SPACING_PX: f32 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperSize {
    A4,
    Letter,
    Legal,
}

impl PaperSize {
    /// `(width, height)` in px.
    pub fn dimensions_px(self) -> (f32, f32) {
        match self {
            PaperSize::A4 => (794.0, 1123.0),
            PaperSize::Letter => (816.0, 1056.0),
            PaperSize::Legal => (816.0, 1344.0),
        }
    }
}

impl FromStr for PaperSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a4" => Ok(PaperSize::A4),
            "letter" => Ok(PaperSize::Letter),
            "legal" => Ok(PaperSize::Legal),
            other => Err(format!("unknown paper size '{other}' (expected a4, letter or legal)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarginPreset {
    None,
    Small,
    Medium,
    Large,
}

impl MarginPreset {
    /// Margin applied to every side, in px (0 / 10mm / 15mm / 20mm).
    pub fn px(self) -> f32 {
        match self {
            MarginPreset::None => 0.0,
            MarginPreset::Small => 38.0,
            MarginPreset::Medium => 57.0,
            MarginPreset::Large => 76.0,
        }
    }
}

impl FromStr for MarginPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(MarginPreset::None),
            "small" => Ok(MarginPreset::Small),
            "medium" => Ok(MarginPreset::Medium),
            "large" => Ok(MarginPreset::Large),
            other => Err(format!(
                "unknown margin preset '{other}' (expected none, small, medium or large)"
            )),
        }
    }
}

/// Everything the pagination pipeline needs to know about the target page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSetup {
    pub paper: PaperSize,
    pub margin: MarginPreset,
    pub font: FontFamily,
    /// Reserved at the bottom of every page to absorb sub-pixel rounding in the rasterizer.
    pub safety_margin_px: f32,
    /// Vertical gap between consecutive sections on a page.
    pub section_spacing_px: f32,
}

impl Default for PageSetup {
    fn default() -> Self {
        Self {
            paper: PaperSize::A4,
            margin: MarginPreset::Medium,
            font: FontFamily::Sans,
            safety_margin_px: DEFAULT_SAFETY_MARGIN_PX,
            section_spacing_px: DEFAULT_SECTION_SPACING_PX,
        }
    }
}

impl PageSetup {
    pub fn page_width(&self) -> f32 {
        self.paper.dimensions_px().0
    }

    pub fn page_height(&self) -> f32 {
        self.paper.dimensions_px().1
    }

    /// Width of the text column the measurer lays content out at.
    pub fn content_width(&self) -> f32 {
        (self.page_width() - 2.0 * self.margin.px()).max(0.0)
    }

    /// Page height minus top/bottom margins minus the safety margin.
    pub fn usable_height(&self) -> f32 {
        (self.page_height() - 2.0 * self.margin.px() - self.safety_margin_px).max(0.0)
    }

    pub fn pack_limits(&self, header_height: f32) -> PackLimits {
        PackLimits {
            usable_height: self.usable_height(),
            header_height,
            section_spacing: self.section_spacing_px,
        }
    }
}

/// Partial page options as sent by clients; missing fields fall back to the server defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageOptions {
    pub paper: Option<PaperSize>,
    pub margin: Option<MarginPreset>,
    pub font: Option<FontFamily>,
}

impl PageOptions {
    pub fn resolve(&self, defaults: &PageSetup) -> PageSetup {
        PageSetup {
            paper: self.paper.unwrap_or(defaults.paper),
            margin: self.margin.unwrap_or(defaults.margin),
            font: self.font.unwrap_or(defaults.font),
            ..defaults.clone()
        }
    }
}
