//! Colour handling for colour attributes.
//!
//! A colour attribute accepts either literal hex colours, which are passed
//! through, or data values, which are mapped through a [`Palette`]:
//! - numbers map onto a continuous gradient (legend type `gradient`)
//! - strings map onto evenly spaced palette colours per category (legend type `category`)
//!
//! Only data-mapped colours produce a [`LegendEntry`].

use crate::error::{MaterializeError, Result};
use crate::models::{Cell, ValueKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    /// Create a new RGBA color.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Create an opaque RGB color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (case-insensitive).
    pub fn parse_hex(s: &str) -> Option<Self> {
        let digits = s.strip_prefix('#')?;
        if !digits.is_ascii() || !(digits.len() == 6 || digits.len() == 8) {
            return None;
        }
        let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
        let a = if digits.len() == 8 { byte(6)? } else { 255 };
        Some(Self::new(byte(0)?, byte(2)?, byte(4)?, a))
    }

    /// Uppercase `#RRGGBBAA`.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }

    pub fn to_array(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Colour used for rows whose value cannot be placed on the gradient.
pub const NA_COLOUR: Rgba = Rgba::rgb(0x80, 0x80, 0x80);

/// Default fill and stroke colour (first viridis stop).
pub const DEFAULT_COLOUR: Rgba = Rgba::rgb(0x44, 0x01, 0x54);

// Viridis, sampled at five evenly spaced stops.
const VIRIDIS: [Rgba; 5] = [
    Rgba::rgb(0x44, 0x01, 0x54),
    Rgba::rgb(0x3B, 0x52, 0x8B),
    Rgba::rgb(0x21, 0x90, 0x8C),
    Rgba::rgb(0x5D, 0xC8, 0x63),
    Rgba::rgb(0xFD, 0xE7, 0x25),
];

/// Microsoft Office (2013+) chart series palette.
const OFFICE10: [Rgba; 10] = [
    Rgba::rgb(68, 114, 196),  // blue      (#4472C4)
    Rgba::rgb(237, 125, 49),  // orange    (#ED7D31)
    Rgba::rgb(165, 165, 165), // gray      (#A5A5A5)
    Rgba::rgb(255, 192, 0),   // gold      (#FFC000)
    Rgba::rgb(91, 155, 213),  // light blue(#5B9BD5)
    Rgba::rgb(112, 173, 71),  // green     (#70AD47)
    Rgba::rgb(38, 68, 120),   // dark blue (#264478)
    Rgba::rgb(158, 72, 14),   // dark org. (#9E480E)
    Rgba::rgb(99, 99, 99),    // dark gray (#636363)
    Rgba::rgb(153, 115, 0),   // brownish  (#997300)
];

/// Palettes available for mapping data values to colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Palette {
    /// Continuous viridis ramp, interpolated linearly in RGB.
    #[default]
    Viridis,
    /// Discrete Office palette; gradients snap to the nearest entry.
    Office,
}

impl Palette {
    /// Colour at position `t` in `0..=1` (clamped).
    pub fn sample(self, t: f64) -> Rgba {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        match self {
            Palette::Viridis => {
                let scaled = t * (VIRIDIS.len() - 1) as f64;
                let i = (scaled.floor() as usize).min(VIRIDIS.len() - 2);
                lerp(VIRIDIS[i], VIRIDIS[i + 1], scaled - i as f64)
            }
            Palette::Office => {
                let i = (t * (OFFICE10.len() - 1) as f64).round() as usize;
                OFFICE10[i]
            }
        }
    }

    /// `k` colours for `k` categories.
    pub fn categorical(self, k: usize) -> Vec<Rgba> {
        match self {
            Palette::Office => (0..k).map(|i| OFFICE10[i % OFFICE10.len()]).collect(),
            Palette::Viridis if k == 1 => vec![self.sample(0.0)],
            Palette::Viridis => (0..k)
                .map(|i| self.sample(i as f64 / (k - 1) as f64))
                .collect(),
        }
    }
}

fn lerp(a: Rgba, b: Rgba, t: f64) -> Rgba {
    let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * t).round().clamp(0.0, 255.0) as u8;
    Rgba::new(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b), mix(a.a, b.a))
}

/// How a legend entry should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegendKind {
    Gradient,
    Category,
}

/// Legend description for one data-mapped colour attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendEntry {
    pub colour: Vec<String>,
    pub variable: Vec<String>,
    #[serde(rename = "type")]
    pub kind: LegendKind,
    pub title: String,
}

/// Resolved colours for one attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct ColourMapping {
    pub colours: Vec<Rgba>,
    pub legend: Option<LegendEntry>,
}

/// Settings applied when mapping data values.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColourScale {
    pub palette: Palette,
    /// Replaces the alpha channel of data-mapped colours.
    pub opacity: Option<u8>,
}

/// A scalar colour override must be a literal hex colour.
pub fn scalar_colour(attribute: &str, cell: &Cell) -> Result<Rgba> {
    match cell {
        Cell::Text(s) => Rgba::parse_hex(s).ok_or_else(|| {
            MaterializeError::type_mismatch(attribute, ValueKind::Colour, format!("string \"{s}\""))
        }),
        Cell::Number(v) => Err(MaterializeError::type_mismatch(
            attribute,
            ValueKind::Colour,
            format!("number {v}"),
        )),
    }
}

/// Map per-row cells to colours.
///
/// `title` names the data the values came from and ends up in the legend.
pub fn map_cells(attribute: &str, title: &str, cells: &[Cell], scale: ColourScale) -> Result<ColourMapping> {
    let numbers: Option<Vec<f64>> = cells
        .iter()
        .map(|c| match c {
            Cell::Number(v) => Some(*v),
            Cell::Text(_) => None,
        })
        .collect();
    if let Some(values) = numbers
        && !values.is_empty()
    {
        return Ok(gradient(title, &values, scale));
    }

    let texts: Option<Vec<&str>> = cells
        .iter()
        .map(|c| match c {
            Cell::Text(s) => Some(s.as_str()),
            Cell::Number(_) => None,
        })
        .collect();
    let Some(texts) = texts else {
        return Err(MaterializeError::type_mismatch(
            attribute,
            ValueKind::Colour,
            "a mix of numbers and strings",
        ));
    };

    let literal: Option<Vec<Rgba>> = texts.iter().map(|s| Rgba::parse_hex(s)).collect();
    match literal {
        Some(colours) => Ok(ColourMapping {
            colours,
            legend: None,
        }),
        None => Ok(categories(title, &texts, scale)),
    }
}

fn apply_opacity(c: Rgba, scale: ColourScale) -> Rgba {
    match scale.opacity {
        Some(a) => c.with_alpha(a),
        None => c,
    }
}

fn gradient(title: &str, values: &[f64], scale: ColourScale) -> ColourMapping {
    let finite = values.iter().copied().filter(|v| v.is_finite());
    let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let na = apply_opacity(NA_COLOUR, scale);
    if min > max {
        // no finite values at all
        return ColourMapping {
            colours: vec![na; values.len()],
            legend: None,
        };
    }

    // Halved so that `max - min` cannot overflow to infinity.
    let half_span = max / 2.0 - min / 2.0;
    let position = |v: f64| {
        if half_span > 0.0 {
            ((v / 2.0 - min / 2.0) / half_span).clamp(0.0, 1.0)
        } else {
            0.0
        }
    };
    let colours = values
        .iter()
        .map(|&v| {
            if v.is_finite() {
                apply_opacity(scale.palette.sample(position(v)), scale)
            } else {
                na
            }
        })
        .collect();

    let steps = if half_span > 0.0 { GRADIENT_BREAKS } else { 1 };
    let mut legend_colours = Vec::with_capacity(steps);
    let mut variable = Vec::with_capacity(steps);
    for i in 0..steps {
        let t = if steps > 1 { i as f64 / (steps - 1) as f64 } else { 0.0 };
        legend_colours.push(apply_opacity(scale.palette.sample(t), scale).to_hex());
        variable.push(format_break(min * (1.0 - t) + max * t));
    }

    ColourMapping {
        colours,
        legend: Some(LegendEntry {
            colour: legend_colours,
            variable,
            kind: LegendKind::Gradient,
            title: title.to_string(),
        }),
    }
}

const GRADIENT_BREAKS: usize = 5;

fn categories(title: &str, texts: &[&str], scale: ColourScale) -> ColourMapping {
    let levels: Vec<&str> = texts.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
    let palette: Vec<Rgba> = scale
        .palette
        .categorical(levels.len())
        .into_iter()
        .map(|c| apply_opacity(c, scale))
        .collect();

    let colours = texts
        .iter()
        .map(|t| {
            // levels is sorted, so binary_search always hits
            let idx = levels.binary_search(t).unwrap_or(0);
            palette[idx]
        })
        .collect();

    ColourMapping {
        colours,
        legend: Some(LegendEntry {
            colour: palette.iter().map(Rgba::to_hex).collect(),
            variable: levels.iter().map(|s| s.to_string()).collect(),
            kind: LegendKind::Category,
            title: title.to_string(),
        }),
    }
}

/// Format up to 4 decimals, then trim trailing zeros and trailing dot.
fn format_break(x: f64) -> String {
    let s = format!("{:.4}", x);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}
