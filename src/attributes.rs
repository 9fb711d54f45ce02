//! The closed set of visual attributes and the layers that declare them.
//!
//! Each [`Attribute`] carries a total default rule: for any row count `n`
//! it yields a column of exactly `n` values.

use crate::colour::{DEFAULT_COLOUR, Rgba};
use crate::models::{Column, ValueKind};
use std::fmt;

pub const DEFAULT_POLYLINE: &str = "";
pub const DEFAULT_ELEVATION: f64 = 0.0;
pub const DEFAULT_RADIUS: f64 = 1.0;
pub const DEFAULT_STROKE_WIDTH: f64 = 1.0;

pub fn default_polyline(n: usize) -> Vec<String> {
    vec![DEFAULT_POLYLINE.to_string(); n]
}

pub fn default_elevation(n: usize) -> Vec<f64> {
    vec![DEFAULT_ELEVATION; n]
}

pub fn default_radius(n: usize) -> Vec<f64> {
    vec![DEFAULT_RADIUS; n]
}

pub fn default_fill_colour(n: usize) -> Vec<Rgba> {
    vec![DEFAULT_COLOUR; n]
}

pub fn default_stroke_colour(n: usize) -> Vec<Rgba> {
    vec![DEFAULT_COLOUR; n]
}

pub fn default_stroke_width(n: usize) -> Vec<f64> {
    vec![DEFAULT_STROKE_WIDTH; n]
}

/// A named visual attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Attribute {
    /// Encoded polyline giving the position.
    Polyline,
    Elevation,
    Radius,
    FillColour,
    StrokeColour,
    StrokeWidth,
}

impl Attribute {
    pub const ALL: [Attribute; 6] = [
        Attribute::Polyline,
        Attribute::Elevation,
        Attribute::Radius,
        Attribute::FillColour,
        Attribute::StrokeColour,
        Attribute::StrokeWidth,
    ];

    /// Key used in parameters and in serialized rows.
    pub fn name(self) -> &'static str {
        match self {
            Attribute::Polyline => "polyline",
            Attribute::Elevation => "elevation",
            Attribute::Radius => "radius",
            Attribute::FillColour => "fill_colour",
            Attribute::StrokeColour => "stroke_colour",
            Attribute::StrokeWidth => "stroke_width",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    pub fn kind(self) -> ValueKind {
        match self {
            Attribute::Polyline => ValueKind::Text,
            Attribute::Elevation | Attribute::Radius | Attribute::StrokeWidth => ValueKind::Number,
            Attribute::FillColour | Attribute::StrokeColour => ValueKind::Colour,
        }
    }

    /// The default rule, evaluated for `n` rows.
    pub fn default_column(self, n: usize) -> Column {
        match self {
            Attribute::Polyline => Column::Text(default_polyline(n)),
            Attribute::Elevation => Column::Number(default_elevation(n)),
            Attribute::Radius => Column::Number(default_radius(n)),
            Attribute::FillColour => Column::Rgba(default_fill_colour(n)),
            Attribute::StrokeColour => Column::Rgba(default_stroke_colour(n)),
            Attribute::StrokeWidth => Column::Number(default_stroke_width(n)),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Layer types. Each declares its attributes in output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Pointcloud,
    Column,
}

impl Layer {
    pub fn name(self) -> &'static str {
        match self {
            Layer::Pointcloud => "pointcloud",
            Layer::Column => "column",
        }
    }

    pub fn attributes(self) -> &'static [Attribute] {
        match self {
            Layer::Pointcloud => &[
                Attribute::Polyline,
                Attribute::Elevation,
                Attribute::Radius,
                Attribute::FillColour,
            ],
            Layer::Column => &[
                Attribute::Polyline,
                Attribute::Elevation,
                Attribute::FillColour,
                Attribute::StrokeColour,
                Attribute::StrokeWidth,
            ],
        }
    }

    /// Attributes whose data-mapped colours may appear in the legend.
    pub fn legend_attributes(self) -> &'static [Attribute] {
        match self {
            Layer::Pointcloud => &[Attribute::FillColour],
            Layer::Column => &[Attribute::FillColour, Attribute::StrokeColour],
        }
    }

    /// The opacity parameter paired with a colour attribute of this layer.
    pub fn opacity_param(self, colour: Attribute) -> Option<&'static str> {
        if !self.attributes().contains(&colour) {
            return None;
        }
        match colour {
            Attribute::FillColour => Some("fill_opacity"),
            Attribute::StrokeColour => Some("stroke_opacity"),
            _ => None,
        }
    }

    /// Every attribute of the layer at its default, in declaration order.
    pub fn defaults(self, n: usize) -> Vec<(Attribute, Column)> {
        self.attributes()
            .iter()
            .map(|&a| (a, a.default_column(n)))
            .collect()
    }
}
