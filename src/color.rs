// Color primitives shared by every color strategy

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Share of the distance to white applied to derived measures.
pub const DERIVED_MEASURE_LIGHTEN_RATIO: f64 = 0.6;

/// Fully resolved RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Mix toward white by `percent` (0.0 keeps the color, 1.0 gives white).
    pub fn lighten(&self, percent: f64) -> Rgb {
        let mix = |c: u8| -> u8 {
            let c = f64::from(c);
            (c + (255.0 - c) * percent).round().clamp(0.0, 255.0) as u8
        };
        Rgb::new(mix(self.r), mix(self.g), mix(self.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({},{},{})", self.r, self.g, self.b)
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Channels { r: u8, g: u8, b: u8 },
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Channels { r, g, b } => Ok(Rgb::new(r, g, b)),
            Repr::Text(s) => parse_color(&s)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid color '{}'", s))),
        }
    }
}

// === Well-known colors ===

pub const WHITE: Rgb = Rgb::new(255, 255, 255);
pub const GRAY: Rgb = Rgb::new(201, 213, 223);
pub const TRANSPARENT: &str = "transparent";
pub const DEFAULT_HEATMAP_BLUE: Rgb = Rgb::new(0, 110, 145);

const DEFAULT_COLORS: [Rgb; 20] = [
    Rgb::new(20, 178, 226),
    Rgb::new(0, 193, 141),
    Rgb::new(229, 77, 66),
    Rgb::new(241, 134, 0),
    Rgb::new(171, 85, 163),
    Rgb::new(244, 213, 33),
    Rgb::new(148, 161, 174),
    Rgb::new(107, 191, 216),
    Rgb::new(181, 136, 177),
    Rgb::new(238, 135, 128),
    Rgb::new(241, 171, 84),
    Rgb::new(133, 209, 188),
    Rgb::new(41, 117, 170),
    Rgb::new(4, 140, 103),
    Rgb::new(181, 60, 51),
    Rgb::new(163, 101, 46),
    Rgb::new(140, 57, 132),
    Rgb::new(136, 219, 244),
    Rgb::new(189, 234, 222),
    Rgb::new(239, 197, 194),
];

/// A named palette entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteItem {
    pub guid: String,
    pub fill: Rgb,
}

/// The 20-color default palette, guids "1" through "20".
pub fn default_palette() -> Vec<PaletteItem> {
    DEFAULT_COLORS
        .iter()
        .enumerate()
        .map(|(i, fill)| PaletteItem {
            guid: (i + 1).to_string(),
            fill: *fill,
        })
        .collect()
}

/// An explicitly requested color: a palette reference or a literal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ColorItem {
    Guid(String),
    Rgb(Rgb),
}

impl ColorItem {
    /// Resolve against `palette`; `None` when a guid is not in the palette.
    pub fn resolve(&self, palette: &[PaletteItem]) -> Option<Rgb> {
        match self {
            ColorItem::Guid(guid) => palette.iter().find(|p| &p.guid == guid).map(|p| p.fill),
            ColorItem::Rgb(rgb) => Some(*rgb),
        }
    }
}

/// Palette entry for `index`, wrapping around the palette length.
pub fn palette_color(palette: &[PaletteItem], index: usize) -> Option<Rgb> {
    if palette.is_empty() {
        return None;
    }
    Some(palette[index % palette.len()].fill)
}

// === Color Parsing ===

/// Parse `rgb(r,g,b)`, `#RRGGBB` or `#RGB`.
pub fn parse_color(color_str: &str) -> Option<Rgb> {
    let color_str = color_str.trim();

    if color_str.starts_with('#') {
        return parse_hex_color(color_str);
    }

    let inner = color_str
        .strip_prefix("rgb(")
        .and_then(|rest| rest.strip_suffix(')'))?;
    let channels: Vec<u8> = inner
        .split(',')
        .map(|c| c.trim().parse::<u8>())
        .collect::<Result<_, _>>()
        .ok()?;
    match channels.as_slice() {
        [r, g, b] => Some(Rgb::new(*r, *g, *b)),
        _ => None,
    }
}

fn parse_hex_color(hex: &str) -> Option<Rgb> {
    let hex = hex.trim_start_matches('#');
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Rgb::new(r, g, b))
        }
        3 => {
            let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
            Some(Rgb::new(r, g, b))
        }
        _ => None,
    }
}

/// Seven-step gradient from white to `base`.
pub fn heatmap_gradient(base: Rgb) -> Vec<Rgb> {
    const STEPS: u32 = 6;
    let channel = |c: u8, i: u32| -> u8 {
        let c = u32::from(c);
        (c + i * (255 - c) / STEPS) as u8
    };

    let mut colors = vec![WHITE];
    for i in (1..STEPS).rev() {
        colors.push(Rgb::new(
            channel(base.r, i),
            channel(base.g, i),
            channel(base.b, i),
        ));
    }
    colors.push(base);
    colors
}
