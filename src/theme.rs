use std::fmt;
use std::str::FromStr;

use ratatui::style::Color;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeName {
    #[default]
    Cyber,
    Toxic,
    Ember,
}

impl FromStr for ThemeName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "cyber" => Ok(ThemeName::Cyber),
            "toxic" => Ok(ThemeName::Toxic),
            "ember" => Ok(ThemeName::Ember),
            _ => Err(Error::usage("Usage: theme [cyber|toxic|ember]")),
        }
    }
}

impl fmt::Display for ThemeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ThemeName::Cyber => "cyber",
            ThemeName::Toxic => "toxic",
            ThemeName::Ember => "ember",
        })
    }
}

/// Colour palette handed to every render call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub name: ThemeName,
    pub bg: Color,
    pub green: Color,
    pub pink: Color,
    pub blue: Color,
    pub yellow: Color,
    pub orange: Color,
    pub dim: Color,
    pub error: Color,
}

impl Theme {
    pub fn new(name: ThemeName) -> Theme {
        match name {
            ThemeName::Cyber => Theme {
                name,
                bg: Color::Rgb(0x05, 0x05, 0x05),
                green: Color::Rgb(0x39, 0xff, 0x14),
                pink: Color::Rgb(0xff, 0x2d, 0xfd),
                blue: Color::Rgb(0x00, 0xe5, 0xff),
                yellow: Color::Rgb(0xfa, 0xff, 0x00),
                orange: Color::Rgb(0xff, 0x8c, 0x00),
                dim: Color::Rgb(0x8c, 0xff, 0xc1),
                error: Color::Rgb(0xff, 0x4d, 0x4d),
            },
            ThemeName::Toxic => Theme {
                name,
                bg: Color::Rgb(0x04, 0x09, 0x07),
                green: Color::Rgb(0x7c, 0xff, 0x00),
                pink: Color::Rgb(0x00, 0xff, 0xd5),
                blue: Color::Rgb(0x00, 0xb4, 0xff),
                yellow: Color::Rgb(0xa6, 0xff, 0x00),
                orange: Color::Rgb(0x4d, 0xff, 0x8a),
                dim: Color::Rgb(0x6b, 0xff, 0xb2),
                error: Color::Rgb(0xff, 0x58, 0x58),
            },
            ThemeName::Ember => Theme {
                name,
                bg: Color::Rgb(0x0a, 0x06, 0x04),
                green: Color::Rgb(0xff, 0x6a, 0x00),
                pink: Color::Rgb(0xff, 0x1e, 0x56),
                blue: Color::Rgb(0xff, 0xb3, 0x47),
                yellow: Color::Rgb(0xff, 0xdd, 0x55),
                orange: Color::Rgb(0xff, 0x7a, 0x00),
                dim: Color::Rgb(0xff, 0xb1, 0x99),
                error: Color::Rgb(0xff, 0x3b, 0x3b),
            },
        }
    }

    /// Stable accent colour for a tag label.
    pub fn tag_color(&self, tag: &str) -> Color {
        let palette = [self.blue, self.pink, self.yellow, self.green, self.orange];
        let hash = tag
            .bytes()
            .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
        palette[hash % palette.len()]
    }

    /// The same palette as RGB triples, for the comfy-table renderer.
    pub fn rgb(color: Color) -> (u8, u8, u8) {
        match color {
            Color::Rgb(r, g, b) => (r, g, b),
            _ => (0xff, 0xff, 0xff),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Theme::new(ThemeName::default())
    }
}
