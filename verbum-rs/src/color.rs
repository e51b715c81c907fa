//! Colour codes as command arguments.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::converter::Converter;
use crate::value::Value;
use crate::view::StringView;
use crate::Context;

/// An RGBA colour. Alpha defaults to fully opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Colour from the low 24 bits of `value`, as `0xrrggbb`.
    pub const fn from_u32(value: u32) -> Self {
        Self::rgb((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }

    /// Packed `0xrrggbb`; alpha is dropped.
    pub const fn to_u32(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Components scaled to `0.0..=1.0`.
    pub fn uniform(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a].map(|c| f32::from(c) / 255.0)
    }
}

impl From<Color> for u32 {
    fn from(color: Color) -> Self {
        color.to_u32()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("'{0}' is not a hexadecimal colour")]
    NotHex(String),

    #[error("'{input}' has {digits} hex digits, expected 3, 6 or 8")]
    Length { input: String, digits: usize },
}

impl FromStr for Color {
    type Err = ColorParseError;

    /// Accepts `#rgb`, `#rrggbb`, `#rrggbbaa`, `0xrrggbb` and bare hex digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim();
        let digits = input
            .strip_prefix('#')
            .or_else(|| input.strip_prefix("0x"))
            .or_else(|| input.strip_prefix("0X"))
            .unwrap_or(input);

        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ColorParseError::NotHex(input.to_string()));
        }

        let byte = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16);
        let nibble = |i: usize| u8::from_str_radix(&digits[i..i + 1], 16).map(|n| n * 17);
        let not_hex = |_| ColorParseError::NotHex(input.to_string());

        match digits.len() {
            3 => Ok(Color::rgb(
                nibble(0).map_err(not_hex)?,
                nibble(1).map_err(not_hex)?,
                nibble(2).map_err(not_hex)?,
            )),
            6 => Ok(Color::rgb(
                byte(0).map_err(not_hex)?,
                byte(2).map_err(not_hex)?,
                byte(4).map_err(not_hex)?,
            )),
            8 => Ok(Color::rgba(
                byte(0).map_err(not_hex)?,
                byte(2).map_err(not_hex)?,
                byte(4).map_err(not_hex)?,
                byte(6).map_err(not_hex)?,
            )),
            len => Err(ColorParseError::Length {
                input: input.to_string(),
                digits: len,
            }),
        }
    }
}

/// Converts a colour code into a [`Value::Custom`] holding a [`Color`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorConverter;

impl<C: Context> Converter<C> for ColorConverter {
    fn name(&self) -> &str {
        "color"
    }

    fn convert(&self, argument: &str, _view: &mut StringView, _context: &C) -> anyhow::Result<Value> {
        Ok(Value::custom(argument.parse::<Color>()?))
    }
}
