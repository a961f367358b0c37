//! Inline `style` declarations and HTML attribute values.
//!
//! Only the small subset of CSS the rich-text importer understands: no
//! selectors, no cascade, just `property: value` pairs and the value syntaxes
//! they use (lengths, colours, border styles, font sizes).

use std::sync::LazyLock;

use regex::Regex;

use crate::format::{BorderStyle, Color, TextLength};

static NUMBER_WITH_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*([+-]?(?:\d+(?:\.\d*)?|\.\d+))\s*(px|pt|em|%)?\s*$")
        .expect("valid length regex")
});

static RGB_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*rgba?\(\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)\s*(?:,\s*([\d.]+)\s*)?\)\s*$")
        .expect("valid rgb regex")
});

/// One `property: value` pair of a `style` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Lower-cased property name.
    pub property: String,
    /// Trimmed value text.
    pub value: String,
}

/// Split a `style` attribute into declarations. Malformed pieces are skipped.
pub fn parse_declarations(style: &str) -> Vec<Declaration> {
    style
        .split(';')
        .filter_map(|piece| {
            let (property, value) = piece.split_once(':')?;
            let property = property.trim().to_ascii_lowercase();
            let value = value.trim().trim_end_matches("!important").trim();
            (!property.is_empty() && !value.is_empty()).then(|| Declaration {
                property,
                value: value.to_string(),
            })
        })
        .collect()
}

/// Unit of a parsed number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// No unit (treated as pixels).
    None,
    /// `px`
    Px,
    /// `pt`
    Pt,
    /// `em`
    Em,
    /// `%`
    Percent,
}

/// A number followed by an optional unit.
pub fn parse_number(value: &str) -> Option<(f64, Unit)> {
    let captures = NUMBER_WITH_UNIT.captures(value)?;
    let number: f64 = captures.get(1)?.as_str().parse().ok()?;
    let unit = match captures.get(2).map(|m| m.as_str().to_ascii_lowercase()) {
        None => Unit::None,
        Some(unit) => match unit.as_str() {
            "px" => Unit::Px,
            "pt" => Unit::Pt,
            "em" => Unit::Em,
            _ => Unit::Percent,
        },
    };
    Some((number, unit))
}

/// Absolute length in pixels. Percentages are not absolute.
pub fn parse_pixels(value: &str) -> Option<f64> {
    let (number, unit) = parse_number(value)?;
    match unit {
        Unit::None | Unit::Px => Some(number),
        Unit::Pt => Some(number * 96.0 / 72.0),
        Unit::Em => Some(number * 16.0),
        Unit::Percent => None,
    }
}

/// Width or height: a percentage or an absolute length.
pub fn parse_length(value: &str) -> Option<TextLength> {
    if value.trim().eq_ignore_ascii_case("auto") {
        return Some(TextLength::Variable);
    }
    let (number, unit) = parse_number(value)?;
    Some(match unit {
        Unit::Percent => TextLength::Percentage(number),
        _ => TextLength::Fixed(parse_pixels(value).unwrap_or(number)),
    })
}

/// Up to four whitespace-separated lengths expanded CSS-style into
/// `[top, right, bottom, left]`.
pub fn parse_box(value: &str) -> [Option<f64>; 4] {
    let parts: Vec<Option<f64>> = value.split_whitespace().map(parse_pixels).collect();
    expand_box(&parts).unwrap_or([None; 4])
}

/// CSS box expansion of one to four values into `[top, right, bottom, left]`.
pub fn expand_box<T: Copy>(values: &[T]) -> Option<[T; 4]> {
    match values {
        [all] => Some([*all; 4]),
        [vertical, horizontal] => Some([*vertical, *horizontal, *vertical, *horizontal]),
        [top, horizontal, bottom] => Some([*top, *horizontal, *bottom, *horizontal]),
        [top, right, bottom, left, ..] => Some([*top, *right, *bottom, *left]),
        [] => None,
    }
}

/// Font size of a `font-size` declaration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FontSize {
    /// Absolute size in points.
    Points(f64),
    /// Step relative to the default size.
    Adjustment(i64),
}

/// Parse a `font-size` value.
pub fn parse_font_size(value: &str) -> Option<FontSize> {
    let keyword = match value.trim().to_ascii_lowercase().as_str() {
        "xx-small" => Some(-3),
        "x-small" => Some(-2),
        "small" => Some(-1),
        "medium" => Some(0),
        "large" => Some(1),
        "x-large" => Some(2),
        "xx-large" => Some(3),
        _ => None,
    };
    if let Some(step) = keyword {
        return Some(FontSize::Adjustment(step));
    }
    let (number, unit) = parse_number(value)?;
    match unit {
        Unit::Pt => Some(FontSize::Points(number)),
        Unit::Px | Unit::None => Some(FontSize::Points(number * 0.75)),
        Unit::Em => Some(FontSize::Points(number * 12.0)),
        Unit::Percent => Some(FontSize::Points(number * 0.12)),
    }
}

/// `size` attribute of `<font>`: absolute `1`..`7` or relative `+n`/`-n`.
pub fn parse_font_size_attribute(value: &str) -> Option<i64> {
    let value = value.trim();
    let number: i64 = value.trim_start_matches('+').parse().ok()?;
    if value.starts_with('+') || value.starts_with('-') {
        Some(number)
    } else {
        Some(number.clamp(1, 7) - 3)
    }
}

/// Parse a `font-weight` value.
pub fn parse_font_weight(value: &str) -> Option<i64> {
    match value.trim().to_ascii_lowercase().as_str() {
        "normal" => Some(400),
        "bold" | "bolder" => Some(700),
        "lighter" => Some(300),
        other => other.parse().ok(),
    }
}

/// Parse a colour: `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb()`/`rgba()` or a name.
pub fn parse_color(value: &str) -> Option<Color> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex(hex);
    }
    if let Some(captures) = RGB_FUNCTION.captures(value) {
        let channel = |i: usize| -> Option<u8> {
            let v: u32 = captures.get(i)?.as_str().parse().ok()?;
            Some(v.min(255) as u8)
        };
        let alpha = match captures.get(4) {
            Some(a) => {
                let a: f64 = a.as_str().parse().ok()?;
                (a.clamp(0.0, 1.0) * 255.0).round() as u8
            }
            None => 255,
        };
        return Some(Color {
            r: channel(1)?,
            g: channel(2)?,
            b: channel(3)?,
            a: alpha,
        });
    }
    named_color(&value.to_ascii_lowercase())
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let digit = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok();
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => Some(Color::rgb(digit(0)? * 17, digit(1)? * 17, digit(2)? * 17)),
        6 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Color {
            r: byte(0)?,
            g: byte(2)?,
            b: byte(4)?,
            a: byte(6)?,
        }),
        _ => None,
    }
}

fn named_color(name: &str) -> Option<Color> {
    let (r, g, b) = match name {
        "black" => (0, 0, 0),
        "white" => (255, 255, 255),
        "red" => (255, 0, 0),
        "green" => (0, 128, 0),
        "lime" => (0, 255, 0),
        "blue" => (0, 0, 255),
        "yellow" => (255, 255, 0),
        "cyan" | "aqua" => (0, 255, 255),
        "magenta" | "fuchsia" => (255, 0, 255),
        "gray" | "grey" => (128, 128, 128),
        "darkgray" | "darkgrey" => (169, 169, 169),
        "lightgray" | "lightgrey" => (211, 211, 211),
        "silver" => (192, 192, 192),
        "maroon" => (128, 0, 0),
        "navy" => (0, 0, 128),
        "olive" => (128, 128, 0),
        "purple" => (128, 0, 128),
        "teal" => (0, 128, 128),
        "orange" => (255, 165, 0),
        "transparent" => {
            return Some(Color {
                r: 0,
                g: 0,
                b: 0,
                a: 0,
            });
        }
        _ => return None,
    };
    Some(Color::rgb(r, g, b))
}

/// Parse a border style keyword.
pub fn parse_border_style(value: &str) -> Option<BorderStyle> {
    Some(match value.trim().to_ascii_lowercase().as_str() {
        "none" | "hidden" => BorderStyle::None,
        "dotted" => BorderStyle::Dotted,
        "dashed" => BorderStyle::Dashed,
        "solid" => BorderStyle::Solid,
        "double" => BorderStyle::Double,
        "groove" => BorderStyle::Groove,
        "ridge" => BorderStyle::Ridge,
        "inset" => BorderStyle::Inset,
        "outset" => BorderStyle::Outset,
        _ => return None,
    })
}

/// The `border` shorthand: any of width, style and colour in any order.
pub fn parse_border_shorthand(value: &str) -> (Option<f64>, Option<BorderStyle>, Option<Color>) {
    let mut width = None;
    let mut style = None;
    let mut color = None;
    for part in value.split_whitespace() {
        if let Some(w) = parse_pixels(part) {
            width = Some(w);
        } else if let Some(s) = parse_border_style(part) {
            style = Some(s);
        } else if let Some(c) = parse_color(part) {
            color = Some(c);
        }
    }
    (width, style, color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_declarations() {
        let decls = parse_declarations(" Margin-Top: 12px ; color:red;; bogus ; font-weight : bold !important");
        assert_eq!(decls.len(), 3);
        assert_eq!(decls[0].property, "margin-top");
        assert_eq!(decls[0].value, "12px");
        assert_eq!(decls[2].value, "bold");
    }

    #[test]
    fn test_lengths() {
        assert_eq!(parse_pixels("12px"), Some(12.0));
        assert_eq!(parse_pixels("9pt"), Some(12.0));
        assert_eq!(parse_pixels("7"), Some(7.0));
        assert_eq!(parse_pixels("50%"), None);
        assert_eq!(parse_length("50%"), Some(TextLength::Percentage(50.0)));
        assert_eq!(parse_length("120"), Some(TextLength::Fixed(120.0)));
        assert_eq!(parse_length("wide"), None);
    }

    #[test]
    fn test_box_shorthand() {
        assert_eq!(parse_box("4px"), [Some(4.0); 4]);
        assert_eq!(
            parse_box("1px 2px"),
            [Some(1.0), Some(2.0), Some(1.0), Some(2.0)]
        );
        assert_eq!(
            parse_box("1 2 3 4"),
            [Some(1.0), Some(2.0), Some(3.0), Some(4.0)]
        );
    }

    #[test]
    fn test_colors() {
        assert_eq!(parse_color("#f00"), Some(Color::rgb(255, 0, 0)));
        assert_eq!(parse_color("#00ff7f"), Some(Color::rgb(0, 255, 127)));
        assert_eq!(parse_color("rgb(1, 2, 3)"), Some(Color::rgb(1, 2, 3)));
        assert_eq!(parse_color("Navy"), Some(Color::rgb(0, 0, 128)));
        assert_eq!(parse_color("#zzz"), None);
        assert_eq!(parse_color("transparent").map(|c| c.a), Some(0));
    }

    #[test]
    fn test_font_sizes() {
        assert_eq!(parse_font_size("14pt"), Some(FontSize::Points(14.0)));
        assert_eq!(parse_font_size("16px"), Some(FontSize::Points(12.0)));
        assert_eq!(parse_font_size("large"), Some(FontSize::Adjustment(1)));
        assert_eq!(parse_font_size_attribute("5"), Some(2));
        assert_eq!(parse_font_size_attribute("+1"), Some(1));
        assert_eq!(parse_font_size_attribute("-2"), Some(-2));
    }

    #[test]
    fn test_border_shorthand() {
        let (width, style, color) = parse_border_shorthand("2px dashed #00f");
        assert_eq!(width, Some(2.0));
        assert_eq!(style, Some(BorderStyle::Dashed));
        assert_eq!(color, Some(Color::rgb(0, 0, 255)));
    }
}
