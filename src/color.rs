use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Colour names from style overrides
// ---------------------------------------------------------------------------

/// Parse a style colour: `#rrggbb`, a one-letter matplotlib code, or a CSS
/// colour name (`steelblue`, `darkred`, ...).
pub fn parse_color(name: &str) -> Option<Color32> {
    let name = name.trim().to_ascii_lowercase();
    if let Some(hex) = name.strip_prefix('#') {
        return parse_hex(hex);
    }
    let short = match name.as_str() {
        "b" => Some("blue"),
        "g" => Some("green"),
        "r" => Some("red"),
        "c" => Some("cyan"),
        "m" => Some("magenta"),
        "y" => Some("yellow"),
        "k" => Some("black"),
        "w" => Some("white"),
        _ => None,
    };
    let rgb = palette::named::from_str(short.unwrap_or(&name))?;
    Some(Color32::from_rgb(rgb.red, rgb.green, rgb.blue))
}

fn parse_hex(hex: &str) -> Option<Color32> {
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Color32::from_rgb(channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_palette_size() {
        assert_eq!(generate_palette(0).len(), 0);
        let colors = generate_palette(5);
        assert_eq!(colors.len(), 5);
        assert_ne!(colors[0], colors[1]);
    }

    #[test]
    fn test_parse_color_forms() {
        assert_eq!(parse_color("#ff8000"), Some(Color32::from_rgb(255, 128, 0)));
        assert_eq!(parse_color("r"), Some(Color32::from_rgb(255, 0, 0)));
        assert_eq!(parse_color(" SteelBlue "), Some(Color32::from_rgb(70, 130, 180)));
        assert_eq!(parse_color("#12"), None);
        assert_eq!(parse_color("not-a-colour"), None);
    }
}
