//! Theme colors: hex parsing, the per-series accent palette and the
//! background/grid colors derived from the theme hue.

use peniko::color::{self, LinearSrgb, Oklch, OpaqueColor, Srgb};
use serde::{Serialize, Serializer};

/// Default accent color.
pub const DEFAULT_THEME_COLOR: &str = "#7d33ff";

/// Hue distance between neighbouring series accents, in degrees.
const PALETTE_HUE_STEP: f64 = 10.0;
/// Chroma reduction attempts before giving up on the sRGB gamut.
const GAMUT_ITERATIONS: usize = 10;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ColorError {
    #[error("invalid hex color `{0}`; expected #rgb, #rrggbb or 0xrrggbb")]
    InvalidHex(String),
}

/// sRGB color with channels in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    #[must_use]
    pub fn from_rgb255(r: f64, g: f64, b: f64) -> Self {
        Self::new(r / 255.0, g / 255.0, b / 255.0)
    }

    /// Parse `#rgb`, `#rrggbb` or `0xrrggbb`.
    pub fn from_hex(text: &str) -> Result<Self, ColorError> {
        let invalid = || ColorError::InvalidHex(text.to_owned());
        let trimmed = text.trim();

        let digits = if let Some(stripped) = trimmed.strip_prefix('#') {
            stripped
        } else if let Some(stripped) = trimmed.strip_prefix("0x") {
            stripped
        } else {
            return Err(invalid());
        };

        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let expanded = match digits.len() {
            3 => digits.chars().flat_map(|ch| [ch, ch]).collect::<String>(),
            6 => digits.to_owned(),
            _ => return Err(invalid()),
        };

        let value = u32::from_str_radix(&expanded, 16).map_err(|_| invalid())?;
        Ok(Self::from_rgb255(
            ((value >> 16) & 0xFF) as f64,
            ((value >> 8) & 0xFF) as f64,
            (value & 0xFF) as f64,
        ))
    }

    /// Lowercase `#rrggbb`.
    #[must_use]
    pub fn to_hex(self) -> String {
        let byte = |c: f64| (c * 255.0).round().clamp(0.0, 255.0) as u8;
        format!("#{:02x}{:02x}{:02x}", byte(self.r), byte(self.g), byte(self.b))
    }

    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.r, self.g, self.b]
    }

    #[must_use]
    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.r * factor, self.g * factor, self.b * factor)
    }

    /// HSL with hue in whole degrees and saturation/lightness in whole percent.
    #[must_use]
    pub fn to_hsl(self) -> [f64; 3] {
        let [h, s, l] = self.to_opaque().convert::<color::Hsl>().components;
        let h = if h.is_finite() { f64::from(h).rem_euclid(360.0) } else { 0.0 };
        [h.round(), f64::from(s).round(), f64::from(l).round()]
    }

    /// Hue in degrees, saturation and lightness in percent.
    #[must_use]
    pub fn from_hsl(h: f64, s: f64, l: f64) -> Self {
        let hsl = OpaqueColor::<color::Hsl>::new([
            h.rem_euclid(360.0) as f32,
            s.clamp(0.0, 100.0) as f32,
            l.clamp(0.0, 100.0) as f32,
        ]);
        Self::from_opaque(hsl.convert::<Srgb>())
    }

    fn to_opaque(self) -> OpaqueColor<Srgb> {
        OpaqueColor::new([self.r as f32, self.g as f32, self.b as f32])
    }

    fn from_opaque(c: OpaqueColor<Srgb>) -> Self {
        let [r, g, b] = c.components;
        Self::new(f64::from(r), f64::from(g), f64::from(b))
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// sRGB for `[l, c, h]` in OKLCH, shrinking chroma by 10% per step (up to 10
/// steps) until every linear channel lies within [-0.001, 1.001]. The result
/// is quantized to 8 bits per channel.
fn oklch_in_gamut([l, c, h]: [f32; 3]) -> Rgb {
    let mut chroma = c;
    let mut linear = OpaqueColor::<LinearSrgb>::new([0.0; 3]);

    for _ in 0..GAMUT_ITERATIONS {
        linear = OpaqueColor::<Oklch>::new([l, chroma, h]).convert::<LinearSrgb>();
        if linear.components.iter().all(|ch| (-0.001..=1.001).contains(ch)) {
            break;
        }
        chroma *= 0.9;
    }

    let rgba = linear.convert::<Srgb>().with_alpha(1.0).to_rgba8();
    Rgb::from_rgb255(f64::from(rgba.r), f64::from(rgba.g), f64::from(rgba.b))
}

/// One accent per series. The middle series keeps the theme hue; the others
/// step 10° away on either side at the same lightness and chroma.
#[must_use]
pub fn accent_palette(theme: Rgb, count: usize) -> Vec<Rgb> {
    let [l, c, h] = theme.to_opaque().convert::<Oklch>().components;
    let center = (count / 2) as f64;

    (0..count)
        .map(|i| {
            let offset = (i as f64 - center) * PALETTE_HUE_STEP;
            let hue = (f64::from(h) - offset).rem_euclid(360.0);
            oklch_in_gamut([l, c, hue as f32])
        })
        .collect()
}

/// Scene colors and effect strengths for one theme color and mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeStyle {
    pub is_dark: bool,
    pub background: Rgb,
    pub grid_color: Rgb,
    pub grid_opacity: f64,
    pub bloom_strength: f64,
    pub bloom_threshold: f64,
    pub fog_density: f64,
    /// Opacity of the hovered segment volume.
    pub highlight_opacity: f64,
}

impl ThemeStyle {
    #[must_use]
    pub fn derive(theme: Rgb, is_dark: bool) -> Self {
        let [h, s, _] = theme.to_hsl();

        let background = Rgb::from_hsl(
            (h + 180.0) % 360.0,
            (s * 0.2).round().max(10.0),
            if is_dark { 6.0 } else { 96.0 },
        );
        let grid = Rgb::from_hsl(
            (h + 30.0) % 360.0,
            (s * 0.4).round().max(20.0),
            if is_dark { 16.0 } else { 86.0 },
        );

        Self {
            is_dark,
            background,
            grid_color: grid,
            grid_opacity: if is_dark { 0.6 } else { 0.8 },
            bloom_strength: if is_dark { 1.2 } else { 0.0 },
            bloom_threshold: if is_dark { 0.0 } else { 0.5 },
            fog_density: if is_dark { 0.002 } else { 0.001 },
            highlight_opacity: if is_dark { 0.3 } else { 0.4 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Rgb, b: Rgb, eps: f64) -> bool {
        (a.r - b.r).abs() <= eps && (a.g - b.g).abs() <= eps && (a.b - b.b).abs() <= eps
    }

    #[test]
    fn hex_parsing_accepts_short_long_and_0x() {
        let full = Rgb::from_hex("#7d33ff").unwrap();
        assert_eq!(full, Rgb::from_rgb255(125.0, 51.0, 255.0));
        assert_eq!(Rgb::from_hex("0x7d33ff").unwrap(), full);
        assert_eq!(Rgb::from_hex("#fa0").unwrap(), Rgb::from_hex("#ffaa00").unwrap());
        assert_eq!(full.to_hex(), "#7d33ff");
    }

    #[test]
    fn hex_parsing_rejects_garbage() {
        for bad in ["7d33ff", "#7d33f", "#+d33ff", "#zzzzzz", ""] {
            assert!(
                matches!(Rgb::from_hex(bad), Err(ColorError::InvalidHex(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn hsl_matches_known_values() {
        assert_eq!(Rgb::new(1.0, 0.0, 0.0).to_hsl(), [0.0, 100.0, 50.0]);
        assert_eq!(Rgb::from_hex("#7d33ff").unwrap().to_hsl(), [262.0, 100.0, 60.0]);
        assert!(close(Rgb::from_hsl(120.0, 100.0, 50.0), Rgb::new(0.0, 1.0, 0.0), 1e-6));
        assert!(close(Rgb::from_hsl(0.0, 0.0, 50.0), Rgb::new(0.5, 0.5, 0.5), 1e-6));
        assert_eq!(Rgb::new(0.5, 0.5, 0.5).to_hsl()[0], 0.0);
    }

    #[test]
    fn in_gamut_colors_survive_oklch() {
        for hex in ["#7d33ff", "#00b894", "#222222", "#ffffff"] {
            let rgb = Rgb::from_hex(hex).unwrap();
            let back = oklch_in_gamut(rgb.to_opaque().convert::<Oklch>().components);
            assert!(close(rgb, back, 1.0 / 255.0 + 1e-6), "{hex} -> {}", back.to_hex());
        }
    }

    #[test]
    fn out_of_gamut_chroma_is_reduced() {
        // Far outside sRGB at this lightness.
        let rgb = oklch_in_gamut([0.7, 0.6, 150.0]);
        for ch in rgb.to_array() {
            assert!((0.0..=1.0).contains(&ch));
        }
    }

    #[test]
    fn palette_centers_on_theme_color() {
        let theme = Rgb::from_hex("#00b894").unwrap();
        let palette = accent_palette(theme, 3);

        assert_eq!(palette.len(), 3);
        assert!(close(palette[1], theme, 1.0 / 255.0 + 1e-6));
        assert_ne!(palette[0], palette[2]);
        for c in &palette {
            for ch in c.to_array() {
                assert!((0.0..=1.0).contains(&ch));
            }
        }
        assert!(accent_palette(theme, 0).is_empty());
    }

    #[test]
    fn theme_style_follows_mode() {
        let theme = Rgb::from_hex("#7d33ff").unwrap();
        let dark = ThemeStyle::derive(theme, true);
        let light = ThemeStyle::derive(theme, false);

        assert_eq!(dark.background, Rgb::from_hsl(82.0, 20.0, 6.0));
        assert_eq!(light.background, Rgb::from_hsl(82.0, 20.0, 96.0));
        assert_eq!(dark.grid_color, Rgb::from_hsl(292.0, 40.0, 16.0));
        assert_eq!((dark.grid_opacity, light.grid_opacity), (0.6, 0.8));
        assert_eq!((dark.bloom_strength, light.bloom_strength), (1.2, 0.0));
        assert_eq!((dark.bloom_threshold, light.bloom_threshold), (0.0, 0.5));
        assert_eq!((dark.fog_density, light.fog_density), (0.002, 0.001));
        assert_eq!((dark.highlight_opacity, light.highlight_opacity), (0.3, 0.4));
    }
}
