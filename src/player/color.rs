//! Magnitude-to-colour mapping for the visualizer bars.

use palette::{FromColor, Hsl, Srgb};

/// Hue in degrees, saturation and lightness in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarColor {
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
}

/// Lightness drop between the top and the base of a bar's gradient
pub const GRADIENT_DARKENING: f32 = 15.0;

impl BarColor {
    /// Map a smoothed magnitude (0-255) onto the green / amber / red bands.
    pub fn from_magnitude(value: f32) -> Self {
        if value < 100.0 {
            Self {
                hue: 120.0 + (value / 100.0) * 30.0,
                saturation: 60.0 + (value / 255.0) * 40.0,
                lightness: 40.0 + (value / 255.0) * 20.0,
            }
        } else if value < 180.0 {
            Self {
                hue: 40.0 + ((value - 100.0) / 80.0) * 20.0,
                saturation: 80.0,
                lightness: 50.0,
            }
        } else {
            Self {
                hue: 20.0,
                saturation: 90.0,
                lightness: 55.0,
            }
        }
    }

    /// Gradient end points as (top, base); the base is 15 points darker.
    pub fn gradient(&self) -> (BarColor, BarColor) {
        let base = BarColor {
            lightness: (self.lightness - GRADIENT_DARKENING).max(0.0),
            ..*self
        };
        (*self, base)
    }

    pub fn to_rgb(&self) -> (u8, u8, u8) {
        let hsl = Hsl::new(self.hue, self.saturation / 100.0, self.lightness / 100.0);
        let rgb: Srgb = Srgb::from_color(hsl);
        rgb.into_format::<u8>().into_components()
    }
}

/// Glow radius in pixels, 5 at silence up to 20 at full scale.
pub fn glow_radius(value: f32) -> f32 {
    5.0 + (value / 255.0) * 15.0
}

/// Opacity, 0.7 at silence up to 1.0 at full scale.
pub fn opacity(value: f32) -> f32 {
    0.7 + (value / 255.0) * 0.3
}

/// Blend `fg` over `bg` with the given opacity.
pub fn blend(fg: (u8, u8, u8), bg: (u8, u8, u8), alpha: f32) -> (u8, u8, u8) {
    let alpha = alpha.clamp(0.0, 1.0);
    let mix = |f: u8, b: u8| (f as f32 * alpha + b as f32 * (1.0 - alpha)).round() as u8;
    (mix(fg.0, bg.0), mix(fg.1, bg.1), mix(fg.2, bg.2))
}

/// Linear interpolation between two colours, `t` = 0 gives `from`.
pub fn lerp_rgb(from: (u8, u8, u8), to: (u8, u8, u8), t: f32) -> (u8, u8, u8) {
    blend(to, from, t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_green_band() {
        let color = BarColor::from_magnitude(0.0);
        assert_eq!(color.hue, 120.0);
        assert_eq!(color.saturation, 60.0);
        assert_eq!(color.lightness, 40.0);

        let color = BarColor::from_magnitude(50.0);
        assert_eq!(color.hue, 135.0);
        assert!(color.saturation > 60.0 && color.saturation < 100.0);
    }

    #[test]
    fn test_amber_band() {
        let color = BarColor::from_magnitude(100.0);
        assert_eq!(color.hue, 40.0);
        assert_eq!(color.saturation, 80.0);
        assert_eq!(color.lightness, 50.0);

        let color = BarColor::from_magnitude(140.0);
        assert_eq!(color.hue, 50.0);
    }

    #[test]
    fn test_red_band() {
        for value in [180.0, 220.0, 255.0] {
            let color = BarColor::from_magnitude(value);
            assert_eq!(color.hue, 20.0);
            assert_eq!(color.saturation, 90.0);
            assert_eq!(color.lightness, 55.0);
        }
    }

    #[test]
    fn test_gradient_base_is_darker() {
        let (top, base) = BarColor::from_magnitude(200.0).gradient();
        assert_eq!(top.lightness, 55.0);
        assert_eq!(base.lightness, 40.0);
        assert_eq!(top.hue, base.hue);
    }

    #[test]
    fn test_glow_and_opacity_ranges() {
        assert_eq!(glow_radius(0.0), 5.0);
        assert_eq!(glow_radius(255.0), 20.0);
        assert_eq!(opacity(0.0), 0.7);
        assert!((opacity(255.0) - 1.0).abs() < 1e-6);
    }

    fn rgb(hue: f32, saturation: f32, lightness: f32) -> (u8, u8, u8) {
        BarColor {
            hue,
            saturation,
            lightness,
        }
        .to_rgb()
    }

    #[test]
    fn test_to_rgb_primaries() {
        assert_eq!(rgb(0.0, 100.0, 50.0), (255, 0, 0));
        assert_eq!(rgb(120.0, 100.0, 50.0), (0, 255, 0));
        assert_eq!(rgb(240.0, 100.0, 50.0), (0, 0, 255));
        assert_eq!(rgb(0.0, 0.0, 100.0), (255, 255, 255));
        assert_eq!(rgb(0.0, 0.0, 0.0), (0, 0, 0));
    }

    #[test]
    fn test_band_colours_are_warm_when_loud() {
        let (r, g, _) = BarColor::from_magnitude(0.0).to_rgb();
        assert!(g > r, "quiet bars lean green");

        let (r, g, b) = BarColor::from_magnitude(230.0).to_rgb();
        assert!(r > g && g > b, "loud bars lean red-orange");
    }

    #[test]
    fn test_blend() {
        assert_eq!(blend((200, 100, 0), (0, 0, 0), 1.0), (200, 100, 0));
        assert_eq!(blend((200, 100, 0), (0, 0, 0), 0.5), (100, 50, 0));
        assert_eq!(lerp_rgb((0, 0, 0), (100, 100, 100), 0.0), (0, 0, 0));
    }
}
