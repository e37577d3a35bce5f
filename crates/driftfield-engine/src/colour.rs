//! Colours: the speed-driven HSL state of each particle and the RGBA fills drawn to a canvas.

use palette::{IntoColor as _, WithAlpha as _};

/// A colour that can be filled onto a canvas, including its transparency.
pub type Fill = palette::Srgba<f32>;

/// Colour of a particle moving at or below the smallest noticable speed.
pub const SLOW: ParticleColour = ParticleColour {
    hue: 180.0,
    sat: 100.0,
    lum: 41.0,
};

/// Colour of a particle moving at or above [`MAX_VELOCITY`].
pub const FAST: ParticleColour = ParticleColour {
    hue: 240.0,
    sat: 84.0,
    lum: 47.0,
};

/// The summed absolute velocity at which a particle is fully [`FAST`].
pub const MAX_VELOCITY: f64 = 7.5;

/// Speeds below this are considered stationary.
pub const MIN_VELOCITY: f64 = 0.001;

/// Hue in degrees, saturation and luminance in percent.
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub struct ParticleColour {
    /// Hue, 0-360
    pub hue: f64,
    /// Saturation, 0-100
    pub sat: f64,
    /// Luminance, 0-100
    pub lum: f64,
}

impl Default for ParticleColour {
    fn default() -> Self {
        SLOW
    }
}

impl ParticleColour {
    /// Remap a speed (`|vx| + |vy|`) to a colour between [`SLOW`] and [`FAST`].
    #[must_use]
    pub fn from_speed(speed: f64) -> Self {
        let scale = ((speed - MIN_VELOCITY) / (MAX_VELOCITY - MIN_VELOCITY)).clamp(0.0, 1.0);
        let mix = |slow: f64, fast: f64| fast * scale + slow * (1.0 - scale);

        Self {
            hue: mix(SLOW.hue, FAST.hue),
            sat: mix(SLOW.sat, FAST.sat),
            lum: mix(SLOW.lum, FAST.lum),
        }
    }

    /// CSS syntax, eg `hsl(180,100%,41%)`. Also used to detect colour changes between frames.
    #[must_use]
    pub fn to_css(&self) -> String {
        format!("hsl({},{}%,{}%)", self.hue, self.sat, self.lum)
    }

    /// Convert to an opaque sRGB fill.
    #[must_use]
    pub fn to_fill(&self) -> Fill {
        #[expect(
            clippy::as_conversions,
            clippy::cast_possible_truncation,
            reason = "Colour channels don't need double precision"
        )]
        let hsl = palette::Hsl::new(
            self.hue as f32,
            (self.sat / 100.0) as f32,
            (self.lum / 100.0) as f32,
        );
        let rgb: palette::Srgb<f32> = hsl.into_color();
        rgb.with_alpha(1.0)
    }
}

/// Make a fill from 0-255 channels and a 0-1 alpha, like CSS's `rgba()`.
#[must_use]
pub fn rgba(red: u8, green: u8, blue: u8, alpha: f32) -> Fill {
    Fill::new(
        f32::from(red) / 255.0,
        f32::from(green) / 255.0,
        f32::from(blue) / 255.0,
        alpha.clamp(0.0, 1.0),
    )
}
