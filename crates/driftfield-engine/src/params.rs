//! All the tunable parameters of the simulation, their valid ranges, and which of them need the
//! population to be reseeded when they change.

use crate::errors::ParameterError;

/// All the tunables for the simulation
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
#[non_exhaustive]
pub struct Parameters {
    /// The number of particles
    pub particle_count: usize,
    /// The fraction of the canvas, from the right, that the particle cloud is spawned in
    pub particle_space: f64,
    /// The smallest side length of a particle's square
    pub particle_min_size: u16,
    /// The largest side length of a particle's square
    pub particle_max_size: u16,
    /// Base mass of all particles, scales how strongly they react to forces
    pub particle_mass: f64,
    /// Whether particles spin as time passes
    pub particle_rotation: bool,
    /// Horizontal shift applied to the spawn cloud
    pub particle_x_offset: f64,
    /// Whether to render particles that have left the canvas
    pub offscreen_render: bool,
    /// How far outside the canvas a particle may be and still render
    pub offscreen_margin: f64,
    /// Number of autonomous forces, not counting the pointer
    pub force_count: usize,
    /// How far the oscillation phase advances each frame
    pub force_speed: f64,
    /// Left bound of the autonomous forces' path, as a fraction of the width
    pub force_left: f64,
    /// Right bound of the autonomous forces' path, as a fraction of the width
    pub force_right: f64,
    /// Strength of every force, including the pull home
    pub force_mass: f64,
    /// Extra strength of forces along the Y axis
    pub force_y_multiplier: f64,
    /// Fraction of horizontal velocity kept each frame
    pub x_friction: f64,
    /// Fraction of vertical velocity kept each frame
    pub y_friction: f64,
    /// How long trails linger. 0 clears every frame
    pub blur_amount: f64,
    /// Draw forces, guide lines and statistics
    pub debug: bool,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            particle_count: 2500,
            particle_space: 0.2,
            particle_min_size: 4,
            particle_max_size: 8,
            particle_mass: 0.01,
            particle_rotation: true,
            particle_x_offset: 0.0,
            offscreen_render: false,
            offscreen_margin: 20.0,
            force_count: 1,
            force_speed: 0.015,
            force_left: 0.4,
            force_right: 0.75,
            force_mass: 40.0,
            force_y_multiplier: 1.5,
            x_friction: 0.99,
            y_friction: 0.95,
            blur_amount: 0.08,
            debug: true,
        }
    }
}

/// Every individually settable parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Parameter {
    /// [`Parameters::particle_count`]
    ParticleCount,
    /// [`Parameters::particle_space`]
    ParticleSpace,
    /// [`Parameters::particle_min_size`]
    ParticleMinSize,
    /// [`Parameters::particle_max_size`]
    ParticleMaxSize,
    /// [`Parameters::particle_mass`]
    ParticleMass,
    /// [`Parameters::particle_rotation`]
    ParticleRotation,
    /// [`Parameters::particle_x_offset`]
    ParticleXOffset,
    /// [`Parameters::offscreen_render`]
    OffscreenRender,
    /// [`Parameters::offscreen_margin`]
    OffscreenMargin,
    /// [`Parameters::force_count`]
    ForceCount,
    /// [`Parameters::force_speed`]
    ForceSpeed,
    /// [`Parameters::force_left`]
    ForceLeft,
    /// [`Parameters::force_right`]
    ForceRight,
    /// [`Parameters::force_mass`]
    ForceMass,
    /// [`Parameters::force_y_multiplier`]
    ForceYMultiplier,
    /// [`Parameters::x_friction`]
    XFriction,
    /// [`Parameters::y_friction`]
    YFriction,
    /// [`Parameters::blur_amount`]
    BlurAmount,
    /// [`Parameters::debug`]
    Debug,
}

impl Parameter {
    /// All the parameters, in display order.
    pub const ALL: [Self; 19] = [
        Self::ParticleCount,
        Self::ParticleSpace,
        Self::ParticleMinSize,
        Self::ParticleMaxSize,
        Self::ParticleMass,
        Self::ParticleRotation,
        Self::ParticleXOffset,
        Self::OffscreenRender,
        Self::OffscreenMargin,
        Self::ForceCount,
        Self::ForceSpeed,
        Self::ForceLeft,
        Self::ForceRight,
        Self::ForceMass,
        Self::ForceYMultiplier,
        Self::XFriction,
        Self::YFriction,
        Self::BlurAmount,
        Self::Debug,
    ];

    /// The name used in config files and on the CLI.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ParticleCount => "particle_count",
            Self::ParticleSpace => "particle_space",
            Self::ParticleMinSize => "particle_min_size",
            Self::ParticleMaxSize => "particle_max_size",
            Self::ParticleMass => "particle_mass",
            Self::ParticleRotation => "particle_rotation",
            Self::ParticleXOffset => "particle_x_offset",
            Self::OffscreenRender => "offscreen_render",
            Self::OffscreenMargin => "offscreen_margin",
            Self::ForceCount => "force_count",
            Self::ForceSpeed => "force_speed",
            Self::ForceLeft => "force_left",
            Self::ForceRight => "force_right",
            Self::ForceMass => "force_mass",
            Self::ForceYMultiplier => "force_y_multiplier",
            Self::XFriction => "x_friction",
            Self::YFriction => "y_friction",
            Self::BlurAmount => "blur_amount",
            Self::Debug => "debug",
        }
    }

    /// The inclusive range of valid values. Booleans are `0.0` or `1.0`.
    #[must_use]
    pub const fn range(self) -> (f64, f64) {
        match self {
            Self::ParticleCount => (1.0, 10_000.0),
            Self::ParticleSpace => (0.01, 1.0),
            Self::ParticleMinSize => (1.0, 10.0),
            Self::ParticleMaxSize => (5.0, 10.0),
            Self::ParticleMass => (0.001, 0.1),
            Self::ParticleXOffset => (-256.0, 256.0),
            Self::OffscreenMargin => (0.0, 256.0),
            Self::ForceCount => (0.0, 10.0),
            Self::ForceSpeed => (0.001, 0.128),
            Self::ForceMass => (0.0, 100.0),
            Self::ForceYMultiplier => (0.0, 2.0),
            Self::ParticleRotation
            | Self::OffscreenRender
            | Self::ForceLeft
            | Self::ForceRight
            | Self::XFriction
            | Self::YFriction
            | Self::BlurAmount
            | Self::Debug => (0.0, 1.0),
        }
    }

    /// Changing these means the existing population no longer matches the parameters, so it
    /// has to be rebuilt.
    #[must_use]
    pub const fn affects_population(self) -> bool {
        matches!(
            self,
            Self::ParticleCount
                | Self::ParticleSpace
                | Self::ParticleMinSize
                | Self::ParticleMaxSize
                | Self::ParticleXOffset
                | Self::ForceCount
        )
    }

    /// Clamp a value into this parameter's range. NaN becomes the lower bound.
    #[must_use]
    pub fn clamp(self, value: f64) -> f64 {
        let (min, max) = self.range();
        if value.is_nan() {
            return min;
        }
        value.clamp(min, max)
    }
}

impl std::str::FromStr for Parameter {
    type Err = ParameterError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|parameter| parameter.name() == name)
            .ok_or_else(|| ParameterError::Unknown {
                name: name.to_owned(),
            })
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.name())
    }
}

/// Parse `name=value`, eg from the CLI.
///
/// # Errors
/// If there's no `=`, the name isn't known or the value isn't a number or boolean.
pub fn parse_assignment(assignment: &str) -> Result<(Parameter, f64), ParameterError> {
    let invalid = || ParameterError::Assignment {
        assignment: assignment.to_owned(),
    };

    let (name, raw_value) = assignment.split_once('=').ok_or_else(invalid)?;
    let parameter: Parameter = name.trim().parse()?;
    let value = match raw_value.trim() {
        "true" | "on" => 1.0,
        "false" | "off" => 0.0,
        number => number.parse::<f64>().map_err(|_| invalid())?,
    };

    Ok((parameter, value))
}

#[expect(
    clippy::as_conversions,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "Values are clamped into small known ranges before any conversion"
)]
impl Parameters {
    /// Read a parameter as a number. Booleans read as `0.0` or `1.0`.
    #[must_use]
    pub fn get(&self, parameter: Parameter) -> f64 {
        let from_bool = |flag: bool| if flag { 1.0 } else { 0.0 };
        match parameter {
            Parameter::ParticleCount => self.particle_count as f64,
            Parameter::ParticleSpace => self.particle_space,
            Parameter::ParticleMinSize => f64::from(self.particle_min_size),
            Parameter::ParticleMaxSize => f64::from(self.particle_max_size),
            Parameter::ParticleMass => self.particle_mass,
            Parameter::ParticleRotation => from_bool(self.particle_rotation),
            Parameter::ParticleXOffset => self.particle_x_offset,
            Parameter::OffscreenRender => from_bool(self.offscreen_render),
            Parameter::OffscreenMargin => self.offscreen_margin,
            Parameter::ForceCount => self.force_count as f64,
            Parameter::ForceSpeed => self.force_speed,
            Parameter::ForceLeft => self.force_left,
            Parameter::ForceRight => self.force_right,
            Parameter::ForceMass => self.force_mass,
            Parameter::ForceYMultiplier => self.force_y_multiplier,
            Parameter::XFriction => self.x_friction,
            Parameter::YFriction => self.y_friction,
            Parameter::BlurAmount => self.blur_amount,
            Parameter::Debug => from_bool(self.debug),
        }
    }

    /// Write a parameter, clamping it into its valid range first. Returns the value actually
    /// stored.
    pub fn set(&mut self, parameter: Parameter, value: f64) -> f64 {
        let clamped = parameter.clamp(value);
        let to_bool = clamped >= 0.5;
        match parameter {
            Parameter::ParticleCount => self.particle_count = clamped.round() as usize,
            Parameter::ParticleSpace => self.particle_space = clamped,
            Parameter::ParticleMinSize => self.particle_min_size = clamped.round() as u16,
            Parameter::ParticleMaxSize => self.particle_max_size = clamped.round() as u16,
            Parameter::ParticleMass => self.particle_mass = clamped,
            Parameter::ParticleRotation => self.particle_rotation = to_bool,
            Parameter::ParticleXOffset => self.particle_x_offset = clamped,
            Parameter::OffscreenRender => self.offscreen_render = to_bool,
            Parameter::OffscreenMargin => self.offscreen_margin = clamped,
            Parameter::ForceCount => self.force_count = clamped.round() as usize,
            Parameter::ForceSpeed => self.force_speed = clamped,
            Parameter::ForceLeft => self.force_left = clamped,
            Parameter::ForceRight => self.force_right = clamped,
            Parameter::ForceMass => self.force_mass = clamped,
            Parameter::ForceYMultiplier => self.force_y_multiplier = clamped,
            Parameter::XFriction => self.x_friction = clamped,
            Parameter::YFriction => self.y_friction = clamped,
            Parameter::BlurAmount => self.blur_amount = clamped,
            Parameter::Debug => self.debug = to_bool,
        }
        self.get(parameter)
    }

    /// A copy with every value clamped into range, and the max size no smaller than the min size.
    #[must_use]
    pub fn clamped(&self) -> Self {
        let mut clamped = self.clone();
        for parameter in Parameter::ALL {
            clamped.set(parameter, self.get(parameter));
        }
        if clamped.particle_max_size < clamped.particle_min_size {
            clamped.particle_max_size = clamped.particle_min_size;
        }
        clamped
    }

    /// The parameters whose values differ between the two.
    #[must_use]
    pub fn changed(&self, other: &Self) -> Vec<Parameter> {
        Parameter::ALL
            .into_iter()
            .filter(|parameter| {
                (self.get(*parameter) - other.get(*parameter)).abs() > f64::EPSILON
            })
            .collect()
    }

    /// Whether switching to `other` requires reseeding the population.
    #[must_use]
    pub fn population_differs(&self, other: &Self) -> bool {
        self.changed(other)
            .into_iter()
            .any(Parameter::affects_population)
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests aren't so strict")]
mod test {
    use super::*;

    #[test]
    fn names_round_trip() {
        for parameter in Parameter::ALL {
            let parsed: Parameter = parameter.name().parse().unwrap();
            assert_eq!(parsed, parameter);
        }
        assert!("gravity".parse::<Parameter>().is_err());
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let mut parameters = Parameters::default();

        assert!((parameters.set(Parameter::XFriction, 1.5) - 1.0).abs() < f64::EPSILON);
        assert!((parameters.x_friction - 1.0).abs() < f64::EPSILON);

        parameters.set(Parameter::ParticleCount, 1_000_000.0);
        assert_eq!(parameters.particle_count, 10_000);

        parameters.set(Parameter::ParticleCount, -3.0);
        assert_eq!(parameters.particle_count, 1);

        parameters.set(Parameter::ForceMass, f64::NAN);
        assert!(parameters.force_mass.abs() < f64::EPSILON);
    }

    #[test]
    fn booleans() {
        let mut parameters = Parameters::default();
        parameters.set(Parameter::Debug, 0.0);
        assert!(!parameters.debug);
        parameters.set(Parameter::Debug, 1.0);
        assert!(parameters.debug);
    }

    #[test]
    fn clamping_a_whole_struct() {
        let parameters = Parameters {
            blur_amount: 7.0,
            particle_min_size: 10,
            particle_max_size: 6,
            ..Parameters::default()
        };
        let clamped = parameters.clamped();
        assert!((clamped.blur_amount - 1.0).abs() < f64::EPSILON);
        assert_eq!(clamped.particle_min_size, 10);
        assert_eq!(clamped.particle_max_size, 10);
    }

    #[test]
    fn defaults_are_already_in_range() {
        let parameters = Parameters::default();
        assert_eq!(parameters.clamped(), parameters);
    }

    #[test]
    fn population_changes() {
        let defaults = Parameters::default();

        let mut live = defaults.clone();
        live.set(Parameter::ForceMass, 60.0);
        assert_eq!(defaults.changed(&live), vec![Parameter::ForceMass]);
        assert!(!defaults.population_differs(&live));

        let mut reseed = defaults.clone();
        reseed.set(Parameter::ParticleCount, 10.0);
        assert!(defaults.population_differs(&reseed));
    }

    #[test]
    fn assignments() {
        let (parameter, value) = parse_assignment("force_mass = 60").unwrap();
        assert_eq!(parameter, Parameter::ForceMass);
        assert!((value - 60.0).abs() < f64::EPSILON);

        let (parameter, value) = parse_assignment("debug=off").unwrap();
        assert_eq!(parameter, Parameter::Debug);
        assert!(value.abs() < f64::EPSILON);

        assert!(parse_assignment("force_mass").is_err());
        assert!(parse_assignment("force_mass=lots").is_err());
        assert!(parse_assignment("mass=1").is_err());
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let parameters: Parameters = toml::from_str("particle_count = 10").unwrap();
        assert_eq!(parameters.particle_count, 10);
        assert!((parameters.force_mass - 40.0).abs() < f64::EPSILON);
    }
}
