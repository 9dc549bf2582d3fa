//! Application configuration
//!
//! Two presets reproduce the two looks of the simulation: `classic` draws
//! small white points around a red marker, `disk` adds fading trails and
//! temperature colouring. A handful of environment variables can override
//! the preset at startup:
//!
//! - `EVENT_HORIZON_PRESET`: `classic` or `disk` (default)
//! - `EVENT_HORIZON_PARTICLES`: particle count, at most 100 000
//! - `EVENT_HORIZON_SEED`: u64 seed for reproducible initial conditions

use std::str::FromStr;

use crate::error::ConfigError;
use crate::simulation::params::SimulationParams;

pub const PRESET_VAR: &str = "EVENT_HORIZON_PRESET";
pub const PARTICLES_VAR: &str = "EVENT_HORIZON_PARTICLES";
pub const SEED_VAR: &str = "EVENT_HORIZON_SEED";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Preset {
    Classic,
    #[default]
    Disk,
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "classic" => Ok(Preset::Classic),
            "disk" => Ok(Preset::Disk),
            _ => Err(ConfigError::UnknownPreset(s.to_string())),
        }
    }
}

/// Window and shader settings
#[derive(Clone, Debug, PartialEq)]
pub struct RenderSettings {
    pub title: String,
    /// World width in simulation units, also the initial window width
    pub width: u32,
    /// World height in simulation units, also the initial window height
    pub height: u32,
    pub background: [f64; 3],
    /// Colour of every particle when temperature colouring is off
    pub particle_colour: [f32; 3],
    pub particle_point_size: f32,
    /// Soft circular falloff on particle points, 0..=1
    pub glow: f32,
    pub marker_colour: [f32; 3],
    pub marker_point_size: f32,
    pub trail_colour: [f32; 3],
    pub trail_point_size: f32,
    pub trail_opacity: f32,
}

impl RenderSettings {
    pub fn classic() -> Self {
        Self {
            title: "Black Hole".to_string(),
            width: 800,
            height: 600,
            background: [0.0, 0.0, 0.0],
            particle_colour: [1.0, 1.0, 1.0],
            particle_point_size: 2.0,
            glow: 0.0,
            marker_colour: [1.0, 0.0, 0.0],
            marker_point_size: 2.0,
            trail_colour: [0.8, 0.8, 1.0],
            trail_point_size: 1.0,
            trail_opacity: 0.3,
        }
    }

    pub fn disk() -> Self {
        Self {
            background: [0.05, 0.05, 0.1],
            particle_point_size: 10.0,
            glow: 1.0,
            marker_colour: [0.8, 0.2, 0.0],
            marker_point_size: 10.0,
            ..Self::classic()
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self::disk()
    }
}

/// Everything needed to start the application
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub params: SimulationParams,
    pub render: RenderSettings,
    /// Seed for the initial conditions, random when `None`
    pub seed: Option<u64>,
}

impl Config {
    pub fn preset(preset: Preset) -> Self {
        let (params, render) = match preset {
            Preset::Classic => (
                SimulationParams {
                    dt: 0.01,
                    particle_count: 200,
                    trail_length: 0,
                    temperature_enabled: false,
                    ..SimulationParams::default()
                },
                RenderSettings::classic(),
            ),
            Preset::Disk => (SimulationParams::default(), RenderSettings::disk()),
        };

        Self {
            params,
            render,
            seed: None,
        }
    }

    /// Reads overrides from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds a config from `lookup`, which maps variable names to values
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let preset = match lookup(PRESET_VAR) {
            Some(value) => value.parse()?,
            None => Preset::default(),
        };
        let mut config = Self::preset(preset);

        if let Some(value) = lookup(PARTICLES_VAR) {
            let count = parse_override(PARTICLES_VAR, &value)?;
            config.params = SimulationParams {
                particle_count: count,
                ..config.params
            };
        }
        if let Some(value) = lookup(SEED_VAR) {
            config.seed = Some(parse_override(SEED_VAR, &value)?);
        }

        config.validate()?;
        Ok(config)
    }

    /// Runs the parameter checks of [`SimulationParamsBuilder`](crate::simulation::params::SimulationParamsBuilder)
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.params;
        SimulationParams::builder()
            .with_gravity(p.gravitational_constant, p.central_mass)
            .with_center(p.center.x, p.center.y)
            .with_min_radius(p.min_radius)
            .with_dt(p.dt)
            .with_count(p.particle_count)
            .with_trail_length(p.trail_length)
            .with_temperature(p.temperature_enabled)
            .with_orbit_damping(p.orbit_damping)
            .with_seed_radius(p.seed_radius.clone())
            .with_accretion_disk_radius(p.accretion_disk_radius)
            .build()
            .map(|_| ())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::preset(Preset::default())
    }
}

fn parse_override<T: FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidOverride {
            var,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::params::MAX_PARTICLES;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| map.get(var).cloned()
    }

    #[test]
    fn test_default_is_disk_preset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::preset(Preset::Disk));
        assert!(config.params.trails_enabled());
        assert!(config.params.temperature_enabled);
        assert_eq!(config.params.particle_count, 100);
    }

    #[test]
    fn test_classic_preset() {
        let config = Config::from_lookup(lookup(&[(PRESET_VAR, "Classic")])).unwrap();
        assert_eq!(config.params.particle_count, 200);
        assert_eq!(config.params.dt, 0.01);
        assert!(!config.params.trails_enabled());
        assert!(!config.params.temperature_enabled);
        assert_eq!(config.render.marker_colour, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            (PARTICLES_VAR, "25"),
            (SEED_VAR, " 1234 "),
        ]))
        .unwrap();
        assert_eq!(config.params.particle_count, 25);
        assert_eq!(config.seed, Some(1234));
    }

    #[test]
    fn test_unknown_preset() {
        let err = Config::from_lookup(lookup(&[(PRESET_VAR, "spiral")])).unwrap_err();
        assert_eq!(err, ConfigError::UnknownPreset("spiral".to_string()));
    }

    #[test]
    fn test_bad_particle_count() {
        let err = Config::from_lookup(lookup(&[(PARTICLES_VAR, "many")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOverride { var: PARTICLES_VAR, .. }));

        let err = Config::from_lookup(lookup(&[(PARTICLES_VAR, "0")])).unwrap_err();
        assert_eq!(err, ConfigError::NoParticles);
    }

    #[test]
    fn test_particle_count_is_bounded() {
        let err = Config::from_lookup(lookup(&[(PARTICLES_VAR, "500000")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::TooManyParticles {
                count: 500_000,
                max: MAX_PARTICLES
            }
        );

        let config = Config::from_lookup(lookup(&[
            (PRESET_VAR, "classic"),
            (PARTICLES_VAR, "100000"),
        ]))
        .unwrap();
        assert_eq!(config.params.particle_count, MAX_PARTICLES);
    }
}
