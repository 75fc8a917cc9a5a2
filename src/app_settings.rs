use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors raised when a set of simulation constants cannot be run.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("view distance (cell size) must be positive and finite, got {0}")]
    InvalidCellSize(f32),
    #[error("simulation plane must have positive dimensions, got {width}x{height}")]
    InvalidDimensions { width: f32, height: f32 },
    #[error("{axis} extent {extent} is not a multiple of the cell size {cell_size}")]
    UnevenGrid {
        axis: &'static str,
        extent: f32,
        cell_size: f32,
    },
    #[error("avoid distance {avoid} must be positive and below the view distance {view}")]
    InvalidAvoidDistance { avoid: f32, view: f32 },
    #[error("agent count must be between 1 and {max}, got {count}")]
    InvalidAgentCount { count: usize, max: usize },
    #[error("{name} must be finite and non-negative, got {value}")]
    Negative { name: &'static str, value: f32 },
    #[error("target frame rate must be positive, got {0}")]
    InvalidFrameRate(f64),
}

/// Errors raised while reading the settings file.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown profile `{0}`")]
    UnknownProfile(String),
}

/// Immutable constants for one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Width of the simulation plane, also the window's logical width
    pub width: f32,
    /// Height of the simulation plane, also the window's logical height
    pub height: f32,
    pub agent_count: usize,
    /// Flocking neighbor radius; doubles as the grid cell size
    pub view_distance: f32,
    /// Radius under which neighbors contribute to separation
    pub avoid_distance: f32,
    /// Neighbors whose position dot product falls below this are ignored
    pub view_dot_threshold: f32,
    pub separation_weight: f32,
    pub alignment_weight: f32,
    pub cohesion_weight: f32,
    pub area_weight: f32,
    pub max_area_radius: f32,
    /// Radius change per scroll notch
    pub area_radius_step: f32,
    /// Distance travelled per second along the heading
    pub move_speed: f32,
    pub target_fps: f64,
    /// Seed for the initial population
    pub seed: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self::classic()
    }
}

impl SimulationSettings {
    /// The reference constants: a small flock on a square plane.
    pub fn classic() -> Self {
        Self {
            width: 1024.0,
            height: 1024.0,
            agent_count: 64,
            view_distance: 64.0,
            avoid_distance: 16.0,
            view_dot_threshold: -0.6,
            separation_weight: 0.02,
            alignment_weight: 0.008,
            cohesion_weight: 0.015,
            area_weight: 2.0,
            max_area_radius: 256.0,
            area_radius_step: 8.0,
            // 0.3 units per frame at 360 fps
            move_speed: 108.0,
            target_fps: 360.0,
            seed: 0,
        }
    }

    /// A dense population on a wide plane with a short view distance.
    pub fn swarm() -> Self {
        Self {
            width: 1600.0,
            height: 1024.0,
            agent_count: 30_000,
            view_distance: 16.0,
            avoid_distance: 4.0,
            view_dot_threshold: -0.6,
            separation_weight: 0.05,
            alignment_weight: 0.03,
            cohesion_weight: 0.01,
            area_weight: 4.0,
            max_area_radius: 320.0,
            area_radius_step: 16.0,
            move_speed: 60.0,
            target_fps: 60.0,
            seed: 0,
        }
    }

    /// Looks up a named preset.
    pub fn profile(name: &str) -> Option<Self> {
        match name {
            "classic" => Some(Self::classic()),
            "swarm" => Some(Self::swarm()),
            _ => None,
        }
    }

    /// Cell edge length of the spatial grid.
    pub fn cell_size(&self) -> f32 {
        self.view_distance
    }

    pub fn view_distance_sq(&self) -> f32 {
        self.view_distance * self.view_distance
    }

    pub fn avoid_distance_sq(&self) -> f32 {
        self.avoid_distance * self.avoid_distance
    }

    /// Checks every constant the simulation depends on. Must pass before a run starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let cell_size = self.cell_size();
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(ConfigError::InvalidCellSize(cell_size));
        }
        if !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
        {
            return Err(ConfigError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        for (axis, extent) in [("width", self.width), ("height", self.height)] {
            let cells = extent / cell_size;
            if (cells - cells.round()).abs() > 1e-4 || cells.round() < 1.0 {
                return Err(ConfigError::UnevenGrid {
                    axis,
                    extent,
                    cell_size,
                });
            }
        }
        if !self.avoid_distance.is_finite()
            || self.avoid_distance <= 0.0
            || self.avoid_distance >= self.view_distance
        {
            return Err(ConfigError::InvalidAvoidDistance {
                avoid: self.avoid_distance,
                view: self.view_distance,
            });
        }
        let max_agents = u32::MAX as usize;
        if self.agent_count == 0 || self.agent_count > max_agents {
            return Err(ConfigError::InvalidAgentCount {
                count: self.agent_count,
                max: max_agents,
            });
        }
        for (name, value) in [
            ("separation_weight", self.separation_weight),
            ("alignment_weight", self.alignment_weight),
            ("cohesion_weight", self.cohesion_weight),
            ("area_weight", self.area_weight),
            ("max_area_radius", self.max_area_radius),
            ("area_radius_step", self.area_radius_step),
            ("move_speed", self.move_speed),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Negative { name, value });
            }
        }
        if !self.target_fps.is_finite() || self.target_fps <= 0.0 {
            return Err(ConfigError::InvalidFrameRate(self.target_fps));
        }
        Ok(())
    }
}

/// Application settings read from `boids.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Name of the preset to start from
    pub profile: String,
    /// Overrides the preset's population size
    pub agent_count: Option<usize>,
    /// Overrides the preset's seed
    pub seed: Option<u64>,
    /// Whether the area effect ring is drawn
    pub show_area: bool,
    /// Draws view/avoid rings and a heading line on every boid. Unset means
    /// on for `classic` and off for larger presets.
    pub show_radii: Option<bool>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            profile: "classic".to_string(),
            agent_count: None,
            seed: None,
            show_area: true,
            show_radii: None,
        }
    }
}

impl AppSettings {
    const SETTINGS_FILE: &'static str = "boids.toml";

    /// Loads settings from the settings file, or returns default settings if the file doesn't exist
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from(Path::new(Self::SETTINGS_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        if path.exists() {
            let contents = fs::read_to_string(path)?;
            Self::parse(&contents)
        } else {
            Ok(Self::default())
        }
    }

    pub fn parse(contents: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn radii_visible(&self) -> bool {
        self.show_radii.unwrap_or(self.profile == "classic")
    }

    /// Resolves the selected preset and applies the overrides.
    pub fn simulation(&self) -> Result<SimulationSettings, SettingsError> {
        let mut settings = SimulationSettings::profile(&self.profile)
            .ok_or_else(|| SettingsError::UnknownProfile(self.profile.clone()))?;
        if let Some(count) = self.agent_count {
            settings.agent_count = count;
        }
        if let Some(seed) = self.seed {
            settings.seed = seed;
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_valid() {
        assert_eq!(SimulationSettings::classic().validate(), Ok(()));
        assert_eq!(SimulationSettings::swarm().validate(), Ok(()));
    }

    #[test]
    fn rejects_uneven_grid() {
        let settings = SimulationSettings {
            width: 1000.0,
            ..SimulationSettings::classic()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::UnevenGrid { axis: "width", .. })
        ));
    }

    #[test]
    fn rejects_bad_cell_size() {
        for view_distance in [0.0, -4.0, f32::NAN] {
            let settings = SimulationSettings {
                view_distance,
                ..SimulationSettings::classic()
            };
            assert!(matches!(
                settings.validate(),
                Err(ConfigError::InvalidCellSize(_))
            ));
        }
    }

    #[test]
    fn rejects_avoid_distance_outside_view() {
        let settings = SimulationSettings {
            avoid_distance: 64.0,
            ..SimulationSettings::classic()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidAvoidDistance { .. })
        ));
    }

    #[test]
    fn rejects_empty_population_and_negative_weights() {
        let empty = SimulationSettings {
            agent_count: 0,
            ..SimulationSettings::classic()
        };
        assert!(matches!(
            empty.validate(),
            Err(ConfigError::InvalidAgentCount { count: 0, .. })
        ));

        let negative = SimulationSettings {
            cohesion_weight: -1.0,
            ..SimulationSettings::classic()
        };
        assert_eq!(
            negative.validate(),
            Err(ConfigError::Negative {
                name: "cohesion_weight",
                value: -1.0
            })
        );
    }

    #[test]
    fn parses_profile_with_overrides() {
        let app = AppSettings::parse(
            r#"
            profile = "swarm"
            agent_count = 500
            seed = 7
            "#,
        )
        .unwrap();
        assert!(app.show_area);
        let sim = app.simulation().unwrap();
        assert_eq!(sim.agent_count, 500);
        assert_eq!(sim.seed, 7);
        assert_eq!(sim.view_distance, SimulationSettings::swarm().view_distance);
    }

    #[test]
    fn radii_overlay_defaults_follow_profile() {
        assert!(AppSettings::default().radii_visible());
        let swarm = AppSettings::parse(r#"profile = "swarm""#).unwrap();
        assert!(!swarm.radii_visible());
        let forced = AppSettings::parse(
            r#"
            profile = "swarm"
            show_radii = true
            "#,
        )
        .unwrap();
        assert!(forced.radii_visible());
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let app = AppSettings::parse(r#"profile = "murmuration""#).unwrap();
        assert!(matches!(
            app.simulation(),
            Err(SettingsError::UnknownProfile(name)) if name == "murmuration"
        ));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let app = AppSettings::load_from(Path::new("does/not/exist/boids.toml")).unwrap();
        assert_eq!(app.profile, "classic");
        assert_eq!(app.simulation().unwrap(), SimulationSettings::classic());
    }
}
