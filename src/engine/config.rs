// Flock configuration: the fixed constants of a run, passed by value into
// the simulation at construction and never mutated afterwards.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("domain must be finite and positive, got {width} x {height}")]
    InvalidDomain { width: f64, height: f64 },

    #[error("{name} must be finite, got {value}")]
    NotFinite { name: &'static str, value: f64 },

    #[error("{name} must not be negative, got {value}")]
    Negative { name: &'static str, value: f64 },
}

/// How `average_heading` combines the headings of nearby agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadingAverage {
    /// Plain arithmetic mean of the degree values. Misbehaves across the
    /// 0/360 seam (350 and 10 average to 180).
    #[default]
    Arithmetic,
    /// Mean of unit heading vectors.
    Circular,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlockConfig {
    pub width: f64,
    pub height: f64,
    pub population: usize,
    /// Body diameter in domain units. Only used for drawing.
    pub agent_size: f64,
    /// Distance covered by every agent each tick.
    pub movement_dist: f64,
    /// Fraction of the angular gap to the target heading closed per tick.
    pub maneuverability: f64,
    /// Below this distance to its nearest neighbour an agent aligns with the
    /// local group instead of steering toward the neighbour.
    pub group_dist: f64,
    pub angle_average_radius: f64,
    /// Half-width of the field of view in degrees.
    pub view_angle: f64,
    pub collision_avoid_angle: f64,
    pub collision_dist: f64,
    pub frame_delay: Duration,

    pub enable_view_filter: bool,
    pub enable_collision_avoidance: bool,
    pub heading_average: HeadingAverage,
}

impl Default for FlockConfig {
    fn default() -> Self {
        Self {
            width: 1500.0,
            height: 1000.0,
            population: 250,
            agent_size: 10.0,
            movement_dist: 5.0,
            maneuverability: 1.0 / 30.0,
            group_dist: 25.0,
            angle_average_radius: 100.0,
            view_angle: 45.0,
            collision_avoid_angle: 5.0,
            collision_dist: 15.0,
            frame_delay: Duration::from_millis(7),
            enable_view_filter: false,
            enable_collision_avoidance: false,
            heading_average: HeadingAverage::Arithmetic,
        }
    }
}

impl FlockConfig {
    pub fn with_domain(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_population(mut self, population: usize) -> Self {
        self.population = population;
        self
    }

    pub fn with_view_filter(mut self, enabled: bool) -> Self {
        self.enable_view_filter = enabled;
        self
    }

    pub fn with_collision_avoidance(mut self, enabled: bool) -> Self {
        self.enable_collision_avoidance = enabled;
        self
    }

    pub fn with_heading_average(mut self, mode: HeadingAverage) -> Self {
        self.heading_average = mode;
        self
    }

    /// The view angle to hand to neighbour search, or `None` when the
    /// filter is disabled.
    pub fn view_filter(&self) -> Option<f64> {
        self.enable_view_filter.then_some(self.view_angle)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let domain_ok = |v: f64| v.is_finite() && v > 0.0;
        if !domain_ok(self.width) || !domain_ok(self.height) {
            return Err(ConfigError::InvalidDomain {
                width: self.width,
                height: self.height,
            });
        }

        let finite = [
            ("agent_size", self.agent_size),
            ("movement_dist", self.movement_dist),
            ("maneuverability", self.maneuverability),
            ("view_angle", self.view_angle),
            ("collision_avoid_angle", self.collision_avoid_angle),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { name, value });
            }
        }

        let radii = [
            ("group_dist", self.group_dist),
            ("angle_average_radius", self.angle_average_radius),
            ("collision_dist", self.collision_dist),
        ];
        for (name, value) in radii {
            if !value.is_finite() {
                return Err(ConfigError::NotFinite { name, value });
            }
            if value < 0.0 {
                return Err(ConfigError::Negative { name, value });
            }
        }

        Ok(())
    }
}
