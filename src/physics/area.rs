use nalgebra::Vector2;

use super::Position;
use crate::app_settings::SimulationSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaMode {
    Attract,
    Repel,
}

impl AreaMode {
    pub fn toggled(self) -> Self {
        match self {
            AreaMode::Attract => AreaMode::Repel,
            AreaMode::Repel => AreaMode::Attract,
        }
    }
}

/// Circular zone that pushes boids away from, or pulls them toward, its center.
///
/// The center follows the pointer; `None` means the pointer is outside the
/// window and the zone has no effect.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaEffect {
    center: Option<Position>,
    radius: f32,
    max_radius: f32,
    radius_step: f32,
    mode: AreaMode,
}

impl AreaEffect {
    pub fn new(settings: &SimulationSettings) -> Self {
        Self {
            center: None,
            radius: settings.max_area_radius / 4.0,
            max_radius: settings.max_area_radius,
            radius_step: settings.area_radius_step,
            mode: AreaMode::Repel,
        }
    }

    pub fn center(&self) -> Option<Position> {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn mode(&self) -> AreaMode {
        self.mode
    }

    pub fn set_center(&mut self, center: Option<Position>) {
        self.center = center;
    }

    pub fn set_mode(&mut self, mode: AreaMode) {
        self.mode = mode;
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius.clamp(0.0, self.max_radius);
    }

    /// Grows (positive) or shrinks (negative) the radius by `notches` steps.
    pub fn scroll(&mut self, notches: f32) {
        self.set_radius(self.radius + notches * self.radius_step);
    }

    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
    }

    /// Inverse-square push on a boid at `position`, reversed in attract mode.
    ///
    /// Boids farther than `sqrt(radius² + avoid_distance²)` from the center
    /// are unaffected.
    pub fn influence(&self, position: &Position, settings: &SimulationSettings) -> Vector2<f32> {
        let Some(center) = self.center else {
            return Vector2::zeros();
        };
        let offset = position - center;
        let distance_sq = offset.norm_squared();
        let reach_sq = self.radius * self.radius + settings.avoid_distance_sq();
        if distance_sq >= reach_sq || distance_sq <= f32::EPSILON {
            return Vector2::zeros();
        }
        let push = offset / distance_sq * settings.area_weight;
        match self.mode {
            AreaMode::Repel => push,
            AreaMode::Attract => -push,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area() -> (AreaEffect, SimulationSettings) {
        let settings = SimulationSettings::classic();
        (AreaEffect::new(&settings), settings)
    }

    #[test]
    fn absent_pointer_has_no_influence() {
        let (area, settings) = area();
        assert_eq!(area.center(), None);
        assert_eq!(
            area.influence(&Position::new(10.0, 10.0), &settings),
            Vector2::zeros()
        );
    }

    #[test]
    fn repel_pushes_away_and_attract_pulls_in() {
        let (mut area, settings) = area();
        area.set_center(Some(Position::new(100.0, 100.0)));
        let boid = Position::new(110.0, 100.0);

        let push = area.influence(&boid, &settings);
        assert!(push.x > 0.0);
        assert!((push.x - settings.area_weight / 10.0).abs() < 1e-6);
        assert_eq!(push.y, 0.0);

        area.toggle_mode();
        assert_eq!(area.mode(), AreaMode::Attract);
        assert_eq!(area.influence(&boid, &settings), -push);
    }

    #[test]
    fn reach_includes_avoid_distance() {
        let (mut area, settings) = area();
        area.set_center(Some(Position::new(0.0, 0.0)));
        area.set_radius(0.0);
        assert_ne!(
            area.influence(&Position::new(15.0, 0.0), &settings),
            Vector2::zeros()
        );
        assert_eq!(
            area.influence(&Position::new(17.0, 0.0), &settings),
            Vector2::zeros()
        );
    }

    #[test]
    fn boid_on_center_is_left_alone() {
        let (mut area, settings) = area();
        area.set_center(Some(Position::new(5.0, 5.0)));
        assert_eq!(
            area.influence(&Position::new(5.0, 5.0), &settings),
            Vector2::zeros()
        );
    }

    #[test]
    fn scroll_clamps_radius() {
        let (mut area, settings) = area();
        area.scroll(1000.0);
        assert_eq!(area.radius(), settings.max_area_radius);
        area.scroll(-1000.0);
        assert_eq!(area.radius(), 0.0);
        area.scroll(2.0);
        assert_eq!(area.radius(), 2.0 * settings.area_radius_step);
    }
}
