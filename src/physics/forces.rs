use nalgebra::Vector2;

use super::area::AreaEffect;
use super::neighbors::NeighborSummary;
use super::{normalize_or, Boid, Direction};
use crate::app_settings::SimulationSettings;

/// The four steering contributions acting on one boid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Forces {
    pub separation: Vector2<f32>,
    pub alignment: Vector2<f32>,
    pub cohesion: Vector2<f32>,
    pub area: Vector2<f32>,
}

impl Forces {
    pub fn compute(
        boid: &Boid,
        summary: &NeighborSummary,
        area: &AreaEffect,
        settings: &SimulationSettings,
    ) -> Self {
        let zero = Vector2::zeros();
        Self {
            separation: normalize_or(summary.average_separation - boid.direction, zero)
                * -settings.separation_weight,
            alignment: normalize_or(summary.average_direction - boid.direction, zero)
                * settings.alignment_weight,
            cohesion: normalize_or(summary.average_position - boid.position, zero)
                * settings.cohesion_weight,
            area: area.influence(&boid.position, settings),
        }
    }

    /// Folds the forces into `direction` one at a time, renormalizing after
    /// each. The order matters: separation, alignment, cohesion, area.
    pub fn apply(&self, direction: Direction) -> Direction {
        [self.separation, self.alignment, self.cohesion, self.area]
            .into_iter()
            .fold(direction, |heading, force| normalize_or(heading + force, heading))
    }
}

/// New heading for `boid` given its neighbor summary and the area effect.
pub fn steer(
    boid: &Boid,
    summary: &NeighborSummary,
    area: &AreaEffect,
    settings: &SimulationSettings,
) -> Direction {
    Forces::compute(boid, summary, area, settings).apply(boid.direction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::area::AreaMode;
    use crate::physics::Position;

    fn unit(x: f32, y: f32) -> Direction {
        Direction::new(x, y).normalize()
    }

    #[test]
    fn isolated_boid_is_not_steered() {
        let settings = SimulationSettings::classic();
        let area = AreaEffect::new(&settings);
        let boid = Boid::new(Position::new(40.0, 40.0), unit(1.0, 2.0));
        let summary = NeighborSummary::isolated(&boid);

        let forces = Forces::compute(&boid, &summary, &area, &settings);
        assert_eq!(forces.alignment, Vector2::zeros());
        assert_eq!(forces.cohesion, Vector2::zeros());
        assert_eq!(forces.area, Vector2::zeros());
        assert!((steer(&boid, &summary, &area, &settings) - boid.direction).norm() < 1e-6);
    }

    #[test]
    fn separation_turns_away_from_close_neighbor() {
        let settings = SimulationSettings {
            separation_weight: 0.5,
            ..SimulationSettings::classic()
        };
        let area = AreaEffect::new(&settings);
        let boid = Boid::new(Position::new(100.0, 100.0), unit(0.0, 1.0));
        let summary = NeighborSummary {
            average_separation: Vector2::new(1.0, 0.0),
            ..NeighborSummary::isolated(&boid)
        };
        let heading = steer(&boid, &summary, &area, &settings);
        assert!(heading.x < 0.0);
        assert!((heading.norm() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn cohesion_and_alignment_pull_toward_the_group() {
        let settings = SimulationSettings {
            separation_weight: 0.0,
            alignment_weight: 0.2,
            cohesion_weight: 0.2,
            ..SimulationSettings::classic()
        };
        let area = AreaEffect::new(&settings);
        let boid = Boid::new(Position::new(100.0, 100.0), unit(1.0, 0.0));
        let summary = NeighborSummary {
            average_position: Position::new(100.0, 140.0),
            average_direction: unit(0.0, 1.0),
            count: 3,
            ..NeighborSummary::isolated(&boid)
        };
        let heading = steer(&boid, &summary, &area, &settings);
        assert!(heading.y > 0.0);
        assert!(heading.x > 0.0);
    }

    #[test]
    fn fold_order_is_sequential() {
        let forces = Forces {
            separation: Vector2::new(0.0, 1.0),
            alignment: Vector2::new(-1.0, 0.0),
            cohesion: Vector2::zeros(),
            area: Vector2::zeros(),
        };
        let mut expected = unit(1.0, 0.0);
        expected = (expected + forces.separation).normalize();
        expected = (expected + forces.alignment).normalize();
        let folded = forces.apply(unit(1.0, 0.0));
        assert!((folded - expected).norm() < 1e-6);

        // Summing first and normalizing once gives a different heading.
        let summed = (unit(1.0, 0.0) + forces.separation + forces.alignment).normalize();
        assert!((folded - summed).norm() > 1e-3);
    }

    #[test]
    fn exact_cancellation_keeps_heading() {
        let forces = Forces {
            separation: Vector2::new(-1.0, 0.0),
            alignment: Vector2::zeros(),
            cohesion: Vector2::zeros(),
            area: Vector2::zeros(),
        };
        assert_eq!(forces.apply(Direction::new(1.0, 0.0)), Direction::new(1.0, 0.0));
    }

    #[test]
    fn area_mode_decides_turn_direction() {
        let settings = SimulationSettings::classic();
        let mut area = AreaEffect::new(&settings);
        area.set_center(Some(Position::new(100.0, 100.0)));
        let boid = Boid::new(Position::new(100.0, 90.0), unit(1.0, 0.0));
        let summary = NeighborSummary::isolated(&boid);

        let repelled = steer(&boid, &summary, &area, &settings);
        assert!(repelled.y < 0.0);

        area.set_mode(AreaMode::Attract);
        let attracted = steer(&boid, &summary, &area, &settings);
        assert!(attracted.y > 0.0);
    }
}
