use boids_grid::{
    AreaEffect, AreaMode, Boid, CellCoord, Direction, Flock, Position, SimulationSettings,
};

fn assert_grid_consistent(flock: &Flock) {
    let grid = flock.grid();
    let mut seen = vec![0usize; flock.len()];
    for index in 0..grid.cell_count() {
        let cell = grid.coord(index);
        for (steps, agent) in grid.bucket(cell).enumerate() {
            assert!(steps < flock.len(), "bucket {:?} does not terminate", cell);
            assert_eq!(flock.cell_of(agent), cell, "agent {} in wrong bucket", agent);
            seen[agent] += 1;
        }
    }
    for (agent, count) in seen.iter().enumerate() {
        assert_eq!(*count, 1, "agent {} linked {} times", agent, count);
    }
}

fn toroidal_distance(flock: &Flock, a: usize, b: usize) -> f32 {
    let boids = flock.boids();
    flock
        .bounds()
        .shortest_delta(&boids[a].position, &boids[b].position)
        .norm()
}

#[test]
fn grid_stays_consistent_over_many_steps() {
    let settings = SimulationSettings {
        agent_count: 400,
        seed: 7,
        ..SimulationSettings::classic()
    };
    let mut flock = Flock::new(settings).unwrap();
    let mut area = AreaEffect::new(flock.settings());
    area.set_center(Some(Position::new(512.0, 512.0)));
    area.set_mode(AreaMode::Attract);
    assert_grid_consistent(&flock);

    let mut migrations = 0;
    for step in 0..300 {
        if step == 150 {
            area.toggle_mode();
        }
        migrations += flock.step(&area, 1.0 / 30.0).migrations;
        assert_grid_consistent(&flock);
    }
    assert!(migrations > 0);
}

#[test]
fn headings_stay_unit_and_positions_in_bounds() {
    let settings = SimulationSettings {
        seed: 99,
        ..SimulationSettings::swarm()
    };
    let settings = SimulationSettings {
        agent_count: 3_000,
        ..settings
    };
    let mut flock = Flock::new(settings).unwrap();
    let area = AreaEffect::new(flock.settings());
    for _ in 0..50 {
        flock.step(&area, 1.0 / 60.0);
        let (width, height) = (flock.settings().width, flock.settings().height);
        for boid in flock.boids() {
            assert!((boid.direction.norm() - 1.0).abs() < 1e-4);
            assert!(boid.position.x >= 0.0 && boid.position.x < width);
            assert!(boid.position.y >= 0.0 && boid.position.y < height);
        }
    }
    assert_grid_consistent(&flock);
}

#[test]
fn position_on_the_boundary_wraps_to_zero() {
    // With no separation weight a lone boid's heading stays exactly (1, 0).
    let settings = SimulationSettings {
        move_speed: 1.0,
        separation_weight: 0.0,
        ..SimulationSettings::classic()
    };
    let mut flock = Flock::from_boids(
        settings,
        vec![Boid::new(Position::new(1023.0, 10.0), Direction::new(1.0, 0.0))],
    )
    .unwrap();
    let area = AreaEffect::new(flock.settings());
    flock.step(&area, 1.0);
    assert_eq!(flock.boids()[0].position.x, 0.0);
    assert_eq!(flock.cell_of(0), CellCoord::new(0, 0));
    assert_grid_consistent(&flock);
}

#[test]
fn isolated_boid_is_only_turned_by_the_area() {
    let heading = Direction::new(0.0, 1.0);
    let mut flock = Flock::from_boids(
        SimulationSettings::classic(),
        vec![Boid::new(Position::new(300.0, 300.0), heading)],
    )
    .unwrap();
    let mut area = AreaEffect::new(flock.settings());
    flock.step(&area, 1.0 / 60.0);
    assert!((flock.boids()[0].direction - heading).norm() < 1e-6);

    area.set_center(Some(Position::new(290.0, 300.0)));
    flock.step(&area, 1.0 / 60.0);
    assert!(flock.boids()[0].direction.x > 0.0);
}

#[test]
fn close_pair_separates() {
    let settings = SimulationSettings {
        separation_weight: 0.5,
        alignment_weight: 0.0,
        cohesion_weight: 0.0,
        move_speed: 1.0,
        ..SimulationSettings::classic()
    };
    let boids = vec![
        Boid::new(Position::new(0.0, 0.0), Direction::new(0.0, 1.0)),
        Boid::new(Position::new(1.0, 0.0), Direction::new(0.0, -1.0)),
    ];
    let mut flock = Flock::from_boids(settings.clone(), boids.clone()).unwrap();
    let unsteered_settings = SimulationSettings {
        separation_weight: 0.0,
        ..settings
    };
    let mut unsteered = Flock::from_boids(unsteered_settings, boids).unwrap();
    let area = AreaEffect::new(flock.settings());

    let mut distance = toroidal_distance(&flock, 0, 1);
    for _ in 0..5 {
        flock.step(&area, 1.0);
        unsteered.step(&area, 1.0);
        let next = toroidal_distance(&flock, 0, 1);
        assert!(next > distance, "{} should exceed {}", next, distance);
        distance = next;
    }
    assert!(flock.boids()[0].direction.x < 0.0);
    assert!(flock.boids()[1].direction.x > 0.0);
    assert!(distance > toroidal_distance(&unsteered, 0, 1));
    assert_grid_consistent(&flock);
}

#[test]
fn boid_changes_bucket_on_the_crossing_step() {
    let settings = SimulationSettings {
        move_speed: 0.5,
        separation_weight: 0.0,
        ..SimulationSettings::classic()
    };
    let mut flock = Flock::from_boids(
        settings,
        vec![Boid::new(Position::new(63.0, 10.0), Direction::new(1.0, 0.0))],
    )
    .unwrap();
    let area = AreaEffect::new(flock.settings());
    let (old, new) = (CellCoord::new(0, 0), CellCoord::new(1, 0));

    let stats = flock.step(&area, 1.0);
    assert_eq!(stats.migrations, 0);
    assert_eq!(flock.grid().bucket(old).collect::<Vec<_>>(), vec![0]);
    assert_eq!(flock.grid().bucket(new).count(), 0);

    let stats = flock.step(&area, 1.0);
    assert_eq!(flock.boids()[0].position.x, 64.0);
    assert_eq!(stats.migrations, 1);
    assert_eq!(flock.grid().bucket(old).count(), 0);
    assert_eq!(flock.grid().bucket(new).collect::<Vec<_>>(), vec![0]);
}

#[test]
fn aggregation_reads_the_previous_step() {
    // Two boids that see each other; the result must not depend on the
    // order they are stored in.
    let settings = SimulationSettings {
        move_speed: 10.0,
        ..SimulationSettings::classic()
    };
    let a = Boid::new(Position::new(200.0, 200.0), Direction::new(1.0, 0.0));
    let b = Boid::new(Position::new(210.0, 205.0), Direction::new(0.0, 1.0));
    let mut forward = Flock::from_boids(settings.clone(), vec![a, b]).unwrap();
    let mut reverse = Flock::from_boids(settings, vec![b, a]).unwrap();
    let area = AreaEffect::new(forward.settings());

    for _ in 0..3 {
        forward.step(&area, 0.1);
        reverse.step(&area, 0.1);
    }
    assert_eq!(forward.boids()[0], reverse.boids()[1]);
    assert_eq!(forward.boids()[1], reverse.boids()[0]);
}
