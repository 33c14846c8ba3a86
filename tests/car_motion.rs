use anyhow::Result;
use signal_sim::simulation::{
    Approach, Car, CarId, CarState, DrivingRules, EventLog, Intersection, Leader, TrafficEvent, TurnIntent,
};

/// A car on the straight lane of `approach`, placed at progress `t`.
fn car_on(world: &Intersection, approach: Approach, t: f32) -> Car {
    let (route, path) = world.paths().resolve(approach, TurnIntent::Straight).expect("straight lane");
    let mut car = Car::new(CarId(1), approach, path.start, 20.0, 10.0, 0.1);
    car.assign_route(route, path);
    car.t = t;
    car.position = path.position_at(t);
    car
}

/// Runs `ticks` updates of `dt` and returns the final clock reading.
fn drive(car: &mut Car, world: &Intersection, rules: &DrivingRules, events: &mut EventLog, ticks: usize, dt: f32, start: f32) -> f32 {
    let mut now = start;
    for _ in 0..ticks {
        now += dt;
        car.update(dt, now, world, None, rules, events);
    }
    now
}

/// Progress never goes backwards and never exceeds 1
#[test]
fn test_progress_monotonic_and_clamped() -> Result<()> {
    let world = Intersection::default();
    let rules = DrivingRules::default();
    let mut events = EventLog::new();
    let mut car = car_on(&world, Approach::East, 0.0);

    let mut last_t = car.t;
    for step in 0..2000 {
        car.update(10.0, step as f32 * 10.0, &world, None, &rules, &mut events);
        assert!(car.t >= last_t, "t went backwards at step {}", step);
        assert!(car.t <= 1.0, "t exceeded 1 at step {}", step);
        last_t = car.t;
    }

    assert_eq!(car.state, CarState::Completed);
    assert!(car.completed_at.is_some());
    Ok(())
}

/// At constant speed a straight lane of length L takes L / speed
#[test]
fn test_travel_time_matches_length() -> Result<()> {
    let world = Intersection::default();
    let rules = DrivingRules::default();
    let mut events = EventLog::new();
    let mut car = car_on(&world, Approach::East, 0.0);

    let mut elapsed = 0.0;
    while car.t < 1.0 && elapsed < 20_000.0 {
        elapsed += 10.0;
        car.update(10.0, elapsed, &world, None, &rules, &mut events);
    }

    // East lane spans the full 800px canvas at 0.1 px/ms
    assert!((7_900.0..=8_100.0).contains(&elapsed), "took {}ms", elapsed);

    car.update(10.0, elapsed + 10.0, &world, None, &rules, &mut events);
    assert!(car.is_completed());
    assert!(events.events.contains(&TrafficEvent::WaitCleared(car.id)));
    Ok(())
}

/// A red light holds the car inside the look-ahead window until it turns green
#[test]
fn test_held_at_red_until_green() -> Result<()> {
    let mut world = Intersection::default();
    let rules = DrivingRules::default();
    let mut events = EventLog::new();
    let mut car = car_on(&world, Approach::North, 0.0);

    let now = drive(&mut car, &world, &rules, &mut events, 500, 10.0, 0.0);
    assert_eq!(car.state, CarState::StoppedAtLight);
    assert!(car.position.y >= 219.0 && car.position.y <= 270.0, "stopped at y={}", car.position.y);
    assert_eq!(car.current_speed, 0.0);

    let held_t = car.t;
    let now = drive(&mut car, &world, &rules, &mut events, 100, 10.0, now);
    assert_eq!(car.t, held_t, "car crept forward at red");
    assert!(car.wait_time > 0.0);

    world.toggle_light(Approach::North);
    car.update(10.0, now + 10.0, &world, None, &rules, &mut events);

    assert_eq!(car.state, CarState::Traveling);
    assert_eq!(car.wait_time, 0.0);
    assert!(car.t > held_t);
    assert!(events.events.contains(&TrafficEvent::WaitCleared(car.id)));
    Ok(())
}

/// Yellow stops a car the same way red does
#[test]
fn test_held_at_yellow() -> Result<()> {
    let mut world = Intersection::default();
    world.toggle_light(Approach::East);
    let rules = DrivingRules::default();
    let mut events = EventLog::new();

    // 40px before the east stop line at x=430
    let mut car = car_on(&world, Approach::East, (800.0 - 470.0) / 800.0);
    car.update(10.0, 10.0, &world, None, &rules, &mut events);

    assert_eq!(car.state, CarState::StoppedAtLight);
    Ok(())
}

/// A car already inside the crossing keeps going through a red light
#[test]
fn test_no_stop_inside_intersection() -> Result<()> {
    let world = Intersection::default();
    let rules = DrivingRules::default();
    let mut events = EventLog::new();
    let mut car = car_on(&world, Approach::North, 0.5);

    car.update(10.0, 10.0, &world, None, &rules, &mut events);

    assert_eq!(car.state, CarState::Traveling);
    assert!(car.t > 0.5);
    Ok(())
}

/// A car far from the stop line ignores a red light
#[test]
fn test_red_ignored_outside_window() -> Result<()> {
    let world = Intersection::default();
    let rules = DrivingRules::default();
    let mut events = EventLog::new();
    let mut car = car_on(&world, Approach::North, 0.1);

    car.update(10.0, 10.0, &world, None, &rules, &mut events);

    assert_eq!(car.state, CarState::Traveling);
    assert!(car.t > 0.1);
    Ok(())
}

/// Wait reports arrive every 500ms and the critical wait fires once per episode
#[test]
fn test_wait_reporting_and_critical_once() -> Result<()> {
    let mut world = Intersection::default();
    let rules = DrivingRules::default();
    let mut events = EventLog::new();
    let mut car = car_on(&world, Approach::North, 250.0 / 600.0);

    let now = drive(&mut car, &world, &rules, &mut events, 400, 100.0, 0.0);
    assert_eq!(car.wait_time, 40_000.0);
    assert_eq!(events.critical_waits(car.id), 1, "critical wait must fire exactly once");

    let reports = events.wait_reports(car.id);
    assert_eq!(reports.first().copied(), Some(500.0));
    assert!(reports.windows(2).all(|w| w[1] - w[0] >= 500.0), "reports closer than 500ms");
    assert!(events.events.iter().any(|e| matches!(e, TrafficEvent::CriticalWait(_, ms) if *ms == 30_000.0)));

    // Green releases the car and ends the episode
    world.toggle_light(Approach::North);
    car.update(100.0, now + 100.0, &world, None, &rules, &mut events);
    assert_eq!(car.wait_time, 0.0);
    assert!(events.events.contains(&TrafficEvent::WaitCleared(car.id)));

    // A fresh hold at yellow starts a new episode that can go critical again
    world.toggle_light(Approach::North);
    drive(&mut car, &world, &rules, &mut events, 300, 100.0, now + 100.0);
    assert!(car.is_stopped());
    assert_eq!(events.critical_waits(car.id), 2);

    println!("✓ {} wait reports recorded", events.wait_reports(car.id).len());
    Ok(())
}

/// A stopped leader inside the following gap queues the car
#[test]
fn test_queues_behind_stopped_leader() -> Result<()> {
    let world = Intersection::default();
    let rules = DrivingRules::default();
    let mut events = EventLog::new();
    let mut car = car_on(&world, Approach::East, 0.1);

    let leader = Leader { gap: 20.0, speed: 0.0 };
    car.update(10.0, 10.0, &world, Some(leader), &rules, &mut events);

    assert_eq!(car.state, CarState::StoppedAtLight);
    assert_eq!(car.t, 0.1);
    Ok(())
}

/// A moving leader inside the gap caps the follower's speed
#[test]
fn test_follows_slower_leader() -> Result<()> {
    let world = Intersection::default();
    let rules = DrivingRules::default();
    let mut events = EventLog::new();
    let mut car = car_on(&world, Approach::East, 0.1);

    let leader = Leader { gap: 20.0, speed: 0.04 };
    car.update(10.0, 10.0, &world, Some(leader), &rules, &mut events);
    assert_eq!(car.state, CarState::Traveling);
    assert!((car.current_speed - 0.04).abs() < 1e-6);

    let distant = Leader { gap: 200.0, speed: 0.0 };
    car.update(10.0, 20.0, &world, Some(distant), &rules, &mut events);
    assert_eq!(car.state, CarState::Traveling);
    assert!(car.current_speed > 0.04);
    Ok(())
}

/// Cars without a path and wrecks do not move
#[test]
fn test_inert_cars() -> Result<()> {
    let world = Intersection::default();
    let rules = DrivingRules::default();
    let mut events = EventLog::new();

    let mut unrouted = Car::placeholder();
    let before = unrouted.position;
    unrouted.update(10.0, 10.0, &world, None, &rules, &mut events);
    assert_eq!(unrouted.position, before);
    assert_eq!(unrouted.t, 0.0);

    let mut wreck = car_on(&world, Approach::East, 0.3);
    wreck.mark_collided();
    wreck.update(10.0, 10.0, &world, None, &rules, &mut events);
    wreck.update(10.0, 20.0, &world, None, &rules, &mut events);
    assert_eq!(wreck.t, 0.3);
    assert_eq!(wreck.collided_for, 20.0);
    assert!(events.events.is_empty());
    Ok(())
}

/// Reusing a car clears every trace of its previous trip
#[test]
fn test_reset_for_reuse() {
    let world = Intersection::default();
    let mut car = car_on(&world, Approach::East, 0.7);
    car.mark_collided();
    car.wait_time = 1234.0;

    car.reset(CarId(9), Approach::West, world.paths().get(Approach::West, TurnIntent::Straight).expect("lane").start, 0.08);

    assert_eq!(car.id, CarId(9));
    assert_eq!(car.state, CarState::Traveling);
    assert!(car.path.is_none());
    assert_eq!(car.t, 0.0);
    assert_eq!(car.wait_time, 0.0);
    assert_eq!(car.current_speed, 0.08);
}

/// Giving way holds the car like a red light, but only inside the stop-line window
#[test]
fn test_giving_way_holds_at_stop_line_only() -> Result<()> {
    let mut world = Intersection::default();
    world.toggle_light(Approach::North);
    let rules = DrivingRules::default();
    let mut events = EventLog::new();

    let mut waiting = car_on(&world, Approach::North, 240.0 / 600.0);
    waiting.giving_way = true;
    waiting.update(10.0, 10.0, &world, None, &rules, &mut events);
    assert_eq!(waiting.state, CarState::StoppedAtLight);

    let mut far = car_on(&world, Approach::North, 0.1);
    far.giving_way = true;
    far.update(10.0, 10.0, &world, None, &rules, &mut events);
    assert_eq!(far.state, CarState::Traveling);
    assert!(far.t > 0.1);

    waiting.giving_way = false;
    waiting.update(10.0, 20.0, &world, None, &rules, &mut events);
    assert_eq!(waiting.state, CarState::Traveling);
    Ok(())
}
