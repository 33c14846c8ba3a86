use super::{Car, CarId, Point, SoundCue, TrafficEvents};

pub const CRASH_VOLUME: f32 = 0.7;

/// Axis-aligned extents of a set of points: (min, max).
fn extents(points: &[Point; 4]) -> (Point, Point) {
    let mut min = points[0];
    let mut max = points[0];
    for p in &points[1..] {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    (min, max)
}

/// Overlap test between two cars.
///
/// Cars further apart than 1.5x the larger body on either axis are rejected
/// outright. Otherwise the rotated corners of each body are reduced to their
/// axis-aligned extents and those boxes are tested for overlap. This is an
/// approximation of a separating-axis test and over-reports diagonal pairs.
pub fn check_collision(a: &Car, b: &Car) -> bool {
    let dx = (a.position.x - b.position.x).abs();
    let dy = (a.position.y - b.position.y).abs();
    let reach_x = a.width.max(b.width) * 1.5;
    let reach_y = a.height.max(b.height) * 1.5;
    if dx > reach_x || dy > reach_y {
        return false;
    }

    let (a_min, a_max) = extents(&a.corners());
    let (b_min, b_max) = extents(&b.corners());

    !(a_max.x < b_min.x || a_min.x > b_max.x || a_max.y < b_min.y || a_min.y > b_max.y)
}

/// Pairwise scan over every live car. Both participants of a hit are marked
/// collided immediately, so later pairs in the same pass skip them.
pub fn collision_pass<E: TrafficEvents + ?Sized>(cars: &mut [Car], events: &mut E) -> Vec<(CarId, CarId)> {
    let mut hits = Vec::new();

    for i in 0..cars.len() {
        if !is_live(&cars[i]) {
            continue;
        }

        for j in (i + 1)..cars.len() {
            if !is_live(&cars[j]) {
                continue;
            }

            if check_collision(&cars[i], &cars[j]) {
                cars[i].mark_collided();
                cars[j].mark_collided();

                let pair = (cars[i].id, cars[j].id);
                log::debug!("Cars {} and {} collided", pair.0, pair.1);
                events.on_accident(pair.0, pair.1);
                events.play_sound(SoundCue::CarCrash, CRASH_VOLUME);
                hits.push(pair);
                break;
            }
        }
    }

    hits
}

fn is_live(car: &Car) -> bool {
    car.path.is_some() && !car.state.is_terminal()
}
