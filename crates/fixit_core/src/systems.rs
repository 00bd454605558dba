//! Simulation systems.
//!
//! Systems contain the math that the simulation loop applies to its
//! records. They are pure functions over plain values so each can be
//! tested in isolation.

use crate::components::CharacterId;
use crate::math::{Fixed, Vec3Fixed};

/// Move from `from` toward `to` by at most `max_step`.
///
/// Lands exactly on `to` instead of overshooting it.
#[must_use]
pub fn step_toward(from: Vec3Fixed, to: Vec3Fixed, max_step: Fixed) -> Vec3Fixed {
    let delta = to - from;
    let dist = delta.length();
    if dist <= max_step {
        to
    } else {
        from + delta.normalize().scale(max_step)
    }
}

/// The point in `points` closest to `from`.
///
/// Ties go to the earliest point in the slice.
#[must_use]
pub fn nearest_point(points: &[Vec3Fixed], from: Vec3Fixed) -> Option<Vec3Fixed> {
    let mut best: Option<(Vec3Fixed, Fixed)> = None;
    for &point in points {
        let dist_sq = point.distance_squared(from);
        if best.map_or(true, |(_, best_sq)| dist_sq < best_sq) {
            best = Some((point, dist_sq));
        }
    }
    best.map(|(point, _)| point)
}

/// Computes separation displacements for crowded characters.
///
/// Every character sums `own - other` over all neighbours closer than
/// `radius`, normalizes the sum and moves `step` along it. All vectors are
/// taken from the `positions` snapshot, so the result does not depend on
/// processing order. Exactly coincident pairs are split along the X axis,
/// lower ID toward -X.
///
/// `anchored` characters push others but are never displaced themselves.
///
/// Returns `(id, new_position)` for every character that moved.
#[must_use]
pub fn separation_system(
    positions: &[(CharacterId, Vec3Fixed)],
    anchored: &[CharacterId],
    radius: Fixed,
    step: Fixed,
) -> Vec<(CharacterId, Vec3Fixed)> {
    if radius <= Fixed::ZERO || step <= Fixed::ZERO {
        return Vec::new();
    }
    let radius_sq = radius * radius;
    let unit_x = Vec3Fixed::new(Fixed::from_num(1), Fixed::ZERO, Fixed::ZERO);

    let mut moved = Vec::new();
    for &(id, position) in positions {
        if anchored.contains(&id) {
            continue;
        }

        let mut repulsion = Vec3Fixed::ZERO;
        for &(other_id, other_position) in positions {
            if other_id == id {
                continue;
            }

            let diff = position - other_position;
            let dist_sq = diff.dot(diff);
            if dist_sq >= radius_sq {
                continue;
            }

            if dist_sq == Fixed::ZERO {
                repulsion += if id < other_id {
                    Vec3Fixed::ZERO - unit_x
                } else {
                    unit_x
                };
            } else {
                repulsion += diff;
            }
        }

        let direction = repulsion.normalize();
        if !direction.is_zero() {
            moved.push((id, position + direction.scale(step)));
        }
    }
    moved
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fx(n: f64) -> Fixed {
        Fixed::from_num(n)
    }

    fn p(x: f64, z: f64) -> Vec3Fixed {
        Vec3Fixed::ground(fx(x), fx(z))
    }

    #[test]
    fn step_moves_by_max_step() {
        let next = step_toward(p(0.0, 0.0), p(10.0, 0.0), fx(2.0));
        assert_eq!(next, p(2.0, 0.0));
    }

    #[test]
    fn step_does_not_overshoot() {
        let next = step_toward(p(0.0, 0.0), p(0.5, 0.0), fx(2.0));
        assert_eq!(next, p(0.5, 0.0));
    }

    #[test]
    fn nearest_point_prefers_first_on_tie() {
        let points = [p(-2.0, 0.0), p(2.0, 0.0), p(0.0, 5.0)];
        assert_eq!(nearest_point(&points, p(0.0, 0.0)), Some(p(-2.0, 0.0)));
        assert_eq!(nearest_point(&points, p(1.0, 0.0)), Some(p(2.0, 0.0)));
        assert_eq!(nearest_point(&[], p(1.0, 0.0)), None);
    }

    #[test]
    fn separation_pushes_pairs_apart_symmetrically() {
        let a = CharacterId(1);
        let b = CharacterId(2);
        let moved = separation_system(
            &[(a, p(0.0, 0.0)), (b, p(0.5, 0.0))],
            &[],
            fx(1.0),
            fx(0.25),
        );
        assert_eq!(moved, vec![(a, p(-0.25, 0.0)), (b, p(0.75, 0.0))]);
    }

    #[test]
    fn separation_ignores_distant_characters() {
        let moved = separation_system(
            &[(CharacterId(1), p(0.0, 0.0)), (CharacterId(2), p(3.0, 0.0))],
            &[],
            fx(1.0),
            fx(0.25),
        );
        assert!(moved.is_empty());
    }

    #[test]
    fn separation_splits_coincident_characters() {
        let moved = separation_system(
            &[(CharacterId(1), p(1.0, 1.0)), (CharacterId(2), p(1.0, 1.0))],
            &[],
            fx(1.0),
            fx(0.5),
        );
        assert_eq!(
            moved,
            vec![(CharacterId(1), p(0.5, 1.0)), (CharacterId(2), p(1.5, 1.0))]
        );
    }

    #[test]
    fn separation_is_order_independent() {
        let forward = [
            (CharacterId(1), p(0.0, 0.0)),
            (CharacterId(2), p(0.3, 0.1)),
            (CharacterId(3), p(-0.2, 0.4)),
        ];
        let mut reversed = forward;
        reversed.reverse();

        let mut a = separation_system(&forward, &[], fx(1.0), fx(0.1));
        let mut b = separation_system(&reversed, &[], fx(1.0), fx(0.1));
        a.sort_by_key(|(id, _)| *id);
        b.sort_by_key(|(id, _)| *id);
        assert_eq!(a, b);
    }

    #[test]
    fn anchored_characters_stay_put() {
        let moved = separation_system(
            &[(CharacterId(1), p(0.0, 0.0)), (CharacterId(2), p(0.5, 0.0))],
            &[CharacterId(1)],
            fx(1.0),
            fx(0.25),
        );
        assert_eq!(moved, vec![(CharacterId(2), p(0.75, 0.0))]);
    }
}
