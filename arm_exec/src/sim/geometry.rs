//! Primitive shapes and intersection tests for the simulated scene

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Segments shorter than this, or slabs thinner than this, are treated as
/// degenerate.
const EPSILON: f64 = 1e-12;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The collision shape of a body, centred on the body's position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Shape {
    Sphere {
        /// Units: meters
        radius_m: f64,
    },

    /// An axis aligned box.
    Box {
        /// Units: meters
        half_extents_m: [f64; 3],
    },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Shape {
    /// Returns true if all dimensions of the shape are positive and finite.
    pub fn is_valid(&self) -> bool {
        let ok = |v: f64| v.is_finite() && v > 0.0;

        match self {
            Shape::Sphere { radius_m } => ok(*radius_m),
            Shape::Box { half_extents_m } => half_extents_m.iter().all(|h| ok(*h)),
        }
    }

    /// Does the segment `a_m` to `b_m` pass through the shape placed at
    /// `centre_m`?
    pub fn intersects_segment(
        &self,
        centre_m: &Vector3<f64>,
        a_m: &Vector3<f64>,
        b_m: &Vector3<f64>,
    ) -> bool {
        self.intersects_capsule(centre_m, a_m, b_m, 0.0)
    }

    /// Does the sphere overlap the shape placed at `centre_m`?
    pub fn intersects_sphere(
        &self,
        centre_m: &Vector3<f64>,
        sphere_centre_m: &Vector3<f64>,
        sphere_radius_m: f64,
    ) -> bool {
        match self {
            Shape::Sphere { radius_m } => {
                (sphere_centre_m - centre_m).norm() <= radius_m + sphere_radius_m
            }
            Shape::Box { half_extents_m } => {
                let (min, max) = box_bounds(centre_m, half_extents_m, 0.0);
                let closest = closest_point_in_aabb(sphere_centre_m, &min, &max);
                (sphere_centre_m - closest).norm() <= sphere_radius_m
            }
        }
    }

    /// Does the capsule overlap the shape placed at `centre_m`?
    ///
    /// Boxes are tested against the capsule's segment with the box grown by
    /// the capsule radius, which treats the rounded corners of the swept
    /// volume as square.
    pub fn intersects_capsule(
        &self,
        centre_m: &Vector3<f64>,
        a_m: &Vector3<f64>,
        b_m: &Vector3<f64>,
        capsule_radius_m: f64,
    ) -> bool {
        match self {
            Shape::Sphere { radius_m } => {
                let closest = closest_point_on_segment(centre_m, a_m, b_m);
                (centre_m - closest).norm() <= radius_m + capsule_radius_m
            }
            Shape::Box { half_extents_m } => {
                let (min, max) = box_bounds(centre_m, half_extents_m, capsule_radius_m);
                segment_hits_aabb(a_m, b_m, &min, &max)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the point on the segment `a` to `b` closest to `p`.
pub fn closest_point_on_segment(
    p: &Vector3<f64>,
    a: &Vector3<f64>,
    b: &Vector3<f64>,
) -> Vector3<f64> {
    let ab = b - a;
    let len_sq = ab.norm_squared();

    if len_sq <= EPSILON {
        return *a;
    }

    let t = ((p - a).dot(&ab) / len_sq).max(0.0).min(1.0);
    a + ab * t
}

/// Get the point within the box `[min, max]` closest to `p`.
pub fn closest_point_in_aabb(
    p: &Vector3<f64>,
    min: &Vector3<f64>,
    max: &Vector3<f64>,
) -> Vector3<f64> {
    Vector3::new(
        p.x.max(min.x).min(max.x),
        p.y.max(min.y).min(max.y),
        p.z.max(min.z).min(max.z),
    )
}

/// Slab test of the segment `a` to `b` against the box `[min, max]`.
pub fn segment_hits_aabb(
    a: &Vector3<f64>,
    b: &Vector3<f64>,
    min: &Vector3<f64>,
    max: &Vector3<f64>,
) -> bool {
    let d = b - a;
    let mut t_enter = 0.0f64;
    let mut t_exit = 1.0f64;

    for i in 0..3 {
        if d[i].abs() < EPSILON {
            // Parallel to this slab, must start inside it
            if a[i] < min[i] || a[i] > max[i] {
                return false;
            }
            continue;
        }

        let mut t0 = (min[i] - a[i]) / d[i];
        let mut t1 = (max[i] - a[i]) / d[i];
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }

        t_enter = t_enter.max(t0);
        t_exit = t_exit.min(t1);

        if t_enter > t_exit {
            return false;
        }
    }

    true
}

fn box_bounds(
    centre_m: &Vector3<f64>,
    half_extents_m: &[f64; 3],
    grow_m: f64,
) -> (Vector3<f64>, Vector3<f64>) {
    let half = Vector3::from(*half_extents_m).add_scalar(grow_m);
    (centre_m - half, centre_m + half)
}

#[cfg(test)]
mod test {
    use super::*;

    fn v(x: f64, y: f64, z: f64) -> Vector3<f64> {
        Vector3::new(x, y, z)
    }

    #[test]
    fn test_closest_point_on_segment() {
        let a = v(0.0, 0.0, 0.0);
        let b = v(0.0, 0.0, 2.0);

        assert_eq!(closest_point_on_segment(&v(1.0, 0.0, 1.0), &a, &b), v(0.0, 0.0, 1.0));
        assert_eq!(closest_point_on_segment(&v(0.0, 0.0, -3.0), &a, &b), a);
        assert_eq!(closest_point_on_segment(&v(0.0, 1.0, 9.0), &a, &b), b);

        // Degenerate segment
        assert_eq!(closest_point_on_segment(&v(1.0, 1.0, 1.0), &a, &a), a);
    }

    #[test]
    fn test_segment_vs_box() {
        let wall = Shape::Box {
            half_extents_m: [1.0, 1.0, 0.1],
        };
        let c = v(0.0, 1.0, 2.0);

        // Straight through the wall
        assert!(wall.intersects_segment(&c, &v(0.0, 1.0, 0.0), &v(0.0, 1.0, 4.0)));

        // Stops short of it
        assert!(!wall.intersects_segment(&c, &v(0.0, 1.0, 0.0), &v(0.0, 1.0, 1.5)));

        // Passes over the top
        assert!(!wall.intersects_segment(&c, &v(0.0, 2.5, 0.0), &v(0.0, 2.5, 4.0)));

        // Parallel to the wall's face but inside its slab
        assert!(wall.intersects_segment(&c, &v(-2.0, 1.0, 2.0), &v(2.0, 1.0, 2.0)));
    }

    #[test]
    fn test_segment_vs_sphere() {
        let ball = Shape::Sphere { radius_m: 0.5 };
        let c = v(0.0, 0.0, 2.0);

        assert!(ball.intersects_segment(&c, &v(0.4, 0.0, 0.0), &v(0.4, 0.0, 4.0)));
        assert!(!ball.intersects_segment(&c, &v(0.6, 0.0, 0.0), &v(0.6, 0.0, 4.0)));
    }

    #[test]
    fn test_sphere_and_capsule_queries() {
        let ball = Shape::Sphere { radius_m: 0.5 };
        let cube = Shape::Box {
            half_extents_m: [0.5, 0.5, 0.5],
        };
        let c = v(0.0, 0.0, 0.0);

        assert!(ball.intersects_sphere(&c, &v(0.0, 0.7, 0.0), 0.25));
        assert!(!ball.intersects_sphere(&c, &v(0.0, 0.8, 0.0), 0.25));

        // Sphere near a box corner is tested against the true closest point
        assert!(!cube.intersects_sphere(&c, &v(0.7, 0.7, 0.7), 0.3));
        assert!(cube.intersects_sphere(&c, &v(0.7, 0.5, 0.5), 0.3));

        // Capsule alongside the box face
        assert!(cube.intersects_capsule(&c, &v(0.6, -2.0, 0.0), &v(0.6, 2.0, 0.0), 0.15));
        assert!(!cube.intersects_capsule(&c, &v(0.7, -2.0, 0.0), &v(0.7, 2.0, 0.0), 0.15));
        assert!(ball.intersects_capsule(&c, &v(0.6, -2.0, 0.0), &v(0.6, 2.0, 0.0), 0.15));
    }

    #[test]
    fn test_shape_validity() {
        assert!(Shape::Sphere { radius_m: 0.1 }.is_valid());
        assert!(!Shape::Sphere { radius_m: 0.0 }.is_valid());
        assert!(!Shape::Box {
            half_extents_m: [0.1, std::f64::NAN, 0.1]
        }
        .is_valid());
    }
}
