//! Inverse-square attraction toward the fixed centre
//!
//! The floor is applied to `r` only, never to `r²`: the magnitude is
//! `G·M / r²` from the raw squared distance while the unit vector divides by
//! `max(r, min_radius)`. Inside the floor the returned vector is therefore
//! shorter than `G·M / r²` would suggest but still points at the centre.

use cgmath::{Vector2, Zero};

use super::params::SimulationParams;

/// Acceleration at `position` due to the central mass
pub fn gravity(position: Vector2<f32>, params: &SimulationParams) -> Vector2<f32> {
    let d = position - params.center;
    let r2 = d.x * d.x + d.y * d.y;
    if r2 == 0.0 {
        // Exactly on the centre there is no direction to pull in
        return Vector2::zero();
    }

    // Normalise before dividing by r²: a subnormal r² would overflow G·M / r²
    let r = r2.sqrt().max(params.min_radius);
    let a = Vector2::new(-(params.gm() * (d.x / r)) / r2, -(params.gm() * (d.y / r)) / r2);
    if a.x.is_finite() && a.y.is_finite() {
        a
    } else {
        Vector2::zero()
    }
}
