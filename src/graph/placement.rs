//! Initial placement for nodes without supplied coordinates.
//!
//! New nodes are scattered uniformly over a sphere so a first layout does not
//! start with every node stacked at the origin.

use std::f64::consts::PI;

use rand::Rng;

/// Radius of the seeding sphere.
pub const SEED_RADIUS: f64 = 420.0;

/// Uniform random point on the surface of a sphere centered at the origin.
///
/// Inverse transform sampling: `θ = 2πu`, `φ = acos(2v − 1)` with
/// `u, v ~ U(0, 1)`.
pub fn random_on_sphere<R: Rng + ?Sized>(rng: &mut R, radius: f64) -> [f64; 3] {
    let u: f64 = rng.gen_range(0.0..1.0);
    let v: f64 = rng.gen_range(0.0..1.0);
    let theta = 2.0 * PI * u;
    let phi = (2.0 * v - 1.0).acos();

    [
        radius * phi.sin() * theta.cos(),
        radius * phi.sin() * theta.sin(),
        radius * phi.cos(),
    ]
}
