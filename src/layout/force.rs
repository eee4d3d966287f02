//! One step of the 3D force simulation.
//!
//! Each step runs in four passes over the store:
//!
//! 1. Rebuild the spatial hash grid from current positions.
//! 2. Per node: repulsion from grid neighbors plus gravity toward the origin,
//!    folded into velocity as `v = (v + F·dt) · damping`.
//! 3. Per edge: a Hookean spring impulse split evenly between the endpoints.
//! 4. Integrate `p += v`, or clamp fixed nodes to their pin coordinates.
//!
//! Positions are read-only until pass 4, so the order nodes are visited in
//! does not change the result.

use tracing::trace;

use super::params::SimParams;
use crate::graph::GraphStore;
use crate::spatial::SpatialHashGrid;

/// Added to squared distances so coincident nodes do not produce infinities.
pub const SOFTENING: f64 = 1e-3;

/// Force solver with a reusable spatial grid.
pub struct ForceSolver {
    grid: SpatialHashGrid,
}

impl ForceSolver {
    pub fn new() -> Self {
        Self {
            grid: SpatialHashGrid::default(),
        }
    }

    /// The grid built by the most recent step.
    pub fn grid(&self) -> &SpatialHashGrid {
        &self.grid
    }

    /// Advance the simulation by one step.
    pub fn step(&mut self, store: &mut GraphStore, params: &SimParams) {
        if store.is_empty() {
            return;
        }

        self.grid
            .rebuild(&store.pos_x, &store.pos_y, &store.pos_z, params.cell_size);
        trace!(
            cell_size = self.grid.cell_size(),
            cells = self.grid.occupied_cells(),
            "spatial grid rebuilt"
        );
        self.apply_node_forces(store, params);
        Self::apply_springs(store, params);
        Self::integrate(store);
    }

    /// Repulsion and gravity, folded into velocity.
    fn apply_node_forces(&self, store: &mut GraphStore, params: &SimParams) {
        let (px, py, pz) = (&store.pos_x, &store.pos_y, &store.pos_z);

        for i in 0..px.len() {
            if store.states[i].is_fixed() {
                continue;
            }

            let (xi, yi, zi) = (px[i], py[i], pz[i]);
            let (mut fx, mut fy, mut fz) = (0.0, 0.0, 0.0);

            self.grid.for_each_neighbor(i, |j| {
                if j == i {
                    return;
                }
                // Points from i toward j; negative repulsion pushes i away.
                let dx = px[j] - xi;
                let dy = py[j] - yi;
                let dz = pz[j] - zi;
                let dist_sq = dx * dx + dy * dy + dz * dz + SOFTENING;
                // Direction is normalized by the softened distance too, so
                // coincident nodes get a zero vector instead of NaN.
                let inv_dist = 1.0 / dist_sq.sqrt();
                let force = params.repulsion / dist_sq;

                fx += force * dx * inv_dist;
                fy += force * dy * inv_dist;
                fz += force * dz * inv_dist;
            });

            fx -= xi * params.gravity;
            fy -= yi * params.gravity;
            fz -= zi * params.gravity;

            store.vel_x[i] = (store.vel_x[i] + fx * params.time_step) * params.damping;
            store.vel_y[i] = (store.vel_y[i] + fy * params.time_step) * params.damping;
            store.vel_z[i] = (store.vel_z[i] + fz * params.time_step) * params.damping;
        }
    }

    /// Spring impulses along every edge, half to each endpoint.
    fn apply_springs(store: &mut GraphStore, params: &SimParams) {
        for k in 0..store.edge_count() {
            let Some(edge) = store.edge(k) else {
                break;
            };
            let (a, b) = (edge.a, edge.b);

            let dx = store.pos_x[b] - store.pos_x[a];
            let dy = store.pos_y[b] - store.pos_y[a];
            let dz = store.pos_z[b] - store.pos_z[a];
            let dist = (dx * dx + dy * dy + dz * dz).sqrt();
            if dist == 0.0 {
                // No direction to pull along.
                continue;
            }

            let extension = dist - params.rest_length;
            let half = 0.5 * params.spring_k * extension * edge.weight / dist;
            let (ix, iy, iz) = (dx * half, dy * half, dz * half);

            if !store.states[a].is_fixed() {
                store.vel_x[a] += ix;
                store.vel_y[a] += iy;
                store.vel_z[a] += iz;
            }
            if !store.states[b].is_fixed() {
                store.vel_x[b] -= ix;
                store.vel_y[b] -= iy;
                store.vel_z[b] -= iz;
            }
        }
    }

    fn integrate(store: &mut GraphStore) {
        for i in 0..store.pos_x.len() {
            if store.states[i].is_fixed() {
                if let Some([x, y, z]) = store.fixed_at[i] {
                    store.pos_x[i] = x;
                    store.pos_y[i] = y;
                    store.pos_z[i] = z;
                }
                continue;
            }

            store.pos_x[i] += store.vel_x[i];
            store.pos_y[i] += store.vel_y[i];
            store.pos_z[i] += store.vel_z[i];
        }
    }
}

impl Default for ForceSolver {
    fn default() -> Self {
        Self::new()
    }
}
