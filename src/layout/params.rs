//! Solver constants.
//!
//! `SimParams` is supplied (partially) by the host in `INIT`; any field left
//! out takes its default. Values are fixed for the rest of the run.

use serde::{Deserialize, Serialize};

/// Configuration for the force simulation and tick emission.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimParams {
    /// Inverse-square magnitude between nearby nodes (default: -2000.0).
    /// Negative values push nodes apart.
    pub repulsion: f64,
    /// Spring constant along edges (default: 0.015).
    pub spring_k: f64,
    /// Spring rest length (default: 60.0).
    pub rest_length: f64,
    /// Pull toward the origin per unit of distance (default: 0.02).
    pub gravity: f64,
    /// Velocity multiplier applied every step (default: 0.85).
    pub damping: f64,
    /// Time step folded into velocity (default: 0.02).
    pub time_step: f64,
    /// Spatial grid cell edge length (default: 120.0).
    pub cell_size: f64,
    /// Maximum ticks per second (default: 30.0).
    pub emission_rate: f64,
    /// Seed for initial placement. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl SimParams {
    /// Largest damping accepted; anything at or above 1 never settles.
    pub const MAX_DAMPING: f64 = 0.999;

    /// Repair values that would break the engine outright.
    ///
    /// Non-finite fields fall back to their defaults, damping is clamped to
    /// `[0, MAX_DAMPING]`, and cell size, time step and emission rate must be
    /// positive. Large but finite forces are left alone.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let finite_or = |value: f64, fallback: f64| if value.is_finite() { value } else { fallback };
        let positive_or = |value: f64, fallback: f64| {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                fallback
            }
        };

        Self {
            repulsion: finite_or(self.repulsion, defaults.repulsion),
            spring_k: finite_or(self.spring_k, defaults.spring_k),
            rest_length: finite_or(self.rest_length, defaults.rest_length),
            gravity: finite_or(self.gravity, defaults.gravity),
            damping: finite_or(self.damping, defaults.damping).clamp(0.0, Self::MAX_DAMPING),
            time_step: positive_or(self.time_step, defaults.time_step),
            cell_size: positive_or(self.cell_size, defaults.cell_size),
            emission_rate: positive_or(self.emission_rate, defaults.emission_rate),
            seed: self.seed,
        }
    }

    /// Minimum wall-clock spacing between ticks.
    ///
    /// Rates too small to represent saturate to `Duration::MAX`.
    pub fn emission_interval(&self) -> std::time::Duration {
        std::time::Duration::try_from_secs_f64(1.0 / self.emission_rate)
            .unwrap_or(std::time::Duration::MAX)
    }
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            repulsion: -2000.0,
            spring_k: 0.015,
            rest_length: 60.0,
            gravity: 0.02,
            damping: 0.85,
            time_step: 0.02,
            cell_size: 120.0,
            emission_rate: 30.0,
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_partial_params_fill_defaults() {
        let params: SimParams =
            serde_json::from_str(r#"{"springK":0.5,"restLength":5,"seed":9}"#).unwrap();

        assert_eq!(params.spring_k, 0.5);
        assert_eq!(params.rest_length, 5.0);
        assert_eq!(params.seed, Some(9));
        assert_eq!(params.damping, SimParams::default().damping);
        assert_eq!(params.cell_size, SimParams::default().cell_size);
    }

    #[test]
    fn test_empty_object_is_default() {
        let params: SimParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params, SimParams::default());
    }

    #[test]
    fn test_sanitized_repairs_invalid_values() {
        let params = SimParams {
            damping: 1.5,
            cell_size: 0.0,
            emission_rate: -1.0,
            time_step: f64::NAN,
            gravity: f64::INFINITY,
            ..SimParams::default()
        }
        .sanitized();

        let defaults = SimParams::default();
        assert_eq!(params.damping, SimParams::MAX_DAMPING);
        assert_eq!(params.cell_size, defaults.cell_size);
        assert_eq!(params.emission_rate, defaults.emission_rate);
        assert_eq!(params.time_step, defaults.time_step);
        assert_eq!(params.gravity, defaults.gravity);
    }

    #[test]
    fn test_sanitized_keeps_valid_values() {
        let params = SimParams {
            repulsion: -1e6,
            damping: 0.0,
            ..SimParams::default()
        };
        assert_eq!(params.sanitized(), params);
    }

    #[test]
    fn test_emission_interval() {
        let params = SimParams {
            emission_rate: 4.0,
            ..SimParams::default()
        };
        assert_eq!(params.emission_interval(), Duration::from_millis(250));

        let glacial = SimParams {
            emission_rate: 1e-300,
            ..SimParams::default()
        };
        assert_eq!(glacial.emission_interval(), Duration::MAX);
    }
}
