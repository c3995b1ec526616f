/*
    orrery, satellite trajectory propagation
    Copyright (C) 2018-onwards Christopher Rabotin <christopher.rabotin@gmail.com>

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.

    This program is distributed in the hope that it will be useful,
    but WITHOUT ANY WARRANTY; without even the implied warranty of
    MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
    GNU Affero General Public License for more details.

    You should have received a copy of the GNU Affero General Public License
    along with this program.  If not, see <https://www.gnu.org/licenses/>.
*/

use super::{IntegratorKind, PropInstance, PropOpts, Stepper};
use crate::cosmic::{BodyRegistry, SatelliteState};
use crate::dynamics::OrbitalDynamics;
use crate::time::Duration;

/// A Propagator allows propagating orbital dynamics forward or backward in time with a fixed step integrator.
/// It includes the dynamics, the options and the integration scheme; the registry is provided per instance.
#[derive(Clone, Debug)]
pub struct Propagator {
    /// Stores the dynamics used. *Must* use this to get the latest values
    pub dynamics: OrbitalDynamics,
    pub opts: PropOpts,
    pub kind: IntegratorKind,
}

impl Propagator {
    /// Each propagator must be initialized with `new` which stores propagator information.
    pub fn new(dynamics: OrbitalDynamics, kind: IntegratorKind, opts: PropOpts) -> Self {
        Self {
            dynamics,
            opts,
            kind,
        }
    }

    /// The classical RK4 with the provided options.
    pub fn rk4(dynamics: OrbitalDynamics, opts: PropOpts) -> Self {
        Self::new(dynamics, IntegratorKind::Rk4, opts)
    }

    /// A Verner 6(5) for long and precise propagations.
    pub fn verner56(dynamics: OrbitalDynamics, opts: PropOpts) -> Self {
        Self::new(dynamics, IntegratorKind::Verner56, opts)
    }

    /// A symplectic leapfrog, whose energy error stays bounded over many orbits.
    pub fn leapfrog(dynamics: OrbitalDynamics, opts: PropOpts) -> Self {
        Self::new(dynamics, IntegratorKind::Leapfrog, opts)
    }

    /// A Hermite predictor-corrector using the jerk of the dynamics.
    pub fn hermite(dynamics: OrbitalDynamics, opts: PropOpts) -> Self {
        Self::new(dynamics, IntegratorKind::Hermite, opts)
    }

    /// Default propagator is an RK4 with the default PropOpts.
    pub fn default(dynamics: OrbitalDynamics) -> Self {
        Self::rk4(dynamics, PropOpts::default())
    }

    /// Set the fixed step of the propagator
    pub fn set_step(&mut self, step: Duration) {
        self.opts.step = step;
    }

    /// Starts a propagation of `state` against a registry snapshot, which stays borrowed (and therefore
    /// immutable) for the whole life of the instance.
    pub fn with<'a>(&'a self, state: SatelliteState, registry: &'a BodyRegistry) -> PropInstance<'a> {
        PropInstance {
            state,
            prop: self,
            registry,
            transitions: Vec::new(),
            cancelled: false,
            stepper: Stepper::new(self.kind),
            step_size: self.opts.step,
            steps_taken: 0,
        }
    }
}
