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

use super::{CancelToken, IntegratorKind, PropOpts, PropagationError, Propagator};
use crate::cosmic::{BodyRegistry, SatelliteState, SoiTransition, DEFAULT_SOI_HYSTERESIS};
use crate::dynamics::{OrbitalDynamics, Perturbations};
use crate::md::Trajectory;
use crate::time::{Duration, Unit};
use rayon::prelude::*;
use std::sync::Arc;
use typed_builder::TypedBuilder;

/// Everything needed to propagate one satellite. Each request carries its own registry snapshot, so that
/// requests can run concurrently without sharing any mutable state.
#[derive(Clone, Debug, TypedBuilder)]
#[builder(doc)]
pub struct PropagationRequest {
    pub initial_state: SatelliteState,
    pub registry: Arc<BodyRegistry>,
    pub duration: Duration,
    #[builder(default_code = "60.0 * Unit::Second")]
    pub step: Duration,
    #[builder(default)]
    pub integrator: IntegratorKind,
    #[builder(default)]
    pub perturbations: Perturbations,
    /// Replaces the dynamics built from the perturbation flags, e.g. to add a custom acceleration model
    #[builder(default, setter(strip_option))]
    pub dynamics: Option<OrbitalDynamics>,
    #[builder(default = true)]
    pub soi_switching: bool,
    #[builder(default = DEFAULT_SOI_HYSTERESIS)]
    pub soi_hysteresis: f64,
    #[builder(default = 100)]
    pub cancel_check_interval: usize,
    #[builder(default, setter(strip_option))]
    pub cancel: Option<CancelToken>,
}

impl PropagationRequest {
    /// The propagator described by this request.
    pub fn propagator(&self) -> Propagator {
        let dynamics = match &self.dynamics {
            Some(dynamics) => dynamics.clone(),
            None => OrbitalDynamics::from_perturbations(&self.perturbations),
        };
        let opts = PropOpts {
            step: self.step,
            soi_switching: self.soi_switching,
            soi_hysteresis: self.soi_hysteresis,
            cancel_check_interval: self.cancel_check_interval,
            cancel: self.cancel.clone(),
            ..Default::default()
        };
        Propagator::new(dynamics, self.integrator, opts)
    }
}

/// Result of a propagation which ran to completion or was cancelled.
#[derive(Clone, Debug)]
pub struct PropagationOutcome {
    /// All samples, starting with the initial state
    pub trajectory: Trajectory,
    pub final_state: SatelliteState,
    pub transitions: Vec<SoiTransition>,
    /// Cancellation is not an error: the trajectory holds the samples computed until then.
    pub cancelled: bool,
}

/// Propagates a single request, synchronously.
pub fn propagate(request: &PropagationRequest) -> Result<PropagationOutcome, PropagationError> {
    let prop = request.propagator();
    debug!(
        "{} propagation of {} with {} for {}",
        prop.kind, request.initial_state, prop.dynamics, request.duration
    );
    let mut instance = prop.with(request.initial_state, &request.registry);
    let (final_state, trajectory) = instance.for_duration_with_traj(request.duration)?;
    Ok(PropagationOutcome {
        trajectory,
        final_state,
        transitions: instance.transitions,
        cancelled: instance.cancelled,
    })
}

/// Propagates independent requests in parallel, one per worker. The results are in the order of the requests.
pub fn propagate_many(
    requests: &[PropagationRequest],
) -> Vec<Result<PropagationOutcome, PropagationError>> {
    info!("Propagating {} requests in parallel", requests.len());
    requests.par_iter().map(propagate).collect()
}
