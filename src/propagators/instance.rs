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

use super::{
    BoundDynamics, DynamicsSnafu, NonFiniteStateSnafu, PropConfigSnafu, PropagationError,
    Propagator, Stepper, TrajectorySink,
};
use crate::cosmic::{resolve_state, BodyRegistry, SatelliteState, SoiTransition, TimeTagged};
use crate::errors::DomainError;
use crate::io::{ConfigError, InvalidConfigSnafu};
use crate::md::Trajectory;
use crate::time::{Duration, Epoch, Unit};
use crate::utils::is_finite3;
use snafu::{ensure, ResultExt};
#[cfg(not(target_arch = "wasm32"))]
use std::time::Instant;

/// A propagation in progress: the current state, the propagator setup, and the registry snapshot it runs against.
pub struct PropInstance<'a> {
    /// The state of this propagator instance
    pub state: SatelliteState,
    /// The propagator setup (kind, dynamics, options)
    pub prop: &'a Propagator,
    pub registry: &'a BodyRegistry,
    /// Every change of central body, in chronological order
    pub transitions: Vec<SoiTransition>,
    /// Set when the last call stopped early because the cancellation token was raised
    pub cancelled: bool,
    pub(crate) stepper: Stepper,
    pub(crate) step_size: Duration,
    pub(crate) steps_taken: usize,
}

impl<'a> PropInstance<'a> {
    /// Allows setting the step size of the propagator
    pub fn set_step(&mut self, step_size: Duration) {
        self.step_size = step_size;
    }

    /// Number of integration steps taken so far
    pub fn steps_taken(&self) -> usize {
        self.steps_taken
    }

    /// Configuration problems are reported before the first step.
    fn check_start(&self) -> Result<(), ConfigError> {
        self.prop.opts.validate()?;
        ensure!(
            self.step_size.abs() > Duration::ZERO,
            InvalidConfigSnafu {
                msg: "propagation step must not be zero"
            }
        );
        self.registry.gm(self.state.central)?;
        ensure!(
            is_finite3(&self.state.position_km) && is_finite3(&self.state.velocity_km_s),
            InvalidConfigSnafu {
                msg: format!("initial state is not finite: {}", self.state)
            }
        );
        Ok(())
    }

    fn cancellation_requested(&self) -> bool {
        match &self.prop.opts.cancel {
            Some(token) => {
                self.steps_taken % self.prop.opts.cancel_check_interval == 0
                    && token.is_cancelled()
            }
            None => false,
        }
    }

    fn for_duration_sink_option(
        &mut self,
        duration: Duration,
        mut sink: Option<&mut dyn TrajectorySink>,
    ) -> Result<SatelliteState, PropagationError> {
        self.check_start().context(PropConfigSnafu)?;
        self.cancelled = false;
        self.stepper.reset();

        let batch_size = self.prop.opts.batch_size;
        let mut batch = Vec::with_capacity(if sink.is_some() { batch_size } else { 0 });
        if sink.is_some() {
            batch.push(self.state.sample());
        }

        let stop_time = self.state.epoch() + duration;

        #[cfg(not(target_arch = "wasm32"))]
        let tick = Instant::now();
        let log_progress = duration.abs() >= 2 * Unit::Minute;

        if log_progress {
            info!(
                "Propagating for {} until {} with {}",
                duration, stop_time, self.stepper
            );
        }

        let backprop = duration.is_negative();
        let step = if backprop {
            -self.step_size.abs()
        } else {
            self.step_size.abs()
        };

        let mut outcome = Ok(());
        loop {
            if self.cancellation_requested() {
                info!(
                    "Propagation cancelled at {} after {} steps",
                    self.state.epoch(),
                    self.steps_taken
                );
                self.cancelled = true;
                break;
            }
            let remaining = stop_time - self.state.epoch();
            if remaining == Duration::ZERO {
                break;
            }
            // Take one final step of exactly the needed duration until the stop time
            let this_step = if (!backprop && remaining < step) || (backprop && remaining > step) {
                remaining
            } else {
                step
            };
            if let Err(e) = self.step_by(this_step) {
                outcome = Err(e);
                break;
            }
            if let Some(sink) = sink.as_deref_mut() {
                batch.push(self.state.sample());
                if batch.len() >= batch_size {
                    sink.accept(&batch);
                    batch.clear();
                }
            }
        }

        // Whatever was computed is valid, including when stopping on an error
        if let Some(sink) = sink.as_deref_mut() {
            if !batch.is_empty() {
                sink.accept(&batch);
            }
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            if log_progress {
                let tock: Duration = tick.elapsed().into();
                info!("Done in {}", tock);
            }
        }

        outcome.map(|_| self.state)
    }

    /// Advances by exactly `dt`, then applies the sphere of influence rules (at most one transition).
    fn step_by(&mut self, dt: Duration) -> Result<(), PropagationError> {
        let last_sample = self.state.sample();
        let forces = BoundDynamics {
            dynamics: &self.prop.dynamics,
            registry: self.registry,
        };
        let mut next = self
            .stepper
            .step(&self.state, dt.to_seconds(), &forces)
            .context(DynamicsSnafu {
                last_sample: Box::new(last_sample),
            })?;
        if !(is_finite3(&next.position_km) && is_finite3(&next.velocity_km_s)) {
            return Err(DomainError::NonFinite {
                action: "integrating the state",
            })
            .context(NonFiniteStateSnafu {
                last_sample: Box::new(last_sample),
            });
        }
        next.epoch = self.state.epoch + dt;
        self.state = next;
        self.steps_taken += 1;

        if self.prop.opts.soi_switching {
            if let Some(transition) =
                resolve_state(&mut self.state, self.registry, self.prop.opts.soi_hysteresis)
                    .context(PropConfigSnafu)?
            {
                self.transitions.push(transition);
            }
        }
        Ok(())
    }

    /// Take a single propagator step
    pub fn single_step(&mut self) -> Result<SatelliteState, PropagationError> {
        self.check_start().context(PropConfigSnafu)?;
        self.step_by(self.step_size)?;
        Ok(self.state)
    }

    /// This method propagates the provided Dynamics for the provided duration.
    pub fn for_duration(&mut self, duration: Duration) -> Result<SatelliteState, PropagationError> {
        self.for_duration_sink_option(duration, None)
    }

    /// Propagates the provided Dynamics until the provided epoch. Returns the end state.
    pub fn until_epoch(&mut self, end_time: Epoch) -> Result<SatelliteState, PropagationError> {
        let duration: Duration = end_time - self.state.epoch();
        self.for_duration(duration)
    }

    /// Propagates for the provided duration and hands every sample (starting with the initial state) to the
    /// sink, in batches of `batch_size` samples. Returns the end state.
    pub fn propagate_incremental<S: TrajectorySink>(
        &mut self,
        duration: Duration,
        sink: &mut S,
    ) -> Result<SatelliteState, PropagationError> {
        self.for_duration_sink_option(duration, Some(sink as &mut dyn TrajectorySink))
    }

    /// Propagates the provided Dynamics for the provided duration and generates the trajectory.
    /// Returns the end state and the trajectory.
    pub fn for_duration_with_traj(
        &mut self,
        duration: Duration,
    ) -> Result<(SatelliteState, Trajectory), PropagationError> {
        let mut traj = Trajectory::new();
        let end_state =
            self.for_duration_sink_option(duration, Some(&mut traj as &mut dyn TrajectorySink))?;
        // Backward propagations append samples in reverse
        traj.finalize();
        Ok((end_state, traj))
    }

    /// Propagates the provided Dynamics until the provided epoch and generates the trajectory.
    pub fn until_epoch_with_traj(
        &mut self,
        end_time: Epoch,
    ) -> Result<(SatelliteState, Trajectory), PropagationError> {
        let duration: Duration = end_time - self.state.epoch();
        self.for_duration_with_traj(duration)
    }
}
