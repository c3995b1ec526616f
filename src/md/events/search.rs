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

use super::{ApsisEvent, ApsisKind, SearchDetectionSnafu, SearchError, SearchPropagationSnafu};
use crate::cosmic::{BodyRegistry, SatelliteState};
use crate::md::Trajectory;
use crate::propagators::{PropInstance, Propagator};
use crate::time::{Duration, Epoch, Unit};
use snafu::prelude::*;

/// Answers "next apsis after" queries on a trajectory, extending it with a live propagation when the samples do
/// not contain the requested apsis yet.
pub struct ApsisSearch<'a> {
    instance: PropInstance<'a>,
    trajectory: Trajectory,
    /// Give up when no apsis is found within this duration past the query epoch.
    pub max_duration: Duration,
    /// Number of steps added to the trajectory between two detections.
    pub extension_steps: usize,
}

impl<'a> ApsisSearch<'a> {
    /// Starts a search from the current state of the instance, with an otherwise empty trajectory.
    pub fn new(instance: PropInstance<'a>) -> Self {
        let mut trajectory = Trajectory::new();
        trajectory.push(instance.state.sample());
        Self {
            instance,
            trajectory,
            max_duration: 30 * Unit::Day,
            extension_steps: 64,
        }
    }

    /// Resumes from an existing trajectory: the propagation restarts at its last sample, using the ballistic
    /// properties (mass, area, Cd) of `template`. An empty trajectory starts at `template` itself.
    pub fn extending(
        mut trajectory: Trajectory,
        prop: &'a Propagator,
        registry: &'a BodyRegistry,
        template: &SatelliteState,
    ) -> Self {
        trajectory.finalize();
        let state = match trajectory.last() {
            Some(last) => last.to_state(template),
            None => {
                trajectory.push(template.sample());
                *template
            }
        };
        Self {
            instance: prop.with(state, registry),
            trajectory,
            max_duration: 30 * Unit::Day,
            extension_steps: 64,
        }
    }

    pub fn with_max_duration(mut self, max_duration: Duration) -> Self {
        self.max_duration = max_duration;
        self
    }

    pub fn trajectory(&self) -> &Trajectory {
        &self.trajectory
    }

    pub fn into_trajectory(self) -> Trajectory {
        self.trajectory
    }

    /// Returns the first apsis strictly after `after` (of the requested kind if any).
    ///
    /// Returns `None` if none is found within `max_duration` or if the propagation was cancelled.
    pub fn find_next_apsis(
        &mut self,
        after: Epoch,
        kind: Option<ApsisKind>,
    ) -> Result<Option<ApsisEvent>, SearchError> {
        let horizon = match self.trajectory.last() {
            Some(last) if last.epoch > after => last.epoch,
            _ => after,
        } + self.max_duration;

        loop {
            if let Some(event) = self
                .trajectory
                .next_apsis(after, kind)
                .context(SearchDetectionSnafu)?
            {
                debug!(
                    "next {} after {after}: {event}",
                    kind.map_or("apsis".to_string(), |k| k.to_string())
                );
                return Ok(Some(event));
            }
            if self.instance.state.epoch >= horizon {
                info!("no apsis found between {after} and {horizon}");
                return Ok(None);
            }
            for _ in 0..self.extension_steps {
                if self
                    .instance
                    .prop
                    .opts
                    .cancel
                    .as_ref()
                    .map_or(false, |token| token.is_cancelled())
                {
                    info!("apsis search cancelled at {}", self.instance.state.epoch);
                    self.instance.cancelled = true;
                    return Ok(None);
                }
                let state = self
                    .instance
                    .single_step()
                    .context(SearchPropagationSnafu)?;
                self.trajectory.push(state.sample());
            }
        }
    }
}
