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

use super::{hermite_interpolate, AcrossTransitionSnafu, NoInterpolationDataSnafu, TrajError, TrajFrameSnafu};
use crate::cosmic::{
    BodyId, BodyRegistry, Frame, FrameTransform, SoiTransition, TimeTagged, TrajectorySample,
};
use crate::linalg::Vector3;
use crate::md::events::{detect_apsides, ApsisEvent, ApsisKind, DetectionError};
use crate::time::{Duration, Epoch};
use snafu::prelude::*;
use std::fmt;

/// A sampled trajectory, possibly spanning several central bodies.
///
/// Each sample is expressed in the inertial frame of its own central body. Samples are kept in chronological
/// order once the trajectory is finalized; propagation appends them in the direction of time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trajectory {
    pub name: Option<String>,
    pub samples: Vec<TrajectorySample>,
}

/// A contiguous run of samples around the same central body.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Segment<'a> {
    pub central: BodyId,
    pub samples: &'a [TrajectorySample],
}

impl<'a> Segment<'a> {
    pub fn start(&self) -> Option<Epoch> {
        self.samples.first().map(|s| s.epoch)
    }

    pub fn end(&self) -> Option<Epoch> {
        self.samples.last().map(|s| s.epoch)
    }
}

impl Trajectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a trajectory from unordered samples. Duplicated epochs keep the first sample seen.
    pub fn from_samples(samples: Vec<TrajectorySample>) -> Self {
        let mut me = Self {
            name: None,
            samples,
        };
        me.finalize();
        me
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn push(&mut self, sample: TrajectorySample) {
        self.samples.push(sample);
    }

    /// Sorts the samples chronologically and removes duplicated epochs.
    pub fn finalize(&mut self) {
        self.samples.sort_by(|a, b| a.epoch.cmp(&b.epoch));
        self.samples.dedup_by(|a, b| a.epoch == b.epoch);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&TrajectorySample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&TrajectorySample> {
        self.samples.last()
    }

    /// Time span covered by the samples.
    pub fn duration(&self) -> Duration {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => last.epoch - first.epoch,
            _ => Duration::ZERO,
        }
    }

    /// Splits the trajectory into runs of samples around the same central body.
    pub fn segments(&self) -> Vec<Segment<'_>> {
        self.samples
            .chunk_by(|a, b| a.central == b.central)
            .map(|samples| Segment {
                central: samples[0].central,
                samples,
            })
            .collect()
    }

    /// Changes of central body, dated at the first sample around the new body.
    pub fn transitions(&self) -> Vec<SoiTransition> {
        self.samples
            .windows(2)
            .filter(|pair| pair[0].central != pair[1].central)
            .map(|pair| SoiTransition {
                epoch: pair[1].epoch,
                from: pair[0].central,
                to: pair[1].central,
            })
            .collect()
    }

    /// Returns the sample at the requested epoch, interpolating between the bracketing samples if needed.
    ///
    /// Interpolation is a cubic Hermite on the position and velocity of the two neighboring samples. It is
    /// refused in a step where the central body changed, since the neighbors are then in different frames.
    pub fn at(&self, epoch: Epoch) -> Result<TrajectorySample, TrajError> {
        let (first, last) = match (self.first(), self.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Err(TrajError::NoInterpolationData { epoch }),
        };
        ensure!(
            first.epoch <= epoch && epoch <= last.epoch,
            NoInterpolationDataSnafu { epoch }
        );

        match self.samples.binary_search_by(|s| s.epoch.cmp(&epoch)) {
            Ok(idx) => Ok(self.samples[idx]),
            Err(idx) => {
                // The insertion index is strictly within bounds thanks to the check above
                if idx == 0 || idx >= self.samples.len() {
                    return Err(TrajError::NoInterpolationData { epoch });
                }
                let before = &self.samples[idx - 1];
                let after = &self.samples[idx];
                ensure!(
                    before.central == after.central,
                    AcrossTransitionSnafu {
                        epoch,
                        from: before.central,
                        to: after.central
                    }
                );
                let h = (after.epoch - before.epoch).to_seconds();
                let tau = (epoch - before.epoch).to_seconds() / h;
                let (position_km, velocity_km_s) = hermite_interpolate(
                    tau,
                    h,
                    &before.position_km,
                    &before.velocity_km_s,
                    &after.position_km,
                    &after.velocity_km_s,
                );
                Ok(TrajectorySample {
                    epoch,
                    position_km,
                    velocity_km_s,
                    central: before.central,
                })
            }
        }
    }

    /// Positions and velocities of every sample, re-expressed in the provided frame.
    pub fn in_frame(
        &self,
        registry: &BodyRegistry,
        frame: Frame,
    ) -> Result<Vec<(Epoch, Vector3<f64>, Vector3<f64>)>, TrajError> {
        let transform = FrameTransform::new(registry);
        self.samples
            .iter()
            .map(|sample| {
                let (r, v) = transform
                    .change_frame(
                        &sample.position_km,
                        &sample.velocity_km_s,
                        Frame::inertial(sample.central),
                        frame,
                        sample.epoch,
                    )
                    .context(TrajFrameSnafu)?;
                Ok((sample.epoch, r, v))
            })
            .collect()
    }

    /// Re-expresses the whole trajectory around a single center (inertial axes), e.g. to plot it.
    pub fn rebased(&self, registry: &BodyRegistry, center: BodyId) -> Result<Self, TrajError> {
        let samples = self
            .in_frame(registry, Frame::inertial(center))?
            .into_iter()
            .map(|(epoch, position_km, velocity_km_s)| TrajectorySample {
                epoch,
                position_km,
                velocity_km_s,
                central: center,
            })
            .collect();
        Ok(Self {
            name: self.name.clone(),
            samples,
        })
    }

    /// All periapses and apoapses, segment by segment, in chronological order.
    pub fn apsides(&self) -> Result<Vec<ApsisEvent>, DetectionError> {
        let mut events = Vec::new();
        for segment in self.segments() {
            events.extend(detect_apsides(segment.samples)?);
        }
        Ok(events)
    }

    /// First apsis strictly after `after`, optionally of a given kind.
    pub fn next_apsis(
        &self,
        after: Epoch,
        kind: Option<ApsisKind>,
    ) -> Result<Option<ApsisEvent>, DetectionError> {
        Ok(self
            .apsides()?
            .into_iter()
            .find(|event| event.epoch > after && kind.map_or(true, |k| event.kind == k)))
    }

    /// Shifts every sample by the provided duration.
    pub fn shift_by(&mut self, duration: Duration) {
        for sample in &mut self.samples {
            sample.shift_by(duration);
        }
    }
}

impl fmt::Display for Trajectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) => write!(
                f,
                "Trajectory {}from {} to {} ({}, or {} samples over {} segments)",
                self.name
                    .as_ref()
                    .map(|n| format!("of {n} "))
                    .unwrap_or_default(),
                first.epoch,
                last.epoch,
                self.duration(),
                self.len(),
                self.segments().len()
            ),
            _ => write!(f, "Empty trajectory"),
        }
    }
}
