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

use super::{AlternationViolatedSnafu, DetectionError, MixedCentralBodiesSnafu};
use crate::cosmic::{BodyId, TrajectorySample, ECC_EPSILON};
use crate::linalg::Vector3;
use crate::time::{Epoch, Unit};
use serde_derive::{Deserialize, Serialize};
use snafu::prelude::*;
use std::fmt;

/// Segments whose distance varies less than this fraction of the mean distance are considered circular: this
/// matches an eccentricity below `ECC_EPSILON`.
pub const CIRCULAR_SPREAD: f64 = 2.0 * ECC_EPSILON;

/// Angular momentum relative to |r||v| below which a segment is considered rectilinear.
const RECTILINEAR_RATIO: f64 = 1e-12;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApsisKind {
    Periapsis,
    Apoapsis,
}

impl fmt::Display for ApsisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Periapsis => write!(f, "periapsis"),
            Self::Apoapsis => write!(f, "apoapsis"),
        }
    }
}

/// A periapsis or apoapsis found in a sampled trajectory. Position and velocity are in the inertial frame of the
/// central body.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ApsisEvent {
    pub kind: ApsisKind,
    pub epoch: Epoch,
    pub position_km: Vector3<f64>,
    pub velocity_km_s: Vector3<f64>,
    pub distance_km: f64,
    pub central: BodyId,
}

impl fmt::Display for ApsisEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} at {} (r = {:.3} km)",
            self.kind, self.central, self.epoch, self.distance_km
        )
    }
}

/// Finds the periapses and apoapses of one segment of samples around a single central body.
///
/// A sample is an apsis candidate if its distance is a strict local extremum among its two neighbors. The time
/// of the apsis is refined at the vertex of the parabola through the three distances, and the state is the
/// quadratic interpolation of the three samples at that time. Segments with fewer than three samples, circular
/// or rectilinear motion yield no events.
pub fn detect_apsides(segment: &[TrajectorySample]) -> Result<Vec<ApsisEvent>, DetectionError> {
    let first = match segment.first() {
        Some(first) => first,
        None => return Ok(Vec::new()),
    };
    if let Some(other) = segment.iter().find(|s| s.central != first.central) {
        return MixedCentralBodiesSnafu {
            first: first.central,
            other: other.central,
        }
        .fail();
    }
    if segment.len() < 3 || is_degenerate(segment) {
        return Ok(Vec::new());
    }

    let mut events: Vec<ApsisEvent> = Vec::new();
    for window in segment.windows(3) {
        let (d0, d1, d2) = (window[0].rmag_km(), window[1].rmag_km(), window[2].rmag_km());
        let kind = if d1 < d0 && d1 < d2 {
            ApsisKind::Periapsis
        } else if d1 > d0 && d1 > d2 {
            ApsisKind::Apoapsis
        } else {
            continue;
        };
        let event = refine(kind, window);
        if let Some(prev) = events.last() {
            ensure!(
                prev.kind != kind,
                AlternationViolatedSnafu {
                    kind,
                    epoch: event.epoch
                }
            );
        }
        trace!("{event}");
        events.push(event);
    }
    Ok(events)
}

fn is_degenerate(segment: &[TrajectorySample]) -> bool {
    let rectilinear = segment.iter().all(|s| {
        s.position_km.cross(&s.velocity_km_s).norm()
            <= RECTILINEAR_RATIO * s.rmag_km() * s.velocity_km_s.norm()
    });
    if rectilinear {
        return true;
    }
    let (min, max, sum) = segment.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, 0.0),
        |(min, max, sum), s| {
            let d = s.rmag_km();
            (min.min(d), max.max(d), sum + d)
        },
    );
    let mean = sum / segment.len() as f64;
    max - min <= CIRCULAR_SPREAD * mean
}

/// Quadratic refinement through the extremum (middle sample) and its neighbors, which may be unevenly spaced.
fn refine(kind: ApsisKind, window: &[TrajectorySample]) -> ApsisEvent {
    let mid = &window[1];
    // Times relative to the middle sample
    let x0 = (window[0].epoch - mid.epoch).to_seconds();
    let x2 = (window[2].epoch - mid.epoch).to_seconds();
    let (d0, d1, d2) = (window[0].rmag_km(), mid.rmag_km(), window[2].rmag_km());

    // d(x) = a x^2 + b x + d1
    let h1 = -x0;
    let h2 = x2;
    let denom = h1 * h2 * (h1 + h2);
    let a = ((d0 - d1) * h2 + (d2 - d1) * h1) / denom;
    let b = ((d2 - d1) * h1 * h1 - (d0 - d1) * h2 * h2) / denom;

    let (x_star, distance_km) = if a.abs() > f64::EPSILON * d1.abs() / (h1 * h2) {
        let x = (-b / (2.0 * a)).clamp(x0, x2);
        (x, a * x * x + b * x + d1)
    } else {
        (0.0, d1)
    };

    // Lagrange basis through the three samples at x_star
    let l0 = x_star * (x_star - x2) / (x0 * (x0 - x2));
    let l1 = (x_star - x0) * (x_star - x2) / (x0 * x2);
    let l2 = (x_star - x0) * x_star / (x2 * (x2 - x0));

    let position_km =
        window[0].position_km * l0 + mid.position_km * l1 + window[2].position_km * l2;
    let velocity_km_s =
        window[0].velocity_km_s * l0 + mid.velocity_km_s * l1 + window[2].velocity_km_s * l2;

    ApsisEvent {
        kind,
        epoch: mid.epoch + Unit::Second * x_star,
        position_km,
        velocity_km_s,
        distance_km,
        central: mid.central,
    }
}
