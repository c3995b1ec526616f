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

use super::{BodyId, TimeTagged};
use crate::linalg::{Vector3, Vector6};
use crate::time::Epoch;
use approx::{abs_diff_eq, relative_eq};
use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// Panics unless both states are at the same epoch and their position and velocity are within `epsilon`.
pub fn assert_state_eq_or_abs(
    left: &SatelliteState,
    right: &SatelliteState,
    epsilon: f64,
    msg: &str,
) {
    if left.epoch != right.epoch
        || left.central != right.central
        || !abs_diff_eq!(left.to_vector(), right.to_vector(), epsilon = epsilon)
    {
        panic!(
            r#"assertion failed: `(left == right)`
  left: `{left}`,
 right: `{right}`: {msg}"#
        )
    }
}

/// Same as [`assert_state_eq_or_abs`] with a relative tolerance.
pub fn assert_state_eq_or_rel(
    left: &SatelliteState,
    right: &SatelliteState,
    epsilon: f64,
    msg: &str,
) {
    if left.epoch != right.epoch
        || left.central != right.central
        || !relative_eq!(
            left.to_vector(),
            right.to_vector(),
            max_relative = epsilon
        )
    {
        panic!(
            r#"assertion failed: `(left == right)`
  left: `{left}`,
 right: `{right}`: {msg}"#
        )
    }
}

/// The three frame families a state may be expressed in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameKind {
    /// Rotates with the surface of the center body.
    PlanetFixed,
    /// Non-rotating, centered on the center body.
    PlanetInertial,
    /// Non-rotating, centered on the root of the registry.
    Barycentric,
}

impl FrameKind {
    /// One byte tag used by the binary state records.
    pub fn tag(&self) -> u8 {
        match self {
            Self::PlanetFixed => 0,
            Self::PlanetInertial => 1,
            Self::Barycentric => 2,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::PlanetFixed),
            1 => Some(Self::PlanetInertial),
            2 => Some(Self::Barycentric),
            _ => None,
        }
    }
}

/// A frame is a frame kind attached to a center body.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Frame {
    pub center: BodyId,
    pub kind: FrameKind,
}

impl Frame {
    pub fn fixed(center: BodyId) -> Self {
        Self {
            center,
            kind: FrameKind::PlanetFixed,
        }
    }

    pub fn inertial(center: BodyId) -> Self {
        Self {
            center,
            kind: FrameKind::PlanetInertial,
        }
    }

    /// Barycentric frame of a registry whose root is `root`.
    pub fn barycentric(root: BodyId) -> Self {
        Self {
            center: root,
            kind: FrameKind::Barycentric,
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            FrameKind::PlanetFixed => write!(f, "body {} fixed", self.center),
            FrameKind::PlanetInertial => write!(f, "body {} inertial", self.center),
            FrameKind::Barycentric => write!(f, "barycentric ({})", self.center),
        }
    }
}

/// State of a satellite, always expressed in the inertial frame of its current central body.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SatelliteState {
    pub epoch: Epoch,
    pub position_km: Vector3<f64>,
    pub velocity_km_s: Vector3<f64>,
    /// The body whose inertial frame the position and velocity are expressed in.
    pub central: BodyId,
    pub mass_kg: f64,
    /// Cross-sectional area seen by the flow, in m^2
    pub area_m2: f64,
    pub cd: f64,
}

impl SatelliteState {
    /// Builds a new state with no drag properties (a one kilogram point).
    pub fn new(
        epoch: Epoch,
        position_km: Vector3<f64>,
        velocity_km_s: Vector3<f64>,
        central: BodyId,
    ) -> Self {
        Self {
            epoch,
            position_km,
            velocity_km_s,
            central,
            mass_kg: 1.0,
            area_m2: 0.0,
            cd: 2.2,
        }
    }

    /// Sets the ballistic properties used by the drag model.
    pub fn with_drag(mut self, mass_kg: f64, area_m2: f64, cd: f64) -> Self {
        self.mass_kg = mass_kg;
        self.area_m2 = area_m2;
        self.cd = cd;
        self
    }

    /// Returns the magnitude of the radius vector in km
    pub fn rmag_km(&self) -> f64 {
        self.position_km.norm()
    }

    /// Returns the magnitude of the velocity vector in km/s
    pub fn vmag_km_s(&self) -> f64 {
        self.velocity_km_s.norm()
    }

    /// Specific orbital energy (km^2/s^2) about a central body of gravitational parameter `gm`
    pub fn specific_energy(&self, gm: f64) -> f64 {
        self.vmag_km_s().powi(2) / 2.0 - gm / self.rmag_km()
    }

    /// Specific angular momentum vector (km^2/s)
    pub fn hvec(&self) -> Vector3<f64> {
        self.position_km.cross(&self.velocity_km_s)
    }

    /// Position and velocity stacked in a single vector, as integrated.
    pub fn to_vector(&self) -> Vector6<f64> {
        Vector6::new(
            self.position_km[0],
            self.position_km[1],
            self.position_km[2],
            self.velocity_km_s[0],
            self.velocity_km_s[1],
            self.velocity_km_s[2],
        )
    }

    /// Sets the position and velocity from an integrated vector.
    pub fn set(&mut self, epoch: Epoch, vector: &Vector6<f64>) {
        self.epoch = epoch;
        self.position_km = vector.fixed_rows::<3>(0).into_owned();
        self.velocity_km_s = vector.fixed_rows::<3>(3).into_owned();
    }

    /// Copies out the part of this state that is recorded in a trajectory.
    pub fn sample(&self) -> TrajectorySample {
        TrajectorySample {
            epoch: self.epoch,
            position_km: self.position_km,
            velocity_km_s: self.velocity_km_s,
            central: self.central,
        }
    }
}

impl TimeTagged for SatelliteState {
    fn epoch(&self) -> Epoch {
        self.epoch
    }

    fn set_epoch(&mut self, epoch: Epoch) {
        self.epoch = epoch
    }
}

impl fmt::Display for SatelliteState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[{}] {}\tposition = [{:.6}, {:.6}, {:.6}] km\tvelocity = [{:.6}, {:.6}, {:.6}] km/s",
            self.central,
            self.epoch,
            self.position_km[0],
            self.position_km[1],
            self.position_km[2],
            self.velocity_km_s[0],
            self.velocity_km_s[1],
            self.velocity_km_s[2]
        )
    }
}

/// One sample of a propagated trajectory.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TrajectorySample {
    pub epoch: Epoch,
    pub position_km: Vector3<f64>,
    pub velocity_km_s: Vector3<f64>,
    pub central: BodyId,
}

impl TrajectorySample {
    pub fn rmag_km(&self) -> f64 {
        self.position_km.norm()
    }

    /// Rebuilds a satellite state from this sample, borrowing the ballistic properties of `template`.
    pub fn to_state(&self, template: &SatelliteState) -> SatelliteState {
        SatelliteState {
            epoch: self.epoch,
            position_km: self.position_km,
            velocity_km_s: self.velocity_km_s,
            central: self.central,
            ..*template
        }
    }
}

impl TimeTagged for TrajectorySample {
    fn epoch(&self) -> Epoch {
        self.epoch
    }

    fn set_epoch(&mut self, epoch: Epoch) {
        self.epoch = epoch
    }
}

impl fmt::Display for TrajectorySample {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[{}] {}\t|r| = {:.3} km",
            self.central,
            self.epoch,
            self.rmag_km()
        )
    }
}
