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

/*! # orrery

Trajectory propagation and orbital analysis for artificial satellites flying through a hierarchy of
barycenters, planets and moons.

The engine propagates a satellite under multi-body point-mass gravity, J2 and exponential drag with
fixed step integrators, switches the central body on sphere of influence crossings, converts between
planet-fixed, planet-centered inertial, barycentric and geodetic coordinates, converts state vectors to
and from Keplerian elements, and finds the periapses and apoapses of sampled trajectories.

Units are kilometers, kilometers per second and seconds throughout. Angles are radians in the numeric
core and degrees only where humans read or type them.
*/

/// Provides the fixed step integrators and the propagation loop.
pub mod propagators;

/// Provides the acceleration models (gravity, oblateness, drag) which are summed into the force model.
pub mod dynamics;

/// Provides the bodies, the registry, the satellite state, frames and orbital elements.
pub mod cosmic;

/// Utility functions shared by different modules.
pub mod utils;

mod errors;
/// Degenerate geometry is reported as a `DomainError` and is never silently clamped.
pub use self::errors::DomainError;

/// Configuration loading and the binary state records.
pub mod io;

/// Mission design: trajectory containers and apsis detection.
pub mod md;

#[macro_use]
extern crate log;
extern crate hifitime;
extern crate nalgebra as na;

/// Re-export of hifitime
pub mod time {
    pub use hifitime::*;
}

/// Re-export nalgebra
pub mod linalg {
    pub use na::base::*;
    pub use na::geometry::{Quaternion, UnitQuaternion};
}

pub use self::cosmic::{BodyId, BodyRegistry, SatelliteState, TrajectorySample};
