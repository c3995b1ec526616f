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

use crate::cosmic::BodyId;
use snafu::prelude::*;

/// Degenerate geometry. Always fatal to the current call: the engine never clamps these away.
#[derive(Clone, Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DomainError {
    /// The satellite sits on (or within round-off of) the center of a gravity source.
    #[snafu(display("gravity of body {body} is singular at {distance_km:e} km"))]
    SingularGravity { body: BodyId, distance_km: f64 },
    #[snafu(display("radius vector is zero when {action}"))]
    ZeroRadius { action: &'static str },
    /// Zero angular momentum: the motion is rectilinear and the orbital plane is undefined.
    #[snafu(display("angular momentum is zero when {action}"))]
    Rectilinear { action: &'static str },
    #[snafu(display("orbit with eccentricity {ecc} is parabolic, the semi-major axis is undefined"))]
    Parabolic { ecc: f64 },
    #[snafu(display("semi-major axis of {sma_km} km is degenerate"))]
    DegenerateSma { sma_km: f64 },
    #[snafu(display("true anomaly {ta_deg} deg is beyond the asymptote of a hyperbola of eccentricity {ecc}"))]
    UnreachableAnomaly { ta_deg: f64, ecc: f64 },
    #[snafu(display("gravitational parameter {gm} km^3/s^2 must be positive and finite"))]
    InvalidGm { gm: f64 },
    #[snafu(display("non-finite value encountered when {action}"))]
    NonFinite { action: &'static str },
    #[snafu(display("invalid ellipsoid with equatorial radius {equatorial_km} km and polar radius {polar_km} km"))]
    InvalidEllipsoid { equatorial_km: f64, polar_km: f64 },
    #[snafu(display("quaternion has a norm of {norm}, it cannot represent a rotation"))]
    InvalidQuaternion { norm: f64 },
    #[snafu(display("satellite mass of {mass_kg} kg must be positive and finite"))]
    InvalidMass { mass_kg: f64 },
    #[snafu(display("Kepler's equation did not converge after {iterations} iterations"))]
    KeplerDiverged { iterations: usize },
}
