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

extern crate nalgebra as na;
use self::na::{Matrix3, Vector3};
use crate::errors::{DomainError, NonFiniteSnafu};
use snafu::ensure;
use std::f64::consts::TAU;

/// Returns the provided angle bounded between 0.0 and 360.0
pub fn between_0_360(angle: f64) -> f64 {
    let mut bounded = angle % 360.0;
    if bounded < 0.0 {
        bounded += 360.0;
    }
    bounded
}

/// Returns the provided angle bounded between -180.0 and +180.0
pub fn between_pm_180(angle: f64) -> f64 {
    let mut bounded = between_0_360(angle);
    if bounded > 180.0 {
        bounded -= 360.0;
    }
    bounded
}

/// Returns the provided angle (in radians) bounded between 0.0 and 2π
pub fn between_0_tau(angle_rad: f64) -> f64 {
    let bounded = angle_rad.rem_euclid(TAU);
    // rem_euclid may return TAU itself for tiny negative inputs
    if bounded >= TAU {
        0.0
    } else {
        bounded
    }
}

/// Returns the passive rotation matrix about the X axis.
pub fn r1(angle_rad: f64) -> Matrix3<f64> {
    let (s, c) = angle_rad.sin_cos();
    Matrix3::new(1.0, 0.0, 0.0, 0.0, c, s, 0.0, -s, c)
}

/// Returns the passive rotation matrix about the Y axis.
pub fn r2(angle_rad: f64) -> Matrix3<f64> {
    let (s, c) = angle_rad.sin_cos();
    Matrix3::new(c, 0.0, -s, 0.0, 1.0, 0.0, s, 0.0, c)
}

/// Returns the passive rotation matrix about the Z axis.
pub fn r3(angle_rad: f64) -> Matrix3<f64> {
    let (s, c) = angle_rad.sin_cos();
    Matrix3::new(c, s, 0.0, -s, c, 0.0, 0.0, 0.0, 1.0)
}

/// Returns the root sum squared (RSS) of the difference between two vectors.
pub fn rss_errors(prop: &Vector3<f64>, truth: &Vector3<f64>) -> f64 {
    (prop - truth).norm()
}

/// Returns the RSS position and velocity differences between two state vectors.
pub fn rss_state_errors(
    prop: (&Vector3<f64>, &Vector3<f64>),
    truth: (&Vector3<f64>, &Vector3<f64>),
) -> (f64, f64) {
    (rss_errors(prop.0, truth.0), rss_errors(prop.1, truth.1))
}

/// Returns true if all three components are finite.
pub fn is_finite3(v: &Vector3<f64>) -> bool {
    v.iter().all(|x| x.is_finite())
}

/// Fails with a `DomainError` if any component is NaN or infinite.
pub(crate) fn ensure_finite(v: &Vector3<f64>, action: &'static str) -> Result<(), DomainError> {
    ensure!(is_finite3(v), NonFiniteSnafu { action });
    Ok(())
}
