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

use crate::errors::{DomainError, InvalidQuaternionSnafu};
use crate::io::{epoch_from_str, epoch_to_str};
use crate::linalg::{Matrix3, Quaternion, UnitQuaternion, Vector3};
use crate::time::Epoch;
use crate::utils::{r1, r2, r3};
use serde_derive::{Deserialize, Serialize};
use snafu::ensure;

/// Seconds per day, used by the prime meridian polynomials
pub const SECONDS_PER_DAY: f64 = 86_400.0;
/// Seconds per Julian century, used by the pole polynomials
pub const SECONDS_PER_CENTURY: f64 = 36_525.0 * SECONDS_PER_DAY;

/// Defines an Euler rotation, angle must be in radians.
///
/// The child frame is the parent frame rotated by this angle about this axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EulerRotation {
    R1(f64),
    R2(f64),
    R3(f64),
}

impl EulerRotation {
    /// Get the DCM from the parent frame to the child frame
    pub fn dcm(&self) -> Matrix3<f64> {
        match *self {
            Self::R1(angle) => r1(angle),
            Self::R2(angle) => r2(angle),
            Self::R3(angle) => r3(angle),
        }
    }

    /// The quaternion mapping child frame components onto the parent frame
    pub fn to_parent(&self) -> UnitQuaternion<f64> {
        match *self {
            Self::R1(angle) => UnitQuaternion::from_axis_angle(&Vector3::x_axis(), angle),
            Self::R2(angle) => UnitQuaternion::from_axis_angle(&Vector3::y_axis(), angle),
            Self::R3(angle) => UnitQuaternion::from_axis_angle(&Vector3::z_axis(), angle),
        }
    }
}

/// A three-axis Euler sequence, applied first to third.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Euler3Axis {
    pub first: EulerRotation,
    pub second: EulerRotation,
    pub third: EulerRotation,
}

impl Euler3Axis {
    /// The right ascension / declination / twist sequence of the IAU rotation models:
    /// the body frame is the inertial frame rotated by R3(alpha + 90 deg), then R1(90 deg - delta), then R3(W).
    pub fn from_ra_dec_w(alpha_rad: f64, delta_rad: f64, w_rad: f64) -> Self {
        Self {
            first: EulerRotation::R3(alpha_rad + std::f64::consts::FRAC_PI_2),
            second: EulerRotation::R1(std::f64::consts::FRAC_PI_2 - delta_rad),
            third: EulerRotation::R3(w_rad),
        }
    }

    pub fn dcm(&self) -> Matrix3<f64> {
        self.third.dcm() * self.second.dcm() * self.first.dcm()
    }

    pub fn to_parent(&self) -> UnitQuaternion<f64> {
        self.first.to_parent() * self.second.to_parent() * self.third.to_parent()
    }
}

/// Builds a unit quaternion from `[w, x, y, z]` components, refusing anything that is not close to unit norm.
pub fn quaternion_from_wxyz(q: [f64; 4]) -> Result<UnitQuaternion<f64>, DomainError> {
    let raw = Quaternion::new(q[0], q[1], q[2], q[3]);
    let norm = raw.norm();
    ensure!(
        norm.is_finite() && (norm - 1.0).abs() < 1e-6,
        InvalidQuaternionSnafu { norm }
    );
    Ok(UnitQuaternion::from_quaternion(raw))
}

/// Evaluates `c0 + c1 x + c2 x^2`
fn quadratic(coeffs: &[f64; 3], x: f64) -> f64 {
    coeffs[0] + x * (coeffs[1] + x * coeffs[2])
}

/// How a body is oriented in the inertial frame at any epoch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum RotationModel {
    /// A fixed attitude at the reference epoch, spinning uniformly about the body Z axis.
    Uniform {
        /// Body-fixed to inertial quaternion at the reference epoch, stored as `[w, x, y, z]`.
        quaternion: [f64; 4],
        rate_deg_s: f64,
        #[serde(serialize_with = "epoch_to_str", deserialize_with = "epoch_from_str")]
        reference_epoch: Epoch,
    },
    /// IAU pole and prime meridian polynomials.
    /// Pole coefficients are in degrees per Julian century, prime meridian coefficients in degrees per day.
    RaDecW {
        pole_ra: [f64; 3],
        pole_dec: [f64; 3],
        pm: [f64; 3],
        /// Tilt between the equatorial axes of the polynomials and the inertial axes of the registry.
        #[serde(default)]
        obliquity_deg: f64,
    },
}

impl RotationModel {
    /// A body whose axes never move with respect to the inertial frame.
    pub fn fixed() -> Self {
        Self::Uniform {
            quaternion: [1.0, 0.0, 0.0, 0.0],
            rate_deg_s: 0.0,
            reference_epoch: Epoch::from_tdb_seconds(0.0),
        }
    }

    /// Checks that the model can be evaluated.
    pub fn validate(&self) -> Result<(), DomainError> {
        match self {
            Self::Uniform { quaternion, .. } => quaternion_from_wxyz(*quaternion).map(|_| ()),
            Self::RaDecW { .. } => Ok(()),
        }
    }

    /// Returns the quaternion mapping body-fixed components onto inertial components at this epoch.
    pub fn orientation(&self, epoch: Epoch) -> Result<UnitQuaternion<f64>, DomainError> {
        match self {
            Self::Uniform {
                quaternion,
                rate_deg_s,
                reference_epoch,
            } => {
                let q0 = quaternion_from_wxyz(*quaternion)?;
                let angle = rate_deg_s.to_radians() * (epoch - *reference_epoch).to_seconds();
                Ok(q0 * EulerRotation::R3(angle).to_parent())
            }
            Self::RaDecW {
                pole_ra,
                pole_dec,
                pm,
                obliquity_deg,
            } => {
                let seconds = epoch.to_tdb_seconds();
                let centuries_t = seconds / SECONDS_PER_CENTURY;
                let days_d = seconds / SECONDS_PER_DAY;
                let alpha = quadratic(pole_ra, centuries_t).to_radians();
                let delta = quadratic(pole_dec, centuries_t).to_radians();
                let w = quadratic(pm, days_d).to_radians();
                let equatorial = Euler3Axis::from_ra_dec_w(alpha, delta, w).to_parent();
                // Inertial axes are the equatorial axes rotated about X by the obliquity
                Ok(EulerRotation::R1(obliquity_deg.to_radians()).to_parent().inverse() * equatorial)
            }
        }
    }

    /// Spin rate about the body pole, in radians per second.
    pub fn rate_rad_s(&self, epoch: Epoch) -> f64 {
        match self {
            Self::Uniform { rate_deg_s, .. } => rate_deg_s.to_radians(),
            Self::RaDecW { pm, .. } => {
                let days_d = epoch.to_tdb_seconds() / SECONDS_PER_DAY;
                (pm[1] + 2.0 * pm[2] * days_d).to_radians() / SECONDS_PER_DAY
            }
        }
    }

    /// Angular velocity of the body frame, expressed in the inertial frame (rad/s).
    /// The slow drift of the pole is neglected.
    pub fn angular_velocity(&self, epoch: Epoch) -> Result<Vector3<f64>, DomainError> {
        let pole = self.orientation(epoch)? * Vector3::z();
        Ok(pole * self.rate_rad_s(epoch))
    }
}
