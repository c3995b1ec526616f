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

use super::body::Body;
use super::state::{Frame, FrameKind, SatelliteState};
use super::{BodyId, BodyRegistry};
use crate::errors::{DomainError, InvalidEllipsoidSnafu, ZeroRadiusSnafu};
use crate::io::ConfigError;
use crate::linalg::Vector3;
use crate::time::Epoch;
use crate::utils::{between_0_360, between_pm_180, ensure_finite};
use snafu::prelude::*;

/// Errors raised by frame transformations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum FrameError {
    #[snafu(display("frame transformation failed: {source}"))]
    FrameConfig { source: ConfigError },
    #[snafu(display("frame transformation failed: {source}"))]
    FrameDomain { source: DomainError },
}

const GEODETIC_EPSILON: f64 = 1e-12;
const GEODETIC_MAX_ATTEMPTS: usize = 20;

/// Converts states between the planet-fixed, planet-centered inertial and barycentric frames of a registry.
///
/// The registry is only read: transformations at different epochs never interfere.
#[derive(Copy, Clone, Debug)]
pub struct FrameTransform<'a> {
    registry: &'a BodyRegistry,
}

impl<'a> FrameTransform<'a> {
    pub fn new(registry: &'a BodyRegistry) -> Self {
        Self { registry }
    }

    /// Transforms a position (km) and velocity (km/s) between two frame kinds attached to `body`.
    ///
    /// Planet-fixed to inertial applies the body orientation and adds the `ω × r` transport term. Inertial to
    /// barycentric is a pure translation by the barycentric state of the body.
    pub fn transform(
        &self,
        position_km: &Vector3<f64>,
        velocity_km_s: &Vector3<f64>,
        from: FrameKind,
        to: FrameKind,
        body: BodyId,
        epoch: Epoch,
    ) -> Result<(Vector3<f64>, Vector3<f64>), FrameError> {
        ensure_finite(position_km, "transforming a position").context(FrameDomainSnafu)?;
        ensure_finite(velocity_km_s, "transforming a velocity").context(FrameDomainSnafu)?;
        match (from, to) {
            (FrameKind::PlanetFixed, FrameKind::PlanetFixed)
            | (FrameKind::PlanetInertial, FrameKind::PlanetInertial)
            | (FrameKind::Barycentric, FrameKind::Barycentric) => {
                Ok((*position_km, *velocity_km_s))
            }
            (FrameKind::PlanetFixed, FrameKind::PlanetInertial) => {
                self.fixed_to_inertial(position_km, velocity_km_s, body, epoch)
            }
            (FrameKind::PlanetInertial, FrameKind::PlanetFixed) => {
                self.inertial_to_fixed(position_km, velocity_km_s, body, epoch)
            }
            (FrameKind::PlanetInertial, FrameKind::Barycentric) => {
                let (r_body, v_body) = self.body_state(body, epoch)?;
                Ok((position_km + r_body, velocity_km_s + v_body))
            }
            (FrameKind::Barycentric, FrameKind::PlanetInertial) => {
                let (r_body, v_body) = self.body_state(body, epoch)?;
                Ok((position_km - r_body, velocity_km_s - v_body))
            }
            (FrameKind::PlanetFixed, FrameKind::Barycentric) => {
                let q = self.orientation(body, epoch)?;
                let omega = self.angular_velocity(body, epoch)?;
                let (r_body, v_body) = self.body_state(body, epoch)?;
                let r_inertial = q * position_km;
                Ok((
                    r_inertial + r_body,
                    q * velocity_km_s + omega.cross(&r_inertial) + v_body,
                ))
            }
            (FrameKind::Barycentric, FrameKind::PlanetFixed) => {
                let q = self.orientation(body, epoch)?;
                let omega = self.angular_velocity(body, epoch)?;
                let (r_body, v_body) = self.body_state(body, epoch)?;
                let r_inertial = position_km - r_body;
                let v_inertial = velocity_km_s - v_body;
                Ok((
                    q.inverse_transform_vector(&r_inertial),
                    q.inverse_transform_vector(&(v_inertial - omega.cross(&r_inertial))),
                ))
            }
        }
    }

    /// Re-expresses a state from one frame into another, possibly attached to a different body.
    pub fn change_frame(
        &self,
        position_km: &Vector3<f64>,
        velocity_km_s: &Vector3<f64>,
        from: Frame,
        to: Frame,
        epoch: Epoch,
    ) -> Result<(Vector3<f64>, Vector3<f64>), FrameError> {
        let from = self.normalize(from);
        let to = self.normalize(to);
        if from.center == to.center {
            return self.transform(position_km, velocity_km_s, from.kind, to.kind, from.center, epoch);
        }
        if from.kind != FrameKind::PlanetFixed && to.kind != FrameKind::PlanetFixed {
            // Both inertial: a single translation between the two centers
            let (r_rel, v_rel) = self
                .registry
                .relative_state(from.center, to.center, epoch)
                .context(FrameConfigSnafu)?;
            ensure_finite(position_km, "changing frame").context(FrameDomainSnafu)?;
            ensure_finite(velocity_km_s, "changing frame").context(FrameDomainSnafu)?;
            return Ok((position_km + r_rel, velocity_km_s + v_rel));
        }
        let (r_bary, v_bary) = self.transform(
            position_km,
            velocity_km_s,
            from.kind,
            FrameKind::Barycentric,
            from.center,
            epoch,
        )?;
        self.transform(
            &r_bary,
            &v_bary,
            FrameKind::Barycentric,
            to.kind,
            to.center,
            epoch,
        )
    }

    /// Converts a satellite state into another frame.
    pub fn state_in(
        &self,
        state: &SatelliteState,
        to: Frame,
    ) -> Result<(Vector3<f64>, Vector3<f64>), FrameError> {
        self.change_frame(
            &state.position_km,
            &state.velocity_km_s,
            Frame::inertial(state.central),
            to,
            state.epoch,
        )
    }

    /// Planet-fixed position of a point given by its geodetic latitude, longitude (degrees) and height (km)
    /// above the reference ellipsoid of the body.
    pub fn geodetic_to_body_fixed(
        &self,
        latitude_deg: f64,
        longitude_deg: f64,
        height_km: f64,
        body: BodyId,
    ) -> Result<Vector3<f64>, FrameError> {
        let body = self.registry.get(body).context(FrameConfigSnafu)?;
        let (semi_major_radius, flattening) = ellipsoid(body).context(FrameDomainSnafu)?;
        let e2 = 2.0 * flattening - flattening.powi(2);
        let (sin_long, cos_long) = longitude_deg.to_radians().sin_cos();
        let (sin_lat, cos_lat) = latitude_deg.to_radians().sin_cos();
        let c_body = semi_major_radius / ((1.0 - e2 * sin_lat.powi(2)).sqrt());
        let s_body = (semi_major_radius * (1.0 - flattening).powi(2))
            / ((1.0 - e2 * sin_lat.powi(2)).sqrt());
        Ok(Vector3::new(
            (c_body + height_km) * cos_lat * cos_long,
            (c_body + height_km) * cos_lat * sin_long,
            (s_body + height_km) * sin_lat,
        ))
    }

    /// Geodetic latitude (degrees, between -90 and +90), longitude (degrees, between 0 and 360) and height (km) of
    /// a planet-fixed position.
    pub fn body_fixed_to_geodetic(
        &self,
        position_km: &Vector3<f64>,
        body: BodyId,
    ) -> Result<(f64, f64, f64), FrameError> {
        let body = self.registry.get(body).context(FrameConfigSnafu)?;
        let (semi_major_radius, flattening) = ellipsoid(body).context(FrameDomainSnafu)?;
        geodetic_from_fixed(position_km, semi_major_radius, flattening).context(FrameDomainSnafu)
    }

    /// Inertial state of a point fixed on the rotating body at the provided geodetic coordinates, including the
    /// velocity it inherits from the rotation of the body.
    pub fn launch_state(
        &self,
        latitude_deg: f64,
        longitude_deg: f64,
        height_km: f64,
        body: BodyId,
        epoch: Epoch,
    ) -> Result<SatelliteState, FrameError> {
        let r_fixed = self.geodetic_to_body_fixed(latitude_deg, longitude_deg, height_km, body)?;
        let (r_inertial, v_inertial) = self.fixed_to_inertial(&r_fixed, &Vector3::zeros(), body, epoch)?;
        Ok(SatelliteState::new(epoch, r_inertial, v_inertial, body))
    }

    fn normalize(&self, frame: Frame) -> Frame {
        if frame.kind == FrameKind::Barycentric {
            Frame::barycentric(self.registry.root())
        } else {
            frame
        }
    }

    fn fixed_to_inertial(
        &self,
        position_km: &Vector3<f64>,
        velocity_km_s: &Vector3<f64>,
        body: BodyId,
        epoch: Epoch,
    ) -> Result<(Vector3<f64>, Vector3<f64>), FrameError> {
        let q = self.orientation(body, epoch)?;
        let omega = self.angular_velocity(body, epoch)?;
        let r_inertial = q * position_km;
        Ok((r_inertial, q * velocity_km_s + omega.cross(&r_inertial)))
    }

    fn inertial_to_fixed(
        &self,
        position_km: &Vector3<f64>,
        velocity_km_s: &Vector3<f64>,
        body: BodyId,
        epoch: Epoch,
    ) -> Result<(Vector3<f64>, Vector3<f64>), FrameError> {
        let q = self.orientation(body, epoch)?;
        let omega = self.angular_velocity(body, epoch)?;
        Ok((
            q.inverse_transform_vector(position_km),
            q.inverse_transform_vector(&(velocity_km_s - omega.cross(position_km))),
        ))
    }

    fn orientation(
        &self,
        body: BodyId,
        epoch: Epoch,
    ) -> Result<crate::linalg::UnitQuaternion<f64>, FrameError> {
        self.registry
            .orientation(body, epoch)
            .context(FrameConfigSnafu)
    }

    fn angular_velocity(&self, body: BodyId, epoch: Epoch) -> Result<Vector3<f64>, FrameError> {
        self.registry
            .angular_velocity(body, epoch)
            .context(FrameConfigSnafu)
    }

    fn body_state(
        &self,
        body: BodyId,
        epoch: Epoch,
    ) -> Result<(Vector3<f64>, Vector3<f64>), FrameError> {
        self.registry
            .barycentric_state(body, epoch)
            .context(FrameConfigSnafu)
    }
}

/// Semi-major radius and flattening of the reference ellipsoid of a body.
fn ellipsoid(body: &Body) -> Result<(f64, f64), DomainError> {
    let equatorial_km = body.equatorial_radius_km;
    let polar_km = body.polar_radius_km();
    ensure!(
        equatorial_km.is_finite() && equatorial_km > 0.0 && polar_km > 0.0 && polar_km <= equatorial_km,
        InvalidEllipsoidSnafu {
            equatorial_km,
            polar_km
        }
    );
    Ok((equatorial_km, body.flattening()))
}

/// Iterative geodetic latitude and height (Vallado, algorithm 12).
fn geodetic_from_fixed(
    position_km: &Vector3<f64>,
    semi_major_radius: f64,
    flattening: f64,
) -> Result<(f64, f64, f64), DomainError> {
    ensure_finite(position_km, "computing geodetic coordinates")?;
    let rmag = position_km.norm();
    ensure!(
        rmag > 0.0,
        ZeroRadiusSnafu {
            action: "computing geodetic coordinates"
        }
    );

    let e2 = flattening * (2.0 - flattening);
    let r_delta = (position_km[0].powi(2) + position_km[1].powi(2)).sqrt();
    let mut latitude = (position_km[2] / rmag).asin();
    let mut attempt_no = 0;
    loop {
        attempt_no += 1;
        let c_body = semi_major_radius / ((1.0 - e2 * latitude.sin().powi(2)).sqrt());
        let new_latitude = (position_km[2] + c_body * e2 * latitude.sin()).atan2(r_delta);
        let error = (latitude - new_latitude).abs();
        latitude = new_latitude;
        if error < GEODETIC_EPSILON {
            break;
        } else if attempt_no >= GEODETIC_MAX_ATTEMPTS {
            warn!("geodetic latitude failed to converge -- error = {error:e}");
            break;
        }
    }

    let sin_lat = latitude.sin();
    let height_km = if latitude.abs() > 80_f64.to_radians() {
        // Near the poles, use the polar formulation
        let s_body = (semi_major_radius * (1.0 - flattening).powi(2))
            / ((1.0 - e2 * sin_lat.powi(2)).sqrt());
        position_km[2] / sin_lat - s_body
    } else {
        let c_body = semi_major_radius / ((1.0 - e2 * sin_lat.powi(2)).sqrt());
        r_delta / latitude.cos() - c_body
    };
    let longitude_deg = between_0_360(position_km[1].atan2(position_km[0]).to_degrees());

    Ok((
        between_pm_180(latitude.to_degrees()),
        longitude_deg,
        height_km,
    ))
}
