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

use super::{AccelModel, DynamicsConfigSnafu, DynamicsDomainSnafu, DynamicsError};
use crate::cosmic::{BodyId, BodyKind, BodyRegistry, SatelliteState};
use crate::errors::{DomainError, SingularGravitySnafu};
use crate::linalg::Vector3;
use crate::utils::ensure_finite;
use snafu::{ensure, ResultExt};
use std::fmt;

/// Below this distance (km) to the center of a gravity source, the field is considered singular.
pub const SINGULAR_DISTANCE_KM: f64 = 1e-6;

/// Acceleration `-GM r / |r|^3` of a point mass located at the origin of `radius_km`.
pub fn point_mass_acceleration(
    gm: f64,
    radius_km: &Vector3<f64>,
    body: BodyId,
) -> Result<Vector3<f64>, DomainError> {
    ensure_finite(radius_km, "computing point mass gravity")?;
    let rmag = radius_km.norm();
    ensure_regular(body, rmag)?;
    Ok(-gm / rmag.powi(3) * radius_km)
}

/// Fails if a satellite is too close to the center of a gravity source.
pub(crate) fn ensure_regular(body: BodyId, distance_km: f64) -> Result<(), DomainError> {
    ensure!(
        distance_km > SINGULAR_DISTANCE_KM,
        SingularGravitySnafu { body, distance_km }
    );
    Ok(())
}

/// Point mass gravity of the bodies other than the central body, expressed as a perturbation of the motion
/// relative to the central body:
///
/// `a = GM_b [ (r_b - r) / |r_b - r|^3 - r_b / |r_b|^3 ]`
///
/// When no explicit list of bodies is provided, every gravity source of the registry is considered: the star
/// is always included, and any other body is included if its direct acceleration on the satellite is at least
/// `significance` times the acceleration of the central body.
#[derive(Clone, Debug, PartialEq)]
pub struct PointMassGravity {
    pub significance: f64,
    pub bodies: Option<Vec<BodyId>>,
}

impl PointMassGravity {
    pub fn new(significance: f64) -> Self {
        Self {
            significance,
            bodies: None,
        }
    }

    /// Only the provided bodies, whatever their significance
    pub fn with_bodies(bodies: &[BodyId]) -> Self {
        Self {
            significance: 0.0,
            bodies: Some(bodies.to_vec()),
        }
    }

    fn third_body_acceleration(
        &self,
        id: BodyId,
        state: &SatelliteState,
        registry: &BodyRegistry,
        central_accel: f64,
        always: bool,
    ) -> Result<Vector3<f64>, DynamicsError> {
        let gm = registry.gm(id).context(DynamicsConfigSnafu)?;
        let (r_body, _) = registry
            .relative_state(id, state.central, state.epoch)
            .context(DynamicsConfigSnafu)?;
        let to_body = r_body - state.position_km;
        let distance = to_body.norm();
        ensure_regular(id, distance).context(DynamicsDomainSnafu)?;
        if !always && gm / distance.powi(2) < self.significance * central_accel {
            return Ok(Vector3::zeros());
        }
        let rb = r_body.norm();
        ensure_regular(id, rb).context(DynamicsDomainSnafu)?;
        Ok(gm * (to_body / distance.powi(3) - r_body / rb.powi(3)))
    }
}

impl Default for PointMassGravity {
    fn default() -> Self {
        Self::new(super::DEFAULT_SIGNIFICANCE)
    }
}

impl fmt::Display for PointMassGravity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.bodies {
            Some(bodies) => write!(f, "point masses of {bodies:?}"),
            None => write!(f, "point masses above {:e}", self.significance),
        }
    }
}

impl AccelModel for PointMassGravity {
    fn eom(
        &self,
        state: &SatelliteState,
        registry: &BodyRegistry,
    ) -> Result<Vector3<f64>, DynamicsError> {
        let gm_central = registry.gm(state.central).context(DynamicsConfigSnafu)?;
        let central_accel = gm_central / state.rmag_km().powi(2);
        let mut accel = Vector3::zeros();
        match &self.bodies {
            Some(bodies) => {
                for id in bodies.iter().filter(|id| **id != state.central) {
                    accel +=
                        self.third_body_acceleration(*id, state, registry, central_accel, true)?;
                }
            }
            None => {
                for (id, _) in registry
                    .gravity_sources()
                    .filter(|(id, _)| *id != state.central)
                {
                    let always = registry.kind(id).context(DynamicsConfigSnafu)? == BodyKind::Star;
                    accel +=
                        self.third_body_acceleration(id, state, registry, central_accel, always)?;
                }
            }
        }
        Ok(accel)
    }
}
