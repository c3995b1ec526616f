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

use super::gravity::ensure_regular;
use super::{AccelModel, DynamicsConfigSnafu, DynamicsDomainSnafu, DynamicsError};
use crate::cosmic::{BodyRegistry, SatelliteState};
use crate::linalg::Vector3;
use snafu::ResultExt;
use std::fmt;

/// J2 zonal term of the central body, about the pole of its body-fixed frame.
///
/// Bodies without a J2 coefficient contribute nothing.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct J2Oblateness;

impl J2Oblateness {
    /// Acceleration of the J2 term for a body of gravitational parameter `gm`, equatorial radius `radius_km`,
    /// and unit pole vector `pole` expressed in the same axes as `radius`.
    pub fn acceleration(
        j2: f64,
        gm: f64,
        radius_km: f64,
        pole: &Vector3<f64>,
        radius: &Vector3<f64>,
    ) -> Vector3<f64> {
        let rmag = radius.norm();
        let r_dot_k = radius.dot(pole);
        let factor = -1.5 * j2 * gm * radius_km.powi(2) / rmag.powi(5);
        factor * ((1.0 - 5.0 * (r_dot_k / rmag).powi(2)) * radius + 2.0 * r_dot_k * pole)
    }
}

impl fmt::Display for J2Oblateness {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "J2 of the central body")
    }
}

impl AccelModel for J2Oblateness {
    fn eom(
        &self,
        state: &SatelliteState,
        registry: &BodyRegistry,
    ) -> Result<Vector3<f64>, DynamicsError> {
        let body = registry.get(state.central).context(DynamicsConfigSnafu)?;
        if body.j2 == 0.0 {
            return Ok(Vector3::zeros());
        }
        ensure_regular(state.central, state.rmag_km()).context(DynamicsDomainSnafu)?;
        let gm = registry.gm(state.central).context(DynamicsConfigSnafu)?;
        let pole = registry
            .orientation(state.central, state.epoch)
            .context(DynamicsConfigSnafu)?
            * Vector3::z();
        Ok(Self::acceleration(
            body.j2,
            gm,
            body.equatorial_radius_km,
            &pole,
            &state.position_km,
        ))
    }
}
