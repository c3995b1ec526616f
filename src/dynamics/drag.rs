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
use crate::cosmic::{BodyRegistry, SatelliteState};
use crate::errors::InvalidMassSnafu;
use crate::linalg::Vector3;
use snafu::ResultExt;
use std::fmt;

/// Converts `kg/m^3 * m^2 / kg * (km/s)^2` into km/s^2.
const DRAG_UNITS: f64 = 1e3;

/// First order drag in the exponential atmosphere of the central body:
///
/// `a = -1/2 rho(h) Cd A / m |v_rel| v_rel`
///
/// where `v_rel` is the velocity relative to the atmosphere. The altitude is measured above the mean radius of
/// the central body. Bodies without an atmosphere, or satellites without any area, feel no drag.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ExponentialDrag;

impl ExponentialDrag {
    /// Drag acceleration in km/s^2 for the provided density (kg/m^3), ballistic properties and relative velocity (km/s).
    pub fn acceleration(
        density_kg_m3: f64,
        cd: f64,
        area_m2: f64,
        mass_kg: f64,
        velocity_rel_km_s: &Vector3<f64>,
    ) -> Vector3<f64> {
        -0.5 * density_kg_m3 * cd * area_m2 / mass_kg
            * velocity_rel_km_s.norm()
            * velocity_rel_km_s
            * DRAG_UNITS
    }
}

impl fmt::Display for ExponentialDrag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "exponential atmosphere drag")
    }
}

impl AccelModel for ExponentialDrag {
    fn eom(
        &self,
        state: &SatelliteState,
        registry: &BodyRegistry,
    ) -> Result<Vector3<f64>, DynamicsError> {
        let body = registry.get(state.central).context(DynamicsConfigSnafu)?;
        let atmosphere = match &body.atmosphere {
            Some(atmosphere) if state.area_m2 > 0.0 => atmosphere,
            _ => return Ok(Vector3::zeros()),
        };
        let altitude_km = state.rmag_km() - body.mean_radius_km();
        let density = atmosphere.density_kg_m3(altitude_km);
        if density == 0.0 {
            return Ok(Vector3::zeros());
        }
        if !(state.mass_kg.is_finite() && state.mass_kg > 0.0) {
            return InvalidMassSnafu {
                mass_kg: state.mass_kg,
            }
            .fail()
            .context(DynamicsDomainSnafu);
        }
        let velocity_rel = if atmosphere.corotating {
            let omega = registry
                .angular_velocity(state.central, state.epoch)
                .context(DynamicsConfigSnafu)?;
            state.velocity_km_s - omega.cross(&state.position_km)
        } else {
            state.velocity_km_s
        };
        Ok(Self::acceleration(
            density,
            state.cd,
            state.area_m2,
            state.mass_kg,
            &velocity_rel,
        ))
    }
}
