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

use super::gravity::point_mass_acceleration;
use super::{
    AccelModel, DynamicsConfigSnafu, DynamicsDomainSnafu, DynamicsError, ExponentialDrag,
    J2Oblateness, Perturbations, PointMassGravity,
};
use crate::cosmic::{BodyRegistry, SatelliteState};
use crate::errors::NonFiniteSnafu;
use crate::linalg::{Vector3, Vector6};
use crate::time::Unit;
use crate::utils::is_finite3;
use snafu::ResultExt;
use std::fmt;
use std::sync::Arc;

/// Time step in seconds of the central difference used for the jerk of the perturbations.
pub const DEFAULT_JERK_STEP_S: f64 = 1.0;

/// `OrbitalDynamics` provides the equations of motion of a satellite about its central body.
///
/// The point mass gravity of the central body is always included, the acceleration models are added to it.
#[derive(Clone)]
pub struct OrbitalDynamics {
    pub accel_models: Vec<Arc<dyn AccelModel>>,
    pub jerk_step_s: f64,
}

impl OrbitalDynamics {
    /// Initializes a OrbitalDynamics which does not simulate anything but the gravity of the central body.
    pub fn two_body() -> Self {
        Self::new(vec![])
    }

    /// Initialize orbital dynamics with a list of acceleration models
    pub fn new(accel_models: Vec<Arc<dyn AccelModel>>) -> Self {
        Self {
            accel_models,
            jerk_step_s: DEFAULT_JERK_STEP_S,
        }
    }

    /// Initialize new orbital mechanics with the provided model.
    pub fn with_model(accel_model: Arc<dyn AccelModel>) -> Self {
        Self::new(vec![accel_model])
    }

    /// Builds the models corresponding to the enabled perturbations.
    pub fn from_perturbations(perturbations: &Perturbations) -> Self {
        let mut me = Self::two_body();
        if perturbations.third_body {
            me.add_model(Arc::new(PointMassGravity::new(perturbations.significance)));
        }
        if perturbations.j2 {
            me.add_model(Arc::new(J2Oblateness));
        }
        if perturbations.drag {
            me.add_model(Arc::new(ExponentialDrag));
        }
        me
    }

    /// Add a model to the currently defined orbital dynamics, e.g. a relativistic correction.
    pub fn add_model(&mut self, accel_model: Arc<dyn AccelModel>) {
        self.accel_models.push(accel_model);
    }

    fn central_acceleration(
        &self,
        state: &SatelliteState,
        registry: &BodyRegistry,
    ) -> Result<(f64, Vector3<f64>), DynamicsError> {
        let gm = registry.gm(state.central).context(DynamicsConfigSnafu)?;
        let accel = point_mass_acceleration(gm, &state.position_km, state.central)
            .context(DynamicsDomainSnafu)?;
        Ok((gm, accel))
    }

    fn perturbations(
        &self,
        state: &SatelliteState,
        registry: &BodyRegistry,
    ) -> Result<Vector3<f64>, DynamicsError> {
        let mut accel = Vector3::zeros();
        for model in &self.accel_models {
            accel += model.eom(state, registry)?;
        }
        Ok(accel)
    }

    /// Total acceleration in km/s^2 of the satellite, in the inertial axes of its central body.
    pub fn acceleration(
        &self,
        state: &SatelliteState,
        registry: &BodyRegistry,
    ) -> Result<Vector3<f64>, DynamicsError> {
        let (_, central) = self.central_acceleration(state, registry)?;
        let accel = central + self.perturbations(state, registry)?;
        if !is_finite3(&accel) {
            return NonFiniteSnafu {
                action: "summing the accelerations",
            }
            .fail()
            .context(DynamicsDomainSnafu);
        }
        Ok(accel)
    }

    /// Time derivative of the acceleration in km/s^3.
    ///
    /// The central body term is differentiated analytically, the perturbations by a central difference along
    /// the local motion of the satellite.
    pub fn jerk(
        &self,
        state: &SatelliteState,
        registry: &BodyRegistry,
    ) -> Result<Vector3<f64>, DynamicsError> {
        let (gm, central) = self.central_acceleration(state, registry)?;
        let r = &state.position_km;
        let v = &state.velocity_km_s;
        let rmag = r.norm();
        let mut jerk = -gm * (v / rmag.powi(3) - 3.0 * r.dot(v) * r / rmag.powi(5));

        if !self.accel_models.is_empty() {
            let h = self.jerk_step_s;
            let accel = central + self.perturbations(state, registry)?;
            let shifted = |sign: f64| {
                let mut shifted = *state;
                shifted.epoch = state.epoch + Unit::Second * (sign * h);
                shifted.position_km = r + sign * h * v;
                shifted.velocity_km_s = v + sign * h * accel;
                shifted
            };
            let ahead = self.perturbations(&shifted(1.0), registry)?;
            let behind = self.perturbations(&shifted(-1.0), registry)?;
            jerk += (ahead - behind) / (2.0 * h);
        }

        if !is_finite3(&jerk) {
            return NonFiniteSnafu {
                action: "computing the jerk",
            }
            .fail()
            .context(DynamicsDomainSnafu);
        }
        Ok(jerk)
    }

    /// Derivative of the position and velocity vector.
    pub fn eom(
        &self,
        state: &SatelliteState,
        registry: &BodyRegistry,
    ) -> Result<Vector6<f64>, DynamicsError> {
        let accel = self.acceleration(state, registry)?;
        let v = &state.velocity_km_s;
        Ok(Vector6::new(v[0], v[1], v[2], accel[0], accel[1], accel[2]))
    }
}

impl Default for OrbitalDynamics {
    fn default() -> Self {
        Self::two_body()
    }
}

impl fmt::Display for OrbitalDynamics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let models: Vec<String> = self.accel_models.iter().map(|m| format!("{m}")).collect();
        if models.is_empty() {
            write!(f, "central point mass")
        } else {
            write!(f, "central point mass + {}", models.join(" + "))
        }
    }
}

impl fmt::Debug for OrbitalDynamics {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "OrbitalDynamics({self})")
    }
}
