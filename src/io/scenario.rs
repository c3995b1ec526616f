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

use super::{
    duration_from_str, duration_to_str, epoch_from_str, epoch_to_str, ConfigError, ConfigRepr,
    InvalidConfigSnafu, InvalidInitialStateSnafu,
};
use crate::cosmic::{
    elements_to_state, Body, BodyId, BodyRegistry, EphemerisCache, EphemerisMode, FrameError,
    FrameTransform, OrbitalElements, SatelliteState, SolarSystemCatalog, DEFAULT_SOI_HYSTERESIS,
};
use crate::dynamics::Perturbations;
use crate::linalg::Vector3;
use crate::propagators::{IntegratorKind, PropagationRequest};
use crate::time::{Duration, Epoch, Unit};
use serde_derive::{Deserialize, Serialize};
use snafu::prelude::*;
use std::str::FromStr;
use std::sync::Arc;

fn default_step() -> Duration {
    Unit::Minute * 1
}

fn default_integrator() -> String {
    IntegratorKind::default().name().to_string()
}

fn default_true() -> bool {
    true
}

fn default_hysteresis() -> f64 {
    DEFAULT_SOI_HYSTERESIS
}

fn default_cancel_interval() -> usize {
    100
}

fn default_mass() -> f64 {
    1.0
}

fn default_cd() -> f64 {
    2.2
}

/// A body designated either by its identifier or by its name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BodyRef {
    Id(BodyId),
    Name(String),
}

impl BodyRef {
    pub fn resolve(&self, registry: &BodyRegistry) -> Result<BodyId, ConfigError> {
        match self {
            Self::Id(id) => registry.get(*id).map(|body| body.id),
            Self::Name(name) => registry.id_by_name(name),
        }
    }
}

/// Initial conditions of the satellite, relative to its central body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InitialConditions {
    /// Position and velocity in the inertial frame of the central body
    Cartesian {
        position_km: [f64; 3],
        velocity_km_s: [f64; 3],
    },
    /// Classical elements, angles in degrees
    Keplerian {
        sma_km: f64,
        ecc: f64,
        inc_deg: f64,
        raan_deg: f64,
        aop_deg: f64,
        ta_deg: f64,
    },
    /// At rest on the rotating body, at the provided geodetic coordinates
    Geodetic {
        latitude_deg: f64,
        longitude_deg: f64,
        #[serde(default)]
        height_km: f64,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SatelliteConfig {
    pub central: BodyRef,
    pub initial: InitialConditions,
    #[serde(default = "default_mass")]
    pub mass_kg: f64,
    #[serde(default)]
    pub area_m2: f64,
    #[serde(default = "default_cd")]
    pub cd: f64,
}

/// A propagation scenario, as loaded from YAML.
///
/// ```yaml
/// epoch: 2024-01-01T00:00:00 UTC
/// satellite:
///   central: Earth
///   initial:
///     type: keplerian
///     sma_km: 7000.0
///     ecc: 0.001
///     inc_deg: 51.6
///     raan_deg: 0.0
///     aop_deg: 0.0
///     ta_deg: 0.0
/// duration: 1 day
/// integrator: verner56
/// ```
///
/// The bodies default to the embedded solar system catalog.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(serialize_with = "epoch_to_str", deserialize_with = "epoch_from_str")]
    pub epoch: Epoch,
    /// Inline bodies anchored at the scenario epoch, instead of the embedded catalog
    #[serde(default)]
    pub bodies: Option<Vec<Body>>,
    #[serde(default)]
    pub ephemeris: EphemerisMode,
    pub satellite: SatelliteConfig,
    #[serde(serialize_with = "duration_to_str", deserialize_with = "duration_from_str")]
    pub duration: Duration,
    #[serde(
        default = "default_step",
        serialize_with = "duration_to_str",
        deserialize_with = "duration_from_str"
    )]
    pub step: Duration,
    #[serde(default = "default_integrator")]
    pub integrator: String,
    #[serde(default)]
    pub perturbations: Perturbations,
    #[serde(default = "default_true")]
    pub soi_switching: bool,
    #[serde(default = "default_hysteresis")]
    pub soi_hysteresis: f64,
    #[serde(default = "default_cancel_interval")]
    pub cancel_check_interval: usize,
}

impl ConfigRepr for ScenarioConfig {}

impl ScenarioConfig {
    /// Builds the registry of this scenario at its epoch.
    ///
    /// A frozen registry is a snapshot of the catalog at the scenario epoch. A Keplerian registry moves every
    /// body from the catalog anchor epoch.
    pub fn registry(&self) -> Result<BodyRegistry, ConfigError> {
        let catalog = match &self.bodies {
            Some(bodies) => SolarSystemCatalog {
                epoch: self.epoch,
                bodies: bodies.clone(),
            },
            None => SolarSystemCatalog::embedded()?,
        };
        match self.ephemeris {
            EphemerisMode::Frozen if catalog.epoch != self.epoch => {
                catalog.snapshot(self.epoch, &mut EphemerisCache::default())
            }
            mode => catalog.registry(mode),
        }
    }

    /// Builds the initial state in the inertial frame of the central body.
    pub fn initial_state(&self, registry: &BodyRegistry) -> Result<SatelliteState, ConfigError> {
        let sat = &self.satellite;
        ensure!(
            sat.mass_kg.is_finite() && sat.mass_kg > 0.0,
            InvalidConfigSnafu {
                msg: format!("satellite mass must be positive, got {} kg", sat.mass_kg)
            }
        );
        ensure!(
            sat.area_m2.is_finite() && sat.area_m2 >= 0.0 && sat.cd.is_finite() && sat.cd >= 0.0,
            InvalidConfigSnafu {
                msg: format!(
                    "satellite area ({} m^2) and drag coefficient ({}) must not be negative",
                    sat.area_m2, sat.cd
                )
            }
        );
        let central = sat.central.resolve(registry)?;

        let state = match sat.initial {
            InitialConditions::Cartesian {
                position_km,
                velocity_km_s,
            } => SatelliteState::new(
                self.epoch,
                Vector3::from(position_km),
                Vector3::from(velocity_km_s),
                central,
            ),
            InitialConditions::Keplerian {
                sma_km,
                ecc,
                inc_deg,
                raan_deg,
                aop_deg,
                ta_deg,
            } => {
                let gm = registry.gm(central)?;
                let elements = OrbitalElements::new(
                    sma_km,
                    ecc,
                    inc_deg.to_radians(),
                    raan_deg.to_radians(),
                    aop_deg.to_radians(),
                    ta_deg.to_radians(),
                    gm,
                    central,
                    self.epoch,
                );
                let (position_km, velocity_km_s) =
                    elements_to_state(&elements).context(InvalidInitialStateSnafu)?;
                SatelliteState::new(self.epoch, position_km, velocity_km_s, central)
            }
            InitialConditions::Geodetic {
                latitude_deg,
                longitude_deg,
                height_km,
            } => FrameTransform::new(registry)
                .launch_state(latitude_deg, longitude_deg, height_km, central, self.epoch)
                .map_err(|e| match e {
                    FrameError::FrameConfig { source } => source,
                    FrameError::FrameDomain { source } => ConfigError::InvalidInitialState { source },
                })?,
        };
        Ok(state.with_drag(sat.mass_kg, sat.area_m2, sat.cd))
    }

    /// Validates the whole scenario and builds the corresponding propagation request.
    ///
    /// Unknown integrators, bodies and gravitational parameters are all reported here, before any step.
    pub fn to_request(&self) -> Result<PropagationRequest, ConfigError> {
        let integrator = IntegratorKind::from_str(&self.integrator)?;
        let registry = self.registry()?;
        let initial_state = self.initial_state(&registry)?;
        registry.gm(initial_state.central)?;

        ensure!(
            self.step > Duration::ZERO,
            InvalidConfigSnafu {
                msg: format!("step must be positive, got {}", self.step)
            }
        );
        ensure!(
            (0.0..1.0).contains(&self.soi_hysteresis),
            InvalidConfigSnafu {
                msg: format!("SOI hysteresis must be in [0, 1), got {}", self.soi_hysteresis)
            }
        );
        ensure!(
            self.cancel_check_interval > 0,
            InvalidConfigSnafu {
                msg: "cancellation check interval must be positive"
            }
        );

        info!(
            "scenario {}: {} with {} for {}",
            self.name.as_deref().unwrap_or("(unnamed)"),
            initial_state,
            integrator,
            self.duration
        );

        Ok(PropagationRequest::builder()
            .initial_state(initial_state)
            .registry(Arc::new(registry))
            .duration(self.duration)
            .step(self.step)
            .integrator(integrator)
            .perturbations(self.perturbations)
            .soi_switching(self.soi_switching)
            .soi_hysteresis(self.soi_hysteresis)
            .cancel_check_interval(self.cancel_check_interval)
            .build())
    }
}
