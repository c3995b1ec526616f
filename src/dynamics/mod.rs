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

use crate::cosmic::{BodyRegistry, SatelliteState};
use crate::errors::DomainError;
use crate::io::ConfigError;
use crate::linalg::Vector3;
use serde_derive::{Deserialize, Serialize};
use snafu::Snafu;
use std::fmt;
use typed_builder::TypedBuilder;

/// Point-mass gravity of the central body and, optionally, of the significant third bodies.
///
/// The central body is always included by [`OrbitalDynamics`], this module provides the third bodies.
pub mod gravity;
pub use self::gravity::*;

/// J2 zonal harmonic of the central body.
pub mod oblateness;
pub use self::oblateness::*;

/// Atmospheric drag models.
pub mod drag;
pub use self::drag::*;

/// Cartesian orbital dynamics: the sum of every acceleration model.
pub mod orbital;
pub use self::orbital::*;

/// A trait for immutable dynamics that return an acceleration (e.g. third body gravity, drag).
///
/// The returned acceleration is in km/s^2, in the inertial axes of the central body of the state.
/// Models never mutate the registry.
pub trait AccelModel: Send + Sync + fmt::Display {
    /// Defines the equations of motion for this acceleration model.
    fn eom(
        &self,
        state: &SatelliteState,
        registry: &BodyRegistry,
    ) -> Result<Vector3<f64>, DynamicsError>;
}

/// Dynamical model errors.
#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DynamicsError {
    /// Degenerate geometry, for example a satellite at the center of a gravity source.
    #[snafu(display("dynamical model encountered degenerate geometry: {source}"))]
    DynamicsDomain { source: DomainError },
    /// The registry does not provide what the model needs.
    #[snafu(display("dynamical model issue due to the registry: {source}"))]
    DynamicsConfig { source: ConfigError },
}

/// Default relative threshold below which a third body is ignored, compared to the central body acceleration.
pub const DEFAULT_SIGNIFICANCE: f64 = 1e-7;

fn default_significance() -> f64 {
    DEFAULT_SIGNIFICANCE
}

/// Which perturbations are added on top of the central body's point mass gravity.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[builder(doc)]
pub struct Perturbations {
    /// J2 oblateness of the central body
    #[builder(default = false)]
    #[serde(default)]
    pub j2: bool,
    /// Exponential atmosphere drag of the central body
    #[builder(default = false)]
    #[serde(default)]
    pub drag: bool,
    /// Point mass gravity of the other bodies of the registry
    #[builder(default = false)]
    #[serde(default)]
    pub third_body: bool,
    /// Relative significance threshold for third bodies, see [`PointMassGravity`]
    #[builder(default = DEFAULT_SIGNIFICANCE)]
    #[serde(default = "default_significance")]
    pub significance: f64,
}

impl Perturbations {
    /// Only the central body's point mass
    pub fn none() -> Self {
        Self::builder().build()
    }

    /// J2, drag and third bodies
    pub fn all() -> Self {
        Self::builder().j2(true).drag(true).third_body(true).build()
    }
}

impl Default for Perturbations {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Display for Perturbations {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut names = vec!["point mass"];
        if self.j2 {
            names.push("J2");
        }
        if self.drag {
            names.push("drag");
        }
        if self.third_body {
            names.push("third bodies");
        }
        write!(f, "{}", names.join(" + "))
    }
}
