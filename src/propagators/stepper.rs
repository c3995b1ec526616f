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

use super::{Verner56, RK, RK4};
use crate::cosmic::{BodyRegistry, SatelliteState};
use crate::dynamics::{DynamicsError, OrbitalDynamics};
use crate::io::{ConfigError, UnknownIntegratorSnafu};
use crate::linalg::{Vector3, Vector6};
use crate::time::{Epoch, Unit};
use enum_iterator::Sequence;
use serde_derive::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fraction of the local time scale `|r| / |v|` used as the step of the default jerk finite difference.
const JERK_FRACTION: f64 = 1e-4;

/// Anything providing the acceleration of a satellite, in km/s^2, in the inertial frame of its central body.
pub trait AccelerationFn {
    fn acceleration(&self, state: &SatelliteState) -> Result<Vector3<f64>, DynamicsError>;

    /// Time derivative of the acceleration (km/s^3), by default a central difference along the local motion.
    fn jerk(&self, state: &SatelliteState) -> Result<Vector3<f64>, DynamicsError> {
        let accel = self.acceleration(state)?;
        let vmag = state.vmag_km_s();
        let h = if vmag > 0.0 {
            JERK_FRACTION * state.rmag_km() / vmag
        } else {
            1.0
        };
        let shifted = |sign: f64| {
            let mut shifted = *state;
            shifted.epoch = state.epoch + Unit::Second * (sign * h);
            shifted.position_km = state.position_km + sign * h * state.velocity_km_s;
            shifted.velocity_km_s = state.velocity_km_s + sign * h * accel;
            shifted
        };
        let ahead = self.acceleration(&shifted(1.0))?;
        let behind = self.acceleration(&shifted(-1.0))?;
        Ok((ahead - behind) / (2.0 * h))
    }
}

impl<F> AccelerationFn for F
where
    F: Fn(&SatelliteState) -> Result<Vector3<f64>, DynamicsError>,
{
    fn acceleration(&self, state: &SatelliteState) -> Result<Vector3<f64>, DynamicsError> {
        self(state)
    }
}

/// Orbital dynamics evaluated against one registry snapshot.
#[derive(Copy, Clone)]
pub struct BoundDynamics<'a> {
    pub dynamics: &'a OrbitalDynamics,
    pub registry: &'a BodyRegistry,
}

impl<'a> AccelerationFn for BoundDynamics<'a> {
    fn acceleration(&self, state: &SatelliteState) -> Result<Vector3<f64>, DynamicsError> {
        self.dynamics.acceleration(state, self.registry)
    }

    fn jerk(&self, state: &SatelliteState) -> Result<Vector3<f64>, DynamicsError> {
        self.dynamics.jerk(state, self.registry)
    }
}

/// The fixed step integration schemes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Sequence, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum IntegratorKind {
    /// Classical four stage Runge Kutta
    #[default]
    Rk4,
    /// Eight stage Verner 6(5), advancing with the sixth order solution
    Verner56,
    /// Kick-drift-kick symplectic leapfrog
    Leapfrog,
    /// Fourth order Hermite predictor-corrector, using the jerk
    Hermite,
}

impl IntegratorKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Rk4 => "rk4",
            Self::Verner56 => "verner56",
            Self::Leapfrog => "leapfrog",
            Self::Hermite => "hermite",
        }
    }
}

impl fmt::Display for IntegratorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for IntegratorKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace(['-', '_', ' '], "");
        enum_iterator::all::<Self>()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| UnknownIntegratorSnafu { name: s }.build())
    }
}

impl TryFrom<String> for IntegratorKind {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<IntegratorKind> for String {
    fn from(kind: IntegratorKind) -> Self {
        kind.name().to_string()
    }
}

/// A fixed step integrator with its working vectors allocated once.
///
/// Stepping is deterministic: the same inputs always produce the same output.
#[derive(Clone, Debug)]
pub struct Stepper {
    kind: IntegratorKind,
    order: u8,
    stages: usize,
    a_coeffs: &'static [f64],
    b_coeffs: &'static [f64],
    k: Vec<Vector6<f64>>,
    /// State returned by the previous leapfrog step and the acceleration of its closing kick
    last_accel: Option<(SatelliteState, Vector3<f64>)>,
}

impl Stepper {
    pub fn new(kind: IntegratorKind) -> Self {
        match kind {
            IntegratorKind::Verner56 => Self::from_table::<Verner56>(kind),
            _ => Self::from_table::<RK4>(kind),
        }
    }

    fn from_table<T: RK>(kind: IntegratorKind) -> Self {
        Self {
            kind,
            order: T::ORDER,
            stages: T::STAGES,
            a_coeffs: T::A_COEFFS,
            b_coeffs: T::B_COEFFS,
            k: vec![Vector6::zeros(); T::STAGES],
            last_accel: None,
        }
    }

    pub fn kind(&self) -> IntegratorKind {
        self.kind
    }

    /// Order of the local truncation error of the scheme
    pub fn order(&self) -> u8 {
        match self.kind {
            IntegratorKind::Rk4 | IntegratorKind::Verner56 => self.order,
            IntegratorKind::Leapfrog => 2,
            IntegratorKind::Hermite => 4,
        }
    }

    /// Forgets the acceleration carried over between leapfrog steps. Required before stepping with other forces.
    pub fn reset(&mut self) {
        self.last_accel = None;
    }

    /// Advances the state by `dt` seconds (negative for backward propagation), without changing its central body.
    pub fn step<F: AccelerationFn + ?Sized>(
        &mut self,
        state: &SatelliteState,
        dt: f64,
        forces: &F,
    ) -> Result<SatelliteState, DynamicsError> {
        match self.kind {
            IntegratorKind::Rk4 | IntegratorKind::Verner56 => self.runge_kutta(state, dt, forces),
            IntegratorKind::Leapfrog => self.leapfrog(state, dt, forces),
            IntegratorKind::Hermite => hermite(state, dt, forces),
        }
    }

    fn derivative<F: AccelerationFn + ?Sized>(
        state: &SatelliteState,
        epoch: Epoch,
        y: &Vector6<f64>,
        forces: &F,
    ) -> Result<Vector6<f64>, DynamicsError> {
        let mut ctx = *state;
        ctx.set(epoch, y);
        let accel = forces.acceleration(&ctx)?;
        Ok(Vector6::new(y[3], y[4], y[5], accel[0], accel[1], accel[2]))
    }

    fn runge_kutta<F: AccelerationFn + ?Sized>(
        &mut self,
        state: &SatelliteState,
        dt: f64,
        forces: &F,
    ) -> Result<SatelliteState, DynamicsError> {
        let y0 = state.to_vector();
        self.k[0] = Self::derivative(state, state.epoch, &y0, forces)?;
        let mut a_idx: usize = 0;
        for i in 1..self.stages {
            // c_i is the sum of the a_ij of this row
            let mut ci = 0.0;
            let mut wi = Vector6::zeros();
            for kj in &self.k[0..i] {
                let a_ij = self.a_coeffs[a_idx];
                ci += a_ij;
                wi += a_ij * kj;
                a_idx += 1;
            }
            let epoch = state.epoch + Unit::Second * (ci * dt);
            self.k[i] = Self::derivative(state, epoch, &(y0 + dt * wi), forces)?;
        }
        let mut delta = Vector6::zeros();
        for (bi, ki) in self.b_coeffs[..self.stages].iter().zip(&self.k) {
            delta += *bi * ki;
        }
        let mut next = *state;
        next.set(state.epoch + Unit::Second * dt, &(y0 + dt * delta));
        Ok(next)
    }

    fn leapfrog<F: AccelerationFn + ?Sized>(
        &mut self,
        state: &SatelliteState,
        dt: f64,
        forces: &F,
    ) -> Result<SatelliteState, DynamicsError> {
        // First same as last, only when continuing from the exact state the previous step returned
        let accel = match self.last_accel {
            Some((ref last, accel)) if last == state => accel,
            _ => forces.acceleration(state)?,
        };
        let mut next = *state;
        next.velocity_km_s = state.velocity_km_s + 0.5 * dt * accel;
        next.position_km = state.position_km + dt * next.velocity_km_s;
        next.epoch = state.epoch + Unit::Second * dt;
        let accel_next = forces.acceleration(&next)?;
        next.velocity_km_s += 0.5 * dt * accel_next;
        self.last_accel = Some((next, accel_next));
        Ok(next)
    }
}

/// Fourth order Hermite predictor-corrector (PEC).
fn hermite<F: AccelerationFn + ?Sized>(
    state: &SatelliteState,
    dt: f64,
    forces: &F,
) -> Result<SatelliteState, DynamicsError> {
    let (r0, v0) = (state.position_km, state.velocity_km_s);
    let a0 = forces.acceleration(state)?;
    let j0 = forces.jerk(state)?;
    let dt2 = dt * dt;

    let mut predicted = *state;
    predicted.epoch = state.epoch + Unit::Second * dt;
    predicted.position_km = r0 + v0 * dt + a0 * (dt2 / 2.0) + j0 * (dt2 * dt / 6.0);
    predicted.velocity_km_s = v0 + a0 * dt + j0 * (dt2 / 2.0);

    let a1 = forces.acceleration(&predicted)?;
    let j1 = forces.jerk(&predicted)?;

    let mut next = predicted;
    next.velocity_km_s = v0 + (a0 + a1) * (dt / 2.0) + (j0 - j1) * (dt2 / 12.0);
    next.position_km = r0 + (v0 + next.velocity_km_s) * (dt / 2.0) + (a0 - a1) * (dt2 / 12.0);
    Ok(next)
}

impl fmt::Display for Stepper {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} (order {})", self.kind, self.order())
    }
}
