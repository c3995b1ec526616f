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

use super::state::SatelliteState;
use super::{BodyId, BodyKind, BodyRegistry};
use crate::io::{ConfigError, InvalidConfigSnafu};
use crate::linalg::Vector3;
use crate::time::Epoch;
use snafu::ensure;
use std::fmt;

/// Default hysteresis margin, as a fraction of the sphere of influence radius
pub const DEFAULT_SOI_HYSTERESIS: f64 = 0.01;

/// A change of central body.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SoiTransition {
    pub epoch: Epoch,
    pub from: BodyId,
    pub to: BodyId,
}

impl fmt::Display for SoiTransition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: central body {} -> {}", self.epoch, self.from, self.to)
    }
}

/// Output of the resolver: the central body and the state expressed in its inertial frame.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Resolution {
    pub central: BodyId,
    pub position_km: Vector3<f64>,
    pub velocity_km_s: Vector3<f64>,
}

/// Chooses which body is dynamically central for a satellite.
///
/// A satellite descends into the sphere of influence of a child body once it is closer than
/// `soi * (1 - hysteresis)`, and ascends to the dynamical parent once it is farther than `soi * (1 + hysteresis)`.
/// Descent is checked before ascent and at most one transition happens per call. Re-basing is an exact
/// translation by the relative state of the two bodies.
pub fn resolve_central_body(
    position_km: &Vector3<f64>,
    velocity_km_s: &Vector3<f64>,
    registry: &BodyRegistry,
    current: BodyId,
    epoch: Epoch,
    hysteresis: f64,
) -> Result<Resolution, ConfigError> {
    ensure!(
        (0.0..1.0).contains(&hysteresis),
        InvalidConfigSnafu {
            msg: format!("SOI hysteresis must be in [0, 1), got {hysteresis}")
        }
    );

    let primary;
    let candidates: &[BodyId] = if registry.kind(current)? == BodyKind::Barycenter {
        // Barycenters are transparent: the satellite belongs to the primary of the system
        primary = registry.soi_primary(current);
        primary.as_slice()
    } else {
        registry.soi_children(current)?
    };

    let mut best: Option<(BodyId, f64, Vector3<f64>, Vector3<f64>)> = None;
    for &child in candidates {
        let (r_child, v_child) = registry.relative_state(child, current, epoch)?;
        let distance = (position_km - r_child).norm();
        let threshold = registry.soi_radius(child)? * (1.0 - hysteresis);
        if distance < threshold && best.map_or(true, |(_, d, _, _)| distance < d) {
            best = Some((child, distance, r_child, v_child));
        }
    }

    if let Some((child, _, r_child, v_child)) = best {
        return Ok(Resolution {
            central: child,
            position_km: position_km - r_child,
            velocity_km_s: velocity_km_s - v_child,
        });
    }

    let soi = registry.soi_radius(current)?;
    if position_km.norm() > soi * (1.0 + hysteresis) {
        if let Some(parent) = registry.dynamical_parent(current)? {
            let (r_cur, v_cur) = registry.relative_state(current, parent, epoch)?;
            return Ok(Resolution {
                central: parent,
                position_km: position_km + r_cur,
                velocity_km_s: velocity_km_s + v_cur,
            });
        }
    }

    Ok(Resolution {
        central: current,
        position_km: *position_km,
        velocity_km_s: *velocity_km_s,
    })
}

/// Applies `resolve_central_body` to a satellite state in place, returning the transition if one happened.
pub fn resolve_state(
    state: &mut SatelliteState,
    registry: &BodyRegistry,
    hysteresis: f64,
) -> Result<Option<SoiTransition>, ConfigError> {
    let resolution = resolve_central_body(
        &state.position_km,
        &state.velocity_km_s,
        registry,
        state.central,
        state.epoch,
        hysteresis,
    )?;
    if resolution.central == state.central {
        return Ok(None);
    }
    let transition = SoiTransition {
        epoch: state.epoch,
        from: state.central,
        to: resolution.central,
    };
    info!("{transition}");
    state.central = resolution.central;
    state.position_km = resolution.position_km;
    state.velocity_km_s = resolution.velocity_km_s;
    Ok(Some(transition))
}
