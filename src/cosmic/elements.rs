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

use super::BodyId;
use crate::errors::{
    DegenerateSmaSnafu, DomainError, InvalidGmSnafu, KeplerDivergedSnafu, ParabolicSnafu,
    RectilinearSnafu, UnreachableAnomalySnafu, ZeroRadiusSnafu,
};
use crate::linalg::Vector3;
use crate::time::{Duration, Epoch, Unit};
use crate::utils::{between_0_tau, ensure_finite};
use snafu::ensure;
use std::f64::consts::{PI, TAU};
use std::fmt;

/// Below this eccentricity, the argument of periapsis is undefined and reported as zero.
pub const ECC_EPSILON: f64 = 1e-6;
/// Below this inclination (or this close to 180 degrees), the ascending node is undefined and reported as zero.
pub const INC_EPSILON: f64 = 1e-6;
/// Orbits this close to an eccentricity of one are treated as parabolic.
pub const PARABOLIC_EPSILON: f64 = 1e-10;
/// Radii and angular momenta below this are treated as zero.
pub const ZERO_EPSILON: f64 = 1e-10;

const KEPLER_TOLERANCE: f64 = 1e-14;
const KEPLER_MAX_ITER: usize = 64;

/// Classical Keplerian elements, in km and radians, referenced to a central body and an epoch.
///
/// For hyperbolic orbits the semi-major axis is negative.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct OrbitalElements {
    pub sma_km: f64,
    pub ecc: f64,
    pub inc_rad: f64,
    pub raan_rad: f64,
    /// For equatorial orbits, this is the longitude of periapsis.
    pub aop_rad: f64,
    /// For circular orbits, this is the argument of latitude (or the true longitude if also equatorial).
    pub ta_rad: f64,
    pub gm_km3_s2: f64,
    pub central: BodyId,
    pub epoch: Epoch,
    /// Set when the eccentricity is below `ECC_EPSILON`: periapsis is undefined.
    pub circular: bool,
    /// Set when the orbital plane is the reference plane: the ascending node is undefined.
    pub equatorial: bool,
}

impl OrbitalElements {
    /// Builds a set of elements from the mean anomaly instead of the true anomaly.
    #[allow(clippy::too_many_arguments)]
    pub fn from_mean_anomaly(
        sma_km: f64,
        ecc: f64,
        inc_rad: f64,
        raan_rad: f64,
        aop_rad: f64,
        ma_rad: f64,
        gm_km3_s2: f64,
        central: BodyId,
        epoch: Epoch,
    ) -> Result<Self, DomainError> {
        let ta_rad = mean_to_true_anomaly(ma_rad, ecc)?;
        Ok(Self::new(
            sma_km, ecc, inc_rad, raan_rad, aop_rad, ta_rad, gm_km3_s2, central, epoch,
        ))
    }

    /// Builds a set of elements from the true anomaly, flagging the degenerate geometries.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sma_km: f64,
        ecc: f64,
        inc_rad: f64,
        raan_rad: f64,
        aop_rad: f64,
        ta_rad: f64,
        gm_km3_s2: f64,
        central: BodyId,
        epoch: Epoch,
    ) -> Self {
        let inc = inc_rad.abs();
        Self {
            sma_km,
            ecc,
            inc_rad,
            raan_rad,
            aop_rad,
            ta_rad,
            gm_km3_s2,
            central,
            epoch,
            circular: ecc < ECC_EPSILON,
            equatorial: inc < INC_EPSILON || (inc - PI).abs() < INC_EPSILON,
        }
    }

    pub fn inc_deg(&self) -> f64 {
        self.inc_rad.to_degrees()
    }

    pub fn raan_deg(&self) -> f64 {
        self.raan_rad.to_degrees()
    }

    pub fn aop_deg(&self) -> f64 {
        self.aop_rad.to_degrees()
    }

    pub fn ta_deg(&self) -> f64 {
        self.ta_rad.to_degrees()
    }

    pub fn is_hyperbolic(&self) -> bool {
        self.ecc > 1.0
    }

    /// Semilatus rectum in km
    pub fn semi_parameter_km(&self) -> f64 {
        self.sma_km * (1.0 - self.ecc.powi(2))
    }

    pub fn periapsis_km(&self) -> f64 {
        self.sma_km * (1.0 - self.ecc)
    }

    /// Radius of apoapsis, infinite for open orbits.
    pub fn apoapsis_km(&self) -> f64 {
        if self.ecc < 1.0 {
            self.sma_km * (1.0 + self.ecc)
        } else {
            f64::INFINITY
        }
    }

    /// Specific orbital energy in km^2/s^2
    pub fn energy_km2_s2(&self) -> f64 {
        -self.gm_km3_s2 / (2.0 * self.sma_km)
    }

    /// Magnitude of the specific angular momentum in km^2/s
    pub fn hmag_km2_s(&self) -> f64 {
        (self.gm_km3_s2 * self.semi_parameter_km()).sqrt()
    }

    /// Mean motion in rad/s
    pub fn mean_motion_rad_s(&self) -> f64 {
        (self.gm_km3_s2 / self.sma_km.abs().powi(3)).sqrt()
    }

    /// Orbital period, if the orbit is closed.
    pub fn period(&self) -> Option<Duration> {
        if self.ecc < 1.0 && self.sma_km > 0.0 {
            Some(Unit::Second * (TAU / self.mean_motion_rad_s()))
        } else {
            None
        }
    }

    /// Eccentric anomaly in radians, or the hyperbolic anomaly for open orbits.
    pub fn ea_rad(&self) -> Result<f64, DomainError> {
        ensure!(
            (1.0 - self.ecc).abs() > PARABOLIC_EPSILON,
            ParabolicSnafu { ecc: self.ecc }
        );
        let (sin_ta, cos_ta) = self.ta_rad.sin_cos();
        if self.ecc < 1.0 {
            let denom = 1.0 + self.ecc * cos_ta;
            let sin_ea = (1.0 - self.ecc.powi(2)).sqrt() * sin_ta / denom;
            let cos_ea = (self.ecc + cos_ta) / denom;
            Ok(sin_ea.atan2(cos_ea))
        } else {
            let half = ((self.ecc - 1.0) / (self.ecc + 1.0)).sqrt() * (self.ta_rad / 2.0).tan();
            ensure!(
                half.abs() < 1.0,
                UnreachableAnomalySnafu {
                    ta_deg: self.ta_deg(),
                    ecc: self.ecc
                }
            );
            Ok(2.0 * half.atanh())
        }
    }

    /// Mean anomaly in radians
    pub fn ma_rad(&self) -> Result<f64, DomainError> {
        true_to_mean_anomaly(self.ta_rad, self.ecc)
    }

    /// Two-body propagation of these elements to another epoch.
    pub fn at_epoch(&self, new_epoch: Epoch) -> Result<Self, DomainError> {
        let ma = self.ma_rad()? + self.mean_motion_rad_s() * (new_epoch - self.epoch).to_seconds();
        let ma = if self.ecc < 1.0 { between_0_tau(ma) } else { ma };
        let ta_rad = mean_to_true_anomaly(ma, self.ecc)?;
        Ok(Self {
            ta_rad,
            epoch: new_epoch,
            ..*self
        })
    }
}

impl fmt::Display for OrbitalElements {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[{}] {}\tsma = {:.6} km\tecc = {:.6}\tinc = {:.6} deg\traan = {:.6} deg\taop = {:.6} deg\tta = {:.6} deg",
            self.central,
            self.epoch,
            self.sma_km,
            self.ecc,
            self.inc_deg(),
            self.raan_deg(),
            self.aop_deg(),
            self.ta_deg()
        )?;
        if self.circular {
            write!(f, " (circular)")?;
        }
        if self.equatorial {
            write!(f, " (equatorial)")?;
        }
        Ok(())
    }
}

/// Computes the Keplerian elements from a position and velocity about a body of gravitational parameter `gm`.
///
/// Near-circular and near-equatorial geometries are flagged on the returned elements: the undefined angles are
/// reported as zero and the anomaly is measured from the node (or from the X axis) instead.
pub fn state_to_elements(
    position_km: &Vector3<f64>,
    velocity_km_s: &Vector3<f64>,
    gm_km3_s2: f64,
    central: BodyId,
    epoch: Epoch,
) -> Result<OrbitalElements, DomainError> {
    ensure!(
        gm_km3_s2.is_finite() && gm_km3_s2 > 0.0,
        InvalidGmSnafu { gm: gm_km3_s2 }
    );
    ensure_finite(position_km, "computing orbital elements")?;
    ensure_finite(velocity_km_s, "computing orbital elements")?;

    let rmag = position_km.norm();
    ensure!(
        rmag > ZERO_EPSILON,
        ZeroRadiusSnafu {
            action: "computing orbital elements"
        }
    );
    let hvec = position_km.cross(velocity_km_s);
    let hmag = hvec.norm();
    ensure!(
        hmag > ZERO_EPSILON,
        RectilinearSnafu {
            action: "computing orbital elements"
        }
    );

    let vmag = velocity_km_s.norm();
    let evec = ((vmag.powi(2) - gm_km3_s2 / rmag) * position_km
        - position_km.dot(velocity_km_s) * velocity_km_s)
        / gm_km3_s2;
    let ecc = evec.norm();
    ensure!((1.0 - ecc).abs() > PARABOLIC_EPSILON, ParabolicSnafu { ecc });

    let energy = vmag.powi(2) / 2.0 - gm_km3_s2 / rmag;
    let sma_km = -gm_km3_s2 / (2.0 * energy);
    ensure!(sma_km.is_finite(), DegenerateSmaSnafu { sma_km });

    let inc_rad = (hvec[2] / hmag).clamp(-1.0, 1.0).acos();
    let circular = ecc < ECC_EPSILON;
    let retrograde = inc_rad > PI / 2.0;
    let equatorial = inc_rad < INC_EPSILON || (inc_rad - PI).abs() < INC_EPSILON;

    let nvec = Vector3::z().cross(&hvec);
    let nmag = nvec.norm();

    let raan_rad = if equatorial {
        0.0
    } else {
        let raan = (nvec[0] / nmag).clamp(-1.0, 1.0).acos();
        if nvec[1] < 0.0 {
            TAU - raan
        } else {
            raan
        }
    };

    // Angle in the reference plane, counted in the direction of motion.
    let planar_angle = |v: &Vector3<f64>| {
        let angle = v[1].atan2(v[0]);
        between_0_tau(if retrograde { -angle } else { angle })
    };

    let aop_rad = if circular {
        0.0
    } else if equatorial {
        warn!("equatorial orbit (inc = {inc_rad:e} rad): reporting the longitude of periapsis");
        planar_angle(&evec)
    } else {
        let aop = (nvec.dot(&evec) / (nmag * ecc)).clamp(-1.0, 1.0).acos();
        if evec[2] < 0.0 {
            TAU - aop
        } else {
            aop
        }
    };

    let ta_rad = if circular {
        if equatorial {
            planar_angle(position_km)
        } else {
            let aol = (nvec.dot(position_km) / (nmag * rmag))
                .clamp(-1.0, 1.0)
                .acos();
            if position_km[2] < 0.0 {
                TAU - aol
            } else {
                aol
            }
        }
    } else {
        let ta = (evec.dot(position_km) / (ecc * rmag)).clamp(-1.0, 1.0).acos();
        if position_km.dot(velocity_km_s) < 0.0 {
            TAU - ta
        } else {
            ta
        }
    };

    if circular {
        debug!("circular orbit (ecc = {ecc:e}): argument of periapsis reported as zero");
    }

    Ok(OrbitalElements {
        sma_km,
        ecc,
        inc_rad,
        raan_rad,
        aop_rad,
        ta_rad,
        gm_km3_s2,
        central,
        epoch,
        circular,
        equatorial,
    })
}

/// Closed-form two-body position and velocity on the orbit described by `elements`, at the provided true anomaly.
/// The anomaly stored in `elements` is ignored.
pub fn elements_to_state_at_true_anomaly(
    elements: &OrbitalElements,
    gm_km3_s2: f64,
    ta_rad: f64,
) -> Result<(Vector3<f64>, Vector3<f64>), DomainError> {
    ensure!(
        gm_km3_s2.is_finite() && gm_km3_s2 > 0.0,
        InvalidGmSnafu { gm: gm_km3_s2 }
    );
    let ecc = elements.ecc.abs();
    ensure!((1.0 - ecc).abs() > PARABOLIC_EPSILON, ParabolicSnafu { ecc });
    // Keep the semi-major axis sign consistent with the eccentricity
    let sma = if (ecc > 1.0) == (elements.sma_km > 0.0) {
        -elements.sma_km
    } else {
        elements.sma_km
    };
    if ecc > 1.0 {
        let ta = between_0_tau(ta_rad);
        let limit = PI - (1.0 / ecc).acos();
        ensure!(
            ta < limit || ta > TAU - limit,
            UnreachableAnomalySnafu {
                ta_deg: ta_rad.to_degrees(),
                ecc
            }
        );
    }
    let p = sma * (1.0 - ecc.powi(2));
    ensure!(
        p.is_finite() && p.abs() > ZERO_EPSILON,
        DegenerateSmaSnafu { sma_km: sma }
    );

    let radius = p / (1.0 + ecc * ta_rad.cos());
    let (sin_aop_ta, cos_aop_ta) = (elements.aop_rad + ta_rad).sin_cos();
    let (sin_inc, cos_inc) = elements.inc_rad.sin_cos();
    let (sin_raan, cos_raan) = elements.raan_rad.sin_cos();
    let (sin_aop, cos_aop) = elements.aop_rad.sin_cos();
    let (sin_ta, cos_ta) = ta_rad.sin_cos();

    let position = Vector3::new(
        radius * (cos_aop_ta * cos_raan - cos_inc * sin_aop_ta * sin_raan),
        radius * (cos_aop_ta * sin_raan + cos_inc * sin_aop_ta * cos_raan),
        radius * sin_aop_ta * sin_inc,
    );

    let sqrt_gm_p = (gm_km3_s2 / p).sqrt();
    let cos_ta_ecc = cos_ta + ecc;
    let velocity = Vector3::new(
        sqrt_gm_p * cos_ta_ecc * (-sin_aop * cos_raan - cos_inc * sin_raan * cos_aop)
            - sqrt_gm_p * sin_ta * (cos_aop * cos_raan - cos_inc * sin_raan * sin_aop),
        sqrt_gm_p * cos_ta_ecc * (-sin_aop * sin_raan + cos_inc * cos_raan * cos_aop)
            - sqrt_gm_p * sin_ta * (cos_aop * sin_raan + cos_inc * cos_raan * sin_aop),
        sqrt_gm_p * (cos_ta_ecc * sin_inc * cos_aop - sin_ta * sin_inc * sin_aop),
    );

    ensure_finite(&position, "converting elements to a state")?;
    ensure_finite(&velocity, "converting elements to a state")?;
    Ok((position, velocity))
}

/// Position and velocity at the anomaly stored in the elements.
pub fn elements_to_state(
    elements: &OrbitalElements,
) -> Result<(Vector3<f64>, Vector3<f64>), DomainError> {
    elements_to_state_at_true_anomaly(elements, elements.gm_km3_s2, elements.ta_rad)
}

/// Samples `num_points` positions on the two-body conic, evenly spaced in true anomaly.
/// Open orbits are sampled between their asymptotes. This ignores every perturbation.
pub fn sample_ellipse(
    elements: &OrbitalElements,
    num_points: usize,
) -> Result<Vec<Vector3<f64>>, DomainError> {
    if num_points == 0 {
        return Ok(Vec::new());
    }
    let (start, span, denom) = if elements.ecc < 1.0 {
        (0.0, TAU, num_points as f64)
    } else {
        // Stay clear of the asymptotes where the radius diverges
        let limit = 0.98 * (PI - (1.0 / elements.ecc).acos());
        (-limit, 2.0 * limit, (num_points.max(2) - 1) as f64)
    };
    (0..num_points)
        .map(|i| {
            let ta = start + span * (i as f64) / denom;
            elements_to_state_at_true_anomaly(elements, elements.gm_km3_s2, ta)
                .map(|(position, _)| position)
        })
        .collect()
}

/// Solves Kepler's equation for the true anomaly, for elliptic or hyperbolic orbits.
pub fn mean_to_true_anomaly(ma_rad: f64, ecc: f64) -> Result<f64, DomainError> {
    ensure!((1.0 - ecc).abs() > PARABOLIC_EPSILON, ParabolicSnafu { ecc });
    if ecc < 1.0 {
        let ma = between_0_tau(ma_rad);
        // Start from pi for highly eccentric orbits to avoid overshooting
        let mut ea = if ecc > 0.8 { PI } else { ma + ecc * ma.sin() };
        for _ in 0..KEPLER_MAX_ITER {
            let delta = (ea - ecc * ea.sin() - ma) / (1.0 - ecc * ea.cos());
            ea -= delta;
            if delta.abs() < KEPLER_TOLERANCE {
                let (sin_half, cos_half) = (ea / 2.0).sin_cos();
                let ta = 2.0 * ((1.0 + ecc).sqrt() * sin_half).atan2((1.0 - ecc).sqrt() * cos_half);
                return Ok(between_0_tau(ta));
            }
        }
    } else {
        let mut ha = (ma_rad / ecc).asinh();
        for _ in 0..KEPLER_MAX_ITER {
            let delta = (ecc * ha.sinh() - ha - ma_rad) / (ecc * ha.cosh() - 1.0);
            ha -= delta;
            if delta.abs() < KEPLER_TOLERANCE * ha.abs().max(1.0) {
                let ta = 2.0 * (((ecc + 1.0) / (ecc - 1.0)).sqrt() * (ha / 2.0).tanh()).atan();
                return Ok(ta);
            }
        }
    }
    KeplerDivergedSnafu {
        iterations: KEPLER_MAX_ITER,
    }
    .fail()
}

/// Converts a true anomaly into a mean anomaly (elliptic, wrapped to [0, 2 pi)) or hyperbolic mean anomaly.
pub fn true_to_mean_anomaly(ta_rad: f64, ecc: f64) -> Result<f64, DomainError> {
    ensure!((1.0 - ecc).abs() > PARABOLIC_EPSILON, ParabolicSnafu { ecc });
    if ecc < 1.0 {
        let (sin_half, cos_half) = (ta_rad / 2.0).sin_cos();
        let ea = 2.0 * ((1.0 - ecc).sqrt() * sin_half).atan2((1.0 + ecc).sqrt() * cos_half);
        Ok(between_0_tau(ea - ecc * ea.sin()))
    } else {
        let half = ((ecc - 1.0) / (ecc + 1.0)).sqrt() * (ta_rad / 2.0).tan();
        ensure!(
            half.abs() < 1.0,
            UnreachableAnomalySnafu {
                ta_deg: ta_rad.to_degrees(),
                ecc
            }
        );
        let ha = 2.0 * half.atanh();
        Ok(ecc * ha.sinh() - ha)
    }
}
