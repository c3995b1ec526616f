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

use super::rotations::RotationModel;
use crate::linalg::Vector3;
use serde_derive::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a body, following the NAIF numbering (0 is the solar system barycenter, 399 is the Earth).
pub type BodyId = i32;

/// Newtonian constant of gravitation in km^3 / (kg s^2)
pub const GRAVITATIONAL_CONSTANT_KM3_KG_S2: f64 = 6.674_30e-20;

/// The role of a body in the hierarchy, resolved once when the registry is built.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BodyKind {
    Star,
    Planet,
    Moon,
    /// A massless point (center of mass of a system), never a gravity source.
    Barycenter,
}

/// An exponential atmosphere `rho(h) = rho0 exp(-h / H)`, with `h` the altitude above the mean radius.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExponentialAtmosphere {
    /// Density at zero altitude, in kg/m^3
    pub surface_density_kg_m3: f64,
    pub scale_height_km: f64,
    /// Above this altitude the density is taken as zero.
    pub ceiling_km: f64,
    /// If set, the atmosphere rotates with the body and drag acts on the velocity relative to it.
    #[serde(default = "default_true")]
    pub corotating: bool,
}

fn default_true() -> bool {
    true
}

impl ExponentialAtmosphere {
    /// Earth atmosphere with a 500 km drag ceiling
    pub fn earth() -> Self {
        Self {
            surface_density_kg_m3: 1.225,
            scale_height_km: 8.5,
            ceiling_km: 500.0,
            corotating: true,
        }
    }

    /// Density in kg/m^3 at the provided altitude in km
    pub fn density_kg_m3(&self, altitude_km: f64) -> f64 {
        if altitude_km > self.ceiling_km {
            0.0
        } else {
            self.surface_density_kg_m3 * (-altitude_km / self.scale_height_km).exp()
        }
    }
}

/// Keplerian elements of a body about its parent at the reference epoch of its catalog.
/// Angles are in degrees, as they are typed in catalogs.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanonicalOrbit {
    #[serde(rename = "a")]
    pub sma_km: f64,
    #[serde(rename = "e")]
    pub ecc: f64,
    #[serde(rename = "i")]
    pub inc_deg: f64,
    #[serde(rename = "Omega")]
    pub raan_deg: f64,
    #[serde(rename = "omega")]
    pub aop_deg: f64,
    #[serde(rename = "M0")]
    pub ma_deg: f64,
}

/// How the state of a body relative to its parent is obtained.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyEphemeris {
    /// Constant position (km) and velocity (km/s) with respect to the parent.
    Fixed {
        position_km: [f64; 3],
        velocity_km_s: [f64; 3],
    },
    /// Two-body orbit about the parent, anchored at the registry epoch.
    Orbit(CanonicalOrbit),
    /// Sits at the mass balance point of the siblings, so that the parent barycenter is the center of mass.
    Balance,
}

impl Default for BodyEphemeris {
    fn default() -> Self {
        Self::Fixed {
            position_km: [0.0; 3],
            velocity_km_s: [0.0; 3],
        }
    }
}

/// A natural body or a barycenter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub id: BodyId,
    pub name: String,
    /// Parent in the hierarchy, `None` only for the root.
    #[serde(default)]
    pub parent: Option<BodyId>,
    /// Gravitational parameter in km^3/s^2, absent for barycenters.
    #[serde(default, rename = "gm")]
    pub gm_km3_s2: Option<f64>,
    #[serde(default, rename = "r_eq")]
    pub equatorial_radius_km: f64,
    /// Defaults to the equatorial radius (spherical body).
    #[serde(default, rename = "r_polar")]
    pub polar_radius_km: Option<f64>,
    /// Unnormalized J2 zonal coefficient
    #[serde(default)]
    pub j2: f64,
    #[serde(default)]
    pub rotation: Option<RotationModel>,
    /// Sphere of influence radius in km, defaults to the Laplace radius
    #[serde(default, rename = "soi")]
    pub soi_radius_km: Option<f64>,
    #[serde(default)]
    pub atmosphere: Option<ExponentialAtmosphere>,
    #[serde(default)]
    pub ephemeris: BodyEphemeris,
    /// Forces the classification instead of inferring it from the hierarchy.
    #[serde(default)]
    pub kind: Option<BodyKind>,
}

impl Body {
    /// A barycenter or a massless point attached to `parent`.
    pub fn new(id: BodyId, name: &str, parent: Option<BodyId>) -> Self {
        Self {
            id,
            name: name.to_string(),
            parent,
            gm_km3_s2: None,
            equatorial_radius_km: 0.0,
            polar_radius_km: None,
            j2: 0.0,
            rotation: None,
            soi_radius_km: None,
            atmosphere: None,
            ephemeris: BodyEphemeris::default(),
            kind: None,
        }
    }

    pub fn with_gm(mut self, gm_km3_s2: f64) -> Self {
        self.gm_km3_s2 = Some(gm_km3_s2);
        self
    }

    /// Sets the gravitational parameter from the mass as G·m.
    pub fn with_mass(mut self, mass_kg: f64) -> Self {
        self.gm_km3_s2 = Some(GRAVITATIONAL_CONSTANT_KM3_KG_S2 * mass_kg);
        self
    }

    pub fn with_radii(mut self, equatorial_km: f64, polar_km: f64) -> Self {
        self.equatorial_radius_km = equatorial_km;
        self.polar_radius_km = Some(polar_km);
        self
    }

    pub fn with_radius(mut self, radius_km: f64) -> Self {
        self.equatorial_radius_km = radius_km;
        self.polar_radius_km = None;
        self
    }

    pub fn with_j2(mut self, j2: f64) -> Self {
        self.j2 = j2;
        self
    }

    pub fn with_rotation(mut self, rotation: RotationModel) -> Self {
        self.rotation = Some(rotation);
        self
    }

    pub fn with_soi(mut self, soi_radius_km: f64) -> Self {
        self.soi_radius_km = Some(soi_radius_km);
        self
    }

    pub fn with_atmosphere(mut self, atmosphere: ExponentialAtmosphere) -> Self {
        self.atmosphere = Some(atmosphere);
        self
    }

    pub fn with_kind(mut self, kind: BodyKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_ephemeris(mut self, ephemeris: BodyEphemeris) -> Self {
        self.ephemeris = ephemeris;
        self
    }

    /// Places this body at a fixed position and velocity relative to its parent.
    pub fn at(mut self, position_km: Vector3<f64>, velocity_km_s: Vector3<f64>) -> Self {
        self.ephemeris = BodyEphemeris::Fixed {
            position_km: position_km.into(),
            velocity_km_s: velocity_km_s.into(),
        };
        self
    }

    /// Whether this body attracts anything
    pub fn is_massive(&self) -> bool {
        self.gm_km3_s2.map_or(false, |gm| gm > 0.0)
    }

    /// Mass in kg derived from the gravitational parameter
    pub fn mass_kg(&self) -> Option<f64> {
        self.gm_km3_s2.map(|gm| gm / GRAVITATIONAL_CONSTANT_KM3_KG_S2)
    }

    pub fn polar_radius_km(&self) -> f64 {
        self.polar_radius_km.unwrap_or(self.equatorial_radius_km)
    }

    /// Volumetric mean radius of the ellipsoid, `(2 a + c) / 3`
    pub fn mean_radius_km(&self) -> f64 {
        (2.0 * self.equatorial_radius_km + self.polar_radius_km()) / 3.0
    }

    /// Flattening of the reference ellipsoid
    pub fn flattening(&self) -> f64 {
        if self.equatorial_radius_km > 0.0 {
            (self.equatorial_radius_km - self.polar_radius_km()) / self.equatorial_radius_km
        } else {
            0.0
        }
    }
}

impl fmt::Display for Body {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
