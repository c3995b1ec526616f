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

extern crate rust_embed;

use self::rust_embed::RustEmbed;
use super::body::{Body, BodyEphemeris};
use super::cache::EphemerisCache;
use super::registry::{BodyRegistry, EphemerisMode};
use crate::io::{epoch_from_str, epoch_to_str, ConfigError, ConfigRepr, MissingAssetSnafu};
use crate::time::Epoch;
use serde_derive::{Deserialize, Serialize};
use snafu::OptionExt;

#[derive(RustEmbed)]
#[folder = "data/embed/"]
struct EmbeddedAsset;

const SOLAR_SYSTEM_ASSET: &str = "solar_system.yaml";

/// A catalog of bodies whose states are anchored at the catalog epoch, from which registry snapshots are built.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SolarSystemCatalog {
    #[serde(serialize_with = "epoch_to_str", deserialize_with = "epoch_from_str")]
    pub epoch: Epoch,
    pub bodies: Vec<Body>,
}

impl ConfigRepr for SolarSystemCatalog {}

impl SolarSystemCatalog {
    /// The solar system shipped with this library: barycenters, the Sun, the planets and their major moons.
    pub fn embedded() -> Result<Self, ConfigError> {
        let asset = EmbeddedAsset::get(SOLAR_SYSTEM_ASSET).context(MissingAssetSnafu {
            name: SOLAR_SYSTEM_ASSET,
        })?;
        Self::from_yaml(&String::from_utf8_lossy(&asset.data))
    }

    /// Parses a catalog from a YAML document.
    pub fn from_yaml(data: &str) -> Result<Self, ConfigError> {
        Self::loads(data)
    }

    /// Builds a registry anchored at the catalog epoch.
    pub fn registry(&self, mode: EphemerisMode) -> Result<BodyRegistry, ConfigError> {
        BodyRegistry::new(self.epoch, self.bodies.clone(), mode)
    }

    /// Builds a frozen registry at another epoch: every canonical orbit is propagated (two-body) to that epoch.
    ///
    /// The provided cache memoizes the state of each body relative to its parent, so that snapshots at
    /// repeated epochs do not solve Kepler's equation again.
    pub fn snapshot(
        &self,
        epoch: Epoch,
        cache: &mut EphemerisCache,
    ) -> Result<BodyRegistry, ConfigError> {
        let moving = self.registry(EphemerisMode::Keplerian)?;
        let mut bodies = Vec::with_capacity(self.bodies.len());
        for body in &self.bodies {
            let (position, velocity) = moving.state_wrt_parent_cached(body.id, epoch, cache)?;
            let mut frozen = body.clone();
            frozen.ephemeris = BodyEphemeris::Fixed {
                position_km: position.into(),
                velocity_km_s: velocity.into(),
            };
            bodies.push(frozen);
        }
        info!("built a snapshot of {} bodies at {epoch}", bodies.len());
        BodyRegistry::new(epoch, bodies, EphemerisMode::Frozen)
    }
}
