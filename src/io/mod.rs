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

use crate::cosmic::BodyId;
use crate::errors::DomainError;
use crate::time::{Duration, Epoch};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde::{Serialize, Serializer};
use snafu::prelude::*;
use std::fmt::Debug;
use std::fs::File;
use std::io;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

/// Compact fixed-width binary records of satellite states
pub mod record;
/// Propagation scenarios described in YAML
pub mod scenario;

/// Configuration errors are raised before any stepping begins.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    #[snafu(display("failed to read configuration file: {source}"))]
    ReadFile { source: io::Error },
    #[snafu(display("failed to parse YAML configuration: {source}"))]
    ParseYaml { source: serde_yaml::Error },
    #[snafu(display("body {id} is not in the registry"))]
    MissingBody { id: BodyId },
    #[snafu(display("no body named `{name}` in the registry"))]
    UnknownBodyName { name: String },
    #[snafu(display("body {id} has no gravitational parameter but is not a barycenter"))]
    MissingGm { id: BodyId },
    #[snafu(display("body {id} has an invalid gravitational parameter of {gm} km^3/s^2"))]
    InvalidGm { id: BodyId, gm: f64 },
    #[snafu(display("body {id} is defined more than once"))]
    DuplicateBody { id: BodyId },
    #[snafu(display("invalid body hierarchy: {reason}"))]
    InvalidHierarchy { reason: String },
    #[snafu(display("unknown integrator `{name}`"))]
    UnknownIntegrator { name: String },
    #[snafu(display("invalid configuration: {msg}"))]
    InvalidConfig { msg: String },
    #[snafu(display("body {id} is invalid: {source}"))]
    InvalidBody { id: BodyId, source: DomainError },
    #[snafu(display("initial state cannot be built: {source}"))]
    InvalidInitialState { source: DomainError },
    #[snafu(display("embedded asset `{name}` is missing"))]
    MissingAsset { name: String },
}

impl PartialEq for ConfigError {
    /// No two configuration errors match
    fn eq(&self, _other: &Self) -> bool {
        false
    }
}

pub trait ConfigRepr: Debug + Sized + Serialize + DeserializeOwned {
    /// Builds the configuration representation from the path to a yaml
    fn load<P>(path: P) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
    {
        let file = File::open(path).context(ReadFileSnafu)?;
        let reader = BufReader::new(file);

        serde_yaml::from_reader(reader).context(ParseYamlSnafu)
    }

    /// Builds a sequence of "Selves" from the provided path to a yaml
    fn load_many<P>(path: P) -> Result<Vec<Self>, ConfigError>
    where
        P: AsRef<Path>,
    {
        let file = File::open(path).context(ReadFileSnafu)?;
        let reader = BufReader::new(file);

        serde_yaml::from_reader(reader).context(ParseYamlSnafu)
    }

    /// Builds "Self" from the provided string of a yaml
    fn loads(data: &str) -> Result<Self, ConfigError> {
        debug!("Loading YAML:\n{data}");
        serde_yaml::from_str(data).context(ParseYamlSnafu)
    }

    /// Builds a sequence of "Selves" from the provided string of a yaml
    fn loads_many(data: &str) -> Result<Vec<Self>, ConfigError> {
        debug!("Loading YAML:\n{data}");
        serde_yaml::from_str(data).context(ParseYamlSnafu)
    }
}

pub(crate) fn epoch_to_str<S>(epoch: &Epoch, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format!("{epoch}"))
}

/// A deserializer from Epoch string
pub(crate) fn epoch_from_str<'de, D>(deserializer: D) -> Result<Epoch, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Epoch::from_str(&s).map_err(serde::de::Error::custom)
}

pub(crate) fn duration_to_str<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&format!("{duration}"))
}

/// A deserializer from Duration string
pub(crate) fn duration_from_str<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Duration::from_str(&s).map_err(serde::de::Error::custom)
}
