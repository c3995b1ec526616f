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

use snafu::prelude::*;

mod cancel;
pub use cancel::CancelToken;
mod instance;
pub use instance::*;
mod options;
pub use options::*;
mod propagator;
pub use propagator::*;
mod request;
pub use request::*;
mod rk_methods;
pub use rk_methods::*;
mod sink;
pub use sink::TrajectorySink;
mod stepper;
pub use stepper::*;

use crate::{
    cosmic::TrajectorySample, dynamics::DynamicsError, errors::DomainError, io::ConfigError,
};

/// Propagation errors. Each carries enough to let the caller decide whether to retry with other parameters.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PropagationError {
    #[snafu(display("encountered a dynamics error {source} after {last_sample}"))]
    Dynamics {
        source: DynamicsError,
        last_sample: Box<TrajectorySample>,
    },
    #[snafu(display("state became non finite after {last_sample}: {source}"))]
    NonFiniteState {
        source: DomainError,
        last_sample: Box<TrajectorySample>,
    },
    #[snafu(display("propagation failed because {source}"))]
    PropConfig { source: ConfigError },
}

impl PropagationError {
    /// Last valid sample before an integration failure, `None` for configuration errors.
    pub fn last_sample(&self) -> Option<&TrajectorySample> {
        match self {
            Self::Dynamics { last_sample, .. } | Self::NonFiniteState { last_sample, .. } => {
                Some(last_sample.as_ref())
            }
            Self::PropConfig { .. } => None,
        }
    }
}
