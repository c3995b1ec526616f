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

use super::CancelToken;
use crate::cosmic::DEFAULT_SOI_HYSTERESIS;
use crate::io::{ConfigError, InvalidConfigSnafu};
use crate::time::{Duration, Unit};
use snafu::ensure;
use std::fmt;
use typed_builder::TypedBuilder;

/// PropOpts stores the integrator options: the fixed step, how the central body is switched, how often the
/// cancellation token is checked and how many samples are handed to a sink at once.
#[derive(Clone, Debug, TypedBuilder)]
#[builder(doc)]
pub struct PropOpts {
    #[builder(default_code = "60.0 * Unit::Second")]
    pub step: Duration,
    /// Switch the central body on sphere of influence crossings
    #[builder(default = true)]
    pub soi_switching: bool,
    /// Margin around the sphere of influence radius, as a fraction of that radius
    #[builder(default = DEFAULT_SOI_HYSTERESIS)]
    pub soi_hysteresis: f64,
    /// Number of steps between two checks of the cancellation token
    #[builder(default = 100)]
    pub cancel_check_interval: usize,
    /// Number of samples per batch handed to an incremental sink
    #[builder(default = 256)]
    pub batch_size: usize,
    #[builder(default, setter(strip_option))]
    pub cancel: Option<CancelToken>,
}

impl PropOpts {
    /// `with_fixed_step` initializes an `PropOpts` with the provided step and the default options otherwise.
    pub fn with_fixed_step(step: Duration) -> Self {
        Self::builder().step(step).build()
    }

    pub fn with_fixed_step_s(step: f64) -> Self {
        Self::with_fixed_step(step * Unit::Second)
    }

    /// Returns a string with the information about these options
    pub fn info(&self) -> String {
        format!("{self}")
    }

    /// Checked before any step is taken.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure!(
            self.step.abs() > Duration::ZERO,
            InvalidConfigSnafu {
                msg: "propagation step must not be zero"
            }
        );
        ensure!(
            (0.0..1.0).contains(&self.soi_hysteresis),
            InvalidConfigSnafu {
                msg: format!(
                    "SOI hysteresis must be in [0, 1), got {}",
                    self.soi_hysteresis
                )
            }
        );
        ensure!(
            self.cancel_check_interval > 0 && self.batch_size > 0,
            InvalidConfigSnafu {
                msg: "cancellation interval and batch size must be positive"
            }
        );
        Ok(())
    }
}

impl Default for PropOpts {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Display for PropOpts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fixed step: {}", self.step)?;
        if self.soi_switching {
            write!(f, ", SOI hysteresis: {}", self.soi_hysteresis)?;
        }
        if self.cancel.is_some() {
            write!(f, ", cancellable every {} steps", self.cancel_check_interval)?;
        }
        Ok(())
    }
}
