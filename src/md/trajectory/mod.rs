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

use crate::cosmic::{BodyId, FrameError};
use crate::time::Epoch;
use snafu::prelude::*;

mod interpolation;
pub use interpolation::hermite_interpolate;
mod traj;
pub use traj::*;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TrajError {
    #[snafu(display("no interpolation data at {epoch}"))]
    NoInterpolationData { epoch: Epoch },
    #[snafu(display("{epoch} falls in the step where the central body changed from {from} to {to}"))]
    AcrossTransition {
        epoch: Epoch,
        from: BodyId,
        to: BodyId,
    },
    #[snafu(display("could not change the frame of the trajectory: {source}"))]
    TrajFrame { source: FrameError },
}
