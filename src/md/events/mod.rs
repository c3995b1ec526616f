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
use crate::propagators::PropagationError;
use crate::time::Epoch;
use snafu::prelude::*;

mod apsis;
pub use apsis::*;
mod search;
pub use search::*;

#[derive(Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum DetectionError {
    /// Two consecutive extrema of the same kind: the sampling is too coarse for this orbit.
    #[snafu(display("two consecutive {kind} found, the second at {epoch}: resample the trajectory"))]
    AlternationViolated { kind: ApsisKind, epoch: Epoch },
    #[snafu(display("segment mixes central bodies {first} and {other}"))]
    MixedCentralBodies { first: BodyId, other: BodyId },
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum SearchError {
    #[snafu(display("apsis search failed: {source}"))]
    SearchDetection { source: DetectionError },
    #[snafu(display("apsis search could not extend the trajectory: {source}"))]
    SearchPropagation { source: PropagationError },
}
