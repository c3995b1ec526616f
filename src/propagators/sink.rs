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

use crate::cosmic::TrajectorySample;
use crate::md::Trajectory;
use std::sync::mpsc::Sender;

/// Receives the samples of an incremental propagation, batch by batch, in chronological order.
///
/// The sink owns whatever is done with the samples (storage, streaming, display).
pub trait TrajectorySink {
    fn accept(&mut self, batch: &[TrajectorySample]);
}

impl TrajectorySink for Vec<TrajectorySample> {
    fn accept(&mut self, batch: &[TrajectorySample]) {
        self.extend_from_slice(batch);
    }
}

impl TrajectorySink for Trajectory {
    fn accept(&mut self, batch: &[TrajectorySample]) {
        for sample in batch {
            self.push(*sample);
        }
    }
}

impl TrajectorySink for Sender<Vec<TrajectorySample>> {
    fn accept(&mut self, batch: &[TrajectorySample]) {
        if let Err(e) = self.send(batch.to_vec()) {
            warn!("{} when sending on channel", e)
        }
    }
}
