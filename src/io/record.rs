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

extern crate bytes;

use self::bytes::{Buf, BufMut, Bytes, BytesMut};
use crate::cosmic::{Frame, FrameKind, SatelliteState, TrajectorySample};
use crate::linalg::Vector3;
use crate::propagators::TrajectorySink;
use crate::time::Epoch;
use snafu::prelude::*;

/// Size in bytes of one encoded state record.
pub const STATE_RECORD_LEN: usize = 4 + 4 + 1 + 8 + 6 * 8;

#[derive(Clone, Debug, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RecordError {
    #[snafu(display("state record needs {STATE_RECORD_LEN} bytes but got {len}"))]
    Truncated { len: usize },
    #[snafu(display("unknown frame tag {tag} in state record"))]
    UnknownFrameTag { tag: u8 },
}

/// A frame- and unit-tagged state, encoded as a fixed width little endian record:
///
/// | field | type |
/// |---|---|
/// | satellite id | u32 |
/// | center body | i32 |
/// | frame kind tag | u8 |
/// | epoch, TDB seconds past J2000 | f64 |
/// | position (km) | 3 x f64 |
/// | velocity (km/s) | 3 x f64 |
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StateRecord {
    pub satellite_id: u32,
    pub frame: Frame,
    pub epoch: Epoch,
    pub position_km: Vector3<f64>,
    pub velocity_km_s: Vector3<f64>,
}

impl StateRecord {
    /// Record of a satellite state, in the inertial frame of its central body.
    pub fn from_state(satellite_id: u32, state: &SatelliteState) -> Self {
        Self::from_sample(satellite_id, &state.sample())
    }

    pub fn from_sample(satellite_id: u32, sample: &TrajectorySample) -> Self {
        Self {
            satellite_id,
            frame: Frame::inertial(sample.central),
            epoch: sample.epoch,
            position_km: sample.position_km,
            velocity_km_s: sample.velocity_km_s,
        }
    }

    /// Trajectory sample of this record, if it is expressed in the inertial frame of a body.
    pub fn to_sample(&self) -> Option<TrajectorySample> {
        (self.frame.kind == FrameKind::PlanetInertial).then_some(TrajectorySample {
            epoch: self.epoch,
            position_km: self.position_km,
            velocity_km_s: self.velocity_km_s,
            central: self.frame.center,
        })
    }

    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(STATE_RECORD_LEN);
        self.encode_into(&mut buf);
        buf.freeze()
    }

    /// Appends this record to a buffer, for streaming many records at once.
    pub fn encode_into(&self, buf: &mut BytesMut) {
        buf.reserve(STATE_RECORD_LEN);
        buf.put_u32_le(self.satellite_id);
        buf.put_i32_le(self.frame.center);
        buf.put_u8(self.frame.kind.tag());
        buf.put_f64_le(self.epoch.to_tdb_seconds());
        for value in self.position_km.iter().chain(self.velocity_km_s.iter()) {
            buf.put_f64_le(*value);
        }
    }

    /// Decodes one record from the front of the buffer, advancing it past the record.
    pub fn decode<B: Buf>(buf: &mut B) -> Result<Self, RecordError> {
        ensure!(
            buf.remaining() >= STATE_RECORD_LEN,
            TruncatedSnafu {
                len: buf.remaining()
            }
        );
        let satellite_id = buf.get_u32_le();
        let center = buf.get_i32_le();
        let tag = buf.get_u8();
        let kind = FrameKind::from_tag(tag).context(UnknownFrameTagSnafu { tag })?;
        let epoch = Epoch::from_tdb_seconds(buf.get_f64_le());
        let mut values = [0.0; 6];
        for value in values.iter_mut() {
            *value = buf.get_f64_le();
        }
        Ok(Self {
            satellite_id,
            frame: Frame { center, kind },
            epoch,
            position_km: Vector3::new(values[0], values[1], values[2]),
            velocity_km_s: Vector3::new(values[3], values[4], values[5]),
        })
    }

    /// Decodes a stream of concatenated records.
    pub fn decode_all(data: &[u8]) -> Result<Vec<Self>, RecordError> {
        let mut buf = data;
        let mut records = Vec::with_capacity(data.len() / STATE_RECORD_LEN);
        while buf.has_remaining() {
            records.push(Self::decode(&mut buf)?);
        }
        Ok(records)
    }
}

/// Streams the samples of a propagation as encoded state records of one satellite.
#[derive(Clone, Debug, Default)]
pub struct RecordSink {
    pub satellite_id: u32,
    pub buf: BytesMut,
}

impl RecordSink {
    pub fn new(satellite_id: u32) -> Self {
        Self {
            satellite_id,
            buf: BytesMut::new(),
        }
    }

    /// Number of complete records written so far.
    pub fn len(&self) -> usize {
        self.buf.len() / STATE_RECORD_LEN
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }
}

impl TrajectorySink for RecordSink {
    fn accept(&mut self, batch: &[TrajectorySample]) {
        self.buf.reserve(batch.len() * STATE_RECORD_LEN);
        for sample in batch {
            StateRecord::from_sample(self.satellite_id, sample).encode_into(&mut self.buf);
        }
    }
}
