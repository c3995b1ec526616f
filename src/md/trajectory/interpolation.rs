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

use crate::linalg::Vector3;

/// Cubic Hermite interpolation between two position/velocity samples `h` seconds apart.
///
/// `tau` is the normalized time in [0, 1] from the first sample. Returns the interpolated position and its
/// time derivative.
pub fn hermite_interpolate(
    tau: f64,
    h: f64,
    r0: &Vector3<f64>,
    v0: &Vector3<f64>,
    r1: &Vector3<f64>,
    v1: &Vector3<f64>,
) -> (Vector3<f64>, Vector3<f64>) {
    let tau2 = tau * tau;
    let tau3 = tau2 * tau;

    let h00 = 2.0 * tau3 - 3.0 * tau2 + 1.0;
    let h10 = tau3 - 2.0 * tau2 + tau;
    let h01 = -2.0 * tau3 + 3.0 * tau2;
    let h11 = tau3 - tau2;

    let dh00 = 6.0 * tau2 - 6.0 * tau;
    let dh10 = 3.0 * tau2 - 4.0 * tau + 1.0;
    let dh01 = -6.0 * tau2 + 6.0 * tau;
    let dh11 = 3.0 * tau2 - 2.0 * tau;

    let position = r0 * h00 + v0 * (h10 * h) + r1 * h01 + v1 * (h11 * h);
    let velocity = (r0 * dh00 + v0 * (dh10 * h) + r1 * dh01 + v1 * (dh11 * h)) / h;
    (position, velocity)
}
