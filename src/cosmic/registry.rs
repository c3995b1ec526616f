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

use super::body::{Body, BodyEphemeris, BodyId, BodyKind};
use super::cache::EphemerisCache;
use super::elements::{elements_to_state, OrbitalElements};
use crate::io::{
    ConfigError, DuplicateBodySnafu, InvalidBodySnafu, InvalidGmSnafu, InvalidHierarchySnafu,
    MissingBodySnafu, MissingGmSnafu, UnknownBodyNameSnafu,
};
use crate::linalg::{UnitQuaternion, Vector3};
use crate::time::Epoch;
use serde_derive::{Deserialize, Serialize};
use snafu::{ensure, OptionExt, ResultExt};
use std::collections::BTreeMap;
use std::fmt;

/// How the state of each body relative to its parent evolves with time.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EphemerisMode {
    /// Every body stays where it was at the registry epoch, whatever the requested epoch.
    #[default]
    Frozen,
    /// Bodies with an orbit move along it (two-body motion about their parent).
    Keplerian,
}

/// Immutable snapshot of every body of a system, with its hierarchy resolved once at construction.
///
/// Positions and velocities are in km and km/s, in the inertial axes shared by every body.
#[derive(Clone, Debug)]
pub struct BodyRegistry {
    epoch: Epoch,
    mode: EphemerisMode,
    root: BodyId,
    bodies: BTreeMap<BodyId, Body>,
    kinds: BTreeMap<BodyId, BodyKind>,
    children: BTreeMap<BodyId, Vec<BodyId>>,
    /// Gravitational parameter of each body plus all of its descendants
    system_gm: BTreeMap<BodyId, f64>,
    dynamical_parents: BTreeMap<BodyId, BodyId>,
    soi_children: BTreeMap<BodyId, Vec<BodyId>>,
    soi_radii: BTreeMap<BodyId, f64>,
}

impl BodyRegistry {
    /// Builds a registry, validating the hierarchy: a single root, no dangling parent, no cycle, and a positive
    /// finite gravitational parameter for every body which is not a barycenter.
    pub fn new(epoch: Epoch, bodies: Vec<Body>, mode: EphemerisMode) -> Result<Self, ConfigError> {
        let mut map = BTreeMap::new();
        for body in bodies {
            let id = body.id;
            ensure!(map.insert(id, body).is_none(), DuplicateBodySnafu { id });
        }

        let roots: Vec<BodyId> = map
            .values()
            .filter(|b| b.parent.is_none())
            .map(|b| b.id)
            .collect();
        ensure!(
            roots.len() == 1,
            InvalidHierarchySnafu {
                reason: format!("expected exactly one root body, found {roots:?}")
            }
        );
        let root = roots[0];

        let mut children: BTreeMap<BodyId, Vec<BodyId>> = map.keys().map(|id| (*id, Vec::new())).collect();
        for body in map.values() {
            if let Some(parent) = body.parent {
                children
                    .get_mut(&parent)
                    .context(MissingBodySnafu { id: parent })?
                    .push(body.id);
            }
        }

        // Every chain of parents must reach the root within as many steps as there are bodies
        for body in map.values() {
            let mut steps = 0;
            let mut cursor = body.parent;
            while let Some(parent) = cursor {
                steps += 1;
                ensure!(
                    steps <= map.len(),
                    InvalidHierarchySnafu {
                        reason: format!("cycle in the parents of {body}")
                    }
                );
                cursor = map.get(&parent).and_then(|p| p.parent);
            }
        }

        for body in map.values() {
            if let Some(gm) = body.gm_km3_s2 {
                ensure!(gm.is_finite() && gm > 0.0, InvalidGmSnafu { id: body.id, gm });
            }
            if let Some(rotation) = &body.rotation {
                rotation.validate().context(InvalidBodySnafu { id: body.id })?;
            }
            if let BodyEphemeris::Orbit(orbit) = &body.ephemeris {
                ensure!(
                    orbit.ecc >= 0.0 && orbit.ecc < 1.0 && orbit.sma_km > 0.0,
                    InvalidHierarchySnafu {
                        reason: format!("canonical orbit of {body} must be elliptic")
                    }
                );
            }
            if body.kind == Some(BodyKind::Barycenter) && body.gm_km3_s2.is_some() {
                warn!("{body} is declared as a barycenter: its GM is ignored");
            }
        }

        let is_barycenter = |body: &Body| match body.kind {
            Some(kind) => kind == BodyKind::Barycenter,
            None => !body.is_massive(),
        };

        for body in map.values() {
            ensure!(
                is_barycenter(body) || body.is_massive(),
                MissingGmSnafu { id: body.id }
            );
        }

        let mut me = Self {
            epoch,
            mode,
            root,
            kinds: BTreeMap::new(),
            children,
            system_gm: BTreeMap::new(),
            dynamical_parents: BTreeMap::new(),
            soi_children: BTreeMap::new(),
            soi_radii: BTreeMap::new(),
            bodies: map,
        };

        for body in me.bodies.values() {
            if is_barycenter(body) {
                me.kinds.insert(body.id, BodyKind::Barycenter);
            }
        }
        me.system_gm = me.compute_system_gm();

        let massive: Vec<BodyId> = me
            .bodies
            .keys()
            .copied()
            .filter(|id| !me.kinds.contains_key(id))
            .collect();

        for id in &massive {
            if let Some(parent) = me.compute_dynamical_parent(*id) {
                me.dynamical_parents.insert(*id, parent);
                me.soi_children.entry(parent).or_default().push(*id);
            }
        }

        for id in &massive {
            let kind = match me.bodies[id].kind {
                Some(kind) => kind,
                None => me.infer_kind(*id),
            };
            me.kinds.insert(*id, kind);
        }

        for id in &massive {
            let radius = me.compute_soi_radius(*id)?;
            me.soi_radii.insert(*id, radius);
        }

        debug!(
            "registry built at {epoch} with {} bodies ({} gravity sources), root is {}",
            me.bodies.len(),
            massive.len(),
            root
        );

        Ok(me)
    }

    fn compute_system_gm(&self) -> BTreeMap<BodyId, f64> {
        fn visit(reg: &BodyRegistry, id: BodyId, out: &mut BTreeMap<BodyId, f64>) -> f64 {
            let own = if reg.kinds.get(&id) == Some(&BodyKind::Barycenter) {
                0.0
            } else {
                reg.bodies[&id].gm_km3_s2.unwrap_or(0.0)
            };
            let total = own
                + reg.children[&id]
                    .iter()
                    .map(|child| visit(reg, *child, out))
                    .sum::<f64>();
            out.insert(id, total);
            total
        }
        let mut out = BTreeMap::new();
        visit(self, self.root, &mut out);
        out
    }

    fn is_barycenter_id(&self, id: BodyId) -> bool {
        self.kinds.get(&id) == Some(&BodyKind::Barycenter)
    }

    /// The heaviest massive body of a barycenter system, with its weight.
    fn primary(&self, barycenter: BodyId) -> Option<(BodyId, f64)> {
        self.children[&barycenter]
            .iter()
            .filter_map(|child| {
                if self.is_barycenter_id(*child) {
                    self.primary(*child)
                        .map(|(prim, _)| (prim, self.system_gm[child]))
                } else {
                    Some((*child, self.bodies[child].gm_km3_s2.unwrap_or(0.0)))
                }
            })
            .fold(None, |best: Option<(BodyId, f64)>, candidate| match best {
                Some(b) if b.1 >= candidate.1 => Some(b),
                _ => Some(candidate),
            })
    }

    /// Barycenters are transparent: the parent of a body orbiting a barycenter is the primary of that barycenter,
    /// unless the body is that primary, in which case the search continues upwards.
    fn compute_dynamical_parent(&self, id: BodyId) -> Option<BodyId> {
        let mut cursor = self.bodies[&id].parent;
        while let Some(parent) = cursor {
            if !self.is_barycenter_id(parent) {
                return Some(parent);
            }
            if self.children[&parent].len() < 2 {
                debug!(
                    "{} has a single child, skipped as a degenerate barycenter",
                    self.bodies[&parent]
                );
            } else if let Some((primary, _)) = self.primary(parent) {
                if primary != id {
                    return Some(primary);
                }
            }
            cursor = self.bodies[&parent].parent;
        }
        None
    }

    fn infer_kind(&self, id: BodyId) -> BodyKind {
        match self.dynamical_parents.get(&id) {
            None => BodyKind::Star,
            Some(parent) => {
                let parent_kind = match self.bodies[parent].kind {
                    Some(kind) => kind,
                    None => self.infer_kind(*parent),
                };
                if parent_kind == BodyKind::Star {
                    BodyKind::Planet
                } else {
                    BodyKind::Moon
                }
            }
        }
    }

    fn compute_soi_radius(&self, id: BodyId) -> Result<f64, ConfigError> {
        let body = &self.bodies[&id];
        if let Some(soi) = body.soi_radius_km {
            return Ok(soi);
        }
        match self.dynamical_parents.get(&id) {
            None => Ok(f64::INFINITY),
            Some(parent) => {
                let (rel_pos, _) = self.relative_state(id, *parent, self.epoch)?;
                let distance = rel_pos.norm();
                let gm = body.gm_km3_s2.unwrap_or(0.0);
                let gm_parent = self.bodies[parent].gm_km3_s2.unwrap_or(0.0);
                if distance <= 0.0 || gm_parent <= 0.0 {
                    warn!("{body} sits on its dynamical parent: its sphere of influence is empty");
                    return Ok(0.0);
                }
                // Laplace sphere of influence
                Ok(distance * (gm / gm_parent).powf(0.4))
            }
        }
    }

    /// Epoch of this snapshot
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn mode(&self) -> EphemerisMode {
        self.mode
    }

    /// Returns a copy of this registry with another ephemeris mode.
    pub fn with_mode(&self, mode: EphemerisMode) -> Self {
        let mut me = self.clone();
        me.mode = mode;
        me
    }

    /// The root of the hierarchy, usually the solar system barycenter.
    pub fn root(&self) -> BodyId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.bodies.contains_key(&id)
    }

    /// Iterates over all of the bodies, in increasing identifier order.
    pub fn bodies(&self) -> impl Iterator<Item = &Body> {
        self.bodies.values()
    }

    pub fn get(&self, id: BodyId) -> Result<&Body, ConfigError> {
        self.bodies.get(&id).context(MissingBodySnafu { id })
    }

    /// Finds a body by its name, ignoring the case.
    pub fn id_by_name(&self, name: &str) -> Result<BodyId, ConfigError> {
        self.bodies
            .values()
            .find(|b| b.name.eq_ignore_ascii_case(name))
            .map(|b| b.id)
            .context(UnknownBodyNameSnafu { name })
    }

    /// Gravitational parameter of a gravity source, in km^3/s^2
    pub fn gm(&self, id: BodyId) -> Result<f64, ConfigError> {
        ensure!(!self.is_barycenter_id(id), MissingGmSnafu { id });
        self.get(id)?.gm_km3_s2.context(MissingGmSnafu { id })
    }

    /// Gravitational parameter of a body and all of its descendants
    pub fn system_gm(&self, id: BodyId) -> Result<f64, ConfigError> {
        self.system_gm.get(&id).copied().context(MissingBodySnafu { id })
    }

    pub fn kind(&self, id: BodyId) -> Result<BodyKind, ConfigError> {
        self.kinds.get(&id).copied().context(MissingBodySnafu { id })
    }

    /// Whether this body attracts satellites
    pub fn is_gravity_source(&self, id: BodyId) -> bool {
        self.contains(id) && !self.is_barycenter_id(id)
    }

    /// Iterates over every gravity source and its gravitational parameter.
    pub fn gravity_sources(&self) -> impl Iterator<Item = (BodyId, f64)> + '_ {
        self.bodies.values().filter_map(move |b| {
            if self.is_barycenter_id(b.id) {
                None
            } else {
                b.gm_km3_s2.map(|gm| (b.id, gm))
            }
        })
    }

    pub fn parent(&self, id: BodyId) -> Result<Option<BodyId>, ConfigError> {
        Ok(self.get(id)?.parent)
    }

    /// Direct children in the configured hierarchy, barycenters included.
    pub fn children(&self, id: BodyId) -> Result<&[BodyId], ConfigError> {
        self.children
            .get(&id)
            .map(|c| c.as_slice())
            .context(MissingBodySnafu { id })
    }

    /// Whether `id` is below `ancestor` in the configured hierarchy.
    pub fn is_descendant(&self, id: BodyId, ancestor: BodyId) -> bool {
        let mut cursor = self.bodies.get(&id).and_then(|b| b.parent);
        while let Some(parent) = cursor {
            if parent == ancestor {
                return true;
            }
            cursor = self.bodies.get(&parent).and_then(|b| b.parent);
        }
        false
    }

    /// Parent for sphere of influence purposes, `None` for the dynamical root (the star).
    /// For a barycenter, this is the dynamical parent of its primary.
    pub fn dynamical_parent(&self, id: BodyId) -> Result<Option<BodyId>, ConfigError> {
        self.get(id)?;
        if self.is_barycenter_id(id) {
            return Ok(self
                .primary(id)
                .and_then(|(primary, _)| self.dynamical_parents.get(&primary).copied()));
        }
        Ok(self.dynamical_parents.get(&id).copied())
    }

    /// Heaviest massive body of a barycenter system, `None` if `id` is not a barycenter or has no massive descendant.
    pub fn soi_primary(&self, id: BodyId) -> Option<BodyId> {
        if self.is_barycenter_id(id) {
            self.primary(id).map(|(primary, _)| primary)
        } else {
            None
        }
    }

    /// Bodies whose sphere of influence is nested directly inside the one of `id`.
    pub fn soi_children(&self, id: BodyId) -> Result<&[BodyId], ConfigError> {
        self.get(id)?;
        Ok(self
            .soi_children
            .get(&id)
            .map(|c| c.as_slice())
            .unwrap_or(&[]))
    }

    /// Sphere of influence radius in km. The dynamical root has an infinite one, and so does a barycenter
    /// without any massive descendant. Other barycenters use the sphere of influence of their primary.
    pub fn soi_radius(&self, id: BodyId) -> Result<f64, ConfigError> {
        self.get(id)?;
        if self.is_barycenter_id(id) {
            return Ok(self
                .primary(id)
                .and_then(|(primary, _)| self.soi_radii.get(&primary).copied())
                .unwrap_or(f64::INFINITY));
        }
        self.soi_radii.get(&id).copied().context(MissingBodySnafu { id })
    }

    /// Gravitational parameter governing the orbit of `id` about its parent.
    fn orbit_gm(&self, id: BodyId, parent: BodyId) -> f64 {
        if self.is_barycenter_id(parent) {
            self.system_gm[&parent]
        } else {
            self.bodies[&parent].gm_km3_s2.unwrap_or(0.0) + self.system_gm[&id]
        }
    }

    /// State of a body relative to its parent in the configured hierarchy.
    pub fn state_wrt_parent(
        &self,
        id: BodyId,
        epoch: Epoch,
    ) -> Result<(Vector3<f64>, Vector3<f64>), ConfigError> {
        let body = self.get(id)?;
        let parent = match body.parent {
            Some(parent) => parent,
            None => return Ok((Vector3::zeros(), Vector3::zeros())),
        };
        let at = match self.mode {
            EphemerisMode::Frozen => self.epoch,
            EphemerisMode::Keplerian => epoch,
        };
        match &body.ephemeris {
            BodyEphemeris::Fixed {
                position_km,
                velocity_km_s,
            } => Ok((Vector3::from(*position_km), Vector3::from(*velocity_km_s))),
            BodyEphemeris::Orbit(orbit) => {
                let elements = OrbitalElements::from_mean_anomaly(
                    orbit.sma_km,
                    orbit.ecc,
                    orbit.inc_deg.to_radians(),
                    orbit.raan_deg.to_radians(),
                    orbit.aop_deg.to_radians(),
                    orbit.ma_deg.to_radians(),
                    self.orbit_gm(id, parent),
                    parent,
                    self.epoch,
                )
                .context(InvalidBodySnafu { id })?;
                let elements = if at == self.epoch {
                    elements
                } else {
                    elements.at_epoch(at).context(InvalidBodySnafu { id })?
                };
                elements_to_state(&elements).context(InvalidBodySnafu { id })
            }
            BodyEphemeris::Balance => {
                let gm = self.system_gm[&id];
                let mut moment = (Vector3::zeros(), Vector3::zeros());
                for sibling in &self.children[&parent] {
                    if *sibling == id
                        || matches!(self.bodies[sibling].ephemeris, BodyEphemeris::Balance)
                    {
                        continue;
                    }
                    let (pos, vel) = self.state_wrt_parent(*sibling, at)?;
                    moment.0 += self.system_gm[sibling] * pos;
                    moment.1 += self.system_gm[sibling] * vel;
                }
                if gm > 0.0 {
                    Ok((-moment.0 / gm, -moment.1 / gm))
                } else {
                    Ok((Vector3::zeros(), Vector3::zeros()))
                }
            }
        }
    }

    /// Position and velocity of a body with respect to the root of the hierarchy.
    pub fn barycentric_state(
        &self,
        id: BodyId,
        epoch: Epoch,
    ) -> Result<(Vector3<f64>, Vector3<f64>), ConfigError> {
        let mut position = Vector3::zeros();
        let mut velocity = Vector3::zeros();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let (pos, vel) = self.state_wrt_parent(current, epoch)?;
            position += pos;
            velocity += vel;
            cursor = self.bodies[&current].parent;
        }
        Ok((position, velocity))
    }

    /// Same as `state_wrt_parent`, memoized in the provided cache.
    pub fn state_wrt_parent_cached(
        &self,
        id: BodyId,
        epoch: Epoch,
        cache: &mut EphemerisCache,
    ) -> Result<(Vector3<f64>, Vector3<f64>), ConfigError> {
        if let Some(state) = cache.get(id, epoch) {
            return Ok(state);
        }
        let state = self.state_wrt_parent(id, epoch)?;
        cache.insert(id, epoch, state.0, state.1);
        Ok(state)
    }

    /// Same as `barycentric_state`, memoizing each link of the chain in the provided cache.
    pub fn barycentric_state_cached(
        &self,
        id: BodyId,
        epoch: Epoch,
        cache: &mut EphemerisCache,
    ) -> Result<(Vector3<f64>, Vector3<f64>), ConfigError> {
        let mut position = Vector3::zeros();
        let mut velocity = Vector3::zeros();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let (pos, vel) = self.state_wrt_parent_cached(current, epoch, cache)?;
            position += pos;
            velocity += vel;
            cursor = self.bodies[&current].parent;
        }
        Ok((position, velocity))
    }

    /// Position and velocity of `target` as seen from `observer`, in the shared inertial axes.
    pub fn relative_state(
        &self,
        target: BodyId,
        observer: BodyId,
        epoch: Epoch,
    ) -> Result<(Vector3<f64>, Vector3<f64>), ConfigError> {
        if target == observer {
            self.get(target)?;
            return Ok((Vector3::zeros(), Vector3::zeros()));
        }
        let (r_t, v_t) = self.barycentric_state(target, epoch)?;
        let (r_o, v_o) = self.barycentric_state(observer, epoch)?;
        Ok((r_t - r_o, v_t - v_o))
    }

    /// Quaternion mapping the body-fixed axes onto the inertial axes at this epoch.
    /// Bodies without a rotation model are aligned with the inertial axes.
    pub fn orientation(&self, id: BodyId, epoch: Epoch) -> Result<UnitQuaternion<f64>, ConfigError> {
        match &self.get(id)?.rotation {
            Some(rotation) => rotation.orientation(epoch).context(InvalidBodySnafu { id }),
            None => Ok(UnitQuaternion::identity()),
        }
    }

    /// Angular velocity of the body-fixed frame in rad/s, expressed in the inertial axes.
    pub fn angular_velocity(&self, id: BodyId, epoch: Epoch) -> Result<Vector3<f64>, ConfigError> {
        match &self.get(id)?.rotation {
            Some(rotation) => rotation
                .angular_velocity(epoch)
                .context(InvalidBodySnafu { id }),
            None => Ok(Vector3::zeros()),
        }
    }
}

impl fmt::Display for BodyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "registry of {} bodies at {} ({:?})",
            self.bodies.len(),
            self.epoch,
            self.mode
        )
    }
}
