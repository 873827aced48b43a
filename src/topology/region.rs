/* Copyright (C) 2022 Antmicro
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     https://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use std::collections::{BTreeMap, BTreeSet};

use crate::device::{DeviceModel, TileCoord, TileId, WireId};
use crate::error::TopologyError;
#[allow(unused)]
use crate::log::*;
use super::classify::{classify, JunctionProperty};
use super::cluster::{ClusterKey, ClusterMap};
use super::direction::GlobalRouteDirection;
use super::external::{Diagnostic, ExternalConnectivityResolver};

/// A classified view of a single switchbox tile.
///
/// Everything is computed once, in `Region::new`. The region only borrows the
/// device and never modifies it.
pub struct Region<'d, D> where D: DeviceModel + ?Sized {
    device: &'d D,
    tile: TileId,
    name: String,
    coord: TileCoord,
    junctions: BTreeSet<WireId>,
    properties: BTreeMap<WireId, JunctionProperty>,
    external_tiles: BTreeMap<WireId, TileId>,
    clusters: ClusterMap,
    diagnostics: Vec<Diagnostic>,
}

impl<'d, D> Region<'d, D> where D: DeviceModel + ?Sized {
    /// Scrapes the switchbox located in `tile`.
    ///
    /// Junctions are the endpoints of the PIPs located in the tile.
    pub fn new(device: &'d D, tile: TileId) -> Result<Self, TopologyError> {
        let name = device.tile_name(tile).to_string();
        let coord = device.tile_coord(tile);

        let mut junctions = BTreeSet::new();
        for pip in device.tile_pips(tile) {
            junctions.insert(device.pip_source(*pip));
            junctions.insert(device.pip_dest(*pip));
        }

        let mut properties = BTreeMap::new();
        for wire in &junctions {
            properties.insert(*wire, classify(device, *wire)?);
        }

        let mut resolver = ExternalConnectivityResolver::new(device, tile);
        let mut external_tiles = BTreeMap::new();
        for wire in &junctions {
            if let Some(ext) = resolver.external_tile(*wire) {
                external_tiles.insert(*wire, ext);
            }
        }

        let mut clusters = ClusterMap::new();
        for wire in &junctions {
            let wire_name = device.wire_name(*wire);
            clusters.insert(*wire, wire_name, ClusterKey::from_name(wire_name))?;
        }

        dbg_log!(
            DBG_INFO,
            "Region {}: {} junctions, {} leaving the tile, {} clusters",
            name,
            junctions.len(),
            external_tiles.len(),
            clusters.cluster_count()
        );

        Ok(Self {
            device,
            tile,
            name,
            coord,
            junctions,
            properties,
            external_tiles,
            clusters,
            diagnostics: resolver.into_diagnostics(),
        })
    }

    pub fn from_name(device: &'d D, name: &str) -> Result<Self, TopologyError> {
        let tile = device.find_tile(name)
            .ok_or_else(|| TopologyError::UnknownRegion(name.to_string()))?;
        Self::new(device, tile)
    }

    pub fn device(&self) -> &'d D {
        self.device
    }

    pub fn tile(&self) -> TileId {
        self.tile
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn coord(&self) -> TileCoord {
        self.coord
    }

    pub fn junctions(&self) -> &BTreeSet<WireId> {
        &self.junctions
    }

    pub fn contains(&self, wire: WireId) -> bool {
        self.junctions.contains(&wire)
    }

    pub fn junction_name(&self, wire: WireId) -> &'d str {
        self.device.wire_name(wire)
    }

    pub fn property(&self, wire: WireId) -> Option<&JunctionProperty> {
        self.properties.get(&wire)
    }

    pub fn properties(&self) -> &BTreeMap<WireId, JunctionProperty> {
        &self.properties
    }

    pub fn clusters(&self) -> &ClusterMap {
        &self.clusters
    }

    pub fn cluster_of(&self, wire: WireId) -> Option<ClusterKey> {
        self.clusters.cluster_of(wire)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Tile reached by following the junction's node out of the region.
    pub fn external_tile(&self, wire: WireId) -> Option<TileId> {
        self.external_tiles.get(&wire).copied()
    }

    pub fn external_tiles(&self) -> &BTreeMap<WireId, TileId> {
        &self.external_tiles
    }

    /// Manhattan distance to the external tile.
    pub fn wire_length(&self, wire: WireId) -> Option<u32> {
        self.external_tile(wire)
            .map(|tile| self.coord.manhattan_distance(&self.device.tile_coord(tile)))
    }

    /// Signed `(dx, dy)` offset of the external tile.
    pub fn wire_span(&self, wire: WireId) -> Option<(i32, i32)> {
        self.external_tile(wire)
            .map(|tile| self.coord.span_to(&self.device.tile_coord(tile)))
    }

    /// Direction in which the external tile lies.
    pub fn wire_direction(&self, wire: WireId) -> Option<GlobalRouteDirection> {
        self.external_tile(wire)
            .map(|tile| GlobalRouteDirection::between(self.coord, self.device.tile_coord(tile)))
    }

    pub fn direction_to(&self, other: &Region<'_, D>) -> GlobalRouteDirection {
        GlobalRouteDirection::between(self.coord, other.coord)
    }

    /// Checks whether the junction is an endpoint of a bidirectional PIP of this
    /// region.
    pub fn is_bidirectional(&self, wire: WireId) -> bool {
        self.device.forward_pips(wire).iter()
            .chain(self.device.backward_pips(wire).iter())
            .any(|pip| {
                self.device.pip_is_bidirectional(*pip)
                    && self.device.wire_tile(self.device.pip_source(*pip)) == self.tile
            })
    }

    /// Junction pairs connected with bidirectional PIPs of this region, lower id first.
    pub fn bidirectional_pairs(&self) -> BTreeSet<(WireId, WireId)> {
        self.device.tile_pips(self.tile).iter()
            .filter(|pip| self.device.pip_is_bidirectional(**pip))
            .map(|pip| {
                let a = self.device.pip_source(*pip);
                let b = self.device.pip_dest(*pip);
                (a.min(b), a.max(b))
            })
            .collect()
    }
}
