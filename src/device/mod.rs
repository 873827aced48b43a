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

use serde::{Serialize, Deserialize};

pub mod mem;

pub use self::mem::{MemDevice, DeviceDescription};

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct TileId(pub usize);

/// A wire instance in a specific tile. Junctions of a region are identified by these.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct WireId(pub usize);

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct PipId(pub usize);

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// Tile grid coordinates. `y` grows northwards.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn manhattan_distance(&self, other: &Self) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Signed offset `(dx, dy)` from `self` to `other`.
    pub fn span_to(&self, other: &Self) -> (i32, i32) {
        (other.x - self.x, other.y - self.y)
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "X{}Y{}", self.x, self.y)
    }
}

/// Read-only view of a device routing graph: tiles, wires, PIPs and nodes.
///
/// A PIP is listed among the forward PIPs of its source wire and among the backward
/// PIPs of its destination wire. A bidirectional PIP is also listed the other way
/// round, so it shows up in both lists of both its wires. Use `pip_far_end` to follow
/// a PIP from either end. `tile_pips` lists every PIP once.
///
/// The wires of a node are ordered and the first one is the node's driver.
pub trait DeviceModel {
    fn tile_count(&self) -> usize;
    fn tile_name(&self, tile: TileId) -> &str;
    fn tile_coord(&self, tile: TileId) -> TileCoord;
    /// PIPs located in the tile.
    fn tile_pips(&self, tile: TileId) -> &[PipId];
    fn find_tile(&self, name: &str) -> Option<TileId>;

    fn wire_name(&self, wire: WireId) -> &str;
    fn wire_tile(&self, wire: WireId) -> TileId;
    fn wire_node(&self, wire: WireId) -> Option<NodeId>;
    fn forward_pips(&self, wire: WireId) -> &[PipId];
    fn backward_pips(&self, wire: WireId) -> &[PipId];

    fn node_wires(&self, node: NodeId) -> &[WireId];

    fn pip_source(&self, pip: PipId) -> WireId;
    fn pip_dest(&self, pip: PipId) -> WireId;
    fn pip_is_bidirectional(&self, pip: PipId) -> bool;

    fn node_driver(&self, node: NodeId) -> Option<WireId> {
        self.node_wires(node).first().copied()
    }

    /// The wire at the other end of `pip` when entered from `wire`.
    fn pip_far_end(&self, pip: PipId, wire: WireId) -> WireId {
        let source = self.pip_source(pip);
        if source == wire { self.pip_dest(pip) } else { source }
    }

    /// Wires reached through the forward PIPs of any wire of the node.
    fn node_downstream_wires(&self, node: NodeId) -> Vec<WireId> {
        self.node_wires(node).iter()
            .flat_map(|wire| {
                self.forward_pips(*wire).iter().map(move |pip| self.pip_far_end(*pip, *wire))
            })
            .collect()
    }

    fn tile_distance(&self, a: TileId, b: TileId) -> u32 {
        self.tile_coord(a).manhattan_distance(&self.tile_coord(b))
    }

    fn wire_coord(&self, wire: WireId) -> TileCoord {
        self.tile_coord(self.wire_tile(wire))
    }
}
