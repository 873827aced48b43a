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

use serde::Serialize;

use crate::device::{DeviceModel, NodeId, TileId, WireId};
#[allow(unused)]
use crate::log::*;

/// Long, multi-drop wires. Their PIP lists can't be trusted to tell which end of
/// the node drives it.
pub const MULTIDROP_WIRE_PATTERNS: &[&str] = &[
    "LH0", "LH12",
    "LV0", "LV18",
    "LVB0", "LVB12",
    "LV_L0", "LV_L18",
    "LVB_L0", "LVB_L12",
];

pub fn is_multidrop_wire_name(name: &str) -> bool {
    MULTIDROP_WIRE_PATTERNS.iter().any(|pattern| name.contains(pattern))
}

/// Recoverable oddities found while resolving external tiles.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Diagnostic {
    /// A fan-out node lands in several external tiles. The one furthest from the
    /// home tile was picked.
    AmbiguousExternalTile {
        region: String,
        junction: String,
        candidates: Vec<String>,
        chosen: String,
    },
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Diagnostic::AmbiguousExternalTile { region, junction, candidates, chosen } =>
                write!(
                    f,
                    "{}/{}: node reaches multiple external tiles [{}], picked {}",
                    region, junction, candidates.join(", "), chosen
                ),
        }
    }
}

/// Finds the tile on the other end of a junction's node, if the node leaves the
/// junction's home tile.
///
/// # The heuristic
///
/// * A junction driving its node looks at the PIPs driven by the node and collects
///   the tiles they are located in. If there is more than one such tile (other than
///   the home tile), the one furthest away wins.
/// * A junction which does not drive its node is reached from the tile of the
///   node's driver.
/// * Multi-drop wires (see `MULTIDROP_WIRE_PATTERNS`) and wires without any PIPs
///   treat the first and the last wire of the node as the two possible drivers.
///   A name match alone is enough to take this path, even for a wire with PIPs.
/// * A tile sharing coordinates with the home tile (eg. a CLB pseudo-tile overlapping
///   the switchbox) counts as internal.
pub struct ExternalConnectivityResolver<'d, D> where D: DeviceModel + ?Sized {
    device: &'d D,
    home: TileId,
    diagnostics: Vec<Diagnostic>,
}

impl<'d, D> ExternalConnectivityResolver<'d, D> where D: DeviceModel + ?Sized {
    pub fn new(device: &'d D, home: TileId) -> Self {
        Self {
            device,
            home,
            diagnostics: Vec::new(),
        }
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn external_tile(&mut self, wire: WireId) -> Option<TileId> {
        let node = self.device.wire_node(wire)?;

        let tile = if self.is_multidrop(wire) {
            self.multidrop_external_tile(node)?
        } else {
            let driver = self.device.node_driver(node)?;
            if driver == wire {
                self.fanout_external_tile(wire, node)?
            } else {
                self.device.wire_tile(driver)
            }
        };

        let home_coord = self.device.tile_coord(self.home);
        if self.device.tile_coord(tile) == home_coord {
            return None;
        }
        Some(tile)
    }

    fn is_multidrop(&self, wire: WireId) -> bool {
        let no_pips = self.device.forward_pips(wire).is_empty()
            && self.device.backward_pips(wire).is_empty();
        no_pips || is_multidrop_wire_name(self.device.wire_name(wire))
    }

    fn multidrop_external_tile(&self, node: NodeId) -> Option<TileId> {
        let wires = self.device.node_wires(node);
        if wires.len() < 2 {
            return None;
        }
        let home_coord = self.device.tile_coord(self.home);

        [wires[0], wires[wires.len() - 1]].into_iter()
            .map(|driver| self.device.wire_tile(driver))
            .find(|tile| self.device.tile_coord(*tile) != home_coord)
    }

    fn fanout_external_tile(&mut self, wire: WireId, node: NodeId) -> Option<TileId> {
        let mut candidates: Vec<TileId> = Vec::new();
        for reached in self.device.node_downstream_wires(node) {
            let tile = self.device.wire_tile(reached);
            if tile != self.home && !candidates.contains(&tile) {
                candidates.push(tile);
            }
        }

        match candidates.len() {
            0 => None,
            1 => Some(candidates[0]),
            _ => {
                let mut chosen = candidates[0];
                let mut chosen_distance = self.device.tile_distance(self.home, chosen);
                for tile in &candidates[1 ..] {
                    let distance = self.device.tile_distance(self.home, *tile);
                    if distance > chosen_distance {
                        chosen = *tile;
                        chosen_distance = distance;
                    }
                }

                let diagnostic = Diagnostic::AmbiguousExternalTile {
                    region: self.device.tile_name(self.home).to_string(),
                    junction: self.device.wire_name(wire).to_string(),
                    candidates: candidates.iter()
                        .map(|tile| self.device.tile_name(*tile).to_string())
                        .collect(),
                    chosen: self.device.tile_name(chosen).to_string(),
                };
                dbg_log!(DBG_WARN, "{}", diagnostic);
                self.diagnostics.push(diagnostic);

                Some(chosen)
            }
        }
    }
}
