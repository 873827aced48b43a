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

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use serde::{Serialize, Serializer};

use crate::device::{DeviceModel, NodeId, TileId, WireId};
#[allow(unused)]
use crate::log::*;
use super::region::Region;

pub const DEFAULT_SWITCHBOX_PREFIX: &str = "INT";

/// Wires of a node split by the part they play in it. Only wires located in
/// switchbox tiles are listed as outputs and intermediates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeWireRoles {
    pub driver: WireId,
    /// Wires driving PIPs away from the driver's location
    pub outputs: BTreeSet<WireId>,
    pub intermediates: BTreeSet<WireId>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ChannelContribution {
    pub horizontal: u32,
    pub vertical: u32,
    /// Links between wires sharing a location. They don't count into `length`.
    pub local: u32,
    pub length: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RegionChannelReport {
    pub region: String,
    pub horizontal: u32,
    pub vertical: u32,
    /// Number of analyzed junctions reaching each `(dx, dy)` offset
    #[serde(serialize_with = "serialize_spans")]
    pub spans: BTreeMap<(i32, i32), usize>,
}

/* JSON maps need string keys */
fn serialize_spans<S>(spans: &BTreeMap<(i32, i32), usize>, serializer: S)
    -> Result<S::Ok, S::Error>
where
    S: Serializer
{
    serializer.collect_map(
        spans.iter().map(|((dx, dy), count)| (format!("{},{}", dx, dy), count))
    )
}

/// Attributes the length of nodes to horizontal and vertical routing channels.
///
/// The wires of a node are linked into a tree by walking from the driver towards
/// wires in adjacent (or the same) tiles. Each link between neighbouring tiles adds
/// one unit to the horizontal or the vertical channel.
pub struct ChannelContributionAnalyzer<'d, D> where D: DeviceModel + ?Sized {
    device: &'d D,
    switchbox_prefix: String,
}

impl<'d, D> ChannelContributionAnalyzer<'d, D> where D: DeviceModel + ?Sized {
    pub fn new(device: &'d D) -> Self {
        Self {
            device,
            switchbox_prefix: DEFAULT_SWITCHBOX_PREFIX.to_string(),
        }
    }

    pub fn with_switchbox_prefix(self, prefix: &str) -> Self {
        Self {
            switchbox_prefix: prefix.to_string(),
            .. self
        }
    }

    pub fn is_switchbox_tile(&self, tile: TileId) -> bool {
        self.device.tile_name(tile).starts_with(&self.switchbox_prefix)
    }

    pub fn wire_roles(&self, node: NodeId) -> Option<NodeWireRoles> {
        let driver = self.device.node_driver(node)?;
        let driver_coord = self.device.wire_coord(driver);

        let mut outputs = BTreeSet::new();
        let mut intermediates = BTreeSet::new();

        for wire in self.device.node_wires(node).iter().skip(1) {
            if !self.is_switchbox_tile(self.device.wire_tile(*wire)) {
                continue;
            }
            /* An output lands outside the driver's tile: it drives PIPs at other coordinates */
            let drives_pips = !self.device.forward_pips(*wire).is_empty();
            if drives_pips && self.device.wire_coord(*wire) != driver_coord {
                outputs.insert(*wire);
            } else {
                intermediates.insert(*wire);
            }
        }

        Some(NodeWireRoles { driver, outputs, intermediates })
    }

    /// Links the switchbox wires of a node into a tree rooted at the node's driver.
    /// Wires are linked only when their tiles are at most one step apart, never
    /// diagonally.
    pub fn adjacent_wire_graph(&self, node: NodeId) -> BTreeMap<WireId, BTreeSet<WireId>> {
        let mut graph: BTreeMap<WireId, BTreeSet<WireId>> = BTreeMap::new();

        let roles = match self.wire_roles(node) {
            Some(roles) => roles,
            None => return graph,
        };

        /* Keep the node's order, it decides which wire gets visited first */
        let members: Vec<WireId> = self.device.node_wires(node).iter()
            .copied()
            .filter(|wire| roles.outputs.contains(wire) || roles.intermediates.contains(wire))
            .collect();

        let mut visit_order = HashMap::new();
        visit_order.insert(roles.driver, 0usize);
        let mut queue = VecDeque::new();
        queue.push_back(roles.driver);

        while let Some(wire) = queue.pop_front() {
            let coord = self.device.wire_coord(wire);
            for candidate in &members {
                if *candidate == wire {
                    continue;
                }
                if coord.manhattan_distance(&self.device.wire_coord(*candidate)) > 1 {
                    continue;
                }
                let linked_back = graph.get(candidate)
                    .map_or(false, |targets| targets.contains(&wire));
                if linked_back {
                    continue;
                }
                graph.entry(wire).or_insert_with(BTreeSet::new).insert(*candidate);
                if !visit_order.contains_key(candidate) {
                    visit_order.insert(*candidate, visit_order.len());
                    queue.push_back(*candidate);
                }
            }
        }

        self.drop_distant_referrers(&mut graph, &visit_order);
        graph
    }

    /* A wire referenced by more than one wire keeps only the closest referrer. Ties
     * go to the referrer visited first. */
    fn drop_distant_referrers(
        &self,
        graph: &mut BTreeMap<WireId, BTreeSet<WireId>>,
        visit_order: &HashMap<WireId, usize>
    ) {
        let mut referrers: BTreeMap<WireId, Vec<WireId>> = BTreeMap::new();
        for (from, targets) in graph.iter() {
            for to in targets {
                referrers.entry(*to).or_insert_with(Vec::new).push(*from);
            }
        }

        for (target, refs) in referrers {
            if refs.len() < 2 {
                continue;
            }
            let target_coord = self.device.wire_coord(target);
            let keep = refs.iter()
                .copied()
                .min_by_key(|referrer| (
                    self.device.wire_coord(*referrer).manhattan_distance(&target_coord),
                    visit_order.get(referrer).copied().unwrap_or(usize::MAX),
                ));
            for referrer in refs {
                if Some(referrer) == keep {
                    continue;
                }
                if let Some(targets) = graph.get_mut(&referrer) {
                    targets.remove(&target);
                }
            }
        }

        graph.retain(|_, targets| !targets.is_empty());
    }

    pub fn channel_contribution(&self, node: NodeId) -> ChannelContribution {
        let mut contribution = ChannelContribution::default();

        for (from, targets) in self.adjacent_wire_graph(node) {
            let from_coord = self.device.wire_coord(from);
            for to in targets {
                let to_coord = self.device.wire_coord(to);
                if from_coord == to_coord {
                    contribution.local += 1;
                } else if from_coord.y == to_coord.y {
                    contribution.horizontal += 1;
                } else if from_coord.x == to_coord.x {
                    contribution.vertical += 1;
                }
            }
        }

        contribution.length = contribution.horizontal + contribution.vertical;
        contribution
    }

    /// Estimates the channel usage of a region's outgoing wires.
    ///
    /// Every junction driving a node which leaves the region is analyzed. Out of each
    /// pair of junctions connected with a bidirectional PIP only the one with the
    /// lower id is analyzed. Each node is counted once.
    pub fn region_report(&self, region: &Region<'_, D>) -> RegionChannelReport {
        let bidir_pairs = region.bidirectional_pairs();
        let bidir_wires: HashSet<WireId> = bidir_pairs.iter()
            .flat_map(|(a, b)| [*a, *b])
            .collect();

        let mut selected: BTreeSet<WireId> = region.external_tiles().keys()
            .copied()
            .filter(|wire| !bidir_wires.contains(wire))
            .filter(|wire| {
                self.device.wire_node(*wire)
                    .and_then(|node| self.device.node_driver(node))
                    == Some(*wire)
            })
            .collect();
        selected.extend(bidir_pairs.iter().map(|(a, _)| *a));

        let mut report = RegionChannelReport {
            region: region.name().to_string(),
            .. Default::default()
        };
        let mut seen_nodes = HashSet::new();

        for wire in selected {
            if let Some(span) = region.wire_span(wire) {
                *report.spans.entry(span).or_insert(0) += 1;
            }
            let node = match self.device.wire_node(wire) {
                Some(node) => node,
                None => continue,
            };
            if !seen_nodes.insert(node) {
                continue;
            }
            let contribution = self.channel_contribution(node);
            dbg_log!(
                DBG_EXTRA,
                "{}/{}: H={} V={}",
                region.name(),
                region.junction_name(wire),
                contribution.horizontal,
                contribution.vertical
            );
            report.horizontal += contribution.horizontal;
            report.vertical += contribution.vertical;
        }

        report
    }
}
