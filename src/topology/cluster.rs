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

use std::collections::{BTreeMap, BTreeSet, HashMap};
use serde::{Serialize, Deserialize};

use crate::device::WireId;
use crate::error::TopologyError;
use super::direction::GlobalRouteDirection;

pub const BEGIN_MARKER: &str = "BEG";
pub const END_MARKER: &str = "END";

/* A `*BEG*` wire is driven from inside the switchbox and leaves it, so within the
 * switchbox it's a sink. `*END*` wires arrive from elsewhere and act as sources. */
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum ClusterRole {
    Source,
    Sink,
    Unclassified,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct ClusterKey {
    pub direction: GlobalRouteDirection,
    pub role: ClusterRole,
}

impl ClusterKey {
    pub const UNCLASSIFIED: ClusterKey = ClusterKey {
        direction: GlobalRouteDirection::Unclassified,
        role: ClusterRole::Unclassified,
    };

    pub fn new(direction: GlobalRouteDirection, role: ClusterRole) -> Self {
        Self { direction, role }
    }

    /// Infers the cluster of a junction from its name alone.
    pub fn from_name(name: &str) -> Self {
        let direction = GlobalRouteDirection::from_name(name);
        if !direction.is_classified() {
            return Self::UNCLASSIFIED;
        }

        let role = if name.contains(BEGIN_MARKER) {
            ClusterRole::Sink
        } else if name.contains(END_MARKER) {
            ClusterRole::Source
        } else {
            ClusterRole::Unclassified
        };

        Self { direction, role }
    }
}

impl std::fmt::Display for ClusterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let role = match self.role {
            ClusterRole::Source => "SOURCE",
            ClusterRole::Sink => "SINK",
            ClusterRole::Unclassified => "UNCLASSIFIED",
        };
        write!(f, "{}_{}", self.direction, role)
    }
}

/// Junction clusters, kept as both the `key -> junctions` map and the
/// `junction -> key` reverse map. Every junction belongs to exactly one cluster.
#[derive(Clone, Debug, Default)]
pub struct ClusterMap {
    clusters: BTreeMap<ClusterKey, BTreeSet<WireId>>,
    reverse: HashMap<WireId, ClusterKey>,
}

impl ClusterMap {
    pub fn new() -> Self {
        Default::default()
    }

    /// Assigns `wire` to the cluster `key`. `name` only serves error reporting.
    pub fn insert(&mut self, wire: WireId, name: &str, key: ClusterKey)
        -> Result<(), TopologyError>
    {
        if let Some(existing) = self.reverse.get(&wire) {
            if *existing == key {
                return Ok(());
            }
            return Err(TopologyError::ConflictingCluster {
                junction: name.to_string(),
                existing: existing.to_string(),
                requested: key.to_string(),
            });
        }

        self.reverse.insert(wire, key);
        self.clusters.entry(key).or_insert_with(BTreeSet::new).insert(wire);
        Ok(())
    }

    /// Removes a cluster together with all of its junctions.
    pub fn remove_cluster(&mut self, key: &ClusterKey) -> Option<BTreeSet<WireId>> {
        let wires = self.clusters.remove(key)?;
        for wire in &wires {
            self.reverse.remove(wire);
        }
        Some(wires)
    }

    pub fn cluster_of(&self, wire: WireId) -> Option<ClusterKey> {
        self.reverse.get(&wire).copied()
    }

    pub fn get(&self, key: &ClusterKey) -> Option<&BTreeSet<WireId>> {
        self.clusters.get(key)
    }

    pub fn contains(&self, wire: WireId) -> bool {
        self.reverse.contains_key(&wire)
    }

    pub fn keys(&self) -> impl Iterator<Item = &ClusterKey> {
        self.clusters.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ClusterKey, &BTreeSet<WireId>)> {
        self.clusters.iter()
    }

    pub fn junctions(&self) -> BTreeSet<WireId> {
        self.reverse.keys().copied().collect()
    }

    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    pub fn junction_count(&self) -> usize {
        self.reverse.len()
    }

    pub fn into_clusters(self) -> BTreeMap<ClusterKey, BTreeSet<WireId>> {
        self.clusters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::direction::GlobalRouteDirection::*;

    #[test]
    fn test_cluster_key_from_name() {
        assert_eq!(ClusterKey::from_name("EE2BEG3"), ClusterKey::new(EE, ClusterRole::Sink));
        assert_eq!(ClusterKey::from_name("NW4END1"), ClusterKey::new(NW, ClusterRole::Source));
        assert_eq!(ClusterKey::from_name("BOUNCE1"), ClusterKey::UNCLASSIFIED);
    }

    #[test]
    fn test_markers_without_direction_stay_unclassified() {
        assert_eq!(ClusterKey::from_name("LOGIC_BEG0"), ClusterKey::UNCLASSIFIED);
        assert_eq!(ClusterKey::from_name("IMUX_END7"), ClusterKey::UNCLASSIFIED);
    }

    #[test]
    fn test_direction_without_marker() {
        assert_eq!(
            ClusterKey::from_name("SS6A2"),
            ClusterKey::new(SS, ClusterRole::Unclassified)
        );
    }

    #[test]
    fn test_turn_wires_fold_into_main_direction() {
        assert_eq!(ClusterKey::from_name("NL1BEG0"), ClusterKey::new(NN, ClusterRole::Sink));
        assert_eq!(ClusterKey::from_name("WR1END2"), ClusterKey::new(WW, ClusterRole::Source));
    }

    #[test]
    fn test_cluster_map_keeps_both_directions_in_sync() {
        let mut map = ClusterMap::new();
        let sink = ClusterKey::new(EE, ClusterRole::Sink);

        map.insert(WireId(0), "EE2BEG0", sink).unwrap();
        map.insert(WireId(1), "EE2BEG1", sink).unwrap();
        map.insert(WireId(2), "BOUNCE0", ClusterKey::UNCLASSIFIED).unwrap();
        /* Re-inserting into the same cluster is a no-op */
        map.insert(WireId(0), "EE2BEG0", sink).unwrap();

        assert_eq!(map.cluster_count(), 2);
        assert_eq!(map.junction_count(), 3);
        assert_eq!(map.cluster_of(WireId(1)), Some(sink));

        let removed = map.remove_cluster(&sink).unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(map.cluster_of(WireId(0)), None);
        assert!(!map.contains(WireId(1)));
        assert_eq!(map.junctions(), [WireId(2)].into_iter().collect::<BTreeSet<_>>());
    }

    #[test]
    fn test_cluster_map_rejects_moving_a_junction() {
        let mut map = ClusterMap::new();
        map.insert(WireId(0), "EE2BEG0", ClusterKey::new(EE, ClusterRole::Sink)).unwrap();
        let res = map.insert(WireId(0), "EE2BEG0", ClusterKey::UNCLASSIFIED);
        assert!(matches!(res, Err(TopologyError::ConflictingCluster { .. })));
    }
}
