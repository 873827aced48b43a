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
use std::fs;
use std::path::Path;
use serde::{Serialize, Deserialize};

use crate::device::{DeviceModel, WireId};
use crate::error::{ConfigError, TopologyError};
#[allow(unused)]
use crate::log::*;
use super::classify::JunctionClass;
use super::cluster::{ClusterKey, ClusterMap};
use super::region::Region;

/// Selects the regions and junctions to be analyzed.
///
/// An empty `regions` list selects every region and an empty `included_classes`
/// set selects every junction class.
///
/// Queries are usually loaded from YAML:
/// ```text
/// regions: [INT_L_X2Y104]
/// included_classes: [Routing]
/// excluded_clusters:
///   - { direction: Unclassified, role: Unclassified }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub included_classes: BTreeSet<JunctionClass>,
    #[serde(default)]
    pub excluded_clusters: BTreeSet<ClusterKey>,
}

impl Query {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Loads a query file. Files with `.json` extension are read as JSON, everything
    /// else as YAML.
    pub fn load<P>(path: P) -> Result<Self, ConfigError> where P: AsRef<Path> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        if path.extension().map_or(false, |ext| ext == "json") {
            Ok(serde_json::from_str(&text)?)
        } else {
            Self::from_yaml_str(&text)
        }
    }

    pub fn includes_class(&self, class: JunctionClass) -> bool {
        self.included_classes.is_empty() || self.included_classes.contains(&class)
    }
}

/// Result of `process_query`. Holds only junction ids, the region is left untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryResult {
    pub filtered_junctions: BTreeSet<WireId>,
    pub clusters: BTreeMap<ClusterKey, BTreeSet<WireId>>,
    /// Edges between clusters. May contain cycles, including self-loops.
    pub cluster_graph: BTreeMap<ClusterKey, BTreeSet<ClusterKey>>,
}

impl QueryResult {
    pub fn edge_count(&self) -> usize {
        self.cluster_graph.values().map(BTreeSet::len).sum()
    }
}

/// Clusters the junctions of `region`, drops the clusters excluded by `query` and
/// connects the remaining clusters according to the PIPs between their junctions.
pub fn process_query<D>(region: &Region<'_, D>, query: &Query)
    -> Result<QueryResult, TopologyError>
where
    D: DeviceModel + ?Sized
{
    let device = region.device();

    let mut clusters = ClusterMap::new();
    for wire in region.junctions() {
        let property = region.property(*wire)
            .ok_or_else(|| TopologyError::MissingProperty {
                region: region.name().to_string(),
                junction: region.junction_name(*wire).to_string(),
            })?;
        if !query.includes_class(property.class) {
            continue;
        }
        let name = region.junction_name(*wire);
        clusters.insert(*wire, name, ClusterKey::from_name(name))?;
    }

    for key in &query.excluded_clusters {
        if let Some(removed) = clusters.remove_cluster(key) {
            dbg_log!(
                DBG_EXTRA,
                "{}: excluded cluster {} ({} junctions)",
                region.name(),
                key,
                removed.len()
            );
        }
    }

    let filtered_junctions = clusters.junctions();

    let mut cluster_graph: BTreeMap<ClusterKey, BTreeSet<ClusterKey>> = clusters.keys()
        .map(|key| (*key, BTreeSet::new()))
        .collect();

    for (from_key, wires) in clusters.iter() {
        for wire in wires {
            for pip in device.forward_pips(*wire) {
                let dest = device.pip_far_end(*pip, *wire);
                if !filtered_junctions.contains(&dest) {
                    continue;
                }
                let to_key = clusters.cluster_of(dest)
                    .ok_or_else(|| TopologyError::UnclusteredJunction {
                        region: region.name().to_string(),
                        junction: region.junction_name(dest).to_string(),
                    })?;
                cluster_graph.entry(*from_key).or_insert_with(BTreeSet::new).insert(to_key);
            }
        }
    }

    Ok(QueryResult {
        filtered_junctions,
        clusters: clusters.into_clusters(),
        cluster_graph,
    })
}
