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

use thiserror::Error;

/// Violations of the assumptions the topology engine makes about the device graph.
/// None of these are recoverable: the region (or query) that triggered one must be
/// discarded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error(
        "junction {junction} in region {region} has {forward} forward and {backward} \
         backward connections, which does not match any junction type"
    )]
    UnclassifiableJunction {
        region: String,
        junction: String,
        forward: usize,
        backward: usize,
    },
    #[error("junction {junction} in region {region} survived filtering but was never clustered")]
    UnclusteredJunction {
        region: String,
        junction: String,
    },
    #[error("junction {junction} in region {region} has no classification")]
    MissingProperty {
        region: String,
        junction: String,
    },
    #[error("junction {junction} is already in cluster {existing}, can't move it to {requested}")]
    ConflictingCluster {
        junction: String,
        existing: String,
        requested: String,
    },
    #[error("region {0} does not exist in the device")]
    UnknownRegion(String),
}

/// Errors raised while building or loading a device model.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("tile {0} defined more than once")]
    DuplicateTile(String),
    #[error("wire {tile}/{wire} defined more than once")]
    DuplicateWire {
        tile: String,
        wire: String,
    },
    #[error("wire {tile}/{wire} belongs to more than one node")]
    WireInMultipleNodes {
        tile: String,
        wire: String,
    },
    #[error("node without wires")]
    EmptyNode,
    #[error("unknown tile {0}")]
    UnknownTile(String),
    #[error("malformed wire reference `{0}`, expected `TILE/WIRE`")]
    MalformedWireRef(String),
    #[error("can't read device description: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed device description: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while loading query files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("can't read query file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed YAML query: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("malformed JSON query: {0}")]
    Json(#[from] serde_json::Error),
}
