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

//! Switchbox topology extraction.
//!
//! A `Region` scrapes a single switchbox tile: it gathers the junctions (wires
//! touched by the tile's PIPs), classifies them, finds the tiles their nodes lead to
//! and groups them into clusters inferred from their names. Queries and channel
//! analysis work on top of a region.

pub mod direction;
pub mod classify;
pub mod external;
pub mod cluster;
pub mod region;
pub mod query;
pub mod channel;
pub mod serialize;


pub use self::direction::GlobalRouteDirection;
pub use self::classify::{classify, JunctionClass, JunctionProperty, JunctionType, RoutingType};
pub use self::external::{Diagnostic, ExternalConnectivityResolver};
pub use self::cluster::{ClusterKey, ClusterMap, ClusterRole};
pub use self::region::Region;
pub use self::query::{process_query, Query, QueryResult};
pub use self::channel::{ChannelContribution, ChannelContributionAnalyzer, RegionChannelReport};
pub use self::serialize::{QuerySummary, RegionSummary};
