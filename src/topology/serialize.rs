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

/* The topology engine works on ids. The structures below resolve them into names so
 * that results can be handed over to exporters. */

use std::collections::BTreeMap;
use serde::Serialize;

use crate::device::{DeviceModel, WireId};
use super::classify::{JunctionClass, JunctionType, RoutingType};
use super::direction::GlobalRouteDirection;
use super::query::QueryResult;
use super::region::Region;

#[derive(Clone, Debug, Serialize)]
pub struct JunctionSummary {
    pub class: JunctionClass,
    pub kind: JunctionType,
    pub routing: RoutingType,
    pub cluster: String,
    pub external_tile: Option<String>,
    pub length: Option<u32>,
    pub span: Option<(i32, i32)>,
    pub direction: Option<GlobalRouteDirection>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RegionSummary {
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub junctions: BTreeMap<String, JunctionSummary>,
    pub diagnostics: Vec<String>,
}

impl RegionSummary {
    pub fn new<D>(region: &Region<'_, D>) -> Self where D: DeviceModel + ?Sized {
        let device = region.device();

        let junctions = region.properties().iter()
            .map(|(wire, property)| {
                let summary = JunctionSummary {
                    class: property.class,
                    kind: property.kind,
                    routing: property.routing,
                    cluster: region.cluster_of(*wire)
                        .map(|key| key.to_string())
                        .unwrap_or_default(),
                    external_tile: region.external_tile(*wire)
                        .map(|tile| device.tile_name(tile).to_string()),
                    length: region.wire_length(*wire),
                    span: region.wire_span(*wire),
                    direction: region.wire_direction(*wire),
                };
                (region.junction_name(*wire).to_string(), summary)
            })
            .collect();

        Self {
            name: region.name().to_string(),
            x: region.coord().x,
            y: region.coord().y,
            junctions,
            diagnostics: region.diagnostics().iter().map(ToString::to_string).collect(),
        }
    }

    pub fn external_count(&self) -> usize {
        self.junctions.values().filter(|j| j.external_tile.is_some()).count()
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct QuerySummary {
    pub region: String,
    pub filtered_junctions: Vec<String>,
    pub clusters: BTreeMap<String, Vec<String>>,
    pub cluster_graph: BTreeMap<String, Vec<String>>,
}

impl QuerySummary {
    pub fn new<D>(region: &Region<'_, D>, result: &QueryResult) -> Self
    where
        D: DeviceModel + ?Sized
    {
        Self {
            region: region.name().to_string(),
            filtered_junctions: junction_names(region, &result.filtered_junctions),
            clusters: result.clusters.iter()
                .map(|(key, wires)| (key.to_string(), junction_names(region, wires)))
                .collect(),
            cluster_graph: result.cluster_graph.iter()
                .map(|(key, targets)| {
                    (key.to_string(), targets.iter().map(ToString::to_string).collect())
                })
                .collect(),
        }
    }
}

fn junction_names<'a, D, I>(region: &Region<'_, D>, wires: I) -> Vec<String>
where
    D: DeviceModel + ?Sized,
    I: IntoIterator<Item = &'a WireId>
{
    wires.into_iter()
        .map(|wire| region.junction_name(*wire).to_string())
        .collect()
}
