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

use crate::device::{DeviceModel, PipId, WireId};
use crate::error::TopologyError;

/// Electrical class of a junction, inferred from its name.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum JunctionClass {
    Clk,
    Elec,
    Routing,
}

impl JunctionClass {
    pub fn from_name(name: &str) -> Self {
        if name.contains("CLK") {
            JunctionClass::Clk
        } else if name.contains("VCC") || name.contains("GND") {
            JunctionClass::Elec
        } else {
            JunctionClass::Routing
        }
    }
}

/// Structural role of a junction within its region.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum JunctionType {
    Source,
    Sink,
    Buf,
    Internal,
    Unclassified,
}

impl JunctionType {
    /// Returns `None` for the combinations no routing junction is expected to have,
    /// eg. one forward and several backward connections.
    pub fn from_connection_counts(forward: usize, backward: usize) -> Option<Self> {
        match (forward, backward) {
            (1, 1) => Some(JunctionType::Buf),
            (0, _) => Some(JunctionType::Sink),
            (_, 0) => Some(JunctionType::Source),
            (f, b) if f > 1 && b > 1 => Some(JunctionType::Internal),
            _ => None,
        }
    }
}

/* `Clb` and `Internal` are reserved for junctions living outside of the
 * switchbox. Region-scoped junctions are always `Global`. */
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum RoutingType {
    Global,
    Clb,
    Internal,
    Unclassified,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct JunctionProperty {
    pub class: JunctionClass,
    pub kind: JunctionType,
    pub routing: RoutingType,
}

/// Classifies a junction using its name and the number of PIPs entering and leaving
/// it. Bidirectional PIPs drive both of their wires, so they are left out of both
/// counts.
pub fn classify<D>(device: &D, wire: WireId) -> Result<JunctionProperty, TopologyError>
where
    D: DeviceModel + ?Sized
{
    let name = device.wire_name(wire);
    let directional = |pips: &[PipId]| {
        pips.iter().filter(|pip| !device.pip_is_bidirectional(**pip)).count()
    };
    let forward = directional(device.forward_pips(wire));
    let backward = directional(device.backward_pips(wire));

    let kind = JunctionType::from_connection_counts(forward, backward)
        .ok_or_else(|| TopologyError::UnclassifiableJunction {
            region: device.tile_name(device.wire_tile(wire)).to_string(),
            junction: name.to_string(),
            forward,
            backward,
        })?;

    Ok(JunctionProperty {
        class: JunctionClass::from_name(name),
        kind,
        routing: RoutingType::Global,
    })
}
