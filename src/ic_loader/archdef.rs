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

use std::collections::HashMap;

use crate::common::parse_xy_suffix;
use crate::device::{DeviceModel, MemDevice, TileCoord, TileId, WireId};
#[allow(unused)]
use crate::log::*;
use super::*;

pub type Root<'a> = DeviceResources_capnp::device::Reader<'a>;
pub type TileReader<'a> = DeviceResources_capnp::device::tile::Reader<'a>;
pub type StrListReader<'a> = capnp::text_list::Reader<'a>;

fn ic_str<'a>(strs: &StrListReader<'a>, idx: u32) -> Result<&'a str, OpenWriteError> {
    if idx >= strs.len() {
        return Err(OpenWriteError::InvalidDevice(format!("string index {} out of range", idx)));
    }
    Ok(strs.get(idx)?)
}

/* Xilinx tile names carry grid coordinates with `Y` growing northwards. Interchange
 * rows grow southwards, so they are flipped when the name has no coordinates. */
fn tile_coord(name: &str, tile: &TileReader<'_>) -> TileCoord {
    match parse_xy_suffix(name) {
        Some((x, y)) => TileCoord::new(x, y),
        None => TileCoord::new(tile.get_col() as i32, -(tile.get_row() as i32)),
    }
}

/// Converts the routing graph of an interchange device into a `MemDevice`.
///
/// Every tile gets the wires and PIPs of its tile type. Non-directional PIPs become
/// bidirectional. Nodes keep the wire order of the device file, so the first wire is
/// treated as the node's driver.
pub fn build_device(root: Root<'_>) -> Result<MemDevice, OpenWriteError> {
    let strs = root.get_str_list()?;
    let tile_types = root.get_tile_type_list()?;

    let mut device = MemDevice::new(root.get_name()?);
    let mut tiles_by_name: HashMap<u32, TileId> = HashMap::new();

    for tile in root.get_tile_list()? {
        let name = ic_str(&strs, tile.get_name())?;
        let tile_id = device.add_tile(name, tile_coord(name, &tile))?;
        tiles_by_name.insert(tile.get_name(), tile_id);

        if tile.get_type() >= tile_types.len() {
            return Err(OpenWriteError::InvalidDevice(
                format!("tile {} has an unknown tile type {}", name, tile.get_type())
            ));
        }
        let tile_type = tile_types.get(tile.get_type());
        let tt_wires = tile_type.get_wires()?;

        let wire_of = |device: &mut MemDevice, idx: u32| -> Result<WireId, OpenWriteError> {
            if idx >= tt_wires.len() {
                return Err(OpenWriteError::InvalidDevice(
                    format!("PIP in tile {} uses an unknown wire {}", name, idx)
                ));
            }
            Ok(device.find_or_add_wire(tile_id, ic_str(&strs, tt_wires.get(idx))?))
        };

        for pip in tile_type.get_pips()? {
            let from = wire_of(&mut device, pip.get_wire0())?;
            let to = wire_of(&mut device, pip.get_wire1())?;
            device.add_pip(from, to, !pip.get_directional());
        }
    }

    let wires = root.get_wires()?;
    let mut skipped = 0;
    for node in root.get_nodes()? {
        let mut members = Vec::new();
        for idx in node.get_wires()?.iter() {
            if idx >= wires.len() {
                return Err(OpenWriteError::InvalidDevice(format!("unknown wire {} in node", idx)));
            }
            let wire = wires.get(idx);
            let tile = *tiles_by_name.get(&wire.get_tile())
                .ok_or_else(|| OpenWriteError::InvalidDevice(format!(
                    "wire {} refers to an unknown tile",
                    ic_str(&strs, wire.get_wire()).unwrap_or("?")
                )))?;
            members.push(device.find_or_add_wire(tile, ic_str(&strs, wire.get_wire())?));
        }
        if members.is_empty() {
            skipped += 1;
            continue;
        }
        device.add_node(members)?;
    }

    if skipped != 0 {
        dbg_log!(DBG_WARN, "Skipped {} empty nodes", skipped);
    }
    dbg_log!(
        DBG_INFO,
        "Loaded device {}: {} tiles, {} wires, {} PIPs, {} nodes",
        device.name(),
        device.tile_count(),
        device.wire_count(),
        device.pip_count(),
        device.node_count()
    );

    Ok(device)
}
