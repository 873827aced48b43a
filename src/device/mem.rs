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
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use flate2::read::GzDecoder;
use serde::{Serialize, Deserialize};

use crate::error::DeviceError;
use super::*;

struct TileEntry {
    name: String,
    coord: TileCoord,
    pips: Vec<PipId>,
}

struct WireEntry {
    name: String,
    tile: TileId,
    node: Option<NodeId>,
    forward: Vec<PipId>,
    backward: Vec<PipId>,
}

struct PipEntry {
    source: WireId,
    dest: WireId,
    bidirectional: bool,
}

/// An owned, in-memory device routing graph.
///
/// Devices are either built incrementally (see `add_tile`, `add_wire`, `add_pip` and
/// `add_node`) or loaded from a `DeviceDescription`.
#[derive(Default)]
pub struct MemDevice {
    name: String,
    tiles: Vec<TileEntry>,
    tile_by_name: HashMap<String, TileId>,
    wires: Vec<WireEntry>,
    wire_by_name: HashMap<(TileId, String), WireId>,
    pips: Vec<PipEntry>,
    nodes: Vec<Vec<WireId>>,
}

impl MemDevice {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            .. Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn wire_count(&self) -> usize {
        self.wires.len()
    }

    pub fn pip_count(&self) -> usize {
        self.pips.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn tiles(&self) -> impl Iterator<Item = TileId> {
        (0 .. self.tiles.len()).map(TileId)
    }

    pub fn add_tile(&mut self, name: &str, coord: TileCoord) -> Result<TileId, DeviceError> {
        if self.tile_by_name.contains_key(name) {
            return Err(DeviceError::DuplicateTile(name.to_string()));
        }
        let id = TileId(self.tiles.len());
        self.tiles.push(TileEntry { name: name.to_string(), coord, pips: Vec::new() });
        self.tile_by_name.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn add_wire(&mut self, tile: TileId, name: &str) -> Result<WireId, DeviceError> {
        if self.wire_by_name.contains_key(&(tile, name.to_string())) {
            return Err(DeviceError::DuplicateWire {
                tile: self.tiles[tile.0].name.clone(),
                wire: name.to_string(),
            });
        }
        Ok(self.insert_wire(tile, name))
    }

    pub fn find_wire(&self, tile: TileId, name: &str) -> Option<WireId> {
        self.wire_by_name.get(&(tile, name.to_string())).copied()
    }

    pub fn find_or_add_wire(&mut self, tile: TileId, name: &str) -> WireId {
        match self.find_wire(tile, name) {
            Some(wire) => wire,
            None => self.insert_wire(tile, name),
        }
    }

    fn insert_wire(&mut self, tile: TileId, name: &str) -> WireId {
        let id = WireId(self.wires.len());
        self.wires.push(WireEntry {
            name: name.to_string(),
            tile,
            node: None,
            forward: Vec::new(),
            backward: Vec::new(),
        });
        self.wire_by_name.insert((tile, name.to_string()), id);
        id
    }

    /// Adds a PIP driving `dest` from `source`. The PIP is located in the tile of
    /// `source`. A bidirectional PIP also drives `source` from `dest`.
    pub fn add_pip(&mut self, source: WireId, dest: WireId, bidirectional: bool) -> PipId {
        let id = PipId(self.pips.len());
        self.pips.push(PipEntry { source, dest, bidirectional });
        let tile = self.wires[source.0].tile;
        self.tiles[tile.0].pips.push(id);
        self.wires[source.0].forward.push(id);
        self.wires[dest.0].backward.push(id);
        if bidirectional {
            self.wires[dest.0].forward.push(id);
            self.wires[source.0].backward.push(id);
        }
        id
    }

    /// Adds a node. The first wire is the node's driver.
    pub fn add_node(&mut self, wires: Vec<WireId>) -> Result<NodeId, DeviceError> {
        if wires.is_empty() {
            return Err(DeviceError::EmptyNode);
        }
        let id = NodeId(self.nodes.len());
        for wire in &wires {
            let entry = &self.wires[wire.0];
            if entry.node.is_some() {
                return Err(DeviceError::WireInMultipleNodes {
                    tile: self.tiles[entry.tile.0].name.clone(),
                    wire: entry.name.clone(),
                });
            }
        }
        for wire in &wires {
            self.wires[wire.0].node = Some(id);
        }
        self.nodes.push(wires);
        Ok(id)
    }

    fn resolve_wire_ref(&mut self, wire_ref: &str) -> Result<WireId, DeviceError> {
        let (tile_name, wire_name) = wire_ref.split_once('/')
            .ok_or_else(|| DeviceError::MalformedWireRef(wire_ref.to_string()))?;
        let tile = self.find_tile(tile_name)
            .ok_or_else(|| DeviceError::UnknownTile(tile_name.to_string()))?;
        Ok(self.find_or_add_wire(tile, wire_name))
    }

    pub fn from_description(desc: &DeviceDescription) -> Result<Self, DeviceError> {
        let mut device = Self::new(&desc.name);

        for tile in &desc.tiles {
            device.add_tile(&tile.name, TileCoord::new(tile.x, tile.y))?;
        }

        for pip in &desc.pips {
            let tile = device.find_tile(&pip.tile)
                .ok_or_else(|| DeviceError::UnknownTile(pip.tile.clone()))?;
            let from = device.find_or_add_wire(tile, &pip.from);
            let to = device.find_or_add_wire(tile, &pip.to);
            device.add_pip(from, to, pip.bidirectional);
        }

        for node in &desc.nodes {
            let wires = node.iter()
                .map(|wire_ref| device.resolve_wire_ref(wire_ref))
                .collect::<Result<Vec<_>, _>>()?;
            device.add_node(wires)?;
        }

        Ok(device)
    }

    /// Loads a JSON device description. Files ending with `.gz` are decompressed on
    /// the fly.
    pub fn load_json<P>(path: P) -> Result<Self, DeviceError> where P: AsRef<Path> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let gzipped = path.extension().map_or(false, |ext| ext == "gz");

        let reader: Box<dyn Read> = if gzipped {
            Box::new(BufReader::new(GzDecoder::new(file)))
        } else {
            Box::new(BufReader::new(file))
        };

        let desc: DeviceDescription = serde_json::from_reader(reader)?;
        Self::from_description(&desc)
    }
}

impl DeviceModel for MemDevice {
    fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    fn tile_name(&self, tile: TileId) -> &str {
        &self.tiles[tile.0].name
    }

    fn tile_coord(&self, tile: TileId) -> TileCoord {
        self.tiles[tile.0].coord
    }

    fn tile_pips(&self, tile: TileId) -> &[PipId] {
        &self.tiles[tile.0].pips
    }

    fn find_tile(&self, name: &str) -> Option<TileId> {
        self.tile_by_name.get(name).copied()
    }

    fn wire_name(&self, wire: WireId) -> &str {
        &self.wires[wire.0].name
    }

    fn wire_tile(&self, wire: WireId) -> TileId {
        self.wires[wire.0].tile
    }

    fn wire_node(&self, wire: WireId) -> Option<NodeId> {
        self.wires[wire.0].node
    }

    fn forward_pips(&self, wire: WireId) -> &[PipId] {
        &self.wires[wire.0].forward
    }

    fn backward_pips(&self, wire: WireId) -> &[PipId] {
        &self.wires[wire.0].backward
    }

    fn node_wires(&self, node: NodeId) -> &[WireId] {
        &self.nodes[node.0]
    }

    fn pip_source(&self, pip: PipId) -> WireId {
        self.pips[pip.0].source
    }

    fn pip_dest(&self, pip: PipId) -> WireId {
        self.pips[pip.0].dest
    }

    fn pip_is_bidirectional(&self, pip: PipId) -> bool {
        self.pips[pip.0].bidirectional
    }
}

/* JSON device description. Wires are created implicitly by the PIPs and nodes that
 * reference them. Node members are written as `TILE/WIRE`, driver first. */

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TileDescription {
    pub name: String,
    pub x: i32,
    pub y: i32,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipDescription {
    pub tile: String,
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub bidirectional: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeviceDescription {
    pub name: String,
    pub tiles: Vec<TileDescription>,
    #[serde(default)]
    pub pips: Vec<PipDescription>,
    #[serde(default)]
    pub nodes: Vec<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use flate2::Compression;
    use flate2::write::GzEncoder;

    const TOY_DEVICE: &str = r#"{
        "name": "toy",
        "tiles": [
            { "name": "INT_X0Y0", "x": 0, "y": 0 },
            { "name": "INT_X1Y0", "x": 1, "y": 0 }
        ],
        "pips": [
            { "tile": "INT_X0Y0", "from": "LOGIC_OUT0", "to": "EE1BEG0" },
            { "tile": "INT_X1Y0", "from": "EE1END0", "to": "IMUX0" },
            { "tile": "INT_X1Y0", "from": "IMUX0", "to": "BYP0", "bidirectional": true }
        ],
        "nodes": [
            ["INT_X0Y0/EE1BEG0", "INT_X1Y0/EE1END0"]
        ]
    }"#;

    fn toy() -> MemDevice {
        let desc: DeviceDescription = serde_json::from_str(TOY_DEVICE).unwrap();
        MemDevice::from_description(&desc).unwrap()
    }

    fn temp_path(name: &str, ext: &str) -> PathBuf {
        std::env::temp_dir().join(format!("sbx-{}-{}.{}", name, std::process::id(), ext))
    }

    #[test]
    fn test_load_json_plain_and_gzipped() {
        let plain = temp_path("toy-device", "json");
        std::fs::write(&plain, TOY_DEVICE).unwrap();

        let gzipped = temp_path("toy-device", "json.gz");
        let mut encoder = GzEncoder::new(File::create(&gzipped).unwrap(), Compression::default());
        encoder.write_all(TOY_DEVICE.as_bytes()).unwrap();
        encoder.finish().unwrap();

        for path in [&plain, &gzipped] {
            let device = MemDevice::load_json(path).unwrap();
            assert_eq!(device.name(), "toy");
            assert_eq!(device.tile_count(), 2);
            assert_eq!(device.wire_count(), 5);
            assert_eq!(device.pip_count(), 3);
            assert_eq!(device.node_count(), 1);
        }

        /* Compressed data is only decompressed when the name says so */
        std::fs::copy(&gzipped, &plain).unwrap();
        assert!(matches!(MemDevice::load_json(&plain), Err(DeviceError::Json(_))));

        std::fs::remove_file(&plain).unwrap();
        std::fs::remove_file(&gzipped).unwrap();
        assert!(matches!(MemDevice::load_json(&plain), Err(DeviceError::Io(_))));
    }

    #[test]
    fn test_description_creates_wires_implicitly() {
        let device = toy();
        assert_eq!(device.name(), "toy");
        assert_eq!(device.tile_count(), 2);
        assert_eq!(device.wire_count(), 5);
        assert_eq!(device.pip_count(), 3);
        assert_eq!(device.node_count(), 1);
    }

    #[test]
    fn test_forward_and_backward_pips() {
        let device = toy();
        let t1 = device.find_tile("INT_X1Y0").unwrap();
        let imux = device.find_wire(t1, "IMUX0").unwrap();
        let end = device.find_wire(t1, "EE1END0").unwrap();

        assert_eq!(device.forward_pips(imux).len(), 1);
        assert_eq!(device.backward_pips(imux).len(), 2);
        assert_eq!(device.pip_source(device.backward_pips(imux)[0]), end);
        assert!(device.pip_is_bidirectional(device.forward_pips(imux)[0]));
        assert_eq!(device.tile_pips(t1).len(), 2);
    }

    #[test]
    fn test_bidirectional_pip_is_seen_from_both_ends() {
        let device = toy();
        let t1 = device.find_tile("INT_X1Y0").unwrap();
        let imux = device.find_wire(t1, "IMUX0").unwrap();
        let byp = device.find_wire(t1, "BYP0").unwrap();
        let pip = device.forward_pips(imux)[0];

        assert_eq!(device.forward_pips(byp), &[pip]);
        assert_eq!(device.backward_pips(byp), &[pip]);
        assert!(device.backward_pips(imux).contains(&pip));
        assert_eq!(device.pip_far_end(pip, imux), byp);
        assert_eq!(device.pip_far_end(pip, byp), imux);
    }

    #[test]
    fn test_node_driver_and_downstream() {
        let device = toy();
        let t0 = device.find_tile("INT_X0Y0").unwrap();
        let beg = device.find_wire(t0, "EE1BEG0").unwrap();
        let node = device.wire_node(beg).unwrap();

        assert_eq!(device.node_driver(node), Some(beg));
        let downstream = device.node_downstream_wires(node);
        assert_eq!(downstream.len(), 1);
        assert_eq!(device.wire_name(downstream[0]), "IMUX0");
    }

    #[test]
    fn test_wire_in_two_nodes_is_rejected() {
        let mut device = toy();
        let t0 = device.find_tile("INT_X0Y0").unwrap();
        let beg = device.find_wire(t0, "EE1BEG0").unwrap();
        assert!(matches!(
            device.add_node(vec![beg]),
            Err(DeviceError::WireInMultipleNodes { .. })
        ));
    }

    #[test]
    fn test_duplicates_are_rejected() {
        let mut device = toy();
        assert!(matches!(
            device.add_tile("INT_X0Y0", TileCoord::new(5, 5)),
            Err(DeviceError::DuplicateTile(_))
        ));
        let t0 = device.find_tile("INT_X0Y0").unwrap();
        assert!(matches!(
            device.add_wire(t0, "LOGIC_OUT0"),
            Err(DeviceError::DuplicateWire { .. })
        ));
    }

    #[test]
    fn test_bad_wire_reference() {
        let desc = DeviceDescription {
            name: "bad".into(),
            tiles: vec![TileDescription { name: "INT_X0Y0".into(), x: 0, y: 0 }],
            pips: Vec::new(),
            nodes: vec![vec!["INT_X0Y0:A".into()]],
        };
        assert!(matches!(
            MemDevice::from_description(&desc),
            Err(DeviceError::MalformedWireRef(_))
        ));
    }
}
