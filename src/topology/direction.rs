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

use std::cmp::Ordering;
use serde::{Serialize, Deserialize};

use crate::device::TileCoord;

/// Compass direction of a global routing wire.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum GlobalRouteDirection {
    EE,
    WW,
    NN,
    SS,
    NE,
    NW,
    SE,
    SW,
    /// Both ends in the same location
    Local,
    /// The direction couldn't be inferred from the wire's name
    Unclassified,
}

/* Two-letter wire name prefixes. The single-hop "turn" wires (eg. `NL1BEG0`,
 * `ER1BEG3`) are folded into their main direction. */
const NAME_PREFIXES: &[(&str, GlobalRouteDirection)] = &[
    ("EE", GlobalRouteDirection::EE),
    ("WW", GlobalRouteDirection::WW),
    ("NN", GlobalRouteDirection::NN),
    ("SS", GlobalRouteDirection::SS),
    ("NE", GlobalRouteDirection::NE),
    ("NW", GlobalRouteDirection::NW),
    ("SE", GlobalRouteDirection::SE),
    ("SW", GlobalRouteDirection::SW),
    ("EL", GlobalRouteDirection::EE),
    ("ER", GlobalRouteDirection::EE),
    ("WL", GlobalRouteDirection::WW),
    ("WR", GlobalRouteDirection::WW),
    ("NL", GlobalRouteDirection::NN),
    ("NR", GlobalRouteDirection::NN),
    ("SL", GlobalRouteDirection::SS),
    ("SR", GlobalRouteDirection::SS),
];

impl GlobalRouteDirection {
    /// Direction in which `to` lies when looking from `from`.
    pub fn between(from: TileCoord, to: TileCoord) -> Self {
        use GlobalRouteDirection::*;

        match (to.x.cmp(&from.x), to.y.cmp(&from.y)) {
            (Ordering::Equal, Ordering::Equal) => Local,
            (Ordering::Greater, Ordering::Equal) => EE,
            (Ordering::Less, Ordering::Equal) => WW,
            (Ordering::Equal, Ordering::Greater) => NN,
            (Ordering::Equal, Ordering::Less) => SS,
            (Ordering::Greater, Ordering::Greater) => NE,
            (Ordering::Less, Ordering::Greater) => NW,
            (Ordering::Greater, Ordering::Less) => SE,
            (Ordering::Less, Ordering::Less) => SW,
        }
    }

    pub fn from_name(name: &str) -> Self {
        NAME_PREFIXES.iter()
            .find(|(prefix, _)| name.starts_with(*prefix))
            .map(|(_, dir)| *dir)
            .unwrap_or(GlobalRouteDirection::Unclassified)
    }

    pub fn opposite(self) -> Self {
        use GlobalRouteDirection::*;

        match self {
            EE => WW,
            WW => EE,
            NN => SS,
            SS => NN,
            NE => SW,
            SW => NE,
            NW => SE,
            SE => NW,
            Local => Local,
            Unclassified => Unclassified,
        }
    }

    pub fn is_classified(self) -> bool {
        self != GlobalRouteDirection::Unclassified
    }

    pub fn as_str(self) -> &'static str {
        use GlobalRouteDirection::*;

        match self {
            EE => "EE",
            WW => "WW",
            NN => "NN",
            SS => "SS",
            NE => "NE",
            NW => "NW",
            SE => "SE",
            SW => "SW",
            Local => "LOCAL",
            Unclassified => "UNCLASSIFIED",
        }
    }
}

impl std::fmt::Display for GlobalRouteDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
