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

/* Splits a range into `slices` possibly even ranges  */
pub fn split_range_nicely(range: std::ops::Range<usize>, slices: usize)
    -> impl Iterator<Item = std::ops::Range<usize>>
{
    let len = range.end - range.start;
    let split_sz = len / slices;
    let total = split_sz * slices;
    let left = len - total;
    let base = range.start;

    (0 .. slices)
        .scan((base, left), move |(current_idx, left), _| {
            let my_len = if *left > 0 {
                *left -= 1;
                split_sz + 1
            } else {
                split_sz
            };
            let range = *current_idx .. (*current_idx + my_len);
            *current_idx += my_len;
            return Some(range);
        })
        .filter(|range| range.start != range.end)
}

/// Parses the `X<col>Y<row>` suffix found at the end of Xilinx-style tile names,
/// eg. `INT_L_X2Y104` -> `(2, 104)`.
pub fn parse_xy_suffix(name: &str) -> Option<(i32, i32)> {
    let x_pos = name.rfind("_X")? + 1;
    let suffix = &name[x_pos + 1 ..];
    let (x, y) = suffix.split_once('Y')?;
    Some((x.parse().ok()?, y.parse().ok()?))
}
