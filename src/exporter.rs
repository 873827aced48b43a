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

use std::path::{Path, PathBuf};
use std::fs::File;
use std::collections::{BTreeMap, HashSet};
use std::io::Write;

use serde::Serialize;

/// Name which selects every exported item.
pub const EXPORT_ALL: &str = ":all";

#[derive(Default)]
struct ExportChecker {
    export: HashSet<String>,
    export_all: bool,
}

impl ExportChecker {
    fn new(arg_list: &Option<Vec<String>>) -> Self {
        let mut checker = Self::default();
        if let Some(args) = arg_list {
            for arg in args {
                if arg == EXPORT_ALL {
                    checker.export_all = true;
                } else {
                    checker.export.insert(arg.clone());
                }
            }
        }
        checker
    }

    fn should_export(&self, name: &str) -> bool {
        self.export_all || self.export.contains(name)
    }

    fn is_empty(&self) -> bool {
        !self.export_all && self.export.is_empty()
    }
}

pub trait Exporter<D> {
    /// Stores the data produced by `exporter` under `name` if `name` was selected.
    /// `exporter` is not called otherwise.
    fn ignore_or_export<'s, F>(&'s mut self, name: &str, exporter: F)
        -> std::io::Result<()>
    where
        F: FnOnce() -> D + 's;

    fn flush(&mut self) -> std::io::Result<()>;
}

/// Collects the selected items and writes all of them into a single JSON object,
/// keyed by name.
pub struct CompoundJsonExporter<D> where D: Serialize {
    filename: PathBuf,
    data: BTreeMap<String, D>,
    checker: ExportChecker,
}

impl<D> CompoundJsonExporter<D> where D: Serialize {
    pub fn new(arg_list: &Option<Vec<String>>, filename: PathBuf) -> Self {
        Self {
            filename,
            data: BTreeMap::new(),
            checker: ExportChecker::new(arg_list),
        }
    }

    pub fn filename(&self) -> &Path {
        &self.filename
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl<D> Exporter<D> for CompoundJsonExporter<D> where D: Serialize {
    fn ignore_or_export<'s, F>(&'s mut self, name: &str, exporter: F)
        -> std::io::Result<()>
    where
        F: FnOnce() -> D + 's
    {
        if self.checker.should_export(name) {
            let data = exporter();
            self.data.insert(name.into(), data);
        }
        Ok(())
    }

    /* Nothing gets written if nothing was selected for export. */
    fn flush(&mut self) -> std::io::Result<()> {
        if self.checker.is_empty() {
            return Ok(());
        }
        let data = serde_json::to_string_pretty(&self.data)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let mut file = File::create(&self.filename)?;
        file.write_all(data.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("sbx-{}-{}.json", name, std::process::id()))
    }

    #[test]
    fn test_exports_only_selected_items() {
        let path = temp_path("selected");
        let selection = Some(vec!["INT_X0Y0".to_string()]);
        let mut exporter = CompoundJsonExporter::new(&selection, path.clone());

        let mut called = false;
        exporter.ignore_or_export("INT_X0Y0", || 1u32).unwrap();
        exporter.ignore_or_export("INT_X1Y0", || { called = true; 2u32 }).unwrap();
        assert!(!called);
        assert_eq!(exporter.len(), 1);

        exporter.flush().unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(written, serde_json::json!({ "INT_X0Y0": 1 }));
    }

    #[test]
    fn test_export_all() {
        let path = temp_path("all");
        let mut exporter = CompoundJsonExporter::new(
            &Some(vec![EXPORT_ALL.to_string()]),
            path.clone()
        );
        exporter.ignore_or_export("b", || "second").unwrap();
        exporter.ignore_or_export("a", || "first").unwrap();
        exporter.flush().unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(written.find("\"a\"").unwrap() < written.find("\"b\"").unwrap());
    }

    #[test]
    fn test_nothing_selected_writes_nothing() {
        let path = temp_path("none");
        let mut exporter = CompoundJsonExporter::<u32>::new(&None, path.clone());
        exporter.ignore_or_export("anything", || 0).unwrap();
        exporter.flush().unwrap();
        assert!(!path.exists());
    }
}
