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

use clap::{Args, Parser, Subcommand};
use std::error::Error;
use std::path::{Path, PathBuf};

use sbx::common::split_range_nicely;
use sbx::device::{DeviceModel, MemDevice, TileId};
use sbx::error::TopologyError;
use sbx::exporter::{CompoundJsonExporter, Exporter};
#[allow(unused)]
use sbx::log::*;
use sbx::dbg_log;
use sbx::topology::{
    process_query,
    ChannelContributionAnalyzer,
    Query,
    QuerySummary,
    Region,
    RegionChannelReport,
    RegionSummary,
};
use sbx::topology::channel::DEFAULT_SWITCHBOX_PREFIX;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser, Debug)]
#[clap(
    author = "Antmicro",
    version = "0.1.0",
    about = "SBX - switchbox topology extractor",
    long_about = None
)]
struct Cli {
    #[clap(help = "Device file: JSON description (.json, .json.gz) or fpga-interchange device")]
    device: String,
    #[clap(long, help = "Use raw (uncompressed) fpga-interchange device file")]
    raw: bool,
    #[clap(subcommand)]
    command: SubCommands,
}

#[derive(Args, Debug)]
struct ExportOpts {
    #[clap(long, help = "Regions to be exported to JSON (`:all` exports every region)")]
    json: Option<Vec<String>>,
    #[clap(long, default_value = "", help = "Directory for saving .json files")]
    json_prefix: String,
}

impl ExportOpts {
    fn exporter<D>(&self, device: &MemDevice, what: &str) -> CompoundJsonExporter<D>
    where
        D: serde::Serialize
    {
        CompoundJsonExporter::new(
            &self.json,
            Path::new(&self.json_prefix).join(format!("{}_{}.json", device.name(), what))
        )
    }
}

#[derive(Args, Debug)]
struct ScrapeCmd {
    #[clap(long, help = "Switchbox tiles to be scraped (all switchbox tiles by default)")]
    region: Vec<String>,
    #[clap(
        long,
        default_value = DEFAULT_SWITCHBOX_PREFIX,
        help = "Name prefix of switchbox tiles"
    )]
    switchbox_prefix: String,
    #[clap(long, default_value = "1", help = "Number of threads to be used for scraping")]
    threads: usize,
    #[clap(flatten)]
    export: ExportOpts,
}

#[derive(Args, Debug)]
struct QueryCmd {
    #[clap(help = "Query file (YAML, or JSON when ending with .json)")]
    query: PathBuf,
    #[clap(
        long,
        default_value = DEFAULT_SWITCHBOX_PREFIX,
        help = "Name prefix of switchbox tiles, used when the query lists no regions"
    )]
    switchbox_prefix: String,
    #[clap(long, default_value = "1", help = "Number of threads to be used")]
    threads: usize,
    #[clap(flatten)]
    export: ExportOpts,
}

#[derive(Args, Debug)]
struct ChannelsCmd {
    #[clap(long, help = "Switchbox tiles to be analyzed (all switchbox tiles by default)")]
    region: Vec<String>,
    #[clap(
        long,
        default_value = DEFAULT_SWITCHBOX_PREFIX,
        help = "Name prefix of switchbox tiles"
    )]
    switchbox_prefix: String,
    #[clap(long, default_value = "1", help = "Number of threads to be used")]
    threads: usize,
    #[clap(flatten)]
    export: ExportOpts,
}

#[derive(Subcommand, Debug)]
enum SubCommands {
    /// Classify, resolve and cluster the junctions of switchbox tiles
    Scrape(ScrapeCmd),
    /// Build cluster graphs of switchbox tiles according to a query file
    Query(QueryCmd),
    /// Estimate the routing channel usage of switchbox tiles
    Channels(ChannelsCmd),
}

fn load_device(cli: &Cli) -> CliResult<MemDevice> {
    if cli.device.ends_with(".json") || cli.device.ends_with(".json.gz") {
        return Ok(MemDevice::load_json(&cli.device)?);
    }
    load_interchange(cli)
}

#[cfg(feature = "interchange")]
fn load_interchange(cli: &Cli) -> CliResult<MemDevice> {
    use sbx::ic_loader::{self, OpenOpts};

    Ok(ic_loader::load_device(&cli.device, OpenOpts { raw: cli.raw })?)
}

#[cfg(not(feature = "interchange"))]
fn load_interchange(cli: &Cli) -> CliResult<MemDevice> {
    Err(format!(
        "{} is not a JSON device description. fpga-interchange device files \
         require the `interchange` feature",
        cli.device
    ).into())
}

fn select_tiles(device: &MemDevice, names: &[String], switchbox_prefix: &str)
    -> Result<Vec<TileId>, TopologyError>
{
    if names.is_empty() {
        return Ok(device.tiles()
            .filter(|tile| device.tile_name(*tile).starts_with(switchbox_prefix))
            .filter(|tile| !device.tile_pips(*tile).is_empty())
            .collect());
    }

    names.iter()
        .map(|name| {
            device.find_tile(name).ok_or_else(|| TopologyError::UnknownRegion(name.clone()))
        })
        .collect()
}

/// Runs `f` for every tile, spreading the tiles over `threads` threads. Results keep
/// the order of `tiles`.
fn for_each_region<T, F>(tiles: &[TileId], threads: usize, f: F)
    -> Vec<Result<T, TopologyError>>
where
    T: Send,
    F: Fn(TileId) -> Result<T, TopologyError> + Sync,
{
    if threads <= 1 {
        return tiles.iter().map(|tile| f(*tile)).collect();
    }

    let f = &f;
    std::thread::scope(|s| {
        let handles: Vec<_> = split_range_nicely(0 .. tiles.len(), threads)
            .map(|range| {
                let chunk = &tiles[range];
                s.spawn(move || chunk.iter().map(|tile| f(*tile)).collect::<Vec<_>>())
            })
            .collect();

        handles.into_iter()
            .flat_map(|handle| {
                handle.join().unwrap_or_else(|e| std::panic::resume_unwind(e))
            })
            .collect()
    })
}

/* Reports the failed regions and keeps the rest. */
fn keep_successful<T>(results: Vec<Result<T, TopologyError>>, failed: &mut usize) -> Vec<T> {
    results.into_iter()
        .filter_map(|result| match result {
            Ok(value) => Some(value),
            Err(e) => {
                eprintln!("error: {}", e);
                *failed += 1;
                None
            }
        })
        .collect()
}

fn flush_export<D>(json_exporter: &mut CompoundJsonExporter<D>) -> CliResult<()>
where
    D: serde::Serialize
{
    json_exporter.flush()?;
    if !json_exporter.is_empty() {
        println!(
            "Exported {} regions to {}",
            json_exporter.len(),
            json_exporter.filename().display()
        );
    }
    Ok(())
}

fn finish(failed: usize, total: usize) -> CliResult<()> {
    if failed != 0 {
        return Err(format!("{} out of {} regions failed", failed, total).into());
    }
    Ok(())
}

fn scrape(args: ScrapeCmd, device: &MemDevice) -> CliResult<()> {
    let tiles = select_tiles(device, &args.region, &args.switchbox_prefix)?;
    let mut json_exporter: CompoundJsonExporter<RegionSummary> =
        args.export.exporter(device, "regions");

    let results = for_each_region(&tiles, args.threads, |tile| {
        Region::new(device, tile).map(|region| RegionSummary::new(&region))
    });

    let mut failed = 0;
    for summary in keep_successful(results, &mut failed) {
        println!(concat!(
            "Region {} (X{}Y{}):\n",
            "    No. of junctions:                   {}\n",
            "    No. of junctions leaving the tile:  {}\n",
            "    No. of diagnostics:                 {}"
            ),
            summary.name,
            summary.x,
            summary.y,
            summary.junctions.len(),
            summary.external_count(),
            summary.diagnostics.len()
        );

        let name = summary.name.clone();
        json_exporter.ignore_or_export(&name, || summary)?;
    }

    flush_export(&mut json_exporter)?;
    finish(failed, tiles.len())
}

fn query(args: QueryCmd, device: &MemDevice) -> CliResult<()> {
    let query = Query::load(&args.query)?;
    let tiles = select_tiles(device, &query.regions, &args.switchbox_prefix)?;
    let mut json_exporter: CompoundJsonExporter<QuerySummary> =
        args.export.exporter(device, "query");

    let results = for_each_region(&tiles, args.threads, |tile| {
        let region = Region::new(device, tile)?;
        let result = process_query(&region, &query)?;
        Ok(QuerySummary::new(&region, &result))
    });

    let mut failed = 0;
    for summary in keep_successful(results, &mut failed) {
        let edges: usize = summary.cluster_graph.values().map(Vec::len).sum();
        println!(concat!(
            "Region {}:\n",
            "    No. of filtered junctions:  {}\n",
            "    No. of clusters:            {}\n",
            "    No. of cluster graph edges: {}"
            ),
            summary.region,
            summary.filtered_junctions.len(),
            summary.clusters.len(),
            edges
        );

        let name = summary.region.clone();
        json_exporter.ignore_or_export(&name, || summary)?;
    }

    flush_export(&mut json_exporter)?;
    finish(failed, tiles.len())
}

fn channels(args: ChannelsCmd, device: &MemDevice) -> CliResult<()> {
    let tiles = select_tiles(device, &args.region, &args.switchbox_prefix)?;
    let mut json_exporter: CompoundJsonExporter<RegionChannelReport> =
        args.export.exporter(device, "channels");

    let results = for_each_region(&tiles, args.threads, |tile| {
        let analyzer = ChannelContributionAnalyzer::new(device)
            .with_switchbox_prefix(&args.switchbox_prefix);
        let region = Region::new(device, tile)?;
        Ok(analyzer.region_report(&region))
    });

    let mut failed = 0;
    let mut total = RegionChannelReport::default();
    for report in keep_successful(results, &mut failed) {
        println!(
            "Region {}: H={} V={}, {} distinct spans",
            report.region,
            report.horizontal,
            report.vertical,
            report.spans.len()
        );
        total.horizontal += report.horizontal;
        total.vertical += report.vertical;

        let name = report.region.clone();
        json_exporter.ignore_or_export(&name, || report)?;
    }
    println!("Total: H={} V={}", total.horizontal, total.vertical);

    flush_export(&mut json_exporter)?;
    finish(failed, tiles.len())
}

fn run(cli: Cli) -> CliResult<()> {
    let device = load_device(&cli)?;
    dbg_log!(
        DBG_INFO,
        "Device {}: {} tiles, {} wires, {} PIPs, {} nodes",
        device.name(),
        device.tile_count(),
        device.wire_count(),
        device.pip_count(),
        device.node_count()
    );

    match cli.command {
        SubCommands::Scrape(args) => scrape(args, &device),
        SubCommands::Query(args) => query(args, &device),
        SubCommands::Channels(args) => channels(args, &device),
    }
}

fn main() {
    let cli = Cli::parse();

    let threads = match &cli.command {
        SubCommands::Scrape(args) => args.threads,
        SubCommands::Query(args) => args.threads,
        SubCommands::Channels(args) => args.threads,
    };
    if threads == 0 {
        eprintln!("error: --threads must be at least 1");
        std::process::exit(2);
    }

    if let Err(e) = run(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
