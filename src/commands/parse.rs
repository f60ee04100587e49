//! Parse command implementation.
//!
//! Runs a captured stream through the demultiplexer and prints the
//! per-process aggregates in a machine-readable format.

use anyhow::Context;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use tracing::info;

use crate::cli::OutputFormat;
use proctail::{validate_config, MemoryRegion, ParserConfig, Process, StreamDemultiplexer};

/// One region, flattened for output.
#[derive(Debug, Serialize)]
struct RegionSummary {
    start: String,
    end: String,
    permissions: String,
    name: String,
    size_kb: u64,
    rss_kb: u64,
    pss_kb: u64,
    swap_kb: u64,
    vm_flags: Vec<String>,
}

impl From<&MemoryRegion> for RegionSummary {
    fn from(r: &MemoryRegion) -> Self {
        Self {
            start: format!("{:#x}", r.start),
            end: format!("{:#x}", r.end),
            permissions: r.permissions.to_string(),
            name: r.name.clone(),
            size_kb: r.size() / 1024,
            rss_kb: r.rss,
            pss_kb: r.pss,
            swap_kb: r.swap,
            vm_flags: r.vm_flags.clone(),
        }
    }
}

/// Aggregates of a single process, all values in kB.
#[derive(Debug, Serialize)]
struct ProcessSummary {
    pid: u32,
    argv: Vec<String>,
    regions: usize,
    rss_kb: u64,
    pss_kb: u64,
    heap_kb: u64,
    stack_kb: u64,
    ro_shared_kb: u64,
    ro_private_kb: u64,
    rw_shared_kb: u64,
    rw_private_kb: u64,
    rx_shared_kb: u64,
    rx_private_kb: u64,
    rwx_shared_kb: u64,
    rwx_private_kb: u64,
    shared_clean_kb: u64,
    shared_dirty_kb: u64,
    private_clean_kb: u64,
    private_dirty_kb: u64,
    referenced_kb: u64,
    anonymous_kb: u64,
    swap_kb: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    mappings: Vec<RegionSummary>,
}

impl ProcessSummary {
    fn new(p: &Process, with_regions: bool) -> Self {
        let buckets = p.pss_buckets();
        let mappings = if with_regions {
            p.sorted_regions().into_iter().map(RegionSummary::from).collect()
        } else {
            Vec::new()
        };

        Self {
            pid: p.pid,
            argv: p.argv.clone(),
            regions: p.num_fragments(),
            rss_kb: p.rss(),
            pss_kb: p.pss(),
            heap_kb: p.heap(),
            stack_kb: p.stack(),
            ro_shared_kb: buckets.ro_shared,
            ro_private_kb: buckets.ro_private,
            rw_shared_kb: buckets.rw_shared,
            rw_private_kb: buckets.rw_private,
            rx_shared_kb: buckets.rx_shared,
            rx_private_kb: buckets.rx_private,
            rwx_shared_kb: buckets.rwx_shared,
            rwx_private_kb: buckets.rwx_private,
            shared_clean_kb: p.shared_clean(),
            shared_dirty_kb: p.shared_dirty(),
            private_clean_kb: p.private_clean(),
            private_dirty_kb: p.private_dirty(),
            referenced_kb: p.referenced(),
            anonymous_kb: p.anonymous(),
            swap_kb: p.swap(),
            mappings,
        }
    }
}

/// Root document; TOML needs a table at the top level.
#[derive(Debug, Serialize)]
struct ParseReport {
    processes: Vec<ProcessSummary>,
}

/// Opens the capture file, or stdin for `None` and `-`.
pub fn open_input(path: Option<&Path>) -> anyhow::Result<Box<dyn BufRead>> {
    match path {
        Some(p) if p.as_os_str() != "-" => {
            let file = File::open(p)
                .with_context(|| format!("Failed to open capture file {}", p.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        _ => Ok(Box::new(io::stdin().lock())),
    }
}

/// Parses a capture and prints per-process aggregates.
pub fn command_parse(
    input: Option<&Path>,
    format: OutputFormat,
    pid: Option<u32>,
    with_regions: bool,
    config: &ParserConfig,
) -> anyhow::Result<()> {
    validate_config(config)?;

    let reader = open_input(input)?;
    let mut demux = StreamDemultiplexer::new(config.clone());
    demux.consume(reader).context("Failed to read capture")?;
    if let Err(e) = demux.end_of_stream() {
        info!("Final section aborted: {}", e);
    }

    let stats = demux.stats();
    info!(
        "Parsed {} lines: {} boundaries, {} regions, {} skipped regions, {} desyncs",
        stats.lines, stats.boundaries, stats.regions, stats.skipped_regions, stats.desyncs
    );

    let registry = demux.into_registry();
    let processes = registry
        .pids_sorted()
        .into_iter()
        .filter(|p| pid.map_or(true, |wanted| wanted == *p))
        .filter_map(|p| registry.get(p))
        .map(|p| ProcessSummary::new(p, with_regions))
        .collect();

    let report = ParseReport { processes };
    let output = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&report)?,
        OutputFormat::Toml => toml::to_string_pretty(&report)?,
        OutputFormat::Yaml => serde_yaml::to_string(&report)?,
    };
    println!("{output}");
    Ok(())
}
