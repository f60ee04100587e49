//! Check command implementation.
//!
//! Validates the configuration and optionally dry-runs a capture.

use std::path::Path;

use super::parse::open_input;
use proctail::{validate_config, Diagnostic, DiagnosticKind, ParserConfig, StreamDemultiplexer};

/// Validates configuration and reports what a capture would produce.
pub fn command_check(input: Option<&Path>, config: &ParserConfig) -> anyhow::Result<()> {
    println!("🔍 proctail - Check");
    println!("===================");

    let mut all_ok = true;

    println!("\n⚙️  Checking configuration...");
    match validate_config(config) {
        Ok(_) => {
            println!("   ✅ Configuration is valid");
            println!("   ├─ on_malformed_region: {}", config.on_malformed_region);
            println!("   └─ retain_raw_sections: {}", config.retain_raw_sections);
        }
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    if let Some(path) = input {
        println!("\n📄 Dry-running capture {}...", path.display());

        let reader = open_input(Some(path))?;
        let mut demux = StreamDemultiplexer::with_sink(config.clone(), Vec::<Diagnostic>::new());
        demux.consume(reader)?;
        if let Err(e) = demux.end_of_stream() {
            println!("   ⚠️  Final section aborted: {}", e);
        }

        let stats = demux.stats();
        println!("   ├─ Lines: {}", stats.lines);
        println!("   ├─ Boundaries: {}", stats.boundaries);
        println!("   ├─ Self references ignored: {}", stats.self_references);
        println!("   ├─ Processes: {}", demux.registry().len());
        println!("   ├─ Regions: {}", stats.regions);
        println!("   ├─ Skipped regions: {}", stats.skipped_regions);
        println!("   └─ Desyncs: {}", stats.desyncs);

        let diagnostics = demux.sink();
        for d in diagnostics.iter().take(10) {
            let marker = match d.kind {
                DiagnosticKind::MalformedRegion => "region",
                DiagnosticKind::ProtocolDesync => "desync",
            };
            println!("   ❌ [{}] {}", marker, d);
        }
        if diagnostics.len() > 10 {
            println!("   ... and {} more", diagnostics.len() - 10);
        }
        if !diagnostics.is_empty() {
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review the output above");
        std::process::exit(1);
    }
}
