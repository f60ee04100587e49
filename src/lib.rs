//! proctail library
//!
//! Rebuilds per-process memory mapping information from the merged output of
//! a tool tailing many `/proc/<pid>/smaps` and `/proc/<pid>/cmdline` files at
//! once. Files in such a stream are separated by marker lines:
//!
//! ```text
//! ==> /proc/42/cmdline <==
//! /bin/true
//! ==> /proc/42/smaps <==
//! 08048000-08049000 r-xp 00000000 03:00 8312 /bin/true
//! Rss:                   4 kB
//! Pss:                   4 kB
//! ```
//!
//! # Features
//!
//! - **Demultiplexing**: Lines are routed to the owning process and section
//! - **Region decoding**: smaps records become typed [`MemoryRegion`] values
//! - **Aggregation**: PSS per permission class, heap, stack and raw counter sums
//! - **Resilience**: Broken records and marker lines are reported, not fatal
//!
//! # Usage
//!
//! ```rust
//! use proctail::{ParserConfig, StreamDemultiplexer};
//!
//! let mut demux = StreamDemultiplexer::new(ParserConfig::default());
//! for line in [
//!     "==> /proc/42/smaps <==",
//!     "08048000-08049000 r-xp 00000000 03:00 8312 /bin/true",
//!     "Pss: 4 kB",
//! ] {
//!     demux.feed_line(line).unwrap();
//! }
//!
//! // The stream has no end marker: the final flush is mandatory.
//! let registry = demux.finish().unwrap();
//! assert_eq!(registry.get(42).unwrap().rx_private(), 4);
//! ```

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod parser;
pub mod process;

// Re-export main types for convenience
pub use config::{load_config, validate_config, ConfigError, MalformedRegionPolicy, ParserConfig};
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, TracingSink};
pub use error::ParseError;
pub use parser::{read_tailed, DemuxStats, StreamDemultiplexer};
pub use process::{
    AccessClass, AccessFlags, MemoryRegion, MemoryStats, Process, ProcessRegistry, PssBuckets,
    Sharing,
};
