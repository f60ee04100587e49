//! Stream parsing: the tail demultiplexer and the per-section decoders.
//!
//! This module provides:
//! - `tail`: Demultiplexing of `==> /proc/<pid>/<section> <==` streams
//! - `smaps`: Decoding of single memory region records
//! - `cmdline`: Splitting NUL-separated command lines

pub mod cmdline;
pub mod smaps;
pub mod tail;

// Re-export commonly used types
pub use cmdline::split_cmdline;
pub use smaps::{is_region_header, parse_kb_value, parse_region, parse_region_text};
pub use tail::{read_tailed, DemuxStats, StreamDemultiplexer, CMDLINE_SECTION, SMAPS_SECTION};
