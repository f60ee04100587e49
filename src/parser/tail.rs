//! Demultiplexer for tailed `/proc/<pid>/<section>` output.
//!
//! Tools like `tail -F /proc/*/smaps /proc/*/cmdline` merge many files into a
//! single stream and mark every switch between files with a line such as
//! `==> /proc/99/smaps <==`. The [`StreamDemultiplexer`] follows those
//! markers, buffers the text of the active section and hands completed
//! sections (and completed smaps regions) to the parsers.
//!
//! The stream has no end marker. Callers must invoke
//! [`StreamDemultiplexer::end_of_stream`] after the last line, otherwise the
//! final section is lost.

use once_cell::sync::Lazy;
use regex::Regex;
use std::io::BufRead;
use tracing::{debug, trace};

use crate::config::{MalformedRegionPolicy, ParserConfig};
use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use crate::error::ParseError;
use crate::parser::cmdline::split_cmdline;
use crate::parser::smaps::{is_region_header, parse_region_text};
use crate::process::ProcessRegistry;

pub const SMAPS_SECTION: &str = "smaps";
pub const CMDLINE_SECTION: &str = "cmdline";

const BOUNDARY_PREFIX: &str = "==>";
const SELF_REFERENCES: [&str; 2] = ["/proc/self/", "/proc/thread-self/"];

static BOUNDARY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^==> /proc/([0-9]+)/(\w+) <==$").expect("boundary regex is valid")
});

/// Counters describing what the demultiplexer has seen so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DemuxStats {
    pub lines: u64,
    pub boundaries: u64,
    pub self_references: u64,
    pub desyncs: u64,
    pub regions: u64,
    pub skipped_regions: u64,
    pub aborted_sections: u64,
}

/// Line-driven state machine that rebuilds per-process data from the stream.
pub struct StreamDemultiplexer<S: DiagnosticSink = TracingSink> {
    config: ParserConfig,
    registry: ProcessRegistry,
    current_pid: Option<u32>,
    current_section: String,
    buffer: String,
    stats: DemuxStats,
    sink: S,
}

impl StreamDemultiplexer<TracingSink> {
    pub fn new(config: ParserConfig) -> Self {
        Self::with_sink(config, TracingSink)
    }
}

impl Default for StreamDemultiplexer<TracingSink> {
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

impl<S: DiagnosticSink> StreamDemultiplexer<S> {
    pub fn with_sink(config: ParserConfig, sink: S) -> Self {
        Self {
            config,
            registry: ProcessRegistry::new(),
            current_pid: None,
            current_section: String::new(),
            buffer: String::new(),
            stats: DemuxStats::default(),
            sink,
        }
    }

    pub fn registry(&self) -> &ProcessRegistry {
        &self.registry
    }

    pub fn current_pid(&self) -> Option<u32> {
        self.current_pid
    }

    /// Name of the active section, empty if none.
    pub fn current_section(&self) -> &str {
        &self.current_section
    }

    /// Text buffered for the active section and not yet flushed.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    pub fn stats(&self) -> DemuxStats {
        self.stats
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Consumes one line of the stream. A trailing line terminator is optional.
    ///
    /// Only returns an error when a region fails to parse under
    /// [`MalformedRegionPolicy::Abort`]; the demultiplexer stays usable.
    pub fn feed_line(&mut self, line: &str) -> Result<(), ParseError> {
        let line = line.strip_suffix('\n').unwrap_or(line);
        let line = line.strip_suffix('\r').unwrap_or(line);
        self.stats.lines += 1;

        if line.trim().is_empty() {
            return Ok(());
        }

        if let Some(caps) = BOUNDARY_RE.captures(line) {
            return match caps[1].parse::<u32>() {
                Ok(pid) => self.switch_section(pid, &caps[2]),
                Err(_) => {
                    self.desync(line);
                    Ok(())
                }
            };
        }

        if line.starts_with(BOUNDARY_PREFIX) {
            if SELF_REFERENCES.iter().any(|s| line.contains(s)) {
                // The tailing tool watching its own /proc entry.
                self.stats.self_references += 1;
                trace!("Ignoring self reference: {}", line);
            } else {
                self.desync(line);
            }
            return Ok(());
        }

        if self.current_section == SMAPS_SECTION && is_region_header(line) {
            let previous = std::mem::take(&mut self.buffer);
            self.flush_region(&previous)?;
            self.append(line);
            return Ok(());
        }

        if !self.current_section.is_empty() {
            self.append(line);
            return Ok(());
        }

        self.desync(line);
        Ok(())
    }

    /// Feeds every line of an iterator, stopping at the first aborted section.
    pub fn feed_lines<'a, I>(&mut self, lines: I) -> Result<(), ParseError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for line in lines {
            self.feed_line(line)?;
        }
        Ok(())
    }

    /// Reads and feeds all lines from `reader`. Invalid UTF-8 is replaced.
    ///
    /// Aborted sections do not stop the read; they were already reported.
    /// Does not perform the end-of-stream flush.
    pub fn consume<R: BufRead>(&mut self, mut reader: R) -> Result<(), ParseError> {
        let mut raw = Vec::new();
        loop {
            raw.clear();
            if reader.read_until(b'\n', &mut raw)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&raw);
            if let Err(e) = self.feed_line(&line) {
                debug!("Continuing after aborted section: {}", e);
            }
        }
        Ok(())
    }

    /// Flushes the final section. Required once the last line was fed.
    ///
    /// Leaves no section active; later content lines are desyncs until the
    /// next boundary.
    pub fn end_of_stream(&mut self) -> Result<(), ParseError> {
        let flushed = self.flush();
        self.current_section.clear();
        self.buffer.clear();
        flushed
    }

    /// Hands out the registry without flushing; unflushed text is dropped.
    pub fn into_registry(self) -> ProcessRegistry {
        self.registry
    }

    /// End-of-stream flush followed by [`Self::into_registry`].
    ///
    /// On an aborted final section the registry is dropped with the error;
    /// use `end_of_stream` and `into_registry` to keep partial data.
    pub fn finish(mut self) -> Result<ProcessRegistry, ParseError> {
        self.end_of_stream()?;
        Ok(self.registry)
    }

    fn switch_section(&mut self, pid: u32, section: &str) -> Result<(), ParseError> {
        let flushed = self.flush();

        self.stats.boundaries += 1;
        self.registry.get_or_create(pid);
        self.current_pid = Some(pid);
        self.current_section = section.to_string();
        self.buffer.clear();
        trace!("Switched to /proc/{}/{}", pid, section);

        flushed
    }

    fn append(&mut self, line: &str) {
        self.buffer.push_str(line);
        self.buffer.push('\n');
    }

    /// Dispatches the buffered text of the active section.
    fn flush(&mut self) -> Result<(), ParseError> {
        let buffer = std::mem::take(&mut self.buffer);
        let Some(pid) = self.current_pid else {
            return Ok(());
        };

        let section = self.current_section.clone();
        match section.as_str() {
            "" => Ok(()),
            SMAPS_SECTION => self.flush_region(&buffer),
            CMDLINE_SECTION => {
                self.registry.get_or_create(pid).argv = split_cmdline(&buffer);
                Ok(())
            }
            _ => {
                if self.config.retain_raw_sections {
                    self.registry
                        .get_or_create(pid)
                        .sections
                        .insert(section, buffer);
                }
                Ok(())
            }
        }
    }

    /// Parses one accumulated smaps record and appends it to the current process.
    fn flush_region(&mut self, text: &str) -> Result<(), ParseError> {
        let text = text.trim();
        if text.is_empty() {
            // Normal between polling intervals.
            return Ok(());
        }
        let Some(pid) = self.current_pid else {
            return Ok(());
        };

        let error = match parse_region_text(text) {
            Ok(region) => {
                self.registry.get_or_create(pid).regions.push(region);
                self.stats.regions += 1;
                return Ok(());
            }
            Err(e) => e,
        };

        self.stats.skipped_regions += 1;
        let diagnostic = Diagnostic::new(&error, Some(pid), &self.current_section);
        self.sink.report(diagnostic);

        match self.config.on_malformed_region {
            MalformedRegionPolicy::Skip => Ok(()),
            MalformedRegionPolicy::Abort => {
                self.stats.aborted_sections += 1;
                debug!("Aborting /proc/{}/{}", pid, self.current_section);
                self.current_section.clear();
                self.buffer.clear();
                Err(error)
            }
        }
    }

    fn desync(&mut self, line: &str) {
        self.stats.desyncs += 1;
        let error = ParseError::ProtocolDesync(line.to_string());
        let diagnostic = Diagnostic::new(&error, self.current_pid, &self.current_section);
        self.sink.report(diagnostic);
    }
}

/// Reads a whole tailed capture and returns the populated registry.
///
/// Performs the end-of-stream flush. Diagnostics go to `tracing`.
pub fn read_tailed<R: BufRead>(
    reader: R,
    config: ParserConfig,
) -> Result<ProcessRegistry, ParseError> {
    let mut demux = StreamDemultiplexer::new(config);
    demux.consume(reader)?;
    if let Err(e) = demux.end_of_stream() {
        debug!("Final section aborted: {}", e);
    }
    Ok(demux.into_registry())
}
