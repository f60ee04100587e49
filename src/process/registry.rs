//! Process entities and the pid-keyed registry that owns them.

use ahash::AHashMap as HashMap;

use super::memory::{saturating_sum, sorted_by_start, MemoryStats};
use super::region::{AccessClass, MemoryRegion, Sharing};

/// Name of the heap pseudo-mapping.
pub const HEAP_NAME: &str = "[heap]";
/// Name of the main thread stack pseudo-mapping.
pub const STACK_NAME: &str = "[stack]";
/// Mapping names left out of the permission bucket sums.
///
/// The stack entry intentionally lacks its leading bracket, so `[stack]`
/// mappings still count towards their bucket.
pub const BUCKET_EXCLUDED_NAMES: [&str; 2] = ["[heap]", "stack]"];

/// PSS per permission x sharing bucket, in kibibytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PssBuckets {
    pub ro_shared: u64,
    pub ro_private: u64,
    pub rw_shared: u64,
    pub rw_private: u64,
    pub rx_shared: u64,
    pub rx_private: u64,
    pub rwx_shared: u64,
    pub rwx_private: u64,
}

/// A process reconstructed from the tailed proc stream.
#[derive(Debug, Clone, Default)]
pub struct Process {
    pub pid: u32,
    /// Mappings in discovery order.
    pub regions: Vec<MemoryRegion>,
    pub argv: Vec<String>,
    /// Raw text of sections this crate does not interpret (`stat`, `status`, ...).
    pub sections: HashMap<String, String>,

    // Filled in by consumers from the raw stat/status text.
    pub comm: String,
    pub minor_faults: u64,
    pub major_faults: u64,
    pub user_time: u64,
    pub system_time: u64,
    pub start_time: u64,
}

impl Process {
    pub fn new(pid: u32) -> Self {
        Self {
            pid,
            ..Default::default()
        }
    }

    /// Executable path, taken from the first argument.
    pub fn name(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }

    pub fn num_fragments(&self) -> usize {
        self.regions.len()
    }

    pub fn sorted_regions(&self) -> Vec<&MemoryRegion> {
        sorted_by_start(&self.regions)
    }

    pub fn raw_section(&self, section: &str) -> Option<&str> {
        self.sections.get(section).map(String::as_str)
    }

    pub fn pss(&self) -> u64 {
        self.sum_by(|r| r.pss)
    }

    pub fn heap(&self) -> u64 {
        self.pss_named(HEAP_NAME)
    }

    pub fn stack(&self) -> u64 {
        self.pss_named(STACK_NAME)
    }

    fn pss_named(&self, name: &str) -> u64 {
        saturating_sum(
            self.regions
                .iter()
                .filter(|r| r.name == name)
                .map(|r| r.pss),
        )
    }

    /// PSS of regions in one permission bucket, excluding [`BUCKET_EXCLUDED_NAMES`].
    pub fn bucket_pss(&self, class: AccessClass, sharing: Sharing) -> u64 {
        saturating_sum(
            self.regions
                .iter()
                .filter(|r| r.in_bucket(class, sharing))
                .filter(|r| !BUCKET_EXCLUDED_NAMES.contains(&r.name.as_str()))
                .map(|r| r.pss),
        )
    }

    pub fn ro_shared(&self) -> u64 {
        self.bucket_pss(AccessClass::ReadOnly, Sharing::Shared)
    }

    pub fn ro_private(&self) -> u64 {
        self.bucket_pss(AccessClass::ReadOnly, Sharing::Private)
    }

    pub fn rw_shared(&self) -> u64 {
        self.bucket_pss(AccessClass::ReadWrite, Sharing::Shared)
    }

    pub fn rw_private(&self) -> u64 {
        self.bucket_pss(AccessClass::ReadWrite, Sharing::Private)
    }

    pub fn rx_shared(&self) -> u64 {
        self.bucket_pss(AccessClass::ReadExec, Sharing::Shared)
    }

    pub fn rx_private(&self) -> u64 {
        self.bucket_pss(AccessClass::ReadExec, Sharing::Private)
    }

    pub fn rwx_shared(&self) -> u64 {
        self.bucket_pss(AccessClass::ReadWriteExec, Sharing::Shared)
    }

    pub fn rwx_private(&self) -> u64 {
        self.bucket_pss(AccessClass::ReadWriteExec, Sharing::Private)
    }

    pub fn pss_buckets(&self) -> PssBuckets {
        PssBuckets {
            ro_shared: self.ro_shared(),
            ro_private: self.ro_private(),
            rw_shared: self.rw_shared(),
            rw_private: self.rw_private(),
            rx_shared: self.rx_shared(),
            rx_private: self.rx_private(),
            rwx_shared: self.rwx_shared(),
            rwx_private: self.rwx_private(),
        }
    }

    fn sum_by(&self, counter: impl Fn(&MemoryRegion) -> u64) -> u64 {
        saturating_sum(self.regions.iter().map(counter))
    }

    pub fn rss(&self) -> u64 {
        self.sum_by(|r| r.rss)
    }

    pub fn swap(&self) -> u64 {
        self.sum_by(|r| r.swap)
    }

    pub fn shared_clean(&self) -> u64 {
        self.sum_by(|r| r.shared_clean)
    }

    pub fn shared_dirty(&self) -> u64 {
        self.sum_by(|r| r.shared_dirty)
    }

    pub fn private_clean(&self) -> u64 {
        self.sum_by(|r| r.private_clean)
    }

    pub fn private_dirty(&self) -> u64 {
        self.sum_by(|r| r.private_dirty)
    }

    pub fn referenced(&self) -> u64 {
        self.sum_by(|r| r.referenced)
    }

    pub fn anonymous(&self) -> u64 {
        self.sum_by(|r| r.anonymous)
    }
}

/// Pid-keyed process collection with get-or-create semantics.
#[derive(Debug, Clone, Default)]
pub struct ProcessRegistry {
    processes: HashMap<u32, Process>,
}

impl ProcessRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process for `pid`, creating an empty one on first reference.
    pub fn get_or_create(&mut self, pid: u32) -> &mut Process {
        self.processes
            .entry(pid)
            .or_insert_with(|| Process::new(pid))
    }

    pub fn get(&self, pid: u32) -> Option<&Process> {
        self.processes.get(&pid)
    }

    pub fn get_mut(&mut self, pid: u32) -> Option<&mut Process> {
        self.processes.get_mut(&pid)
    }

    pub fn contains(&self, pid: u32) -> bool {
        self.processes.contains_key(&pid)
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// All processes, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Process> {
        self.processes.values()
    }

    pub fn pids_sorted(&self) -> Vec<u32> {
        let mut pids: Vec<u32> = self.processes.keys().copied().collect();
        pids.sort_unstable();
        pids
    }

    /// Copies every region of every process into one global collection.
    pub fn memory_stats(&self) -> MemoryStats {
        self.iter()
            .flat_map(|p| p.regions.iter().cloned())
            .collect()
    }

    pub fn into_processes(self) -> Vec<Process> {
        self.processes.into_values().collect()
    }
}
