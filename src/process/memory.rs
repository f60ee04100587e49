//! Collections of memory regions with an address-ordered view.

use ahash::AHashMap as HashMap;
use std::fmt;

use super::region::MemoryRegion;

/// An unordered collection of regions plus free-form meminfo values.
///
/// Regions are kept in insertion order; [`MemoryStats::sorted`] hands out an
/// independent address-ordered view without touching the collection.
#[derive(Debug, Clone, Default)]
pub struct MemoryStats {
    regions: Vec<MemoryRegion>,
    meminfo: HashMap<String, u64>,
}

impl MemoryStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, region: MemoryRegion) {
        self.regions.push(region);
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Regions ordered by start address. Equal starts keep insertion order.
    pub fn sorted(&self) -> Vec<&MemoryRegion> {
        sorted_by_start(&self.regions)
    }

    pub fn set_meminfo(&mut self, key: impl Into<String>, value: u64) {
        self.meminfo.insert(key.into(), value);
    }

    pub fn meminfo_get(&self, key: &str) -> Option<u64> {
        self.meminfo.get(key).copied()
    }

    pub fn total_pss(&self) -> u64 {
        saturating_sum(self.regions.iter().map(|r| r.pss))
    }
}

impl Extend<MemoryRegion> for MemoryStats {
    fn extend<T: IntoIterator<Item = MemoryRegion>>(&mut self, iter: T) {
        self.regions.extend(iter);
    }
}

impl FromIterator<MemoryRegion> for MemoryStats {
    fn from_iter<T: IntoIterator<Item = MemoryRegion>>(iter: T) -> Self {
        Self {
            regions: iter.into_iter().collect(),
            meminfo: HashMap::new(),
        }
    }
}

impl fmt::Display for MemoryStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sorted = self.sorted();
        match (sorted.first(), sorted.last()) {
            (Some(first), Some(last)) => write!(
                f,
                "<MemoryStats: regions={}, from=0x{:02x}, to=0x{:02x}>",
                sorted.len(),
                first.start,
                last.end
            ),
            _ => write!(f, "<MemoryStats: empty>"),
        }
    }
}

/// Adds counters, clamping at `u64::MAX` instead of overflowing.
pub(crate) fn saturating_sum(values: impl Iterator<Item = u64>) -> u64 {
    values.fold(0, u64::saturating_add)
}

/// Stable ascending sort by start address over borrowed regions.
pub fn sorted_by_start(regions: &[MemoryRegion]) -> Vec<&MemoryRegion> {
    let mut view: Vec<&MemoryRegion> = regions.iter().collect();
    view.sort_by_key(|r| r.start);
    view
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(start: u64, end: u64, name: &str) -> MemoryRegion {
        MemoryRegion {
            start,
            end,
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_sorted_view_does_not_mutate() {
        let mut stats = MemoryStats::new();
        stats.push(region(0x3000, 0x4000, "c"));
        stats.push(region(0x1000, 0x2000, "a"));
        stats.push(region(0x2000, 0x3000, "b"));

        let names: Vec<&str> = stats.sorted().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);

        // Underlying collection is still in insertion order
        let again: Vec<&str> = stats.regions.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(again, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_sorted_view_monotonic_after_interleaved_pushes() {
        let mut stats = MemoryStats::new();
        for (i, start) in [50u64, 10, 40, 10, 30, 0, 20].iter().enumerate() {
            stats.push(region(*start, start + 5, &i.to_string()));
            let view = stats.sorted();
            assert!(view.windows(2).all(|w| w[0].start <= w[1].start));
        }
    }

    #[test]
    fn test_equal_starts_keep_insertion_order() {
        let stats: MemoryStats = vec![region(0x10, 0x20, "first"), region(0x10, 0x30, "second")]
            .into_iter()
            .collect();
        let view = stats.sorted();
        assert_eq!(view[0].name, "first");
        assert_eq!(view[1].name, "second");
    }

    #[test]
    fn test_display() {
        let mut stats = MemoryStats::new();
        assert_eq!(stats.to_string(), "<MemoryStats: empty>");

        stats.push(region(0x8000, 0x9000, ""));
        stats.push(region(0x1000, 0x2000, ""));
        assert_eq!(
            stats.to_string(),
            "<MemoryStats: regions=2, from=0x1000, to=0x9000>"
        );
    }

    #[test]
    fn test_meminfo() {
        let mut stats = MemoryStats::new();
        assert_eq!(stats.meminfo_get("MemTotal"), None);
        stats.set_meminfo("MemTotal", 16_000_000);
        assert_eq!(stats.meminfo_get("MemTotal"), Some(16_000_000));
    }

    #[test]
    fn test_total_pss_saturates() {
        let mut stats = MemoryStats::new();
        let mut huge = region(0x1000, 0x2000, "");
        huge.pss = u64::MAX;
        let mut small = region(0x2000, 0x3000, "");
        small.pss = 1;
        stats.extend([huge, small]);

        assert_eq!(stats.total_pss(), u64::MAX);
        assert_eq!(saturating_sum([3, 4].into_iter()), 7);
    }
}
