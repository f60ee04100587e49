//! Parser for single `/proc/<pid>/smaps` memory region records.
//!
//! A record is one header line followed by `Field: value [unit]` lines:
//!
//! ```text
//! 08048000-08049000 r-xp 00000000 03:00 8312       /bin/true
//! Rss:                   4 kB
//! Pss:                   4 kB
//! VmFlags: rd ex mr mw me dw
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

use crate::error::ParseError;
use crate::process::{AccessFlags, Counter, MemoryRegion};

/// `<start>-<end> <perms> <offset> <dev> <inode> [pathname]`
static HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^([0-9a-fA-F]+)-([0-9a-fA-F]+)\s+(\S{4})\s+([0-9a-fA-F]+)\s+([0-9a-fA-F]+:[0-9a-fA-F]+)\s+([0-9]+)(?:\s+(.*?))?\s*$",
    )
    .expect("region header regex is valid")
});

const VM_FLAGS_FIELD: &str = "VmFlags";

/// True if the line starts a new memory region record.
pub fn is_region_header(line: &str) -> bool {
    HEADER_RE.is_match(line)
}

/// Parses a counter value into kibibytes.
///
/// Accepts the kernel's `kB` unit, a missing unit (taken as kB) and the
/// larger `mB`/`gB` spellings. Returns `None` for anything else.
pub fn parse_kb_value(v: &str) -> Option<u64> {
    let mut tokens = v.split_whitespace();
    let value: u64 = tokens.next()?.parse().ok()?;
    let multiplier: u64 = match tokens.next() {
        None | Some("kB") | Some("KB") => 1,
        Some("mB") | Some("MB") => 1024,
        Some("gB") | Some("GB") => 1024 * 1024,
        Some(_) => return None,
    };
    value.checked_mul(multiplier)
}

fn parse_header(line: &str) -> Result<MemoryRegion, ParseError> {
    let malformed = || ParseError::MalformedHeader(line.to_string());
    let caps = HEADER_RE.captures(line).ok_or_else(malformed)?;

    let hex = |i: usize| u64::from_str_radix(&caps[i], 16).map_err(|_| malformed());
    let start = hex(1)?;
    let end = hex(2)?;
    let offset = hex(4)?;
    let inode: u64 = caps[6].parse().map_err(|_| malformed())?;

    if start > end {
        return Err(malformed());
    }

    Ok(MemoryRegion {
        start,
        end,
        offset,
        permissions: AccessFlags::parse(&caps[3]),
        device: caps[5].to_string(),
        inode,
        name: caps.get(7).map(|m| m.as_str().to_string()).unwrap_or_default(),
        ..Default::default()
    })
}

/// Parses one region record. The first line must be the header.
pub fn parse_region<'a, I>(lines: I) -> Result<MemoryRegion, ParseError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut lines = lines.into_iter();
    let header = lines
        .next()
        .ok_or_else(|| ParseError::MalformedHeader(String::new()))?;
    let mut region = parse_header(header.trim_end())?;

    for line in lines {
        let Some((field, value)) = line.split_once(':') else {
            continue;
        };
        let field = field.trim();

        if field == VM_FLAGS_FIELD {
            region.vm_flags = value.split_whitespace().map(str::to_string).collect();
            continue;
        }

        match Counter::from_field_name(field) {
            Some(counter) => {
                let kb = parse_kb_value(value).ok_or_else(|| ParseError::InvalidCounter {
                    field: field.to_string(),
                    line: line.to_string(),
                })?;
                *region.counter_mut(counter) = kb;
            }
            None => trace!("Ignoring unknown smaps field {:?}", field),
        }
    }

    Ok(region)
}

/// Parses one region record held in a single string.
pub fn parse_region_text(text: &str) -> Result<MemoryRegion, ParseError> {
    parse_region(text.lines())
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_RECORD: &str = "\
7f3a2c000000-7f3a2c021000 rw-p 00001000 fd:01 1048602                    /usr/lib/libc.so.6
Size:                132 kB
KernelPageSize:        4 kB
MMUPageSize:           4 kB
Rss:                  12 kB
Pss:                   6 kB
Pss_Dirty:             6 kB
Shared_Clean:          1 kB
Shared_Dirty:          2 kB
Private_Clean:         3 kB
Private_Dirty:         4 kB
Referenced:            5 kB
Anonymous:             7 kB
LazyFree:              0 kB
AnonHugePages:      2048 kB
ShmemPmdMapped:        0 kB
FilePmdMapped:         0 kB
Shared_Hugetlb:        8 kB
Private_Hugetlb:       9 kB
Swap:                 10 kB
SwapPss:              11 kB
Locked:               13 kB
THPeligible:    0
VmFlags: rd wr mr mw me ac sd
";

    // -------------------------------------------------------------------------
    // Tests for parse_kb_value
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_kb_value() {
        // Standard smaps format with trailing "kB"
        assert_eq!(parse_kb_value("       1234 kB"), Some(1234));
        assert_eq!(parse_kb_value("1234 kB"), Some(1234));
        assert_eq!(parse_kb_value("0 kB"), Some(0));

        // No unit
        assert_eq!(parse_kb_value("  42  "), Some(42));

        // Larger units are normalized to kB
        assert_eq!(parse_kb_value("3 MB"), Some(3 * 1024));
        assert_eq!(parse_kb_value("1 gB"), Some(1024 * 1024));
    }

    #[test]
    fn test_parse_kb_value_invalid() {
        assert_eq!(parse_kb_value(""), None);
        assert_eq!(parse_kb_value("   "), None);
        assert_eq!(parse_kb_value("abc"), None);
        assert_eq!(parse_kb_value("kB"), None);
        assert_eq!(parse_kb_value("-1 kB"), None);
        assert_eq!(parse_kb_value("1.5 kB"), None);
        assert_eq!(parse_kb_value("12 parsecs"), None);

        // Overflow while normalizing
        assert_eq!(parse_kb_value("18446744073709551615 GB"), None);
    }

    // -------------------------------------------------------------------------
    // Tests for is_region_header
    // -------------------------------------------------------------------------

    #[test]
    fn test_is_region_header() {
        assert!(is_region_header(
            "08048000-08049000 r-xp 00000000 03:00 8312       /bin/true"
        ));
        assert!(is_region_header("7ffd1000-7ffd2000 rw-p 00000000 00:00 0"));
        assert!(is_region_header(
            "7ffd1000-7ffd2000 rw-p 00000000 00:00 0                          [stack]"
        ));

        assert!(!is_region_header("Rss:                   4 kB"));
        assert!(!is_region_header("VmFlags: rd ex mr mw me dw"));
        assert!(!is_region_header("==> /proc/1/smaps <=="));
        assert!(!is_region_header("08048000-08049000 r-x 00000000 03:00 8312"));
        assert!(!is_region_header("08048000 r-xp 00000000 03:00 8312"));
    }

    // -------------------------------------------------------------------------
    // Tests for parse_region
    // -------------------------------------------------------------------------

    #[test]
    fn test_parse_full_record() {
        let r = parse_region_text(FULL_RECORD).expect("record should parse");

        assert_eq!(r.start, 0x7f3a2c000000);
        assert_eq!(r.end, 0x7f3a2c021000);
        assert_eq!(r.offset, 0x1000);
        assert_eq!(r.device, "fd:01");
        assert_eq!(r.inode, 1048602);
        assert_eq!(r.name, "/usr/lib/libc.so.6");
        assert!(r.permissions.readable && r.permissions.writable && r.permissions.private);

        assert_eq!(r.kernel_page_size, 4);
        assert_eq!(r.mmu_page_size, 4);
        assert_eq!(r.rss, 12);
        assert_eq!(r.pss, 6);
        assert_eq!(r.shared_clean, 1);
        assert_eq!(r.shared_dirty, 2);
        assert_eq!(r.private_clean, 3);
        assert_eq!(r.private_dirty, 4);
        assert_eq!(r.referenced, 5);
        assert_eq!(r.anonymous, 7);
        assert_eq!(r.anonymous_huge, 2048);
        assert_eq!(r.shared_hugetlb, 8);
        assert_eq!(r.private_hugetlb, 9);
        assert_eq!(r.swap, 10);
        assert_eq!(r.swap_pss, 11);
        assert_eq!(r.locked, 13);
        assert_eq!(r.vm_flags, vec!["rd", "wr", "mr", "mw", "me", "ac", "sd"]);
    }

    #[test]
    fn test_counters_reemit_exactly() {
        let r = parse_region_text(FULL_RECORD).unwrap();
        let header = FULL_RECORD.lines().next().unwrap();

        let reemitted: Vec<String> = std::iter::once(header.to_string())
            .chain(r.counter_lines())
            .collect();
        let again = parse_region(reemitted.iter().map(String::as_str)).unwrap();

        assert_eq!(again, MemoryRegion { vm_flags: Vec::new(), ..r });
    }

    #[test]
    fn test_anonymous_mapping_has_empty_name() {
        let r = parse_region(["7f0000000000-7f0000001000 rw-p 00000000 00:00 0   "]).unwrap();
        assert_eq!(r.name, "");
        assert!(r.is_anonymous());
        assert_eq!(r.size(), 0x1000);
    }

    #[test]
    fn test_pathname_kept_verbatim() {
        let r = parse_region([
            "7f0000000000-7f0000001000 rw-s 00000000 00:05 77 /dev/shm/my file (deleted)",
        ])
        .unwrap();
        assert_eq!(r.name, "/dev/shm/my file (deleted)");

        let heap = parse_region(["55d0a000-55d2b000 rw-p 00000000 00:00 0 [heap]"]).unwrap();
        assert_eq!(heap.name, "[heap]");
    }

    #[test]
    fn test_malformed_header() {
        for bad in [
            "",
            "Rss: 4 kB",
            "zzzz-08049000 r-xp 00000000 03:00 8312",
            "08049000-08048000 r-xp 00000000 03:00 8312",
            "08048000-08049000 r-xp 00000000 03:00",
        ] {
            match parse_region([bad]) {
                Err(ParseError::MalformedHeader(text)) => assert_eq!(text, bad),
                other => panic!("expected MalformedHeader for {:?}, got {:?}", bad, other),
            }
        }

        let empty: [&str; 0] = [];
        assert!(matches!(
            parse_region(empty),
            Err(ParseError::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_invalid_counter_value() {
        let result = parse_region([
            "08048000-08049000 r-xp 00000000 03:00 8312 /bin/true",
            "Rss: lots kB",
        ]);
        match result {
            Err(ParseError::InvalidCounter { field, line }) => {
                assert_eq!(field, "Rss");
                assert_eq!(line, "Rss: lots kB");
            }
            other => panic!("expected InvalidCounter, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let r = parse_region([
            "08048000-08049000 r-xp 00000000 03:00 8312 /bin/true",
            "Size: not-a-number",
            "FutureCounter: 99 kB",
            "a line without a colon",
            "Pss: 4 kB",
        ])
        .unwrap();
        assert_eq!(r.pss, 4);
    }
}
