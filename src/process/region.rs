//! A single memory mapping and its access classification.

use super::permissions::AccessFlags;

/// Permission class of a readable mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessClass {
    ReadOnly,
    ReadWrite,
    ReadExec,
    ReadWriteExec,
}

impl AccessClass {
    pub const ALL: [AccessClass; 4] = [
        AccessClass::ReadOnly,
        AccessClass::ReadWrite,
        AccessClass::ReadExec,
        AccessClass::ReadWriteExec,
    ];

    /// Classifies permission bits. Mappings that are not readable have no class.
    pub fn of(flags: &AccessFlags) -> Option<Self> {
        match (flags.readable, flags.writable, flags.executable) {
            (true, false, false) => Some(AccessClass::ReadOnly),
            (true, true, false) => Some(AccessClass::ReadWrite),
            (true, false, true) => Some(AccessClass::ReadExec),
            (true, true, true) => Some(AccessClass::ReadWriteExec),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessClass::ReadOnly => "ro",
            AccessClass::ReadWrite => "rw",
            AccessClass::ReadExec => "rx",
            AccessClass::ReadWriteExec => "rwx",
        }
    }
}

/// Sharing mode of a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sharing {
    Shared,
    Private,
}

impl Sharing {
    pub fn of(flags: &AccessFlags) -> Option<Self> {
        if flags.shared {
            Some(Sharing::Shared)
        } else if flags.private {
            Some(Sharing::Private)
        } else {
            None
        }
    }
}

/// Kernel-reported per-mapping counters, keyed by their smaps field name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Counter {
    Rss,
    Pss,
    SharedClean,
    SharedDirty,
    PrivateClean,
    PrivateDirty,
    Referenced,
    Anonymous,
    AnonymousHuge,
    SharedHugetlb,
    PrivateHugetlb,
    Swap,
    SwapPss,
    KernelPageSize,
    MmuPageSize,
    Locked,
}

impl Counter {
    pub const ALL: [Counter; 16] = [
        Counter::Rss,
        Counter::Pss,
        Counter::SharedClean,
        Counter::SharedDirty,
        Counter::PrivateClean,
        Counter::PrivateDirty,
        Counter::Referenced,
        Counter::Anonymous,
        Counter::AnonymousHuge,
        Counter::SharedHugetlb,
        Counter::PrivateHugetlb,
        Counter::Swap,
        Counter::SwapPss,
        Counter::KernelPageSize,
        Counter::MmuPageSize,
        Counter::Locked,
    ];

    /// Field name as printed by the kernel (without the trailing colon).
    pub fn field_name(&self) -> &'static str {
        match self {
            Counter::Rss => "Rss",
            Counter::Pss => "Pss",
            Counter::SharedClean => "Shared_Clean",
            Counter::SharedDirty => "Shared_Dirty",
            Counter::PrivateClean => "Private_Clean",
            Counter::PrivateDirty => "Private_Dirty",
            Counter::Referenced => "Referenced",
            Counter::Anonymous => "Anonymous",
            Counter::AnonymousHuge => "AnonHugePages",
            Counter::SharedHugetlb => "Shared_Hugetlb",
            Counter::PrivateHugetlb => "Private_Hugetlb",
            Counter::Swap => "Swap",
            Counter::SwapPss => "SwapPss",
            Counter::KernelPageSize => "KernelPageSize",
            Counter::MmuPageSize => "MMUPageSize",
            Counter::Locked => "Locked",
        }
    }

    pub fn from_field_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.field_name() == name)
    }
}

/// One mapping in a process address space, decoded from an smaps record.
///
/// Counters are stored in kibibytes, the unit the kernel reports them in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryRegion {
    pub start: u64,
    pub end: u64,
    pub offset: u64,
    pub permissions: AccessFlags,
    pub device: String,
    pub inode: u64,
    /// Backing path or pseudo-name such as `[heap]`; empty for anonymous mappings.
    pub name: String,
    pub rss: u64,
    pub pss: u64,
    pub shared_clean: u64,
    pub shared_dirty: u64,
    pub private_clean: u64,
    pub private_dirty: u64,
    pub referenced: u64,
    pub anonymous: u64,
    pub anonymous_huge: u64,
    pub shared_hugetlb: u64,
    pub private_hugetlb: u64,
    pub swap: u64,
    pub swap_pss: u64,
    pub kernel_page_size: u64,
    pub mmu_page_size: u64,
    pub locked: u64,
    pub vm_flags: Vec<String>,
}

impl MemoryRegion {
    /// Size of the address range in bytes.
    pub fn size(&self) -> u64 {
        self.end - self.start
    }

    pub fn access_class(&self) -> Option<AccessClass> {
        AccessClass::of(&self.permissions)
    }

    pub fn sharing(&self) -> Option<Sharing> {
        Sharing::of(&self.permissions)
    }

    /// The permission x sharing bucket this region falls in, if any.
    pub fn bucket(&self) -> Option<(AccessClass, Sharing)> {
        Some((self.access_class()?, self.sharing()?))
    }

    pub fn in_bucket(&self, class: AccessClass, sharing: Sharing) -> bool {
        self.bucket() == Some((class, sharing))
    }

    pub fn is_readonly(&self) -> bool {
        self.access_class() == Some(AccessClass::ReadOnly)
    }

    pub fn is_rw(&self) -> bool {
        self.access_class() == Some(AccessClass::ReadWrite)
    }

    pub fn is_rx(&self) -> bool {
        self.access_class() == Some(AccessClass::ReadExec)
    }

    pub fn is_rwx(&self) -> bool {
        self.access_class() == Some(AccessClass::ReadWriteExec)
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }

    pub fn counter(&self, counter: Counter) -> u64 {
        match counter {
            Counter::Rss => self.rss,
            Counter::Pss => self.pss,
            Counter::SharedClean => self.shared_clean,
            Counter::SharedDirty => self.shared_dirty,
            Counter::PrivateClean => self.private_clean,
            Counter::PrivateDirty => self.private_dirty,
            Counter::Referenced => self.referenced,
            Counter::Anonymous => self.anonymous,
            Counter::AnonymousHuge => self.anonymous_huge,
            Counter::SharedHugetlb => self.shared_hugetlb,
            Counter::PrivateHugetlb => self.private_hugetlb,
            Counter::Swap => self.swap,
            Counter::SwapPss => self.swap_pss,
            Counter::KernelPageSize => self.kernel_page_size,
            Counter::MmuPageSize => self.mmu_page_size,
            Counter::Locked => self.locked,
        }
    }

    pub fn counter_mut(&mut self, counter: Counter) -> &mut u64 {
        match counter {
            Counter::Rss => &mut self.rss,
            Counter::Pss => &mut self.pss,
            Counter::SharedClean => &mut self.shared_clean,
            Counter::SharedDirty => &mut self.shared_dirty,
            Counter::PrivateClean => &mut self.private_clean,
            Counter::PrivateDirty => &mut self.private_dirty,
            Counter::Referenced => &mut self.referenced,
            Counter::Anonymous => &mut self.anonymous,
            Counter::AnonymousHuge => &mut self.anonymous_huge,
            Counter::SharedHugetlb => &mut self.shared_hugetlb,
            Counter::PrivateHugetlb => &mut self.private_hugetlb,
            Counter::Swap => &mut self.swap,
            Counter::SwapPss => &mut self.swap_pss,
            Counter::KernelPageSize => &mut self.kernel_page_size,
            Counter::MmuPageSize => &mut self.mmu_page_size,
            Counter::Locked => &mut self.locked,
        }
    }

    /// Renders the counters back into smaps grammar (`Rss: 4 kB`), in kernel order.
    pub fn counter_lines(&self) -> Vec<String> {
        Counter::ALL
            .iter()
            .map(|c| format!("{}: {} kB", c.field_name(), self.counter(*c)))
            .collect()
    }
}
