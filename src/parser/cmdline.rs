//! Splitting of `/proc/<pid>/cmdline` text into an argument vector.

/// Splits NUL-separated command line text into arguments.
///
/// Surrounding whitespace (the line terminators added while buffering) is
/// trimmed first. Empty tokens are dropped because some processes pad or
/// repeat the NUL separator.
pub fn split_cmdline(text: &str) -> Vec<String> {
    text.trim()
        .split('\0')
        .filter(|arg| !arg.is_empty())
        .map(str::to_string)
        .collect()
}
