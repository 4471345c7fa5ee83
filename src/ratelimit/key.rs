//! Log site key generation and handling.

/// A key that uniquely identifies a log statement by its source location.
///
/// Built with the [`log_site!`](crate::log_site) macro at the logging call
/// site, so two keys compare equal only when they come from the same line of
/// the same file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LogSiteKey {
    /// Module containing the log statement
    pub module_path: &'static str,
    /// Source file containing the log statement
    pub file: &'static str,
    /// Line of the log statement
    pub line: u32,
}

impl LogSiteKey {
    /// Create a new log site key.
    pub const fn new(module_path: &'static str, file: &'static str, line: u32) -> Self {
        Self {
            module_path,
            file,
            line,
        }
    }
}

impl std::fmt::Display for LogSiteKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}:{})", self.module_path, self.file, self.line)
    }
}

/// Expands to the [`LogSiteKey`] of the location where it is invoked.
#[macro_export]
macro_rules! log_site {
    () => {
        $crate::ratelimit::LogSiteKey::new(module_path!(), file!(), line!())
    };
}
