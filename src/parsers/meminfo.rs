//! `/proc/meminfo` parsing.
//!
//! Each line has the form `Key: value [unit]`. Values are converted to bytes
//! using decimal multipliers for the KB/MB/GB/TB suffixes. Lines whose value
//! is not numeric are tolerated and yield a zero counter.

use ahash::AHashMap as HashMap;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::error::{ProcError, ProcResult};
use crate::source::FileSource;

pub const DEFAULT_MEMINFO_PATH: &str = "/proc/meminfo";

/// Counter name to value in bytes (or a bare count when no unit is given).
pub type MeminfoCounters = HashMap<String, u64>;

/// Multiplier for a unit suffix; unknown or missing units multiply by 1.
pub fn unit_multiplier(unit: Option<&str>) -> u64 {
    match unit.map(|u| u.to_ascii_uppercase()) {
        Some(u) if u == "KB" => 1_000,
        Some(u) if u == "MB" => 1_000_000,
        Some(u) if u == "GB" => 1_000_000_000,
        Some(u) if u == "TB" => 1_000_000_000_000,
        _ => 1,
    }
}

/// Parses a single meminfo line; `None` when the line has no colon.
pub fn parse_meminfo_line(line: &str) -> Option<(String, u64)> {
    let (key, rest) = line.split_once(':')?;
    let mut tokens = rest.split_whitespace();
    let value = tokens
        .next()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);
    let multiplier = unit_multiplier(tokens.next());

    Some((key.trim().to_string(), value.saturating_mul(multiplier)))
}

/// Parses full `/proc/meminfo` content into `data`, replacing its contents.
pub fn parse_meminfo(content: &str, data: &mut MeminfoCounters) {
    data.clear();
    for line in content.lines() {
        match parse_meminfo_line(line) {
            Some((key, value)) => {
                data.insert(key, value);
            }
            None => trace!("Skipping meminfo line without key: '{}'", line),
        }
    }
}

/// Reads `/proc/meminfo` (or a configured replacement) through a [`FileSource`].
#[derive(Debug, Clone)]
pub struct ProcMeminfoParser<F: FileSource> {
    source: F,
    path: PathBuf,
}

impl<F: FileSource> ProcMeminfoParser<F> {
    /// Creates a parser for the default path, failing if it cannot be read now.
    pub fn new(source: F) -> ProcResult<Self> {
        Self::with_path(source, DEFAULT_MEMINFO_PATH)
    }

    /// Creates a parser for `path`, failing if it cannot be read now.
    pub fn with_path(source: F, path: impl Into<PathBuf>) -> ProcResult<Self> {
        let path = path.into();
        source
            .read_to_string(&path)
            .map_err(|e| ProcError::io(&path, e))?;
        Ok(Self { source, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn parse(&self, data: &mut MeminfoCounters) -> ProcResult<()> {
        let content = self
            .source
            .read_to_string(&self.path)
            .map_err(|e| ProcError::io(&self.path, e))?;
        parse_meminfo(&content, data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryFileSource;

    #[test]
    fn test_kb_suffix_is_decimal() {
        assert_eq!(
            parse_meminfo_line("MemFree: 500 kB"),
            Some(("MemFree".to_string(), 500_000))
        );
    }

    #[test]
    fn test_units_are_case_insensitive() {
        assert_eq!(unit_multiplier(Some("kb")), 1_000);
        assert_eq!(unit_multiplier(Some("Mb")), 1_000_000);
        assert_eq!(unit_multiplier(Some("GB")), 1_000_000_000);
        assert_eq!(unit_multiplier(Some("tB")), 1_000_000_000_000);
        assert_eq!(unit_multiplier(Some("pages")), 1);
        assert_eq!(unit_multiplier(None), 1);
    }

    #[test]
    fn test_bare_count_without_unit() {
        assert_eq!(
            parse_meminfo_line("HugePages_Total:       4"),
            Some(("HugePages_Total".to_string(), 4))
        );
    }

    #[test]
    fn test_non_numeric_value_is_zero() {
        assert_eq!(
            parse_meminfo_line("Separator: ----"),
            Some(("Separator".to_string(), 0))
        );
        assert_eq!(
            parse_meminfo_line("Empty:"),
            Some(("Empty".to_string(), 0))
        );
        assert_eq!(parse_meminfo_line("no colon here"), None);
    }

    #[test]
    fn test_parse_replaces_counters() {
        let mut data = MeminfoCounters::new();
        data.insert("Stale".to_string(), 1);
        parse_meminfo("MemTotal: 16 kB\nMemFree: 8 kB\n", &mut data);

        assert_eq!(data.len(), 2);
        assert_eq!(data["MemTotal"], 16_000);
        assert_eq!(data["MemFree"], 8_000);
    }

    #[test]
    fn test_constructor_fails_fast_on_missing_file() {
        let result = ProcMeminfoParser::new(MemoryFileSource::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_parser_reads_configured_path() {
        let fs = MemoryFileSource::new().with_file("/tmp/meminfo", "MemAvailable: 2 MB\n");
        let parser = ProcMeminfoParser::with_path(fs, "/tmp/meminfo").unwrap();

        let mut data = MeminfoCounters::new();
        parser.parse(&mut data).unwrap();
        assert_eq!(data["MemAvailable"], 2_000_000);
    }
}
