//! `/proc/loadavg` parsing.

use serde::Serialize;
use std::path::PathBuf;

use crate::error::{ProcError, ProcResult};
use crate::source::FileSource;

pub const DEFAULT_LOADAVG_PATH: &str = "/proc/loadavg";

/// System load averages for 1, 5, and 15 minute intervals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LoadAverage {
    pub one_min: f64,
    pub five_min: f64,
    pub fifteen_min: f64,
}

/// Parses load average content.
///
/// Format: "0.00 0.01 0.05 1/234 5678"
pub fn parse_load_average(content: &str) -> Result<LoadAverage, String> {
    let parts: Vec<&str> = content.split_whitespace().collect();
    if parts.len() < 3 {
        return Err(format!(
            "expected at least 3 fields, got {}",
            parts.len()
        ));
    }

    let one_min = parts[0]
        .parse::<f64>()
        .map_err(|e| format!("Failed to parse 1min load average: {}", e))?;
    let five_min = parts[1]
        .parse::<f64>()
        .map_err(|e| format!("Failed to parse 5min load average: {}", e))?;
    let fifteen_min = parts[2]
        .parse::<f64>()
        .map_err(|e| format!("Failed to parse 15min load average: {}", e))?;

    Ok(LoadAverage {
        one_min,
        five_min,
        fifteen_min,
    })
}

/// Reads load average through a [`FileSource`].
pub fn read_load_average<F: FileSource>(source: &F, path: impl Into<PathBuf>) -> ProcResult<LoadAverage> {
    let path = path.into();
    let content = source
        .read_to_string(&path)
        .map_err(|e| ProcError::io(&path, e))?;
    parse_load_average(&content).map_err(|msg| ProcError::parse(&path, msg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryFileSource;

    #[test]
    fn test_parse_load_average() {
        let load = parse_load_average("0.52 0.58 0.59 2/1190 12345").unwrap();
        assert!((load.one_min - 0.52).abs() < 0.001);
        assert!((load.five_min - 0.58).abs() < 0.001);
        assert!((load.fifteen_min - 0.59).abs() < 0.001);
    }

    #[test]
    fn test_parse_load_average_invalid() {
        assert!(parse_load_average("0.52 0.58").is_err());
        assert!(parse_load_average("abc def ghi 1/2 3").is_err());
    }

    #[test]
    fn test_read_load_average_from_source() {
        let fs = MemoryFileSource::new().with_file("/proc/loadavg", "1.00 2.00 3.00 1/1 1\n");
        let load = read_load_average(&fs, DEFAULT_LOADAVG_PATH).unwrap();
        assert_eq!(load.fifteen_min, 3.0);

        let err = read_load_average(&MemoryFileSource::new(), DEFAULT_LOADAVG_PATH).unwrap_err();
        assert!(!err.is_parse_error());
    }
}
