//! CPU and NUMA node list strings, as used by sysfs and numactl.
//!
//! Accepted forms: `3`, `0,2`, `0-3,8-11`, `all`, and a leading `!` that
//! inverts the remainder against the configured set.

use std::collections::BTreeSet;

/// Ordered CPU (or node) ids.
pub type CpuList = Vec<usize>;

/// Parses a list string into sorted, de-duplicated ids.
///
/// Every id must be a member of `configured` unless `configured` is empty,
/// in which case no range check is done (sysfs `cpulist` files).
pub fn parse_list(text: &str, configured: &[usize]) -> Result<CpuList, String> {
    let text = text.trim();
    if text.is_empty() {
        return Err("empty list".to_string());
    }

    if let Some(rest) = text.strip_prefix('!') {
        let excluded: BTreeSet<usize> = parse_list(rest, configured)?.into_iter().collect();
        return Ok(configured
            .iter()
            .copied()
            .filter(|id| !excluded.contains(id))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect());
    }

    if text.eq_ignore_ascii_case("all") {
        return Ok(configured
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect());
    }

    let mut ids = BTreeSet::new();
    for token in text.split(',') {
        let token = token.trim();
        if token.is_empty() {
            return Err(format!("empty element in list '{}'", text));
        }
        let (start, end) = match token.split_once('-') {
            Some((a, b)) => (parse_id(a, text)?, parse_id(b, text)?),
            None => {
                let id = parse_id(token, text)?;
                (id, id)
            }
        };
        if start > end {
            return Err(format!("descending range '{}' in list '{}'", token, text));
        }
        for id in start..=end {
            if !configured.is_empty() && !configured.contains(&id) {
                return Err(format!("id {} out of range in list '{}'", id, text));
            }
            ids.insert(id);
        }
    }

    Ok(ids.into_iter().collect())
}

fn parse_id(token: &str, text: &str) -> Result<usize, String> {
    token
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("invalid id '{}' in list '{}'", token, text))
}

/// Renders ids in compact range form, e.g. `[0,1,2,5]` as `0-2,5`.
pub fn format_list(ids: &[usize]) -> String {
    let sorted: BTreeSet<usize> = ids.iter().copied().collect();
    let mut parts = Vec::new();
    let mut iter = sorted.into_iter().peekable();

    while let Some(start) = iter.next() {
        let mut end = start;
        while iter.peek() == Some(&(end + 1)) {
            end += 1;
            iter.next();
        }
        if start == end {
            parts.push(start.to_string());
        } else {
            parts.push(format!("{}-{}", start, end));
        }
    }

    parts.join(",")
}

/// Removes blacklisted ids, keeping order.
pub fn without(ids: &[usize], blacklist: &[usize]) -> CpuList {
    ids.iter()
        .copied()
        .filter(|id| !blacklist.contains(id))
        .collect()
}
