//! `/proc/interrupts` scanning for NIC interrupt placement.

use super::cpulist::CpuList;

pub const DEFAULT_INTERRUPTS_PATH: &str = "/proc/interrupts";

/// True when an interrupt device column names `iface`.
///
/// Multi-queue drivers name their vectors `eth0-TxRx-0`, `eth0-rx-1` and
/// similar, so a `-` suffix still matches.
fn device_matches(token: &str, iface: &str) -> bool {
    let token = token.trim_end_matches(',');
    token == iface
        || token
            .strip_prefix(iface)
            .is_some_and(|rest| rest.starts_with('-'))
}

/// CPUs that have serviced at least one interrupt for `iface`.
///
/// The header row gives the number of per-CPU count columns. Lines whose
/// device columns do not name the interface are ignored. The result is
/// sorted and de-duplicated.
pub fn identify_cpus(content: &str, iface: &str) -> CpuList {
    let mut lines = content.lines().peekable();

    let ncpus = match lines.peek() {
        Some(header) if header.trim_start().starts_with("CPU") => {
            let n = header.split_whitespace().count();
            lines.next();
            Some(n)
        }
        _ => None,
    };

    let mut cpus = CpuList::new();
    for line in lines {
        let mut tokens = line.split_whitespace();
        // IRQ number or name, e.g. "45:" or "NMI:"
        if tokens.next().is_none() {
            continue;
        }

        let mut counts = Vec::new();
        let mut rest = Vec::new();
        for token in tokens {
            let is_count = rest.is_empty() && ncpus.map_or(true, |n| counts.len() < n);
            match token.parse::<u64>() {
                Ok(count) if is_count => counts.push(count),
                _ => rest.push(token),
            }
        }

        if !rest.iter().any(|t| device_matches(t, iface)) {
            continue;
        }

        cpus.extend(
            counts
                .iter()
                .enumerate()
                .filter(|(_, count)| **count > 0)
                .map(|(cpu, _)| cpu),
        );
    }

    cpus.sort_unstable();
    cpus.dedup();
    cpus
}
