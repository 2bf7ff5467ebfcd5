//! CPU and memory figures for the dock.
//!
//! # Platform Support
//!
//! - **Linux**: Reads `/proc/stat` and `/proc/meminfo`
//! - **Other**: No figures; the dock shows only the clock

// Rust guideline compliant 2026-02

use std::time::Instant;

use crate::constants::STATS_REFRESH_INTERVAL;

/// Aggregate CPU jiffies from one `/proc/stat` sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct CpuSample {
    busy: u64,
    total: u64,
}

/// Periodically refreshed system usage.
#[derive(Debug, Default)]
pub struct SystemStats {
    cpu_percent: Option<f32>,
    mem_percent: Option<f32>,
    last_sample: Option<CpuSample>,
    last_refresh: Option<Instant>,
}

impl SystemStats {
    /// Create an empty stats holder. Figures appear after the second refresh.
    pub fn new() -> Self {
        Self::default()
    }

    /// CPU usage since the previous sample, in percent.
    pub fn cpu_percent(&self) -> Option<f32> {
        self.cpu_percent
    }

    /// Used memory, in percent.
    pub fn mem_percent(&self) -> Option<f32> {
        self.mem_percent
    }

    /// Refresh if [`STATS_REFRESH_INTERVAL`] has passed. Returns `true` when
    /// the figures changed.
    pub fn refresh_if_due(&mut self, now: Instant) -> bool {
        if self
            .last_refresh
            .is_some_and(|t| now.saturating_duration_since(t) < STATS_REFRESH_INTERVAL)
        {
            return false;
        }
        self.last_refresh = Some(now);
        let before = (self.cpu_percent, self.mem_percent);
        self.refresh();
        before != (self.cpu_percent, self.mem_percent)
    }

    #[cfg(target_os = "linux")]
    fn refresh(&mut self) {
        if let Ok(stat) = std::fs::read_to_string("/proc/stat") {
            if let Some(sample) = parse_cpu_sample(&stat) {
                if let Some(prev) = self.last_sample {
                    self.cpu_percent = cpu_percent_between(prev, sample);
                }
                self.last_sample = Some(sample);
            }
        }
        if let Ok(meminfo) = std::fs::read_to_string("/proc/meminfo") {
            self.mem_percent = parse_mem_percent(&meminfo);
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn refresh(&mut self) {}
}

/// Parse the aggregate `cpu` line of `/proc/stat`.
fn parse_cpu_sample(stat: &str) -> Option<CpuSample> {
    let line = stat.lines().find(|l| l.starts_with("cpu "))?;
    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .filter_map(|f| f.parse().ok())
        .collect();
    if fields.len() < 4 {
        return None;
    }
    let total: u64 = fields.iter().sum();
    // idle + iowait
    let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
    Some(CpuSample {
        busy: total.saturating_sub(idle),
        total,
    })
}

fn cpu_percent_between(prev: CpuSample, next: CpuSample) -> Option<f32> {
    let total = next.total.checked_sub(prev.total)?;
    if total == 0 {
        return None;
    }
    let busy = next.busy.saturating_sub(prev.busy);
    Some((busy as f64 / total as f64 * 100.0) as f32)
}

/// Used memory percentage from `/proc/meminfo` (`MemTotal` vs `MemAvailable`).
fn parse_mem_percent(meminfo: &str) -> Option<f32> {
    let field = |name: &str| -> Option<u64> {
        meminfo
            .lines()
            .find(|l| l.starts_with(name))?
            .split_whitespace()
            .nth(1)?
            .parse()
            .ok()
    };
    let total = field("MemTotal:")?;
    let available = field("MemAvailable:")?;
    if total == 0 {
        return None;
    }
    Some(((total.saturating_sub(available)) as f64 / total as f64 * 100.0) as f32)
}
