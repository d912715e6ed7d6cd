//! Run-time statistics: per-run timing plus the aggregate summary record, matching
//! `endTiming`/`genStats`.

use std::time::Duration;

use comfy_table::{Table, presets::ASCII_MARKDOWN};

/// Timing for a single run.
#[derive(Debug, Clone, Copy)]
pub struct RunTiming {
    pub runtime: Duration,
}

/// Aggregate statistics across all runs of one invocation.
#[derive(Debug, Clone, Copy)]
pub struct RunStats {
    pub num_runs: u32,
    pub total_runtime: Duration,
    pub min_runtime: Duration,
    pub max_runtime: Duration,
}

impl RunStats {
    pub fn new() -> Self {
        RunStats {
            num_runs: 0,
            total_runtime: Duration::ZERO,
            min_runtime: Duration::MAX,
            max_runtime: Duration::ZERO,
        }
    }

    pub fn record(&mut self, timing: RunTiming) {
        self.num_runs += 1;
        self.total_runtime += timing.runtime;
        self.min_runtime = self.min_runtime.min(timing.runtime);
        self.max_runtime = self.max_runtime.max(timing.runtime);
    }

    pub fn avg_runtime(&self) -> Duration {
        if self.num_runs == 0 {
            Duration::ZERO
        } else {
            self.total_runtime / self.num_runs
        }
    }
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

fn fmt_secs(d: Duration) -> String {
    format!("{}.{:03}", d.as_secs(), d.subsec_millis())
}

/// One run's runtime line, either plain or CSV, matching `endTiming`'s output.
pub fn format_run_line(timing: RunTiming, csv: bool) -> String {
    if csv {
        fmt_secs(timing.runtime)
    } else {
        format!("runtime: {}", fmt_secs(timing.runtime))
    }
}

/// The final summary record across all runs, matching `genStats`.
pub fn format_summary(stats: &RunStats, csv: bool) -> String {
    if csv {
        format!(
            "#numRuns,TotalRuntime,AvgRuntime,MinRuntime,MaxRuntime\n{},{},{},{},{}",
            stats.num_runs,
            fmt_secs(stats.total_runtime),
            fmt_secs(stats.avg_runtime()),
            fmt_secs(stats.min_runtime),
            fmt_secs(stats.max_runtime),
        )
    } else {
        let mut table = Table::new();
        table.load_preset(ASCII_MARKDOWN);
        table.set_header(vec!["runs", "total", "avg", "min", "max"]);
        table.add_row(vec![
            stats.num_runs.to_string(),
            fmt_secs(stats.total_runtime),
            fmt_secs(stats.avg_runtime()),
            fmt_secs(stats.min_runtime),
            fmt_secs(stats.max_runtime),
        ]);
        format!("{table}\nAll times are wallclock time.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregates_min_avg_max() {
        let mut stats = RunStats::new();
        stats.record(RunTiming { runtime: Duration::from_millis(100) });
        stats.record(RunTiming { runtime: Duration::from_millis(300) });
        stats.record(RunTiming { runtime: Duration::from_millis(200) });
        assert_eq!(stats.num_runs, 3);
        assert_eq!(stats.min_runtime, Duration::from_millis(100));
        assert_eq!(stats.max_runtime, Duration::from_millis(300));
        assert_eq!(stats.avg_runtime(), Duration::from_millis(200));
    }

    #[test]
    fn csv_summary_has_header_and_one_data_line() {
        let mut stats = RunStats::new();
        stats.record(RunTiming { runtime: Duration::from_millis(500) });
        let out = format_summary(&stats, true);
        let mut lines = out.lines();
        assert!(lines.next().unwrap().starts_with('#'));
        assert!(lines.next().unwrap().contains("1,"));
    }
}
