use std::env;
use std::time::Instant;

use remat_dp::simulate::replay;
use remat_dp::{Block, Chain, DecisionTable, Scheduler, Solution, SolverKind};
use sysinfo::{get_current_pid, ProcessRefreshKind, System};

fn main() {
    let options = match Options::parse(env::args().skip(1)) {
        Ok(opts) => opts,
        Err(err) => {
            eprintln!("remat_probe: {err}");
            Options::print_help();
            std::process::exit(2);
        }
    };

    eprintln!("\n{}", "=".repeat(72));
    eprintln!("remat-dp probe: solver scaling and schedule soundness");
    eprintln!("{}", "=".repeat(72));
    eprintln!("  wall_s        solve + reconstruct time of the memoized solver");
    eprintln!("  rss_delta_kib resident memory growth during the run");
    eprintln!(
        "  status        'passed' = iterative agrees and replay fits (len <= {})",
        options.verify_limit
    );
    eprintln!();

    let mut sys = System::new();
    let mut measurements = Vec::new();
    for &len in LENGTHS {
        let chain = probe_chain(len);
        let total: u64 = chain.checkpoint_weights().iter().sum::<u64>()
            + chain
                .blocks()
                .iter()
                .map(|b| b.solutions()[0].saved_memory)
                .sum::<u64>();
        let budgets = [total / 4, total / 2, total];
        for &limit in &budgets {
            let limit = limit.min(options.max_budget);
            eprint!("  len={len:<4} limit={limit:<6} ");
            let m = measure(len, limit, &mut sys, || verify(&chain, limit, &options));
            eprintln!(
                "{} time={:.3}s status={}",
                m.expected_time
                    .map_or_else(|| "infeasible".to_string(), |t| format!("expected={t:.1}")),
                m.wall_s,
                m.status.label()
            );
            measurements.push(m);
        }
    }

    print_summary(&measurements);

    if let Err(err) = options.format.write(&measurements) {
        eprintln!("remat_probe output error: {err}");
        std::process::exit(1);
    }
}

const LENGTHS: &[usize] = &[4, 8, 16, 24, 32, 48, 64];

struct Options {
    format: OutputFormat,
    verify_limit: usize,
    max_budget: u64,
}

impl Options {
    fn parse<I, T>(mut args: I) -> Result<Self, String>
    where
        I: Iterator<Item = T>,
        T: Into<String>,
    {
        let mut format = OutputFormat::Csv;
        let mut verify_limit = 24usize;
        let mut max_budget = 512u64;

        while let Some(arg) = args.next() {
            let arg = arg.into();
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) => (flag.to_string(), Some(value.to_string())),
                None => (arg.clone(), None),
            };
            if flag == "--help" || flag == "-h" {
                Options::print_help();
                std::process::exit(0);
            }
            let mut value = || -> Result<String, String> {
                match &inline {
                    Some(v) => Ok(v.clone()),
                    None => args
                        .next()
                        .map(Into::into)
                        .ok_or_else(|| format!("missing value after {flag}")),
                }
            };
            match flag.as_str() {
                "--format" => format = OutputFormat::from_str(&value()?)?,
                "--verify-limit" => {
                    verify_limit = value()?
                        .parse()
                        .map_err(|_| "verify limit must be a non-negative integer".to_string())?
                }
                "--max-budget" => {
                    max_budget = value()?
                        .parse()
                        .map_err(|_| "max budget must be a non-negative integer".to_string())?
                }
                _ => return Err(format!("unrecognized argument '{arg}'")),
            }
        }

        Ok(Self {
            format,
            verify_limit,
            max_budget,
        })
    }

    fn print_help() {
        println!(
            "\
Usage: cargo run --bin remat_probe [-- <options>]

Options:
  --format <csv|table|json>  Output format (default: csv)
  --verify-limit <N>         Longest chain cross-checked against the iterative solver (default: 24)
  --max-budget <M>           Upper bound on probed memory limits (default: 512)
  -h, --help                 Print this help message
"
        );
    }
}

#[derive(Copy, Clone)]
enum OutputFormat {
    Csv,
    Table,
    Json,
}

impl OutputFormat {
    fn from_str(value: &str) -> Result<Self, String> {
        match value {
            "csv" => Ok(Self::Csv),
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown format '{other}'")),
        }
    }

    fn write(self, measurements: &[Measurement]) -> Result<(), String> {
        match self {
            OutputFormat::Csv => write_csv(measurements),
            OutputFormat::Table => write_table(measurements),
            OutputFormat::Json => write_json(measurements),
        }
    }
}

struct Measurement {
    len: usize,
    limit: u64,
    expected_time: Option<f64>,
    operations: usize,
    wall_s: f64,
    rss_delta_kib: u64,
    status: VerificationStatus,
    detail: Option<String>,
}

#[derive(Clone, Copy)]
enum VerificationStatus {
    NotChecked,
    Passed,
    Failed,
}

impl VerificationStatus {
    fn label(&self) -> &'static str {
        match self {
            VerificationStatus::NotChecked => "not_checked",
            VerificationStatus::Passed => "passed",
            VerificationStatus::Failed => "failed",
        }
    }
}

struct Outcome {
    expected_time: Option<f64>,
    operations: usize,
    status: VerificationStatus,
    detail: Option<String>,
}

impl Outcome {
    fn failed(detail: String) -> Self {
        Self {
            expected_time: None,
            operations: 0,
            status: VerificationStatus::Failed,
            detail: Some(detail),
        }
    }
}

fn verify(chain: &Chain, limit: u64, options: &Options) -> Outcome {
    let scheduler = Scheduler::new(chain.clone());
    let schedule = match scheduler.solve(limit) {
        Ok(s) => s,
        Err(err) if err.is_infeasible() => {
            return Outcome {
                expected_time: None,
                operations: 0,
                status: VerificationStatus::NotChecked,
                detail: Some(err.to_string()),
            }
        }
        Err(err) => return Outcome::failed(err.to_string()),
    };

    let mut outcome = Outcome {
        expected_time: Some(schedule.expected_time),
        operations: schedule.sequence.len(),
        status: VerificationStatus::NotChecked,
        detail: None,
    };
    if chain.len() > options.verify_limit {
        return outcome;
    }

    let dense = match SolverKind::Iterative.solve(chain, schedule.budget) {
        Ok(t) => t,
        Err(err) => return Outcome::failed(err.to_string()),
    };
    let dense_root = dense.time(schedule.budget, 0, chain.len());
    if dense_root.map(f64::to_bits) != Some(schedule.expected_time.to_bits()) {
        outcome.status = VerificationStatus::Failed;
        outcome.detail = Some(format!(
            "memoized={}, iterative={dense_root:?}",
            schedule.expected_time
        ));
        return outcome;
    }
    match replay(chain, &schedule.sequence) {
        Ok(r) if r.peak <= schedule.budget => outcome.status = VerificationStatus::Passed,
        Ok(r) => {
            outcome.status = VerificationStatus::Failed;
            outcome.detail = Some(format!("replay peak {} over budget {}", r.peak, schedule.budget));
        }
        Err(err) => {
            outcome.status = VerificationStatus::Failed;
            outcome.detail = Some(err.to_string());
        }
    }
    outcome
}

fn print_summary(measurements: &[Measurement]) {
    let mut passed = 0;
    let mut failed = 0;
    let mut infeasible = 0;
    for m in measurements {
        match m.status {
            VerificationStatus::Passed => passed += 1,
            VerificationStatus::Failed => failed += 1,
            VerificationStatus::NotChecked => {}
        }
        if m.expected_time.is_none() {
            infeasible += 1;
        }
    }
    eprintln!("\n{}", "=".repeat(72));
    eprintln!(
        "runs: {}  passed: {passed}  failed: {failed}  infeasible: {infeasible}",
        measurements.len()
    );
    for m in measurements {
        if let (VerificationStatus::Failed, Some(detail)) = (m.status, &m.detail) {
            eprintln!("  failed len={} limit={}: {detail}", m.len, m.limit);
        }
    }
    eprintln!("{}", "=".repeat(72));
    eprintln!();
}

fn measure<F>(len: usize, limit: u64, sys: &mut System, compute: F) -> Measurement
where
    F: FnOnce() -> Outcome,
{
    let before = rss_kib(sys);
    let start = Instant::now();
    let outcome = compute();
    let duration = start.elapsed();
    let after = rss_kib(sys);

    Measurement {
        len,
        limit,
        expected_time: outcome.expected_time,
        operations: outcome.operations,
        wall_s: duration.as_secs_f64(),
        rss_delta_kib: after.saturating_sub(before),
        status: outcome.status,
        detail: outcome.detail,
    }
}

fn fmt_time(t: Option<f64>) -> String {
    t.map_or_else(String::new, |t| format!("{t:.3}"))
}

fn write_csv(measurements: &[Measurement]) -> Result<(), String> {
    println!("len,limit,expected_time,operations,wall_s,rss_delta_kib,status,detail");
    for m in measurements {
        let detail = m
            .detail
            .as_ref()
            .map(|s| s.replace('"', "'"))
            .unwrap_or_default();
        println!(
            "{},{},{},{},{:.3},{},{},\"{}\"",
            m.len,
            m.limit,
            fmt_time(m.expected_time),
            m.operations,
            m.wall_s,
            m.rss_delta_kib,
            m.status.label(),
            detail
        );
    }
    Ok(())
}

fn write_table(measurements: &[Measurement]) -> Result<(), String> {
    println!(
        "{:>5}  {:>7}  {:>12}  {:>6}  {:>9}  {:>13}  {:>11}  detail",
        "len", "limit", "expected", "ops", "wall_s", "rss_delta_kib", "status"
    );
    println!("{:-<80}", "");
    for m in measurements {
        println!(
            "{:>5}  {:>7}  {:>12}  {:>6}  {:>9.3}  {:>13}  {:>11}  {}",
            m.len,
            m.limit,
            fmt_time(m.expected_time),
            m.operations,
            m.wall_s,
            m.rss_delta_kib,
            m.status.label(),
            m.detail.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

fn write_json(measurements: &[Measurement]) -> Result<(), String> {
    println!("[");
    for (idx, m) in measurements.iter().enumerate() {
        let detail = m.detail.as_ref().map(|s| s.replace('"', "'"));
        println!(
            "  {{\"len\":{},\"limit\":{},\"expected_time\":{},\"operations\":{},\"wall_s\":{:.3},\"rss_delta_kib\":{},\"verification\":{{\"status\":\"{}\",\"detail\":{}}}}}{}",
            m.len,
            m.limit,
            m.expected_time.map_or_else(|| "null".to_string(), |t| format!("{t}")),
            m.operations,
            m.wall_s,
            m.rss_delta_kib,
            m.status.label(),
            match detail {
                Some(ref d) => format!("\"{d}\""),
                None => "null".to_string(),
            },
            if idx + 1 == measurements.len() { "" } else { "," }
        );
    }
    println!("]");
    Ok(())
}

fn rss_kib(sys: &mut System) -> u64 {
    sys.refresh_processes_specifics(ProcessRefreshKind::new());
    if let Some(process) = get_current_pid().ok().and_then(|pid| sys.process(pid)) {
        process.memory() / 1024
    } else {
        0
    }
}

/// Deterministic heterogeneous chain: activations cycle through a few sizes
/// and every block offers a fast and a lean solution.
fn probe_chain(len: usize) -> Chain {
    let mut builder = Chain::builder(2);
    for i in 0..len {
        let scale = (i % 5) as f64 + 1.0;
        let act = (i % 3) as u64 + 1;
        let fast = Solution::new(scale, 2.0 * scale)
            .with_saved_memory(2 * act)
            .with_overheads(0, act);
        let lean = Solution::new(1.5 * scale, 2.5 * scale).with_saved_memory(act);
        builder = builder.block(Block::new(vec![fast, lean], scale * 0.8, 0), act);
    }
    builder
        .loss(Solution::new(0.5, 0.5), 1)
        .build()
        .unwrap_or_else(|err| panic!("probe chain of length {len} is malformed: {err}"))
}
