//! Test runner - executes tests and reports results

use colored::Colorize;
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use crate::types::{SharedBackendState, TestResult};

/// Upper bound on one test; the relay itself is configured with a 10s upstream timeout
const TEST_TIMEOUT: Duration = Duration::from_secs(20);

type TestFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;

/// A single test case
pub struct TestCase {
    pub name: &'static str,
    pub description: &'static str,
    pub run: Box<dyn Fn(TestContext) -> TestFuture + Send + Sync>,
}

impl TestCase {
    /// Group prefix, e.g. "relay" for "relay/health"
    fn group(&self) -> &'static str {
        self.name.split('/').next().unwrap_or(self.name)
    }
}

/// Context passed to each test - relay and backend addresses plus backend state
#[derive(Clone)]
pub struct TestContext {
    pub relay_addr: String,
    pub backend_addr: String,
    pub backend_state: SharedBackendState,
    pub http_client: reqwest::Client,
}

impl TestContext {
    /// Absolute URL of a mock backend route
    pub fn backend_url(&self, path: &str) -> String {
        format!("http://{}{}", self.backend_addr, path)
    }

    fn reset_backend(&self) {
        let mut state = self.backend_state.lock().unwrap();
        state.response_queue.clear();
        state.received_requests.clear();
    }
}

/// Run all provided test cases sequentially and report results
pub async fn run_tests(cases: Vec<TestCase>, ctx: TestContext, filter: Option<&str>) -> Vec<TestResult> {
    let mut results = Vec::new();
    // group -> (passed, failed)
    let mut groups: BTreeMap<&'static str, (usize, usize)> = BTreeMap::new();

    println!("\n{}", "═══════════════════════════════════════════════════".bright_blue());
    println!("{}", "  scribe-relay End-to-End Tests".bright_white().bold());
    println!("{}", "═══════════════════════════════════════════════════".bright_blue());
    println!("  Relay:   {}", ctx.relay_addr.bright_cyan());
    println!("  Backend: {}", ctx.backend_addr.bright_cyan());

    let cases_to_run: Vec<&TestCase> = cases
        .iter()
        .filter(|c| filter.map_or(true, |f| c.name.contains(f)))
        .collect();

    println!("  Running: {} test(s)\n", cases_to_run.len().to_string().bright_cyan());

    for case in &cases_to_run {
        ctx.reset_backend();

        let start = Instant::now();
        print!("  {} {} ... ", "▶".bright_blue(), case.name.bright_white());

        let outcome = match tokio::time::timeout(TEST_TIMEOUT, (case.run)(ctx.clone())).await {
            Ok(result) => result,
            Err(_) => Err(anyhow::anyhow!("Timed out after {:?}", TEST_TIMEOUT)),
        };
        let duration_ms = start.elapsed().as_millis() as u64;
        let tally = groups.entry(case.group()).or_default();

        let error = match outcome {
            Ok(()) => {
                println!("{} ({duration_ms}ms)", "PASS".bright_green().bold());
                tally.0 += 1;
                None
            }
            Err(e) => {
                println!("{} ({duration_ms}ms)", "FAIL".bright_red().bold());
                println!("    {} {}", "Error:".bright_red(), e);
                for cause in e.chain().skip(1) {
                    println!("    {} {}", "Caused by:".yellow(), cause);
                }
                tally.1 += 1;
                Some(e.to_string())
            }
        };

        results.push(TestResult {
            name: case.name.to_string(),
            passed: error.is_none(),
            error,
            duration_ms,
        });
    }

    print_summary(&groups);
    results
}

fn print_summary(groups: &BTreeMap<&'static str, (usize, usize)>) {
    println!("\n{}", "───────────────────────────────────────────────────".bright_blue());
    for (group, (passed, failed)) in groups {
        let line = format!("  {:<10} {} passed, {} failed", group, passed, failed);
        if *failed == 0 {
            println!("{}", line.green());
        } else {
            println!("{}", line.red());
        }
    }

    let passed: usize = groups.values().map(|(p, _)| p).sum();
    let failed: usize = groups.values().map(|(_, f)| f).sum();
    let summary = format!("  Results: {} passed, {} failed", passed, failed);
    if failed == 0 {
        println!("{}", summary.bright_green().bold());
    } else {
        println!("{}", summary.bright_red().bold());
    }
    println!("{}\n", "═══════════════════════════════════════════════════".bright_blue());
}

/// Helper to list all available tests
pub fn list_tests(cases: &[TestCase]) {
    println!("\n{}", "Available tests:".bright_white().bold());
    let mut current_group = "";
    for case in cases {
        if case.group() != current_group {
            current_group = case.group();
            println!("  {}", current_group.bright_white().bold());
        }
        println!("    {} - {}", case.name.bright_cyan(), case.description);
    }
    println!();
}
