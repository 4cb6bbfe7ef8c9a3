//! Internal micro-benchmark. A fixed fibonacci workload timed with
//! `std::time::Instant` — no external benchmark harness, matching the reference's
//! `--benchmark` flag which just times one representative script.

use crate::builtins;
use crate::evaluator;
use crate::parser;
use std::time::{Duration, Instant};

const FIBONACCI_SOURCE: &str = "\
function fib(x) {
    let a = 0;
    let b = 1;
    for (i in range(0, x)) {
        let c = b;
        b = a + b;
        a = c;
    }
    return a;
}
fib(28);
";

/// Parses and evaluates the fixed workload once, returning the wall-clock duration.
pub fn run() -> Duration {
    let start = Instant::now();
    let (statements, errors) = parser::parse(FIBONACCI_SOURCE);
    debug_assert!(errors.is_empty(), "benchmark source must parse cleanly");
    let env = builtins::new_global_env();
    evaluator::eval_program(&statements, &env);
    start.elapsed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn benchmark_runs_and_reports_a_duration() {
        let elapsed = run();
        assert!(elapsed.as_nanos() > 0);
    }
}
