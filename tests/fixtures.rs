use std::fs;
use std::path::PathBuf;

use stackshed::{schedule, text, Error};

pub static TESTS_DIR: &str = "tests/files";

// Include the programmatically generated test file.
include!(concat!(env!("OUT_DIR"), "/sched_tests.rs"));

/// Run a named fixture out of `tests/files`: parse the `.sched` problem,
/// schedule it, and check the result against the sibling `.expected`
/// file, if one exists.  A missing `.expected` just asserts the schedule
/// succeeds; `infeasible` asserts `Error::NoSchedule`; `weight: N` checks
/// the exact weight.
fn check(test: &str) {
    let schedfile = to_schedfile(test);
    let source = fs::read_to_string(&schedfile).unwrap_or_else(|e| panic!("{test}.sched: {e}"));
    let problem = text::parse(&source).unwrap_or_else(|e| panic!("{test}.sched: {e}"));

    let result = schedule(problem.input_symbols, problem.start_output_stack, problem.start_done_effects);

    match fs::read_to_string(to_expectedfile(test)) {
        Ok(expected) => check_expected(test, expected.trim(), result),
        Err(_) => {
            result.unwrap_or_else(|e| panic!("{test}: expected a schedule, got {e}"));
        }
    }
}

fn check_expected(test: &str, expected: &str, result: Result<stackshed::Schedule, Error>) {
    if expected == "infeasible" {
        assert!(matches!(result, Err(Error::NoSchedule)), "{test}: expected infeasible, got {result:?}");
    } else {
        let weight: usize = expected
            .strip_prefix("weight:")
            .unwrap_or(expected)
            .trim()
            .parse()
            .unwrap_or_else(|_| panic!("{test}.expected: malformed weight line {expected:?}"));
        let got = result.unwrap_or_else(|e| panic!("{test}: expected weight {weight}, got error {e}"));
        assert_eq!(got.weight, weight, "{test}: unexpected weight");
    }
}

fn to_schedfile(test: &str) -> PathBuf {
    let mut path = PathBuf::from(TESTS_DIR);
    path.push(test);
    path.set_extension("sched");
    path
}

fn to_expectedfile(test: &str) -> PathBuf {
    let mut path = PathBuf::from(TESTS_DIR);
    path.push(test);
    path.set_extension("expected");
    path
}
