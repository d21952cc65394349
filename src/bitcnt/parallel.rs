use std::path::Path;

use log::debug;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

use super::count::Count;
use super::source::{BitCounter, CountError, STDIN_NAME, Source};

/// Outcome for one requested input.
#[derive(Debug)]
pub struct SourceReport {
    /// Name for the report line (`<stdin>` for `-`).
    pub name: String,
    pub result: Result<Count, CountError>,
}

/// Fixed-size worker pool; `None` keeps rayon's default (one per CPU).
pub fn build_pool(threads: Option<usize>) -> Result<ThreadPool, ThreadPoolBuildError> {
    let mut builder = ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n.max(1));
    }
    let pool = builder.build()?;
    debug!("worker pool with {} threads", pool.current_num_threads());
    Ok(pool)
}

/// Count one input; `-` means standard input.
pub fn count_input(counter: &BitCounter, input: &str) -> SourceReport {
    if input == "-" {
        let mut source = Source::stdin();
        return SourceReport {
            name: STDIN_NAME.to_string(),
            result: counter.count_source(&mut source),
        };
    }
    SourceReport {
        name: input.to_string(),
        result: counter.count_path(Path::new(input)),
    }
}

/// Count every input, one worker per input, on the current rayon pool.
///
/// Each worker owns its file and scratch buffer; nothing is shared until the
/// results come back. Reports are in input order.
///
/// Standard input is read by the first `-` only. Later `-` inputs find it
/// already at end of file and report `{0, 0}`, so fd 0 is never read by two
/// workers at once.
pub fn count_inputs(counter: &BitCounter, inputs: &[String]) -> Vec<SourceReport> {
    count_inputs_with(inputs, |input| count_input(counter, input))
}

pub(super) fn count_inputs_with<F>(inputs: &[String], count: F) -> Vec<SourceReport>
where
    F: Fn(&str) -> SourceReport + Sync,
{
    let first_stdin = inputs.iter().position(|input| input == "-");
    inputs
        .par_iter()
        .enumerate()
        .map(|(i, input)| {
            if input == "-" && Some(i) != first_stdin {
                debug!("{}: already read, counting as empty", STDIN_NAME);
                return SourceReport {
                    name: STDIN_NAME.to_string(),
                    result: Ok(Count::default()),
                };
            }
            count(input)
        })
        .collect()
}

/// Sum of every successful source. Failed sources are left out.
pub fn grand_total(reports: &[SourceReport]) -> Count {
    reports
        .iter()
        .filter_map(|r| r.result.as_ref().ok())
        .sum()
}
