//! Example: draining a batch of jobs without stopping at failures
//!
//! `run_to_completion` attaches a catch-all stage, runs every job, and hands
//! over all failures at the end. `run_silently` does the same and forgets
//! them.

use anyhow::Context;
use catchable::{run_to_completion, wrap, AggregateError, RunExt};
use std::cell::Cell;
use std::io;

#[derive(thiserror::Error, Debug)]
pub enum JobError {
    #[error("job {0} timed out")]
    Timeout(u32),

    #[error("job {id} could not write its output")]
    Io {
        id: u32,
        #[source]
        source: io::Error,
    },
}

fn run_job(id: u32) -> Result<u32, JobError> {
    match id % 5 {
        3 => Err(JobError::Timeout(id)),
        4 => Err(JobError::Io {
            id,
            source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only volume"),
        }),
        _ => Ok(id * 100),
    }
}

fn report(errors: &AggregateError) -> anyhow::Result<()> {
    println!("   {errors}");
    for (i, err) in errors.iter().enumerate() {
        let kind = err.chain_any::<io::Error>().map(io::Error::kind);
        println!("   [{i}] {} (io: {:?})", err.message(), kind);
    }
    if errors.len() > 3 {
        anyhow::bail!("{} jobs failed", errors.len());
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    println!("=== run safely ===\n");

    let completed = Cell::new(0);
    let jobs = wrap(1..=10).map(|id| {
        let out = run_job(id)?;
        completed.set(completed.get() + 1);
        Ok::<_, JobError>(out)
    });

    println!("1. Run to completion:");
    let mut outcome = Ok(());
    run_to_completion(jobs.clone(), |errors| outcome = report(&errors));
    println!("   completed: {}", completed.get());
    if let Err(e) = outcome.context("first batch") {
        println!("   {e:#}");
    }

    println!("\n2. Run silently:");
    completed.set(0);
    jobs.run_silently();
    println!("   completed: {}", completed.get());

    println!("\n3. Nothing fails:");
    let mut failures = 0;
    vec![1, 2, 5].run_to_completion(|errors| failures = errors.len());
    println!("   failures: {failures}");

    Ok(())
}
