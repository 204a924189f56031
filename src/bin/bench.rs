//! Benchmark for validate + solve throughput on the large demo spec.
//!
//! Run with: cargo run --release --bin bench

use std::time::Instant;

use shiftplan::demo_data::{self, DemoData};
use shiftplan::{solve, validate, SolveOutcome};

fn main() {
    let spec = demo_data::generate(DemoData::Large);
    let sets = spec.sets.as_ref().expect("demo spec has sets");

    println!("Benchmark: DSL compile + solve");
    println!("  Employees: {}", sets.employees.len());
    println!("  Days: {}", sets.days.len());
    println!("  Demand entries: {}", spec.demand_entries().len());
    println!("  Constraints: {}", spec.constraint_entries().len());
    println!();

    let validate_start = Instant::now();
    let report = validate(&spec);
    println!(
        "Validate: ok={} ({} warnings) in {:.2?}",
        report.ok,
        report.warnings.len(),
        validate_start.elapsed()
    );
    assert!(report.ok, "demo spec must validate: {:?}", report.errors);

    let solve_start = Instant::now();
    let outcome = solve(&spec, 30.0, 8).expect("solve should not fail structurally");
    let elapsed = solve_start.elapsed();

    match outcome {
        SolveOutcome::Solved(result) => {
            let assigned: usize = result
                .schedule
                .values()
                .map(|day| {
                    day.sites
                        .values()
                        .flat_map(|shifts| shifts.values())
                        .map(Vec::len)
                        .sum::<usize>()
                })
                .sum();
            println!("Solve: objective={} in {:.2?}", result.objective, elapsed);
            println!("  Assignments: {assigned}");
        }
        SolveOutcome::NoSolution => {
            println!("Solve: no solution within budget ({:.2?})", elapsed);
        }
    }
}
