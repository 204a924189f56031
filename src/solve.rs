//! Solver driver: configures the CP backend, runs the search, and
//! materializes the schedule and per-employee metrics.

use std::collections::BTreeMap;

use selen::prelude::*;
use serde::Serialize;

use crate::compile::{compile, Compiled};
use crate::error::{Result, SolveError};
use crate::spec::Spec;

/// Outcome of one solve: a schedule, or a definitive "no solution".
///
/// Infeasibility and timeout are deliberately indistinguishable here; both
/// serialize as `{"status": "no_solution"}`.
#[derive(Debug, Serialize)]
#[serde(tag = "status")]
pub enum SolveOutcome {
    #[serde(rename = "ok")]
    Solved(ScheduleResult),
    #[serde(rename = "no_solution")]
    NoSolution,
}

impl SolveOutcome {
    pub fn result(&self) -> Option<&ScheduleResult> {
        match self {
            SolveOutcome::Solved(r) => Some(r),
            SolveOutcome::NoSolution => None,
        }
    }
}

/// A materialized schedule with the objective value and workload metrics.
#[derive(Debug, Serialize)]
pub struct ScheduleResult {
    pub objective: i64,
    /// day -> site -> shift -> assigned employees, plus the day's OFF list.
    pub schedule: BTreeMap<String, DayAssignments>,
    pub metrics: Metrics,
}

/// Assignments of a single day. Site maps serialize next to the `OFF` key,
/// mirroring the wire shape `{site: {shift: [emp]}, "OFF": [emp]}`.
#[derive(Debug, Serialize)]
pub struct DayAssignments {
    #[serde(flatten)]
    pub sites: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    #[serde(rename = "OFF")]
    pub off: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct Metrics {
    pub minutes_worked: BTreeMap<String, i64>,
    pub shift_counts: BTreeMap<String, BTreeMap<String, i64>>,
}

/// Compiles `spec` and runs the backend for at most `max_time_seconds`.
///
/// `workers` is accepted for interface parity with parallel backends and
/// logged; the selen search itself is single-threaded. Only infrastructural
/// failures surface as errors; any terminal backend status other than a
/// found solution maps to [`SolveOutcome::NoSolution`].
pub fn solve(spec: &Spec, max_time_seconds: f64, workers: usize) -> Result<SolveOutcome> {
    let timeout_ms = (max_time_seconds.max(0.0) * 1000.0) as u64;
    let config = SolverConfig::default().with_timeout_ms(timeout_ms);

    tracing::debug!(max_time_seconds, workers, "starting solve");

    let mut model = Model::with_config(config);
    let compiled = compile(spec, &mut model)?;

    match model.minimize(compiled.objective) {
        Ok(solution) => {
            let result = materialize(&solution, &compiled);
            tracing::debug!(objective = result.objective, "solution found");
            Ok(SolveOutcome::Solved(result))
        }
        Err(SolverError::NoSolution { .. })
        | Err(SolverError::ConflictingConstraints { .. })
        | Err(SolverError::Timeout { .. })
        | Err(SolverError::MemoryLimit { .. })
        | Err(SolverError::InvalidConstraint { .. })
        | Err(SolverError::InvalidDomain { .. })
        | Err(SolverError::InvalidVariable { .. }) => {
            tracing::debug!("no solution within limits");
            Ok(SolveOutcome::NoSolution)
        }
        Err(other) => Err(SolveError::Internal(other.to_string())),
    }
}

/// Reads the assignment back out of the solver: `schedule[day][site][shift]`
/// lists plus OFF lists, and the per-employee workload metrics. Employees
/// appear everywhere in `sets.employees` order.
fn materialize(solution: &Solution, compiled: &Compiled) -> ScheduleResult {
    let shape = &compiled.shape;
    let vars = &compiled.vars;

    let mut schedule = BTreeMap::new();
    for (d, day) in shape.days.iter().enumerate() {
        let mut off = Vec::new();
        for (e, emp) in shape.employees.iter().enumerate() {
            if solution.get_int(vars.off(e, d)) == 1 {
                off.push(emp.clone());
            }
        }

        let mut sites = BTreeMap::new();
        for (t, site) in shape.sites.iter().enumerate() {
            let mut by_shift = BTreeMap::new();
            for (s, shift) in shape.work_shifts.iter().enumerate() {
                let assigned: Vec<String> = shape
                    .employees
                    .iter()
                    .enumerate()
                    .filter(|(e, _)| solution.get_int(vars.x(*e, d, s, t)) == 1)
                    .map(|(_, id)| id.clone())
                    .collect();
                by_shift.insert(shift.clone(), assigned);
            }
            sites.insert(site.clone(), by_shift);
        }

        schedule.insert(day.clone(), DayAssignments { sites, off });
    }

    let mut minutes_worked = BTreeMap::new();
    let mut shift_counts = BTreeMap::new();
    for (e, emp) in shape.employees.iter().enumerate() {
        let mut minutes: i64 = 0;
        let mut counts = BTreeMap::new();
        for (s, shift) in shape.work_shifts.iter().enumerate() {
            let mut count: i64 = 0;
            for d in 0..shape.n_days() {
                let works = vars
                    .site_row(e, d, s)
                    .iter()
                    .any(|&v| solution.get_int(v) == 1);
                if works {
                    count += 1;
                    minutes += shape.shift_minutes[s] as i64;
                }
            }
            counts.insert(shift.clone(), count);
        }
        minutes_worked.insert(emp.clone(), minutes);
        shift_counts.insert(emp.clone(), counts);
    }

    ScheduleResult {
        objective: solution.get_int(compiled.objective) as i64,
        schedule,
        metrics: Metrics {
            minutes_worked,
            shift_counts,
        },
    }
}
