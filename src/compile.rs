//! Compilation of a validated [`Spec`] into a CP model: decision variables,
//! coverage rows, hard constraint rows, and weighted penalty terms feeding a
//! single minimization objective.
//!
//! The compiler re-checks constraint payloads defensively and fails on the
//! first offending entry; full diagnostics belong to [`crate::validate`].

use std::collections::HashMap;

use selen::prelude::*;

use crate::error::{Result, SolveError};
use crate::scope::select_employees;
use crate::shift_time::{rest_minutes_between, shift_interval, ShiftInterval};
use crate::spec::{Constraint, ConstraintKind, FairTarget, Spec, OFF_SHIFT};

/// Dimensions and id lookups shared by the compiler and the result
/// materializer. Index order everywhere is employee, day, work shift, site.
#[derive(Debug)]
pub(crate) struct ModelShape {
    pub employees: Vec<String>,
    pub days: Vec<String>,
    pub work_shifts: Vec<String>,
    pub sites: Vec<String>,
    /// Declared payable minutes per work shift.
    pub shift_minutes: Vec<i32>,
    day_index: HashMap<String, usize>,
    work_shift_index: HashMap<String, usize>,
    site_index: HashMap<String, usize>,
    emp_index: HashMap<String, usize>,
}

impl ModelShape {
    fn from_spec(spec: &Spec) -> Result<Self> {
        let sets = spec
            .sets
            .as_ref()
            .ok_or_else(|| SolveError::SpecMissingField("sets".to_string()))?;

        if !sets.shifts.iter().any(|s| s == OFF_SHIFT) {
            return Err(SolveError::SpecInvalidValue(
                "sets.shifts must declare the OFF shift".to_string(),
            ));
        }

        let work_shifts: Vec<String> = sets
            .shifts
            .iter()
            .filter(|s| {
                *s != OFF_SHIFT
                    && spec
                        .shifts
                        .get(*s)
                        .map_or(true, |def| def.is_work.unwrap_or(true))
            })
            .cloned()
            .collect();

        let mut shift_minutes = Vec::with_capacity(work_shifts.len());
        for s in &work_shifts {
            let def = spec
                .shifts
                .get(s)
                .ok_or_else(|| SolveError::SpecMissingField(format!("shifts['{s}']")))?;
            let minutes = i32::try_from(def.minutes.unwrap_or(0))
                .map_err(|_| SolveError::Internal(format!("shifts['{s}'].minutes overflows")))?;
            shift_minutes.push(minutes);
        }

        let index_of = |values: &[String]| -> HashMap<String, usize> {
            values
                .iter()
                .enumerate()
                .map(|(i, v)| (v.clone(), i))
                .collect()
        };

        Ok(ModelShape {
            day_index: index_of(&sets.days),
            work_shift_index: index_of(&work_shifts),
            site_index: index_of(&spec.sites()),
            emp_index: index_of(&sets.employees),
            employees: sets.employees.clone(),
            days: sets.days.clone(),
            sites: spec.sites(),
            work_shifts,
            shift_minutes,
        })
    }

    pub fn n_days(&self) -> usize {
        self.days.len()
    }

    fn day(&self, label: &str) -> Result<usize> {
        self.day_index
            .get(label)
            .copied()
            .ok_or_else(|| SolveError::SpecMissingField(format!("day '{label}' not in sets.days")))
    }

    fn work_shift(&self, name: &str) -> Option<usize> {
        self.work_shift_index.get(name).copied()
    }

    fn site(&self, name: &str) -> Result<usize> {
        self.site_index
            .get(name)
            .copied()
            .ok_or_else(|| SolveError::SpecMissingField(format!("site '{name}' not in sets.sites")))
    }

    fn employee(&self, id: &str) -> Result<usize> {
        self.emp_index.get(id).copied().ok_or_else(|| {
            SolveError::SpecMissingField(format!("employee '{id}' not in sets.employees"))
        })
    }
}

/// Dense table of the decision variables: `x[e,d,s,site]` for work shifts
/// and `off[e,d]`, stored flat with stride arithmetic instead of a hash map.
#[derive(Debug)]
pub(crate) struct VarTable {
    x: Vec<VarId>,
    off: Vec<VarId>,
    days: usize,
    work_shifts: usize,
    sites: usize,
}

impl VarTable {
    fn build(model: &mut Model, shape: &ModelShape) -> VarTable {
        let (n_emp, n_days) = (shape.employees.len(), shape.n_days());
        let (n_ws, n_sites) = (shape.work_shifts.len(), shape.sites.len());

        let mut x = Vec::with_capacity(n_emp * n_days * n_ws * n_sites);
        let mut off = Vec::with_capacity(n_emp * n_days);
        for _e in 0..n_emp {
            for _d in 0..n_days {
                off.push(model.bool());
                for _s in 0..n_ws {
                    for _site in 0..n_sites {
                        x.push(model.bool());
                    }
                }
            }
        }

        VarTable {
            x,
            off,
            days: n_days,
            work_shifts: n_ws,
            sites: n_sites,
        }
    }

    pub fn x(&self, e: usize, d: usize, s: usize, site: usize) -> VarId {
        self.x[((e * self.days + d) * self.work_shifts + s) * self.sites + site]
    }

    /// The site variables of one `(employee, day, shift)` cell; summing the
    /// row yields the `works_shift` expression.
    pub fn site_row(&self, e: usize, d: usize, s: usize) -> &[VarId] {
        let base = ((e * self.days + d) * self.work_shifts + s) * self.sites;
        &self.x[base..base + self.sites]
    }

    pub fn off(&self, e: usize, d: usize) -> VarId {
        self.off[e * self.days + d]
    }
}

/// A linear expression accumulated as parallel coefficient/variable vectors,
/// posted through the backend's native linear constraints.
#[derive(Debug, Default)]
struct LinearSum {
    coeffs: Vec<i32>,
    vars: Vec<VarId>,
}

impl LinearSum {
    fn push(&mut self, coeff: i32, var: VarId) {
        self.coeffs.push(coeff);
        self.vars.push(var);
    }

    fn extend(&mut self, coeff: i32, vars: &[VarId]) {
        for &v in vars {
            self.push(coeff, v);
        }
    }

    fn eq(&self, model: &mut Model, rhs: i32) {
        if self.vars.is_empty() {
            if rhs != 0 {
                post_false(model);
            }
            return;
        }
        model.int_lin_eq(&self.coeffs, &self.vars, rhs);
    }

    fn le(&self, model: &mut Model, rhs: i32) {
        if self.vars.is_empty() {
            if rhs < 0 {
                post_false(model);
            }
            return;
        }
        model.int_lin_le(&self.coeffs, &self.vars, rhs);
    }

    fn ge(&self, model: &mut Model, rhs: i32) {
        if self.vars.is_empty() {
            if rhs > 0 {
                post_false(model);
            }
            return;
        }
        let negated: Vec<i32> = self.coeffs.iter().map(|c| -c).collect();
        model.int_lin_le(&negated, &self.vars, -rhs);
    }
}

/// An empty sum compared against a violated bound has no variables to hang a
/// row on; pin a fresh zero variable to an impossible value instead.
fn post_false(model: &mut Model) {
    let zero = model.int(0, 0);
    model.int_lin_eq(&[1], &[zero], 1);
}

/// One weighted penalty term of the objective.
struct PenaltyTerm {
    weight: i32,
    var: VarId,
    /// Upper bound of `var`, used to bound the objective domain.
    bound: i32,
}

/// The compiled model: variables wired into `model`, plus the objective
/// variable to minimize and the lookups needed to read a solution back.
#[derive(Debug)]
pub(crate) struct Compiled {
    pub shape: ModelShape,
    pub vars: VarTable,
    pub objective: VarId,
}

/// Compiles `spec` into `model`. Coverage rows are emitted before the
/// constraint list so the demand wiring exists regardless of constraint
/// order; constraints themselves add independent rows, so their order never
/// changes the feasible set.
pub(crate) fn compile(spec: &Spec, model: &mut Model) -> Result<Compiled> {
    let shape = ModelShape::from_spec(spec)?;
    let vars = VarTable::build(model, &shape);

    let compiler = Compiler {
        spec,
        shape,
        vars,
        model,
        penalties: Vec::new(),
    };
    compiler.run()
}

struct Compiler<'a> {
    spec: &'a Spec,
    shape: ModelShape,
    vars: VarTable,
    model: &'a mut Model,
    penalties: Vec<PenaltyTerm>,
}

impl<'a> Compiler<'a> {
    fn run(mut self) -> Result<Compiled> {
        self.compile_demand()?;

        // Screen every kind before emitting anything for any constraint.
        for (i, c) in self.spec.constraint_entries().iter().enumerate() {
            if c.parsed_kind().is_none() {
                return Err(SolveError::SpecInvalidValue(format!(
                    "constraints[{i}]: unsupported kind '{}'",
                    c.kind.as_deref().unwrap_or("<missing>")
                )));
            }
        }

        for (i, c) in self.spec.constraint_entries().iter().enumerate() {
            self.compile_constraint(i, c)?;
        }

        let objective = self.build_objective()?;

        tracing::debug!(
            assignment_vars = self.vars.x.len(),
            off_vars = self.vars.off.len(),
            penalty_terms = self.penalties.len(),
            "model compiled"
        );

        Ok(Compiled {
            shape: self.shape,
            vars: self.vars,
            objective,
        })
    }

    // ------------------------------------------------------------------
    // Coverage
    // ------------------------------------------------------------------

    fn compile_demand(&mut self) -> Result<()> {
        for (i, req) in self.spec.demand_entries().iter().enumerate() {
            let day = req
                .day
                .as_deref()
                .ok_or_else(|| SolveError::SpecMissingField(format!("demand[{i}].day")))?;
            let d = self.shape.day(day)?;

            let shift = req
                .shift
                .as_deref()
                .ok_or_else(|| SolveError::SpecMissingField(format!("demand[{i}].shift")))?;
            let s = self.shape.work_shift(shift).ok_or_else(|| {
                SolveError::SpecInvalidValue(format!(
                    "demand[{i}] references non-work shift '{shift}'"
                ))
            })?;

            let site = match req.site.as_deref() {
                Some(site) => self.shape.site(site)?,
                None => 0,
            };

            let mut headcount = LinearSum::default();
            for e in 0..self.shape.employees.len() {
                headcount.push(1, self.vars.x(e, d, s, site));
            }
            if let Some(eq) = req.eq {
                headcount.eq(self.model, cast_count(eq)?);
            } else {
                if let Some(min) = req.min {
                    headcount.ge(self.model, cast_count(min)?);
                }
                if let Some(max) = req.max {
                    headcount.le(self.model, cast_count(max)?);
                }
            }

            for (j, sk) in req.requirements.skills_min.iter().enumerate() {
                let skill = sk.skill.as_deref().ok_or_else(|| {
                    SolveError::SpecMissingField(format!(
                        "demand[{i}].requirements.skills_min[{j}].skill"
                    ))
                })?;
                let min = sk.min.ok_or_else(|| {
                    SolveError::SpecMissingField(format!(
                        "demand[{i}].requirements.skills_min[{j}].min"
                    ))
                })?;
                let mut qualified = LinearSum::default();
                for (e, id) in self.shape.employees.iter().enumerate() {
                    if self.spec.employee(id).is_some_and(|def| def.has_skill(skill)) {
                        qualified.push(1, self.vars.x(e, d, s, site));
                    }
                }
                qualified.ge(self.model, cast_count(min)?);
            }

            for (j, rl) in req.requirements.roles_min.iter().enumerate() {
                let role = rl.role.as_deref().ok_or_else(|| {
                    SolveError::SpecMissingField(format!(
                        "demand[{i}].requirements.roles_min[{j}].role"
                    ))
                })?;
                let min = rl.min.ok_or_else(|| {
                    SolveError::SpecMissingField(format!(
                        "demand[{i}].requirements.roles_min[{j}].min"
                    ))
                })?;
                let mut qualified = LinearSum::default();
                for (e, id) in self.shape.employees.iter().enumerate() {
                    if self.spec.employee(id).is_some_and(|def| def.has_role(role)) {
                        qualified.push(1, self.vars.x(e, d, s, site));
                    }
                }
                qualified.ge(self.model, cast_count(min)?);
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Constraint dispatch
    // ------------------------------------------------------------------

    fn compile_constraint(&mut self, i: usize, c: &Constraint) -> Result<()> {
        let cid = c
            .id
            .as_deref()
            .ok_or_else(|| SolveError::SpecMissingField(format!("constraints[{i}].id")))?
            .to_string();
        let kind = c.parsed_kind().ok_or_else(|| {
            SolveError::SpecInvalidValue(format!("{cid}: unsupported kind"))
        })?;

        let emps: Vec<usize> = select_employees(self.spec, &c.scope)
            .iter()
            .map(|id| self.shape.employee(id))
            .collect::<Result<_>>()?;

        match kind {
            ConstraintKind::ExactlyOneAssignmentPerDay => self.exactly_one(&cid, c, &emps),
            ConstraintKind::ForbidShiftSequences => self.forbid_sequences(&cid, c, &emps),
            ConstraintKind::MinRestMinutesBetweenShifts => self.min_rest(&cid, c, &emps),
            ConstraintKind::MaxShiftsInWindow => self.max_in_window(&cid, c, &emps, false),
            ConstraintKind::MaxWorkMinutesInWindow => self.max_in_window(&cid, c, &emps, true),
            ConstraintKind::MaxConsecutiveWorkDays => self.max_consecutive(&cid, c, &emps),
            ConstraintKind::MinConsecutiveDaysOff => self.min_days_off(&cid, c, &emps),
            ConstraintKind::PenalizeWorkOnDays => self.penalize_days(&cid, c, &emps),
            ConstraintKind::PenalizeWorkOnShifts => self.penalize_shifts(&cid, c, &emps),
            ConstraintKind::PenalizeUnmetDayOffRequests => self.penalize_unmet_off(&cid, c, &emps),
            ConstraintKind::FairDistribution => self.fair_distribution(&cid, c, &emps),
        }
    }

    /// Counted work shifts for a constraint: the explicit list with non-work
    /// entries silently dropped, or every work shift when absent.
    fn counted_shifts(&self, list: Option<&[String]>) -> Vec<usize> {
        match list {
            None => (0..self.shape.work_shifts.len()).collect(),
            Some(names) => names
                .iter()
                .filter_map(|s| self.shape.work_shift(s))
                .collect(),
        }
    }

    fn require_soft(&self, cid: &str, c: &Constraint, kind: ConstraintKind) -> Result<()> {
        if !c.is_soft() {
            return Err(SolveError::SpecInvalidValue(format!(
                "{cid}: {kind} must be soft"
            )));
        }
        Ok(())
    }

    fn weight(&self, cid: &str, c: &Constraint) -> Result<i32> {
        i32::try_from(c.weight())
            .map_err(|_| SolveError::Internal(format!("{cid}: penalty.weight overflows")))
    }

    // ------------------------------------------------------------------
    // Hard kinds
    // ------------------------------------------------------------------

    fn exactly_one(&mut self, cid: &str, c: &Constraint, emps: &[usize]) -> Result<()> {
        // An explicit data.shifts restricts the counted work shifts; an OFF
        // entry is ignored since the off variable is always counted.
        let counted: Vec<usize> = match c.data.shifts.as_deref() {
            None => (0..self.shape.work_shifts.len()).collect(),
            Some(names) => names
                .iter()
                .filter(|s| *s != OFF_SHIFT)
                .map(|s| {
                    self.shape.work_shift(s).ok_or_else(|| {
                        SolveError::SpecMissingField(format!(
                            "{cid}: shift '{s}' not in work shifts"
                        ))
                    })
                })
                .collect::<Result<_>>()?,
        };

        for &e in emps {
            for d in 0..self.shape.n_days() {
                let mut sum = LinearSum::default();
                sum.push(1, self.vars.off(e, d));
                for &s in &counted {
                    sum.extend(1, self.vars.site_row(e, d, s));
                }
                sum.eq(self.model, 1);
            }
        }
        Ok(())
    }

    fn forbid_sequences(&mut self, cid: &str, c: &Constraint, emps: &[usize]) -> Result<()> {
        let mut pairs = Vec::new();
        for p in c.data.forbidden_pairs.as_deref().unwrap_or(&[]) {
            let prev = p.prev_shift.as_deref().and_then(|s| self.shape.work_shift(s));
            let next = p.next_shift.as_deref().and_then(|s| self.shape.work_shift(s));
            let (Some(prev), Some(next)) = (prev, next) else {
                return Err(SolveError::SpecInvalidValue(format!(
                    "{cid}: forbidden pairs must name work shifts (not OFF)"
                )));
            };
            pairs.push((prev, next));
        }

        self.forbid_day_pairs(emps, &pairs);
        Ok(())
    }

    fn min_rest(&mut self, cid: &str, c: &Constraint, emps: &[usize]) -> Result<()> {
        let threshold = c.data.min_rest_minutes.ok_or_else(|| {
            SolveError::SpecMissingField(format!("{cid}: data.min_rest_minutes"))
        })?;
        let threshold = i32::try_from(threshold)
            .map_err(|_| SolveError::Internal(format!("{cid}: data.min_rest_minutes overflows")))?;

        let intervals = self.resolve_intervals()?;
        let mut pairs = Vec::new();
        for s1 in 0..intervals.len() {
            for s2 in 0..intervals.len() {
                if rest_minutes_between(&intervals[s1], &intervals[s2]) < threshold {
                    pairs.push((s1, s2));
                }
            }
        }

        self.forbid_day_pairs(emps, &pairs);
        Ok(())
    }

    /// `works_shift(e,d,prev) + works_shift(e,d+1,next) <= 1` for every
    /// scoped employee, adjacent day pair, and forbidden shift pair.
    /// A single-day horizon emits nothing.
    fn forbid_day_pairs(&mut self, emps: &[usize], pairs: &[(usize, usize)]) {
        let n_days = self.shape.n_days();
        for &e in emps {
            for d in 1..n_days {
                for &(prev, next) in pairs {
                    let mut sum = LinearSum::default();
                    sum.extend(1, self.vars.site_row(e, d - 1, prev));
                    sum.extend(1, self.vars.site_row(e, d, next));
                    sum.le(self.model, 1);
                }
            }
        }
    }

    fn max_in_window(
        &mut self,
        cid: &str,
        c: &Constraint,
        emps: &[usize],
        weighted: bool,
    ) -> Result<()> {
        if c.data.mode.as_deref().unwrap_or("rolling") != "rolling" {
            return Err(SolveError::SpecInvalidValue(format!(
                "{cid}: only mode=rolling is supported"
            )));
        }

        let window = c.data.window_days.ok_or_else(|| {
            SolveError::SpecMissingField(format!("{cid}: data.window_days"))
        })?;
        let window = usize::try_from(window).map_err(|_| {
            SolveError::SpecInvalidValue(format!("{cid}: data.window_days must be positive"))
        })?;

        let bound = if weighted {
            c.data.max_minutes.ok_or_else(|| {
                SolveError::SpecMissingField(format!("{cid}: data.max_minutes"))
            })?
        } else {
            c.data
                .max
                .ok_or_else(|| SolveError::SpecMissingField(format!("{cid}: data.max")))?
        };
        let bound = i32::try_from(bound)
            .map_err(|_| SolveError::Internal(format!("{cid}: window bound overflows")))?;

        let counted = self.counted_shifts(c.data.shifts.as_deref());
        let n_days = self.shape.n_days();

        for &e in emps {
            for start in 0..n_days {
                let end = (start + window).min(n_days);
                let mut sum = LinearSum::default();
                for d in start..end {
                    for &s in &counted {
                        let coeff = if weighted { self.shape.shift_minutes[s] } else { 1 };
                        sum.extend(coeff, self.vars.site_row(e, d, s));
                    }
                }
                sum.le(self.model, bound);
            }
        }
        Ok(())
    }

    fn max_consecutive(&mut self, cid: &str, c: &Constraint, emps: &[usize]) -> Result<()> {
        let max = c
            .data
            .max
            .ok_or_else(|| SolveError::SpecMissingField(format!("{cid}: data.max")))?;
        let max = i32::try_from(max)
            .map_err(|_| SolveError::SpecInvalidValue(format!("{cid}: data.max must be >= 0")))?;

        let n_days = self.shape.n_days();
        let block = max as usize + 1;
        if block > n_days {
            return Ok(());
        }

        for &e in emps {
            for start in 0..=(n_days - block) {
                let mut sum = LinearSum::default();
                for d in start..start + block {
                    for s in 0..self.shape.work_shifts.len() {
                        sum.extend(1, self.vars.site_row(e, d, s));
                    }
                }
                sum.le(self.model, max);
            }
        }
        Ok(())
    }

    fn min_days_off(&mut self, cid: &str, c: &Constraint, emps: &[usize]) -> Result<()> {
        let min = c
            .data
            .min
            .ok_or_else(|| SolveError::SpecMissingField(format!("{cid}: data.min")))?;
        let streak = usize::try_from(min).map_err(|_| {
            SolveError::SpecInvalidValue(format!("{cid}: data.min must be positive"))
        })?;

        let n_days = self.shape.n_days();
        for &e in emps {
            for d in 0..n_days {
                // start_off[e,d] <=> off[e,d] AND NOT off[e,d-1]
                let start_off = self.model.bool();
                let off_d = self.vars.off(e, d);
                if d == 0 {
                    self.model.int_lin_eq(&[1, -1], &[start_off, off_d], 0);
                } else {
                    let off_prev = self.vars.off(e, d - 1);
                    self.model.int_lin_le(&[1, -1], &[start_off, off_d], 0);
                    self.model.int_lin_le(&[1, 1], &[start_off, off_prev], 1);
                    self.model
                        .int_lin_le(&[-1, 1, -1], &[start_off, off_prev, off_d], 0);
                }

                // Enforced only when the streak starts here; streaks crossing
                // either horizon edge are not inferred.
                for j in d..(d + streak).min(n_days) {
                    let off_j = self.vars.off(e, j);
                    self.model.bool_clause(&[off_j], &[start_off]);
                }
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Soft kinds
    // ------------------------------------------------------------------

    fn penalize_days(&mut self, cid: &str, c: &Constraint, emps: &[usize]) -> Result<()> {
        self.require_soft(cid, c, ConstraintKind::PenalizeWorkOnDays)?;
        let weight = self.weight(cid, c)?;

        let labels = c
            .data
            .days
            .as_deref()
            .ok_or_else(|| SolveError::SpecMissingField(format!("{cid}: data.days")))?;
        let targets: Vec<usize> = labels
            .iter()
            .map(|d| self.shape.day(d))
            .collect::<Result<_>>()?;
        let counted = self.counted_shifts(c.data.working_shifts.as_deref());

        for &e in emps {
            for &d in &targets {
                let works = self.model.bool();
                let mut sum = LinearSum::default();
                for &s in &counted {
                    sum.extend(1, self.vars.site_row(e, d, s));
                }
                sum.push(-1, works);
                sum.eq(self.model, 0);
                self.penalties.push(PenaltyTerm { weight, var: works, bound: 1 });
            }
        }
        Ok(())
    }

    fn penalize_shifts(&mut self, cid: &str, c: &Constraint, emps: &[usize]) -> Result<()> {
        self.require_soft(cid, c, ConstraintKind::PenalizeWorkOnShifts)?;
        let weight = self.weight(cid, c)?;

        let counted: Vec<usize> = c
            .data
            .shifts
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .filter_map(|s| self.shape.work_shift(s))
            .collect();

        for &e in emps {
            for d in 0..self.shape.n_days() {
                let works = self.model.bool();
                let mut sum = LinearSum::default();
                for &s in &counted {
                    sum.extend(1, self.vars.site_row(e, d, s));
                }
                sum.push(-1, works);
                sum.eq(self.model, 0);
                self.penalties.push(PenaltyTerm { weight, var: works, bound: 1 });
            }
        }
        Ok(())
    }

    fn penalize_unmet_off(&mut self, cid: &str, c: &Constraint, emps: &[usize]) -> Result<()> {
        self.require_soft(cid, c, ConstraintKind::PenalizeUnmetDayOffRequests)?;
        let weight = self.weight(cid, c)?;

        let labels = c
            .data
            .days
            .as_deref()
            .ok_or_else(|| SolveError::SpecInvalidValue(format!("{cid}: needs data.days")))?;
        let targets: Vec<usize> = labels
            .iter()
            .map(|d| self.shape.day(d))
            .collect::<Result<_>>()?;

        for &e in emps {
            for &d in &targets {
                // unmet = 1 - off[e,d]
                let unmet = self.model.bool();
                self.model
                    .int_lin_eq(&[1, 1], &[unmet, self.vars.off(e, d)], 1);
                self.penalties.push(PenaltyTerm { weight, var: unmet, bound: 1 });
            }
        }
        Ok(())
    }

    fn fair_distribution(&mut self, cid: &str, c: &Constraint, emps: &[usize]) -> Result<()> {
        self.require_soft(cid, c, ConstraintKind::FairDistribution)?;
        let weight = self.weight(cid, c)?;

        let measure = c.data.measure.as_deref().unwrap_or("count");
        let penalize = c.data.penalize.as_deref().unwrap_or("absolute_deviation");
        if measure != "count" || penalize != "absolute_deviation" {
            return Err(SolveError::SpecInvalidValue(format!(
                "{cid}: only measure=count with penalize=absolute_deviation is supported"
            )));
        }

        let counted_names: Vec<&str> = c
            .data
            .shifts
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .filter(|s| self.shape.work_shift(s).is_some())
            .map(String::as_str)
            .collect();
        if counted_names.is_empty() {
            return Err(SolveError::SpecInvalidValue(format!(
                "{cid}: fair_distribution requires data.shifts"
            )));
        }
        let counted: Vec<usize> = counted_names
            .iter()
            .filter_map(|s| self.shape.work_shift(s))
            .collect();

        let n_days = self.shape.n_days();
        let window = match c.data.window_days {
            Some(w) => usize::try_from(w).map_err(|_| {
                SolveError::SpecInvalidValue(format!("{cid}: data.window_days must be positive"))
            })?,
            None => n_days,
        };
        let windows: Vec<std::ops::Range<usize>> = if window >= n_days {
            vec![0..n_days]
        } else {
            (0..n_days).map(|t| t..(t + window).min(n_days)).collect()
        };

        // Total demanded headcount on the counted shifts; only exact
        // quantities (eq, or min when min == max) contribute.
        let mut total: i64 = 0;
        for req in self.spec.demand_entries() {
            let counted_shift = req
                .shift
                .as_deref()
                .is_some_and(|s| counted_names.contains(&s));
            if !counted_shift {
                continue;
            }
            if let Some(eq) = req.eq {
                total += eq;
            } else if let (Some(min), Some(max)) = (req.min, req.max) {
                if min == max {
                    total += min;
                }
            }
        }

        let target = match c.data.target.as_ref() {
            None => auto_mean(total, emps.len()),
            Some(FairTarget::Mode(mode)) if mode == "auto_mean" => auto_mean(total, emps.len()),
            Some(FairTarget::Count(n)) => *n,
            Some(FairTarget::Mode(other)) => other.parse::<i64>().map_err(|_| {
                SolveError::Internal(format!("{cid}: cannot parse target '{other}'"))
            })?,
        };
        let target = i32::try_from(target)
            .map_err(|_| SolveError::Internal(format!("{cid}: target overflows")))?;

        let horizon = i32::try_from(n_days)
            .map_err(|_| SolveError::Internal(format!("{cid}: horizon overflows")))?;

        for w in &windows {
            for &e in emps {
                let cnt = self.model.int(0, horizon);
                let mut sum = LinearSum::default();
                for d in w.clone() {
                    for &s in &counted {
                        sum.extend(1, self.vars.site_row(e, d, s));
                    }
                }
                sum.push(-1, cnt);
                sum.eq(self.model, 0);

                // dev >= |cnt - target| via two one-sided bounds
                let dev = self.model.int(0, horizon);
                self.model.int_lin_le(&[1, -1], &[cnt, dev], target);
                self.model.int_lin_le(&[-1, -1], &[cnt, dev], -target);
                self.penalties.push(PenaltyTerm { weight, var: dev, bound: horizon });
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Objective
    // ------------------------------------------------------------------

    fn build_objective(&mut self) -> Result<VarId> {
        if self.penalties.is_empty() {
            // Nothing to optimize; any feasible solution scores zero.
            return Ok(self.model.int(0, 0));
        }

        let mut lo: i64 = 0;
        let mut hi: i64 = 0;
        for t in &self.penalties {
            let span = t.weight as i64 * t.bound as i64;
            if span < 0 {
                lo += span;
            } else {
                hi += span;
            }
        }
        let lo = i32::try_from(lo)
            .map_err(|_| SolveError::Internal("objective lower bound overflows".to_string()))?;
        let hi = i32::try_from(hi)
            .map_err(|_| SolveError::Internal("objective upper bound overflows".to_string()))?;

        let objective = self.model.int(lo, hi);
        let mut coeffs: Vec<i32> = self.penalties.iter().map(|t| t.weight).collect();
        let mut vars: Vec<VarId> = self.penalties.iter().map(|t| t.var).collect();
        coeffs.push(-1);
        vars.push(objective);
        self.model.int_lin_eq(&coeffs, &vars, 0);
        Ok(objective)
    }

    fn resolve_intervals(&self) -> Result<Vec<ShiftInterval>> {
        self.shape
            .work_shifts
            .iter()
            .map(|s| {
                let def = self
                    .spec
                    .shifts
                    .get(s)
                    .ok_or_else(|| SolveError::SpecMissingField(format!("shifts['{s}']")))?;
                shift_interval(s, def)
            })
            .collect()
    }
}

fn auto_mean(total: i64, scoped: usize) -> i64 {
    (total as f64 / scoped.max(1) as f64).round() as i64
}

fn cast_count(value: i64) -> Result<i32> {
    i32::try_from(value).map_err(|_| SolveError::Internal(format!("count {value} overflows")))
}
