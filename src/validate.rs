//! Static validation of a parsed [`Spec`].
//!
//! `validate` is total: it never fails, it reports problems in-band.
//! Errors block solving; warnings never do. The same checks the compiler
//! performs defensively are surfaced here with full context so that a bad
//! spec is rejected before a job is ever created.

use serde::Serialize;

use crate::scope::select_employees;
use crate::shift_time::is_hhmm;
use crate::spec::{Constraint, ConstraintKind, Sets, Spec, StringOrList, OFF_SHIFT};

/// Validation verdict. `ok` iff `errors` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Validation {
    pub ok: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Checks a spec for well-formedness and semantic consistency.
pub fn validate(spec: &Spec) -> Validation {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let Some(sets) = spec.sets.as_ref() else {
        return Validation {
            ok: false,
            errors: vec!["missing 'sets'".to_string()],
            warnings,
        };
    };

    if spec.demand.is_none() {
        warnings.push("missing 'demand' (no coverage constraints will be enforced)".to_string());
    }
    if spec.constraints.is_none() {
        warnings
            .push("missing 'constraints' (only demand constraints will be enforced)".to_string());
    }

    check_sets(sets, &mut errors);
    check_shift_defs(spec, sets, &mut errors, &mut warnings);

    for e in &sets.employees {
        if !spec.employees.contains_key(e) {
            warnings.push(format!(
                "employees['{e}'] missing (skills/roles/contract/site_home may be used by scope and requirements)"
            ));
        }
    }

    check_demand(spec, sets, &mut errors, &mut warnings);
    check_constraints(spec, sets, &mut errors, &mut warnings);
    check_objective(spec, &mut errors, &mut warnings);

    Validation {
        ok: errors.is_empty(),
        errors,
        warnings,
    }
}

/// Duplicated values of a list, each reported once, sorted.
fn dupes(values: &[String]) -> Vec<String> {
    let mut seen = std::collections::BTreeSet::new();
    let mut out = std::collections::BTreeSet::new();
    for v in values {
        if !seen.insert(v.as_str()) {
            out.insert(v.clone());
        }
    }
    out.into_iter().collect()
}

fn check_sets(sets: &Sets, errors: &mut Vec<String>) {
    if sets.employees.is_empty() {
        errors.push("sets.employees must be a non-empty list".to_string());
    }
    if sets.days.is_empty() {
        errors.push("sets.days must be a non-empty list".to_string());
    }
    if sets.shifts.is_empty() {
        errors.push("sets.shifts must be a non-empty list".to_string());
    }
    if matches!(sets.sites.as_deref(), Some([])) {
        errors.push("sets.sites must be a non-empty list (or omit to default)".to_string());
    }

    for (name, values) in [
        ("employees", &sets.employees),
        ("days", &sets.days),
        ("shifts", &sets.shifts),
    ] {
        let d = dupes(values);
        if !d.is_empty() {
            errors.push(format!("duplicate values in sets.{name}: {d:?}"));
        }
    }
    if let Some(sites) = sets.sites.as_deref() {
        let d = dupes(sites);
        if !d.is_empty() {
            errors.push(format!("duplicate values in sets.sites: {d:?}"));
        }
    }

    if !sets.shifts.is_empty() && !sets.shifts.iter().any(|s| s == OFF_SHIFT) {
        errors.push("sets.shifts must declare the OFF shift".to_string());
    }
}

fn check_shift_defs(spec: &Spec, sets: &Sets, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    for s in &sets.shifts {
        if !spec.shifts.contains_key(s) {
            if s == OFF_SHIFT {
                warnings.push(
                    "shifts.OFF missing: compiler will assume a zero-minute day off".to_string(),
                );
            } else {
                warnings.push(format!("missing shifts['{s}'] definition (start/end/minutes)"));
            }
        }
    }

    for (sid, def) in &spec.shifts {
        if let Some(start) = def.start.as_deref() {
            if !is_hhmm(start) {
                errors.push(format!("shifts['{sid}'].start must be HH:MM"));
            }
        }
        if let Some(end) = def.end.as_deref() {
            if !is_hhmm(end) {
                errors.push(format!("shifts['{sid}'].end must be HH:MM"));
            }
        }
        if def.minutes.is_some_and(|m| m < 0) {
            errors.push(format!("shifts['{sid}'].minutes must be a non-negative integer"));
        }
    }
}

fn check_demand(spec: &Spec, sets: &Sets, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    let sites = spec.sites();

    for (i, req) in spec.demand_entries().iter().enumerate() {
        let day = req.day.as_deref().unwrap_or("<missing>");
        if !sets.days.iter().any(|d| d == day) {
            errors.push(format!("demand[{i}].day '{day}' not in sets.days"));
        }
        let shift = req.shift.as_deref().unwrap_or("<missing>");
        if !sets.shifts.iter().any(|s| s == shift) {
            errors.push(format!("demand[{i}].shift '{shift}' not in sets.shifts"));
        }
        let site = req.site.as_deref().or(sites.first().map(String::as_str));
        if !site.is_some_and(|site| sites.iter().any(|s| s == site)) {
            errors.push(format!(
                "demand[{i}].site '{}' not in sets.sites",
                site.unwrap_or("<missing>")
            ));
        }

        if let Some(eq) = req.eq {
            if eq < 0 {
                errors.push(format!("demand[{i}].eq must be an integer >= 0"));
            }
        } else {
            if req.min.is_some_and(|m| m < 0) {
                errors.push(format!("demand[{i}].min must be an integer >= 0"));
            }
            if req.max.is_some_and(|m| m < 0) {
                errors.push(format!("demand[{i}].max must be an integer >= 0"));
            }
            if let (Some(min), Some(max)) = (req.min, req.max) {
                if min > max {
                    errors.push(format!("demand[{i}] has min > max"));
                }
            }
        }

        for (j, sk) in req.requirements.skills_min.iter().enumerate() {
            let (Some(skill), Some(min)) = (sk.skill.as_deref(), sk.min) else {
                errors.push(format!(
                    "demand[{i}].requirements.skills_min[{j}] must have 'skill' and 'min'"
                ));
                continue;
            };
            if min < 0 {
                errors.push(format!(
                    "demand[{i}].requirements.skills_min[{j}].min must be an integer >= 0"
                ));
            }
            let declared = sets
                .employees
                .iter()
                .any(|e| spec.employee(e).is_some_and(|def| def.has_skill(skill)));
            if !declared {
                warnings.push(format!(
                    "demand[{i}] requires skill '{skill}' but no employee declares it"
                ));
            }
        }

        for (j, rl) in req.requirements.roles_min.iter().enumerate() {
            let (Some(role), Some(min)) = (rl.role.as_deref(), rl.min) else {
                errors.push(format!(
                    "demand[{i}].requirements.roles_min[{j}] must have 'role' and 'min'"
                ));
                continue;
            };
            if min < 0 {
                errors.push(format!(
                    "demand[{i}].requirements.roles_min[{j}].min must be an integer >= 0"
                ));
            }
            let declared = sets
                .employees
                .iter()
                .any(|e| spec.employee(e).is_some_and(|def| def.has_role(role)));
            if !declared {
                warnings.push(format!(
                    "demand[{i}] requires role '{role}' but no employee declares it"
                ));
            }
        }
    }
}

fn check_constraints(spec: &Spec, sets: &Sets, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    let mut ids = Vec::new();

    for (i, c) in spec.constraint_entries().iter().enumerate() {
        let label = c
            .id
            .clone()
            .unwrap_or_else(|| format!("constraints[{i}]"));

        if let Some(id) = c.id.clone() {
            ids.push(id);
        } else {
            errors.push(format!("constraints[{i}].id must be a string"));
        }

        if !matches!(c.ctype.as_deref(), Some("hard") | Some("soft")) {
            errors.push(format!("constraints[{i}].type must be 'hard' or 'soft'"));
        }

        let kind = c.parsed_kind();
        if kind.is_none() {
            errors.push(format!(
                "constraints[{i}].kind '{}' is not supported",
                c.kind.as_deref().unwrap_or("<missing>")
            ));
        }

        if c.is_soft() {
            match c.penalty.weight {
                None => warnings.push(format!(
                    "{label}: soft constraint has no penalty.weight (treated as weight=0)"
                )),
                Some(w) if w < 0.0 => {
                    errors.push(format!("{label}: penalty.weight must be a non-negative number"));
                }
                Some(_) => {}
            }
        }

        check_scope(spec, sets, c, &label, errors, warnings);

        if let Some(kind) = kind {
            check_payload(sets, c, kind, &label, errors);
        }
    }

    let d = dupes(&ids);
    if !d.is_empty() {
        errors.push(format!("duplicate constraint ids: {d:?}"));
    }
}

fn check_scope(
    spec: &Spec,
    sets: &Sets,
    c: &Constraint,
    label: &str,
    errors: &mut Vec<String>,
    warnings: &mut Vec<String>,
) {
    match &c.scope.employees {
        Some(StringOrList::One(s)) if s != "ALL" => {
            errors.push(format!("{label}: scope.employees must be 'ALL' or a list"));
        }
        Some(StringOrList::Many(list)) => {
            let missing: Vec<&String> = list
                .iter()
                .filter(|e| !sets.employees.contains(e))
                .collect();
            if !missing.is_empty() {
                errors.push(format!(
                    "{label}: scope.employees contains unknown ids: {missing:?}"
                ));
            }
        }
        _ => {}
    }

    // Speculative evaluation: an empty selection compiles to nothing.
    if select_employees(spec, &c.scope).is_empty() {
        warnings.push(format!(
            "{label}: scope selects 0 employees (constraint has no effect)"
        ));
    }
}

fn check_payload(
    sets: &Sets,
    c: &Constraint,
    kind: ConstraintKind,
    label: &str,
    errors: &mut Vec<String>,
) {
    let data = &c.data;
    match kind {
        ConstraintKind::ExactlyOneAssignmentPerDay => {}

        ConstraintKind::ForbidShiftSequences => {
            let pairs = data.forbidden_pairs.as_deref().unwrap_or(&[]);
            if pairs.is_empty() {
                errors.push(format!(
                    "{label}: forbid_shift_sequences requires data.forbidden_pairs"
                ));
            }
            for p in pairs {
                let prev = p.prev_shift.as_deref().unwrap_or("<missing>");
                let next = p.next_shift.as_deref().unwrap_or("<missing>");
                let declared = |s: &str| sets.shifts.iter().any(|d| d == s);
                if !declared(prev) || !declared(next) {
                    errors.push(format!(
                        "{label}: forbidden pair ('{prev}' -> '{next}') uses a shift not in sets.shifts"
                    ));
                }
            }
        }

        ConstraintKind::MaxShiftsInWindow => {
            if !data.window_days.is_some_and(|w| w > 0) {
                errors.push(format!("{label}: data.window_days must be an integer > 0"));
            }
            if !data.max.is_some_and(|m| m >= 0) {
                errors.push(format!(
                    "{label}: max_shifts_in_window requires data.max as an integer >= 0"
                ));
            }
        }

        ConstraintKind::MaxWorkMinutesInWindow => {
            if !data.window_days.is_some_and(|w| w > 0) {
                errors.push(format!("{label}: data.window_days must be an integer > 0"));
            }
            if !data.max_minutes.is_some_and(|m| m >= 0) {
                errors.push(format!(
                    "{label}: max_work_minutes_in_window requires data.max_minutes as an integer >= 0"
                ));
            }
        }

        ConstraintKind::MinRestMinutesBetweenShifts => {
            if !data.min_rest_minutes.is_some_and(|m| m >= 0) {
                errors.push(format!(
                    "{label}: min_rest_minutes_between_shifts requires data.min_rest_minutes as an integer >= 0"
                ));
            }
        }

        ConstraintKind::MaxConsecutiveWorkDays => {
            if !data.max.is_some_and(|m| m >= 0) {
                errors.push(format!(
                    "{label}: max_consecutive_work_days requires data.max as an integer >= 0"
                ));
            }
        }

        ConstraintKind::MinConsecutiveDaysOff => {
            if !data.min.is_some_and(|m| m > 0) {
                errors.push(format!(
                    "{label}: min_consecutive_days_off requires data.min as an integer > 0"
                ));
            }
        }

        ConstraintKind::PenalizeWorkOnDays | ConstraintKind::PenalizeUnmetDayOffRequests => {
            let days = data.days.as_deref().unwrap_or(&[]);
            if days.is_empty() {
                errors.push(format!("{label}: {kind} requires data.days"));
            }
            let bad: Vec<&String> = days
                .iter()
                .filter(|d| !sets.days.contains(d))
                .collect();
            if !bad.is_empty() {
                errors.push(format!("{label}: {kind} has unknown day(s): {bad:?}"));
            }
        }

        ConstraintKind::PenalizeWorkOnShifts => {
            let shifts = data.shifts.as_deref().unwrap_or(&[]);
            if shifts.is_empty() {
                errors.push(format!("{label}: penalize_work_on_shifts requires data.shifts"));
            }
            let bad: Vec<&String> = shifts
                .iter()
                .filter(|s| !sets.shifts.contains(s))
                .collect();
            if !bad.is_empty() {
                errors.push(format!(
                    "{label}: penalize_work_on_shifts has unknown shift(s): {bad:?}"
                ));
            }
        }

        ConstraintKind::FairDistribution => {
            if data.window_days.is_some_and(|w| w <= 0) {
                errors.push(format!("{label}: data.window_days must be an integer > 0"));
            }
        }
    }
}

fn check_objective(spec: &Spec, errors: &mut Vec<String>, warnings: &mut Vec<String>) {
    match spec.objective.as_ref() {
        None => warnings.push(
            "missing 'objective' (penalty terms are still minimized by default)".to_string(),
        ),
        Some(obj) => {
            if let Some(mode) = obj.mode.as_deref() {
                if mode != "minimize" && mode != "maximize" {
                    errors.push("objective.mode must be 'minimize' or 'maximize'".to_string());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal() -> serde_json::Value {
        json!({
            "sets": {
                "employees": ["P1", "P2"],
                "days": ["D1", "D2"],
                "shifts": ["OFF", "M"],
            },
            "shifts": {
                "OFF": {"start": "00:00", "end": "00:00", "minutes": 0, "is_work": false},
                "M": {"start": "08:00", "end": "16:00", "minutes": 480},
            },
            "employees": {"P1": {}, "P2": {}},
            "demand": [{"day": "D1", "shift": "M", "eq": 1}],
            "constraints": [],
            "objective": {"mode": "minimize"},
        })
    }

    fn validate_value(value: serde_json::Value) -> Validation {
        validate(&serde_json::from_value(value).unwrap())
    }

    #[test]
    fn test_minimal_spec_is_ok() {
        let v = validate_value(minimal());
        assert!(v.ok, "unexpected errors: {:?}", v.errors);
        assert!(v.errors.is_empty());
    }

    #[test]
    fn test_missing_sets_short_circuits() {
        let v = validate_value(json!({"demand": []}));
        assert!(!v.ok);
        assert_eq!(v.errors, ["missing 'sets'"]);
    }

    #[test]
    fn test_missing_sections_warn() {
        let mut spec = minimal();
        spec.as_object_mut().unwrap().remove("demand");
        spec.as_object_mut().unwrap().remove("constraints");
        spec.as_object_mut().unwrap().remove("objective");

        let v = validate_value(spec);
        assert!(v.ok);
        assert_eq!(v.warnings.len(), 3, "warnings: {:?}", v.warnings);
    }

    #[test]
    fn test_duplicates_and_missing_off() {
        let mut spec = minimal();
        spec["sets"]["employees"] = json!(["P1", "P1"]);
        spec["sets"]["shifts"] = json!(["M"]);

        let v = validate_value(spec);
        assert!(!v.ok);
        assert!(v.errors.iter().any(|e| e.contains("duplicate values in sets.employees")));
        assert!(v.errors.iter().any(|e| e.contains("OFF")));
    }

    #[test]
    fn test_bad_shift_times() {
        let mut spec = minimal();
        spec["shifts"]["M"]["start"] = json!("8:00");
        spec["shifts"]["M"]["minutes"] = json!(-5);

        let v = validate_value(spec);
        assert!(v.errors.iter().any(|e| e.contains("shifts['M'].start")));
        assert!(v.errors.iter().any(|e| e.contains("shifts['M'].minutes")));
    }

    #[test]
    fn test_demand_references_and_bounds() {
        let mut spec = minimal();
        spec["demand"] = json!([
            {"day": "D9", "shift": "M", "eq": 1},
            {"day": "D1", "shift": "M", "min": 3, "max": 1},
            {"day": "D1", "shift": "M", "site": "MARS", "min": 1},
        ]);

        let v = validate_value(spec);
        assert!(v.errors.iter().any(|e| e.contains("demand[0].day 'D9'")));
        assert!(v.errors.iter().any(|e| e.contains("demand[1] has min > max")));
        assert!(v.errors.iter().any(|e| e.contains("demand[2].site 'MARS'")));
    }

    #[test]
    fn test_undeclared_skill_warns() {
        let mut spec = minimal();
        spec["demand"] = json!([{
            "day": "D1", "shift": "M", "eq": 1,
            "requirements": {"skills_min": [{"skill": "welding", "min": 1}]},
        }]);

        let v = validate_value(spec);
        assert!(v.ok);
        assert!(v.warnings.iter().any(|w| w.contains("requires skill 'welding'")));
    }

    #[test]
    fn test_constraint_header_checks() {
        let mut spec = minimal();
        spec["constraints"] = json!([
            {"id": "c1", "type": "firm", "kind": "exactly_one_assignment_per_day"},
            {"id": "c1", "type": "hard", "kind": "take_naps"},
            {"type": "hard", "kind": "exactly_one_assignment_per_day"},
        ]);

        let v = validate_value(spec);
        assert!(v.errors.iter().any(|e| e.contains("constraints[0].type")));
        assert!(v.errors.iter().any(|e| e.contains("kind 'take_naps'")));
        assert!(v.errors.iter().any(|e| e.contains("constraints[2].id")));
        assert!(v.errors.iter().any(|e| e.contains("duplicate constraint ids")));
    }

    #[test]
    fn test_soft_weight_checks() {
        let mut spec = minimal();
        spec["constraints"] = json!([
            {"id": "w0", "type": "soft", "kind": "penalize_work_on_days",
             "data": {"days": ["D1"]}},
            {"id": "neg", "type": "soft", "kind": "penalize_work_on_days",
             "data": {"days": ["D1"]}, "penalty": {"weight": -2}},
        ]);

        let v = validate_value(spec);
        assert!(v.warnings.iter().any(|w| w.contains("w0") && w.contains("weight=0")));
        assert!(v.errors.iter().any(|e| e.contains("neg") && e.contains("non-negative")));
    }

    #[test]
    fn test_scope_errors_and_empty_selection_warning() {
        let mut spec = minimal();
        spec["constraints"] = json!([
            {"id": "bad_scope", "type": "hard", "kind": "max_consecutive_work_days",
             "data": {"max": 3}, "scope": {"employees": "P1"}},
            {"id": "ghost", "type": "hard", "kind": "max_consecutive_work_days",
             "data": {"max": 3}, "scope": {"employees": ["P1", "PX"]}},
            {"id": "empty", "type": "hard", "kind": "max_consecutive_work_days",
             "data": {"max": 3}, "scope": {"groups": ["nobody"]}},
        ]);

        let v = validate_value(spec);
        assert!(v.errors.iter().any(|e| e.contains("bad_scope") && e.contains("'ALL' or a list")));
        assert!(v.errors.iter().any(|e| e.contains("ghost") && e.contains("unknown ids")));
        assert!(v.warnings.iter().any(|w| w.contains("empty") && w.contains("0 employees")));
    }

    #[test]
    fn test_kind_payload_checks() {
        let mut spec = minimal();
        spec["constraints"] = json!([
            {"id": "seq", "type": "hard", "kind": "forbid_shift_sequences", "data": {}},
            {"id": "win", "type": "hard", "kind": "max_shifts_in_window",
             "data": {"window_days": 0}},
            {"id": "rest", "type": "hard", "kind": "min_rest_minutes_between_shifts",
             "data": {"min_rest_minutes": -1}},
            {"id": "streak", "type": "hard", "kind": "min_consecutive_days_off",
             "data": {"min": 0}},
            {"id": "offreq", "type": "soft", "kind": "penalize_unmet_day_off_requests",
             "data": {"days": ["D7"]}, "penalty": {"weight": 1}},
        ]);

        let v = validate_value(spec);
        assert!(v.errors.iter().any(|e| e.contains("seq") && e.contains("forbidden_pairs")));
        assert!(v.errors.iter().any(|e| e.contains("win") && e.contains("window_days")));
        assert!(v.errors.iter().any(|e| e.contains("win") && e.contains("data.max")));
        assert!(v.errors.iter().any(|e| e.contains("rest") && e.contains("min_rest_minutes")));
        assert!(v.errors.iter().any(|e| e.contains("streak") && e.contains("data.min")));
        assert!(v.errors.iter().any(|e| e.contains("offreq") && e.contains("unknown day")));
    }

    #[test]
    fn test_objective_mode() {
        let mut spec = minimal();
        spec["objective"] = json!({"mode": "sideways"});
        let v = validate_value(spec);
        assert!(v.errors.iter().any(|e| e.contains("objective.mode")));
    }

    #[test]
    fn test_validation_is_idempotent() {
        let spec: Spec = serde_json::from_value(minimal()).unwrap();
        assert_eq!(validate(&spec), validate(&spec));
    }
}
