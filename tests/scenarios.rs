//! End-to-end solve scenarios exercising the compiler and solver driver
//! through the public API.

use serde_json::json;
use shiftplan::{solve, validate, SolveOutcome, Spec};

fn spec(value: serde_json::Value) -> Spec {
    serde_json::from_value(value).expect("test spec parses")
}

fn run(value: serde_json::Value) -> SolveOutcome {
    let spec = spec(value);
    let report = validate(&spec);
    assert!(report.ok, "test spec should validate: {:?}", report.errors);
    solve(&spec, 10.0, 2).expect("solve should not fail structurally")
}

fn base_shifts() -> serde_json::Value {
    json!({
        "OFF": {"start": "00:00", "end": "00:00", "minutes": 0, "is_work": false},
        "M": {"start": "08:00", "end": "16:00", "minutes": 480},
    })
}

fn exactly_one() -> serde_json::Value {
    json!({"id": "one_per_day", "type": "hard", "kind": "exactly_one_assignment_per_day"})
}

#[test]
fn trivial_coverage_assigns_the_only_employee() {
    let outcome = run(json!({
        "sets": {"employees": ["P1"], "days": ["D1"], "shifts": ["OFF", "M"]},
        "shifts": base_shifts(),
        "employees": {"P1": {}},
        "demand": [{"day": "D1", "shift": "M", "eq": 1}],
        "constraints": [],
        "objective": {"mode": "minimize"},
    }));

    let result = outcome.result().expect("expected a solution");
    assert_eq!(result.objective, 0);

    let d1 = &result.schedule["D1"];
    assert_eq!(d1.sites["SITE_DEFAULT"]["M"], ["P1"]);
    assert!(d1.off.is_empty());

    assert_eq!(result.metrics.minutes_worked["P1"], 480);
    assert_eq!(result.metrics.shift_counts["P1"]["M"], 1);
}

#[test]
fn coverage_beyond_headcount_is_infeasible() {
    let outcome = run(json!({
        "sets": {"employees": ["P1", "P2"], "days": ["D1"], "shifts": ["OFF", "M"]},
        "shifts": base_shifts(),
        "employees": {"P1": {}, "P2": {}},
        "demand": [{"day": "D1", "shift": "M", "eq": 3}],
        "constraints": [exactly_one()],
        "objective": {"mode": "minimize"},
    }));

    assert!(outcome.result().is_none(), "expected no_solution");
}

#[test]
fn no_solution_serializes_as_status_only() {
    let outcome = run(json!({
        "sets": {"employees": ["P1"], "days": ["D1"], "shifts": ["OFF", "M"]},
        "shifts": base_shifts(),
        "employees": {"P1": {}},
        "demand": [{"day": "D1", "shift": "M", "eq": 2}],
        "constraints": [exactly_one()],
        "objective": {"mode": "minimize"},
    }));

    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(value, json!({"status": "no_solution"}));
}

#[test]
fn forbidden_sequence_blocks_the_only_schedule() {
    let spec_value = |pairs: serde_json::Value| {
        json!({
            "sets": {"employees": ["P1"], "days": ["D1", "D2"], "shifts": ["OFF", "M", "N"]},
            "shifts": {
                "OFF": {"start": "00:00", "end": "00:00", "minutes": 0, "is_work": false},
                "M": {"start": "08:00", "end": "16:00", "minutes": 480},
                "N": {"start": "22:00", "end": "06:00", "minutes": 480},
            },
            "employees": {"P1": {}},
            "demand": [
                {"day": "D1", "shift": "M", "eq": 1},
                {"day": "D2", "shift": "N", "eq": 1},
            ],
            "constraints": [
                exactly_one(),
                {"id": "no_m_then_n", "type": "hard", "kind": "forbid_shift_sequences",
                 "data": {"forbidden_pairs": pairs}},
            ],
            "objective": {"mode": "minimize"},
        })
    };

    let blocked = run(spec_value(json!([{"prev_shift": "M", "next_shift": "N"}])));
    assert!(blocked.result().is_none(), "M->N is the only schedule, so no solution");

    let open = run(spec_value(json!([{"prev_shift": "N", "next_shift": "M"}])));
    assert!(open.result().is_some(), "N->M never occurs, so the schedule stands");
}

#[test]
fn minimum_rest_threshold_flips_feasibility() {
    // M ends 16:00; N starts at midnight the next day: 480 minutes of rest.
    let spec_value = |threshold: i64| {
        json!({
            "sets": {"employees": ["P1"], "days": ["D1", "D2"], "shifts": ["OFF", "M", "N"]},
            "shifts": {
                "OFF": {"start": "00:00", "end": "00:00", "minutes": 0, "is_work": false},
                "M": {"start": "08:00", "end": "16:00", "minutes": 480},
                "N": {"start": "00:00", "end": "08:00", "minutes": 480},
            },
            "employees": {"P1": {}},
            "demand": [
                {"day": "D1", "shift": "M", "eq": 1},
                {"day": "D2", "shift": "N", "eq": 1},
            ],
            "constraints": [
                exactly_one(),
                {"id": "rest", "type": "hard", "kind": "min_rest_minutes_between_shifts",
                 "data": {"min_rest_minutes": threshold}},
            ],
            "objective": {"mode": "minimize"},
        })
    };

    assert!(run(spec_value(720)).result().is_none(), "480 < 720 forbids the pair");
    assert!(run(spec_value(480)).result().is_some(), "480 >= 480 allows the pair");
}

#[test]
fn soft_day_off_request_is_honoured_when_coverage_allows() {
    let days = ["D1", "D2", "D3", "D4", "D5", "D6", "D7"];
    let demand: Vec<serde_json::Value> = days
        .iter()
        .map(|d| json!({"day": d, "shift": "M", "eq": 1}))
        .collect();

    let outcome = run(json!({
        "sets": {"employees": ["P1", "P2"], "days": days, "shifts": ["OFF", "M"]},
        "shifts": base_shifts(),
        "employees": {"P1": {}, "P2": {}},
        "demand": demand,
        "constraints": [
            exactly_one(),
            {"id": "p1_wants_d3_off", "type": "soft", "kind": "penalize_unmet_day_off_requests",
             "scope": {"employees": ["P1"]}, "data": {"days": ["D3"]},
             "penalty": {"weight": 10}},
        ],
        "objective": {"mode": "minimize"},
    }));

    let result = outcome.result().expect("expected a solution");
    assert_eq!(result.objective, 0, "the request is satisfiable at zero cost");

    let d3 = &result.schedule["D3"];
    assert_eq!(d3.off, ["P1"]);
    assert_eq!(d3.sites["SITE_DEFAULT"]["M"], ["P2"]);
}

#[test]
fn fair_distribution_balances_counts_to_auto_mean() {
    let days: Vec<String> = (1..=12).map(|i| format!("D{i:02}")).collect();
    let demand: Vec<serde_json::Value> = days
        .iter()
        .map(|d| json!({"day": d, "shift": "M", "eq": 1}))
        .collect();

    let spec = spec(json!({
        "sets": {"employees": ["P1", "P2", "P3"], "days": days, "shifts": ["OFF", "M"]},
        "shifts": base_shifts(),
        "employees": {"P1": {}, "P2": {}, "P3": {}},
        "demand": demand,
        "constraints": [
            exactly_one(),
            {"id": "fair", "type": "soft", "kind": "fair_distribution",
             "data": {"shifts": ["M"], "window_days": 12, "target": "auto_mean"},
             "penalty": {"weight": 1}},
        ],
        "objective": {"mode": "minimize"},
    }));

    let outcome = solve(&spec, 30.0, 2).expect("solve should not fail structurally");
    let result = outcome.result().expect("expected a solution");

    // 12 demanded shifts over 3 employees: target 4 each, achievable exactly.
    assert_eq!(result.objective, 0);
    for e in ["P1", "P2", "P3"] {
        assert_eq!(result.metrics.shift_counts[e]["M"], 4, "{e} should take 4 shifts");
    }
}

#[test]
fn skill_floor_picks_the_qualified_employee() {
    let outcome = run(json!({
        "sets": {"employees": ["P1", "P2"], "days": ["D1"], "shifts": ["OFF", "M"]},
        "shifts": base_shifts(),
        "employees": {"P1": {"skills": ["certified"]}, "P2": {}},
        "demand": [{
            "day": "D1", "shift": "M", "eq": 1,
            "requirements": {"skills_min": [{"skill": "certified", "min": 1}]},
        }],
        "constraints": [exactly_one()],
        "objective": {"mode": "minimize"},
    }));

    let result = outcome.result().expect("expected a solution");
    assert_eq!(result.schedule["D1"].sites["SITE_DEFAULT"]["M"], ["P1"]);
}

#[test]
fn single_day_horizon_emits_no_adjacency_rows() {
    // Sequence, rest, and window constraints over one day must not error
    // and must not block the only assignment.
    let outcome = run(json!({
        "sets": {"employees": ["P1"], "days": ["D1"], "shifts": ["OFF", "M", "N"]},
        "shifts": {
            "OFF": {"start": "00:00", "end": "00:00", "minutes": 0, "is_work": false},
            "M": {"start": "08:00", "end": "16:00", "minutes": 480},
            "N": {"start": "22:00", "end": "06:00", "minutes": 480},
        },
        "employees": {"P1": {}},
        "demand": [{"day": "D1", "shift": "M", "eq": 1}],
        "constraints": [
            exactly_one(),
            {"id": "seq", "type": "hard", "kind": "forbid_shift_sequences",
             "data": {"forbidden_pairs": [{"prev_shift": "M", "next_shift": "N"}]}},
            {"id": "rest", "type": "hard", "kind": "min_rest_minutes_between_shifts",
             "data": {"min_rest_minutes": 720}},
            {"id": "load", "type": "hard", "kind": "max_shifts_in_window",
             "data": {"window_days": 7, "max": 1}},
        ],
        "objective": {"mode": "minimize"},
    }));

    assert!(outcome.result().is_some());
}

#[test]
fn oversized_window_collapses_to_horizon_bound() {
    let spec_value = |max: i64| {
        json!({
            "sets": {"employees": ["P1"], "days": ["D1", "D2", "D3"], "shifts": ["OFF", "M"]},
            "shifts": base_shifts(),
            "employees": {"P1": {}},
            "demand": [
                {"day": "D1", "shift": "M", "eq": 1},
                {"day": "D2", "shift": "M", "eq": 1},
                {"day": "D3", "shift": "M", "eq": 1},
            ],
            "constraints": [
                exactly_one(),
                {"id": "cap", "type": "hard", "kind": "max_shifts_in_window",
                 "data": {"window_days": 99, "max": max}},
            ],
            "objective": {"mode": "minimize"},
        })
    };

    assert!(run(spec_value(2)).result().is_none(), "3 demanded shifts exceed the cap of 2");
    assert!(run(spec_value(3)).result().is_some());
}

#[test]
fn consecutive_work_cap_blocks_three_in_a_row() {
    let spec_value = |constraints: Vec<serde_json::Value>| {
        json!({
            "sets": {"employees": ["P1"], "days": ["D1", "D2", "D3"], "shifts": ["OFF", "M"]},
            "shifts": base_shifts(),
            "employees": {"P1": {}},
            "demand": [
                {"day": "D1", "shift": "M", "eq": 1},
                {"day": "D2", "shift": "M", "eq": 1},
                {"day": "D3", "shift": "M", "eq": 1},
            ],
            "constraints": constraints,
            "objective": {"mode": "minimize"},
        })
    };

    let capped = run(spec_value(vec![
        exactly_one(),
        json!({"id": "cap", "type": "hard", "kind": "max_consecutive_work_days",
               "data": {"max": 2}}),
    ]));
    assert!(capped.result().is_none());

    let free = run(spec_value(vec![exactly_one()]));
    assert!(free.result().is_some());
}

#[test]
fn minimum_off_streak_must_run_its_course() {
    // D2 has zero demand, so the employee is OFF there; a 2-day minimum
    // off-streak then collides with the D3 coverage.
    let spec_value = |constraints: Vec<serde_json::Value>| {
        json!({
            "sets": {"employees": ["P1"], "days": ["D1", "D2", "D3"], "shifts": ["OFF", "M"]},
            "shifts": base_shifts(),
            "employees": {"P1": {}},
            "demand": [
                {"day": "D1", "shift": "M", "eq": 1},
                {"day": "D2", "shift": "M", "eq": 0},
                {"day": "D3", "shift": "M", "eq": 1},
            ],
            "constraints": constraints,
            "objective": {"mode": "minimize"},
        })
    };

    let streaky = run(spec_value(vec![
        exactly_one(),
        json!({"id": "streak", "type": "hard", "kind": "min_consecutive_days_off",
               "data": {"min": 2}}),
    ]));
    assert!(streaky.result().is_none());

    let free = run(spec_value(vec![exactly_one()]));
    assert!(free.result().is_some());
}

#[test]
fn work_minutes_window_caps_weighted_load() {
    let spec_value = |max_minutes: i64| {
        json!({
            "sets": {"employees": ["P1"], "days": ["D1", "D2"], "shifts": ["OFF", "M"]},
            "shifts": base_shifts(),
            "employees": {"P1": {}},
            "demand": [
                {"day": "D1", "shift": "M", "eq": 1},
                {"day": "D2", "shift": "M", "eq": 1},
            ],
            "constraints": [
                exactly_one(),
                {"id": "load", "type": "hard", "kind": "max_work_minutes_in_window",
                 "data": {"window_days": 2, "max_minutes": max_minutes}},
            ],
            "objective": {"mode": "minimize"},
        })
    };

    assert!(run(spec_value(480)).result().is_none(), "two 480-minute shifts exceed 480");
    assert!(run(spec_value(960)).result().is_some());
}

#[test]
fn penalized_work_still_happens_when_coverage_demands_it() {
    // Coverage forces P1 onto M on D1; the soft penalty prices it but the
    // schedule still exists, with the weight surfacing in the objective.
    let outcome = run(json!({
        "sets": {"employees": ["P1"], "days": ["D1"], "shifts": ["OFF", "M"]},
        "shifts": base_shifts(),
        "employees": {"P1": {}},
        "demand": [{"day": "D1", "shift": "M", "eq": 1}],
        "constraints": [
            exactly_one(),
            {"id": "pricey", "type": "soft", "kind": "penalize_work_on_shifts",
             "data": {"shifts": ["M"]}, "penalty": {"weight": 7}},
        ],
        "objective": {"mode": "minimize"},
    }));

    let result = outcome.result().expect("expected a solution");
    assert_eq!(result.objective, 7);
    assert_eq!(result.schedule["D1"].sites["SITE_DEFAULT"]["M"], ["P1"]);
}

#[test]
fn sites_keep_assignments_apart() {
    let outcome = run(json!({
        "sets": {"employees": ["P1", "P2"], "days": ["D1"], "shifts": ["OFF", "M"],
                 "sites": ["NORTH", "SOUTH"]},
        "shifts": base_shifts(),
        "employees": {"P1": {}, "P2": {}},
        "demand": [
            {"day": "D1", "shift": "M", "site": "NORTH", "eq": 1},
            {"day": "D1", "shift": "M", "site": "SOUTH", "eq": 1},
        ],
        "constraints": [exactly_one()],
        "objective": {"mode": "minimize"},
    }));

    let result = outcome.result().expect("expected a solution");
    let d1 = &result.schedule["D1"];
    let north = &d1.sites["NORTH"]["M"];
    let south = &d1.sites["SOUTH"]["M"];
    assert_eq!(north.len(), 1);
    assert_eq!(south.len(), 1);
    assert_ne!(north[0], south[0], "one employee cannot staff both sites");
}
