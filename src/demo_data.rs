//! Demo spec generators for the scheduling DSL.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;

use crate::spec::{
    Constraint, ConstraintData, Contract, Demand, EmployeeDef, FairTarget, Objective, Penalty,
    Requirements, Scope, Sets, ShiftDef, ShiftPair, SkillMin, Spec, StringOrList,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoData {
    Small,
    Large,
}

impl std::str::FromStr for DemoData {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SMALL" => Ok(DemoData::Small),
            "LARGE" => Ok(DemoData::Large),
            _ => Err(()),
        }
    }
}

impl DemoData {
    pub fn as_str(&self) -> &'static str {
        match self {
            DemoData::Small => "SMALL",
            DemoData::Large => "LARGE",
        }
    }

    fn parameters(&self) -> DemoDataParameters {
        match self {
            DemoData::Small => DemoDataParameters {
                sites: vec!["WARD_A".to_string()],
                optional_skills: vec!["triage".to_string(), "anaesthetics".to_string()],
                days_in_schedule: 7,
                employee_count: 10,
                with_day_shift: false,
                dayoff_request_distribution: vec![(0, 4.0), (1, 3.0), (2, 1.0)],
            },
            DemoData::Large => DemoDataParameters {
                sites: vec!["WARD_A".to_string(), "WARD_B".to_string()],
                optional_skills: vec![
                    "triage".to_string(),
                    "anaesthetics".to_string(),
                    "cardiology".to_string(),
                ],
                days_in_schedule: 28,
                employee_count: 40,
                with_day_shift: true,
                dayoff_request_distribution: vec![(0, 3.0), (1, 3.0), (2, 2.0), (3, 1.0)],
            },
        }
    }
}

struct DemoDataParameters {
    sites: Vec<String>,
    optional_skills: Vec<String>,
    days_in_schedule: usize,
    employee_count: usize,
    with_day_shift: bool,
    dayoff_request_distribution: Vec<(usize, f64)>,
}

/// List of available demo specs.
pub fn list_demo_data() -> Vec<&'static str> {
    vec!["SMALL", "LARGE"]
}

/// Generates a deterministic demo spec of the given size.
pub fn generate(demo: DemoData) -> Spec {
    let params = demo.parameters();
    let mut rng = StdRng::seed_from_u64(0);

    let days: Vec<String> = (1..=params.days_in_schedule)
        .map(|i| format!("D{i:02}"))
        .collect();

    let mut shift_ids = vec!["OFF".to_string(), "EARLY".to_string(), "LATE".to_string()];
    if params.with_day_shift {
        shift_ids.push("DAY".to_string());
    }
    shift_ids.push("NIGHT".to_string());

    let mut shifts = BTreeMap::new();
    shifts.insert("OFF".to_string(), shift_def("00:00", "00:00", 0, Some(false)));
    shifts.insert("EARLY".to_string(), shift_def("06:00", "14:00", 480, None));
    shifts.insert("LATE".to_string(), shift_def("14:00", "22:00", 480, None));
    if params.with_day_shift {
        shifts.insert("DAY".to_string(), shift_def("09:00", "17:00", 480, None));
    }
    shifts.insert("NIGHT".to_string(), shift_def("22:00", "06:00", 480, None));

    let employee_ids = generate_employee_ids(&mut rng, params.employee_count);

    let mut employees = BTreeMap::new();
    let mut leads = Vec::new();
    for (i, id) in employee_ids.iter().enumerate() {
        let mut skills = Vec::new();
        // Keep roughly a third of the staff certified so skill floors bind
        // without starving coverage.
        if i % 3 == 0 {
            skills.push("certified".to_string());
        }
        if let Some(extra) = params.optional_skills.choose(&mut rng) {
            skills.push(extra.clone());
        }

        let mut roles = Vec::new();
        if i % 4 == 0 {
            roles.push("lead".to_string());
            leads.push(id.clone());
        }

        let contract = if rng.gen_bool(0.25) { "part_time" } else { "full_time" };

        employees.insert(
            id.clone(),
            EmployeeDef {
                skills,
                roles,
                site_home: params.sites.choose(&mut rng).cloned(),
                contract: Some(Contract {
                    contract_type: Some(contract.to_string()),
                }),
            },
        );
    }

    let mut groups = BTreeMap::new();
    groups.insert("leads".to_string(), leads);

    let work_shift_ids: Vec<&String> = shift_ids.iter().filter(|s| *s != "OFF").collect();
    let mut demand = Vec::new();
    for day in &days {
        for shift in &work_shift_ids {
            for site in &params.sites {
                let requirements = if *shift == "EARLY" {
                    Requirements {
                        skills_min: vec![SkillMin {
                            skill: Some("certified".to_string()),
                            min: Some(1),
                        }],
                        roles_min: Vec::new(),
                    }
                } else {
                    Requirements::default()
                };
                demand.push(Demand {
                    day: Some(day.clone()),
                    shift: Some((*shift).clone()),
                    site: Some(site.clone()),
                    min: Some(1),
                    max: Some(2),
                    requirements,
                    ..Demand::default()
                });
            }
        }
    }

    let weekend: Vec<String> = days.iter().rev().take(2).rev().cloned().collect();

    let mut constraints = vec![
        Constraint {
            id: Some("one_assignment_per_day".to_string()),
            ctype: Some("hard".to_string()),
            kind: Some("exactly_one_assignment_per_day".to_string()),
            ..Constraint::default()
        },
        Constraint {
            id: Some("no_early_after_night".to_string()),
            ctype: Some("hard".to_string()),
            kind: Some("forbid_shift_sequences".to_string()),
            data: ConstraintData {
                forbidden_pairs: Some(vec![ShiftPair {
                    prev_shift: Some("NIGHT".to_string()),
                    next_shift: Some("EARLY".to_string()),
                }]),
                ..ConstraintData::default()
            },
            ..Constraint::default()
        },
        Constraint {
            id: Some("rest_between_shifts".to_string()),
            ctype: Some("hard".to_string()),
            kind: Some("min_rest_minutes_between_shifts".to_string()),
            data: ConstraintData {
                min_rest_minutes: Some(480),
                ..ConstraintData::default()
            },
            ..Constraint::default()
        },
        Constraint {
            id: Some("max_streak".to_string()),
            ctype: Some("hard".to_string()),
            kind: Some("max_consecutive_work_days".to_string()),
            data: ConstraintData {
                max: Some(5),
                ..ConstraintData::default()
            },
            ..Constraint::default()
        },
        Constraint {
            id: Some("avoid_nights".to_string()),
            ctype: Some("soft".to_string()),
            kind: Some("penalize_work_on_shifts".to_string()),
            data: ConstraintData {
                shifts: Some(vec!["NIGHT".to_string()]),
                ..ConstraintData::default()
            },
            penalty: Penalty { weight: Some(2.0) },
            ..Constraint::default()
        },
        Constraint {
            id: Some("light_weekends_for_part_time".to_string()),
            ctype: Some("soft".to_string()),
            kind: Some("penalize_work_on_days".to_string()),
            scope: Scope {
                contracts_any: Some(StringOrList::One("part_time".to_string())),
                ..Scope::default()
            },
            data: ConstraintData {
                days: Some(weekend),
                ..ConstraintData::default()
            },
            penalty: Penalty { weight: Some(3.0) },
            ..Constraint::default()
        },
        Constraint {
            id: Some("fair_nights".to_string()),
            ctype: Some("soft".to_string()),
            kind: Some("fair_distribution".to_string()),
            data: ConstraintData {
                shifts: Some(vec!["NIGHT".to_string()]),
                window_days: Some(params.days_in_schedule as i64),
                target: Some(FairTarget::Mode("auto_mean".to_string())),
                ..ConstraintData::default()
            },
            penalty: Penalty { weight: Some(1.0) },
            ..Constraint::default()
        },
    ];

    // Sprinkle personal day-off requests over the staff.
    for id in &employee_ids {
        let request_count = pick_count(&mut rng, &params.dayoff_request_distribution);
        if request_count == 0 {
            continue;
        }
        let requested: Vec<String> = days
            .choose_multiple(&mut rng, request_count.min(days.len()))
            .cloned()
            .collect();
        constraints.push(Constraint {
            id: Some(format!("dayoff_{id}")),
            ctype: Some("soft".to_string()),
            kind: Some("penalize_unmet_day_off_requests".to_string()),
            scope: Scope {
                employees: Some(StringOrList::Many(vec![id.clone()])),
                ..Scope::default()
            },
            data: ConstraintData {
                days: Some(requested),
                ..ConstraintData::default()
            },
            penalty: Penalty { weight: Some(4.0) },
            ..Constraint::default()
        });
    }

    Spec {
        sets: Some(Sets {
            employees: employee_ids,
            days,
            shifts: shift_ids,
            sites: Some(params.sites),
        }),
        shifts,
        employees,
        groups,
        demand: Some(demand),
        constraints: Some(constraints),
        objective: Some(Objective {
            mode: Some("minimize".to_string()),
            terms: None,
        }),
    }
}

fn shift_def(start: &str, end: &str, minutes: i64, is_work: Option<bool>) -> ShiftDef {
    ShiftDef {
        start: Some(start.to_string()),
        end: Some(end.to_string()),
        minutes: Some(minutes),
        is_work,
    }
}

/// Pick a count based on weighted distribution.
fn pick_count(rng: &mut StdRng, distribution: &[(usize, f64)]) -> usize {
    let total_weight: f64 = distribution.iter().map(|(_, w)| w).sum();
    let mut choice = rng.gen::<f64>() * total_weight;

    for (count, weight) in distribution {
        if choice < *weight {
            return *count;
        }
        choice -= weight;
    }
    distribution.last().map(|(c, _)| *c).unwrap_or(0)
}

const FIRST_NAMES: &[&str] = &[
    "amy", "beth", "carl", "dan", "elsa", "flo", "gus", "hugo", "ivy", "jay",
];
const LAST_NAMES: &[&str] = &[
    "cole", "fox", "green", "jones", "king", "li", "poe", "rye", "smith", "watt",
];

fn generate_employee_ids(rng: &mut StdRng, count: usize) -> Vec<String> {
    let mut ids = Vec::with_capacity(FIRST_NAMES.len() * LAST_NAMES.len());
    for first in FIRST_NAMES {
        for last in LAST_NAMES {
            ids.push(format!("{first}.{last}"));
        }
    }
    ids.shuffle(rng);
    ids.truncate(count);
    ids
}
