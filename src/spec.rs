//! The scheduling DSL input tree.
//!
//! A [`Spec`] is the parsed form of the JSON document accepted by the
//! `validate` and `solve` entry points. Field types are permissive where the
//! grammar is permissive (optional keys stay `Option`); semantic rules are
//! enforced by [`crate::validate`], and defensively re-checked by the
//! compiler.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Site used when `sets.sites` is omitted.
pub const DEFAULT_SITE: &str = "SITE_DEFAULT";

/// Shift id reserved for a day off. Must be declared in `sets.shifts`.
pub const OFF_SHIFT: &str = "OFF";

/// Top-level scheduling specification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Spec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sets: Option<Sets>,
    /// Shift definitions keyed by shift id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub shifts: BTreeMap<String, ShiftDef>,
    /// Per-employee metadata keyed by employee id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub employees: BTreeMap<String, EmployeeDef>,
    /// Named employee groups referenced by scope clauses.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub groups: BTreeMap<String, Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demand: Option<Vec<Demand>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Vec<Constraint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective: Option<Objective>,
}

impl Spec {
    /// Declared sites, or the default singleton when omitted.
    pub fn sites(&self) -> Vec<String> {
        match self.sets.as_ref().and_then(|s| s.sites.clone()) {
            Some(sites) => sites,
            None => vec![DEFAULT_SITE.to_string()],
        }
    }

    /// Metadata for an employee id, if any was declared.
    pub fn employee(&self, id: &str) -> Option<&EmployeeDef> {
        self.employees.get(id)
    }

    pub fn demand_entries(&self) -> &[Demand] {
        self.demand.as_deref().unwrap_or(&[])
    }

    pub fn constraint_entries(&self) -> &[Constraint] {
        self.constraints.as_deref().unwrap_or(&[])
    }
}

/// The declared id universes. Order of `days` defines the planning horizon.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Sets {
    #[serde(default)]
    pub employees: Vec<String>,
    #[serde(default)]
    pub days: Vec<String>,
    #[serde(default)]
    pub shifts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sites: Option<Vec<String>>,
}

/// A shift definition. `OFF` defaults to a zero-minute non-work shift.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShiftDef {
    /// Start of the shift as `HH:MM`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    /// End of the shift as `HH:MM`. May be earlier than `start` for
    /// overnight shifts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    /// Payable duration in minutes; drives work-minute windows and metrics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minutes: Option<i64>,
    /// Defaults to true for any shift other than `OFF`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_work: Option<bool>,
}

/// Per-employee metadata used by scope clauses and demand requirements.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmployeeDef {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site_home: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract: Option<Contract>,
}

impl EmployeeDef {
    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.iter().any(|s| s == skill)
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn contract_type(&self) -> Option<&str> {
        self.contract.as_ref().and_then(|c| c.contract_type.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Contract {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub contract_type: Option<String>,
}

/// A coverage requirement for one `(day, shift, site)` cell.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Demand {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift: Option<String>,
    /// Defaults to the first declared site.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    /// Exact headcount; mutually exclusive with `min`/`max`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eq: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    #[serde(default, skip_serializing_if = "Requirements::is_empty")]
    pub requirements: Requirements,
}

/// Skill/role floors attached to a demand entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Requirements {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills_min: Vec<SkillMin>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles_min: Vec<RoleMin>,
}

impl Requirements {
    pub fn is_empty(&self) -> bool {
        self.skills_min.is_empty() && self.roles_min.is_empty()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillMin {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleMin {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
}

/// One structural constraint: a kind from the closed taxonomy, a scope
/// clause selecting employees, a kind-specific payload, and a penalty
/// weight when soft.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Constraint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// `"hard"` or `"soft"`.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ctype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default)]
    pub data: ConstraintData,
    #[serde(default)]
    pub penalty: Penalty,
}

impl Constraint {
    /// The kind parsed against the closed taxonomy.
    pub fn parsed_kind(&self) -> Option<ConstraintKind> {
        self.kind.as_deref().and_then(|k| k.parse().ok())
    }

    pub fn is_soft(&self) -> bool {
        self.ctype.as_deref() == Some("soft")
    }

    /// Penalty weight truncated to an integer; absent weight counts as 0.
    pub fn weight(&self) -> i64 {
        self.penalty.weight.unwrap_or(0.0).trunc() as i64
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Penalty {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

/// A scope filter value: a single string or a list of strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrList {
    One(String),
    Many(Vec<String>),
}

impl StringOrList {
    pub fn as_slice(&self) -> &[String] {
        match self {
            StringOrList::One(s) => std::slice::from_ref(s),
            StringOrList::Many(v) => v.as_slice(),
        }
    }
}

/// The constraint scope clause. Filters AND together; an absent or empty
/// filter is a no-op.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scope {
    /// `"ALL"`, or an explicit list of employee ids.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employees: Option<StringOrList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<StringOrList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills_any: Option<StringOrList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills_all: Option<StringOrList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles_any: Option<StringOrList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roles_all: Option<StringOrList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sites_any: Option<StringOrList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contracts_any: Option<StringOrList>,
}

/// Union of every kind-specific payload. Which keys are required for which
/// kind is checked by the validator and re-checked by the compiler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConstraintData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shifts: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forbidden_pairs: Option<Vec<ShiftPair>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_days: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_minutes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_rest_minutes: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_shifts: Option<Vec<String>>,
    /// Window mode; only `"rolling"` is supported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub penalize: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<FairTarget>,
}

/// A forbidden `(previous day, next day)` shift pair.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShiftPair {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_shift: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_shift: Option<String>,
}

/// `fair_distribution` target: a number, or a string (`"auto_mean"` or a
/// numeral).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FairTarget {
    Count(i64),
    Mode(String),
}

/// Optional objective metadata. Its presence only gates the warning in the
/// validator; penalty terms are always minimized.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Objective {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terms: Option<Vec<serde_json::Value>>,
}

/// The closed constraint taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    ExactlyOneAssignmentPerDay,
    ForbidShiftSequences,
    MinRestMinutesBetweenShifts,
    MaxShiftsInWindow,
    MaxWorkMinutesInWindow,
    MaxConsecutiveWorkDays,
    MinConsecutiveDaysOff,
    PenalizeWorkOnDays,
    PenalizeWorkOnShifts,
    PenalizeUnmetDayOffRequests,
    FairDistribution,
}

impl ConstraintKind {
    pub const ALL: [ConstraintKind; 11] = [
        ConstraintKind::ExactlyOneAssignmentPerDay,
        ConstraintKind::ForbidShiftSequences,
        ConstraintKind::MinRestMinutesBetweenShifts,
        ConstraintKind::MaxShiftsInWindow,
        ConstraintKind::MaxWorkMinutesInWindow,
        ConstraintKind::MaxConsecutiveWorkDays,
        ConstraintKind::MinConsecutiveDaysOff,
        ConstraintKind::PenalizeWorkOnDays,
        ConstraintKind::PenalizeWorkOnShifts,
        ConstraintKind::PenalizeUnmetDayOffRequests,
        ConstraintKind::FairDistribution,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConstraintKind::ExactlyOneAssignmentPerDay => "exactly_one_assignment_per_day",
            ConstraintKind::ForbidShiftSequences => "forbid_shift_sequences",
            ConstraintKind::MinRestMinutesBetweenShifts => "min_rest_minutes_between_shifts",
            ConstraintKind::MaxShiftsInWindow => "max_shifts_in_window",
            ConstraintKind::MaxWorkMinutesInWindow => "max_work_minutes_in_window",
            ConstraintKind::MaxConsecutiveWorkDays => "max_consecutive_work_days",
            ConstraintKind::MinConsecutiveDaysOff => "min_consecutive_days_off",
            ConstraintKind::PenalizeWorkOnDays => "penalize_work_on_days",
            ConstraintKind::PenalizeWorkOnShifts => "penalize_work_on_shifts",
            ConstraintKind::PenalizeUnmetDayOffRequests => "penalize_unmet_day_off_requests",
            ConstraintKind::FairDistribution => "fair_distribution",
        }
    }

    /// Kinds that only make sense as penalty terms.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            ConstraintKind::PenalizeWorkOnDays
                | ConstraintKind::PenalizeWorkOnShifts
                | ConstraintKind::PenalizeUnmetDayOffRequests
                | ConstraintKind::FairDistribution
        )
    }
}

impl std::str::FromStr for ConstraintKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConstraintKind::ALL
            .iter()
            .find(|k| k.as_str() == s)
            .copied()
            .ok_or(())
    }
}

impl std::fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
