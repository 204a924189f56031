//! Scope-clause evaluation: resolving a constraint's scope to the sorted
//! set of employee ids it governs.

use std::collections::BTreeSet;

use crate::spec::{Scope, Spec, StringOrList};

fn values(filter: &Option<StringOrList>) -> &[String] {
    filter.as_ref().map(StringOrList::as_slice).unwrap_or(&[])
}

/// Resolves a scope clause to employee ids, ascending, without duplicates.
///
/// Selection starts from all of `sets.employees` (or the explicit
/// `scope.employees` list) and every present, non-empty filter intersects
/// it: group membership, `skills_any`/`skills_all`, `roles_any`/`roles_all`,
/// `sites_any` (on `site_home`), `contracts_any` (on `contract.type`).
/// An unknown group intersects to nothing.
pub fn select_employees(spec: &Spec, scope: &Scope) -> Vec<String> {
    let all = spec
        .sets
        .as_ref()
        .map(|s| s.employees.as_slice())
        .unwrap_or(&[]);

    let mut selected: BTreeSet<&str> = match &scope.employees {
        None => all.iter().map(String::as_str).collect(),
        Some(StringOrList::One(s)) if s == "ALL" => all.iter().map(String::as_str).collect(),
        Some(list) => list.as_slice().iter().map(String::as_str).collect(),
    };

    for group in values(&scope.groups) {
        let members: BTreeSet<&str> = spec
            .groups
            .get(group)
            .map(|m| m.iter().map(String::as_str).collect())
            .unwrap_or_default();
        selected.retain(|e| members.contains(e));
    }

    let skills_any = values(&scope.skills_any);
    if !skills_any.is_empty() {
        selected.retain(|e| {
            spec.employee(e)
                .is_some_and(|def| skills_any.iter().any(|s| def.has_skill(s)))
        });
    }
    let skills_all = values(&scope.skills_all);
    if !skills_all.is_empty() {
        selected.retain(|e| {
            spec.employee(e)
                .is_some_and(|def| skills_all.iter().all(|s| def.has_skill(s)))
        });
    }

    let roles_any = values(&scope.roles_any);
    if !roles_any.is_empty() {
        selected.retain(|e| {
            spec.employee(e)
                .is_some_and(|def| roles_any.iter().any(|r| def.has_role(r)))
        });
    }
    let roles_all = values(&scope.roles_all);
    if !roles_all.is_empty() {
        selected.retain(|e| {
            spec.employee(e)
                .is_some_and(|def| roles_all.iter().all(|r| def.has_role(r)))
        });
    }

    let sites_any = values(&scope.sites_any);
    if !sites_any.is_empty() {
        selected.retain(|e| {
            spec.employee(e)
                .and_then(|def| def.site_home.as_deref())
                .is_some_and(|home| sites_any.iter().any(|s| s == home))
        });
    }

    let contracts_any = values(&scope.contracts_any);
    if !contracts_any.is_empty() {
        selected.retain(|e| {
            spec.employee(e)
                .and_then(|def| def.contract_type())
                .is_some_and(|ct| contracts_any.iter().any(|c| c == ct))
        });
    }

    selected.into_iter().map(String::from).collect()
}
