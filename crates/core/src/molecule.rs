// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Molecule instantiation ("pouring"): a template Issue plus its
//! induced dependency subgraph, with `{{name}}` placeholders
//! substituted by variable values.

use std::collections::HashMap;

use thiserror::Error;

use crate::dependency::Dependency;
use crate::issue::{Issue, IssueId};

#[derive(Debug, Error)]
pub enum PourError {
    #[error("unresolved variable {{{{{0}}}}} in molecule template")]
    UnresolvedVariable(String),
}

/// Substitute every `{{name}}` occurrence in `template` with
/// `vars[name]`. Unresolved placeholders are an error rather than a
/// silent no-op, since a half-substituted title/description would be
/// worse than a loud failure at pour time.
fn substitute(template: &str, vars: &HashMap<String, String>) -> Result<String, PourError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            // Unterminated "{{" — treat the remainder as literal text.
            out.push_str("{{");
            rest = after;
            continue;
        };
        let name = after[..end].trim();
        match vars.get(name) {
            Some(value) => out.push_str(value),
            None => return Err(PourError::UnresolvedVariable(name.to_string())),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Pour a molecule: instantiate a fresh Issue from `template` and a
/// fresh copy of `subgraph` (the template's induced Dependency edges),
/// with every `{{name}}` placeholder substituted. Preserves invariant
/// 7 (acyclicity) because the subgraph is copied verbatim, never
/// re-derived — a DAG copied edge-for-edge under ID remapping is still
/// a DAG.
pub fn pour_molecule(
    template: &Issue,
    subgraph: &[Dependency],
    vars: &HashMap<String, String>,
    new_id: IssueId,
    id_remap: &HashMap<IssueId, IssueId>,
) -> Result<(Issue, Vec<Dependency>), PourError> {
    let mut poured = template.clone();
    poured.id = new_id;
    poured.is_template = false;
    poured.title = substitute(&template.title, vars)?;
    poured.description = template.description.as_deref().map(|d| substitute(d, vars)).transpose()?;

    let mut poured_edges = Vec::with_capacity(subgraph.len());
    for edge in subgraph {
        let mut e = edge.clone();
        e.id = crate::dependency::DependencyId::new();
        if let Some(mapped) = id_remap.get(&e.issue_id) {
            e.issue_id = *mapped;
        }
        if let Some(mapped) = id_remap.get(&e.depends_on_id) {
            e.depends_on_id = *mapped;
        }
        poured_edges.push(e);
    }

    Ok((poured, poured_edges))
}
