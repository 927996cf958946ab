// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Label-group parsing shared by the Subscription Matcher (§4.6) and
//! the molecule/search surfaces.

/// A parsed view of one `"g<N>:"`-prefixed group, or the implicit
/// ungrouped bucket (`group = None`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelGroup<'a> {
    pub group: Option<u32>,
    /// Labels in this group with the `g<N>:` prefix stripped.
    pub members: Vec<&'a str>,
}

const GROUP_PREFIX: &str = "g";

/// Parse a label set into its groups (§4.6 step 1).
///
/// Labels of the form `g<N>:<rest>` are grouped by `N`; everything else
/// falls into a single ungrouped bucket. Group order in the result is
/// insertion order of first appearance; this has no semantic effect
/// since groups are evaluated independently (§3.2 invariant 8).
pub fn parse_label_groups<'a>(labels: &[&'a str]) -> Vec<LabelGroup<'a>> {
    let mut groups: Vec<LabelGroup<'a>> = Vec::new();
    let mut ungrouped: Vec<&'a str> = Vec::new();

    for &label in labels {
        match parse_group_prefix(label) {
            Some((n, rest)) => {
                if let Some(g) = groups.iter_mut().find(|g| g.group == Some(n)) {
                    g.members.push(rest);
                } else {
                    groups.push(LabelGroup { group: Some(n), members: vec![rest] });
                }
            }
            None => ungrouped.push(label),
        }
    }

    if !ungrouped.is_empty() {
        groups.push(LabelGroup { group: None, members: ungrouped });
    }

    groups
}

/// Parse a single label as `g<N>:<rest>`, returning `(N, rest)` if it
/// matches the group-prefix grammar.
fn parse_group_prefix(label: &str) -> Option<(u32, &str)> {
    let rest = label.strip_prefix(GROUP_PREFIX)?;
    let colon = rest.find(':')?;
    let (digits, tail) = rest.split_at(colon);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: u32 = digits.parse().ok()?;
    Some((n, &tail[1..]))
}
