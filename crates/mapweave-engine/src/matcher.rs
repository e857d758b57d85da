//! Member matcher: pairs source members with target members by name

use crate::catalog::MemberDescriptor;
use std::collections::{BTreeMap, BTreeSet};

/// How a target member found its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Named in the request's member name map.
    Explicit,
    /// Same name, same case.
    Exact,
    /// Same name ignoring case; used only when no exact match exists.
    CaseInsensitive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedPair<'m> {
    pub source: &'m MemberDescriptor,
    pub target: &'m MemberDescriptor,
    pub kind: MatchKind,
}

/// Several sources matched one target ignoring case; nothing was chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ambiguity {
    pub target: String,
    pub candidates: Vec<String>,
}

/// An explicit override that took the place of an automatic match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuppressedMatch {
    pub target: String,
    pub explicit_source: String,
    pub automatic_source: String,
}

#[derive(Debug, Default)]
pub struct MatchOutcome<'m> {
    /// In target declaration order.
    pub pairs: Vec<MatchedPair<'m>>,
    pub unmatched_source: Vec<&'m MemberDescriptor>,
    /// Includes the targets listed in `ambiguities`.
    pub unmatched_target: Vec<&'m MemberDescriptor>,
    pub ambiguities: Vec<Ambiguity>,
    /// `(source, target)` overrides naming a member that does not exist.
    pub unknown_overrides: Vec<(String, String)>,
    pub suppressed: Vec<SuppressedMatch>,
}

impl MatchOutcome<'_> {
    pub fn is_ambiguous(&self, target: &str) -> bool {
        self.ambiguities.iter().any(|a| a.target == target)
    }
}

/// Pair every target member with at most one source member.
///
/// `overrides` maps source names to target names. A source named by a valid
/// override is reserved for its explicit target and does not take part in
/// automatic matching. One source may otherwise feed several targets.
pub fn match_members<'m>(
    sources: &'m [MemberDescriptor],
    targets: &'m [MemberDescriptor],
    overrides: &BTreeMap<String, String>,
) -> MatchOutcome<'m> {
    let mut outcome = MatchOutcome::default();

    let find_source = |name: &str| sources.iter().find(|s| s.name == name);
    let has_target = |name: &str| targets.iter().any(|t| t.name == name);

    // BTreeMap order keeps the first override per target stable.
    let mut explicit: BTreeMap<&str, &'m MemberDescriptor> = BTreeMap::new();
    let mut reserved: BTreeSet<&str> = BTreeSet::new();
    for (source_name, target_name) in overrides {
        match find_source(source_name) {
            Some(source) if has_target(target_name) => {
                explicit.entry(target_name.as_str()).or_insert(source);
                reserved.insert(source.name.as_str());
            }
            _ => outcome
                .unknown_overrides
                .push((source_name.clone(), target_name.clone())),
        }
    }

    let automatic: Vec<&'m MemberDescriptor> = sources
        .iter()
        .filter(|s| !reserved.contains(s.name.as_str()))
        .collect();

    let mut used: BTreeSet<&str> = BTreeSet::new();

    for target in targets {
        let exact = automatic.iter().copied().find(|s| s.name == target.name);
        let folded = target.name.to_lowercase();
        let insensitive: Vec<&'m MemberDescriptor> = automatic
            .iter()
            .copied()
            .filter(|s| s.name != target.name && s.name.to_lowercase() == folded)
            .collect();

        if let Some(&source) = explicit.get(target.name.as_str()) {
            let displaced = exact.or_else(|| (insensitive.len() == 1).then(|| insensitive[0]));
            if let Some(automatic_source) = displaced.filter(|a| a.name != source.name) {
                outcome.suppressed.push(SuppressedMatch {
                    target: target.name.clone(),
                    explicit_source: source.name.clone(),
                    automatic_source: automatic_source.name.clone(),
                });
            }
            used.insert(source.name.as_str());
            outcome.pairs.push(MatchedPair {
                source,
                target,
                kind: MatchKind::Explicit,
            });
            continue;
        }

        if let Some(source) = exact {
            used.insert(source.name.as_str());
            outcome.pairs.push(MatchedPair {
                source,
                target,
                kind: MatchKind::Exact,
            });
            continue;
        }

        match insensitive.as_slice() {
            [] => outcome.unmatched_target.push(target),
            [source] => {
                let source = *source;
                used.insert(source.name.as_str());
                outcome.pairs.push(MatchedPair {
                    source,
                    target,
                    kind: MatchKind::CaseInsensitive,
                });
            }
            candidates => {
                outcome.ambiguities.push(Ambiguity {
                    target: target.name.clone(),
                    candidates: candidates.iter().map(|s| s.name.clone()).collect(),
                });
                outcome.unmatched_target.push(target);
            }
        }
    }

    outcome.unmatched_source = sources
        .iter()
        .filter(|s| !used.contains(s.name.as_str()))
        .collect();

    outcome
}
