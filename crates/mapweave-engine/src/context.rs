//! Per-request resolution state

use crate::diagnostics::DiagnosticCollector;
use crate::guard::RecursionGuard;
use crate::naming::{claim_unique, helper_method_name};
use crate::plan::{HelperPlan, ObjectPlan};
use mapweave_core::{DiagnosticCode, Location, PlanKey, Severity};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug)]
enum HelperState {
    Pending,
    Done(ObjectPlan),
    Failed,
}

#[derive(Debug)]
struct HelperSlot {
    method: String,
    origin: Vec<String>,
    state: HelperState,
}

/// What the memo knows about a helper key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelperStatus {
    Pending,
    Done,
    Failed,
}

/// Memo of the helper mappings generated for one request.
#[derive(Debug, Default)]
pub struct HelperTable {
    slots: BTreeMap<PlanKey, HelperSlot>,
    order: Vec<PlanKey>,
    names: BTreeSet<String>,
}

impl HelperTable {
    /// `taken` holds method names already used on the mapper.
    pub fn new(taken: impl IntoIterator<Item = String>) -> Self {
        Self {
            names: taken.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn status(&self, key: &PlanKey) -> Option<HelperStatus> {
        self.slots.get(key).map(|slot| match slot.state {
            HelperState::Pending => HelperStatus::Pending,
            HelperState::Done(_) => HelperStatus::Done,
            HelperState::Failed => HelperStatus::Failed,
        })
    }

    pub fn method(&self, key: &PlanKey) -> Option<&str> {
        self.slots.get(key).map(|slot| slot.method.as_str())
    }

    /// Path of the member that first needed the helper.
    pub fn origin(&self, key: &PlanKey) -> Option<&[String]> {
        self.slots.get(key).map(|slot| slot.origin.as_slice())
    }

    /// Claim a method name for `key` and mark it pending.
    pub fn reserve(
        &mut self,
        key: PlanKey,
        source_name: &str,
        target_name: &str,
        origin: Vec<String>,
    ) -> String {
        if let Some(slot) = self.slots.get(&key) {
            return slot.method.clone();
        }

        let method = claim_unique(&helper_method_name(source_name, target_name), &mut self.names);
        self.order.push(key.clone());
        self.slots.insert(
            key,
            HelperSlot {
                method: method.clone(),
                origin,
                state: HelperState::Pending,
            },
        );
        method
    }

    /// Drop a pending reservation that was never started, freeing its name.
    pub fn discard(&mut self, key: &PlanKey) {
        if let Some(slot) = self.slots.remove(key) {
            self.names.remove(&slot.method);
            self.order.retain(|k| k != key);
        }
    }

    pub fn complete(&mut self, key: &PlanKey, plan: ObjectPlan) {
        if let Some(slot) = self.slots.get_mut(key) {
            slot.state = HelperState::Done(plan);
        }
    }

    pub fn fail(&mut self, key: &PlanKey) {
        if let Some(slot) = self.slots.get_mut(key) {
            slot.state = HelperState::Failed;
        }
    }

    pub fn failed_keys(&self) -> BTreeSet<PlanKey> {
        self.slots
            .iter()
            .filter(|(_, slot)| matches!(slot.state, HelperState::Failed))
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn plan_mut(&mut self, key: &PlanKey) -> Option<&mut ObjectPlan> {
        match self.slots.get_mut(key) {
            Some(HelperSlot {
                state: HelperState::Done(plan),
                ..
            }) => Some(plan),
            _ => None,
        }
    }

    /// Completed helper keys in first-use order.
    pub fn completed_keys(&self) -> Vec<PlanKey> {
        self.order
            .iter()
            .filter(|key| self.status(key) == Some(HelperStatus::Done))
            .cloned()
            .collect()
    }

    /// Completed helpers in first-use order.
    pub fn into_helpers(mut self) -> Vec<HelperPlan> {
        let mut helpers = Vec::new();
        for key in self.order {
            if let Some(slot) = self.slots.remove(&key)
                && let HelperState::Done(body) = slot.state
            {
                helpers.push(HelperPlan {
                    key,
                    method: slot.method,
                    body,
                });
            }
        }
        helpers
    }
}

/// State owned by the thread resolving one request. Dropped once the plan is
/// finalized.
#[derive(Debug)]
pub struct ResolutionContext {
    pub request_id: String,
    /// Member path from the request root to the member being resolved.
    pub path: Vec<String>,
    pub guard: RecursionGuard,
    pub diagnostics: DiagnosticCollector,
    pub helpers: HelperTable,
}

impl ResolutionContext {
    pub fn new(
        request_id: impl Into<String>,
        max_depth: usize,
        taken_names: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            path: Vec::new(),
            guard: RecursionGuard::new(max_depth),
            diagnostics: DiagnosticCollector::new(),
            helpers: HelperTable::new(taken_names),
        }
    }

    pub fn location(&self) -> Location {
        Location::with_path(self.request_id.clone(), self.path.clone())
    }

    /// Location of `member` below the current path.
    pub fn member_location(&self, member: &str) -> Location {
        let mut path = self.path.clone();
        path.push(member.to_string());
        Location::with_path(self.request_id.clone(), path)
    }

    /// Report at the current path with the code's default severity.
    pub fn report(&mut self, code: DiagnosticCode, message: impl Into<String>) {
        let location = self.location();
        self.diagnostics.report(code, location, message);
    }

    pub fn report_member(&mut self, member: &str, code: DiagnosticCode, message: impl Into<String>) {
        let location = self.member_location(member);
        self.diagnostics.report(code, location, message);
    }

    pub fn record(&mut self, severity: Severity, code: DiagnosticCode, message: impl Into<String>) {
        let location = self.location();
        self.diagnostics.record(severity, code, location, message);
    }
}

#[cfg(test)]
#[path = "context/context_tests.rs"]
mod context_tests;
