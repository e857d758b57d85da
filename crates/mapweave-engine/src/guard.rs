//! Recursion guard: the active chain of type pairs being resolved

use crate::plan::PlanRef;
use mapweave_core::PlanKey;
use thiserror::Error;

/// Default limit on nested resolutions within one request.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Proof that a key was pushed onto the chain. Hand it back to
/// [`RecursionGuard::release`] on every exit path.
#[must_use = "a chain token must be released once the pair is resolved"]
#[derive(Debug, PartialEq, Eq)]
pub struct ChainToken {
    depth: usize,
}

impl ChainToken {
    pub fn depth(&self) -> usize {
        self.depth
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum Entry {
    /// The pair was not in progress; resolve it now.
    Fresh(ChainToken),
    /// The pair is already being resolved further up; reference it instead.
    Reuse(PlanRef),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("nesting deeper than {max_depth} levels")]
pub struct DepthExceeded {
    pub max_depth: usize,
}

#[derive(Debug)]
pub struct RecursionGuard {
    chain: Vec<(PlanKey, String)>,
    max_depth: usize,
}

impl RecursionGuard {
    pub fn new(max_depth: usize) -> Self {
        Self {
            chain: Vec::new(),
            max_depth,
        }
    }

    /// Register `key` as in progress, or return a reference to the copy that
    /// already is.
    pub fn enter_or_reuse(&mut self, key: &PlanKey, method: &str) -> Result<Entry, DepthExceeded> {
        if let Some((active, active_method)) = self.chain.iter().find(|(k, _)| k == key) {
            tracing::debug!(key = %active, method = %active_method, "reusing in-progress mapping");
            return Ok(Entry::Reuse(PlanRef::local(active.clone(), active_method.clone())));
        }

        if self.chain.len() >= self.max_depth {
            return Err(DepthExceeded {
                max_depth: self.max_depth,
            });
        }

        self.chain.push((key.clone(), method.to_string()));
        Ok(Entry::Fresh(ChainToken {
            depth: self.chain.len(),
        }))
    }

    /// Pop the pair registered by `token` and anything entered after it.
    pub fn release(&mut self, token: ChainToken) {
        self.chain.truncate(token.depth.saturating_sub(1));
    }

    pub fn depth(&self) -> usize {
        self.chain.len()
    }

    pub fn is_active(&self, key: &PlanKey) -> bool {
        self.chain.iter().any(|(k, _)| k == key)
    }
}

impl Default for RecursionGuard {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}
