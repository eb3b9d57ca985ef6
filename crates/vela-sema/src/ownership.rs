//! Static ownership tracking for heap allocations
//!
//! One [`OwnershipAnalyzer`] follows every allocation made while checking a
//! module. Each allocation becomes an [`AllocationRecord`] owned by exactly
//! one variable at a time; aliasing moves that ownership, releasing marks it,
//! and [`OwnershipAnalyzer::report`] turns the final state into leak,
//! double-free and use-after-free findings.
//!
//! A variable is identified by its name together with the scope declaring
//! it, so a shadowing declaration in an inner scope never touches the
//! allocation of the variable it hides.
//!
//! The analysis sees declarations and statements in walk order only. It does
//! not merge state across branches, does not model loops, and does not follow
//! pointers stored in arrays or record fields.

use log::{debug, warn};
use vela_ast::Span;

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::scope::ScopeId;

/// One tracked allocation
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationRecord {
    pub site: Span,
    pub owner: String,
    /// Scope declaring `owner`
    pub owner_scope: ScopeId,
    pub released: bool,
    pub release_count: u32,
    /// Every variable that has held this allocation, in order
    pub alias_set: Vec<(String, ScopeId)>,
    /// False once no live name can reach the allocation
    pub reachable: bool,
    pub last_release: Option<Span>,
}

impl AllocationRecord {
    fn new(site: Span, owner: &str, owner_scope: ScopeId) -> Self {
        Self {
            site,
            owner: owner.to_string(),
            owner_scope,
            released: false,
            release_count: 0,
            alias_set: Vec::new(),
            reachable: true,
            last_release: None,
        }
    }

    fn is_owned_by(&self, name: &str, scope: ScopeId) -> bool {
        self.reachable && self.owner == name && self.owner_scope == scope
    }

    fn remember_alias(&mut self, name: &str, scope: ScopeId) {
        if !self.alias_set.iter().any(|(n, s)| n == name && *s == scope) {
            self.alias_set.push((name.to_string(), scope));
        }
    }
}

/// What a release event did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// First release of the allocation
    Released,
    /// Allocation was already released; carries the new release count
    Repeated(u32),
    /// The name owns no tracked allocation
    Untracked,
}

/// A problem found at end of unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnershipIssue {
    Leak {
        owner: String,
        site: Span,
    },
    DoubleFree {
        owner: String,
        count: u32,
        site: Span,
    },
    UseAfterFree {
        name: String,
        site: Span,
    },
}

impl OwnershipIssue {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            OwnershipIssue::Leak { owner, site } => Diagnostic::new(
                DiagnosticKind::MemoryLeak,
                format!("memory allocated for '{}' is never released", owner),
                *site,
            )
            .with_label("allocated here")
            .with_note("every allocation must be released exactly once")
            .with_help(format!(
                "release it with `free({})` before it goes out of scope",
                owner
            )),
            OwnershipIssue::DoubleFree { owner, count, site } => Diagnostic::new(
                DiagnosticKind::DoubleFree,
                format!("'{}' is released {} times", owner, count),
                *site,
            )
            .with_label("released again here")
            .with_note("releasing an allocation more than once corrupts the heap")
            .with_help(format!("keep a single `free({})`", owner)),
            OwnershipIssue::UseAfterFree { name, site } => Diagnostic::new(
                DiagnosticKind::UseAfterFree,
                format!("'{}' is used after its allocation was released", name),
                *site,
            )
            .with_label("used here after release")
            .with_note("the allocation behind this name was released earlier")
            .with_help(format!("move this use before `free({})`", name)),
        }
    }
}

/// Saved analyzer state, taken before a branch
#[derive(Debug, Clone)]
pub struct Snapshot {
    records: Vec<AllocationRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct OwnershipAnalyzer {
    records: Vec<AllocationRecord>,
    uses_after_release: Vec<(String, Span)>,
}

impl OwnershipAnalyzer {
    /// Create an analyzer with no tracked allocations
    pub fn new() -> Self {
        Self::default()
    }

    /// Every allocation seen so far, in allocation order
    pub fn records(&self) -> &[AllocationRecord] {
        &self.records
    }

    fn owned_by(&self, name: &str, scope: ScopeId) -> Option<usize> {
        self.records.iter().position(|r| r.is_owned_by(name, scope))
    }

    /// Drop the variable's claim on its current record, if any
    fn disown(&mut self, name: &str, scope: ScopeId) {
        if let Some(idx) = self.owned_by(name, scope) {
            let record = &mut self.records[idx];
            if !record.released {
                warn!(
                    "potential leak: '{}' is overwritten while owning the allocation from {}",
                    name, record.site
                );
            }
            record.reachable = false;
        }
    }

    /// Record a fresh allocation owned by `owner` declared in `scope`
    pub fn track_allocation(&mut self, site: Span, owner: &str, scope: ScopeId) {
        self.disown(owner, scope);
        debug!("allocation at {} owned by '{}' (scope {})", site, owner, scope);
        self.records.push(AllocationRecord::new(site, owner, scope));
    }

    pub fn track_release(&mut self, owner: &str, scope: ScopeId, site: Span) -> ReleaseOutcome {
        let Some(idx) = self.owned_by(owner, scope) else {
            warn!(
                "release of '{}' at {} without a matching allocation",
                owner, site
            );
            return ReleaseOutcome::Untracked;
        };

        let record = &mut self.records[idx];
        record.last_release = Some(site);
        if record.released {
            record.release_count += 1;
            ReleaseOutcome::Repeated(record.release_count)
        } else {
            record.released = true;
            record.release_count = 1;
            ReleaseOutcome::Released
        }
    }

    /// Move ownership from `source` to `new_name`
    pub fn track_alias(
        &mut self,
        new_name: &str,
        new_scope: ScopeId,
        source: &str,
        source_scope: ScopeId,
    ) {
        if new_name == source && new_scope == source_scope {
            return;
        }
        let Some(idx) = self.owned_by(source, source_scope) else {
            return;
        };
        if let Some(other) = self.owned_by(new_name, new_scope) {
            if other != idx {
                self.disown(new_name, new_scope);
            }
        }

        let record = &mut self.records[idx];
        record.remember_alias(source, source_scope);
        record.remember_alias(new_name, new_scope);
        record.owner = new_name.to_string();
        record.owner_scope = new_scope;
        debug!("ownership of allocation at {} moved '{}' -> '{}'", record.site, source, new_name);
    }

    /// `owner` is handed to the caller of an ownership-returning function;
    /// the callee is no longer responsible for releasing it
    pub fn track_return(&mut self, owner: &str, scope: ScopeId) {
        let Some(idx) = self.owned_by(owner, scope) else {
            return;
        };
        let record = &mut self.records[idx];
        if !record.released {
            record.released = true;
            record.release_count = 1;
        }
        record.reachable = false;
        debug!("allocation at {} returned to the caller through '{}'", record.site, owner);
    }

    /// Note a read of `name`; reading a released allocation is reported later
    pub fn track_use(&mut self, name: &str, scope: ScopeId, site: Span) {
        if let Some(idx) = self.owned_by(name, scope) {
            if self.records[idx].released {
                self.uses_after_release.push((name.to_string(), site));
            }
        }
    }

    /// `owner`, declared in `scope`, went out of scope. Ownership passes to
    /// the first alias `is_live` accepts; otherwise the allocation becomes
    /// unreachable.
    pub fn invalidate(&mut self, owner: &str, scope: ScopeId, is_live: impl Fn(&str, ScopeId) -> bool) {
        let Some(idx) = self.owned_by(owner, scope) else {
            return;
        };

        let heir = self.records[idx]
            .alias_set
            .iter()
            .find(|(alias, alias_scope)| {
                !(alias == owner && *alias_scope == scope)
                    && is_live(alias, *alias_scope)
                    && self.owned_by(alias, *alias_scope).is_none()
            })
            .cloned();

        let record = &mut self.records[idx];
        match heir {
            Some((alias, alias_scope)) => {
                debug!("'{}' out of scope, ownership falls back to '{}'", owner, alias);
                record.owner = alias;
                record.owner_scope = alias_scope;
            }
            None => {
                if !record.released {
                    debug!("'{}' out of scope while still owning allocation at {}", owner, record.site);
                }
                record.reachable = false;
            }
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            records: self.records.clone(),
        }
    }

    /// Undo a branch's effect on allocations that existed before it. Records
    /// created inside the branch are kept. A repeated release inside the
    /// branch survives the restore.
    pub fn restore(&mut self, snapshot: Snapshot) {
        let before = snapshot.records.len();
        for (idx, saved) in snapshot.records.into_iter().enumerate() {
            let current = &mut self.records[idx];
            let repeated = current.release_count > 1 && current.release_count > saved.release_count;
            let count = current.release_count;
            let last_release = current.last_release;
            *current = saved;
            if repeated {
                current.released = true;
                current.release_count = count;
                current.last_release = last_release;
            }
        }

        // a record made in the branch cannot keep a name the continuation owns
        for idx in before..self.records.len() {
            if !self.records[idx].reachable {
                continue;
            }
            let (owner, scope) = (self.records[idx].owner.clone(), self.records[idx].owner_scope);
            let taken = self.records[..before]
                .iter()
                .any(|r| r.is_owned_by(&owner, scope));
            if taken {
                self.records[idx].reachable = false;
            }
        }
    }

    pub fn report(&self) -> Vec<OwnershipIssue> {
        let mut issues = Vec::new();
        for record in &self.records {
            if record.release_count > 1 {
                issues.push(OwnershipIssue::DoubleFree {
                    owner: record.owner.clone(),
                    count: record.release_count,
                    site: record.last_release.unwrap_or(record.site),
                });
            } else if !record.released {
                issues.push(OwnershipIssue::Leak {
                    owner: record.owner.clone(),
                    site: record.site,
                });
            }
        }
        for (name, site) in &self.uses_after_release {
            issues.push(OwnershipIssue::UseAfterFree {
                name: name.clone(),
                site: *site,
            });
        }
        issues
    }
}
