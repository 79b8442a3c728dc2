//! Index allocation and renumbering.
//!
//! The [`IndexAllocator`] owns the statement count for one document and
//! decides which index a new statement receives. Opening a slot in the middle
//! of the tree shifts every later statement up by one; removing a span shifts
//! everything after it down, so the pre-order sequence stays `1..=N`.

use tracing::trace;

use crate::error::ScriptError;
use crate::navigator::{find_by_index, subtree_end};
use crate::statement::{Role, Statement};

/// Per-document index counter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexAllocator {
    count: usize,
}

impl IndexAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing document holding `count` indexed statements.
    pub fn with_count(count: usize) -> Self {
        Self { count }
    }

    /// Number of indexed statements in the document.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Reserves the index after the current last statement.
    pub fn append(&mut self) -> usize {
        self.count += 1;
        self.count
    }

    /// Target index for a new statement added to `role` of `parent_index`.
    ///
    /// The new statement goes after the whole subtree of the last member of
    /// that role-list; an empty else-branch falls back to the if-branch, and
    /// an empty branch falls back to the slot right after the parent.
    pub fn sub_statement_target(
        &self,
        statements: &[Statement],
        parent_index: usize,
        role: Role,
    ) -> Result<usize, ScriptError> {
        let parent =
            find_by_index(statements, parent_index).ok_or(ScriptError::NotFound(parent_index))?;
        if !role.is_indexed() || !parent.accepts(role) {
            return Err(ScriptError::RoleNotSupported {
                parent: parent_index,
                role,
            });
        }

        // The parent is the last statement overall, so nothing follows it.
        if parent_index == self.count {
            return Ok(self.count + 1);
        }

        let lists = parent.role_lists();
        let upto = lists
            .iter()
            .position(|(r, _)| *r == role)
            .ok_or(ScriptError::RoleNotSupported {
                parent: parent_index,
                role,
            })?;
        let target = lists[..=upto]
            .iter()
            .rev()
            .find_map(|(_, list)| list.last())
            .map(|last| subtree_end(last) + 1)
            .unwrap_or(parent.index + 1);
        Ok(target)
    }

    /// Target index for a statement placed right after `after`'s subtree.
    ///
    /// `after == 0` targets the very front of the document.
    pub fn after_target(
        &self,
        statements: &[Statement],
        after: usize,
    ) -> Result<usize, ScriptError> {
        if after == 0 {
            return Ok(1);
        }
        let stmt = find_by_index(statements, after).ok_or(ScriptError::NotFound(after))?;
        Ok(subtree_end(stmt) + 1)
    }

    /// Opens `target` for a new statement and bumps the count.
    pub fn claim(&mut self, statements: &mut [Statement], target: usize) -> usize {
        if target <= self.count {
            shift_index_ahead(statements, target, 1);
        }
        self.count += 1;
        trace!(target, count = self.count, "claimed index");
        target
    }

    /// Closes the gap left by a removed span ending at `span_end`.
    pub fn release(&mut self, statements: &mut [Statement], span_end: usize, span_len: usize) {
        shift_index_back(statements, span_end + 1, span_len);
        self.count = self.count.saturating_sub(span_len);
        trace!(span_end, span_len, count = self.count, "released indices");
    }
}

/// Adds `delta` to every statement whose index is at least `from`.
pub fn shift_index_ahead(statements: &mut [Statement], from: usize, delta: usize) {
    for_each_mut(statements, |stmt| {
        if stmt.index >= from {
            stmt.index += delta;
        }
    });
}

/// Subtracts `delta` from every statement whose index is at least `from`.
pub fn shift_index_back(statements: &mut [Statement], from: usize, delta: usize) {
    for_each_mut(statements, |stmt| {
        if stmt.index >= from {
            stmt.index = stmt.index.saturating_sub(delta);
        }
    });
}

/// Renumbers a detached subtree so that its root carries `new_root`.
pub(crate) fn rebase(stmt: &mut Statement, new_root: usize) {
    let old_root = stmt.index;
    for_each_mut(std::slice::from_mut(stmt), |s| {
        s.index = s.index - old_root + new_root;
    });
}

fn for_each_mut(statements: &mut [Statement], mut f: impl FnMut(&mut Statement)) {
    let mut stack: Vec<&mut Statement> = statements.iter_mut().collect();
    while let Some(stmt) = stack.pop() {
        f(&mut *stmt);
        for (_, list) in stmt.role_lists_mut() {
            stack.extend(list.iter_mut());
        }
    }
}
