//! Read-only queries over a statement tree.
//!
//! Parents are never stored on statements. Every relation here is computed
//! by walking the tree from the top-level list, using an explicit stack so
//! that deeply nested scripts cannot exhaust the call stack.
//!
//! The traversal order is the one that defines the index space: a statement,
//! then each of its indexed role-lists in [`Statement::role_lists`] order.

use crate::error::ScriptError;
use crate::statement::{Role, Statement};

/// Where a statement lives in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    /// Index of the enclosing statement and the role-list holding the
    /// statement, or `None` for the top-level list.
    pub parent: Option<(usize, Role)>,
    /// Array position inside that list.
    pub position: usize,
}

/// Pre-order iterator over every indexed statement.
pub struct PreOrder<'a> {
    stack: Vec<&'a Statement>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a Statement;

    fn next(&mut self) -> Option<Self::Item> {
        let stmt = self.stack.pop()?;
        for (_, list) in stmt.role_lists().into_iter().rev() {
            self.stack.extend(list.iter().rev());
        }
        Some(stmt)
    }
}

/// Walks `statements` and all nested role-lists in index order.
pub fn preorder(statements: &[Statement]) -> PreOrder<'_> {
    PreOrder {
        stack: statements.iter().rev().collect(),
    }
}

/// Finds the statement carrying `index`, at any depth.
pub fn find_by_index(statements: &[Statement], index: usize) -> Option<&Statement> {
    let mut stack: Vec<&Statement> = statements.iter().collect();
    while let Some(stmt) = stack.pop() {
        if stmt.index == index {
            return Some(stmt);
        }
        for (_, list) in stmt.role_lists() {
            stack.extend(list.iter());
        }
    }
    None
}

pub fn find_by_index_mut(statements: &mut [Statement], index: usize) -> Option<&mut Statement> {
    let mut stack: Vec<&mut Statement> = statements.iter_mut().collect();
    while let Some(stmt) = stack.pop() {
        if stmt.index == index {
            return Some(stmt);
        }
        for (_, list) in stmt.role_lists_mut() {
            stack.extend(list.iter_mut());
        }
    }
    None
}

/// Resolves the list and array position holding the statement at `index`.
pub fn locate(statements: &[Statement], index: usize) -> Option<Location> {
    let mut stack: Vec<(Option<(usize, Role)>, &[Statement])> = vec![(None, statements)];
    while let Some((parent, list)) = stack.pop() {
        for (position, stmt) in list.iter().enumerate() {
            if stmt.index == index {
                return Some(Location { parent, position });
            }
            for (role, children) in stmt.role_lists() {
                stack.push((Some((stmt.index, role)), children.as_slice()));
            }
        }
    }
    None
}

/// Returns the statement whose role-list directly contains `index`.
///
/// `Ok(None)` means the statement is top-level; an unknown index is an error.
pub fn parent_of(
    statements: &[Statement],
    index: usize,
) -> Result<Option<&Statement>, ScriptError> {
    let location = locate(statements, index).ok_or(ScriptError::NotFound(index))?;
    match location.parent {
        None => Ok(None),
        Some((parent, _)) => find_by_index(statements, parent)
            .map(Some)
            .ok_or(ScriptError::NotFound(parent)),
    }
}

pub fn is_nested(statements: &[Statement], index: usize) -> Result<bool, ScriptError> {
    parent_of(statements, index).map(|parent| parent.is_some())
}

/// Index of the last statement in `stmt`'s subtree (its own index for a leaf).
///
/// Follows the last element of the last non-empty role-list down the tree.
pub fn subtree_end(stmt: &Statement) -> usize {
    let mut current = stmt;
    while let Some(last) = current
        .role_lists()
        .into_iter()
        .rev()
        .find_map(|(_, list)| list.last())
    {
        current = last;
    }
    current.index
}

/// Number of indexed statements in `stmt`'s subtree, including itself.
pub fn subtree_len(stmt: &Statement) -> usize {
    subtree_end(stmt) + 1 - stmt.index
}

/// Borrows the list described by a [`Location`]'s parent mutably.
pub(crate) fn list_mut<'a>(
    statements: &'a mut Vec<Statement>,
    parent: Option<(usize, Role)>,
) -> Option<&'a mut Vec<Statement>> {
    match parent {
        None => Some(statements),
        Some((index, role)) => find_by_index_mut(statements, index)?.role_list_mut(role),
    }
}

/// Verifies that the pre-order index sequence is exactly `1..=N`.
///
/// Returns `N` on success.
pub fn check_indices(statements: &[Statement]) -> Result<usize, ScriptError> {
    let mut expected = 1;
    for stmt in preorder(statements) {
        if stmt.index != expected {
            return Err(ScriptError::StructuralInconsistency {
                expected,
                found: stmt.index,
            });
        }
        expected += 1;
    }
    Ok(expected - 1)
}
