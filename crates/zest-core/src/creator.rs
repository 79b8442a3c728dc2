//! The document facade: add, delete, move and query statements.
//!
//! [`ZestCreator`] owns one [`ZestScript`] together with its
//! [`IndexAllocator`]. Every mutating call validates its arguments before the
//! first write, then leaves the tree with a pre-order index sequence of
//! exactly `1..=N`.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use zest_core::config::CreatorOptions;
//! use zest_core::creator::ZestCreator;
//!
//! let mut zc = ZestCreator::new(&CreatorOptions::default());
//! zc.add_statement(&json!({"elementType": "ZestConditional"})).unwrap();
//! zc.add_statement(&json!({
//!     "elementType": "ZestActionPrint",
//!     "message": "Pass",
//!     "parentIndex": 1,
//!     "subStatementOf": "ifStatements"
//! })).unwrap();
//!
//! assert_eq!(zc.statement_count(), 2);
//! assert!(zc.is_nested(2).unwrap());
//! ```

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::allocator::{rebase, shift_index_ahead, shift_index_back, IndexAllocator};
use crate::config::CreatorOptions;
use crate::error::ScriptError;
use crate::factory::{create_statement, target_role, Element, ROLE_KEY};
use crate::loader;
use crate::navigator::{self, check_indices, find_by_index, list_mut, locate, subtree_end};
use crate::script::ZestScript;
use crate::statement::{Assertion, Response, Role, Statement};

/// Where a new statement goes, read from its descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// End of the document.
    Append,
    /// Next sibling of the statement at this index (`0` = front of the document).
    After(usize),
    /// End of a parent's role-list.
    Sub { parent_index: usize, role: Role },
}

impl Placement {
    /// Reads `parentIndex` + `subStatementOf`, or `after`, from a descriptor.
    pub fn from_descriptor(descriptor: &Value) -> Result<Self, ScriptError> {
        let element_type = descriptor
            .get("elementType")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let invalid = |reason: &str| ScriptError::InvalidDescriptor {
            element_type: element_type.to_string(),
            reason: reason.to_string(),
        };

        let parent_index = index_field(descriptor, "parentIndex")
            .ok_or_else(|| invalid("parentIndex must be a positive integer"))?;
        let role = match descriptor.get(ROLE_KEY).and_then(Value::as_str) {
            Some(name) => Some(name.parse::<Role>()?),
            None => None,
        };
        let after = index_field(descriptor, "after")
            .ok_or_else(|| invalid("after must be a non-negative integer"))?;

        match (parent_index, role, after) {
            (Some(parent_index), Some(role), None) => Ok(Placement::Sub { parent_index, role }),
            (None, None, Some(after)) => Ok(Placement::After(after)),
            (None, None, None) => Ok(Placement::Append),
            (Some(_), None, _) => Err(invalid("parentIndex requires subStatementOf")),
            (None, Some(_), _) => Err(invalid("subStatementOf requires parentIndex")),
            (Some(_), Some(_), Some(_)) => {
                Err(invalid("after cannot be combined with parentIndex"))
            }
        }
    }
}

/// Reads an optional index field. `None` when present but not a
/// non-negative integer.
fn index_field(descriptor: &Value, key: &str) -> Option<Option<usize>> {
    match descriptor.get(key) {
        None | Some(Value::Null) => Some(None),
        Some(v) => v.as_u64().map(|n| Some(n as usize)),
    }
}

/// Result of a successful [`ZestCreator::add_statement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Added {
    /// A statement now living at this index.
    Indexed(usize),
    /// A response or assertion attached to a request, outside the index space.
    Attached { parent: usize, role: Role },
}

/// What [`ZestCreator::delete_statement`] removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identifier {
    /// The statement at this index together with its subtree.
    Index(usize),
    /// A member of a parent's role-list, by array position; every member
    /// when `sub_index` is `None`.
    Role {
        parent_index: usize,
        role: Role,
        sub_index: Option<usize>,
    },
}

impl Identifier {
    /// Reads `{index}` or `{parentIndex, subStatementOf, subIndex?}`.
    pub fn from_value(value: &Value) -> Result<Self, ScriptError> {
        let invalid = |reason: &str| ScriptError::InvalidDescriptor {
            element_type: "identifier".to_string(),
            reason: reason.to_string(),
        };
        let parent_index = index_field(value, "parentIndex")
            .ok_or_else(|| invalid("bad parentIndex"))?;
        if let Some(parent_index) = parent_index {
            let role = target_role(value)
                .ok_or_else(|| invalid("subStatementOf is missing or unknown"))?;
            let sub_index = index_field(value, "subIndex")
                .ok_or_else(|| invalid("bad subIndex"))?;
            return Ok(Identifier::Role { parent_index, role, sub_index });
        }
        index_field(value, "index")
            .ok_or_else(|| invalid("bad index"))?
            .map(Identifier::Index)
            .ok_or_else(|| invalid("expected index or parentIndex"))
    }
}

/// Builds and edits one Zest script.
///
/// `ZestCreator` performs no internal locking. Callers sharing one instance
/// across threads must serialize access themselves (for example behind a
/// `Mutex`), one mutator at a time.
#[derive(Debug, Clone)]
pub struct ZestCreator {
    script: ZestScript,
    allocator: IndexAllocator,
}

impl ZestCreator {
    /// Starts an empty script with the given metadata.
    pub fn new(options: &CreatorOptions) -> Self {
        Self {
            script: ZestScript::new(options),
            allocator: IndexAllocator::new(),
        }
    }

    /// Wraps an existing script, which must already be consistently indexed.
    pub fn from_script(script: ZestScript) -> Result<Self, ScriptError> {
        let count = check_indices(&script.statements)?;
        Ok(Self {
            script,
            allocator: IndexAllocator::with_count(count),
        })
    }

    /// Loads a script from JSON text. See [`loader::load_value`].
    pub fn load(json: &str) -> Result<Self, ScriptError> {
        Self::from_script(loader::load_str(json)?)
    }

    pub fn open(path: &Path) -> Result<Self, ScriptError> {
        Self::from_script(loader::load_file(path)?)
    }

    /// The persistable document.
    pub fn script(&self) -> &ZestScript {
        &self.script
    }

    pub fn into_script(self) -> ZestScript {
        self.script
    }

    pub fn statements(&self) -> &[Statement] {
        &self.script.statements
    }

    /// Number of indexed statements, at any depth.
    pub fn statement_count(&self) -> usize {
        self.allocator.count()
    }

    pub fn get_statement(&self, index: usize) -> Option<&Statement> {
        find_by_index(&self.script.statements, index)
    }

    /// The statement following `stmt` in index order.
    pub fn next_statement(&self, stmt: &Statement) -> Option<&Statement> {
        self.get_statement(stmt.index + 1)
    }

    pub fn parent_of(&self, index: usize) -> Result<Option<&Statement>, ScriptError> {
        navigator::parent_of(&self.script.statements, index)
    }

    pub fn is_nested(&self, index: usize) -> Result<bool, ScriptError> {
        navigator::is_nested(&self.script.statements, index)
    }

    pub fn set_enabled(&mut self, index: usize, enabled: bool) -> Result<(), ScriptError> {
        let stmt = navigator::find_by_index_mut(&mut self.script.statements, index)
            .ok_or(ScriptError::NotFound(index))?;
        stmt.enabled = enabled;
        Ok(())
    }

    /// Checks the index invariant against the allocator's count.
    pub fn verify(&self) -> Result<usize, ScriptError> {
        let found = check_indices(&self.script.statements)?;
        if found != self.allocator.count() {
            return Err(ScriptError::StructuralInconsistency {
                expected: self.allocator.count(),
                found,
            });
        }
        Ok(found)
    }

    /// Builds a statement from `descriptor` and places it.
    ///
    /// Placement comes from the descriptor: `parentIndex` + `subStatementOf`
    /// adds to a role-list, `after` inserts after a statement, and neither
    /// appends. An unrecognized `elementType` is logged as a warning and
    /// returned without touching the tree.
    #[instrument(skip(self, descriptor), level = "debug")]
    pub fn add_statement(&mut self, descriptor: &Value) -> Result<Added, ScriptError> {
        let element = match create_statement(descriptor) {
            Ok(element) => element,
            Err(e @ ScriptError::UnrecognizedStatementType(_)) => {
                warn!(error = %e, "skipping statement");
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        let placement = Placement::from_descriptor(descriptor)?;

        match (element, placement) {
            (Element::Statement(stmt), Placement::Append) => Ok(Added::Indexed(self.append(stmt))),
            (Element::Statement(stmt), Placement::After(after)) => {
                self.insert_after(stmt, after).map(Added::Indexed)
            }
            (Element::Statement(stmt), Placement::Sub { parent_index, role }) => {
                self.insert_sub(stmt, parent_index, role).map(Added::Indexed)
            }
            (
                Element::Response(response),
                Placement::Sub { parent_index, role: Role::Response },
            ) => self.attach_response(parent_index, response),
            (
                Element::Assertion(assertion),
                Placement::Sub { parent_index, role: Role::Assertions },
            ) => self.attach_assertion(parent_index, assertion),
            (_, Placement::Sub { parent_index, role }) => Err(ScriptError::RoleNotSupported {
                parent: parent_index,
                role,
            }),
            (element, _) => Err(ScriptError::InvalidDescriptor {
                element_type: element.element_type().to_string(),
                reason: "must be attached to a request with parentIndex and subStatementOf"
                    .to_string(),
            }),
        }
    }

    fn append(&mut self, mut stmt: Statement) -> usize {
        stmt.index = self.allocator.append();
        stmt.enabled = true;
        debug!(index = stmt.index, kind = stmt.element_type(), "appended statement");
        let index = stmt.index;
        self.script.statements.push(stmt);
        index
    }

    fn insert_after(&mut self, mut stmt: Statement, after: usize) -> Result<usize, ScriptError> {
        let target = self.allocator.after_target(&self.script.statements, after)?;
        let (parent, position) = if after == 0 {
            (None, 0)
        } else {
            let location =
                locate(&self.script.statements, after).ok_or(ScriptError::NotFound(after))?;
            (location.parent, location.position + 1)
        };

        // Parents precede `target`, so `parent` is unaffected by the shift.
        self.allocator.claim(&mut self.script.statements, target);
        stmt.index = target;
        stmt.enabled = true;
        debug!(after, target, kind = stmt.element_type(), "inserted statement");
        list_mut(&mut self.script.statements, parent)
            .ok_or(ScriptError::NotFound(after))?
            .insert(position, stmt);
        Ok(target)
    }

    fn insert_sub(
        &mut self,
        mut stmt: Statement,
        parent_index: usize,
        role: Role,
    ) -> Result<usize, ScriptError> {
        let target = self
            .allocator
            .sub_statement_target(&self.script.statements, parent_index, role)?;

        self.allocator.claim(&mut self.script.statements, target);
        stmt.index = target;
        stmt.enabled = true;
        debug!(parent_index, %role, target, kind = stmt.element_type(), "added sub-statement");
        list_mut(&mut self.script.statements, Some((parent_index, role)))
            .ok_or(ScriptError::NotFound(parent_index))?
            .push(stmt);
        Ok(target)
    }

    fn attach_response(
        &mut self,
        parent_index: usize,
        response: Response,
    ) -> Result<Added, ScriptError> {
        let request = navigator::find_by_index_mut(&mut self.script.statements, parent_index)
            .ok_or(ScriptError::NotFound(parent_index))?
            .as_request_mut()
            .ok_or(ScriptError::RoleNotSupported {
                parent: parent_index,
                role: Role::Response,
            })?;
        request.response = Some(response);
        debug!(parent_index, "attached response");
        Ok(Added::Attached {
            parent: parent_index,
            role: Role::Response,
        })
    }

    fn attach_assertion(
        &mut self,
        parent_index: usize,
        assertion: Assertion,
    ) -> Result<Added, ScriptError> {
        let request = navigator::find_by_index_mut(&mut self.script.statements, parent_index)
            .ok_or(ScriptError::NotFound(parent_index))?
            .as_request_mut()
            .ok_or(ScriptError::RoleNotSupported {
                parent: parent_index,
                role: Role::Assertions,
            })?;
        request.assertions.push(assertion);
        debug!(parent_index, count = request.assertions.len(), "attached assertion");
        Ok(Added::Attached {
            parent: parent_index,
            role: Role::Assertions,
        })
    }

    /// Removes statements and returns how many indexed statements went away.
    ///
    /// Responses and assertions are removed in place and count as zero.
    #[instrument(skip(self), level = "debug")]
    pub fn delete_statement(&mut self, ident: &Identifier) -> Result<usize, ScriptError> {
        match *ident {
            Identifier::Index(index) => self.delete_index(index),
            Identifier::Role {
                parent_index,
                role,
                sub_index,
            } => self.delete_in_role(parent_index, role, sub_index),
        }
    }

    fn delete_index(&mut self, index: usize) -> Result<usize, ScriptError> {
        let stmt =
            find_by_index(&self.script.statements, index).ok_or(ScriptError::NotFound(index))?;
        let span_end = subtree_end(stmt);
        let span_len = span_end + 1 - index;

        self.detach(index)?;
        self.allocator
            .release(&mut self.script.statements, span_end, span_len);
        debug!(index, span_end, span_len, "deleted statement");
        Ok(span_len)
    }

    fn delete_in_role(
        &mut self,
        parent_index: usize,
        role: Role,
        sub_index: Option<usize>,
    ) -> Result<usize, ScriptError> {
        let parent = find_by_index(&self.script.statements, parent_index)
            .ok_or(ScriptError::NotFound(parent_index))?;
        if !parent.accepts(role) {
            return Err(ScriptError::RoleNotSupported {
                parent: parent_index,
                role,
            });
        }
        let missing = |position| ScriptError::NoSuchMember {
            parent: parent_index,
            role,
            position,
        };

        if role.is_indexed() {
            let members: Vec<usize> = parent
                .role_list(role)
                .map(|list| list.iter().map(|s| s.index).collect())
                .unwrap_or_default();
            let doomed = match sub_index {
                Some(position) => vec![*members.get(position).ok_or_else(|| missing(position))?],
                None => members,
            };
            // Last first, so earlier members keep their indices.
            let mut removed = 0;
            for index in doomed.into_iter().rev() {
                removed += self.delete_index(index)?;
            }
            return Ok(removed);
        }

        let request = navigator::find_by_index_mut(&mut self.script.statements, parent_index)
            .and_then(Statement::as_request_mut)
            .ok_or(ScriptError::NotFound(parent_index))?;
        match (role, sub_index) {
            (Role::Response, _) => request.response = None,
            (_, Some(position)) => {
                if position >= request.assertions.len() {
                    return Err(missing(position));
                }
                request.assertions.remove(position);
            }
            (_, None) => request.assertions.clear(),
        }
        debug!(parent_index, %role, ?sub_index, "removed unindexed member");
        Ok(0)
    }

    /// Moves statement `old` (with its subtree) so that it lands at `new`.
    ///
    /// Moving forward places it right after the statement at `new`; moving
    /// backward places it right before. Either way it joins the list that
    /// holds the statement at `new`, which may belong to a different
    /// container than the one it leaves.
    #[instrument(skip(self), level = "debug")]
    pub fn move_statement(&mut self, old: usize, new: usize) -> Result<(), ScriptError> {
        let moving = find_by_index(&self.script.statements, old).ok_or(ScriptError::NotFound(old))?;
        let span_end = subtree_end(moving);
        let span = span_end + 1 - old;
        if find_by_index(&self.script.statements, new).is_none() {
            return Err(ScriptError::NotFound(new));
        }
        if old == new {
            return Ok(());
        }
        if (old..=span_end).contains(&new) {
            return Err(ScriptError::InvalidMove { from: old, to: new });
        }

        let mut detached = self.detach(old)?;
        shift_index_back(&mut self.script.statements, span_end + 1, span);

        let forward = new > old;
        let anchor = if forward { new - span } else { new };
        let anchor_stmt =
            find_by_index(&self.script.statements, anchor).ok_or(ScriptError::NotFound(anchor))?;
        let root = if forward { subtree_end(anchor_stmt) + 1 } else { anchor };
        let location =
            locate(&self.script.statements, anchor).ok_or(ScriptError::NotFound(anchor))?;
        let position = if forward {
            location.position + 1
        } else {
            location.position
        };

        shift_index_ahead(&mut self.script.statements, root, span);
        rebase(&mut detached, root);
        list_mut(&mut self.script.statements, location.parent)
            .ok_or(ScriptError::NotFound(anchor))?
            .insert(position, detached);
        debug!(old, new, root, span, "moved statement");
        Ok(())
    }

    /// Takes the statement carrying `index` out of whichever list holds it.
    fn detach(&mut self, index: usize) -> Result<Statement, ScriptError> {
        let location = locate(&self.script.statements, index).ok_or(ScriptError::NotFound(index))?;
        let list = list_mut(&mut self.script.statements, location.parent)
            .ok_or(ScriptError::NotFound(index))?;
        // Match on the index field; positions may have drifted.
        let position = list
            .iter()
            .position(|s| s.index == index)
            .ok_or(ScriptError::NotFound(index))?;
        Ok(list.remove(position))
    }

    pub fn to_json(&self) -> Result<String, ScriptError> {
        loader::to_json(&self.script)
    }

    /// Writes the script; see [`loader::script_path`] for path rules.
    pub fn save_to_file(&self, path: Option<&Path>) -> Result<PathBuf, ScriptError> {
        loader::save_file(&self.script, path)
    }
}
