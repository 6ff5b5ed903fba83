//! Read-only view of the branch tree
//!
//! Rebuilt from Graphite's metadata on every load. Nothing here mutates the
//! tree; restack, squash and submit go through [`crate::graphite::StackTool`].

use crate::error::Result;
use crate::graphite::StackTool;
use crate::types::BranchNode;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;

/// Branch tree inconsistency. Surfaced to the caller, never repaired.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    /// A non-trunk branch has no parent
    #[error("branch '{0}' has no parent and is not trunk")]
    Orphan(String),
    /// A branch names a parent Graphite does not track
    #[error("branch '{branch}' has untracked parent '{parent}'")]
    MissingParent {
        /// Branch whose parent is missing
        branch: String,
        /// The missing parent
        parent: String,
    },
    /// Following parents loops back on itself
    #[error("parent chain of '{0}' contains a cycle")]
    Cycle(String),
}

/// Snapshot of every tracked branch
#[derive(Debug, Clone, Default)]
pub struct StackView {
    branches: HashMap<String, BranchNode>,
}

impl StackView {
    /// Load a fresh snapshot from the stack tool
    pub async fn load(tool: &dyn StackTool, cwd: &Path) -> Result<Self> {
        Ok(Self::from_branches(tool.all_branches(cwd).await?))
    }

    /// Wrap already-loaded branch metadata
    pub const fn from_branches(branches: HashMap<String, BranchNode>) -> Self {
        Self { branches }
    }

    /// Every tracked branch, keyed by name
    pub const fn get_all_branches(&self) -> &HashMap<String, BranchNode> {
        &self.branches
    }

    /// Whether Graphite tracks `branch`
    pub fn is_tracked(&self, branch: &str) -> bool {
        self.branches.contains_key(branch)
    }

    /// Whether `branch` is the trunk
    pub fn is_trunk(&self, branch: &str) -> bool {
        self.branches.get(branch).is_some_and(|n| n.is_trunk)
    }

    /// Parent of `branch`, if tracked and not trunk
    pub fn get_parent(&self, branch: &str) -> Option<&str> {
        self.branches.get(branch)?.parent.as_deref()
    }

    /// Branches from trunk to `branch`, inclusive.
    ///
    /// With `include_descendants`, the chain continues upward while each
    /// branch has exactly one child. Returns `Ok(None)` for an untracked
    /// branch.
    pub fn get_stack(
        &self,
        branch: &str,
        include_descendants: bool,
    ) -> std::result::Result<Option<Vec<String>>, IntegrityError> {
        let Some(node) = self.branches.get(branch) else {
            return Ok(None);
        };

        let mut chain = vec![node.name.clone()];
        let mut seen: HashSet<&str> = HashSet::from([node.name.as_str()]);
        let mut current = node;
        while !current.is_trunk {
            let Some(parent_name) = current.parent.as_deref() else {
                return Err(IntegrityError::Orphan(current.name.clone()));
            };
            let Some(parent) = self.branches.get(parent_name) else {
                return Err(IntegrityError::MissingParent {
                    branch: current.name.clone(),
                    parent: parent_name.to_string(),
                });
            };
            if !seen.insert(parent.name.as_str()) {
                return Err(IntegrityError::Cycle(branch.to_string()));
            }
            chain.push(parent.name.clone());
            current = parent;
        }
        chain.reverse();

        if include_descendants {
            let mut tip = node;
            while let [only_child] = tip.children.as_slice() {
                let Some(child) = self.branches.get(only_child) else {
                    break;
                };
                if !seen.insert(child.name.as_str()) {
                    return Err(IntegrityError::Cycle(branch.to_string()));
                }
                chain.push(child.name.clone());
                tip = child;
            }
        }

        Ok(Some(chain))
    }

    /// Every branch above `branch`, parents before children
    pub fn descendants(&self, branch: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut pending: Vec<&str> = self
            .branches
            .get(branch)
            .map(|n| n.children.iter().rev().map(String::as_str).collect())
            .unwrap_or_default();

        while let Some(name) = pending.pop() {
            if name == branch || !seen.insert(name) {
                continue;
            }
            out.push(name.to_string());
            if let Some(node) = self.branches.get(name) {
                pending.extend(node.children.iter().rev().map(String::as_str));
            }
        }
        out
    }
}
