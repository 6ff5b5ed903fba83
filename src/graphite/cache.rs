//! Graphite's persisted branch cache

use crate::error::{Error, Result};
use crate::types::BranchNode;
use serde::Deserialize;
use std::collections::HashMap;

/// File name under the git common dir
pub(crate) const CACHE_FILE: &str = ".graphite_cache_persist";

const TRUNK_MARKER: &str = "TRUNK";

#[derive(Debug, Deserialize)]
struct CacheFile {
    #[serde(default)]
    branches: Vec<(String, CachedBranch)>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CachedBranch {
    parent_branch_name: Option<String>,
    branch_revision: Option<String>,
    #[serde(default)]
    children: Vec<String>,
    validation_result: Option<String>,
}

/// Parse the cache JSON into branch nodes.
///
/// Children missing from a branch's recorded list but pointing at it as
/// parent are appended, so parent and child links always agree.
pub fn parse_branch_cache(json: &str) -> Result<HashMap<String, BranchNode>> {
    let cache: CacheFile = serde_json::from_str(json)
        .map_err(|e| Error::Parse(format!("invalid Graphite cache: {e}")))?;

    let mut nodes: HashMap<String, BranchNode> = cache
        .branches
        .into_iter()
        .map(|(name, entry)| {
            let is_trunk = entry.validation_result.as_deref() == Some(TRUNK_MARKER);
            let node = BranchNode {
                name: name.clone(),
                parent: if is_trunk {
                    None
                } else {
                    entry.parent_branch_name
                },
                children: entry.children,
                is_trunk,
                commit_sha: entry.branch_revision,
            };
            (name, node)
        })
        .collect();

    let links: Vec<(String, String)> = nodes
        .values()
        .filter_map(|n| n.parent.clone().map(|p| (p, n.name.clone())))
        .collect();
    for (parent, child) in links {
        if let Some(node) = nodes.get_mut(&parent) {
            if !node.children.contains(&child) {
                node.children.push(child);
            }
        }
    }
    for node in nodes.values_mut() {
        node.children.retain(|c| c != &node.name);
    }

    Ok(nodes)
}
