//! Category tree resolution.
//!
//! The backend lists categories flat, each record pointing at its parent.
//! [`CategoryMap`] turns that listing into an adjacency map with ordered
//! children, and the free functions here read it: child lookup for the tree
//! view, breadcrumb derivation for a selected node, and a depth-first
//! subtree for rendering. Every walk carries a visited set, so a cyclic
//! listing fails with [`AdminError::MalformedHierarchy`] instead of looping.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::error::{AdminError, Result};
use crate::notice::Notice;

/// Sentinel key for the implicit root of the tree.
pub const ROOT_KEY: &str = "Home";

/// A category with its ordered child ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryNode {
    pub id: String,
    pub parent_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub slug: String,
}

/// Category as returned by `GET /categories`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default, rename = "createdAt")]
    pub created_at: Option<String>,
}

/// Adjacency map of the category tree.
///
/// Populated once from a backend listing and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct CategoryMap {
    nodes: HashMap<String, CategoryNode>,
    roots: Vec<String>,
}

impl CategoryMap {
    /// Build the map from a flat listing.
    ///
    /// Children keep listing order. A record whose parent is absent from the
    /// listing is kept in the map but attached nowhere.
    pub fn from_records(records: Vec<CategoryRecord>) -> Self {
        let mut nodes: HashMap<String, CategoryNode> = HashMap::with_capacity(records.len());
        let mut order = Vec::with_capacity(records.len());

        for record in records {
            // Some listings send an empty string instead of null.
            let parent_id = record.parent_id.filter(|p| !p.is_empty());
            order.push((record.id.clone(), parent_id.clone()));
            nodes.insert(
                record.id.clone(),
                CategoryNode {
                    id: record.id,
                    parent_id,
                    title: record.title,
                    children: Vec::new(),
                    slug: record.slug,
                },
            );
        }

        let mut roots = Vec::new();
        for (id, parent_id) in order {
            match parent_id {
                None => roots.push(id),
                Some(parent) => match nodes.get_mut(&parent) {
                    Some(parent_node) => parent_node.children.push(id),
                    None => log::warn!("category {} references unknown parent {}", id, parent),
                },
            }
        }

        CategoryMap { nodes, roots }
    }

    /// Build the map from nodes that already carry their children.
    ///
    /// Roots are the parentless nodes, in input order.
    pub fn from_nodes(nodes: Vec<CategoryNode>) -> Self {
        let roots = nodes
            .iter()
            .filter(|node| node.parent_id.is_none())
            .map(|node| node.id.clone())
            .collect();
        let nodes = nodes
            .into_iter()
            .map(|node| (node.id.clone(), node))
            .collect();

        CategoryMap { nodes, roots }
    }

    pub fn get(&self, id: &str) -> Option<&CategoryNode> {
        self.nodes.get(id)
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Check that the children references form a tree under the root.
    ///
    /// Every child reference must resolve and agree with the child's
    /// `parent_id`, every non-root node must be claimed exactly once, and
    /// every node must be reachable from the root.
    pub fn validate(&self) -> Result<()> {
        let malformed = |id: &str| AdminError::MalformedHierarchy {
            node_id: id.to_string(),
        };

        let mut claims: HashMap<&str, usize> = HashMap::with_capacity(self.nodes.len());
        for node in self.nodes.values() {
            for child_id in &node.children {
                let child = self.nodes.get(child_id).ok_or_else(|| malformed(&node.id))?;
                if child.parent_id.as_deref() != Some(node.id.as_str()) {
                    return Err(malformed(child_id));
                }
                *claims.entry(child_id.as_str()).or_default() += 1;
            }
        }

        for node in self.nodes.values() {
            let claimed = claims.get(node.id.as_str()).copied().unwrap_or(0);
            let expected = usize::from(node.parent_id.is_some());
            if claimed != expected {
                return Err(malformed(&node.id));
            }
        }

        for root in &self.roots {
            match self.nodes.get(root) {
                Some(node) if node.parent_id.is_none() => {}
                _ => return Err(malformed(root)),
            }
        }

        let rows = subtree(self, ROOT_KEY)?;
        if rows.len() != self.nodes.len() {
            let seen: HashSet<&str> = rows.iter().map(|row| row.node_id.as_str()).collect();
            if let Some(stray) = self.nodes.keys().find(|id| !seen.contains(id.as_str())) {
                return Err(malformed(stray));
            }
        }

        Ok(())
    }
}

/// Ordered children of a node.
///
/// `ROOT_KEY` yields the top-level categories. An unknown id yields nothing;
/// the tree view simply renders no children under it.
pub fn resolve_children<'a>(categories: &'a CategoryMap, node_id: &str) -> Vec<&'a CategoryNode> {
    let ids = if node_id == ROOT_KEY {
        &categories.roots
    } else {
        match categories.nodes.get(node_id) {
            Some(node) => &node.children,
            None => return Vec::new(),
        }
    };

    ids.iter().filter_map(|id| categories.nodes.get(id)).collect()
}

/// Titles from the root down to `node_id`, inclusive.
///
/// The walk follows `parent_id` until it hits a parentless node or an id
/// missing from the map. The root sentinel and unknown ids give an empty
/// path.
pub fn generate_breadcrumbs(node_id: &str, categories: &CategoryMap) -> Result<Vec<String>> {
    if node_id == ROOT_KEY {
        return Ok(Vec::new());
    }

    let mut path = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut current = Some(node_id);

    while let Some(id) = current {
        let Some(node) = categories.nodes.get(id) else {
            break;
        };
        if !visited.insert(id) {
            return Err(AdminError::MalformedHierarchy {
                node_id: id.to_string(),
            });
        }
        path.push(node.title.clone());
        current = node.parent_id.as_deref();
    }

    path.reverse();
    Ok(path)
}

/// One line of the rendered tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeRow {
    pub node_id: String,
    pub title: String,
    pub depth: usize,
    pub is_leaf: bool,
}

/// Depth-first rows of every node below `node_id`, excluding the node itself.
pub fn subtree(categories: &CategoryMap, node_id: &str) -> Result<Vec<TreeRow>> {
    let mut rows = Vec::new();
    let mut visited: HashSet<&str> = HashSet::new();
    if node_id != ROOT_KEY {
        visited.insert(node_id);
    }

    let mut stack: Vec<(&CategoryNode, usize)> = resolve_children(categories, node_id)
        .into_iter()
        .rev()
        .map(|node| (node, 0))
        .collect();

    while let Some((node, depth)) = stack.pop() {
        if !visited.insert(node.id.as_str()) {
            return Err(AdminError::MalformedHierarchy {
                node_id: node.id.clone(),
            });
        }

        let children = resolve_children(categories, &node.id);
        rows.push(TreeRow {
            node_id: node.id.clone(),
            title: node.title.clone(),
            depth,
            is_leaf: children.is_empty(),
        });
        stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
    }

    Ok(rows)
}

/// The node currently highlighted in the tree view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySelection {
    pub title: Option<String>,
    pub node_id: Option<String>,
}

impl CategorySelection {
    pub fn of(node: &CategoryNode) -> Self {
        CategorySelection {
            title: Some(node.title.clone()),
            node_id: Some(node.id.clone()),
        }
    }
}

/// A category attached to a product, with its path for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedCategory {
    pub node_id: String,
    pub title: String,
    pub breadcrumbs: Vec<String>,
}

/// Tree picker state: the highlighted node and the attached categories.
#[derive(Debug, Clone, Default)]
pub struct CategoryPicker {
    highlighted: CategorySelection,
    selected: Vec<SelectedCategory>,
}

impl CategoryPicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_selected(selected: Vec<SelectedCategory>) -> Self {
        CategoryPicker {
            highlighted: CategorySelection::default(),
            selected,
        }
    }

    pub fn highlight(&mut self, node: &CategoryNode) {
        self.highlighted = CategorySelection::of(node);
    }

    /// Highlight an arbitrary selection, including an empty one.
    pub fn set_highlight(&mut self, selection: CategorySelection) {
        self.highlighted = selection;
    }

    pub fn clear_highlight(&mut self) {
        self.highlighted = CategorySelection::default();
    }

    pub fn highlighted(&self) -> &CategorySelection {
        &self.highlighted
    }

    pub fn selected(&self) -> &[SelectedCategory] {
        &self.selected
    }

    /// Attach the highlighted node to the selection list.
    ///
    /// Only real nodes of `categories` can be attached: no highlight, the
    /// root sentinel and ids missing from the map all ask for another
    /// category. Rejections leave both the highlight and the list untouched.
    pub fn attach(&mut self, categories: &CategoryMap) -> std::result::Result<&SelectedCategory, Notice> {
        let node = match self.highlighted.node_id.as_deref() {
            Some(id) if id != ROOT_KEY => categories.get(id),
            _ => None,
        };
        let Some(node) = node else {
            return Err(Notice::ChooseAnotherCategory);
        };
        let node_id = node.id.clone();
        let title = node.title.clone();

        if self.selected.iter().any(|s| s.title == title) {
            log::debug!("category {} already attached", title);
            return Err(Notice::AlreadySelected { title });
        }

        let breadcrumbs = generate_breadcrumbs(&node_id, categories).map_err(|_| {
            log::warn!("breadcrumb walk for {} hit a cycle", node_id);
            Notice::MalformedHierarchy {
                node_id: node_id.clone(),
            }
        })?;

        self.selected.push(SelectedCategory {
            node_id,
            title,
            breadcrumbs,
        });
        self.highlighted = CategorySelection::default();

        Ok(&self.selected[self.selected.len() - 1])
    }

    /// Detach a category. Returns whether anything was removed.
    pub fn remove(&mut self, node_id: &str) -> bool {
        let before = self.selected.len();
        self.selected.retain(|s| s.node_id != node_id);
        self.selected.len() != before
    }
}
