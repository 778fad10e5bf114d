//! The menu tree and path resolution.
//!
//! Nodes live in a petgraph arena and are addressed by `NodeId`. Edges run
//! from parent to child. The tree is static once built, so the child listing
//! and the root-to-node path of every node are computed on first request and
//! kept for the lifetime of the tree.

use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use crate::core::error::{ShellError, TreeError};
use crate::core::input::InputBuffer;
use crate::core::leaf::{LeafFactory, LeafRegistry};

pub type NodeId = NodeIndex;

pub const PATH_SEPARATOR: &str = "/";

/// Declarative description of a tree, consumed once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NodeSpec {
    Menu {
        name: String,
        #[serde(default)]
        children: Vec<NodeSpec>,
    },
    Command {
        name: String,
        leaf: String,
    },
}

impl NodeSpec {
    pub fn menu(name: &str, children: Vec<NodeSpec>) -> Self {
        NodeSpec::Menu {
            name: name.to_string(),
            children,
        }
    }

    pub fn command(name: &str, leaf: &str) -> Self {
        NodeSpec::Command {
            name: name.to_string(),
            leaf: leaf.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            NodeSpec::Menu { name, .. } | NodeSpec::Command { name, .. } => name,
        }
    }
}

pub enum NodeKind {
    /// Children keyed by lowercased name.
    Menu { children: HashMap<String, NodeId> },
    Command { leaf: LeafFactory },
}

pub struct Node {
    name: String,
    kind: NodeKind,
    listing: OnceCell<Vec<String>>,
    path: OnceCell<String>,
}

impl Node {
    fn new(name: &str, kind: NodeKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            listing: OnceCell::new(),
            path: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn is_menu(&self) -> bool {
        matches!(self.kind, NodeKind::Menu { .. })
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            NodeKind::Menu { .. } => "menu",
            NodeKind::Command { .. } => "command",
        };
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("kind", &kind)
            .finish()
    }
}

pub struct MenuTree {
    graph: DiGraph<Node, ()>,
    root: NodeId,
}

impl MenuTree {
    pub fn build(spec: &NodeSpec, registry: &LeafRegistry) -> Result<Self, TreeError> {
        if let NodeSpec::Command { name, .. } = spec {
            return Err(TreeError::RootNotMenu { name: name.clone() });
        }

        let mut graph = DiGraph::new();
        let prompt = InputBuffer::new();
        let root = insert(&mut graph, spec, None, registry, &prompt)?;
        tracing::debug!(nodes = graph.node_count(), "menu tree built");
        Ok(Self { graph, root })
    }

    pub fn from_json(json: &str, registry: &LeafRegistry) -> Result<Self, TreeError> {
        let spec: NodeSpec = serde_json::from_str(json)?;
        Self::build(&spec, registry)
    }

    pub fn load(path: &Path, registry: &LeafRegistry) -> Result<Self, ShellError> {
        let content = fs::read_to_string(path)?;
        Ok(Self::from_json(&content, registry)?)
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.graph[id]
    }

    pub fn name(&self, id: NodeId) -> &str {
        self.graph[id].name()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.graph
            .neighbors_directed(id, Direction::Incoming)
            .next()
    }

    /// Case-insensitive exact match against the children of `menu`.
    /// No prefixes, no globbing.
    pub fn resolve_child(&self, menu: NodeId, token: &str) -> Option<NodeId> {
        match &self.graph[menu].kind {
            NodeKind::Menu { children } => children.get(&token.to_lowercase()).copied(),
            NodeKind::Command { .. } => None,
        }
    }

    /// Submenu and command names under `menu`, sorted as one list.
    pub fn list_children(&self, menu: NodeId) -> &[String] {
        self.graph[menu].listing.get_or_init(|| {
            let mut names: Vec<String> = self
                .graph
                .neighbors_directed(menu, Direction::Outgoing)
                .map(|child| self.graph[child].name.clone())
                .collect();
            names.sort();
            names
        })
    }

    /// Names from the root down to `id`, joined by `/`.
    pub fn path(&self, id: NodeId) -> &str {
        self.graph[id].path.get_or_init(|| {
            let mut names = Vec::new();
            let mut cur = Some(id);
            while let Some(node) = cur {
                names.push(self.graph[node].name.as_str());
                cur = self.parent(node);
            }
            names.reverse();
            names.join(PATH_SEPARATOR)
        })
    }

    /// Every node, parents before children.
    pub fn walk(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.graph.node_count());
        let mut dfs = Dfs::new(&self.graph, self.root);
        while let Some(id) = dfs.next(&self.graph) {
            order.push(id);
        }
        order
    }
}

fn insert(
    graph: &mut DiGraph<Node, ()>,
    spec: &NodeSpec,
    parent: Option<NodeId>,
    registry: &LeafRegistry,
    prompt: &InputBuffer,
) -> Result<NodeId, TreeError> {
    let name = spec.name().trim();
    if name.is_empty() {
        let parent = parent
            .map(|p| graph[p].name.clone())
            .unwrap_or_default();
        return Err(TreeError::EmptyName { parent });
    }
    // the root is never typed, everything below it must pass the prompt
    if let Some(p) = parent {
        if prompt.validate(name).is_err() {
            return Err(TreeError::UntypeableName {
                parent: graph[p].name.clone(),
                name: name.to_string(),
            });
        }
    }

    let kind = match spec {
        NodeSpec::Menu { .. } => NodeKind::Menu {
            children: HashMap::new(),
        },
        NodeSpec::Command { leaf, .. } => {
            let factory = registry.get(leaf).ok_or_else(|| TreeError::UnknownLeaf {
                command: name.to_string(),
                leaf: leaf.clone(),
            })?;
            NodeKind::Command { leaf: factory }
        }
    };

    let id = graph.add_node(Node::new(name, kind));

    if let Some(parent) = parent {
        let key = name.to_lowercase();
        let parent_name = graph[parent].name.clone();
        match &mut graph[parent].kind {
            NodeKind::Menu { children } => {
                if children.contains_key(&key) {
                    return Err(TreeError::DuplicateChild {
                        parent: parent_name,
                        name: name.to_string(),
                    });
                }
                children.insert(key, id);
            }
            NodeKind::Command { .. } => unreachable!("commands never receive children"),
        }
        graph.add_edge(parent, id, ());
    }

    if let NodeSpec::Menu { children, .. } = spec {
        for child in children {
            insert(graph, child, Some(id), registry, prompt)?;
        }
    }

    Ok(id)
}
