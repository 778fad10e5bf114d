//! Input classification and the built-in verbs available from every menu.

use std::collections::HashMap;

use crate::core::event::Effect;
use crate::core::tree::{MenuTree, Node, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Up,
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    Navigable,
    Invocable,
}

/// Menus are always navigable, commands always invocable.
pub fn classify(node: &Node) -> Class {
    if node.is_menu() {
        Class::Navigable
    } else {
        Class::Invocable
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Builtin(Builtin),
    Navigate(NodeId),
    Invoke(NodeId),
    NotFound,
}

/// What a built-in did: where the session now sits and what to print.
#[derive(Debug)]
pub struct Outcome {
    pub position: NodeId,
    pub effects: Vec<Effect>,
    pub quit: bool,
}

pub struct Dispatcher {
    builtins: HashMap<&'static str, Builtin>,
}

impl Dispatcher {
    pub fn new() -> Self {
        let builtins = HashMap::from([
            ("up", Builtin::Up),
            ("..", Builtin::Up),
            ("help", Builtin::Help),
            ("quit", Builtin::Quit),
            ("exit", Builtin::Quit),
        ]);
        Self { builtins }
    }

    pub fn builtin(&self, token: &str) -> Option<Builtin> {
        self.builtins.get(token.to_lowercase().as_str()).copied()
    }

    /// Built-ins first, then the children of `position`.
    pub fn resolve(&self, tree: &MenuTree, position: NodeId, token: &str) -> Resolution {
        if let Some(builtin) = self.builtin(token) {
            tracing::debug!(token, ?builtin, "resolved built-in");
            return Resolution::Builtin(builtin);
        }

        match tree.resolve_child(position, token) {
            Some(child) => match classify(tree.node(child)) {
                Class::Navigable => Resolution::Navigate(child),
                Class::Invocable => Resolution::Invoke(child),
            },
            None => Resolution::NotFound,
        }
    }

    pub fn execute(&self, builtin: Builtin, tree: &MenuTree, position: NodeId) -> Outcome {
        match builtin {
            Builtin::Up => match tree.parent(position) {
                Some(parent) => Outcome {
                    position: parent,
                    effects: vec![Effect::println(tree.path(parent))],
                    quit: false,
                },
                // already at the root
                None => Outcome {
                    position,
                    effects: Vec::new(),
                    quit: false,
                },
            },
            Builtin::Help => Outcome {
                position,
                effects: vec![Effect::Listing(tree.list_children(position).to_vec())],
                quit: false,
            },
            Builtin::Quit => Outcome {
                position,
                effects: vec![Effect::Farewell],
                quit: true,
            },
        }
    }

    /// Nodes whose names collide with a built-in and so can never be typed.
    pub fn shadowed(&self, tree: &MenuTree) -> Vec<NodeId> {
        tree.walk()
            .into_iter()
            .filter(|id| *id != tree.root())
            .filter(|id| self.builtin(tree.name(*id)).is_some())
            .collect()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
