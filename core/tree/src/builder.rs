//! Event-driven builder that assembles the overview tree.
//!
//! The host reports each declaration as it happens: instance creation,
//! decorators, hooks, and routes. Every notification names its target
//! instance by the [`Token`] returned from [`TreeBuilder::instance_created`],
//! so no state is attached to host objects.
//!
//! # Lifecycle
//!
//! The builder has two phases:
//!
//! - **Building**: nodes live in a flat token map together with the ordered
//!   list of their child tokens. Every collection is append-only.
//! - **Ready**: [`TreeBuilder::finalize`] assembles the tree from the root,
//!   publishes it as an `Arc<PluginNode>`, and drops the token map.
//!
//! Once ready, mutating notifications return [`BuildError::AlreadyFinalized`]
//! and leave the snapshot untouched. A second `finalize` is a no-op.
//!
//! Nodes whose registration was abandoned by the host are never removed; if
//! they are reachable from the root they appear in the snapshot.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::{
    errors::BuildError,
    identity::{Token, TokenAllocator},
    nodes::{DecoratorNode, HookDefinition, HookNode, Location, PluginNode, RouteDefinition, RouteNode},
};

struct NodeEntry {
    node: PluginNode,
    children: Vec<Token>,
}

enum BuildState {
    Building {
        nodes: FxHashMap<Token, NodeEntry>,
        root: Option<Token>,
    },
    Ready(Arc<PluginNode>),
}

pub struct TreeBuilder {
    tokens: TokenAllocator,
    state: BuildState,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        TreeBuilder::new()
    }
}

impl TreeBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tokens: TokenAllocator::new(),
            state: BuildState::Building {
                nodes: FxHashMap::default(),
                root: None,
            },
        }
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self.state, BuildState::Ready(_))
    }

    /// The most recent instance created without a parent, while building.
    #[must_use]
    pub fn root_token(&self) -> Option<Token> {
        match &self.state {
            BuildState::Building { root, .. } => *root,
            BuildState::Ready(_) => None,
        }
    }

    /// Records a new instance and returns its token.
    ///
    /// With a parent, the node is appended to the parent's children. Without
    /// one, it becomes the provisional root.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UnknownToken`] if `parent` was not issued by this
    /// builder, [`BuildError::TokensExhausted`] when no token is left, and
    /// [`BuildError::AlreadyFinalized`] after finalize.
    pub fn instance_created(
        &mut self,
        parent: Option<Token>,
        name: impl Into<String>,
        location: Option<Location>,
    ) -> Result<Token, BuildError> {
        let BuildState::Building { nodes, root } = &mut self.state else {
            return Err(rejected("instance_created"));
        };
        if let Some(parent) = parent {
            if !nodes.contains_key(&parent) {
                return Err(BuildError::UnknownToken(parent));
            }
        }

        let token = self.tokens.allocate().ok_or(BuildError::TokensExhausted)?;
        let node = PluginNode::new(token.value(), name).with_source(location);
        debug!(token = %token, parent = ?parent, name = %node.name, "instance created");
        nodes.insert(
            token,
            NodeEntry {
                node,
                children: Vec::new(),
            },
        );
        match parent.and_then(|parent| nodes.get_mut(&parent)) {
            Some(parent_entry) => parent_entry.children.push(token),
            None => *root = Some(token),
        }
        Ok(token)
    }

    /// Appends a decorator under `category`, creating the category on first
    /// use. Repeated names are not deduplicated.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UnknownToken`] or [`BuildError::AlreadyFinalized`].
    pub fn decorator_added(
        &mut self,
        token: Token,
        category: impl Into<String>,
        decorator: DecoratorNode,
    ) -> Result<(), BuildError> {
        let node = self.node_mut(token, "decorator_added")?;
        node.decorators
            .get_or_insert_with(Default::default)
            .entry(category.into())
            .or_default()
            .push(decorator);
        Ok(())
    }

    /// Hashes the hook's source text and appends it under `hook_name`.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UnknownToken`] or [`BuildError::AlreadyFinalized`].
    pub fn hook_added(
        &mut self,
        token: Token,
        hook_name: impl Into<String>,
        hook: HookDefinition,
    ) -> Result<(), BuildError> {
        let node = self.node_mut(token, "hook_added")?;
        node.hooks
            .get_or_insert_with(Default::default)
            .entry(hook_name.into())
            .or_default()
            .push(HookNode::from_definition(hook));
        Ok(())
    }

    /// Appends a route, hashing its route-level hooks.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UnknownToken`] or [`BuildError::AlreadyFinalized`].
    pub fn route_added(
        &mut self,
        token: Token,
        route: RouteDefinition,
        location: Option<Location>,
    ) -> Result<(), BuildError> {
        let node = self.node_mut(token, "route_added")?;
        node.routes
            .get_or_insert_with(Vec::new)
            .push(RouteNode::from_definition(route, location));
        Ok(())
    }

    /// Seals the tree rooted at `root` and discards all construction state.
    ///
    /// Calling it again once ready does nothing.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::UnknownToken`] if `root` is not a known instance;
    /// the builder then stays in the building phase.
    pub fn finalize(&mut self, root: Token) -> Result<(), BuildError> {
        let mut nodes = match &mut self.state {
            BuildState::Ready(_) => {
                warn!(root = %root, "finalize called more than once; keeping the published snapshot");
                return Ok(());
            }
            BuildState::Building { nodes, .. } => {
                if !nodes.contains_key(&root) {
                    return Err(BuildError::UnknownToken(root));
                }
                std::mem::take(nodes)
            }
        };

        let snapshot = assemble(&mut nodes, root).ok_or(BuildError::UnknownToken(root))?;
        debug!(
            root = %root,
            discarded = nodes.len(),
            "overview finalized"
        );
        self.state = BuildState::Ready(Arc::new(snapshot));
        Ok(())
    }

    /// The published snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::NotReady`] until [`TreeBuilder::finalize`] succeeds.
    pub fn snapshot(&self) -> Result<Arc<PluginNode>, BuildError> {
        match &self.state {
            BuildState::Ready(snapshot) => Ok(Arc::clone(snapshot)),
            BuildState::Building { .. } => Err(BuildError::NotReady),
        }
    }

    fn node_mut(
        &mut self,
        token: Token,
        operation: &'static str,
    ) -> Result<&mut PluginNode, BuildError> {
        match &mut self.state {
            BuildState::Building { nodes, .. } => nodes
                .get_mut(&token)
                .map(|entry| &mut entry.node)
                .ok_or(BuildError::UnknownToken(token)),
            BuildState::Ready(_) => Err(rejected(operation)),
        }
    }
}

fn rejected(operation: &'static str) -> BuildError {
    warn!(operation, "notification received after finalize; ignoring it");
    BuildError::AlreadyFinalized { operation }
}

/// Moves the node at `token` and its descendants out of `nodes` into an
/// owned tree, keeping child registration order.
fn assemble(nodes: &mut FxHashMap<Token, NodeEntry>, token: Token) -> Option<PluginNode> {
    let NodeEntry { mut node, children } = nodes.remove(&token)?;
    let children = children
        .into_iter()
        .filter_map(|child| assemble(nodes, child))
        .collect();
    node.children = Some(children);
    Some(node)
}
