use core::fmt;
use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use tracing::warn;

use crate::hasher::content_hash;

/// Application lifecycle hooks every plugin node starts with, in output order.
pub const APPLICATION_HOOKS: [&str; 16] = [
    "onRequest",
    "preParsing",
    "preValidation",
    "preHandler",
    "preSerialization",
    "onError",
    "onSend",
    "onResponse",
    "onTimeout",
    "onRequestAbort",
    "onListen",
    "onReady",
    "preClose",
    "onClose",
    "onRoute",
    "onRegister",
];

/// Hooks that can be attached to a single route.
pub const ROUTE_HOOKS: [&str; 10] = [
    "onRequest",
    "preParsing",
    "preValidation",
    "preHandler",
    "preSerialization",
    "onError",
    "onSend",
    "onResponse",
    "onTimeout",
    "onRequestAbort",
];

pub type DecoratorMap = IndexMap<String, Vec<DecoratorNode>>;
pub type HookMap = IndexMap<String, Vec<HookNode>>;

/// Call site of a declaration.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl Location {
    #[must_use]
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// Location of the caller, following `#[track_caller]` frames.
    #[must_use]
    #[track_caller]
    pub fn caller() -> Self {
        Self::from(std::panic::Location::caller())
    }
}

impl From<&std::panic::Location<'_>> for Location {
    fn from(location: &std::panic::Location<'_>) -> Self {
        Self::new(location.file(), location.line(), location.column())
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// The three decorator categories a host exposes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum DecoratorKind {
    Decorate,
    DecorateRequest,
    DecorateReply,
}

impl DecoratorKind {
    pub const ALL: [DecoratorKind; 3] = [
        DecoratorKind::Decorate,
        DecoratorKind::DecorateRequest,
        DecoratorKind::DecorateReply,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DecoratorKind::Decorate => "decorate",
            DecoratorKind::DecorateRequest => "decorateRequest",
            DecoratorKind::DecorateReply => "decorateReply",
        }
    }
}

impl Display for DecoratorKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One registered plugin instance and everything declared directly on it.
///
/// Collections are `None` only in filtered output, where empty ones may be
/// pruned. Nodes coming out of the builder always have them populated.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct PluginNode {
    pub id: u32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<PluginNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decorators: Option<DecoratorMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hooks: Option<HookMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routes: Option<Vec<RouteNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Location>,
}

impl PluginNode {
    /// Creates a node with no children or routes, the standard decorator
    /// categories, and every application hook, all empty.
    #[must_use]
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        let decorators = DecoratorKind::ALL
            .iter()
            .map(|kind| (kind.as_str().to_string(), Vec::new()))
            .collect();
        Self {
            id,
            name: name.into(),
            children: Some(Vec::new()),
            decorators: Some(decorators),
            hooks: Some(empty_hooks(&APPLICATION_HOOKS)),
            routes: Some(Vec::new()),
            source: None,
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: Option<Location>) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub fn children(&self) -> &[PluginNode] {
        self.children.as_deref().unwrap_or_default()
    }

    #[must_use]
    pub fn routes(&self) -> &[RouteNode] {
        self.routes.as_deref().unwrap_or_default()
    }

    /// Decorators of one category, empty when the category is absent.
    #[must_use]
    pub fn decorators(&self, category: &str) -> &[DecoratorNode] {
        self.decorators
            .as_ref()
            .and_then(|decorators| decorators.get(category))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Hooks registered under one lifecycle name, empty when absent.
    #[must_use]
    pub fn hooks(&self, hook_name: &str) -> &[HookNode] {
        self.hooks
            .as_ref()
            .and_then(|hooks| hooks.get(hook_name))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Depth-first iterator over this node and all of its descendants.
    pub fn descendants(&self) -> impl Iterator<Item = &PluginNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children().iter().rev());
            Some(node)
        })
    }
}

/// One decoration call. Repeated names are kept as separate entries.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct DecoratorNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Location>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DecoratorNode {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: None,
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: Option<Location>) -> Self {
        self.source = source;
        self
    }

    /// Merges user-supplied fields into the node.
    ///
    /// `name` and `source` overwrite the built-in fields; a value of the
    /// wrong shape is dropped with a warning. Other keys land in `extra`.
    pub fn merge_fields(&mut self, fields: Map<String, Value>) {
        for (key, value) in fields {
            match key.as_str() {
                "name" => assign(&mut self.name, &key, value),
                "source" => assign(&mut self.source, &key, value),
                _ => {
                    self.extra.insert(key, value);
                }
            }
        }
    }
}

/// A hook callback identified by the digest of its source text.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct HookNode {
    pub name: String,
    pub hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Location>,
}

impl HookNode {
    #[must_use]
    pub fn from_definition(definition: HookDefinition) -> Self {
        let hash = definition
            .source_text
            .as_deref()
            .map(content_hash)
            .unwrap_or_default();
        Self {
            name: definition.name,
            hash,
            source: definition.location,
        }
    }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct RouteNode {
    pub method: String,
    pub url: String,
    pub prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hooks: Option<HookMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Location>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RouteNode {
    /// Builds a route node, hashing every route-level hook.
    ///
    /// Route hooks that carry no location of their own are attributed to the
    /// route's location.
    #[must_use]
    pub fn from_definition(definition: RouteDefinition, location: Option<Location>) -> Self {
        let mut hooks = empty_hooks(&ROUTE_HOOKS);
        for (hook_name, definitions) in definition.hooks {
            let entries = hooks.entry(hook_name).or_default();
            for mut hook in definitions {
                if hook.location.is_none() {
                    hook.location.clone_from(&location);
                }
                entries.push(HookNode::from_definition(hook));
            }
        }
        let mut route = Self {
            method: definition.method,
            url: definition.url,
            prefix: definition.prefix,
            hooks: Some(hooks),
            source: location,
            extra: Map::new(),
        };
        route.merge_fields(definition.extra);
        route
    }

    /// Merges user-supplied fields into the node, with the same rules as
    /// [`DecoratorNode::merge_fields`] applied to every built-in route field.
    pub fn merge_fields(&mut self, fields: Map<String, Value>) {
        for (key, value) in fields {
            match key.as_str() {
                "method" => assign(&mut self.method, &key, value),
                "url" => assign(&mut self.url, &key, value),
                "prefix" => assign(&mut self.prefix, &key, value),
                "hooks" => assign(&mut self.hooks, &key, value),
                "source" => assign(&mut self.source, &key, value),
                _ => {
                    self.extra.insert(key, value);
                }
            }
        }
    }

    /// Route-level hooks registered under one lifecycle name.
    #[must_use]
    pub fn hooks(&self, hook_name: &str) -> &[HookNode] {
        self.hooks
            .as_ref()
            .and_then(|hooks| hooks.get(hook_name))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// A hook as reported by the host: its binding name and, when available,
/// its source text.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct HookDefinition {
    pub name: String,
    pub source_text: Option<String>,
    pub location: Option<Location>,
}

impl HookDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>, source_text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_text: Some(source_text.into()),
            location: None,
        }
    }

    /// A hook whose source text could not be obtained. Its node gets an
    /// empty hash.
    #[must_use]
    pub fn opaque(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_text: None,
            location: None,
        }
    }

    #[must_use]
    pub fn with_location(mut self, location: Option<Location>) -> Self {
        self.location = location;
        self
    }
}

/// A route as reported by the host.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct RouteDefinition {
    pub method: String,
    pub url: String,
    pub prefix: String,
    pub hooks: IndexMap<String, Vec<HookDefinition>>,
    /// User-defined fields merged into the route node. Keys naming a
    /// built-in field overwrite it.
    pub extra: Map<String, Value>,
}

impl RouteDefinition {
    #[must_use]
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_hook(mut self, hook_name: impl Into<String>, hook: HookDefinition) -> Self {
        self.hooks.entry(hook_name.into()).or_default().push(hook);
        self
    }
}

fn assign<T: DeserializeOwned>(field: &mut T, key: &str, value: Value) {
    match serde_json::from_value(value) {
        Ok(parsed) => *field = parsed,
        Err(error) => warn!(field = key, %error, "dropping user field that does not fit the built-in one"),
    }
}

fn empty_hooks(names: &[&str]) -> HookMap {
    names
        .iter()
        .map(|name| ((*name).to_string(), Vec::new()))
        .collect()
}
