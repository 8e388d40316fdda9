#![warn(clippy::pedantic)]
//! Node records and the event-driven tree builder for application overviews.
//!
//! A host application is composed of nested plugin instances. Each instance can
//! declare decorators, lifecycle hooks, and routes. The [`builder::TreeBuilder`]
//! receives one notification per declaration and grows a [`nodes::PluginNode`]
//! tree; once the host reports readiness the tree is sealed into an immutable
//! snapshot shared behind an `Arc`.
//!
//! ```rust
//! use app_overview_tree::builder::TreeBuilder;
//! use app_overview_tree::nodes::{DecoratorNode, HookDefinition};
//!
//! let mut builder = TreeBuilder::new();
//! let root = builder.instance_created(None, "root", None)?;
//! let child = builder.instance_created(Some(root), "auth", None)?;
//! builder.decorator_added(child, "decorate", DecoratorNode::new("user"))?;
//! builder.hook_added(child, "onRequest", HookDefinition::new("check", "function check () {}"))?;
//! builder.finalize(root)?;
//!
//! let snapshot = builder.snapshot()?;
//! assert_eq!(snapshot.children()[0].name, "auth");
//! # Ok::<(), app_overview_tree::errors::BuildError>(())
//! ```

pub mod builder;
pub mod errors;
pub mod hasher;
pub mod identity;
pub mod nodes;
