#![warn(clippy::pedantic)]
//! Read-time filtering of overview snapshots.
//!
//! [`filter`] never mutates its input. It walks the tree bottom-up and
//! returns a new tree where:
//!
//! - routes rejected by the routes filter are dropped, at every depth;
//! - with `hide_empty`, empty decorator categories and hook names are
//!   dropped, then the whole `decorators`/`hooks` map if nothing is left
//!   (route-level hooks follow the same rule);
//! - with `hide_empty`, empty `routes` and `children` are omitted.
//!
//! A child is never removed because it is empty itself. `id`, `name`, and
//! `source` are copied unchanged.
//!
//! ```rust
//! use app_overview_filter::{filter, FilterOptions};
//! use app_overview_tree::nodes::PluginNode;
//!
//! let root = PluginNode::new(1, "root");
//! let pruned = filter(&root, &FilterOptions::new().hide_empty(true));
//! assert_eq!(pruned.children, None);
//! assert_eq!(pruned.hooks, None);
//! ```

use std::fmt::{self, Debug, Formatter};

use app_overview_tree::nodes::{PluginNode, RouteNode};
use indexmap::IndexMap;

/// Predicate deciding which routes survive filtering.
pub type RoutesFilter<'a> = dyn Fn(&RouteNode) -> bool + Send + Sync + 'a;

#[derive(Clone, Copy, Default)]
pub struct FilterOptions<'a> {
    pub hide_empty: bool,
    pub routes_filter: Option<&'a RoutesFilter<'a>>,
}

impl<'a> FilterOptions<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn hide_empty(mut self, hide_empty: bool) -> Self {
        self.hide_empty = hide_empty;
        self
    }

    #[must_use]
    pub fn routes_filter(mut self, routes_filter: &'a RoutesFilter<'a>) -> Self {
        self.routes_filter = Some(routes_filter);
        self
    }

    /// True when filtering would return a tree equal to its input.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        !self.hide_empty && self.routes_filter.is_none()
    }
}

impl Debug for FilterOptions<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterOptions")
            .field("hide_empty", &self.hide_empty)
            .field("routes_filter", &self.routes_filter.map(|_| ".."))
            .finish()
    }
}

/// Returns a filtered copy of the tree rooted at `node`.
#[must_use]
pub fn filter(node: &PluginNode, options: &FilterOptions<'_>) -> PluginNode {
    let children = node
        .children
        .as_ref()
        .map(|children| {
            children
                .iter()
                .map(|child| filter(child, options))
                .collect::<Vec<_>>()
        })
        .and_then(|children| keep_list(children, options.hide_empty));

    let routes = node
        .routes
        .as_ref()
        .map(|routes| filter_routes(routes, options))
        .and_then(|routes| keep_list(routes, options.hide_empty));

    PluginNode {
        id: node.id,
        name: node.name.clone(),
        children,
        decorators: node
            .decorators
            .as_ref()
            .and_then(|decorators| prune_groups(decorators, options.hide_empty)),
        hooks: node
            .hooks
            .as_ref()
            .and_then(|hooks| prune_groups(hooks, options.hide_empty)),
        routes,
        source: node.source.clone(),
    }
}

fn filter_routes(routes: &[RouteNode], options: &FilterOptions<'_>) -> Vec<RouteNode> {
    routes
        .iter()
        .filter(|route| options.routes_filter.is_none_or(|keep| keep(*route)))
        .map(|route| RouteNode {
            method: route.method.clone(),
            url: route.url.clone(),
            prefix: route.prefix.clone(),
            hooks: route
                .hooks
                .as_ref()
                .and_then(|hooks| prune_groups(hooks, options.hide_empty)),
            source: route.source.clone(),
            extra: route.extra.clone(),
        })
        .collect()
}

fn keep_list<T>(list: Vec<T>, hide_empty: bool) -> Option<Vec<T>> {
    (!hide_empty || !list.is_empty()).then_some(list)
}

/// Drops empty groups, then the whole map when nothing is left.
fn prune_groups<T: Clone>(
    groups: &IndexMap<String, Vec<T>>,
    hide_empty: bool,
) -> Option<IndexMap<String, Vec<T>>> {
    if !hide_empty {
        return Some(groups.clone());
    }
    let kept: IndexMap<String, Vec<T>> = groups
        .iter()
        .filter(|(_, entries)| !entries.is_empty())
        .map(|(key, entries)| (key.clone(), entries.clone()))
        .collect();
    (!kept.is_empty()).then_some(kept)
}
