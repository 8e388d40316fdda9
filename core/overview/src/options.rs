//! Facade configuration.
//!
//! The serializable part of [`OverviewOptions`] can be loaded from any serde
//! format. Definition enrichers are code and are set with builder methods.
//!
//! `exposeRoute` takes either a route object or a flag. With `true`, the
//! route comes from `exposeRouteOptions`, falling back to
//! [`ExposeRoute::default`].

use std::fmt::{self, Debug, Formatter};

use app_overview_tree::nodes::RouteDefinition;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Produces extra fields merged into a route node.
pub type RouteEnricher = Box<dyn Fn(&RouteDefinition) -> Map<String, Value> + Send + Sync>;

/// Produces extra fields merged into a decorator node, given the decorator
/// category and name.
pub type DecorateEnricher = Box<dyn Fn(&str, &str) -> Map<String, Value> + Send + Sync>;

/// Route under which the host serves the JSON overview.
#[derive(Clone, PartialEq, Eq, Debug, Deserialize)]
#[serde(default)]
pub struct ExposeRoute {
    pub method: String,
    pub url: String,
}

impl Default for ExposeRoute {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            url: "/json-overview".to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(from = "OptionsFile")]
pub struct OverviewOptions {
    /// Record the call site of every declaration.
    pub add_source: bool,
    /// Name given to the root instance.
    pub root_name: String,
    pub expose_route: Option<ExposeRoute>,
    pub(crate) on_route_definition: Option<RouteEnricher>,
    pub(crate) on_decorate_definition: Option<DecorateEnricher>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ExposeSetting {
    Enabled(bool),
    Route(ExposeRoute),
}

/// Serialized shape of [`OverviewOptions`].
#[derive(Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct OptionsFile {
    add_source: bool,
    root_name: String,
    expose_route: Option<ExposeSetting>,
    expose_route_options: Option<ExposeRoute>,
}

impl Default for OptionsFile {
    fn default() -> Self {
        let defaults = OverviewOptions::default();
        Self {
            add_source: defaults.add_source,
            root_name: defaults.root_name,
            expose_route: None,
            expose_route_options: None,
        }
    }
}

impl From<OptionsFile> for OverviewOptions {
    fn from(file: OptionsFile) -> Self {
        let expose_route = match file.expose_route {
            Some(ExposeSetting::Route(route)) => Some(route),
            Some(ExposeSetting::Enabled(true)) => Some(file.expose_route_options.unwrap_or_default()),
            Some(ExposeSetting::Enabled(false)) | None => None,
        };
        Self {
            add_source: file.add_source,
            root_name: file.root_name,
            expose_route,
            ..Self::default()
        }
    }
}

impl Default for OverviewOptions {
    fn default() -> Self {
        Self {
            add_source: false,
            root_name: "root".to_string(),
            expose_route: None,
            on_route_definition: None,
            on_decorate_definition: None,
        }
    }
}

impl OverviewOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn add_source(mut self, add_source: bool) -> Self {
        self.add_source = add_source;
        self
    }

    #[must_use]
    pub fn root_name(mut self, root_name: impl Into<String>) -> Self {
        self.root_name = root_name.into();
        self
    }

    #[must_use]
    pub fn expose_route(mut self, expose_route: ExposeRoute) -> Self {
        self.expose_route = Some(expose_route);
        self
    }

    #[must_use]
    pub fn on_route_definition<F>(mut self, enricher: F) -> Self
    where
        F: Fn(&RouteDefinition) -> Map<String, Value> + Send + Sync + 'static,
    {
        self.on_route_definition = Some(Box::new(enricher));
        self
    }

    #[must_use]
    pub fn on_decorate_definition<F>(mut self, enricher: F) -> Self
    where
        F: Fn(&str, &str) -> Map<String, Value> + Send + Sync + 'static,
    {
        self.on_decorate_definition = Some(Box::new(enricher));
        self
    }
}

impl Debug for OverviewOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverviewOptions")
            .field("add_source", &self.add_source)
            .field("root_name", &self.root_name)
            .field("expose_route", &self.expose_route)
            .field("on_route_definition", &self.on_route_definition.is_some())
            .field("on_decorate_definition", &self.on_decorate_definition.is_some())
            .finish()
    }
}
