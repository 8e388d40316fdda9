#![warn(clippy::pedantic)]
//! Structural overview of a plugin-composed server application.
//!
//! This crate is the surface a host framework talks to. The host forwards
//! every registration, decoration, hook, and route as it happens; once the
//! application is ready, readers get an immutable tree describing how the
//! application is put together.
//!
//! ## Quick Start
//!
//! ```rust
//! use app_overview::{Overview, OverviewOptions, RegistrationForm};
//! use app_overview_filter::FilterOptions;
//! use app_overview_tree::nodes::{HookDefinition, RouteDefinition};
//!
//! let overview = Overview::new(OverviewOptions::default())?;
//! let root = overview.root();
//!
//! overview.decorate(root, "db")?;
//! overview.add_hook(root, "onRequest", HookDefinition::new("auth", "function auth () {}"))?;
//! let users = overview.register(root, RegistrationForm::plugin("users"))?.unwrap();
//! overview.add_route(users, RouteDefinition::new("GET", "/users"))?;
//! overview.ready()?;
//!
//! let tree = overview.get_overview(&FilterOptions::new().hide_empty(true))?;
//! assert_eq!(tree.children()[0].routes()[0].url, "/users");
//! # Ok::<(), app_overview::errors::OverviewError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`app_overview_tree`] - node records, content hashing, and the tree builder
//! - [`app_overview_filter`] - read-time pruning and route filtering
//!
//! Every notification locks the builder for the duration of the call, so a
//! host may report from several threads. Readers share the published
//! snapshot and filter it outside the lock.
//!
//! ## Provenance
//!
//! With [`OverviewOptions::add_source`] set, each declaration records the
//! call site of the facade method that reported it (the methods are
//! `#[track_caller]`). Route-level hooks without a location of their own are
//! attributed to their route.

use std::{panic, sync::Arc};

use app_overview_filter::{FilterOptions, filter};
use app_overview_tree::{
    builder::TreeBuilder,
    identity::Token,
    nodes::{DecoratorKind, DecoratorNode, HookDefinition, Location, PluginNode, RouteDefinition},
};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::errors::OverviewError;

pub mod errors;
mod options;
mod registration;

pub use options::{DecorateEnricher, ExposeRoute, OverviewOptions, RouteEnricher};
pub use registration::RegistrationForm;

pub struct Overview {
    builder: Mutex<TreeBuilder>,
    options: OverviewOptions,
    root: Token,
}

impl Overview {
    /// Creates the facade together with the root instance.
    ///
    /// When [`OverviewOptions::expose_route`] is set, the overview route is
    /// recorded on the root like any other route.
    ///
    /// # Errors
    ///
    /// Fails only if the fresh builder rejects the root or the exposed route,
    /// which indicates a bug.
    #[track_caller]
    pub fn new(options: OverviewOptions) -> Result<Self, OverviewError> {
        let caller = panic::Location::caller();
        let source = options.add_source.then(|| Location::from(caller));
        let mut builder = TreeBuilder::new();
        let root = builder.instance_created(None, options.root_name.clone(), source)?;
        let overview = Self {
            builder: Mutex::new(builder),
            options,
            root,
        };
        if let Some(expose) = &overview.options.expose_route {
            let route = RouteDefinition::new(expose.method.clone(), expose.url.clone());
            overview.record_route(root, route, caller)?;
        }
        Ok(overview)
    }

    /// Token of the root instance.
    #[must_use]
    pub fn root(&self) -> Token {
        self.root
    }

    #[must_use]
    pub fn options(&self) -> &OverviewOptions {
        &self.options
    }

    /// The route the host should serve [`Overview::json_overview`] under.
    #[must_use]
    pub fn expose_route(&self) -> Option<&ExposeRoute> {
        self.options.expose_route.as_ref()
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.builder.lock().is_ready()
    }

    /// Records a plugin registered under `parent` and returns its token.
    ///
    /// Bundled plugins are unwrapped to their default export. Deferred
    /// factories are skipped with a warning and yield `Ok(None)`; anything
    /// they register is absent from the overview.
    ///
    /// # Errors
    ///
    /// Returns [`OverviewError::Build`] for an unknown parent or after
    /// [`Overview::ready`].
    #[track_caller]
    pub fn register(
        &self,
        parent: Token,
        form: RegistrationForm,
    ) -> Result<Option<Token>, OverviewError> {
        let source = self.source(panic::Location::caller());
        self.register_form(parent, form, source)
    }

    /// Records an application-level decorator.
    ///
    /// # Errors
    ///
    /// Returns [`OverviewError::Build`] for an unknown token or after ready.
    #[track_caller]
    pub fn decorate(&self, token: Token, name: impl Into<String>) -> Result<(), OverviewError> {
        self.record_decorator(token, DecoratorKind::Decorate, name.into(), panic::Location::caller())
    }

    /// Records a request decorator.
    ///
    /// # Errors
    ///
    /// Returns [`OverviewError::Build`] for an unknown token or after ready.
    #[track_caller]
    pub fn decorate_request(
        &self,
        token: Token,
        name: impl Into<String>,
    ) -> Result<(), OverviewError> {
        self.record_decorator(
            token,
            DecoratorKind::DecorateRequest,
            name.into(),
            panic::Location::caller(),
        )
    }

    /// Records a reply decorator.
    ///
    /// # Errors
    ///
    /// Returns [`OverviewError::Build`] for an unknown token or after ready.
    #[track_caller]
    pub fn decorate_reply(&self, token: Token, name: impl Into<String>) -> Result<(), OverviewError> {
        self.record_decorator(
            token,
            DecoratorKind::DecorateReply,
            name.into(),
            panic::Location::caller(),
        )
    }

    /// Records an application hook under the lifecycle name `hook_name`.
    ///
    /// # Errors
    ///
    /// Returns [`OverviewError::Build`] for an unknown token or after ready.
    #[track_caller]
    pub fn add_hook(
        &self,
        token: Token,
        hook_name: &str,
        mut hook: HookDefinition,
    ) -> Result<(), OverviewError> {
        let caller = panic::Location::caller();
        hook.location = if self.options.add_source {
            hook.location.or_else(|| Some(Location::from(caller)))
        } else {
            None
        };
        self.builder.lock().hook_added(token, hook_name, hook)?;
        Ok(())
    }

    /// Records a route declared on `token`.
    ///
    /// # Errors
    ///
    /// Returns [`OverviewError::Build`] for an unknown token or after ready.
    #[track_caller]
    pub fn add_route(&self, token: Token, route: RouteDefinition) -> Result<(), OverviewError> {
        self.record_route(token, route, panic::Location::caller())
    }

    /// Publishes the snapshot. Further calls do nothing.
    ///
    /// # Errors
    ///
    /// Fails only if the root token is unknown to the builder, which
    /// indicates a bug.
    pub fn ready(&self) -> Result<(), OverviewError> {
        let mut builder = self.builder.lock();
        if builder.is_ready() {
            debug!("overview already published");
            return Ok(());
        }
        builder.finalize(self.root)?;
        Ok(())
    }

    /// Reads the overview, filtered according to `options`.
    ///
    /// Without filtering the published snapshot is returned as is.
    ///
    /// # Errors
    ///
    /// Returns [`OverviewError::NotReady`] before [`Overview::ready`].
    pub fn get_overview(&self, options: &FilterOptions<'_>) -> Result<Arc<PluginNode>, OverviewError> {
        let snapshot = self.builder.lock().snapshot()?;
        if options.is_noop() {
            return Ok(snapshot);
        }
        Ok(Arc::new(filter(&snapshot, options)))
    }

    /// The full, unfiltered overview as a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`OverviewError::NotReady`] before [`Overview::ready`].
    pub fn json_overview(&self) -> Result<String, OverviewError> {
        let snapshot = self.get_overview(&FilterOptions::default())?;
        Ok(serde_json::to_string(snapshot.as_ref())?)
    }

    fn register_form(
        &self,
        parent: Token,
        form: RegistrationForm,
        source: Option<Location>,
    ) -> Result<Option<Token>, OverviewError> {
        match form {
            RegistrationForm::Plugin { name } => {
                let token = self
                    .builder
                    .lock()
                    .instance_created(Some(parent), name, source)?;
                Ok(Some(token))
            }
            RegistrationForm::Bundled(default) => self.register_form(parent, *default, source),
            RegistrationForm::Deferred { description } => {
                warn!(
                    parent = %parent,
                    plugin = %description,
                    "promise-like plugin factories are not supported by the overview; skipping"
                );
                Ok(None)
            }
        }
    }

    fn source(&self, caller: &panic::Location<'_>) -> Option<Location> {
        self.options.add_source.then(|| Location::from(caller))
    }

    fn record_decorator(
        &self,
        token: Token,
        kind: DecoratorKind,
        name: String,
        caller: &panic::Location<'_>,
    ) -> Result<(), OverviewError> {
        let mut decorator = DecoratorNode::new(name).with_source(self.source(caller));
        if let Some(enrich) = &self.options.on_decorate_definition {
            let fields = enrich(kind.as_str(), &decorator.name);
            decorator.merge_fields(fields);
        }
        self.builder
            .lock()
            .decorator_added(token, kind.as_str(), decorator)?;
        Ok(())
    }

    fn record_route(
        &self,
        token: Token,
        mut route: RouteDefinition,
        caller: &panic::Location<'_>,
    ) -> Result<(), OverviewError> {
        if !self.options.add_source {
            for hook in route.hooks.values_mut().flatten() {
                hook.location = None;
            }
        }
        if let Some(enrich) = &self.options.on_route_definition {
            let extra = enrich(&route);
            route.extra.extend(extra);
        }
        self.builder
            .lock()
            .route_added(token, route, self.source(caller))?;
        Ok(())
    }
}
