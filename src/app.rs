//! # Application Registry
//!
//! [`App`] owns one [`ResourceController`] per resource schema. It is assembled at
//! startup, either from a service root (config file plus schema directory) or
//! programmatically, then listeners are attached through
//! [`collection_mut`](App::collection_mut), and finally it is frozen into an
//! [`AppService`] for the HTTP server.
//!
//! ```rust
//! use crudhook::app::App;
//! use crudhook::config::AppConfig;
//! use crudhook::events::{LifecycleEvent, Outcome};
//! use crudhook::schema::{PropertyDescriptor, PropertyKind, SchemaModel};
//!
//! let mut app = App::new(AppConfig::default());
//! let schema = SchemaModel::new("widgets")
//!     .property("id", PropertyDescriptor::new(PropertyKind::Id));
//! app.register_memory(schema).unwrap();
//! app.collection_mut("widgets")
//!     .unwrap()
//!     .add_listener(LifecycleEvent::Delete, |_| Outcome::Continue);
//! assert_eq!(app.routes().len(), 6);
//! ```

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::coerce::ParameterCoercer;
use crate::config::AppConfig;
use crate::controller::ResourceController;
use crate::router::{RouteMeta, Router};
use crate::schema::{load_from_directory, SchemaModel};
use crate::server::AppService;
use crate::store::{MemoryStore, Persistence};
use crate::wire::routes_for;

#[derive(Debug)]
pub struct App {
    config: AppConfig,
    controllers: Vec<ResourceController>,
    by_name: HashMap<String, usize>,
}

impl App {
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            controllers: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Load `config.yml` and every schema under the configured resources directory,
    /// backing each resource with a [`MemoryStore`].
    pub fn from_root(root: &Path) -> Result<Self> {
        let config = AppConfig::load(root)?;
        let resources = config.resources_dir(root);
        let schemas = load_from_directory(&resources)
            .with_context(|| format!("Failed to load schemas from {}", resources.display()))?;
        let mut app = Self::new(config);
        for schema in schemas {
            app.register_memory(schema)?;
        }
        info!(
            root = %root.display(),
            resources = app.controllers.len(),
            "Application assembled"
        );
        Ok(app)
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Add a resource backed by `store`. Resource names must be unique.
    pub fn register(
        &mut self,
        schema: SchemaModel,
        store: Arc<dyn Persistence>,
    ) -> Result<&mut ResourceController> {
        if self.by_name.contains_key(&schema.name) {
            bail!("Resource {} registered twice", schema.name);
        }
        let existing = self.routes();
        for route in routes_for(&schema) {
            let shape = route_shape(&route.path_pattern);
            if let Some(taken) = existing
                .iter()
                .find(|r| r.method == route.method && route_shape(&r.path_pattern) == shape)
            {
                bail!(
                    "Resource {}: {} {} collides with {} {} of resource {}",
                    schema.name,
                    route.method,
                    route.path_pattern,
                    taken.method,
                    taken.path_pattern,
                    taken.resource
                );
            }
        }
        let name = schema.name.clone();
        let controller = ResourceController::new(schema, store)
            .with_list_limit(self.config.list_limit)
            .with_coercer(ParameterCoercer::strict(self.config.coercion.strict_numbers));
        info!(
            resource = %name,
            collection_uri = %controller.schema().collection_uri,
            resource_uri = %controller.schema().resource_uri,
            "Resource registered"
        );
        let index = self.controllers.len();
        self.controllers.push(controller);
        self.by_name.insert(name, index);
        Ok(&mut self.controllers[index])
    }

    /// Add a resource backed by a fresh in-memory store.
    pub fn register_memory(&mut self, schema: SchemaModel) -> Result<&mut ResourceController> {
        let store = Arc::new(MemoryStore::new(&schema));
        self.register(schema, store)
    }

    /// Look up a resource controller by name.
    #[must_use]
    pub fn collection(&self, name: &str) -> Option<&ResourceController> {
        self.by_name.get(name).map(|&i| &self.controllers[i])
    }

    /// Mutable access for listener registration before the app is served.
    pub fn collection_mut(&mut self, name: &str) -> Option<&mut ResourceController> {
        let index = *self.by_name.get(name)?;
        self.controllers.get_mut(index)
    }

    /// Controllers in registration order.
    pub fn controllers(&self) -> impl Iterator<Item = &ResourceController> {
        self.controllers.iter()
    }

    /// The wired route table: six routes per resource, in registration order.
    #[must_use]
    pub fn routes(&self) -> Vec<RouteMeta> {
        self.controllers
            .iter()
            .flat_map(|c| routes_for(c.schema()))
            .collect()
    }

    #[must_use]
    pub fn router(&self) -> Router {
        Router::new(self.routes())
    }

    /// Freeze the registry and wrap it for the HTTP server.
    #[must_use]
    pub fn into_service(self) -> AppService {
        AppService::new(self)
    }
}

/// Path pattern with parameter names erased; `/a/{id}` and `/a/{key}` match the
/// same requests.
fn route_shape(pattern: &str) -> String {
    pattern
        .split('/')
        .map(|segment| {
            if segment.starts_with('{') && segment.ends_with('}') {
                "{}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{PropertyDescriptor, PropertyKind};

    fn schema(name: &str) -> SchemaModel {
        SchemaModel::new(name).property("id", PropertyDescriptor::new(PropertyKind::Id))
    }

    #[test]
    fn test_collection_lookup() {
        let mut app = App::new(AppConfig::default());
        app.register_memory(schema("widgets")).unwrap();
        app.register_memory(schema("gadgets")).unwrap();
        assert_eq!(app.collection("gadgets").map(|c| c.name()), Some("gadgets"));
        assert!(app.collection("gizmos").is_none());
        assert_eq!(app.routes().len(), 12);
        assert_eq!(app.routes()[0].resource.as_ref(), "widgets");
    }

    #[test]
    fn test_duplicate_resource_rejected() {
        let mut app = App::new(AppConfig::default());
        app.register_memory(schema("widgets")).unwrap();
        assert!(app.register_memory(schema("widgets")).is_err());
    }

    #[test]
    fn test_colliding_collection_uri_rejected() {
        let mut app = App::new(AppConfig::default());
        app.register_memory(schema("widgets").with_uris("/items", "/items/{id}")).unwrap();
        let err = app
            .register_memory(schema("gadgets").with_uris("/items", "/items/{id}"))
            .unwrap_err();
        assert!(err.to_string().contains("GET /items collides"));
        assert!(app.collection("gadgets").is_none());
        let router = app.router();
        let matched = router.route(&http::Method::GET, "/items").unwrap();
        assert_eq!(matched.route.resource.as_ref(), "widgets");
    }

    #[test]
    fn test_renamed_parameter_still_collides() {
        let mut app = App::new(AppConfig::default());
        app.register_memory(schema("widgets")).unwrap();
        let gadgets = SchemaModel::new("gadgets")
            .property("key", PropertyDescriptor::new(PropertyKind::Id))
            .with_uris("/gadgets", "/widgets/{key}");
        assert!(app.register_memory(gadgets).is_err());
        assert_eq!(app.routes().len(), 6);
    }

    #[test]
    fn test_config_flows_into_controllers() {
        let mut config = AppConfig::default();
        config.list_limit = 7;
        let mut app = App::new(config);
        app.register_memory(schema("widgets")).unwrap();
        assert_eq!(app.collection("widgets").map(|c| c.list_limit()), Some(7));
    }
}
