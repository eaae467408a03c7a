//! Explicit service registry.
//!
//! Every service the HTTP pipeline needs is registered here once, at startup,
//! and the result is an immutable [`AppServices`] handed to axum as state.
//! Registration does no I/O: the database pool connects on first use.

use thiserror::Error;
use tracing::debug;

use crate::application::mediator::Mediator;
use crate::config::Settings;
use crate::domain::connection::{MalformedConnectionString, select_engine};
use crate::infra::db::DataContext;
use crate::infra::error::InfraError;
use crate::infra::http::ApiState;
use crate::infra::http::cors::{CORS_POLICY_NAME, CorsPolicies, CorsPolicy};
use crate::infra::http::docs::ApiDocGenerator;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    ConnectionString(#[from] MalformedConnectionString),
    #[error("failed to configure persistence: {0}")]
    Persistence(#[source] InfraError),
    #[error("service `{concern}` registered more than once")]
    Duplicate { concern: &'static str },
    #[error("service `{concern}` was never registered")]
    Missing { concern: &'static str },
}

impl From<InfraError> for RegistryError {
    fn from(err: InfraError) -> Self {
        match err {
            InfraError::ConnectionString(err) => Self::ConnectionString(err),
            other => Self::Persistence(other),
        }
    }
}

/// Services shared by every request.
#[derive(Clone)]
pub struct AppServices {
    pub docs: Option<ApiDocGenerator>,
    pub data: DataContext,
    pub cors: CorsPolicies,
    pub mediator: Mediator,
    /// Whether the API-docs UI is mounted.
    pub docs_ui: bool,
}

impl AppServices {
    pub fn api_state(&self) -> ApiState {
        ApiState {
            mediator: self.mediator.clone(),
            data: self.data.clone(),
        }
    }
}

/// Builder collecting service registrations. Errors are deferred to
/// [`ServiceRegistry::build`] so calls chain.
pub struct ServiceRegistry<'a> {
    settings: &'a Settings,
    docs: Option<ApiDocGenerator>,
    data: Option<DataContext>,
    cors: CorsPolicies,
    mediator: bool,
    error: Option<RegistryError>,
}

impl<'a> ServiceRegistry<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self {
            settings,
            docs: None,
            data: None,
            cors: CorsPolicies::default(),
            mediator: false,
            error: None,
        }
    }

    fn fail(&mut self, error: RegistryError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    pub fn add_api_docs(mut self) -> Self {
        if self.docs.is_some() {
            self.fail(RegistryError::Duplicate {
                concern: "api_docs",
            });
        }
        self.docs = Some(ApiDocGenerator);
        self
    }

    /// Select the storage engine from the configured connection string and
    /// configure its pool.
    pub fn add_persistence(mut self) -> Self {
        if self.data.is_some() {
            self.fail(RegistryError::Duplicate {
                concern: "persistence",
            });
            return self;
        }

        let database = &self.settings.database;
        let result = select_engine(database.connection_string.as_deref())
            .map_err(RegistryError::from)
            .and_then(|selection| {
                DataContext::from_selection(&selection, database).map_err(RegistryError::from)
            });

        match result {
            Ok(context) => self.data = Some(context),
            Err(err) => self.fail(err),
        }
        self
    }

    pub fn add_cors_policy(mut self, name: &'static str, policy: CorsPolicy) -> Self {
        if self.cors.get(name).is_some() {
            self.fail(RegistryError::Duplicate { concern: "cors" });
            return self;
        }
        self.cors = self.cors.with_policy(name, policy);
        self
    }

    pub fn add_mediator(mut self) -> Self {
        if self.mediator {
            self.fail(RegistryError::Duplicate {
                concern: "mediator",
            });
        }
        self.mediator = true;
        self
    }

    pub fn build(self) -> Result<AppServices, RegistryError> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let data = self.data.ok_or(RegistryError::Missing {
            concern: "persistence",
        })?;
        if !self.mediator {
            return Err(RegistryError::Missing {
                concern: "mediator",
            });
        }
        let mediator = Mediator::new(data.handler_context());

        debug!(
            target = "withrisk::bootstrap",
            engine = %data.engine(),
            docs_ui = self.settings.app.docs_ui,
            "services registered"
        );

        Ok(AppServices {
            docs: self.docs,
            data,
            cors: self.cors,
            mediator,
            docs_ui: self.settings.app.docs_ui,
        })
    }
}

/// The standard registration: docs, persistence, the default CORS policy and
/// the mediator.
pub fn register_services(settings: &Settings) -> Result<AppServices, RegistryError> {
    ServiceRegistry::new(settings)
        .add_api_docs()
        .add_persistence()
        .add_cors_policy(CORS_POLICY_NAME, CorsPolicy::default())
        .add_mediator()
        .build()
}
