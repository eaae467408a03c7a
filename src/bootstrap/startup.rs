//! Ordered startup: services, pipeline, seed, serve.

use std::fmt;
use std::time::Duration;

use axum::{Router, middleware::from_fn};
use metrics::counter;
use thiserror::Error;
use tower_http::catch_panic::CatchPanicLayer;
use tracing::{error, info};

use crate::application::repos::SeedReport;
use crate::application::seed::seed_data;
use crate::config::Settings;
use crate::infra::db::DataContext;
use crate::infra::http::cors::CORS_POLICY_NAME;
use crate::infra::http::middleware::{
    handle_panic, log_responses, mask_internal_errors, set_request_context,
};
use crate::infra::http::{ApiState, build_api_router, build_health_router};
use crate::infra::telemetry::STARTUP_SEED_TOTAL;

use super::registry::{AppServices, RegistryError, register_services};

/// Result of the startup seed step. Failure is logged and contained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    Succeeded(SeedReport),
    Failed(String),
}

impl SeedOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Succeeded(_) => "succeeded",
            Self::Failed(_) => "failed",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StartupPhase {
    #[default]
    NotStarted,
    ServicesRegistered,
    PipelineBuilt,
    Seeded(SeedOutcome),
    Running,
}

impl StartupPhase {
    fn rank(&self) -> u8 {
        match self {
            Self::NotStarted => 0,
            Self::ServicesRegistered => 1,
            Self::PipelineBuilt => 2,
            Self::Seeded(_) => 3,
            Self::Running => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::ServicesRegistered => "services_registered",
            Self::PipelineBuilt => "pipeline_built",
            Self::Seeded(_) => "seeded",
            Self::Running => "running",
        }
    }
}

impl fmt::Display for StartupPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid startup transition from `{from}` to `{to}`")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("cors policy `{name}` is not registered")]
    MissingCorsPolicy { name: &'static str },
}

/// Tracks the startup state machine. Each phase may only be followed by the
/// next one.
#[derive(Debug, Default)]
pub struct Startup {
    phase: StartupPhase,
}

impl Startup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> &StartupPhase {
        &self.phase
    }

    pub fn advance(&mut self, next: StartupPhase) -> Result<(), StartupError> {
        let current = self.phase();
        if next.rank() != current.rank() + 1 {
            return Err(StartupError::InvalidTransition {
                from: current.name(),
                to: next.name(),
            });
        }
        info!(target = "withrisk::startup", phase = %next, "startup phase reached");
        self.phase = next;
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase(), StartupPhase::Running)
    }
}

/// API and health routes, plus the docs UI when enabled.
pub fn build_routes(services: &AppServices) -> Router<ApiState> {
    let mut routes = build_api_router().merge(build_health_router());
    if services.docs_ui {
        if let Some(docs) = services.docs {
            routes = routes.merge(docs.router());
        }
    }
    routes
}

/// Wrap `routes` in the middleware stack and bind the shared state.
///
/// Outermost first: CORS, panic boundary, 500 masking, request context,
/// response logging. CORS sits outside the error boundary so masked 500s and
/// panic responses still carry the allow-origin headers.
pub fn install_pipeline(
    routes: Router<ApiState>,
    services: &AppServices,
) -> Result<Router, StartupError> {
    let cors = services
        .cors
        .get(CORS_POLICY_NAME)
        .ok_or(StartupError::MissingCorsPolicy {
            name: CORS_POLICY_NAME,
        })?
        .layer();

    Ok(routes
        .with_state(services.api_state())
        .layer(from_fn(log_responses))
        .layer(from_fn(set_request_context))
        .layer(from_fn(mask_internal_errors))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors))
}

/// Ensure the schema exists and seed it, bounded by `limit`. Never fails:
/// errors and timeouts come back as [`SeedOutcome::Failed`].
pub async fn run_startup_seed(data: &DataContext, limit: Duration) -> SeedOutcome {
    let work = async {
        data.ensure_created().await?;
        seed_data(data.seed_repo().as_ref()).await
    };

    let outcome = match tokio::time::timeout(limit, work).await {
        Ok(Ok(report)) => SeedOutcome::Succeeded(report),
        Ok(Err(err)) => SeedOutcome::Failed(err.to_string()),
        Err(_) => SeedOutcome::Failed(format!(
            "schema creation and seeding timed out after {}s",
            limit.as_secs()
        )),
    };

    match &outcome {
        SeedOutcome::Succeeded(report) => info!(
            target = "withrisk::startup",
            engine = %data.engine(),
            posts = report.posts,
            comments = report.comments,
            "startup seed completed"
        ),
        SeedOutcome::Failed(reason) => error!(
            target = "withrisk::startup",
            engine = %data.engine(),
            error = %reason,
            "startup seed failed; continuing without seeded data"
        ),
    }
    counter!(STARTUP_SEED_TOTAL, "outcome" => outcome.label()).increment(1);

    outcome
}

/// Everything `serve` needs once startup has finished seeding.
pub struct Bootstrapped {
    pub startup: Startup,
    pub services: AppServices,
    pub router: Router,
    pub seed: SeedOutcome,
}

pub async fn bootstrap(settings: &Settings) -> Result<Bootstrapped, StartupError> {
    let mut startup = Startup::new();

    let services = register_services(settings)?;
    startup.advance(StartupPhase::ServicesRegistered)?;

    let router = install_pipeline(build_routes(&services), &services)?;
    startup.advance(StartupPhase::PipelineBuilt)?;

    let seed = run_startup_seed(&services.data, settings.startup.seed_timeout).await;
    startup.advance(StartupPhase::Seeded(seed.clone()))?;

    Ok(Bootstrapped {
        startup,
        services,
        router,
        seed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_advance_in_order() {
        let mut startup = Startup::new();
        assert_eq!(startup.phase(), &StartupPhase::NotStarted);
        startup.advance(StartupPhase::ServicesRegistered).unwrap();
        startup.advance(StartupPhase::PipelineBuilt).unwrap();
        startup
            .advance(StartupPhase::Seeded(SeedOutcome::Failed("down".into())))
            .unwrap();
        startup.advance(StartupPhase::Running).unwrap();
        assert!(startup.is_running());
    }

    #[test]
    fn skipping_a_phase_is_rejected() {
        let mut startup = Startup::new();
        let err = startup.advance(StartupPhase::PipelineBuilt).unwrap_err();
        assert!(matches!(
            err,
            StartupError::InvalidTransition {
                from: "not_started",
                to: "pipeline_built"
            }
        ));
        assert_eq!(startup.phase(), &StartupPhase::NotStarted);
    }

    #[test]
    fn running_is_terminal() {
        let mut startup = Startup::new();
        startup.advance(StartupPhase::ServicesRegistered).unwrap();
        startup.advance(StartupPhase::PipelineBuilt).unwrap();
        startup
            .advance(StartupPhase::Seeded(SeedOutcome::Succeeded(SeedReport::default())))
            .unwrap();
        startup.advance(StartupPhase::Running).unwrap();

        assert!(startup.advance(StartupPhase::Running).is_err());
        assert!(startup.advance(StartupPhase::ServicesRegistered).is_err());
    }
}
