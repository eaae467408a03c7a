use std::{future::IntoFuture, process};

use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;
use withrisk::{
    application::error::AppError,
    bootstrap::{self, Bootstrapped, SeedOutcome, StartupPhase},
    config,
    infra::{error::InfraError, telemetry},
};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Seed(_) => run_seed(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    info!(
        target = "withrisk::startup",
        environment = settings.app.environment.as_str(),
        docs_ui = settings.app.docs_ui,
        "starting withrisk"
    );

    let Bootstrapped {
        mut startup,
        services,
        router,
        seed,
    } = bootstrap::bootstrap(&settings)
        .await
        .map_err(|err| AppError::unexpected(format!("startup failed: {err}")))?;

    if let SeedOutcome::Failed(reason) = &seed {
        warn!(
            target = "withrisk::startup",
            reason = %reason,
            "serving without seeded data"
        );
    }

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    startup
        .advance(StartupPhase::Running)
        .map_err(|err| AppError::unexpected(err.to_string()))?;
    info!(
        target = "withrisk::startup",
        addr = %settings.server.addr,
        "listening"
    );

    let result = serve_http(listener, router, settings.server.graceful_shutdown).await;
    services.data.close().await;
    result
}

async fn run_seed(settings: config::Settings) -> Result<(), AppError> {
    let services = bootstrap::register_services(&settings)
        .map_err(|err| AppError::unexpected(err.to_string()))?;

    let outcome = bootstrap::run_startup_seed(&services.data, settings.startup.seed_timeout).await;
    services.data.close().await;

    match outcome {
        SeedOutcome::Succeeded(report) => {
            info!(
                target = "withrisk::seed",
                posts = report.posts,
                comments = report.comments,
                "seed finished"
            );
            Ok(())
        }
        SeedOutcome::Failed(reason) => Err(AppError::unexpected(format!("seed failed: {reason}"))),
    }
}

async fn serve_http(
    listener: tokio::net::TcpListener,
    router: axum::Router,
    grace: std::time::Duration,
) -> Result<(), AppError> {
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = stop_tx.send(());
        })
        .into_future();

    let drain_deadline = async {
        if stop_rx.await.is_ok() {
            tokio::time::sleep(grace).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = server => {
            result.map_err(|err| AppError::unexpected(format!("server error: {err}")))
        }
        _ = drain_deadline => {
            warn!(
                target = "withrisk::shutdown",
                grace_secs = grace.as_secs(),
                "graceful shutdown timed out; dropping open connections"
            );
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(target = "withrisk::shutdown", error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(target = "withrisk::shutdown", error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!(target = "withrisk::shutdown", "shutdown signal received");
}
