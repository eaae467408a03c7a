//! Composition root: service registration and the startup sequence.

pub mod registry;
pub mod startup;

pub use registry::{AppServices, RegistryError, ServiceRegistry, register_services};
pub use startup::{
    Bootstrapped, SeedOutcome, Startup, StartupError, StartupPhase, bootstrap, build_routes,
    install_pipeline, run_startup_seed,
};
