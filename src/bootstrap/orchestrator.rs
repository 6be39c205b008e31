//! Four-phase startup sequence.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use thiserror::Error;

use super::capabilities::{ERROR_HANDLING_MANAGER, MIDDLEWARE_MANAGER, ROUTING_MANAGER};
use super::registrar::Registrar;
use crate::http::surface::RequestSurface;
use crate::observability::metrics;
use crate::registry::{BoxError, Registry};

/// Bootstrap phases, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    RegisterServices,
    SetupRequestPipeline,
    SetupRouting,
    SetupErrorHandling,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::RegisterServices,
        Phase::SetupRequestPipeline,
        Phase::SetupRouting,
        Phase::SetupErrorHandling,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::RegisterServices => "register_services",
            Phase::SetupRequestPipeline => "setup_request_pipeline",
            Phase::SetupRouting => "setup_routing",
            Phase::SetupErrorHandling => "setup_error_handling",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    Pending,
    Running(Phase),
    Completed,
    Failed(Phase),
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    /// `source` is the phase's own error, untouched.
    #[error("bootstrap phase {phase} failed: {source}")]
    Phase {
        phase: Phase,
        #[source]
        source: BoxError,
    },

    #[error("bootstrap already ran (state: {0:?})")]
    AlreadyBootstrapped(BootstrapState),
}

impl BootstrapError {
    /// Phase that failed, if any phase ran.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            BootstrapError::Phase { phase, .. } => Some(*phase),
            BootstrapError::AlreadyBootstrapped(_) => None,
        }
    }
}

/// Runs the startup phases against one registry.
pub struct Bootstrapper {
    registry: Arc<Registry>,
    registrar: Arc<dyn Registrar>,
    state: Mutex<BootstrapState>,
}

impl Bootstrapper {
    pub fn new(registry: Arc<Registry>, registrar: Arc<dyn Registrar>) -> Self {
        Self {
            registry,
            registrar,
            state: Mutex::new(BootstrapState::Pending),
        }
    }

    pub fn state(&self) -> BootstrapState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, next: BootstrapState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }

    /// Run every phase in order, installing stages into `surface`.
    pub async fn bootstrap(&self, surface: &mut RequestSurface) -> Result<(), BootstrapError> {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if *state != BootstrapState::Pending {
                return Err(BootstrapError::AlreadyBootstrapped(*state));
            }
            *state = BootstrapState::Running(Phase::RegisterServices);
        }

        tracing::info!("Bootstrapping application");
        let started = Instant::now();

        for phase in Phase::ALL {
            self.set_state(BootstrapState::Running(phase));
            let phase_started = Instant::now();

            let result = self.run_phase(phase, surface).await;

            let elapsed = phase_started.elapsed();
            metrics::record_bootstrap_phase(phase.as_str(), elapsed);

            if let Err(source) = result {
                self.set_state(BootstrapState::Failed(phase));
                tracing::error!(phase = %phase, error = %source, "Bootstrap phase failed");
                return Err(BootstrapError::Phase { phase, source });
            }

            tracing::info!(
                phase = %phase,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                "Bootstrap phase completed"
            );
        }

        self.set_state(BootstrapState::Completed);
        tracing::info!(
            elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
            services = ?self.registry.names(),
            "Bootstrap completed"
        );
        Ok(())
    }

    async fn run_phase(&self, phase: Phase, surface: &mut RequestSurface) -> Result<(), BoxError> {
        match phase {
            Phase::RegisterServices => self.registrar.register_services(&self.registry).await,
            Phase::SetupRequestPipeline => {
                let manager = self.registry.resolve(&MIDDLEWARE_MANAGER).await?;
                manager.setup_pipeline(surface).await
            }
            Phase::SetupRouting => {
                let manager = self.registry.resolve(&ROUTING_MANAGER).await?;
                manager.setup_routing(surface).await
            }
            Phase::SetupErrorHandling => {
                let manager = self.registry.resolve(&ERROR_HANDLING_MANAGER).await?;
                manager.setup_error_handling(surface).await
            }
        }
    }
}
