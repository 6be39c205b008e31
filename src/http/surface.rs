//! Request-handling surface assembled during bootstrap.
//!
//! # Responsibilities
//! - Record route, pipeline and error-handling stages in install order
//! - Produce the final [`Router`] once every phase has run
//!
//! # Design Decisions
//! - A layer in axum only wraps routes that already exist, so stages are
//!   recorded first and applied at the end
//! - Finalisation order: routes, then pipeline stages (first installed is
//!   outermost), then error stages (outermost of all)

use std::fmt;

use axum::Router;

type Stage = Box<dyn FnOnce(Router) -> Router + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Routes,
    Pipeline,
    ErrorHandling,
}

struct NamedStage {
    name: &'static str,
    apply: Stage,
}

/// Ordered record of what each bootstrap phase installed.
#[derive(Default)]
pub struct RequestSurface {
    routes: Vec<NamedStage>,
    pipeline: Vec<NamedStage>,
    error_handling: Vec<NamedStage>,
    order: Vec<(StageKind, &'static str)>,
}

impl RequestSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add routes (or a fallback) to the router.
    pub fn add_routes<F>(&mut self, name: &'static str, stage: F)
    where
        F: FnOnce(Router) -> Router + Send + 'static,
    {
        self.push(StageKind::Routes, name, Box::new(stage));
    }

    /// Add a request-pipeline stage; stages added earlier see requests first.
    pub fn add_layer<F>(&mut self, name: &'static str, stage: F)
    where
        F: FnOnce(Router) -> Router + Send + 'static,
    {
        self.push(StageKind::Pipeline, name, Box::new(stage));
    }

    /// Add an error-handling stage; wraps everything else.
    pub fn add_error_handler<F>(&mut self, name: &'static str, stage: F)
    where
        F: FnOnce(Router) -> Router + Send + 'static,
    {
        self.push(StageKind::ErrorHandling, name, Box::new(stage));
    }

    fn push(&mut self, kind: StageKind, name: &'static str, apply: Stage) {
        tracing::debug!(kind = ?kind, stage = name, "Stage installed");
        let stage = NamedStage { name, apply };
        match kind {
            StageKind::Routes => self.routes.push(stage),
            StageKind::Pipeline => self.pipeline.push(stage),
            StageKind::ErrorHandling => self.error_handling.push(stage),
        }
        self.order.push((kind, name));
    }

    /// Stages in the order they were installed.
    pub fn stages(&self) -> &[(StageKind, &'static str)] {
        &self.order
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn into_router(self) -> Router {
        let mut router = Router::new();
        for stage in self.routes {
            router = (stage.apply)(router);
        }
        for stage in self.pipeline.into_iter().rev() {
            tracing::trace!(stage = stage.name, "Applying pipeline stage");
            router = (stage.apply)(router);
        }
        for stage in self.error_handling.into_iter().rev() {
            tracing::trace!(stage = stage.name, "Applying error stage");
            router = (stage.apply)(router);
        }
        router
    }
}

impl fmt::Debug for RequestSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSurface")
            .field("stages", &self.order)
            .finish()
    }
}
