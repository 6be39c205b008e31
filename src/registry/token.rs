//! Typed capability tokens.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Name of a registered capability together with the type it resolves to.
///
/// `T` is usually a trait object (`Token<dyn PipelineSetup>`), which keeps
/// consumers decoupled from the concrete implementation.
pub struct Token<T: ?Sized> {
    name: &'static str,
    _capability: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized> Token<T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _capability: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T: ?Sized> Clone for Token<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for Token<T> {}

impl<T: ?Sized> fmt::Debug for Token<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("name", &self.name)
            .field("capability", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: ?Sized> fmt::Display for Token<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
