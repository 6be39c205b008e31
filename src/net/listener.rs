//! TCP listener binding.
//!
//! # Responsibilities
//! - Resolve the configured host
//! - Bind to the first resolved address
//! - Report the actual bound address

use std::io;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenError {
    /// The host could not be resolved to a socket address.
    #[error("invalid listen address {address}: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: io::Error,
    },

    /// Failed to bind to address (in use, permission denied, ...).
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },
}

impl ListenError {
    pub fn address(&self) -> &str {
        match self {
            ListenError::InvalidAddress { address, .. } | ListenError::Bind { address, .. } => {
                address
            }
        }
    }
}

/// Bind to the configured address.
pub async fn bind(config: &ListenerConfig) -> Result<TcpListener, ListenError> {
    let address = config.bind_address();

    let resolved = tokio::net::lookup_host(&address)
        .await
        .map_err(|source| ListenError::InvalidAddress {
            address: address.clone(),
            source,
        })?
        .next()
        .ok_or_else(|| ListenError::InvalidAddress {
            address: address.clone(),
            source: io::Error::new(io::ErrorKind::NotFound, "host resolved to no addresses"),
        })?;

    let listener = TcpListener::bind(resolved)
        .await
        .map_err(|source| ListenError::Bind {
            address: address.clone(),
            source,
        })?;

    tracing::debug!(requested = %address, resolved = %resolved, "Listener bound");
    Ok(listener)
}
