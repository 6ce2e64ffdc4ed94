//! # airnode-web
//!
//! Configuration web UI and sensor endpoints for the airnode sensor node.
//!
//! This crate provides:
//! - The static configuration page with its script and stylesheet
//! - JSON settings, station list and telemetry endpoints
//! - The HTML status fragment polled by the page
//! - Form submission that applies and persists configuration edits
//!
//! ## Usage
//!
//! ```rust,ignore
//! use airnode_web::{create_router, NodeState};
//!
//! let state = Arc::new(NodeState::new(service, scanner, "192.168.4.1"));
//! let app = create_router(state);
//!
//! let listener = TcpListener::bind("0.0.0.0:80").await?;
//! axum::serve(listener, app).await?;
//! ```

pub mod clock;
pub mod routes;

// Re-exports
pub use routes::create_router;

use std::sync::Arc;
use std::time::Instant;

use airnode_core::{ConfigService, Measurement, NetworkScanner, NonVolatileStore};
use tokio::sync::RwLock;

/// Configuration service over a type-erased store.
pub type NodeConfig = ConfigService<Box<dyn NonVolatileStore>>;

/// Shared node state for all route handlers.
pub struct NodeState {
    /// Form submissions hold the write lock for apply and save.
    pub config: RwLock<NodeConfig>,
    /// Latest sample, written by the sampler task.
    pub latest: RwLock<Option<Measurement>>,
    pub started: Instant,
    pub scanner: Arc<dyn NetworkScanner>,
    pub ip_address: String,
}

impl NodeState {
    pub fn new(config: NodeConfig, scanner: Arc<dyn NetworkScanner>, ip_address: impl Into<String>) -> Self {
        Self {
            config: RwLock::new(config),
            latest: RwLock::new(None),
            started: Instant::now(),
            scanner,
            ip_address: ip_address.into(),
        }
    }

    /// Seconds since the node started.
    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    pub async fn record_measurement(&self, measurement: Measurement) {
        *self.latest.write().await = Some(measurement);
    }
}

/// Type alias for shared state in Axum handlers.
pub type AppState = Arc<NodeState>;
