//! Tooling Provider
//!
//! The provider side of the tooling protocol: receives model requests from a
//! client, resolves them to a registered producer and builds the model while
//! honoring the client's cancellation.
//!
//! Provider code never depends on the cross-version cancellation handle
//! directly. The dispatcher wraps it in a [`BuildCancellationTokenAdapter`]
//! and producers only see the local [`BuildCancellationToken`] trait.

pub mod adapter;
pub mod config;
pub mod dispatcher;
pub mod producer;
pub mod producers;
pub mod registry;
pub mod token;

pub use adapter::BuildCancellationTokenAdapter;
pub use config::ProviderConfig;
pub use dispatcher::ModelRequestDispatcher;
pub use producer::{BuildContext, BuildError, ModelProducer};
pub use producers::{ProviderInfoProducer, WorkspaceInventoryProducer};
pub use registry::ProducerRegistry;
pub use token::BuildCancellationToken;
