//! RADIUS Client Implementation
//!
//! This crate provides an asynchronous RADIUS client built on top of the
//! `radius-proto` codec.
//!
//! # Features
//!
//! - Async UDP transport with Tokio
//! - Timer-driven retries with a configurable attempt limit
//! - Single-settlement completion handles (late responses are ignored)
//! - Per-client packet identifier allocation
//! - JSON configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use radius_client::{ClientConfig, Endpoint, RadiusClient};
//! use radius_proto::{AccessRequest, RadiusPacket};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::example();
//!     let client = RadiusClient::from_config(&config).await?;
//!     let endpoint = Endpoint::new(config.server_addr()?, config.secret.as_bytes());
//!
//!     let request = AccessRequest::with_credentials(client.next_identifier(), "alice", "password")?;
//!     let response = client
//!         .communicate(&RadiusPacket::from(request), &endpoint)
//!         .await?;
//!     println!("{}", response.code());
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod completion;
pub mod config;
pub mod error;
pub mod identifier;
pub mod retry;
pub mod timer;

pub use client::{Endpoint, RadiusClient};
pub use completion::{Completion, CompletionHandle};
pub use config::{ClientConfig, ConfigError};
pub use error::{ClientError, ClientResult};
pub use identifier::{IdentifierAllocator, RandomIdentifiers, SequentialIdentifiers};
pub use retry::{RetryConfig, RetryScheduler};
pub use timer::{Timer, TimerCallback, TimerHandle, TimerService};
