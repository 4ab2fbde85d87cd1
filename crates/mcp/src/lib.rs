//! MCP server exposing the Tienda Nube (Nuvemshop) REST API as tools.
//!
//! ## Architecture
//!
//! - [`TiendanubeMcpServer`]: rmcp `ServerHandler` over stdio
//! - [`registry`]: exact-name tool index, one [`registry::ToolCategory`] per resource
//! - [`tools`]: the categories themselves (products, orders, carts, ...)
//! - [`args`]: argument parsing and validation shared by all tools
//! - [`error`]: tool failures and the `{success: false, error, type}` envelope
//!
//! ## Example Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use tiendanube_client::StoreClient;
//! use tiendanube_core::{AppConfig, LoadOptions};
//! use tiendanube_mcp::TiendanubeMcpServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::load(LoadOptions::default())?;
//!     let client = StoreClient::from_config(&config)?;
//!     TiendanubeMcpServer::new(Arc::new(client))?.run_stdio().await
//! }
//! ```

pub mod args;
pub mod error;
pub mod registry;
mod server;
pub mod tools;

#[cfg(test)]
mod testing;

pub use error::{Domain, ToolError};
pub use registry::{RegistryError, ToolCategory, ToolDefinition, ToolRegistry};
pub use server::{TiendanubeMcpServer, SERVER_NAME};
