// MCP tool surface over the lotto checker library
pub mod connection;
pub mod mcp_handler;
pub mod use_cases;

pub use mcp_handler::{MCPHandler, stdio};
pub use use_cases::{CheckUseCase, DrawUseCase, FetchUseCase};
