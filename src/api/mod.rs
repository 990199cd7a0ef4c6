//! HTTP API Handlers and Routes
//!
//! The REST surface of the research agent, built on the Axum web framework.
//!
//! # Module Structure
//!
//! - [`api::handlers`](crate::api::handlers) - Request handlers for each endpoint
//! - [`api::routes`](crate::api::routes) - Route definitions and router configuration
//!
//! # API Endpoints
//!
//! ## Research (`/api/research`)
//! - `POST /api/research` - Run a research loop and return a cited answer
//!
//! ## Health (`/health`)
//! - `GET /health` - Liveness check with the active providers
//!
//! # Request Body
//!
//! ```json
//! {
//!   "messages": [{"role": "user", "content": "What is the capital of France?"}],
//!   "number_of_initial_queries": 2,
//!   "max_research_loops": 1,
//!   "search_api_provider": "brave"
//! }
//! ```
//!
//! A bare `"topic"` string may replace `messages`. Every other field is an
//! optional per-run configuration override.

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;
