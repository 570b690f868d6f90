//! Idea board backend library.
//!
//! Hexagonal layout: `domain` holds types, services, and ports; `inbound`
//! adapts HTTP onto the services; `outbound` implements the ports over
//! PostgreSQL, memory, and the security primitives.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
