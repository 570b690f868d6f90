//! Request middleware.
//!
//! [`Trace`] tags every request with a trace identifier that handlers,
//! errors, and logs share.

pub mod trace;

pub use trace::Trace;
