//! reconciliation engine: fetch, canonicalize, diff, plan, execute, verify.

mod client;
mod config;
mod error;
mod pipeline;
mod planner;
mod retry;
mod transport;
mod types;
pub mod url;


pub use client::{Client, ResourceList};
pub use config::{Config, RetryPolicy};
pub use error::{ApplyError, Error};
pub use pipeline::ApplyPlan;
pub use planner::{group_diffs, update_mask, ApiOperation, PlanEntry};
pub use transport::{CallContext, HttpTransport, Transport, TransportError};
pub use types::{ApplyOptions, Lifecycle, Method, Request, Resource};
