//! Route handlers. Each one authenticates, makes its upstream call(s) and
//! returns the upstream payload as JSON.

pub mod analysis;
pub mod analytics;
pub mod billing;
pub mod feedback;
pub mod stats;
pub mod usage;
pub mod user;
