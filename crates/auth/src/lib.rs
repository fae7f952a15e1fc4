//! `clinerp-auth` — caller identity and tenant scoping.
//!
//! Authentication itself happens outside the core; this crate only models the
//! already-authenticated actor and the scope rules derived from it.

pub mod actor;
pub mod scope;

pub use actor::Actor;
pub use scope::{TenantScope, stamp_tenant};
