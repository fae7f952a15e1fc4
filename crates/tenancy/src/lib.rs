//! `clinerp-tenancy` — the tenant (company) entity.

pub mod tenant;

pub use tenant::{TRIAL_PERIOD_DAYS, Tenant, TenantStatus};
