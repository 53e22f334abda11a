//! Group membership as decided by the user service.
//!
//! This module contains:
//! - The [MembershipOracle] trait that the rest of the service depends on
//! - An HTTP implementation that talks to the user service
//! - The middleware that guards every group-scoped route

mod http_oracle;
mod middleware;
mod oracle;

pub use http_oracle::HttpMembershipOracle;
pub use middleware::group_guard;
pub use oracle::{Membership, MembershipOracle};
