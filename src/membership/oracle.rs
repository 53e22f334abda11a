//! The contract between the account service and the user service.

use async_trait::async_trait;

use crate::{Error, GroupId, UserID};

/// Whether a user belongs to a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    /// The user is a member of the group.
    Member,
    /// The user is not a member of the group, or the group does not exist.
    NotMember,
}

/// Answers who is behind a session and which groups they belong to.
///
/// Implementations report a failure to get an answer as
/// [Error::MembershipUnavailable], which must never be treated as a member.
#[async_trait]
pub trait MembershipOracle: Send + Sync {
    /// Look up the user of the session `session_id`.
    ///
    /// Returns `None` if the session does not exist or has expired.
    async fn session_user(&self, session_id: &str) -> Result<Option<UserID>, Error>;

    /// Check whether `user_id` is a member of `group_id`.
    async fn verify_membership(
        &self,
        group_id: GroupId,
        user_id: &UserID,
    ) -> Result<Membership, Error>;
}
