use std::collections::HashSet;

use async_trait::async_trait;
use axum_extra::extract::cookie::Cookie;

use crate::{Error, GroupId, Membership, MembershipOracle, UserID};

/// The cookie name test servers are configured with.
pub(crate) const TEST_SESSION_COOKIE_NAME: &str = "session_id";

/// An in-process membership oracle where the session ID is the user ID.
#[derive(Debug, Default)]
pub(crate) struct FakeMembershipOracle {
    members: HashSet<(GroupId, UserID)>,
    unavailable: bool,
}

impl FakeMembershipOracle {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// An oracle that fails every call as if the user service were down.
    pub(crate) fn unavailable() -> Self {
        Self {
            members: HashSet::new(),
            unavailable: true,
        }
    }

    pub(crate) fn with_member(mut self, group_id: GroupId, user_id: &str) -> Self {
        self.members.insert((group_id, UserID::new(user_id)));
        self
    }

    fn check_available(&self) -> Result<(), Error> {
        if self.unavailable {
            return Err(Error::MembershipUnavailable(
                "the fake user service is down".to_owned(),
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl MembershipOracle for FakeMembershipOracle {
    async fn session_user(&self, session_id: &str) -> Result<Option<UserID>, Error> {
        self.check_available()?;

        let user_id = UserID::new(session_id);
        let known = self.members.iter().any(|(_, member)| *member == user_id);

        Ok(known.then_some(user_id))
    }

    async fn verify_membership(
        &self,
        group_id: GroupId,
        user_id: &UserID,
    ) -> Result<Membership, Error> {
        self.check_available()?;

        if self.members.contains(&(group_id, user_id.clone())) {
            Ok(Membership::Member)
        } else {
            Ok(Membership::NotMember)
        }
    }
}

/// A session cookie for `user_id` as understood by [FakeMembershipOracle].
pub(crate) fn session_cookie(user_id: &str) -> Cookie<'static> {
    Cookie::new(TEST_SESSION_COOKIE_NAME, user_id.to_owned())
}
