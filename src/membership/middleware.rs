//! Middleware that admits a request to a group's routes only if the session
//! user is a member of that group.

use std::sync::Arc;

use axum::{
    extract::{FromRef, RawPathParams, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;

use crate::{
    AppState, Error, GroupId,
    membership::oracle::{Membership, MembershipOracle},
};

/// The state needed for the group guard.
#[derive(Clone)]
pub struct GroupGuardState {
    /// The name of the cookie that holds the session ID.
    pub session_cookie_name: String,
    /// Resolves sessions and group membership.
    pub membership_oracle: Arc<dyn MembershipOracle>,
}

impl FromRef<AppState> for GroupGuardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            session_cookie_name: state.session_cookie_name.clone(),
            membership_oracle: state.membership_oracle.clone(),
        }
    }
}

/// Middleware function that checks the session cookie and the user's membership
/// of the group in the `{group_id}` path parameter.
///
/// The request is executed normally if the user is a member. Otherwise:
/// - a missing cookie or unknown session gets 401,
/// - a user that is not a member gets 400,
/// - and a user service that cannot be reached gets 500.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
///
/// **Note**: This middleware must be added with `route_layer` so that the path parameters are available.
pub async fn group_guard(
    State(state): State<GroupGuardState>,
    jar: CookieJar,
    path_params: RawPathParams,
    mut request: Request,
    next: Next,
) -> Response {
    let group_id = match parse_group_id(&path_params) {
        Ok(group_id) => group_id,
        Err(error) => return error.into_response(),
    };

    let session_id = match jar.get(&state.session_cookie_name) {
        Some(cookie) => cookie.value().to_owned(),
        None => return Error::NoSession.into_response(),
    };

    let user_id = match state.membership_oracle.session_user(&session_id).await {
        Ok(Some(user_id)) => user_id,
        Ok(None) => return Error::NoSession.into_response(),
        Err(error) => return error.into_response(),
    };

    match state
        .membership_oracle
        .verify_membership(group_id, &user_id)
        .await
    {
        Ok(Membership::Member) => {}
        Ok(Membership::NotMember) => {
            tracing::warn!("User {user_id} tried to access group {group_id} without being a member");
            return Error::NotGroupMember(user_id, group_id).into_response();
        }
        Err(error) => return error.into_response(),
    }

    request.extensions_mut().insert(user_id);
    next.run(request).await
}

fn parse_group_id(path_params: &RawPathParams) -> Result<GroupId, Error> {
    let raw_group_id = path_params
        .iter()
        .find(|(name, _)| *name == "group_id")
        .map(|(_, value)| value)
        .ok_or_else(|| Error::InvalidPayload("missing group ID".to_owned()))?;

    raw_group_id
        .parse()
        .map_err(|_| Error::InvalidPayload(format!("\"{raw_group_id}\" is not a valid group ID")))
}
