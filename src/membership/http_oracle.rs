//! A [MembershipOracle] that asks the user service over HTTP.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    StatusCode,
    header::{COOKIE, HeaderValue},
};
use serde::Deserialize;

use crate::{
    Error, GroupId, UserID,
    membership::oracle::{Membership, MembershipOracle},
};

#[derive(Debug, Deserialize)]
struct SessionUserResponse {
    user_id: UserID,
}

/// HTTP client for the user service.
///
/// The client is shared by all requests. Every call is bounded by the timeout
/// given to [HttpMembershipOracle::new].
#[derive(Debug, Clone)]
pub struct HttpMembershipOracle {
    client: reqwest::Client,
    base_url: String,
    session_cookie_name: String,
}

impl HttpMembershipOracle {
    /// Create a client for the user service at `base_url`, e.g. "http://user:8080".
    ///
    /// `session_cookie_name` is the name of the cookie the session ID is forwarded in.
    ///
    /// # Errors
    /// Returns [Error::MembershipUnavailable] if the HTTP client cannot be initialized.
    pub fn new(
        base_url: &str,
        session_cookie_name: &str,
        timeout: Duration,
        max_idle_connections: usize,
    ) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(max_idle_connections)
            .build()
            .map_err(|error| {
                Error::MembershipUnavailable(format!("Failed to initialize HTTP client: {error}"))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            session_cookie_name: session_cookie_name.to_owned(),
        })
    }

    async fn get(&self, path: &str, session_id: Option<&str>) -> Result<reqwest::Response, Error> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("Asking the user service: GET {url}");

        let mut request = self.client.get(&url);

        if let Some(session_id) = session_id {
            let cookie = HeaderValue::from_str(&format!(
                "{}={}",
                self.session_cookie_name, session_id
            ))
            .map_err(|error| {
                Error::MembershipUnavailable(format!("Invalid session cookie: {error}"))
            })?;
            request = request.header(COOKIE, cookie);
        }

        request
            .send()
            .await
            .map_err(|error| Error::MembershipUnavailable(format!("GET {url} failed: {error}")))
    }
}

#[async_trait]
impl MembershipOracle for HttpMembershipOracle {
    async fn session_user(&self, session_id: &str) -> Result<Option<UserID>, Error> {
        let response = self.get("/users/session", Some(session_id)).await?;

        match response.status() {
            StatusCode::OK => {
                let body: SessionUserResponse = response.json().await.map_err(|error| {
                    Error::MembershipUnavailable(format!("Invalid session response: {error}"))
                })?;
                Ok(Some(body.user_id))
            }
            StatusCode::UNAUTHORIZED => Ok(None),
            status => Err(Error::MembershipUnavailable(format!(
                "Unexpected status {status} from session lookup"
            ))),
        }
    }

    async fn verify_membership(
        &self,
        group_id: GroupId,
        user_id: &UserID,
    ) -> Result<Membership, Error> {
        let path = format!("/groups/{group_id}/users/{user_id}/verify");
        let response = self.get(&path, None).await?;

        match response.status() {
            StatusCode::OK => Ok(Membership::Member),
            StatusCode::BAD_REQUEST | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                Ok(Membership::NotMember)
            }
            status => Err(Error::MembershipUnavailable(format!(
                "Unexpected status {status} from membership check"
            ))),
        }
    }
}

#[cfg(test)]
mod http_oracle_tests {
    use std::time::Duration;

    use axum::{
        Json, Router,
        extract::Path,
        http::{HeaderMap, StatusCode, header::COOKIE},
        routing::get,
    };
    use serde_json::json;

    use crate::{Error, UserID, membership::oracle::{Membership, MembershipOracle}};

    use super::HttpMembershipOracle;

    async fn session_handler(headers: HeaderMap) -> (StatusCode, Json<serde_json::Value>) {
        let cookie = headers
            .get(COOKIE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        if cookie == "session_id=good" {
            (StatusCode::OK, Json(json!({"user_id": "taro"})))
        } else if cookie == "session_id=broken" {
            (StatusCode::SERVICE_UNAVAILABLE, Json(json!({})))
        } else {
            (StatusCode::UNAUTHORIZED, Json(json!({"error": "no session"})))
        }
    }

    async fn verify_handler(Path((group_id, user_id)): Path<(i64, String)>) -> StatusCode {
        match (group_id, user_id.as_str()) {
            (7, "taro") => StatusCode::OK,
            (8, _) => StatusCode::INTERNAL_SERVER_ERROR,
            (9, _) => {
                tokio::time::sleep(Duration::from_secs(5)).await;
                StatusCode::OK
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Serve a stand-in user service on an ephemeral port and return its base URL.
    async fn spawn_user_service() -> String {
        let app = Router::new()
            .route("/users/session", get(session_handler))
            .route("/groups/{group_id}/users/{user_id}/verify", get(verify_handler));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Could not bind test listener");
        let address = listener.local_addr().expect("Could not get local address");

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test user service failed");
        });

        format!("http://{address}/")
    }

    async fn get_oracle() -> HttpMembershipOracle {
        let base_url = spawn_user_service().await;

        HttpMembershipOracle::new(&base_url, "session_id", Duration::from_millis(500), 2)
            .expect("Could not create oracle")
    }

    #[tokio::test]
    async fn resolves_session_user() {
        let oracle = get_oracle().await;

        assert_eq!(
            oracle.session_user("good").await,
            Ok(Some(UserID::new("taro")))
        );
    }

    #[tokio::test]
    async fn unknown_session_has_no_user() {
        let oracle = get_oracle().await;

        assert_eq!(oracle.session_user("expired").await, Ok(None));
    }

    #[tokio::test]
    async fn unexpected_session_status_is_unavailable() {
        let oracle = get_oracle().await;

        assert!(matches!(
            oracle.session_user("broken").await,
            Err(Error::MembershipUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn verifies_member() {
        let oracle = get_oracle().await;

        assert_eq!(
            oracle.verify_membership(7, &UserID::new("taro")).await,
            Ok(Membership::Member)
        );
    }

    #[tokio::test]
    async fn rejected_membership_is_not_member() {
        let oracle = get_oracle().await;

        assert_eq!(
            oracle.verify_membership(7, &UserID::new("jiro")).await,
            Ok(Membership::NotMember)
        );
    }

    #[tokio::test]
    async fn server_error_is_unavailable_not_member() {
        let oracle = get_oracle().await;

        assert!(matches!(
            oracle.verify_membership(8, &UserID::new("taro")).await,
            Err(Error::MembershipUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn timeout_is_unavailable() {
        let oracle = get_oracle().await;

        assert!(matches!(
            oracle.verify_membership(9, &UserID::new("taro")).await,
            Err(Error::MembershipUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_service_is_unavailable() {
        // Nothing listens on the discard port.
        let oracle = HttpMembershipOracle::new(
            "http://127.0.0.1:9",
            "session_id",
            Duration::from_millis(500),
            2,
        )
        .unwrap();

        assert!(matches!(
            oracle.verify_membership(7, &UserID::new("taro")).await,
            Err(Error::MembershipUnavailable(_))
        ));
    }
}
