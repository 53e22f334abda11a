#![allow(missing_docs)]

pub(crate) mod db;
pub(crate) mod http;
pub(crate) mod membership;

pub(crate) use db::{get_test_connection, settle_month_for_test, test_payload};
pub(crate) use http::{assert_content_type, parse_json_body};
pub(crate) use membership::{FakeMembershipOracle, session_cookie};
