//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{
    Error, MembershipOracle,
    db::{initialize, set_busy_timeout},
};

/// The state of the REST server.
#[derive(Clone)]
pub struct AppState {
    /// The name of the cookie that holds the session ID.
    pub session_cookie_name: String,

    /// Resolves sessions and group membership.
    pub membership_oracle: Arc<dyn MembershipOracle>,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `sql_timeout` bounds how long a write waits for another connection's lock.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        sql_timeout: std::time::Duration,
        session_cookie_name: &str,
        membership_oracle: Arc<dyn MembershipOracle>,
    ) -> Result<Self, Error> {
        set_busy_timeout(&db_connection, sql_timeout)?;
        initialize(&db_connection)?;

        Ok(Self {
            session_cookie_name: session_cookie_name.to_owned(),
            membership_oracle,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("session_cookie_name", &self.session_cookie_name)
            .field("db_connection", &self.db_connection)
            .finish_non_exhaustive()
    }
}
