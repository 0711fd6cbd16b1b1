//! User repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide the read/update contract the increment workflow depends on.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Write paths validate user data before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - The same repository type binds to either a live connection or an open
//!   transaction; behavior is identical, only isolation differs.

use crate::db::{migrations, DbError};
use crate::model::user::{validate_age, NewUser, User, UserId, UserValidationError};
use rusqlite::{params, Connection, Row, Transaction};
use std::error::Error;
use std::fmt::{Display, Formatter};

const USER_SELECT_SQL: &str = "SELECT id, name, email, age FROM users";

const REQUIRED_USER_COLUMNS: &[&str] = &["id", "name", "email", "age"];

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for user persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(UserValidationError),
    Db(DbError),
    NotFound(UserId),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl RepoError {
    /// Whether the failure is a transient transport problem worth retrying.
    ///
    /// Not-found, validation and schema-shape errors require caller
    /// intervention and are never retryable.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Db(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "user not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted user data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection is not migrated: schema version {actual_version}, expected {expected_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "required table `{table}` does not exist")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "required column `{table}.{column}` does not exist")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<UserValidationError> for RepoError {
    fn from(value: UserValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Data-access contract required by the increment workflow.
///
/// `create_user` exists for entity lifecycle owned by callers (application
/// setup and tests); the workflow itself only reads and updates.
pub trait UserRepository {
    fn create_user(&self, user: &NewUser) -> RepoResult<User>;
    fn get_user(&self, id: UserId) -> RepoResult<User>;
    fn update_age(&self, id: UserId, age: i64) -> RepoResult<()>;
}

/// SQLite-backed user repository.
///
/// Two binding contexts share this type: `try_new` for direct use against a
/// migrated connection, `bound` for use inside an open transaction.
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated, ready connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when the schema version is absent.
    /// - `MissingRequiredTable` / `MissingRequiredColumn` when the `users`
    ///   shape does not match what queries assume.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    /// Binds a repository to an open transaction.
    ///
    /// All statements issued through the returned handle participate in the
    /// transaction. Readiness checks are skipped: transactions are only
    /// obtainable from connections that already passed bootstrap.
    pub fn bound(tx: &'conn Transaction<'_>) -> Self {
        Self { conn: tx }
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &NewUser) -> RepoResult<User> {
        user.validate()?;

        self.conn.execute(
            "INSERT INTO users (name, email, age) VALUES (?1, ?2, ?3);",
            params![user.name.as_str(), user.email.as_str(), user.age],
        )?;

        Ok(User {
            id: self.conn.last_insert_rowid(),
            name: user.name.clone(),
            email: user.email.clone(),
            age: user.age,
        })
    }

    fn get_user(&self, id: UserId) -> RepoResult<User> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => parse_user_row(row),
            None => Err(RepoError::NotFound(id)),
        }
    }

    fn update_age(&self, id: UserId, age: i64) -> RepoResult<()> {
        validate_age(age)?;

        let changed = self.conn.execute(
            "UPDATE users
             SET
                age = ?2,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1;",
            params![id, age],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    let age: i64 = row.get("age")?;
    if age < 0 {
        return Err(RepoError::InvalidData(format!(
            "negative age value `{age}` in users.age"
        )));
    }

    Ok(User {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        age,
    })
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = migrations::latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version == 0 {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let table_exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = 'users'
        );",
        [],
        |row| row.get(0),
    )?;
    if table_exists == 0 {
        return Err(RepoError::MissingRequiredTable("users"));
    }

    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('users');")?;
    let mut rows = stmt.query([])?;
    let mut present = Vec::new();
    while let Some(row) = rows.next()? {
        present.push(row.get::<_, String>(0)?);
    }
    for column in REQUIRED_USER_COLUMNS {
        if !present.iter().any(|name| name == column) {
            return Err(RepoError::MissingRequiredColumn {
                table: "users",
                column,
            });
        }
    }

    Ok(())
}
