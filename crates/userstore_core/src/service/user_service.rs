//! User use-case service and the transactional age-increment workflow.
//!
//! # Responsibility
//! - Provide stable CRUD entry points for core callers.
//! - Execute read-increment-write as one atomic transaction.
//!
//! # Invariants
//! - The workflow reads and writes only through a handle bound to its own
//!   transaction, never through the raw connection.
//! - The transaction is closed exactly once on every exit path: commit on
//!   success, rollback on any failure. Early returns cannot leak an open
//!   transaction because `rusqlite::Transaction` rolls back on drop.
//! - The new age is computed in-process; no arithmetic is delegated to SQL.

use crate::db::DbError;
use crate::model::user::{NewUser, User, UserId};
use crate::repo::user_repo::{RepoError, RepoResult, SqliteUserRepository, UserRepository};
use log::{error, info};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Use-case service wrapper for user CRUD operations.
pub struct UserService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a new user and returns it with the store-assigned id.
    pub fn create_user(&self, user: &NewUser) -> RepoResult<User> {
        self.repo.create_user(user)
    }

    /// Gets one user by stable id.
    pub fn get_user(&self, id: UserId) -> RepoResult<User> {
        self.repo.get_user(id)
    }

    /// Sets a user's age to an absolute value.
    ///
    /// For the atomic read-modify-write path use `increment_user_age`.
    pub fn update_age(&self, id: UserId, age: i64) -> RepoResult<()> {
        self.repo.update_age(id, age)
    }
}

/// Failure of the increment workflow, tagged by the step that failed.
///
/// Each step is surfaced distinctly so callers can decide whether to retry:
/// begin and transport failures are transient, not-found is not, and a commit
/// failure leaves the outcome unknown until the caller re-reads.
#[derive(Debug)]
pub enum IncrementError {
    /// The transaction could not be opened. Nothing was rolled back because
    /// nothing was started.
    Begin(DbError),
    /// Reading the user failed; carries `RepoError::NotFound` for missing ids.
    Read(RepoError),
    /// Writing the new age failed.
    Update(RepoError),
    /// The commit itself failed. The write may or may not have persisted;
    /// the caller must re-read the user before retrying.
    Commit(DbError),
}

impl IncrementError {
    /// Whether retrying the whole workflow can plausibly succeed.
    ///
    /// After a `Commit` failure the caller must verify the persisted age
    /// first; see `outcome_uncertain`.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Begin(_) | Self::Commit(_) => true,
            Self::Read(err) | Self::Update(err) => err.is_transient(),
        }
    }

    /// True when the store may have persisted the write despite the error.
    pub fn outcome_uncertain(&self) -> bool {
        matches!(self, Self::Commit(_))
    }
}

impl Display for IncrementError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Begin(err) => write!(f, "failed to begin transaction: {err}"),
            Self::Read(err) => write!(f, "failed to read user: {err}"),
            Self::Update(err) => write!(f, "failed to write new age: {err}"),
            Self::Commit(err) => write!(f, "failed to commit (outcome unknown): {err}"),
        }
    }
}

impl Error for IncrementError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Begin(err) | Self::Commit(err) => Some(err),
            Self::Read(err) | Self::Update(err) => Some(err),
        }
    }
}

/// Atomically increments one user's age by exactly 1.
///
/// Begins an immediate transaction on `conn`, reads the user through a handle
/// bound to that transaction, computes `age + 1` in-process, writes it back
/// through the same handle and commits. Returns the new age.
///
/// # Contract
/// - On success the persisted age is exactly `old + 1` and only `age` (plus
///   the row's `updated_at`) changed.
/// - On any failure zero changes persist; rollback happens before returning.
/// - A rollback failure is logged as a secondary error and never replaces
///   the original one.
/// - Concurrent calls on the same id serialize at the store via the immediate
///   write lock; the caller's connection is never closed here.
pub fn increment_user_age(conn: &mut Connection, id: UserId) -> Result<i64, IncrementError> {
    let started_at = Instant::now();
    info!("event=age_increment module=service status=start user_id={id}");

    let tx = match conn.transaction_with_behavior(TransactionBehavior::Immediate) {
        Ok(tx) => tx,
        Err(err) => {
            let begin_err = IncrementError::Begin(err.into());
            log_failure(&begin_err, id, started_at);
            return Err(begin_err);
        }
    };

    let outcome = {
        let repo = SqliteUserRepository::bound(&tx);
        run_increment(&repo, id)
    };

    let new_age = match outcome {
        Ok(new_age) => new_age,
        Err(err) => {
            rollback_logged(tx, id);
            log_failure(&err, id, started_at);
            return Err(err);
        }
    };

    if let Err(err) = tx.commit() {
        let commit_err = IncrementError::Commit(err.into());
        log_failure(&commit_err, id, started_at);
        return Err(commit_err);
    }

    info!(
        "event=age_increment module=service status=ok user_id={id} new_age={new_age} duration_ms={}",
        started_at.elapsed().as_millis()
    );
    Ok(new_age)
}

/// Read-compute-write steps against a transaction-bound repository.
fn run_increment<R: UserRepository>(repo: &R, id: UserId) -> Result<i64, IncrementError> {
    let user = repo.get_user(id).map_err(IncrementError::Read)?;
    let new_age = user.age + 1;
    repo.update_age(id, new_age)
        .map_err(IncrementError::Update)?;
    Ok(new_age)
}

fn rollback_logged(tx: Transaction<'_>, id: UserId) {
    if let Err(err) = tx.rollback() {
        error!("event=tx_rollback module=service status=error user_id={id} error={err}");
    }
}

fn log_failure(err: &IncrementError, id: UserId, started_at: Instant) {
    let stage = match err {
        IncrementError::Begin(_) => "begin",
        IncrementError::Read(_) => "read",
        IncrementError::Update(_) => "update",
        IncrementError::Commit(_) => "commit",
    };
    error!(
        "event=age_increment module=service status=error user_id={id} stage={stage} duration_ms={} error={err}",
        started_at.elapsed().as_millis()
    );
}

#[cfg(test)]
mod tests {
    use super::{run_increment, IncrementError};
    use crate::model::user::{NewUser, User, UserId};
    use crate::repo::user_repo::{RepoError, RepoResult, UserRepository};
    use std::cell::RefCell;

    struct ScriptedRepo {
        age: i64,
        fail_update: bool,
        written: RefCell<Option<i64>>,
    }

    impl UserRepository for ScriptedRepo {
        fn create_user(&self, _user: &NewUser) -> RepoResult<User> {
            unreachable!("workflow never creates users")
        }

        fn get_user(&self, id: UserId) -> RepoResult<User> {
            Ok(User {
                id,
                name: "test".to_string(),
                email: "test@test.com".to_string(),
                age: self.age,
            })
        }

        fn update_age(&self, id: UserId, age: i64) -> RepoResult<()> {
            if self.fail_update {
                return Err(RepoError::NotFound(id));
            }
            *self.written.borrow_mut() = Some(age);
            Ok(())
        }
    }

    #[test]
    fn run_increment_writes_age_plus_one() {
        let repo = ScriptedRepo {
            age: 20,
            fail_update: false,
            written: RefCell::new(None),
        };

        let new_age = run_increment(&repo, 1).unwrap();
        assert_eq!(new_age, 21);
        assert_eq!(*repo.written.borrow(), Some(21));
    }

    #[test]
    fn run_increment_tags_update_failures() {
        let repo = ScriptedRepo {
            age: 20,
            fail_update: true,
            written: RefCell::new(None),
        };

        let err = run_increment(&repo, 7).unwrap_err();
        assert!(matches!(
            err,
            IncrementError::Update(RepoError::NotFound(7))
        ));
        assert!(!err.is_retryable());
        assert!(!err.outcome_uncertain());
    }
}
