//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `userstore_core` linkage.
//! - Exercise the increment workflow end to end on a throwaway database.

use userstore_core::db::open_db_in_memory;
use userstore_core::{increment_user_age, NewUser, SqliteUserRepository, UserRepository};

fn main() {
    println!("userstore_core ping={}", userstore_core::ping());
    println!("userstore_core version={}", userstore_core::core_version());

    let mut conn = match open_db_in_memory() {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("failed to open in-memory database: {err}");
            std::process::exit(1);
        }
    };

    let user = SqliteUserRepository::try_new(&conn)
        .and_then(|repo| repo.create_user(&NewUser::new("smoke", "smoke@example.com", 20)))
        .unwrap_or_else(|err| {
            eprintln!("failed to seed user: {err}");
            std::process::exit(1);
        });

    match increment_user_age(&mut conn, user.id) {
        Ok(new_age) => println!("user id={} age {} -> {new_age}", user.id, user.age),
        Err(err) => {
            eprintln!("increment failed: {err}");
            std::process::exit(1);
        }
    }
}
