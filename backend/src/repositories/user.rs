//! Repository functions for user accounts and teams.

use sqlx::{PgExecutor, PgPool};

use crate::models::team::Team;
use crate::models::user::User;
use crate::types::{TeamId, UserId};

const USER_COLUMNS: &str = "id, email, password_hash, name, role, team_id, created_at, updated_at";

pub async fn find_by_id(pool: &PgPool, user_id: UserId) -> Result<Option<User>, sqlx::Error> {
    let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
    sqlx::query_as::<_, User>(&query)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Emails are matched case-insensitively.
pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    let query = format!(
        "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
        USER_COLUMNS
    );
    sqlx::query_as::<_, User>(&query)
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))",
    )
    .bind(email)
    .fetch_one(pool)
    .await
}

pub async fn insert_user<'e, E>(executor: E, user: &User) -> Result<User, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let query = format!(
        "INSERT INTO users ({0}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {0}",
        USER_COLUMNS
    );
    sqlx::query_as::<_, User>(&query)
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(user.team_id)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(executor)
        .await
}

pub async fn find_team(pool: &PgPool, team_id: TeamId) -> Result<Option<Team>, sqlx::Error> {
    sqlx::query_as::<_, Team>(
        "SELECT id, name, manager_id, created_at, updated_at FROM teams WHERE id = $1",
    )
    .bind(team_id)
    .fetch_optional(pool)
    .await
}

/// Creates the team or returns the existing one with the same name.
pub async fn upsert_team<'e, E>(executor: E, name: &str) -> Result<Team, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, Team>(
        "INSERT INTO teams (id, name) VALUES ($1, $2) \
         ON CONFLICT (name) DO UPDATE SET updated_at = NOW() \
         RETURNING id, name, manager_id, created_at, updated_at",
    )
    .bind(TeamId::new())
    .bind(name)
    .fetch_one(executor)
    .await
}

pub async fn set_team_manager<'e, E>(
    executor: E,
    team_id: TeamId,
    manager_id: UserId,
) -> Result<(), sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query("UPDATE teams SET manager_id = $2, updated_at = NOW() WHERE id = $1")
        .bind(team_id)
        .bind(manager_id)
        .execute(executor)
        .await?;
    Ok(())
}
