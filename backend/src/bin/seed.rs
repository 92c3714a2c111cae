//! Loads demo teams and accounts. Safe to re-run: existing accounts are kept.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use leave_ledger_backend::{
    config::Config,
    db::connection::create_pool,
    models::user::{User, UserRole},
    repositories::{user as user_repo, LeaveBalanceRepository},
    types::TeamId,
    utils::password::hash_password,
};

const DEMO_PASSWORD: &str = "password123";

struct SeedUser {
    email: &'static str,
    name: &'static str,
    role: UserRole,
    team: &'static str,
}

const USERS: &[SeedUser] = &[
    SeedUser {
        email: "admin@example.com",
        name: "Admin User",
        role: UserRole::Admin,
        team: "Engineering",
    },
    SeedUser {
        email: "manager.eng@example.com",
        name: "Engineering Manager",
        role: UserRole::Manager,
        team: "Engineering",
    },
    SeedUser {
        email: "manager.product@example.com",
        name: "Product Manager",
        role: UserRole::Manager,
        team: "Product",
    },
    SeedUser {
        email: "john.doe@example.com",
        name: "John Doe",
        role: UserRole::Employee,
        team: "Engineering",
    },
    SeedUser {
        email: "jane.smith@example.com",
        name: "Jane Smith",
        role: UserRole::Employee,
        team: "Engineering",
    },
    SeedUser {
        email: "bob.johnson@example.com",
        name: "Bob Johnson",
        role: UserRole::Employee,
        team: "Product",
    },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seed=info,leave_ledger_backend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let mut tx = pool.begin().await?;
    let mut teams: Vec<(&str, TeamId)> = Vec::new();
    for name in ["Engineering", "Product"] {
        let team = user_repo::upsert_team(&mut *tx, name).await?;
        teams.push((name, team.id));
    }
    tx.commit().await?;

    let password_hash = hash_password(DEMO_PASSWORD)?;
    let mut created = 0;
    for seed in USERS {
        let team_id = teams
            .iter()
            .find(|(name, _)| *name == seed.team)
            .map(|(_, id)| *id)
            .ok_or_else(|| anyhow::anyhow!("unknown seed team {}", seed.team))?;

        if user_repo::email_exists(&pool, seed.email).await? {
            tracing::info!(email = seed.email, "user already present, skipping");
            continue;
        }

        let mut tx = pool.begin().await?;
        let user = User::new(
            seed.email.to_string(),
            password_hash.clone(),
            seed.name.to_string(),
            seed.role,
            team_id,
        );
        let user = user_repo::insert_user(&mut *tx, &user).await?;
        LeaveBalanceRepository::insert_default(&mut *tx, user.id, config.leave_allotments).await?;
        if user.role == UserRole::Manager {
            user_repo::set_team_manager(&mut *tx, team_id, user.id).await?;
        }
        tx.commit().await?;

        tracing::info!(email = seed.email, role = seed.role.as_str(), team = seed.team, "seeded user");
        created += 1;
    }

    tracing::info!(created, total = USERS.len(), "seed complete");
    Ok(())
}
