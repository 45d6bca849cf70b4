//! Demo accounts loaded with `--seed-fixtures`.

use crate::auth::hash_password;
use crate::error::ProxyResult;
use crate::models::{NewUser, ROLE_ADMIN, ROLE_USER};
use crate::store::UserStore;

/// (first name, last name, email, password, roles)
const FIXTURE_USERS: [(&str, &str, &str, &str, &[&str]); 6] = [
    ("Admin", "User", "admin@rickmorty.com", "admin123", &[ROLE_ADMIN, ROLE_USER]),
    ("Rick", "Sanchez", "rick@rickmorty.com", "rick123", &[ROLE_USER]),
    ("Morty", "Smith", "morty@rickmorty.com", "morty123", &[ROLE_USER]),
    ("Summer", "Smith", "summer@rickmorty.com", "summer123", &[ROLE_USER]),
    ("Beth", "Smith", "beth@rickmorty.com", "beth123", &[ROLE_USER]),
    ("Jerry", "Smith", "jerry@rickmorty.com", "jerry123", &[ROLE_USER]),
];

/// Inserts the fixture accounts that do not exist yet; returns how many were created.
pub async fn seed_users(store: &dyn UserStore) -> ProxyResult<usize> {
    let mut created = 0;
    for (first_name, last_name, email, password, roles) in FIXTURE_USERS {
        if store.find_by_email(email).await?.is_some() {
            continue;
        }
        store
            .insert(NewUser {
                email: email.to_string(),
                password_hash: hash_password(password)?,
                first_name: first_name.to_string(),
                last_name: last_name.to_string(),
                roles: roles.iter().map(|r| r.to_string()).collect(),
            })
            .await?;
        created += 1;
    }
    tracing::info!("Seeded {} fixture users", created);
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteUserStore;

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let store = SqliteUserStore::connect("sqlite::memory:").await.unwrap();
        store.migrate().await.unwrap();

        assert_eq!(seed_users(&store).await.unwrap(), FIXTURE_USERS.len());
        assert_eq!(seed_users(&store).await.unwrap(), 0);

        let admin = store
            .find_by_email("admin@rickmorty.com")
            .await
            .unwrap()
            .unwrap();
        assert!(admin.has_role(ROLE_ADMIN));
    }
}
