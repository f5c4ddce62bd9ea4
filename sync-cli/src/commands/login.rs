//! Store or remove the backend auth token.

use anyhow::{Context, Result};
use cleanout_sync_client::{KeyValueStore, AUTH_TOKEN_KEY};

/// Run the login command.
pub async fn login(store: &dyn KeyValueStore, token: &str) -> Result<()> {
    let token = token.trim();
    if token.is_empty() {
        anyhow::bail!("Token must not be empty");
    }

    store
        .set(AUTH_TOKEN_KEY, token)
        .await
        .context("Failed to save auth token")?;

    println!("Logged in; requests will carry the stored token.");
    Ok(())
}

/// Run the logout command.
pub async fn logout(store: &dyn KeyValueStore) -> Result<()> {
    store
        .remove(AUTH_TOKEN_KEY)
        .await
        .context("Failed to remove auth token")?;

    println!("Logged out.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cleanout_sync_client::MemoryStore;

    #[tokio::test]
    async fn login_stores_trimmed_token() {
        let store = MemoryStore::new();

        login(&store, "  tok-123\n").await.unwrap();

        assert_eq!(
            store.get(AUTH_TOKEN_KEY).await.unwrap().as_deref(),
            Some("tok-123")
        );
    }

    #[tokio::test]
    async fn login_rejects_blank_token() {
        let store = MemoryStore::new();
        assert!(login(&store, "   ").await.is_err());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn logout_removes_token() {
        let store = MemoryStore::new();
        login(&store, "tok").await.unwrap();

        logout(&store).await.unwrap();
        logout(&store).await.unwrap();

        assert_eq!(store.get(AUTH_TOKEN_KEY).await.unwrap(), None);
    }
}
