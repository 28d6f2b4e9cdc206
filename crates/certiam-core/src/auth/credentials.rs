use anyhow::{Context, Result};
use keyring::Entry;

const SERVICE_NAME: &str = "certiam";

pub struct CredentialStore;

impl CredentialStore {
    /// Store a bearer token for a username in the OS keychain
    pub fn store_token(username: &str, token: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, username)
            .context("Failed to create keyring entry")?;
        entry
            .set_password(token)
            .context("Failed to store token in keychain")?;
        Ok(())
    }

    /// Retrieve the token stored for a username
    pub fn get_token(username: &str) -> Result<String> {
        let entry = Entry::new(SERVICE_NAME, username)
            .context("Failed to create keyring entry")?;
        entry
            .get_password()
            .context("Failed to retrieve token from keychain")
    }

    /// Delete the stored token for a username
    pub fn delete(username: &str) -> Result<()> {
        let entry = Entry::new(SERVICE_NAME, username)
            .context("Failed to create keyring entry")?;
        entry
            .delete_credential()
            .context("Failed to delete credential from keychain")?;
        Ok(())
    }
}
