use std::sync::Arc;

use crate::services::error::ServiceError;
use crate::services::roles::AuthoritySet;
use crate::services::store::UserDirectory;
use crate::utils::{hash_password, verify_password, Password, PasswordHashString};

/// Confirms that a caller owns the identity they claim.
#[derive(Clone)]
pub struct CredentialVerifier {
    directory: Arc<dyn UserDirectory>,
    /// Verified against when the identity is unknown, so both failure paths
    /// do one Argon2 computation.
    decoy_hash: PasswordHashString,
}

impl CredentialVerifier {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Result<Self, anyhow::Error> {
        let decoy = Password::new(uuid::Uuid::new_v4().to_string());
        let decoy_hash = hash_password(&decoy)?;
        Ok(Self {
            directory,
            decoy_hash,
        })
    }

    /// Returns the stored authorities on success.
    ///
    /// Fails with `UnknownIdentity` or `BadCredential`; callers must not let
    /// the difference reach the client. Directory failures propagate as-is.
    #[tracing::instrument(skip(self, secret))]
    pub async fn verify(
        &self,
        identity: &str,
        secret: &Password,
    ) -> Result<AuthoritySet, ServiceError> {
        let entry = self.directory.find_by_identity(identity).await?;

        let Some(entry) = entry else {
            let _ = verify_password(secret, &self.decoy_hash);
            return Err(ServiceError::UnknownIdentity);
        };

        let stored = PasswordHashString::new(entry.secret_hash);
        if !verify_password(secret, &stored) {
            return Err(ServiceError::BadCredential);
        }

        Ok(entry.authorities)
    }
}
