//! Opaque credentials for store adapters
//!
//! Adapters resolve a credential before every call and never interpret it;
//! how identities are obtained is the provider's business.

use std::fmt;
use strata_tier_core::{Error, Result};

/// An opaque credential
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a secret
    pub fn new(secret: impl Into<String>) -> Self {
        Credential(secret.into())
    }

    /// The empty credential used by stores that need none
    pub fn anonymous() -> Self {
        Credential(String::new())
    }

    /// Expose the secret to the backend
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(**redacted**)")
    }
}

/// Supplies credentials to store adapters
pub trait CredentialProvider: Send + Sync {
    /// Resolve a credential for the next call
    fn credential(&self) -> Result<Credential>;
}

/// Provider for stores that need no credentials
#[derive(Debug, Clone, Copy, Default)]
pub struct Anonymous;

impl CredentialProvider for Anonymous {
    fn credential(&self) -> Result<Credential> {
        Ok(Credential::anonymous())
    }
}

/// Provider returning a fixed credential
#[derive(Debug, Clone)]
pub struct StaticCredentials(Credential);

impl StaticCredentials {
    /// Wrap a fixed secret
    pub fn new(secret: impl Into<String>) -> Self {
        StaticCredentials(Credential::new(secret))
    }
}

impl CredentialProvider for StaticCredentials {
    fn credential(&self) -> Result<Credential> {
        Ok(self.0.clone())
    }
}

/// Resolve a credential, reporting provider failures as transient
pub(crate) fn resolve(provider: &dyn CredentialProvider, operation: &str) -> Result<Credential> {
    provider.credential().map_err(|e| match e {
        Error::TransientStore { .. } | Error::Timeout { .. } => e,
        other => Error::transient(operation, format!("credential provider: {}", other)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Broken;

    impl CredentialProvider for Broken {
        fn credential(&self) -> Result<Credential> {
            Err(Error::Internal("token endpoint unreachable".into()))
        }
    }

    #[test]
    fn test_debug_redacts_secret() {
        let cred = Credential::new("hunter2");
        assert!(!format!("{:?}", cred).contains("hunter2"));
        assert_eq!(cred.expose(), "hunter2");
    }

    #[test]
    fn test_provider_failure_is_transient() {
        let err = resolve(&Broken, "cold.get").unwrap_err();
        assert!(err.is_transient());
        assert!(err.to_string().contains("token endpoint unreachable"));
    }

    #[test]
    fn test_static_provider() {
        let provider = StaticCredentials::new("k");
        assert_eq!(resolve(&provider, "hot.get").unwrap().expose(), "k");
        assert_eq!(resolve(&Anonymous, "hot.get").unwrap(), Credential::anonymous());
    }
}
