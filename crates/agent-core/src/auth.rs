use std::{path::Path, sync::Arc};

use russh::{
    client,
    keys::{self, PrivateKeyWithHashAlg},
};
use tokio::fs;
use tracing::{debug, info};
use tunnel_core::session::SessionHandle;

// Internal Result type alias
type Result<T> = crate::AgentResult<T>;

/// Load the identity key for one session attempt.
///
/// Only unencrypted key material is supported: this process runs
/// unattended, so an encrypted key is a configuration problem, not a
/// prompt.
pub async fn load_private_key(path: &Path) -> Result<Arc<keys::PrivateKey>> {
    let data = fs::read_to_string(path)
        .await
        .map_err(crate::AgentError::Io)?;
    match keys::decode_secret_key(&data, None) {
        Ok(key) => Ok(Arc::new(key)),
        Err(keys::Error::KeyIsEncrypted) => Err(crate::AgentError::AuthFailed(format!(
            "private key {} is encrypted; only unencrypted keys are supported",
            path.display()
        ))),
        Err(err) => Err(crate::AgentError::AuthFailed(format!(
            "{} is not a valid private key: {err}",
            path.display()
        ))),
    }
}

/// Authenticate the session with the single configured key identity.
pub async fn authenticate<H>(
    session: &mut SessionHandle<H>,
    username: &str,
    key: Arc<keys::PrivateKey>,
) -> Result<()>
where
    H: client::Handler + Send,
{
    let rsa_hash_hint = session.best_supported_rsa_hash().await.unwrap_or(None).flatten();
    let hash_alg = if key.algorithm().is_rsa() {
        rsa_hash_hint
    } else {
        None
    };
    debug!(key = ?key.algorithm(), "attempting public-key auth");
    let key = PrivateKeyWithHashAlg::new(key, hash_alg);
    match session.authenticate_publickey(username.to_string(), key).await {
        Ok(result) if result.success() => {
            info!(method = "publickey", "authentication succeeded");
            Ok(())
        }
        Ok(_) => Err(crate::AgentError::AuthFailed(
            "public key rejected by server".to_string(),
        )),
        Err(err) => Err(crate::AgentError::AuthFailed(format!(
            "authentication attempt failed: {err}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_file_is_an_io_error() {
        let err = load_private_key(Path::new("/nonexistent/tether-test-key"))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::AgentError::Io(_)));
    }

    #[tokio::test]
    async fn garbage_key_material_is_an_auth_error() {
        let mut path = std::env::temp_dir();
        path.push(format!("tether-bad-key-{}", std::process::id()));
        tokio::fs::write(&path, "not a key").await.unwrap();

        let err = load_private_key(&path).await.unwrap_err();
        assert!(matches!(err, crate::AgentError::AuthFailed(_)));

        let _ = tokio::fs::remove_file(&path).await;
    }
}
