//! Service account credentials decoded to a per-run key file.

use crate::executor::CommandSpec;
use crate::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use pulumi_action_events::{register_secret, register_secrets};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// A decoded key file, removed when dropped.
#[derive(Debug)]
pub struct CredentialFile {
    file: NamedTempFile,
}

impl CredentialFile {
    /// Decode a base64 key and write it to a fresh temporary file.
    ///
    /// The encoded blob and the key material are registered for log
    /// redaction before anything else happens with them.
    pub fn from_base64(blob: &str) -> Result<Self> {
        let blob = blob.trim();
        register_secret(blob);

        let decoded = STANDARD
            .decode(blob)
            .map_err(|e| Error::auth(format!("credentials are not valid base64: {e}")))?;
        register_key_material(&decoded);

        let mut file = tempfile::Builder::new()
            .prefix("pulumi-action-credentials-")
            .suffix(".json")
            .tempfile()
            .map_err(|e| Error::io(e, None, "creating credentials file"))?;
        file.write_all(&decoded)
            .and_then(|()| file.flush())
            .map_err(|e| Error::io(e, Some(file.path().to_path_buf()), "writing credentials file"))?;

        tracing::debug!(path = %file.path().display(), "wrote credentials file");
        Ok(Self { file })
    }

    /// Location of the key file.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// `gcloud` invocation that activates the service account.
    #[must_use]
    pub fn activation_command(&self) -> CommandSpec {
        CommandSpec::program(
            "gcloud",
            [
                "auth".to_string(),
                "activate-service-account".to_string(),
                format!("--key-file={}", self.path().display()),
            ],
        )
    }
}

fn register_key_material(decoded: &[u8]) {
    let Ok(text) = std::str::from_utf8(decoded) else {
        return;
    };
    register_secret(text.trim());

    // Keys are printed line by line, so each line of the private key counts.
    let key = serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| v.get("private_key")?.as_str().map(str::to_owned));
    if let Some(key) = key {
        register_secrets(
            key.lines()
                .filter(|l| !l.starts_with("-----"))
                .map(str::trim),
        );
    }
}
