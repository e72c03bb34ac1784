//! Credential persistence.
//!
//! `settings.json` holds the key sealed with AES-256-GCM; the 32-byte sealing
//! key lives next to it in `.settings_key`, readable by the owner only.
//! Sealed values are `base64(nonce || ciphertext)`.

use std::path::{Path, PathBuf};

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use anyhow::{anyhow, Context};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use tokio::fs;
use tracing::{debug, info, warn};

use super::UserSettings;

const SETTINGS_FILE: &str = "settings.json";
const KEY_FILE: &str = ".settings_key";
const NONCE_LEN: usize = 12;

struct Vault {
    cipher: Aes256Gcm,
}

impl Vault {
    fn new(key: &[u8; 32]) -> Self {
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key)),
        }
    }

    fn seal(&self, secret: &str) -> anyhow::Result<String> {
        let nonce: [u8; NONCE_LEN] = rand::random();
        let sealed = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), secret.as_bytes())
            .map_err(|e| anyhow!("sealing credential failed: {e}"))?;
        Ok(BASE64.encode([nonce.as_slice(), sealed.as_slice()].concat()))
    }

    fn open(&self, sealed: &str) -> anyhow::Result<String> {
        let raw = BASE64.decode(sealed).context("sealed credential is not base64")?;
        if raw.len() <= NONCE_LEN {
            return Err(anyhow!("sealed credential is truncated"));
        }
        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        let plain = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| anyhow!("opening credential failed: {e}"))?;
        Ok(String::from_utf8(plain)?)
    }
}

pub struct SettingsStorage {
    dir: PathBuf,
}

impl SettingsStorage {
    pub fn with_path(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn settings_file(&self) -> PathBuf {
        self.dir.join(SETTINGS_FILE)
    }

    fn key_file(&self) -> PathBuf {
        self.dir.join(KEY_FILE)
    }

    async fn vault(&self) -> anyhow::Result<Vault> {
        fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("creating {}", self.dir.display()))?;

        let path = self.key_file();
        if fs::try_exists(&path).await? {
            let encoded = fs::read_to_string(&path).await?;
            match BASE64.decode(encoded.trim()).map(<[u8; 32]>::try_from) {
                Ok(Ok(key)) => return Ok(Vault::new(&key)),
                _ => warn!(path = %path.display(), "Unreadable settings key, generating a new one"),
            }
        }

        let key: [u8; 32] = rand::random();
        fs::write(&path, BASE64.encode(key)).await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).await?;
        }
        info!(path = %path.display(), "Generated settings key");
        Ok(Vault::new(&key))
    }

    /// Defaults when nothing was saved yet. A credential that cannot be
    /// opened is dropped with a warning rather than failing the load.
    pub async fn load(&self) -> anyhow::Result<UserSettings> {
        let path = self.settings_file();
        if !fs::try_exists(&path).await? {
            debug!(path = %path.display(), "No settings file yet");
            return Ok(UserSettings::default());
        }

        let raw = fs::read_to_string(&path).await?;
        let mut settings: UserSettings =
            serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;

        if let Some(sealed) = settings.api_key.take().filter(|k| !k.is_empty()) {
            let vault = self.vault().await?;
            match vault.open(&sealed) {
                Ok(key) => settings.api_key = Some(key),
                Err(e) => warn!(error = %e, "Stored credential could not be decrypted, ignoring it"),
            }
        }
        Ok(settings)
    }

    pub async fn save(&self, settings: &UserSettings) -> anyhow::Result<()> {
        let vault = self.vault().await?;
        let sealed = UserSettings {
            api_key: settings
                .api_key
                .as_deref()
                .filter(|k| !k.is_empty())
                .map(|k| vault.seal(k))
                .transpose()?,
            updated_at: settings.updated_at,
        };

        let path = self.settings_file();
        fs::write(&path, serde_json::to_string_pretty(&sealed)?).await?;
        info!(path = %path.display(), "Settings saved");
        Ok(())
    }
}
