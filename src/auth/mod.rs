//! Access token storage
//!
//! The GitHub token is kept encrypted with AES-256-GCM in
//! ~/.config/gitpix/credentials.enc, keyed by a hash of machine-specific
//! identifiers. `GITPIX_TOKEN` takes precedence when set.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use anyhow::{Context, Result, anyhow};
use rand::Rng;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths;

/// Environment variable overriding the stored token
pub const TOKEN_ENV: &str = "GITPIX_TOKEN";

const NONCE_SIZE: usize = 12;
const TOKEN_KEY: &str = "github:token";

/// Encrypted credential file
pub struct TokenVault {
    path: PathBuf,
}

impl TokenVault {
    /// Open the vault at the default location
    pub fn open() -> Result<Self> {
        Ok(Self::at(paths::credentials_path()?))
    }

    /// Open a vault at a specific path
    pub const fn at(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store the access token
    pub fn store_token(&self, token: &str) -> Result<()> {
        let mut secrets = self.load().unwrap_or_default();
        secrets.insert(TOKEN_KEY.to_string(), token.trim().to_string());
        self.save(&secrets)
    }

    /// Get the stored access token
    pub fn token(&self) -> Result<Option<String>> {
        Ok(self.load()?.remove(TOKEN_KEY))
    }

    /// Delete the stored access token
    pub fn delete_token(&self) -> Result<()> {
        let mut secrets = self.load().unwrap_or_default();
        secrets.remove(TOKEN_KEY);
        self.save(&secrets)
    }

    fn load(&self) -> Result<HashMap<String, String>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let sealed = fs::read(&self.path).context("Failed to read credentials file")?;
        if sealed.len() < NONCE_SIZE {
            return Ok(HashMap::new());
        }

        let (nonce, ciphertext) = sealed.split_at(NONCE_SIZE);
        let plaintext = cipher()?
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| anyhow!("Failed to decrypt credentials"))?;

        serde_json::from_slice(&plaintext).context("Invalid credentials file")
    }

    fn save(&self, secrets: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create credentials directory")?;
        }

        let json = serde_json::to_vec(secrets)?;

        let mut nonce = [0u8; NONCE_SIZE];
        rand::rng().fill(&mut nonce);

        let ciphertext = cipher()?
            .encrypt(Nonce::from_slice(&nonce), json.as_slice())
            .map_err(|_| anyhow!("Failed to encrypt credentials"))?;

        let mut sealed = nonce.to_vec();
        sealed.extend(ciphertext);
        fs::write(&self.path, sealed).context("Failed to write credentials file")?;
        restrict_permissions(&self.path)?;

        Ok(())
    }
}

/// Resolve the token: environment first, then the vault
pub fn resolve_token(vault: &TokenVault) -> Result<Option<String>> {
    if let Ok(token) = std::env::var(TOKEN_ENV) {
        if !token.trim().is_empty() {
            return Ok(Some(token.trim().to_string()));
        }
    }
    vault.token()
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o600);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

fn cipher() -> Result<Aes256Gcm> {
    Aes256Gcm::new_from_slice(&derive_key()).map_err(|_| anyhow!("Invalid key length"))
}

/// Derive the encryption key from machine-specific data
fn derive_key() -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(machine_id().as_bytes());
    if let Some(home) = dirs::home_dir() {
        hasher.update(home.to_string_lossy().as_bytes());
    }
    hasher.update(b"gitpix-token-vault-v1");
    hasher.finalize().into()
}

fn machine_id() -> String {
    #[cfg(target_os = "linux")]
    {
        for candidate in ["/etc/machine-id", "/var/lib/dbus/machine-id"] {
            if let Ok(id) = fs::read_to_string(candidate) {
                return id.trim().to_string();
            }
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Ok(output) = std::process::Command::new("ioreg")
            .args(["-rd1", "-c", "IOPlatformExpertDevice"])
            .output()
        {
            let stdout = String::from_utf8_lossy(&output.stdout);
            if let Some(uuid) = stdout
                .lines()
                .find(|line| line.contains("IOPlatformUUID"))
                .and_then(|line| line.split('"').nth(3))
            {
                return uuid.to_string();
            }
        }
    }

    dirs::home_dir()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "gitpix-fallback-key".to_string())
}
