//! RS256 signing key pair, loaded once at startup.

use std::fmt;
use std::path::Path;

use jsonwebtoken::{DecodingKey, EncodingKey};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use tracing::info;

use lod2_core::error::{AppError, ErrorKind};

/// Modulus size of generated keys, and the minimum accepted on load.
pub const KEY_BITS: usize = 2048;

/// Immutable signing/verification keys injected into the token service.
#[derive(Clone)]
pub struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
    public_pem: String,
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair").finish_non_exhaustive()
    }
}

impl KeyPair {
    /// Generates a fresh 2048-bit key pair.
    pub fn generate() -> Result<Self, AppError> {
        let private = RsaPrivateKey::new(&mut rsa::rand_core::OsRng, KEY_BITS)
            .map_err(|e| AppError::with_source(ErrorKind::Crypto, "Failed to generate RSA key", e))?;
        Self::from_private_key(&private)
    }

    /// Parses a PEM private key in PKCS#8 or PKCS#1 form.
    pub fn from_pem(pem: &str) -> Result<Self, AppError> {
        let private = RsaPrivateKey::from_pkcs8_pem(pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(pem))
            .map_err(|e| AppError::with_source(ErrorKind::Crypto, "Unreadable RSA private key", e))?;

        let bits = private.size() * 8;
        if bits < KEY_BITS {
            return Err(AppError::crypto(format!(
                "RSA key of {bits} bits is too small, need at least {KEY_BITS}"
            )));
        }
        Self::from_private_key(&private)
    }

    /// Reads the key at `path`, or generates one and writes it there.
    pub async fn load_or_generate(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();

        if tokio::fs::try_exists(path).await? {
            let pem = tokio::fs::read_to_string(path).await?;
            let keys = Self::from_pem(&pem)?;
            info!(path = %path.display(), "Loaded signing key");
            return Ok(keys);
        }

        let private = RsaPrivateKey::new(&mut rsa::rand_core::OsRng, KEY_BITS)
            .map_err(|e| AppError::with_source(ErrorKind::Crypto, "Failed to generate RSA key", e))?;
        let pem = private
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| AppError::with_source(ErrorKind::Crypto, "Failed to encode RSA key", e))?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, pem.as_bytes()).await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).await?;
        }

        info!(path = %path.display(), bits = KEY_BITS, "Generated new signing key");
        Self::from_private_key(&private)
    }

    fn from_private_key(private: &RsaPrivateKey) -> Result<Self, AppError> {
        let private_pem = private
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| AppError::with_source(ErrorKind::Crypto, "Failed to encode RSA key", e))?;
        let public_pem = RsaPublicKey::from(private)
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| {
                AppError::with_source(ErrorKind::Crypto, "Failed to encode RSA public key", e)
            })?;

        let encoding = EncodingKey::from_rsa_pem(private_pem.as_bytes())
            .map_err(|e| AppError::with_source(ErrorKind::Crypto, "Invalid signing key", e))?;
        let decoding = DecodingKey::from_rsa_pem(public_pem.as_bytes())
            .map_err(|e| AppError::with_source(ErrorKind::Crypto, "Invalid verification key", e))?;

        Ok(Self {
            encoding,
            decoding,
            public_pem,
        })
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }

    /// SPKI PEM of the verification key.
    pub fn public_key_pem(&self) -> &str {
        &self.public_pem
    }
}
