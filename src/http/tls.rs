use std::path::{Path, PathBuf};

use reqwest::{Certificate, ClientBuilder, Identity};

use crate::error::{AppError, AppResult, HttpError, ValidationError};

/// PEM material read once before the session starts.
///
/// Every worker builds its own client; each builder gets a clone of the parsed
/// root certificate and identity.
#[derive(Debug, Clone, Default)]
pub struct TlsMaterial {
    root: Option<Certificate>,
    identity: Option<Identity>,
}

impl TlsMaterial {
    /// Reads and validates the CA file and the client cert/key pair.
    ///
    /// # Errors
    ///
    /// Returns an error when only half of the cert/key pair is given, when a
    /// file cannot be read, or when the PEM contents are invalid.
    pub fn load(
        cacert: Option<&str>,
        cert: Option<&str>,
        key: Option<&str>,
    ) -> AppResult<Self> {
        let identity = match (cert, key) {
            (Some(cert_path), Some(key_path)) => {
                Some(load_identity(Path::new(cert_path), Path::new(key_path))?)
            }
            (Some(_), None) => return Err(AppError::validation(ValidationError::CertWithoutKey)),
            (None, Some(_)) => return Err(AppError::validation(ValidationError::KeyWithoutCert)),
            (None, None) => None,
        };

        let root = match cacert {
            Some(path) => Some(load_root(Path::new(path))?),
            None => None,
        };

        Ok(Self { root, identity })
    }

    #[cfg(test)]
    pub(crate) const fn has_identity(&self) -> bool {
        self.identity.is_some()
    }

    #[cfg(test)]
    pub(crate) const fn has_root(&self) -> bool {
        self.root.is_some()
    }

    pub(crate) fn apply(&self, mut builder: ClientBuilder, insecure: bool) -> ClientBuilder {
        if let Some(root) = self.root.as_ref() {
            builder = builder.add_root_certificate(root.clone());
        }
        if let Some(identity) = self.identity.as_ref() {
            builder = builder.identity(identity.clone());
        }
        if insecure {
            builder = builder
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true);
        }
        builder
    }
}

fn load_root(path: &Path) -> Result<Certificate, HttpError> {
    let bytes = std::fs::read(path).map_err(|err| HttpError::ReadCacert {
        path: path.to_path_buf(),
        source: err,
    })?;
    Certificate::from_pem(&bytes).map_err(|err| HttpError::InvalidCacert {
        path: PathBuf::from(path),
        source: err,
    })
}

fn load_identity(cert_path: &Path, key_path: &Path) -> Result<Identity, HttpError> {
    let cert_bytes = std::fs::read(cert_path).map_err(|err| HttpError::ReadCert {
        path: cert_path.to_path_buf(),
        source: err,
    })?;
    let key_bytes = std::fs::read(key_path).map_err(|err| HttpError::ReadKey {
        path: key_path.to_path_buf(),
        source: err,
    })?;
    Identity::from_pkcs8_pem(&cert_bytes, &key_bytes)
        .map_err(|err| HttpError::InvalidIdentity { source: err })
}
