//! Trust anchor store.

use std::path::Path;

use tracing::{debug, info};

use super::{Certificate, TrustError};

/// Certificates trusted for message signing. Loaded once at startup and
/// never changed afterwards.
#[derive(Debug, Clone, Default)]
pub struct TrustAnchorSet {
    anchors: Vec<Certificate>,
}

impl TrustAnchorSet {
    /// Creates a set from parsed certificates, dropping duplicates.
    #[must_use]
    pub fn from_certificates(certificates: impl IntoIterator<Item = Certificate>) -> Self {
        let mut anchors: Vec<Certificate> = Vec::new();
        for cert in certificates {
            if !anchors.contains(&cert) {
                anchors.push(cert);
            }
        }
        Self { anchors }
    }

    /// Loads every certificate from the given PEM files.
    ///
    /// ## Errors
    ///
    /// Returns [`TrustError::InvalidCertificate`] when a file cannot be read
    /// or holds malformed PEM.
    pub fn load_pem_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self, TrustError> {
        let mut certificates = Vec::new();
        for path in paths {
            let path = path.as_ref();
            let pem = std::fs::read(path).map_err(|e| {
                TrustError::InvalidCertificate(format!("cannot read {}: {e}", path.display()))
            })?;
            let loaded = Certificate::from_pem(&pem)?;
            debug!(path = %path.display(), count = loaded.len(), "Loaded trust anchors");
            certificates.extend(loaded);
        }
        let set = Self::from_certificates(certificates);
        info!(anchors = set.len(), "Trust anchor set ready");
        Ok(set)
    }

    /// Whether the certificate is an anchor.
    #[must_use]
    pub fn contains(&self, cert: &Certificate) -> bool {
        self.anchors.contains(cert)
    }

    /// Anchors in load order.
    pub fn iter(&self) -> impl Iterator<Item = &Certificate> {
        self.anchors.iter()
    }

    /// Number of anchors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}
