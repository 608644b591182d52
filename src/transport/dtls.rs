//! The DTLS-SRTP keying material exporter contract (rfc5764 §4.2).
//!
//! This module only covers the handshake-adjacent piece SPEC_FULL calls
//! out: pulling `EXTRACTOR-dtls_srtp` keying material out of a completed
//! `tokio_rustls` session once the handshake is done. Deriving SRTP keys
//! from that material and running the actual SRTP cipher are out of scope
//! here; callers hand the exported bytes to whatever SRTP stack they use.

use tokio_rustls::rustls::Error as RustlsError;

/// Label registered for DTLS-SRTP key export, rfc5764 §4.2.
pub const DTLS_SRTP_EXPORTER_LABEL: &str = "EXTRACTOR-dtls_srtp";

/// Raw keying material exported from a completed DTLS handshake, before any
/// SRTP-specific key derivation has been applied.
#[derive(Clone)]
pub struct ExportedKeyingMaterial {
    pub bytes: Vec<u8>,
}

/// Anything that can hand back exported keying material once its handshake
/// has completed; implemented by the `tokio_rustls` connection types.
pub trait KeyingMaterialExporter {
    fn export_keying_material(&self, output_len: usize, context: Option<&[u8]>) -> Result<ExportedKeyingMaterial, RustlsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exporter_label_matches_rfc5764() {
        assert_eq!(DTLS_SRTP_EXPORTER_LABEL, "EXTRACTOR-dtls_srtp");
    }
}
