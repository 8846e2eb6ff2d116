//! Certificate-backed signing identity
//!
//! Supported formats:
//! - PEM-encoded X.509 certificates
//! - PEM-encoded PKCS#8 private keys
//! - PEM-encoded EC private keys (SEC1)
//!
//! Only P-256 (prime256v1) keys are accepted.

use crate::error::CryptoError;
use crate::keys::{ecdsa_sign, ecdsa_verify, load_signing_key, SigningIdentity};
use chrono::{DateTime, Utc};
use der::DecodePem;
use p256::ecdsa::{SigningKey, VerifyingKey};
use x509_cert::Certificate;

/// Identity backed by an X.509 certificate and its private key
pub struct CertificateIdentity {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
    certificate: Certificate,
    subject_name: String,
}

impl CertificateIdentity {
    /// Import from PEM-encoded certificate and private key
    ///
    /// The private key must match the public key carried by the certificate.
    pub fn from_pem(cert_pem: &str, key_pem: &str) -> Result<Self, CryptoError> {
        let certificate = Certificate::from_pem(cert_pem)
            .map_err(|e| CryptoError::CertificateError(e.to_string()))?;

        let signing_key = load_signing_key(key_pem)?;
        let verifying_key = VerifyingKey::from(&signing_key);

        let cert_public_key = certificate
            .tbs_certificate
            .subject_public_key_info
            .subject_public_key
            .raw_bytes();
        if cert_public_key != verifying_key.to_encoded_point(false).as_bytes() {
            return Err(CryptoError::KeyMismatch);
        }

        let subject = certificate.tbs_certificate.subject.to_string();
        let subject_name = common_name(&subject).unwrap_or(subject);

        let identity = Self {
            signing_key,
            verifying_key,
            certificate,
            subject_name,
        };

        if !identity.is_valid_at(Utc::now()) {
            tracing::warn!(
                subject = %identity.subject_name,
                not_before = ?identity.not_before(),
                not_after = ?identity.not_after(),
                "signer certificate is outside its validity period"
            );
        }

        Ok(identity)
    }

    /// Get the subject common name (or the full subject if no CN is present)
    pub fn subject_name(&self) -> &str {
        &self.subject_name
    }

    /// Get the serial number as hex
    pub fn serial_number_hex(&self) -> String {
        hex::encode(self.certificate.tbs_certificate.serial_number.as_bytes())
    }

    /// Get the not-before date
    pub fn not_before(&self) -> Option<DateTime<Utc>> {
        let validity = &self.certificate.tbs_certificate.validity;
        unix_to_datetime(validity.not_before.to_unix_duration())
    }

    /// Get the not-after date (expiration)
    pub fn not_after(&self) -> Option<DateTime<Utc>> {
        let validity = &self.certificate.tbs_certificate.validity;
        unix_to_datetime(validity.not_after.to_unix_duration())
    }

    /// Check if the certificate is valid at the given instant
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        match (self.not_before(), self.not_after()) {
            (Some(start), Some(end)) => start <= at && at <= end,
            _ => false,
        }
    }
}

impl SigningIdentity for CertificateIdentity {
    fn public_key_sec1(&self) -> Vec<u8> {
        self.verifying_key
            .to_encoded_point(false)
            .as_bytes()
            .to_vec()
    }

    fn sign(&self, data: &[u8]) -> Vec<u8> {
        ecdsa_sign(&self.signing_key, data)
    }

    fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        ecdsa_verify(&self.verifying_key, data, signature)
    }

    fn certificate(&self) -> &Certificate {
        &self.certificate
    }

    fn signer_name(&self) -> &str {
        &self.subject_name
    }
}

fn unix_to_datetime(duration: std::time::Duration) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(i64::try_from(duration.as_secs()).ok()?, 0)
}

/// Pull the CN value out of an RFC 4514 distinguished name string
fn common_name(subject: &str) -> Option<String> {
    subject
        .split(',')
        .map(str::trim)
        .find_map(|rdn| rdn.strip_prefix("CN="))
        .map(|cn| cn.to_string())
        .filter(|cn| !cn.is_empty())
}
