//! CMS (Cryptographic Message Syntax) construction for PDF signatures
//!
//! Produces a detached PKCS#7 SignedData suitable for `adbe.pkcs7.detached`
//! with the following signed attributes:
//! - content-type
//! - signing-time
//! - message-digest
//! - signing-certificate-v2 (ESS)
//!
//! The signer certificate is embedded and the signer is identified by
//! issuer and serial number.

use crate::error::CryptoError;
use crate::keys::{sha256, SigningIdentity};
use chrono::{DateTime, Utc};
use cms::cert::{CertificateChoices, IssuerAndSerialNumber};
use cms::content_info::{CmsVersion, ContentInfo};
use cms::signed_data::{
    CertificateSet, EncapsulatedContentInfo, SignedData, SignerIdentifier, SignerInfo,
    SignerInfos,
};
use der::asn1::{OctetString, SetOfVec, UtcTime};
use der::oid::ObjectIdentifier;
use der::{Any, Decode, Encode, Sequence, SliceReader};
use p256::ecdsa::VerifyingKey;
use x509_cert::attr::Attribute;
use x509_cert::spki::AlgorithmIdentifierOwned;

/// id-data (PKCS#7): 1.2.840.113549.1.7.1
pub const OID_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.1");

/// id-signedData (PKCS#7): 1.2.840.113549.1.7.2
pub const OID_SIGNED_DATA: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.2");

/// SHA-256: 2.16.840.1.101.3.4.2.1
pub const OID_SHA256: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.1");

/// ECDSA with SHA-256: 1.2.840.10045.4.3.2
pub const OID_ECDSA_SHA256: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.2");

const OID_CONTENT_TYPE: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.3");
const OID_MESSAGE_DIGEST: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.4");
const OID_SIGNING_TIME: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.5");
const OID_SIGNING_CERTIFICATE_V2: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.16.2.47");

/// ESSCertIDv2 ::= SEQUENCE { hashAlgorithm DEFAULT sha256, certHash, issuerSerial OPTIONAL }
///
/// The hash algorithm is SHA-256, so DER requires it to be omitted.
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
struct EssCertIdV2 {
    cert_hash: OctetString,
}

/// SigningCertificateV2 ::= SEQUENCE { certs SEQUENCE OF ESSCertIDv2, policies OPTIONAL }
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
struct SigningCertificateV2 {
    certs: Vec<EssCertIdV2>,
}

/// Build a detached CMS SignedData (wrapped in ContentInfo) for a PDF byte-range digest
///
/// # Arguments
/// * `identity` - Signer key and certificate
/// * `document_digest` - SHA-256 of the PDF byte ranges being signed
/// * `signing_time` - Value of the signing-time attribute
pub fn build_detached_signed_data<I: SigningIdentity + ?Sized>(
    identity: &I,
    document_digest: &[u8; 32],
    signing_time: DateTime<Utc>,
) -> Result<Vec<u8>, CryptoError> {
    let certificate = identity.certificate().clone();
    let certificate_der = certificate.to_der()?;

    let signed_attrs = build_signed_attributes(document_digest, signing_time, &certificate_der)?;

    // The signature covers the DER encoding of the attributes as a SET
    let signature = identity.sign(&signed_attrs.to_der()?);

    let signer_info = SignerInfo {
        version: CmsVersion::V1,
        sid: SignerIdentifier::IssuerAndSerialNumber(IssuerAndSerialNumber {
            issuer: certificate.tbs_certificate.issuer.clone(),
            serial_number: certificate.tbs_certificate.serial_number.clone(),
        }),
        digest_alg: algorithm(OID_SHA256),
        signed_attrs: Some(signed_attrs),
        signature_algorithm: algorithm(OID_ECDSA_SHA256),
        signature: OctetString::new(signature)?,
        unsigned_attrs: None,
    };

    let signed_data = SignedData {
        version: CmsVersion::V1,
        digest_algorithms: SetOfVec::try_from(vec![algorithm(OID_SHA256)])?,
        encap_content_info: EncapsulatedContentInfo {
            econtent_type: OID_DATA,
            econtent: None,
        },
        certificates: Some(CertificateSet(SetOfVec::try_from(vec![
            CertificateChoices::Certificate(certificate),
        ])?)),
        crls: None,
        signer_infos: SignerInfos(SetOfVec::try_from(vec![signer_info])?),
    };

    let content_info = ContentInfo {
        content_type: OID_SIGNED_DATA,
        content: Any::encode_from(&signed_data)?,
    };

    Ok(content_info.to_der()?)
}

fn build_signed_attributes(
    document_digest: &[u8; 32],
    signing_time: DateTime<Utc>,
    certificate_der: &[u8],
) -> Result<SetOfVec<Attribute>, CryptoError> {
    let seconds = u64::try_from(signing_time.timestamp())
        .map_err(|_| CryptoError::EncodingError("Signing time before 1970".to_string()))?;
    let utc_time = UtcTime::from_unix_duration(std::time::Duration::from_secs(seconds))?;

    let signing_certificate = SigningCertificateV2 {
        certs: vec![EssCertIdV2 {
            cert_hash: OctetString::new(sha256(certificate_der).to_vec())?,
        }],
    };

    let attrs = vec![
        attribute(OID_CONTENT_TYPE, Any::encode_from(&OID_DATA)?)?,
        attribute(OID_SIGNING_TIME, Any::encode_from(&utc_time)?)?,
        attribute(
            OID_MESSAGE_DIGEST,
            Any::encode_from(&OctetString::new(document_digest.to_vec())?)?,
        )?,
        attribute(
            OID_SIGNING_CERTIFICATE_V2,
            Any::encode_from(&signing_certificate)?,
        )?,
    ];

    Ok(SetOfVec::try_from(attrs)?)
}

fn attribute(oid: ObjectIdentifier, value: Any) -> Result<Attribute, CryptoError> {
    Ok(Attribute {
        oid,
        values: SetOfVec::try_from(vec![value])?,
    })
}

fn algorithm(oid: ObjectIdentifier) -> AlgorithmIdentifierOwned {
    AlgorithmIdentifierOwned {
        oid,
        parameters: None,
    }
}

/// Decode a CMS blob that may be followed by zero padding (as in `/Contents`)
pub fn decode_signed_data(cms_bytes: &[u8]) -> Result<SignedData, CryptoError> {
    let mut reader = SliceReader::new(cms_bytes)?;
    let content_info = ContentInfo::decode(&mut reader)?;

    if content_info.content_type != OID_SIGNED_DATA {
        return Err(CryptoError::EncodingError(format!(
            "Unexpected content type {}",
            content_info.content_type
        )));
    }

    Ok(SignedData::from_der(&content_info.content.to_der()?)?)
}

/// Check a detached signature: the message-digest attribute must equal
/// `document_digest` and the signature must verify with `public_key_sec1`.
pub fn verify_detached_signature(
    cms_bytes: &[u8],
    document_digest: &[u8; 32],
    public_key_sec1: &[u8],
) -> Result<bool, CryptoError> {
    let signed_data = decode_signed_data(cms_bytes)?;

    let signer_info = signed_data
        .signer_infos
        .0
        .iter()
        .next()
        .ok_or_else(|| CryptoError::EncodingError("No SignerInfo present".to_string()))?;

    let signed_attrs = signer_info
        .signed_attrs
        .as_ref()
        .ok_or_else(|| CryptoError::EncodingError("No signed attributes".to_string()))?;

    let digest_matches = signed_attrs
        .iter()
        .filter(|attr| attr.oid == OID_MESSAGE_DIGEST)
        .flat_map(|attr| attr.values.iter())
        .filter_map(|value| value.to_der().ok())
        .filter_map(|der| OctetString::from_der(&der).ok())
        .any(|digest| digest.as_bytes() == document_digest.as_slice());

    if !digest_matches {
        return Ok(false);
    }

    let verifying_key = VerifyingKey::from_sec1_bytes(public_key_sec1)
        .map_err(|e| CryptoError::KeyError(e.to_string()))?;

    Ok(crate::keys::ecdsa_verify(
        &verifying_key,
        &signed_attrs.to_der()?,
        signer_info.signature.as_bytes(),
    ))
}
