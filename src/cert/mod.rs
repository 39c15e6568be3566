pub mod extensions;
pub mod params;
pub mod policy;

use der::{Any, AnyRef, Decode, Encode, EncodePem};
use extensions::ToAndFromX509Extension;
use params::{DistinguishedName, ExtensionParam, Validity};

use crate::error::CryptoError;
use crate::key::PublicKey;
use crate::tbs_certificate::from_x509_time;

pub type Result<T> = std::result::Result<T, CryptoError>;

/// Represents the supported signature algorithms for certificates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// SHA-256 with RSA encryption (PKCS#1 v1.5).
    Sha256WithRSA,
    /// SHA-256 with ECDSA.
    Sha256WithECDSA,
}

impl From<SignatureAlgorithm> for x509_cert::spki::AlgorithmIdentifierOwned {
    /// RSA identifiers carry an explicit NULL parameter (RFC 4055); ECDSA ones
    /// omit parameters (RFC 5758).
    fn from(value: SignatureAlgorithm) -> Self {
        match value {
            SignatureAlgorithm::Sha256WithRSA => x509_cert::spki::AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::SHA_256_WITH_RSA_ENCRYPTION,
                parameters: Some(Any::from(AnyRef::NULL)),
            },
            SignatureAlgorithm::Sha256WithECDSA => x509_cert::spki::AlgorithmIdentifierOwned {
                oid: const_oid::db::rfc5912::ECDSA_WITH_SHA_256,
                parameters: None,
            },
        }
    }
}

/// Represents an X.509 certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Certificate {
    /// The inner representation of the certificate.
    pub inner: x509_cert::Certificate,
}

impl Certificate {
    pub fn from_der(der: &[u8]) -> Result<Self> {
        Ok(Self {
            inner: x509_cert::Certificate::from_der(der)?,
        })
    }

    /// Encodes the certificate into DER format.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| CryptoError::Encoding(e.to_string()))
    }

    /// Encodes the certificate into PEM format.
    pub fn to_pem(&self) -> Result<String> {
        self.inner
            .to_pem(pkcs8::LineEnding::LF)
            .map_err(|e| CryptoError::Encoding(e.to_string()))
    }

    pub fn subject(&self) -> Result<DistinguishedName> {
        DistinguishedName::from_x509_name(&self.inner.tbs_certificate.subject)
    }

    pub fn issuer(&self) -> Result<DistinguishedName> {
        DistinguishedName::from_x509_name(&self.inner.tbs_certificate.issuer)
    }

    pub fn serial_number(&self) -> &[u8] {
        self.inner.tbs_certificate.serial_number.as_bytes()
    }

    pub fn validity(&self) -> Validity {
        let validity = &self.inner.tbs_certificate.validity;
        Validity {
            not_before: from_x509_time(&validity.not_before),
            not_after: from_x509_time(&validity.not_after),
        }
    }

    pub fn public_key(&self) -> Result<PublicKey> {
        PublicKey::from_x509spki(&self.inner.tbs_certificate.subject_public_key_info)
    }

    /// Extensions in encoding order.
    pub fn extensions(&self) -> Result<Vec<ExtensionParam>> {
        self.inner
            .tbs_certificate
            .extensions
            .iter()
            .flatten()
            .map(|ext| {
                Ok(ExtensionParam {
                    oid: ext.extn_id,
                    critical: ext.critical,
                    value: ext.extn_value.as_bytes().to_vec(),
                })
            })
            .collect()
    }

    /// Finds and decodes an extension, returning it with its criticality.
    pub fn extension<E: ToAndFromX509Extension>(&self) -> Result<Option<(bool, E)>> {
        match self.extensions()?.into_iter().find(|ext| ext.oid == E::OID) {
            Some(ext) => Ok(Some((ext.critical, ext.to_extension()?))),
            None => Ok(None),
        }
    }

    /// Checks the signature over the TBS portion against `issuer_key`.
    pub fn verify_signature(&self, issuer_key: &PublicKey) -> Result<bool> {
        let tbs = self.inner.tbs_certificate.to_der()?;
        let signature = self.inner.signature.raw_bytes();
        Ok(issuer_key.verify(&tbs, signature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rsa_algorithm_identifier_has_null_parameters() {
        let id: x509_cert::spki::AlgorithmIdentifierOwned = SignatureAlgorithm::Sha256WithRSA.into();
        assert!(id.parameters.is_some());
        let id: x509_cert::spki::AlgorithmIdentifierOwned =
            SignatureAlgorithm::Sha256WithECDSA.into();
        assert!(id.parameters.is_none());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(Certificate::from_der(b"not a certificate").is_err());
    }
}
