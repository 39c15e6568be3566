//! Per-mode X.509v3 extension sets.
//!
//! | Mode | Basic Constraints | Key Usage | Extra |
//! |---|---|---|---|
//! | person | CA=false, critical | digitalSignature, critical | |
//! | service | CA=true, pathLen=0, critical | keyCertSign, cRLSign, critical | SKI, SAN if any |
//! | chain | CA=false, critical | dataEncipherment, digitalSignature | SKI |
//!
//! Extensions are emitted in table order.

use std::fmt;

use x509_cert::spki::SubjectPublicKeyInfoOwned;

use super::extensions::{
    BasicConstraints, KeyUsage, KeyUsages, SubjectAltName, SubjectKeyIdentifier,
};
use super::params::ExtensionParam;
use crate::error::CryptoError;

/// The three kinds of certificate this crate issues.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IssuanceMode {
    /// Self-signed certificate for an individual.
    PersonSelfSigned,
    /// Self-signed CA-style certificate for a service.
    ServiceSelfSigned,
    /// Leaf certificate signed by a caller-supplied issuer.
    ChainSigned,
}

impl fmt::Display for IssuanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IssuanceMode::PersonSelfSigned => "person",
            IssuanceMode::ServiceSelfSigned => "service",
            IssuanceMode::ChainSigned => "chain",
        })
    }
}

impl IssuanceMode {
    /// Assembles the extension set for a subject key.
    ///
    /// `san` is only consulted in service mode and is skipped when empty.
    pub fn extensions(
        self,
        subject_key: &SubjectPublicKeyInfoOwned,
        san: Option<&SubjectAltName>,
    ) -> Result<Vec<ExtensionParam>, CryptoError> {
        let mut extensions = Vec::with_capacity(4);
        match self {
            IssuanceMode::PersonSelfSigned => {
                extensions.push(ExtensionParam::from_extension(
                    &BasicConstraints::default(),
                    true,
                )?);
                extensions.push(ExtensionParam::from_extension(
                    &KeyUsage(KeyUsages::DigitalSignature.into()),
                    true,
                )?);
            }
            IssuanceMode::ServiceSelfSigned => {
                extensions.push(ExtensionParam::from_extension(
                    &BasicConstraints {
                        is_ca: true,
                        max_path_length: Some(0),
                    },
                    true,
                )?);
                extensions.push(ExtensionParam::from_extension(
                    &KeyUsage(KeyUsages::KeyCertSign | KeyUsages::CRLSign),
                    true,
                )?);
                extensions.push(ExtensionParam::from_extension(
                    &SubjectKeyIdentifier::from_spki(subject_key),
                    false,
                )?);
                if let Some(san) = san.filter(|san| !san.is_empty()) {
                    extensions.push(ExtensionParam::from_extension(san, false)?);
                }
            }
            IssuanceMode::ChainSigned => {
                extensions.push(ExtensionParam::from_extension(
                    &BasicConstraints::default(),
                    true,
                )?);
                extensions.push(ExtensionParam::from_extension(
                    &KeyUsage(KeyUsages::DataEncipherment | KeyUsages::DigitalSignature),
                    false,
                )?);
                extensions.push(ExtensionParam::from_extension(
                    &SubjectKeyIdentifier::from_spki(subject_key),
                    false,
                )?);
            }
        }
        Ok(extensions)
    }
}
