//! Password-protected PKCS#12 containers.
//!
//! Issued certificates leave the crate as a PKCS#12 bundle holding the
//! certificate chain and the subject's private key, either as raw bytes or as
//! base64 text. The same module opens caller-supplied issuer bundles.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use p12_keystore::{KeyStore, KeyStoreEntry, PrivateKeyChain};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use zeroize::Zeroizing;

use crate::cert::Certificate;
use crate::error::{CryptoError, MalformedInputError};
use crate::key::KeyPair;

/// File name attached to raw payloads.
pub const EXPORT_FILE_NAME: &str = "certificate.pfx";

/// Content type attached to raw payloads.
pub const CONTENT_TYPE: &str = "application/octet-stream";

/// How the container is handed back to the caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub enum OutputFormat {
    #[default]
    #[serde(rename = "PFXBase64Encoded", alias = "Base64")]
    Base64,
    #[serde(rename = "PFXRaw", alias = "Raw")]
    Raw,
}

/// The result of a successful issuance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IssuedPayload {
    Raw {
        bytes: Vec<u8>,
        file_name: &'static str,
        content_type: &'static str,
    },
    Base64(String),
}

impl IssuedPayload {
    /// Container bytes, decoding the base64 form if needed.
    pub fn container_bytes(&self) -> Result<Vec<u8>, MalformedInputError> {
        match self {
            IssuedPayload::Raw { bytes, .. } => Ok(bytes.clone()),
            IssuedPayload::Base64(text) => STANDARD
                .decode(text)
                .map_err(|_| MalformedInputError::InvalidContainerEncoding),
        }
    }
}

/// Builds a PKCS#12 bundle holding `key` and `leaf`, followed by `chain`.
///
/// The entry alias doubles as the friendly name shown by certificate stores.
pub fn export_pkcs12(
    leaf: &Certificate,
    key: &KeyPair,
    chain: &[Certificate],
    friendly_name: &str,
    password: &str,
) -> Result<Vec<u8>, CryptoError> {
    if password.is_empty() {
        return Err(CryptoError::Export(
            "the container password cannot be empty".to_string(),
        ));
    }

    let leaf_der = leaf.to_der()?;
    let local_key_id = Sha1::digest(&leaf_der);

    let mut certificates = Vec::with_capacity(chain.len() + 1);
    certificates.push(to_p12_certificate(&leaf_der)?);
    for cert in chain {
        certificates.push(to_p12_certificate(&cert.to_der()?)?);
    }

    let key_der = key.to_pkcs8_der()?;
    let key_chain = PrivateKeyChain::new(key_der.as_bytes(), local_key_id, certificates);

    let mut keystore = KeyStore::new();
    keystore.add_entry(friendly_name, KeyStoreEntry::PrivateKeyChain(key_chain));

    // `PrivateKeyChain` copies the key into a plain `Vec`, so the keystore
    // must not outlive this call.
    let container = keystore
        .writer(password)
        .write()
        .map_err(|e| CryptoError::Export(e.to_string()));
    drop(keystore);
    container
}

fn to_p12_certificate(der: &[u8]) -> Result<p12_keystore::Certificate, CryptoError> {
    p12_keystore::Certificate::from_der(der).map_err(|e| CryptoError::Export(e.to_string()))
}

/// Wraps container bytes in the requested output format.
pub fn encode(container: Vec<u8>, format: OutputFormat) -> IssuedPayload {
    match format {
        OutputFormat::Raw => IssuedPayload::Raw {
            bytes: container,
            file_name: EXPORT_FILE_NAME,
            content_type: CONTENT_TYPE,
        },
        OutputFormat::Base64 => IssuedPayload::Base64(STANDARD.encode(container)),
    }
}

/// Contents of an opened PKCS#12 bundle.
#[derive(Debug)]
pub struct OpenedContainer {
    /// Certificates in bundle order; the first one matches `key`.
    pub certificates: Vec<Certificate>,
    pub key: KeyPair,
    pub friendly_name: String,
}

impl OpenedContainer {
    /// The certificate belonging to the private key.
    pub fn leaf(&self) -> Result<&Certificate, MalformedInputError> {
        self.certificates.first().ok_or_else(|| {
            MalformedInputError::InvalidIssuerCertificate("no certificate in container".to_string())
        })
    }
}

/// Opens a PKCS#12 bundle with `password`.
pub fn open_pkcs12(data: &[u8], password: &str) -> Result<OpenedContainer, MalformedInputError> {
    let keystore = KeyStore::from_pkcs12(data, password)
        .map_err(|e| MalformedInputError::ContainerOpen(e.to_string()))?;

    let (alias, key_chain) = keystore
        .entries()
        .find_map(|(alias, entry)| match entry {
            KeyStoreEntry::PrivateKeyChain(chain) => Some((alias, chain)),
            _ => None,
        })
        .ok_or(MalformedInputError::MissingIssuerKey)?;

    let key_der = Zeroizing::new(key_chain.key().to_vec());
    let key = KeyPair::from_pkcs8_der(&key_der)?;

    // Certificates stored without a key id come back as separate entries.
    let loose = keystore.entries().filter_map(|(_, entry)| match entry {
        KeyStoreEntry::Certificate(cert) => Some(cert),
        _ => None,
    });
    let mut certificates: Vec<Certificate> = Vec::new();
    for cert in key_chain.chain().iter().chain(loose) {
        let cert = Certificate::from_der(cert.as_der())
            .map_err(|e| MalformedInputError::InvalidIssuerCertificate(e.to_string()))?;
        if !certificates.contains(&cert) {
            certificates.push(cert);
        }
    }

    let friendly_name = alias.to_string();
    // The keystore keeps its own unzeroized copy of the key; release it now.
    drop(keystore);

    let opened = OpenedContainer {
        certificates,
        key,
        friendly_name,
    };
    opened.leaf()?;
    Ok(opened)
}

/// Decodes base64 text and opens the PKCS#12 bundle it holds.
pub fn open_base64(text: &str, password: &str) -> Result<OpenedContainer, MalformedInputError> {
    let data = Zeroizing::new(
        STANDARD
            .decode(text.trim())
            .map_err(|_| MalformedInputError::InvalidContainerEncoding)?,
    );
    open_pkcs12(&data, password)
}
