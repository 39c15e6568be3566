//! Key generation, PKCS#8 import/export, signing and verification.
//!
//! [`KeyAlgorithm`] is the closed set of algorithms a caller may request. Each
//! variant knows how to generate a [`KeyPair`]; the key pair in turn signs
//! certificates (self-signed or as an issuer) and encodes itself for the
//! export container.

use std::fmt;

use der::Encode;
use p256::ecdsa::{SigningKey as P256SigningKey, VerifyingKey as P256VerifyingKey};
use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, PrivateKeyInfo, SecretDocument};
use rsa::pkcs1v15::{
    Signature as RsaSignature, SigningKey as RsaSigningKey, VerifyingKey as RsaVerifyingKey,
};
use rsa::signature::{RandomizedSigner, SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde::Deserialize;
use sha2::Sha256;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::SignatureAlgorithm;
use crate::config::MIN_RSA_KEY_BITS;
use crate::error::{CryptoError, MalformedInputError};

/// Signature algorithm requested for a new key pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
pub enum KeyAlgorithm {
    /// ECDSA over P-256 with SHA-256.
    #[default]
    #[serde(rename = "ECDSA", alias = "Ecdsa")]
    Ecdsa,
    /// RSA PKCS#1 v1.5 with SHA-256.
    #[serde(rename = "RSA", alias = "Rsa")]
    Rsa,
}

impl KeyAlgorithm {
    /// Generates a fresh key pair. `rsa_bits` is ignored for ECDSA.
    pub fn generate(self, rsa_bits: usize) -> Result<KeyPair, CryptoError> {
        match self {
            KeyAlgorithm::Ecdsa => Ok(KeyPair::generate_ecdsa_p256()),
            KeyAlgorithm::Rsa => KeyPair::generate_rsa(rsa_bits),
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyAlgorithm::Ecdsa => f.write_str("ECDSA"),
            KeyAlgorithm::Rsa => f.write_str("RSA"),
        }
    }
}

/// An asymmetric key pair. Private halves are zeroized when dropped.
#[derive(Clone)]
pub enum KeyPair {
    Rsa {
        private: Box<RsaPrivateKey>,
        public: RsaPublicKey,
    },
    EcdsaP256 {
        signing_key: P256SigningKey,
        verifying_key: P256VerifyingKey,
    },
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("algorithm", &self.algorithm())
            .finish_non_exhaustive()
    }
}

impl KeyPair {
    /// Generate an RSA key pair with the specified number of bits.
    pub fn generate_rsa(bits: usize) -> Result<Self, CryptoError> {
        if bits < MIN_RSA_KEY_BITS {
            return Err(CryptoError::KeyGeneration(format!(
                "RSA keys must be at least {MIN_RSA_KEY_BITS} bits, got {bits}"
            )));
        }
        let mut rng = rand_core::OsRng;
        let private = RsaPrivateKey::new(&mut rng, bits)?;
        let public = RsaPublicKey::from(&private);
        Ok(KeyPair::Rsa {
            private: Box::new(private),
            public,
        })
    }

    /// Generate an ECDSA P-256 key pair.
    pub fn generate_ecdsa_p256() -> Self {
        let mut rng = rand_core::OsRng;
        let signing_key = P256SigningKey::random(&mut rng);
        let verifying_key = signing_key.verifying_key().clone();
        KeyPair::EcdsaP256 {
            signing_key,
            verifying_key,
        }
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            KeyPair::Rsa { .. } => KeyAlgorithm::Rsa,
            KeyPair::EcdsaP256 { .. } => KeyAlgorithm::Ecdsa,
        }
    }

    /// Signature algorithm used when this key signs a certificate.
    pub fn signature_algorithm(&self) -> SignatureAlgorithm {
        match self {
            KeyPair::Rsa { .. } => SignatureAlgorithm::Sha256WithRSA,
            KeyPair::EcdsaP256 { .. } => SignatureAlgorithm::Sha256WithECDSA,
        }
    }

    pub fn public_key(&self) -> PublicKey {
        match self {
            KeyPair::Rsa { public, .. } => PublicKey::Rsa(public.clone()),
            KeyPair::EcdsaP256 { verifying_key, .. } => PublicKey::EcdsaP256(verifying_key.clone()),
        }
    }

    /// Subject public key info of the public half.
    pub fn as_spki(&self) -> Result<SubjectPublicKeyInfoOwned, CryptoError> {
        self.public_key().to_spki()
    }

    /// Signs `data` with SHA-256. ECDSA signatures are DER encoded as X.509 expects.
    pub fn sign_data(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        match self {
            KeyPair::Rsa { private, .. } => {
                let signing_key = RsaSigningKey::<Sha256>::new(private.as_ref().clone());
                let signature = signing_key
                    .try_sign_with_rng(&mut rand_core::OsRng, data)
                    .map_err(|e| CryptoError::Signing(e.to_string()))?;
                Ok(signature.to_vec())
            }
            KeyPair::EcdsaP256 { signing_key, .. } => {
                let signature: p256::ecdsa::Signature = signing_key
                    .try_sign(data)
                    .map_err(|e| CryptoError::Signing(e.to_string()))?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
        }
    }

    /// PKCS#8 `PrivateKeyInfo` encoding of the private key.
    pub fn to_pkcs8_der(&self) -> Result<SecretDocument, CryptoError> {
        let document = match self {
            KeyPair::Rsa { private, .. } => private.to_pkcs8_der()?,
            KeyPair::EcdsaP256 { signing_key, .. } => signing_key.to_pkcs8_der()?,
        };
        Ok(document)
    }

    /// Decodes a PKCS#8 private key holding an RSA or P-256 key.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self, MalformedInputError> {
        let info = PrivateKeyInfo::try_from(der)
            .map_err(|e| MalformedInputError::ContainerOpen(e.to_string()))?;

        match info.algorithm.oid {
            const_oid::db::rfc5912::RSA_ENCRYPTION => {
                let private = RsaPrivateKey::from_pkcs8_der(der)
                    .map_err(|e| MalformedInputError::ContainerOpen(e.to_string()))?;
                let public = RsaPublicKey::from(&private);
                Ok(KeyPair::Rsa {
                    private: Box::new(private),
                    public,
                })
            }
            const_oid::db::rfc5912::ID_EC_PUBLIC_KEY => {
                let signing_key = P256SigningKey::from_pkcs8_der(der)
                    .map_err(|_| MalformedInputError::UnsupportedIssuerKey)?;
                let verifying_key = signing_key.verifying_key().clone();
                Ok(KeyPair::EcdsaP256 {
                    signing_key,
                    verifying_key,
                })
            }
            _ => Err(MalformedInputError::UnsupportedIssuerKey),
        }
    }
}

/// Public half of a [`KeyPair`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    EcdsaP256(P256VerifyingKey),
}

impl PublicKey {
    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            PublicKey::Rsa(_) => KeyAlgorithm::Rsa,
            PublicKey::EcdsaP256(_) => KeyAlgorithm::Ecdsa,
        }
    }

    pub fn to_spki(&self) -> Result<SubjectPublicKeyInfoOwned, CryptoError> {
        let spki = match self {
            PublicKey::Rsa(public) => SubjectPublicKeyInfoOwned::from_key(public.clone())?,
            PublicKey::EcdsaP256(verifying_key) => {
                SubjectPublicKeyInfoOwned::from_key(verifying_key.clone())?
            }
        };
        Ok(spki)
    }

    /// Reads an RSA or P-256 public key from a certificate's subject public key info.
    pub fn from_x509spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self, CryptoError> {
        let der = spki.to_der()?;
        match spki.algorithm.oid {
            const_oid::db::rfc5912::RSA_ENCRYPTION => Ok(PublicKey::Rsa(
                RsaPublicKey::from_public_key_der(&der)?,
            )),
            const_oid::db::rfc5912::ID_EC_PUBLIC_KEY => Ok(PublicKey::EcdsaP256(
                P256VerifyingKey::from_public_key_der(&der)?,
            )),
            oid => Err(CryptoError::Encoding(format!(
                "unsupported public key algorithm {oid}"
            ))),
        }
    }

    /// Checks a SHA-256 signature produced by [`KeyPair::sign_data`].
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        match self {
            PublicKey::Rsa(public) => {
                let verifying_key = RsaVerifyingKey::<Sha256>::new(public.clone());
                RsaSignature::try_from(signature)
                    .is_ok_and(|sig| verifying_key.verify(data, &sig).is_ok())
            }
            PublicKey::EcdsaP256(verifying_key) => p256::ecdsa::Signature::from_der(signature)
                .is_ok_and(|sig| verifying_key.verify(data, &sig).is_ok()),
        }
    }
}

#[cfg(test)]
mod tests {
    use der::Decode;

    use super::*;

    #[test]
    fn test_ecdsa_sign_verify() {
        let key = KeyPair::generate_ecdsa_p256();
        let signature = key.sign_data(b"tbs").unwrap();
        assert!(key.public_key().verify(b"tbs", &signature));
        assert!(!key.public_key().verify(b"other", &signature));
    }

    #[test]
    fn test_rsa_sign_verify() {
        let key = KeyPair::generate_rsa(2048).unwrap();
        let signature = key.sign_data(b"tbs").unwrap();
        assert_eq!(signature.len(), 256);
        assert!(key.public_key().verify(b"tbs", &signature));
    }

    #[test]
    fn test_rejects_short_rsa() {
        assert!(matches!(
            KeyPair::generate_rsa(1024),
            Err(CryptoError::KeyGeneration(_))
        ));
    }

    #[test]
    fn test_pkcs8_keeps_algorithm() {
        for key in [
            KeyPair::generate_ecdsa_p256(),
            KeyPair::generate_rsa(2048).unwrap(),
        ] {
            let der = key.to_pkcs8_der().unwrap();
            let decoded = KeyPair::from_pkcs8_der(der.as_bytes()).unwrap();
            assert_eq!(decoded.algorithm(), key.algorithm());
            assert_eq!(decoded.public_key(), key.public_key());
        }
    }

    #[test]
    fn test_spki_reads_back() {
        let key = KeyPair::generate_ecdsa_p256();
        let spki = key.as_spki().unwrap();
        assert_eq!(PublicKey::from_x509spki(&spki).unwrap(), key.public_key());
        let decoded = SubjectPublicKeyInfoOwned::from_der(&spki.to_der().unwrap()).unwrap();
        assert_eq!(PublicKey::from_x509spki(&decoded).unwrap(), key.public_key());
    }

    #[test]
    fn test_garbage_pkcs8() {
        assert!(KeyPair::from_pkcs8_der(b"not a key").is_err());
    }
}
