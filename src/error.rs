//! Error taxonomy for certificate issuance.
//!
//! Failures fall into three families: [`ValidationError`] and
//! [`MalformedInputError`] are the caller's fault and carry a message that can
//! be shown verbatim, while [`CryptoError`] is internal and must not leak its
//! details to the caller. [`IssueError`] wraps all three.

use thiserror::Error;

/// Rejection of a request field by the input validator.
///
/// Validation runs in a fixed order and reports only the first violation, so
/// the same invalid input always yields the same error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    /// A required field is absent or empty.
    #[error("{field} parameter cannot be empty.")]
    MissingField { field: &'static str },

    /// A field is longer than its configured maximum.
    #[error("{field} parameter cannot exceed {max} characters.")]
    FieldTooLong { field: &'static str, max: usize },

    /// A name-like field contains characters outside `[A-Za-z0-9._- ]`.
    #[error("{field} has invalid characters.")]
    InvalidCharacters { field: &'static str },

    /// An email field does not look like `local@domain.tld`.
    #[error("{field} is invalid.")]
    InvalidEmail { field: &'static str },

    /// The country is not a known ISO 3166-1 alpha-2 code.
    #[error("Invalid country code in request.")]
    InvalidCountryCode,

    /// A numeric field is outside its accepted range.
    #[error("{field} must be a positive number.")]
    OutOfRange { field: &'static str },
}

impl ValidationError {
    /// Name of the request field that caused the rejection, when there is one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ValidationError::MissingField { field }
            | ValidationError::FieldTooLong { field, .. }
            | ValidationError::InvalidCharacters { field }
            | ValidationError::InvalidEmail { field }
            | ValidationError::OutOfRange { field } => Some(field),
            ValidationError::InvalidCountryCode => Some("Country"),
        }
    }
}

/// Input that passed field validation but could not be interpreted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MalformedInputError {
    /// A SAN IP address is not a valid IPv4 or IPv6 literal.
    #[error("'{0}' is not a valid IP address.")]
    InvalidIpAddress(String),

    /// A SAN DNS name cannot be encoded as an IA5String.
    #[error("'{0}' is not a valid DNS name.")]
    InvalidDnsName(String),

    /// The issuer container is not valid base64.
    #[error("The issuer certificate is not valid base64.")]
    InvalidContainerEncoding,

    /// The issuer container could not be opened: bad bundle or wrong password.
    #[error("The issuer certificate could not be opened: {0}")]
    ContainerOpen(String),

    /// The issuer container holds no private key.
    #[error("The issuer certificate does not contain a private key.")]
    MissingIssuerKey,

    /// The issuer key is neither RSA nor ECDSA P-256.
    #[error("The issuer key algorithm is not supported.")]
    UnsupportedIssuerKey,

    /// The issuer certificate inside the container cannot be parsed.
    #[error("The issuer certificate is invalid: {0}")]
    InvalidIssuerCertificate(String),
}

/// Internal failure of the cryptographic layer.
#[derive(Debug, Error, Clone)]
#[non_exhaustive]
pub enum CryptoError {
    /// Error during key generation.
    #[error("Key generation error: {0}")]
    KeyGeneration(String),

    /// Error while producing a signature.
    #[error("Signing error: {0}")]
    Signing(String),

    /// Error during DER encoding or decoding of certificate structures.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Error while writing the export container.
    #[error("Container export error: {0}")]
    Export(String),
}

impl From<der::Error> for CryptoError {
    fn from(err: der::Error) -> Self {
        CryptoError::Encoding(err.to_string())
    }
}

impl From<rsa::Error> for CryptoError {
    fn from(err: rsa::Error) -> Self {
        CryptoError::KeyGeneration(err.to_string())
    }
}

impl From<pkcs8::Error> for CryptoError {
    fn from(err: pkcs8::Error) -> Self {
        CryptoError::Encoding(err.to_string())
    }
}

impl From<pkcs8::spki::Error> for CryptoError {
    fn from(err: pkcs8::spki::Error) -> Self {
        CryptoError::Encoding(err.to_string())
    }
}

/// Any failure of an issuance operation.
#[derive(Debug, Error, Clone)]
pub enum IssueError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    MalformedInput(#[from] MalformedInputError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl IssueError {
    /// Whether the caller can fix the request and resubmit.
    pub fn is_caller_error(&self) -> bool {
        !matches!(self, IssueError::Crypto(_))
    }

    /// Message safe to return to the caller.
    ///
    /// Cryptographic failures collapse into a generic message.
    pub fn public_message(&self) -> String {
        match self {
            IssueError::Validation(e) => e.to_string(),
            IssueError::MalformedInput(e) => e.to_string(),
            IssueError::Crypto(_) => "An internal error occurred while issuing the certificate.".to_string(),
        }
    }
}

impl From<der::Error> for IssueError {
    fn from(err: der::Error) -> Self {
        IssueError::Crypto(err.into())
    }
}

/// Errors loading an [`IssuerConfig`](crate::config::IssuerConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
