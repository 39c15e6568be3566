//! # certmint - X.509 certificate issuance with PKCS#12 export
//!
//! certmint issues X.509 v3 certificates in three modes and hands each one
//! back, together with its freshly generated private key, as a
//! password-protected PKCS#12 bundle. It is built on the rustcrypto crates.
//!
//! ## Issuance Modes
//!
//! - **Person**: self-signed, subject and issuer names built from validated
//!   identity fields, ECDSA P-256 or RSA key
//! - **Service**: self-signed CA (`pathLen=0`) with DNS and IP Subject
//!   Alternative Names, RSA key
//! - **Chain**: RSA leaf signed by the key inside a caller-supplied PKCS#12
//!   bundle
//!
//! ## Quick Start
//!
//! ### Issuing a Person Certificate
//!
//! ```rust,no_run
//! use certmint::{issuer::CertificateIssuer, request::PersonCertificateRequest};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let issuer = CertificateIssuer::default();
//!
//! let request = PersonCertificateRequest {
//!     name: "John Doe".to_string(),
//!     email: "johndoe@company.com".to_string(),
//!     organization: "My Company".to_string(),
//!     signer_cn: "mycompany.com - Root Certificate".to_string(),
//!     signer_email: "info@mycompany.com".to_string(),
//!     signer_organization: "mycompany.com".to_string(),
//!     password: "12345678".to_string(),
//!     ..Default::default()
//! };
//!
//! let payload = issuer.issue_self_signed_person(&request)?;
//! let container = payload.container_bytes()?;
//! println!("PKCS#12 bundle: {} bytes", container.len());
//! # Ok(())
//! # }
//! ```
//!
//! ### Signing a Leaf with an Existing Issuer
//!
//! ```rust,no_run
//! use certmint::{
//!     export::IssuedPayload,
//!     issuer::CertificateIssuer,
//!     request::{ServiceCertificateRequest, SignCertificateRequest},
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let issuer = CertificateIssuer::default();
//!
//! let ca = issuer.issue_self_signed_service(&ServiceCertificateRequest {
//!     certificate_name: "Issuing CA".to_string(),
//!     dns_names: vec!["ca.local".to_string()],
//!     password: "ca-password".to_string(),
//!     ..Default::default()
//! })?;
//! let IssuedPayload::Base64(ca) = ca else { unreachable!() };
//!
//! let leaf = issuer.issue_chain_signed(&SignCertificateRequest {
//!     certificate_name: "leaf.local".to_string(),
//!     base64_issuer_certificate: ca,
//!     issuer_certificate_password: "ca-password".to_string(),
//!     new_certificate_password: "leaf-password".to_string(),
//!     days_valid: 365,
//!     ..Default::default()
//! })?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every operation returns [`error::IssueError`]. Validation and malformed
//! input errors are the caller's to fix; cryptographic errors are internal:
//!
//! ```rust
//! use certmint::{error::IssueError, issuer::CertificateIssuer, request::PersonCertificateRequest};
//!
//! let issuer = CertificateIssuer::default();
//! match issuer.issue_self_signed_person(&PersonCertificateRequest::default()) {
//!     Ok(_) => println!("issued"),
//!     Err(e) if e.is_caller_error() => println!("rejected: {}", e.public_message()),
//!     Err(e) => println!("failed: {}", e.public_message()),
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`issuer`]: The three issuance operations and the signing trait
//! - [`request`]: Request shapes, deserializable from the wire format
//! - [`validation`]: Identity field checks
//! - [`cert`]: Certificate wrapper, names, extensions and per-mode policy
//! - [`key`]: Key generation, PKCS#8 encoding and signatures
//! - [`export`]: PKCS#12 bundles in and out
//! - [`config`]: Issuer settings, loadable from TOML
//! - [`error`]: Error taxonomy

pub mod cert;
pub mod config;
pub mod country;
pub mod error;
pub mod export;
pub mod issuer;
pub mod key;
pub mod request;
pub mod serial;
pub mod tbs_certificate;
pub mod validation;
