//! Certificate issuance.
//!
//! [`CertificateIssuer`] drives every request through the same stages:
//! `Validated → NamesBuilt → KeyGenerated → ExtensionsAssembled → Signed →
//! Exported`. The first failing stage aborts the request and nothing partial
//! is returned. Signing itself goes through the [`Issuer`] trait, implemented
//! by [`SelfIssuer`] for self-signed certificates and by [`ChainIssuer`] for
//! certificates signed by a caller-supplied container.

use std::fmt;

use der::Encode;
use der::asn1::BitString;
use time::OffsetDateTime;
use tracing::{debug, error, info, info_span, warn};
use x509_cert::certificate::CertificateInner;
use x509_cert::name::Name;
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::cert::Certificate;
use crate::cert::extensions::SubjectAltName;
use crate::cert::params::{DistinguishedName, ExtensionParam, Validity};
use crate::cert::policy::IssuanceMode;
use crate::config::IssuerConfig;
use crate::country;
use crate::error::{ConfigError, CryptoError, IssueError, MalformedInputError, ValidationError};
use crate::export::{self, IssuedPayload, OpenedContainer};
use crate::key::{KeyAlgorithm, KeyPair};
use crate::request::{PersonCertificateRequest, ServiceCertificateRequest, SignCertificateRequest};
use crate::serial::SerialNumber;
use crate::tbs_certificate::TbsCertificate;
use crate::validation::{require, validate_person};

/// Represents an entity capable of issuing certificates.
pub trait Issuer {
    /// Returns the distinguished name placed in the issuer field.
    fn issuer_name(&self) -> &Name;

    /// Returns the signing key of the issuer.
    fn signing_key(&self) -> &KeyPair;

    /// Serial number for the next certificate.
    fn serial_number(&self) -> SerialNumber {
        SerialNumber::random()
    }

    /// Signs a certificate for `subject`.
    ///
    /// The signature algorithm follows the issuer's key.
    fn issue(
        &self,
        subject: &Name,
        subject_public_key: SubjectPublicKeyInfoOwned,
        validity: Validity,
        extensions: Vec<ExtensionParam>,
    ) -> Result<Certificate, CryptoError> {
        let signature_algorithm = self.signing_key().signature_algorithm();

        let tbs_cert = TbsCertificate {
            serial_number: self.serial_number(),
            signature_algorithm,
            issuer: self.issuer_name().clone(),
            validity,
            subject: subject.clone(),
            subject_public_key_info: subject_public_key,
            extensions,
        };

        let tbs_cert_inner = tbs_cert.to_tbs_certificate_inner()?;
        let signature = self.signing_key().sign_data(&tbs_cert_inner.to_der()?)?;

        let inner = CertificateInner {
            tbs_certificate: tbs_cert_inner,
            signature_algorithm: signature_algorithm.into(),
            signature: BitString::from_bytes(&signature)?,
        };

        Ok(Certificate { inner })
    }
}

/// Signs with the subject's own key.
pub struct SelfIssuer<'a> {
    key: &'a KeyPair,
    name: Name,
}

impl<'a> SelfIssuer<'a> {
    /// `name` goes into the issuer field. It need not equal the subject name.
    pub fn new(key: &'a KeyPair, name: Name) -> Self {
        Self { key, name }
    }
}

impl Issuer for SelfIssuer<'_> {
    fn issuer_name(&self) -> &Name {
        &self.name
    }

    fn signing_key(&self) -> &KeyPair {
        self.key
    }
}

/// Signs with the key and certificate held in an issuer container.
#[derive(Debug)]
pub struct ChainIssuer {
    certificate: Certificate,
    key: KeyPair,
    legacy_tag: Option<[u8; 4]>,
}

impl ChainIssuer {
    /// Takes the key and its certificate out of an opened container.
    ///
    /// Fails if the certificate does not belong to the key.
    pub fn from_container(container: OpenedContainer) -> Result<Self, MalformedInputError> {
        let certificate = container.leaf()?.clone();
        let certificate_key = certificate
            .public_key()
            .map_err(|e| MalformedInputError::InvalidIssuerCertificate(e.to_string()))?;
        if certificate_key != container.key.public_key() {
            return Err(MalformedInputError::InvalidIssuerCertificate(
                "the certificate does not match the private key".to_string(),
            ));
        }
        Ok(Self {
            certificate,
            key: container.key,
            legacy_tag: None,
        })
    }

    /// Issue serials made of `tag` followed by 4 random bytes.
    pub fn with_legacy_serials(mut self, tag: [u8; 4]) -> Self {
        self.legacy_tag = Some(tag);
        self
    }

    pub fn certificate(&self) -> &Certificate {
        &self.certificate
    }
}

impl Issuer for ChainIssuer {
    fn issuer_name(&self) -> &Name {
        &self.certificate.inner.tbs_certificate.subject
    }

    fn signing_key(&self) -> &KeyPair {
        &self.key
    }

    fn serial_number(&self) -> SerialNumber {
        match self.legacy_tag {
            Some(tag) => SerialNumber::legacy_tagged(tag),
            None => SerialNumber::random(),
        }
    }
}

/// Progress of a single issuance request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IssuanceStage {
    Validated,
    NamesBuilt,
    KeyGenerated,
    ExtensionsAssembled,
    Signed,
    Exported,
}

impl fmt::Display for IssuanceStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IssuanceStage::Validated => "validated",
            IssuanceStage::NamesBuilt => "names_built",
            IssuanceStage::KeyGenerated => "key_generated",
            IssuanceStage::ExtensionsAssembled => "extensions_assembled",
            IssuanceStage::Signed => "signed",
            IssuanceStage::Exported => "exported",
        })
    }
}

fn advance(stage: IssuanceStage) {
    debug!(%stage, "issuance stage reached");
}

/// Stateless entry point for the three issuance operations.
///
/// Each call owns its key material and drops it before returning, so one
/// issuer can serve any number of threads.
#[derive(Clone, Debug, Default)]
pub struct CertificateIssuer {
    config: IssuerConfig,
}

impl CertificateIssuer {
    pub fn new(config: IssuerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Issues a self-signed certificate for a person.
    ///
    /// The subject name is built from the person's identity and the issuer
    /// name from the signer identity; the certificate is signed with the
    /// freshly generated subject key.
    pub fn issue_self_signed_person(
        &self,
        request: &PersonCertificateRequest,
    ) -> Result<IssuedPayload, IssueError> {
        let mode = IssuanceMode::PersonSelfSigned;
        let span = info_span!("issue", %mode, algorithm = %request.signature_algorithm);
        let _guard = span.enter();
        log_outcome(self.person(request))
    }

    /// Issues a self-signed CA certificate for a service.
    pub fn issue_self_signed_service(
        &self,
        request: &ServiceCertificateRequest,
    ) -> Result<IssuedPayload, IssueError> {
        let mode = IssuanceMode::ServiceSelfSigned;
        let span = info_span!("issue", %mode, algorithm = %KeyAlgorithm::Rsa);
        let _guard = span.enter();
        log_outcome(self.service(request))
    }

    /// Issues a leaf certificate signed by the key in the caller's container.
    pub fn issue_chain_signed(
        &self,
        request: &SignCertificateRequest,
    ) -> Result<IssuedPayload, IssueError> {
        let mode = IssuanceMode::ChainSigned;
        let span = info_span!("issue", %mode, algorithm = %KeyAlgorithm::Rsa);
        let _guard = span.enter();
        log_outcome(self.chain(request))
    }

    fn person(&self, request: &PersonCertificateRequest) -> Result<IssuedPayload, IssueError> {
        let identity = validate_person(
            &request.identity(),
            &request.signer(),
            &self.config.limits,
        )?;
        require("Password", &request.password)?;
        let validity = Validity::backdated_years(
            OffsetDateTime::now_utc(),
            self.config.backdate_days,
            self.config.person_validity_years,
        )
        .ok_or_else(|| CryptoError::Encoding("person validity is out of range".to_string()))?;
        advance(IssuanceStage::Validated);

        let subject = DistinguishedName::for_subject(&identity);
        let issuer_name = DistinguishedName::for_signer(identity.issuer());
        let country = identity
            .subject()
            .country
            .as_deref()
            .and_then(country::country_name);
        debug!(%subject, issuer = %issuer_name, country, "names built");
        let subject = subject.as_x509_name()?;
        let issuer_name = issuer_name.as_x509_name()?;
        advance(IssuanceStage::NamesBuilt);

        let key = request
            .signature_algorithm
            .generate(self.config.rsa_key_bits)?;
        let spki = key.as_spki()?;
        advance(IssuanceStage::KeyGenerated);

        let extensions = IssuanceMode::PersonSelfSigned.extensions(&spki, None)?;
        advance(IssuanceStage::ExtensionsAssembled);

        let cert = SelfIssuer::new(&key, issuer_name).issue(&subject, spki, validity, extensions)?;
        advance(IssuanceStage::Signed);

        let container = export::export_pkcs12(
            &cert,
            &key,
            &[],
            &identity.subject().name,
            &request.password,
        )?;
        advance(IssuanceStage::Exported);

        Ok(export::encode(container, request.output_format))
    }

    fn service(&self, request: &ServiceCertificateRequest) -> Result<IssuedPayload, IssueError> {
        require("Password", &request.password)?;
        let san = SubjectAltName::parse(&request.dns_names, &request.ip_addresses)?;
        let validity = Validity::backdated_days(
            OffsetDateTime::now_utc(),
            self.config.backdate_days,
            self.config.service_validity_days,
        )
        .ok_or_else(|| CryptoError::Encoding("service validity is out of range".to_string()))?;
        advance(IssuanceStage::Validated);

        let subject = DistinguishedName::common_name(&request.certificate_name);
        debug!(
            %subject,
            dns_names = ?san.dns_names().collect::<Vec<_>>(),
            ip_addresses = ?san.ip_addresses().collect::<Vec<_>>(),
            "names built"
        );
        let subject = subject.as_x509_name()?;
        advance(IssuanceStage::NamesBuilt);

        let key = KeyAlgorithm::Rsa.generate(self.config.rsa_key_bits)?;
        let spki = key.as_spki()?;
        advance(IssuanceStage::KeyGenerated);

        let extensions = IssuanceMode::ServiceSelfSigned.extensions(&spki, Some(&san))?;
        advance(IssuanceStage::ExtensionsAssembled);

        let cert =
            SelfIssuer::new(&key, subject.clone()).issue(&subject, spki, validity, extensions)?;
        advance(IssuanceStage::Signed);

        let container = export::export_pkcs12(
            &cert,
            &key,
            &[],
            &request.certificate_name,
            &request.password,
        )?;
        advance(IssuanceStage::Exported);

        Ok(export::encode(container, request.output_format))
    }

    fn chain(&self, request: &SignCertificateRequest) -> Result<IssuedPayload, IssueError> {
        require("NewCertificatePassword", &request.new_certificate_password)?;
        let days_valid = ValidationError::OutOfRange { field: "DaysValid" };
        if request.days_valid <= 0 {
            return Err(days_valid.into());
        }
        let validity = Validity::backdated_days(
            OffsetDateTime::now_utc(),
            self.config.backdate_days,
            request.days_valid,
        )
        .ok_or(days_valid)?;

        let container = export::open_base64(
            &request.base64_issuer_certificate,
            &request.issuer_certificate_password,
        )?;
        let mut issuer = ChainIssuer::from_container(container)?;
        if self.config.legacy_tagged_chain_serials {
            issuer = issuer.with_legacy_serials(self.config.legacy_tag_bytes());
        }
        advance(IssuanceStage::Validated);

        let subject = DistinguishedName::common_name(&request.certificate_name);
        debug!(%subject, issuer = ?issuer.certificate().subject().ok(), "names built");
        let subject = subject.as_x509_name()?;
        advance(IssuanceStage::NamesBuilt);

        let key = KeyAlgorithm::Rsa.generate(self.config.rsa_key_bits)?;
        let spki = key.as_spki()?;
        advance(IssuanceStage::KeyGenerated);

        let extensions = IssuanceMode::ChainSigned.extensions(&spki, None)?;
        advance(IssuanceStage::ExtensionsAssembled);

        let cert = issuer.issue(&subject, spki, validity, extensions)?;
        advance(IssuanceStage::Signed);

        let container = export::export_pkcs12(
            &cert,
            &key,
            std::slice::from_ref(issuer.certificate()),
            &request.certificate_name,
            &request.new_certificate_password,
        )?;
        advance(IssuanceStage::Exported);

        Ok(export::encode(container, request.output_format))
    }
}

fn log_outcome(result: Result<IssuedPayload, IssueError>) -> Result<IssuedPayload, IssueError> {
    match &result {
        Ok(_) => info!("certificate issued"),
        Err(err) if err.is_caller_error() => warn!(error = %err, "request rejected"),
        Err(err) => error!(error = ?err, "certificate issuance failed"),
    }
    result
}
