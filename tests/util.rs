#![allow(dead_code)]

use certmint::export::{self, IssuedPayload, OpenedContainer};
use certmint::issuer::CertificateIssuer;
use certmint::request::{PersonCertificateRequest, ServiceCertificateRequest};

pub const CA_PASSWORD: &str = "ca-password";

/// The person request used throughout the scenarios.
pub fn person_request() -> PersonCertificateRequest {
    PersonCertificateRequest {
        name: "John Doe".to_string(),
        email: "johndoe@company.com".to_string(),
        organization: "My Company".to_string(),
        location: Some("Buenos Aires".to_string()),
        country: Some("AR".to_string()),
        signer_cn: "mycompany.com - Root Certificate".to_string(),
        signer_email: "info@mycompany.com".to_string(),
        signer_organization: "mycompany.com".to_string(),
        password: "12345678".to_string(),
        ..Default::default()
    }
}

pub fn service_request() -> ServiceCertificateRequest {
    ServiceCertificateRequest {
        certificate_name: "service.local".to_string(),
        dns_names: vec!["service.local".to_string()],
        ip_addresses: vec!["127.0.0.1".to_string()],
        password: "service-password".to_string(),
        ..Default::default()
    }
}

/// A base64 issuer bundle protected by [`CA_PASSWORD`].
pub fn generate_ca_container(issuer: &CertificateIssuer) -> String {
    let payload = issuer
        .issue_self_signed_service(&ServiceCertificateRequest {
            certificate_name: "myca.local".to_string(),
            dns_names: vec!["myca.local".to_string()],
            password: CA_PASSWORD.to_string(),
            ..Default::default()
        })
        .expect("CA issuance failed");
    match payload {
        IssuedPayload::Base64(text) => text,
        IssuedPayload::Raw { .. } => panic!("expected base64 output"),
    }
}

pub fn open(payload: &IssuedPayload, password: &str) -> OpenedContainer {
    let bytes = payload.container_bytes().expect("payload is not base64");
    export::open_pkcs12(&bytes, password).expect("container did not open")
}
