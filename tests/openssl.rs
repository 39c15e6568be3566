mod util;

use certmint::export::OutputFormat;
use certmint::issuer::CertificateIssuer;
use certmint::key::KeyAlgorithm;
use certmint::request::{PersonCertificateRequest, SignCertificateRequest};
use openssl::nid::Nid;
use openssl::pkcs12::{ParsedPkcs12_2, Pkcs12};
use openssl::pkey::Id;
use openssl::x509::X509NameRef;
use regex::Regex;
use std::fs;
use std::process::Command;

fn parse(bytes: &[u8], password: &str) -> ParsedPkcs12_2 {
    Pkcs12::from_der(bytes)
        .expect("OpenSSL failed to read the PKCS#12 bundle")
        .parse2(password)
        .expect("OpenSSL failed to decrypt the PKCS#12 bundle")
}

fn entry(name: &X509NameRef, nid: Nid) -> String {
    name.entries_by_nid(nid)
        .next()
        .unwrap()
        .data()
        .as_utf8()
        .unwrap()
        .to_string()
}

#[test]
fn test_openssl_crate_reads_person_bundle() {
    for (algorithm, id) in [(KeyAlgorithm::Ecdsa, Id::EC), (KeyAlgorithm::Rsa, Id::RSA)] {
        let request = PersonCertificateRequest {
            signature_algorithm: algorithm,
            output_format: OutputFormat::Raw,
            ..util::person_request()
        };
        let payload = CertificateIssuer::default()
            .issue_self_signed_person(&request)
            .unwrap();
        let parsed = parse(&payload.container_bytes().unwrap(), "12345678");

        let pkey = parsed.pkey.expect("bundle has no private key");
        assert_eq!(pkey.id(), id);

        let x509 = parsed.cert.expect("bundle has no certificate");
        assert_eq!(x509.version(), 2, "X509 version should be 3 (0-based index)");
        assert!(x509.public_key().unwrap().public_eq(&pkey));
        assert!(x509.verify(&pkey).unwrap(), "self signature does not verify");

        let subject = x509.subject_name();
        assert_eq!(entry(subject, Nid::COMMONNAME), "John Doe");
        assert_eq!(entry(subject, Nid::PKCS9_EMAILADDRESS), "johndoe@company.com");
        assert_eq!(entry(subject, Nid::ORGANIZATIONNAME), "My Company");
        assert_eq!(entry(subject, Nid::LOCALITYNAME), "Buenos Aires");
        assert_eq!(entry(subject, Nid::STATEORPROVINCENAME), "Buenos Aires");
        assert_eq!(entry(subject, Nid::COUNTRYNAME), "AR");
        assert_eq!(
            entry(x509.issuer_name(), Nid::COMMONNAME),
            "mycompany.com - Root Certificate"
        );

        let expected_sig = match algorithm {
            KeyAlgorithm::Ecdsa => Nid::ECDSA_WITH_SHA256,
            KeyAlgorithm::Rsa => Nid::SHA256WITHRSAENCRYPTION,
        };
        assert_eq!(x509.signature_algorithm().object().nid(), expected_sig);

        let validity = x509.not_before().diff(x509.not_after()).unwrap();
        assert!((1826..=1828).contains(&validity.days));
    }
}

#[test]
fn test_openssl_crate_reads_service_bundle() {
    let payload = CertificateIssuer::default()
        .issue_self_signed_service(&util::service_request())
        .unwrap();
    let parsed = parse(&payload.container_bytes().unwrap(), "service-password");
    let x509 = parsed.cert.unwrap();

    let san = x509.subject_alt_names().expect("missing SAN extension");
    let ips: Vec<&[u8]> = san.iter().filter_map(|n| n.ipaddress()).collect();
    let dns: Vec<&str> = san.iter().filter_map(|n| n.dnsname()).collect();
    assert_eq!(ips, vec![&[127u8, 0, 0, 1][..]]);
    assert_eq!(dns, vec!["service.local"]);

    let text = String::from_utf8(x509.to_text().unwrap()).unwrap();
    assert!(text.contains("CA:TRUE, pathlen:0"), "{text}");
    assert!(text.contains("Certificate Sign, CRL Sign"), "{text}");

    let validity = x509.not_before().diff(x509.not_after()).unwrap();
    assert_eq!(validity.days, 3651);
}

#[test]
fn test_openssl_crate_verifies_chain() {
    let issuer = CertificateIssuer::default();
    let payload = issuer
        .issue_chain_signed(&SignCertificateRequest {
            certificate_name: "leaf.myca.local".to_string(),
            base64_issuer_certificate: util::generate_ca_container(&issuer),
            issuer_certificate_password: util::CA_PASSWORD.to_string(),
            new_certificate_password: "leaf-password".to_string(),
            days_valid: 365,
            ..Default::default()
        })
        .unwrap();
    let parsed = parse(&payload.container_bytes().unwrap(), "leaf-password");

    let leaf = parsed.cert.unwrap();
    let ca_stack = parsed.ca.expect("issuer certificate missing from bundle");
    let ca = ca_stack.iter().next().unwrap();

    assert_eq!(entry(leaf.subject_name(), Nid::COMMONNAME), "leaf.myca.local");
    assert_eq!(entry(leaf.issuer_name(), Nid::COMMONNAME), "myca.local");
    assert!(leaf.verify(&ca.public_key().unwrap()).unwrap());
    assert!(leaf.public_key().unwrap().public_eq(&parsed.pkey.unwrap()));

    let text = String::from_utf8(leaf.to_text().unwrap()).unwrap();
    assert!(text.contains("CA:FALSE"), "{text}");
    assert!(text.contains("Digital Signature, Data Encipherment"), "{text}");
    assert!(text.contains("Subject Key Identifier"), "{text}");

    let validity = leaf.not_before().diff(leaf.not_after()).unwrap();
    assert_eq!(validity.days, 366);
}

#[test]
fn test_openssl_validate_cert() {
    let payload = CertificateIssuer::default()
        .issue_self_signed_person(&util::person_request())
        .unwrap();
    let container = util::open(&payload, "12345678");
    let cert_pem = container.leaf().unwrap().to_pem().unwrap();

    let cert_path = std::env::temp_dir().join("certmint_person_cert.pem");
    fs::write(&cert_path, cert_pem).expect("Failed to write certificate");

    // Use OpenSSL CLI to validate the generated certificate
    let output = Command::new("openssl")
        .arg("x509")
        .arg("-in")
        .arg(&cert_path)
        .arg("-noout")
        .arg("-text")
        .output()
        .expect("Failed to execute OpenSSL command");

    assert!(
        output.status.success(),
        "OpenSSL command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let output_text = String::from_utf8_lossy(&output.stdout);
    assert!(
        output_text.contains("Version: 3 (0x2)"),
        "Version field is incorrect"
    );
    assert!(
        output_text.contains("Signature Algorithm: ecdsa-with-SHA256"),
        "Signature Algorithm field is incorrect"
    );
    let subject_regex = Regex::new(r"Subject: CN\s?=\s?John Doe").unwrap();
    assert!(
        subject_regex.is_match(&output_text),
        "Subject field is incorrect"
    );

    fs::remove_file(cert_path).expect("Failed to remove test certificate");
}
