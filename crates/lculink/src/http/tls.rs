// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TLS settings shared by the HTTP clients and the event stream.
//!
//! The LCU serves a certificate signed by Riot's private root. With
//! self-signed acceptance on, chain and name errors are tolerated for
//! loopback hosts only. Handshake signatures are always verified.

use std::net::IpAddr;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{CertificateError, DigitallySignedStruct, RootCertStore, SignatureScheme};

use crate::error::{ErrorKind, LcuError};

/// Build a rustls client config using the ring provider.
pub fn client_config(accept_self_signed: bool) -> Result<rustls::ClientConfig, LcuError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let roots = Arc::new(RootCertStore { roots: webpki_roots::TLS_SERVER_ROOTS.to_vec() });

    let builder = rustls::ClientConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()
        .map_err(tls_error)?;

    if !accept_self_signed {
        return Ok(builder.with_root_certificates(roots).with_no_client_auth());
    }

    let verifier = LoopbackVerifier::new(roots, provider)?;
    Ok(builder.dangerous().with_custom_certificate_verifier(Arc::new(verifier)).with_no_client_auth())
}

fn tls_error(e: impl std::fmt::Display) -> LcuError {
    LcuError::new(ErrorKind::BadRequest, format!("tls setup: {e}"))
}

/// Web PKI verification that lets untrusted certificates through for
/// loopback servers.
#[derive(Debug)]
struct LoopbackVerifier {
    inner: Arc<WebPkiServerVerifier>,
}

impl LoopbackVerifier {
    fn new(roots: Arc<RootCertStore>, provider: Arc<CryptoProvider>) -> Result<Self, LcuError> {
        let inner =
            WebPkiServerVerifier::builder_with_provider(roots, provider).build().map_err(tls_error)?;
        Ok(Self { inner })
    }
}

impl ServerCertVerifier for LoopbackVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        match self.inner.verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
        {
            Err(rustls::Error::InvalidCertificate(reason))
                if is_loopback(server_name) && is_tolerated(&reason) =>
            {
                Ok(ServerCertVerified::assertion())
            }
            other => other,
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

/// `127.0.0.0/8`, `::1` or `localhost`.
pub fn is_loopback(name: &ServerName<'_>) -> bool {
    match name {
        ServerName::IpAddress(ip) => IpAddr::from(*ip).is_loopback(),
        ServerName::DnsName(dns) => dns.as_ref().eq_ignore_ascii_case("localhost"),
        _ => false,
    }
}

/// Chain and name mismatches are tolerated; expiry and revocation are not.
pub fn is_tolerated(reason: &CertificateError) -> bool {
    matches!(
        reason,
        CertificateError::UnknownIssuer
            | CertificateError::NotValidForName
            | CertificateError::NotValidForNameContext { .. }
    )
}

#[cfg(test)]
#[path = "tls_tests.rs"]
mod tests;
