// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    ipv4 = { "127.0.0.1", true },
    ipv4_range = { "127.8.9.10", true },
    ipv6 = { "::1", true },
    localhost = { "localhost", true },
    localhost_upper = { "LOCALHOST", true },
    lan = { "192.168.1.20", false },
    public_name = { "example.com", false },
)]
fn loopback_detection(host: &str, expected: bool) -> anyhow::Result<()> {
    let name = ServerName::try_from(host)?;
    assert_eq!(is_loopback(&name), expected);
    Ok(())
}

#[test]
fn chain_and_name_errors_are_tolerated() {
    assert!(is_tolerated(&CertificateError::UnknownIssuer));
    assert!(is_tolerated(&CertificateError::NotValidForName));
}

#[test]
fn expiry_and_revocation_are_not_tolerated() {
    assert!(!is_tolerated(&CertificateError::Expired));
    assert!(!is_tolerated(&CertificateError::Revoked));
}

#[yare::parameterized(
    strict = { false },
    self_signed = { true },
)]
fn config_builds(accept_self_signed: bool) -> anyhow::Result<()> {
    client_config(accept_self_signed)?;
    Ok(())
}
