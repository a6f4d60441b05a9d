// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use proptest::prelude::*;

use super::*;

#[test]
fn parses_typical_lockfile() -> anyhow::Result<()> {
    let creds = parse_lockfile_line("LeagueClient:12345:54321:s3cr3t-Token_x:https")
        .ok_or_else(|| anyhow::anyhow!("expected credentials"))?;
    assert_eq!(creds.app, "LeagueClient");
    assert_eq!(creds.pid, Some(12345));
    assert_eq!(creds.port, 54321);
    assert_eq!(creds.token, "s3cr3t-Token_x");
    assert_eq!(creds.protocol, "https");
    Ok(())
}

#[yare::parameterized(
    empty = { "" },
    one_delimiter = { "LeagueClient:1" },
    two_delimiters = { "LeagueClient:1:2" },
    three_delimiters = { "LeagueClient:1:2:token" },
    port_not_numeric = { "LeagueClient:1:abc:token:https" },
    port_negative = { "LeagueClient:1:-5:token:https" },
    port_overflow = { "LeagueClient:1:70000:token:https" },
)]
fn rejects_malformed(line: &str) {
    assert_eq!(parse_lockfile_line(line), None);
}

#[test]
fn trailing_newline_is_not_part_of_protocol() {
    let creds = parse_lockfile_line("LeagueClient:1:2999:tok:https\r\n");
    assert_eq!(creds.map(|c| c.protocol), Some("https".to_owned()));
}

#[test]
fn derived_addresses() {
    let creds = Credentials::new(54321, "abc", "https");
    assert_eq!(creds.base_url(), "https://127.0.0.1:54321");
    assert_eq!(creds.ws_url(), "wss://127.0.0.1:54321/");
    // base64("riot:abc")
    assert_eq!(creds.basic_auth_value(), "cmlvdDphYmM=");
    assert_eq!(creds.authorization_header(), "Basic cmlvdDphYmM=");

    let plain = Credentials::new(8080, "abc", "http");
    assert_eq!(plain.ws_url(), "ws://127.0.0.1:8080/");
}

#[test]
fn resolve_url_joins_relative_paths() {
    let creds = Credentials::new(1234, "t", "https");
    assert_eq!(creds.resolve_url("/lol-summoner/v1/current-summoner"),
        "https://127.0.0.1:1234/lol-summoner/v1/current-summoner");
    assert_eq!(creds.resolve_url("help"), "https://127.0.0.1:1234/help");
    assert_eq!(creds.resolve_url("https://127.0.0.1:9/x"), "https://127.0.0.1:9/x");
}

#[test]
fn read_lockfile_uses_first_line_only() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    writeln!(file, "LeagueClient:42:60000:tok:https")?;
    writeln!(file, "garbage")?;

    let creds = read_lockfile(file.path()).ok_or_else(|| anyhow::anyhow!("expected credentials"))?;
    assert_eq!(creds.port, 60000);
    assert_eq!(creds.token, "tok");
    Ok(())
}

#[test]
fn read_lockfile_missing_file_is_none() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    assert_eq!(read_lockfile(&dir.path().join("lockfile")), None);
    Ok(())
}

proptest! {
    #[test]
    fn well_formed_lines_round_trip(
        name in "[A-Za-z]{1,16}",
        pid in 0u32..=u32::MAX,
        port in 0u16..=u16::MAX,
        token in "[A-Za-z0-9_-]{1,32}",
        protocol in prop::sample::select(vec!["http", "https"]),
    ) {
        let line = format!("{name}:{pid}:{port}:{token}:{protocol}");
        let creds = parse_lockfile_line(&line);
        prop_assert!(creds.is_some());
        let creds = creds.unwrap_or_else(|| Credentials::new(0, "", ""));
        prop_assert_eq!(creds.app, name);
        prop_assert_eq!(creds.pid, Some(pid));
        prop_assert_eq!(creds.port, port);
        prop_assert_eq!(creds.token, token);
        prop_assert_eq!(creds.protocol, protocol);
    }

    #[test]
    fn lines_missing_a_delimiter_are_rejected(
        fields in prop::collection::vec("[A-Za-z0-9]{0,8}", 1..=4),
    ) {
        let line = fields.join(":");
        prop_assert_eq!(parse_lockfile_line(&line), None);
    }

    #[test]
    fn arbitrary_input_never_panics(line in ".*") {
        let _ = parse_lockfile_line(&line);
    }
}
