// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::error::ErrorKind;
use crate::metrics::NoopMetrics;

use super::*;

fn client() -> anyhow::Result<GameHttpClient> {
    Ok(GameHttpClient::new(&LcuConfig::default(), Arc::new(NoopMetrics))?)
}

#[yare::parameterized(
    leading_slash = { "/liveclientdata/allgamedata", "https://127.0.0.1:2999/liveclientdata/allgamedata" },
    bare = { "liveclientdata/eventdata", "https://127.0.0.1:2999/liveclientdata/eventdata" },
    absolute_same_host = { "https://127.0.0.1:2999/x?y=1", "https://127.0.0.1:2999/x?y=1" },
)]
fn targets_resolve_onto_fixed_base(path: &str, expected: &str) -> anyhow::Result<()> {
    assert_eq!(client()?.target(path)?, expected);
    Ok(())
}

#[yare::parameterized(
    other_port = { "https://127.0.0.1:29990/x" },
    other_host = { "https://example.com/liveclientdata" },
    plain_http = { "http://127.0.0.1:2999/x" },
)]
fn foreign_absolute_urls_are_rejected(path: &str) -> anyhow::Result<()> {
    let err = client()?.target(path).err();
    assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::BadRequest));
    Ok(())
}

#[test]
fn base_override_trims_trailing_slash() -> anyhow::Result<()> {
    let client = client()?.with_base_url("http://127.0.0.1:4000/");
    assert_eq!(client.base_url(), "http://127.0.0.1:4000");
    assert_eq!(client.target("/a")?, "http://127.0.0.1:4000/a");
    Ok(())
}

#[tokio::test]
async fn foreign_url_fails_without_request() -> anyhow::Result<()> {
    let metrics = Arc::new(crate::metrics::AtomicMetrics::new());
    let client = GameHttpClient::new(&LcuConfig::default(), metrics.clone())?;

    let err = client.send(Method::GET, "https://10.0.0.1:2999/x", None).await.err();
    assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::BadRequest));
    assert_eq!(metrics.snapshot().http_requests, 0);
    Ok(())
}
