//! Live dumps against the running kernel.
//!
//! Reading qdiscs needs no privileges:
//!
//! ```bash
//! cargo test -p qstats --features integration --test integration
//! ```

use std::time::Duration;

use qstats::netlink::{DumpEnd, DumpOptions, RecordPolicy};
use qstats::util::ifname;
use qstats::{Connection, Result};

fn options() -> DumpOptions {
    DumpOptions::new().timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn test_dump_all_qdiscs() -> Result<()> {
    let mut conn = Connection::new()?;
    let outcome = conn
        .dump_qdiscs(&options().record_policy(RecordPolicy::Abort))
        .await?;

    assert_eq!(outcome.end, DumpEnd::Finished);
    assert!(outcome.rejected.is_empty());
    for q in &outcome.records {
        assert!(!q.kind().is_empty());
        assert!(q.ifindex() > 0);
    }

    Ok(())
}

#[tokio::test]
async fn test_dump_loopback() -> Result<()> {
    let lo = ifname::name_to_index("lo")?;
    let mut conn = Connection::new()?;

    let records = conn
        .dump_qdiscs(&options().ifindex(lo))
        .await?
        .into_result()?;
    for q in &records {
        assert_eq!(q.ifindex() as u32, lo);
        assert_eq!(q.identity.dev.as_deref(), Some("lo"));
    }

    Ok(())
}

#[tokio::test]
async fn test_small_buffer_floor() -> Result<()> {
    // The probe sizes the buffer, so a tiny floor still reads whole datagrams.
    let mut conn = Connection::new()?;
    let small = conn
        .dump_qdiscs(&options().buffer_floor(64).resolve_names(false))
        .await?
        .into_result()?;
    let default = conn.get_qdiscs().await?;

    assert_eq!(small.len(), default.len());
    assert!(small.iter().all(|q| q.identity.dev.is_none()));

    Ok(())
}

#[tokio::test]
async fn test_sequential_dumps_on_one_connection() -> Result<()> {
    let mut conn = Connection::new()?;
    let first = conn.get_qdiscs().await?;
    let second = conn.get_qdiscs().await?;

    let kinds = |v: &[qstats::QdiscStats]| {
        let mut k: Vec<_> = v.iter().map(|q| (q.ifindex(), q.identity.handle)).collect();
        k.sort();
        k
    };
    assert_eq!(kinds(&first), kinds(&second));

    Ok(())
}
