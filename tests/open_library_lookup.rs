mod lookup_stub;

use std::time::Duration;

use lookup_stub::{LookupStub, StubBehavior};
use readtrack::lookup::{LookupMatch, MetadataLookup as _, OpenLibraryLookup};

#[tokio::test]
async fn match_returns_first_doc_fields() -> anyhow::Result<()> {
    let stub = LookupStub::spawn(StubBehavior::Match {
        pages: Some(412),
        first_publish_year: Some(1965),
    });
    let lookup = OpenLibraryLookup::new(&stub.base_url, Duration::from_secs(5))?;

    let found = lookup.search("Dune", "Frank Herbert").await?;
    assert_eq!(
        found,
        Some(LookupMatch {
            pages: Some(412),
            first_publish_year: Some(1965),
        })
    );

    let requests = stub.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].starts_with("/search.json?"), "{}", requests[0]);
    assert!(requests[0].contains("title=Dune"));
    assert!(requests[0].contains("author=Frank+Herbert"));
    assert!(requests[0].contains("limit=1"));
    Ok(())
}

#[tokio::test]
async fn zero_docs_is_no_match() -> anyhow::Result<()> {
    let stub = LookupStub::spawn(StubBehavior::NoMatch);
    let lookup = OpenLibraryLookup::new(&stub.base_url, Duration::from_secs(5))?;

    assert_eq!(lookup.search("Unknown Book", "Nobody").await?, None);
    Ok(())
}

#[tokio::test]
async fn server_error_is_reported() -> anyhow::Result<()> {
    let stub = LookupStub::spawn(StubBehavior::ServerError);
    let lookup = OpenLibraryLookup::new(&stub.base_url, Duration::from_secs(5))?;

    let err = lookup.search("Dune", "Frank Herbert").await.unwrap_err();
    assert!(format!("{err:#}").contains("500"), "{err:#}");
    Ok(())
}

#[tokio::test]
async fn slow_service_times_out() -> anyhow::Result<()> {
    let stub = LookupStub::spawn(StubBehavior::Slow(Duration::from_millis(1500)));
    let lookup = OpenLibraryLookup::new(&stub.base_url, Duration::from_millis(200))?;

    assert!(lookup.search("Dune", "Frank Herbert").await.is_err());
    Ok(())
}
