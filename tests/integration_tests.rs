//! Integration tests for pubscraper
//!
//! These tests drive the real source clients against a local mock HTTP server
//! through the endpoint overrides in the configuration.

use mockito::{Matcher, Server, ServerGuard};
use pubscraper::config::{Endpoints, SourceRateConfig};
use pubscraper::{Aggregator, Config, SourceType};
use serde_json::json;

/// Configuration pointing every source at the mock server, without pacing
fn config_for(server: &ServerGuard) -> Config {
    let mut config = Config::default();
    config.endpoints = Endpoints::with_base(&server.url());
    config.retry.max_attempts = 1;
    config.rate_limits.sources = vec![SourceRateConfig {
        source: "pubmed".to_string(),
        max_concurrent: Some(1),
        pacing_ms: Some(0),
    }];
    config
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn albert_item() -> serde_json::Value {
    json!({
        "title": ["Sample Paper"],
        "container-title": ["Journal of Samples"],
        "author": [{"given": "A", "family": "Albert"}],
        "published-print": {"date-parts": [[2024, 1, 1]]},
        "DOI": "10.1234/sample.doi",
        "type": "journal-article"
    })
}

fn crossref_body(items: Vec<serde_json::Value>, total: usize) -> String {
    json!({
        "status": "ok",
        "message": {"total-results": total, "items": items}
    })
    .to_string()
}

#[tokio::test]
async fn test_crossref_single_complete_record() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/works")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("query.author".into(), "A+Albert".into()),
            Matcher::UrlEncoded("rows".into(), "1".into()),
            Matcher::UrlEncoded("offset".into(), "0".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(crossref_body(vec![albert_item()], 1))
        .expect(1)
        .create_async()
        .await;

    let aggregator = Aggregator::from_config(&config_for(&server)).unwrap();
    let result = aggregator
        .aggregate(&names(&["A Albert"]), 1, &[SourceType::CrossRef])
        .await
        .unwrap();

    let publications = result.get("A Albert").unwrap();
    assert_eq!(publications.len(), 1);

    let publication = &publications[0];
    assert_eq!(publication.source(), SourceType::CrossRef);
    assert_eq!(publication.title(), "Sample Paper");
    assert_eq!(publication.journal(), Some("Journal of Samples"));
    assert_eq!(publication.publication_date(), Some("2024-01-01"));
    assert_eq!(publication.authors().to_vec(), vec!["A Albert".to_string()]);
    assert_eq!(publication.doi(), "10.1234/sample.doi");

    mock.assert_async().await;
}

#[tokio::test]
async fn test_crossref_record_without_journal_is_dropped() {
    let mut server = Server::new_async().await;
    let mut item = albert_item();
    item.as_object_mut().unwrap().remove("container-title");

    let _mock = server
        .mock("GET", "/works")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(crossref_body(vec![item], 1))
        .create_async()
        .await;

    let aggregator = Aggregator::from_config(&config_for(&server)).unwrap();
    let result = aggregator
        .aggregate(&names(&["A Albert"]), 1, &[SourceType::CrossRef])
        .await
        .unwrap();

    assert_eq!(result.get("A Albert"), Some(&[][..]));
}

#[tokio::test]
async fn test_pubmed_server_error_does_not_affect_other_sources() {
    let mut server = Server::new_async().await;
    let pubmed = server
        .mock("GET", "/esearch.fcgi")
        .match_query(Matcher::Any)
        .with_status(500)
        .expect(1)
        .create_async()
        .await;
    let _crossref = server
        .mock("GET", "/works")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(crossref_body(vec![albert_item()], 1))
        .create_async()
        .await;

    let aggregator = Aggregator::from_config(&config_for(&server)).unwrap();
    let result = aggregator
        .aggregate(
            &names(&["A Albert"]),
            1,
            &[SourceType::PubMed, SourceType::CrossRef],
        )
        .await
        .unwrap();

    let publications = result.get("A Albert").unwrap();
    assert_eq!(publications.len(), 1);
    assert_eq!(publications[0].source(), SourceType::CrossRef);

    pubmed.assert_async().await;
}

#[tokio::test]
async fn test_partial_total_returns_what_exists() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/works")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(crossref_body(vec![albert_item()], 1))
        .expect(1)
        .create_async()
        .await;

    let aggregator = Aggregator::from_config(&config_for(&server)).unwrap();
    let result = aggregator
        .aggregate(&names(&["A Albert"]), 2, &[SourceType::CrossRef])
        .await
        .unwrap();

    assert_eq!(result.get("A Albert").unwrap().len(), 1);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_crossref_pagination_advances_offset() {
    let mut server = Server::new_async().await;

    let mut incomplete = albert_item();
    incomplete.as_object_mut().unwrap().remove("DOI");
    let mut second = albert_item();
    second["title"] = json!(["Second Paper"]);
    let mut third = albert_item();
    third["title"] = json!(["Third Paper"]);

    let first_page = server
        .mock("GET", "/works")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("rows".into(), "3".into()),
            Matcher::UrlEncoded("offset".into(), "0".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(crossref_body(vec![albert_item(), incomplete, second], 10))
        .expect(1)
        .create_async()
        .await;
    let second_page = server
        .mock("GET", "/works")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("rows".into(), "1".into()),
            Matcher::UrlEncoded("offset".into(), "3".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(crossref_body(vec![third], 10))
        .expect(1)
        .create_async()
        .await;

    let aggregator = Aggregator::from_config(&config_for(&server)).unwrap();
    let result = aggregator
        .aggregate(&names(&["A Albert"]), 3, &[SourceType::CrossRef])
        .await
        .unwrap();

    let titles: Vec<&str> = result
        .get("A Albert")
        .unwrap()
        .iter()
        .map(|p| p.title())
        .collect();
    assert_eq!(titles, vec!["Sample Paper", "Second Paper", "Third Paper"]);

    first_page.assert_async().await;
    second_page.assert_async().await;
}

#[tokio::test]
async fn test_zero_rows_and_blank_names_make_no_requests() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let aggregator = Aggregator::from_config(&config_for(&server)).unwrap();

    let result = aggregator
        .aggregate(&names(&["A Albert"]), 0, &SourceType::ALL)
        .await
        .unwrap();
    assert_eq!(result.get("A Albert"), Some(&[][..]));

    let result = aggregator
        .aggregate(&names(&["", "   "]), 5, &SourceType::ALL)
        .await
        .unwrap();
    assert!(result.is_empty());

    mock.assert_async().await;
}

#[tokio::test]
async fn test_pubmed_search_then_summary() {
    let mut server = Server::new_async().await;
    let search = server
        .mock("GET", "/esearch.fcgi")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("term".into(), "Allen+W[Author]".into()),
            Matcher::UrlEncoded("retmax".into(), "2".into()),
            Matcher::UrlEncoded("retmode".into(), "json".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({"esearchresult": {"count": "2", "idlist": ["22", "11"]}}).to_string(),
        )
        .expect(1)
        .create_async()
        .await;
    let summary = server
        .mock("GET", "/esummary.fcgi")
        .match_query(Matcher::UrlEncoded("id".into(), "22,11".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "result": {
                    "uids": ["22", "11"],
                    "11": {
                        "uid": "11",
                        "title": "Older paper",
                        "fulljournalname": "Journal of Biology",
                        "sortdate": "2018/03/01 00:00",
                        "authors": [{"name": "Allen W"}],
                        "articleids": [{"idtype": "doi", "value": "10.1000/old"}]
                    },
                    "22": {
                        "uid": "22",
                        "title": "Newer paper",
                        "fulljournalname": "Journal of Biology",
                        "pubdate": "2021 Jan-Feb",
                        "authors": [{"name": "Allen W"}, {"name": "Smith J"}]
                    }
                }
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let aggregator = Aggregator::from_config(&config_for(&server)).unwrap();
    let result = aggregator
        .aggregate(&names(&["William Joseph Allen"]), 2, &[SourceType::PubMed])
        .await
        .unwrap();

    let publications = result.get("William Joseph Allen").unwrap();
    let titles: Vec<&str> = publications.iter().map(|p| p.title()).collect();
    assert_eq!(titles, vec!["Newer paper", "Older paper"]);
    assert_eq!(publications[0].publication_date(), Some("2021-01-01"));
    assert_eq!(publications[0].doi(), "");
    assert_eq!(publications[1].doi(), "10.1000/old");

    search.assert_async().await;
    summary.assert_async().await;
}

#[tokio::test]
async fn test_arxiv_feed_defaults() {
    let mut server = Server::new_async().await;
    let feed = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom"
      xmlns:opensearch="http://a9.com/-/spec/opensearch/1.1/"
      xmlns:arxiv="http://arxiv.org/schemas/atom">
  <opensearch:totalResults>1</opensearch:totalResults>
  <entry>
    <title>Bare Entry</title>
    <published>2020-01-01T00:00:00Z</published>
    <author><name>Ada Lovelace</name></author>
  </entry>
</feed>"#;

    let _mock = server
        .mock("GET", "/api/query")
        .match_query(Matcher::UrlEncoded(
            "search_query".into(),
            "au:\"Ada Lovelace\"".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/atom+xml")
        .with_body(feed)
        .create_async()
        .await;

    let aggregator = Aggregator::from_config(&config_for(&server)).unwrap();
    let result = aggregator
        .aggregate(&names(&["Ada Lovelace"]), 5, &[SourceType::Arxiv])
        .await
        .unwrap();

    let publications = result.get("Ada Lovelace").unwrap();
    assert_eq!(publications.len(), 1);
    assert_eq!(publications[0].journal(), Some("arXiv"));
    assert_eq!(publications[0].content_type(), Some("preprint"));
    assert_eq!(publications[0].publication_date(), Some("2020-01-01"));
}

#[tokio::test]
async fn test_missing_api_key_skips_request() {
    if std::env::var("ELSEVIER_API_KEY").is_ok() {
        return;
    }

    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/content/search/scopus")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let mut config = config_for(&server);
    config.api_keys.elsevier = None;

    let aggregator = Aggregator::from_config(&config).unwrap();
    let result = aggregator
        .aggregate(&names(&["Ada Lovelace"]), 3, &[SourceType::Elsevier])
        .await
        .unwrap();

    assert_eq!(result.get("Ada Lovelace"), Some(&[][..]));
    mock.assert_async().await;
}
