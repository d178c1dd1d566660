//! End-to-end sync against a mock document portal.

use catalog_sync::models::{
    AdapterConfig, Config, DocumentType, FetchConfig, OutputConfig, SourceConfig, TableColumns,
    UNKNOWN_DATE,
};
use catalog_sync::pipeline::{SyncOptions, run_sync};
use catalog_sync::storage::{CatalogStorage, LocalStorage};
use catalog_sync::utils::http::Fetcher;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ACTS_TABLE: &str = r#"
<html><body>
  <table>
    <tr><th>No.</th><th>Date</th><th>Description</th><th>Download</th></tr>
    <tr>
      <td>12/2024</td><td>2024-05-02</td><td>Inland Revenue (Amendment)</td>
      <td>
        <a href="/files/act/12-2024_S.pdf">Sinhala</a>
        <a href="/files/act/12-2024_T.pdf">Tamil</a>
        <a href="/files/act/12-2024_E.pdf">English</a>
      </td>
    </tr>
    <tr>
      <td>03/2024</td><td>2024.02.10</td><td>Appropriation</td>
      <td><a href="/files/act/03-2024_E.pdf">English</a></td>
    </tr>
  </table>
</body></html>
"#;

const NOTICES_PAGE: &str = r#"
<ul>
  <li><a href="/files/notices/2025-03-01_notice.pdf">Notice A</a></li>
  <li><a href="/files/notices/2025-03-01_notice.pdf">Notice A (mirror)</a></li>
  <li><a href="/files/notices/general.pdf"></a></li>
</ul>
"#;

const GAZETTE_YEAR: &str = r#"
<a href="/view/gazettes/2025-01-02.html">2 January</a>
<a href="/view/gazettes/2025-01-09.html">9 January</a>
"#;

const GAZETTE_DAY: &str = r#"
<a href="/files/gz/2025-01-02_E.pdf">Gazette 2417 English</a>
<a href="/files/gz/2025-01-02_S.pdf">Gazette 2417 Sinhala</a>
"#;

const ACTS_FEED: &str = r#"{
  "documents": [
    {
      "doc_id": "2024-03-01-05-2024",
      "description": "Companies (Amendment)",
      "date": "2024-03-01",
      "lang_to_source_url": {
        "si": "/files/act/05-2024_S.pdf",
        "en": "/files/act/05-2024_E.pdf"
      }
    },
    {"note": "not a document"}
  ]
}"#;

async fn mount(server: &MockServer, route: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

async fn portal() -> MockServer {
    let server = MockServer::start().await;
    mount(&server, "/view/acts/acts.html", 200, ACTS_TABLE).await;
    mount(&server, "/view/gazettes/2025.html", 200, GAZETTE_YEAR).await;
    mount(&server, "/view/gazettes/2025-01-02.html", 200, GAZETTE_DAY).await;
    mount(&server, "/view/gazettes/2025-01-09.html", 500, "").await;
    mount(&server, "/feed/2024.json", 200, ACTS_FEED).await;

    // First request fails, the retry succeeds.
    Mock::given(method("GET"))
        .and(path("/view/notices/notices.html"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount(&server, "/view/notices/notices.html", 200, NOTICES_PAGE).await;

    server
}

fn source(name: &str, base: &str, document_type: DocumentType, adapter: AdapterConfig) -> SourceConfig {
    SourceConfig {
        name: name.to_string(),
        enabled: true,
        document_type: Some(document_type),
        raw_type_name: None,
        label: None,
        base_url: base.to_string(),
        latest_n: None,
        seed_urls: Vec::new(),
        url_template: None,
        from_year: None,
        to_year: None,
        adapter,
    }
}

fn config(base: &str) -> Config {
    let links = || AdapterConfig::HtmlLinks {
        link_selector: "a[href$='.pdf']".to_string(),
    };
    Config {
        fetch: FetchConfig {
            user_agent: "catalog-sync-test/1.0".to_string(),
            timeout_secs: 5,
            max_retries: 3,
            backoff_base: 0.0,
            request_delay_ms: 0,
        },
        output: OutputConfig {
            latest_n: 10,
            merged_latest_n: 4,
            ..OutputConfig::default()
        },
        sources: vec![
            SourceConfig {
                seed_urls: vec![format!("{base}/view/acts/acts.html")],
                ..source(
                    "acts",
                    base,
                    DocumentType::Act,
                    AdapterConfig::HtmlTable {
                        row_selector: "table tr".to_string(),
                        columns: TableColumns::default(),
                    },
                )
            },
            SourceConfig {
                url_template: Some(format!("{base}/view/gazettes/{{year}}.html")),
                from_year: Some(2025),
                to_year: Some(2025),
                ..source(
                    "gazettes",
                    base,
                    DocumentType::Gazette,
                    AdapterConfig::GazetteIndex {
                        link_selector: "a[href$='.pdf']".to_string(),
                    },
                )
            },
            SourceConfig {
                seed_urls: vec![format!("{base}/view/notices/notices.html")],
                ..source("notices", base, DocumentType::Notice, links())
            },
            SourceConfig {
                seed_urls: vec![format!("{base}/feed/2024.json")],
                raw_type_name: Some("lk_acts".to_string()),
                ..source("lk-acts-data", base, DocumentType::Act, AdapterConfig::JsonFeed)
            },
            SourceConfig {
                seed_urls: vec![format!("{base}/view/bills/missing.html")],
                ..source("bills", base, DocumentType::Bill, links())
            },
        ],
    }
}

fn read(dir: &TempDir, key: &str) -> Vec<u8> {
    std::fs::read(dir.path().join(key)).unwrap()
}

#[tokio::test]
async fn test_sync_writes_every_source_and_merged_view() {
    let server = portal().await;
    let tmp = TempDir::new().unwrap();
    let storage = LocalStorage::new(tmp.path());
    let config = config(&server.uri());
    config.validate().unwrap();
    let fetcher = Fetcher::new(&config.fetch).unwrap();

    let report = run_sync(&config, &SyncOptions::default(), &fetcher, &storage)
        .await
        .unwrap();
    assert!(report.changed());

    let by_name = |name: &str| report.sources.iter().find(|s| s.name == name).unwrap();
    assert_eq!(by_name("acts").documents, 2);
    assert_eq!(by_name("gazettes").documents, 2);
    assert_eq!(by_name("gazettes").fetch_failures, 1);
    assert_eq!(by_name("notices").documents, 2);
    assert_eq!(by_name("notices").duplicates, 1);
    assert_eq!(by_name("lk-acts-data").documents, 1);
    assert_eq!(by_name("lk-acts-data").skipped, 1);
    assert!(by_name("bills").error.is_some());
    assert!(!tmp.path().join("bills").exists());

    let acts = storage.read_catalog("acts/catalog.json").await.unwrap().unwrap();
    assert_eq!(acts.count, 2);
    assert_eq!(acts.documents[0].title, "Act 12/2024: Inland Revenue (Amendment)");
    assert_eq!(
        acts.documents[0].primary_url,
        format!("{}/files/act/12-2024_E.pdf", server.uri())
    );
    assert_eq!(acts.documents[0].languages.len(), 3);
    assert_eq!(acts.documents[1].date, "2024-02-10");

    let notices = storage.read_catalog("notices/catalog.json").await.unwrap().unwrap();
    assert_eq!(notices.documents[0].title, "Notice A");
    assert_eq!(notices.documents[0].date, "2025-03-01");
    assert_eq!(notices.documents[1].date, UNKNOWN_DATE);
    assert_eq!(notices.documents[1].title, "general.pdf");

    let feed = storage.read_catalog("lk-acts-data/latest.json").await.unwrap().unwrap();
    assert_eq!(feed.documents[0].id, "2024-03-01-05-2024");
    assert_eq!(feed.documents[0].raw_type_name, "lk_acts");

    let merged = storage.read_catalog("all/catalog.json").await.unwrap().unwrap();
    assert_eq!(merged.count, 4);
    assert_eq!(merged.documents[0].date, "2025-03-01");
    assert!(
        merged
            .documents
            .windows(2)
            .all(|w| w[0].date >= w[1].date)
    );
}

#[tokio::test]
async fn test_second_sync_is_byte_identical() {
    let server = portal().await;
    let tmp = TempDir::new().unwrap();
    let storage = LocalStorage::new(tmp.path());
    let config = config(&server.uri());
    let fetcher = Fetcher::new(&config.fetch).unwrap();

    run_sync(&config, &SyncOptions::default(), &fetcher, &storage)
        .await
        .unwrap();
    let files = [
        "acts/catalog.json",
        "acts/latest.json",
        "gazettes/catalog.json",
        "notices/latest.json",
        "all/catalog.json",
        "all/latest.json",
    ];
    let before: Vec<Vec<u8>> = files.iter().map(|f| read(&tmp, f)).collect();

    let report = run_sync(&config, &SyncOptions::default(), &fetcher, &storage)
        .await
        .unwrap();
    assert!(!report.changed());
    let after: Vec<Vec<u8>> = files.iter().map(|f| read(&tmp, f)).collect();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_selected_source_without_merge() {
    let server = portal().await;
    let tmp = TempDir::new().unwrap();
    let storage = LocalStorage::new(tmp.path());
    let config = config(&server.uri());
    let fetcher = Fetcher::new(&config.fetch).unwrap();

    let options = SyncOptions {
        sources: vec!["acts".to_string()],
        merge: false,
    };
    let report = run_sync(&config, &options, &fetcher, &storage).await.unwrap();

    assert_eq!(report.sources.len(), 1);
    assert!(report.merge.is_none());
    assert!(tmp.path().join("acts/catalog.json").exists());
    assert!(!tmp.path().join("all").exists());
}

#[tokio::test]
async fn test_failed_source_keeps_existing_catalog() {
    let server = portal().await;
    let tmp = TempDir::new().unwrap();
    let storage = LocalStorage::new(tmp.path());
    let config = config(&server.uri());
    let fetcher = Fetcher::new(&config.fetch).unwrap();

    run_sync(&config, &SyncOptions::default(), &fetcher, &storage)
        .await
        .unwrap();
    let before = read(&tmp, "acts/catalog.json");

    server.reset().await;
    let report = run_sync(&config, &SyncOptions::default(), &fetcher, &storage)
        .await
        .unwrap();

    assert!(report.sources.iter().all(|s| s.error.is_some()));
    assert_eq!(read(&tmp, "acts/catalog.json"), before);
    let merged = storage.read_catalog("all/latest.json").await.unwrap().unwrap();
    assert_eq!(merged.count, 4);
}

#[test]
fn test_sample_config_is_valid() {
    let config = Config::load("config/catalog.toml").unwrap();
    config.validate().unwrap();
    assert!(config.source("acts").is_some());
    assert!(!config.source("lk-acts-data").unwrap().enabled);
}
