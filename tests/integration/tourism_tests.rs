use crate::{base_config, file_lines};
use coastal_sites::collect::{collect, SourceKind};
use coastal_sites::config::{TourismConfig, TourismIsland};
use coastal_sites::storage::CsvStore;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn site_page(name: &str) -> String {
    format!(
        r#"<html><body>
        <h1 class="title"><span itemprop="name">{name}</span></h1>
        <div class="midpanel_row"><p>{name} is a popular beach.</p><p>$10 parking</p></div>
        <div id="contenttab0.5"><ul><li>Restrooms</li><li>Showers</li></ul></div>
        <div id="contenttab4"><ul><li>Swimming</li></ul></div>
        </body></html>"#
    )
}

async fn mount_html(server: &MockServer, at: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

fn tourism_config(base_url: &str, dir: &TempDir) -> (TourismConfig, PathBuf) {
    let output = dir.path().join("to_hawaii_sites.csv");
    let config = TourismConfig {
        output_path: output.display().to_string(),
        base_url: base_url.to_string(),
        islands: vec![TourismIsland {
            slug: "oahu".to_string(),
            name: None,
        }],
    };
    (config, output)
}

fn site_links(output: &Path) -> Vec<String> {
    let store = CsvStore::open(output, "site_link").expect("Failed to open output");
    store
        .records()
        .iter()
        .filter_map(|r| r.text("site_link"))
        .collect()
}

#[tokio::test]
async fn test_failed_site_is_isolated_and_retried_next_run() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_html(
        &mock_server,
        "/oahu/beaches/",
        r#"<html><body>
            <span itemprop="name"><a href="a.php">A</a></span>
            <span itemprop="name"><a href="b.php">B</a></span>
            <span itemprop="name"><a href="c.php">C</a></span>
        </body></html>"#
            .to_string(),
    )
    .await;
    mount_html(&mock_server, "/oahu/beaches/a.php", site_page("Beach A")).await;
    mount_html(&mock_server, "/oahu/beaches/c.php", site_page("Beach C")).await;

    // B fails once, then recovers
    Mock::given(method("GET"))
        .and(path("/oahu/beaches/b.php"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    mount_html(&mock_server, "/oahu/beaches/b.php", site_page("Beach B")).await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let (tourism, output) = tourism_config(&base_url, &dir);
    let mut config = base_config();
    config.tourism = Some(tourism);

    let link = |page: &str| format!("{}/oahu/beaches/{}", base_url, page);

    let report = collect(&config, SourceKind::Tourism)
        .await
        .expect("Collection failed");

    assert_eq!(report.appended, 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].identifier, link("b.php"));
    assert!(report.failed[0].error.contains("500"));
    assert_eq!(site_links(&output), vec![link("a.php"), link("c.php")]);

    let lines = file_lines(&output);
    assert_eq!(
        lines[0],
        "\u{feff}name,description,facilities,activities,island,site_link"
    );
    assert_eq!(lines.len(), 3);

    // The next run only fetches what is missing
    let report = collect(&config, SourceKind::Tourism)
        .await
        .expect("Second collection failed");

    assert_eq!(report.skipped, 2);
    assert_eq!(report.appended, 1);
    assert!(report.failed.is_empty());
    assert_eq!(
        site_links(&output),
        vec![link("a.php"), link("c.php"), link("b.php")]
    );

    let lines = file_lines(&output);
    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines.iter().filter(|l| l.contains("site_link")).count(),
        1
    );

    let store = CsvStore::open(&output, "site_link").unwrap();
    let b = &store.records()[2];
    assert_eq!(b.text("name").as_deref(), Some("Beach B"));
    assert_eq!(b.text("island").as_deref(), Some("Oahu"));
    assert_eq!(b.text("description").as_deref(), Some("Beach B is a popular beach."));
    assert_eq!(b.text("facilities").as_deref(), Some("restrooms, showers"));
}

#[tokio::test]
async fn test_missing_listing_fails_the_group() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/oahu/beaches/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let (tourism, output) = tourism_config(&mock_server.uri(), &dir);
    let mut config = base_config();
    config.tourism = Some(tourism);

    let report = collect(&config, SourceKind::Tourism)
        .await
        .expect("Collection failed");

    assert_eq!(report.failed_groups.len(), 1);
    assert_eq!(report.failed_groups[0].group, "Oahu");
    assert_eq!(report.total_records, 0);
    assert!(!output.exists());
}

#[tokio::test]
async fn test_page_without_title_is_reported() {
    let mock_server = MockServer::start().await;

    mount_html(
        &mock_server,
        "/oahu/beaches/",
        r#"<span itemprop="name"><a href="/oahu/beaches/empty.php">Empty</a></span>"#.to_string(),
    )
    .await;
    mount_html(
        &mock_server,
        "/oahu/beaches/empty.php",
        "<html><body><p>Under construction</p></body></html>".to_string(),
    )
    .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let (tourism, output) = tourism_config(&mock_server.uri(), &dir);
    let mut config = base_config();
    config.tourism = Some(tourism);

    let report = collect(&config, SourceKind::Tourism)
        .await
        .expect("Collection failed");

    assert_eq!(report.appended, 0);
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].error.contains("h1.title"));
    assert!(!output.exists());
}
