use crate::{base_config, file_lines};
use coastal_sites::collect::{
    build_http_client, collect, FetchError, ItemFetcher, PlacesClient, PlacesFetcher, SourceKind,
    WorkItem,
};
use coastal_sites::config::{PlacesConfig, PlacesIsland};
use coastal_sites::storage::{CsvStore, ResultStore};
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const NEARBY: &str = "/maps/api/place/nearbysearch/json";
const DETAILS: &str = "/maps/api/place/details/json";

fn place(id: &str, name: &str, types: &[&str]) -> Value {
    json!({
        "name": name,
        "vicinity": "Honolulu",
        "types": types,
        "user_ratings_total": 120,
        "rating": 4.5,
        "place_id": id,
        "geometry": { "location": { "lat": 21.28, "lng": -157.83 } }
    })
}

fn places_config(base_url: &str, dir: &TempDir, terms: &[&str]) -> PlacesConfig {
    let key_path = dir.path().join("places_api_apikey.txt");
    std::fs::write(&key_path, "test-key\n").expect("Failed to write key file");

    PlacesConfig {
        output_path: dir
            .path()
            .join("data")
            .join("raw")
            .join("places.csv")
            .display()
            .to_string(),
        api_key_path: key_path.display().to_string(),
        base_url: base_url.to_string(),
        search_terms: terms.iter().map(|t| t.to_string()).collect(),
        page_delay_ms: 10,
        max_pages: 3,
        exclude_types: vec!["restaurant".to_string()],
        islands: vec![PlacesIsland {
            name: "Oahu".to_string(),
            latitude: 21.479203973491433,
            longitude: -157.97577324414377,
            radius_miles: 25.0,
        }],
    }
}

async fn mount_search(server: &MockServer) {
    // First page for "Beach", with a continuation token
    Mock::given(method("GET"))
        .and(path(NEARBY))
        .and(query_param("keyword", "Beach"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [
                place("p1", "Ala Moana Beach Park", &["park", "point_of_interest"]),
                place("p2", "Waikiki Beach", &["natural_feature"]),
            ],
            "next_page_token": "tok-1"
        })))
        .mount(server)
        .await;

    // The token is not valid on the first try
    Mock::given(method("GET"))
        .and(path(NEARBY))
        .and(query_param("pagetoken", "tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "INVALID_REQUEST",
            "results": []
        })))
        .up_to_n_times(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(NEARBY))
        .and(query_param("pagetoken", "tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [place("p3", "Sandy Beach", &["natural_feature"])]
        })))
        .mount(server)
        .await;

    // "Bay" finds a place already found for "Beach" and a restaurant
    Mock::given(method("GET"))
        .and(path(NEARBY))
        .and(query_param("keyword", "Bay"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [
                place("p1", "Ala Moana Beach Park", &["park"]),
                place("p4", "Bay View Grill", &["restaurant", "food"]),
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_places_collection_and_resume() {
    let mock_server = MockServer::start().await;
    mount_search(&mock_server).await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = base_config();
    config.places = Some(places_config(&mock_server.uri(), &dir, &["Beach", "Bay"]));
    let output = config.places.as_ref().unwrap().output_path.clone();

    let report = collect(&config, SourceKind::Places)
        .await
        .expect("Collection failed");

    assert_eq!(report.enumerated, 4);
    assert_eq!(report.appended, 3);
    assert_eq!(report.skipped, 1);
    assert!(report.failed.is_empty());
    assert_eq!(report.total_records, 3);

    let lines = file_lines(std::path::Path::new(&output));
    assert_eq!(
        lines[0],
        "\u{feff}name,vicinity,types,user_ratings_total,rating,place_id,url,lat,lon,island,classification"
    );
    assert_eq!(lines.len(), 4);

    let store = CsvStore::open(std::path::Path::new(&output), "place_id").unwrap();
    let ids: Vec<String> = store
        .records()
        .iter()
        .filter_map(|r| r.text("place_id"))
        .collect();
    assert_eq!(ids, vec!["p1", "p2", "p3"]);

    let first = &store.records()[0];
    assert_eq!(first.text("island").as_deref(), Some("Oahu"));
    assert_eq!(first.text("classification").as_deref(), Some("Beach"));
    assert_eq!(
        first.text("url").as_deref(),
        Some("https://www.google.com/maps/place/?q=place_id:p1")
    );
    assert!(!store.contains("p4"));

    // A second pass over the same results adds nothing
    let report = collect(&config, SourceKind::Places)
        .await
        .expect("Second collection failed");

    assert_eq!(report.appended, 0);
    assert_eq!(report.skipped, 4);
    assert_eq!(report.total_records, 3);
    assert_eq!(file_lines(std::path::Path::new(&output)).len(), 4);
}

#[tokio::test]
async fn test_places_api_error_fails_the_group() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(NEARBY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid.",
            "results": []
        })))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = base_config();
    config.places = Some(places_config(&mock_server.uri(), &dir, &["Beach", "Harbor"]));
    let output = config.places.as_ref().unwrap().output_path.clone();

    let report = collect(&config, SourceKind::Places)
        .await
        .expect("Collection failed");

    assert_eq!(report.groups, 0);
    assert_eq!(report.failed_groups.len(), 1);
    assert_eq!(report.failed_groups[0].group, "Oahu");
    assert!(report.failed_groups[0].error.contains("REQUEST_DENIED"));
    assert!(!report.failed_groups[0].error.contains("test-key"));
    assert!(!std::path::Path::new(&output).exists());
}

#[tokio::test]
async fn test_places_requires_api_key_file() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = base_config();
    let mut places = places_config("http://127.0.0.1:9", &dir, &["Beach"]);
    places.api_key_path = dir.path().join("missing.txt").display().to_string();
    config.places = Some(places);

    let result = collect(&config, SourceKind::Places).await;
    assert!(matches!(
        result,
        Err(coastal_sites::HarvestError::ApiKey { .. })
    ));
}

fn places_client(config: &PlacesConfig) -> PlacesClient {
    let http = build_http_client(&base_config().user_agent, 5).expect("Failed to build client");
    PlacesClient::new(http, config, "test-key".to_string())
}

#[tokio::test]
async fn test_nearby_search_stops_at_max_pages() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(NEARBY))
        .and(query_param("keyword", "Beach"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [place("p1", "Page One", &["natural_feature"])],
            "next_page_token": "tok-1"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Every continuation offers yet another page
    for (token, next, id) in [("tok-1", "tok-2", "p2"), ("tok-2", "tok-3", "p3")] {
        Mock::given(method("GET"))
            .and(path(NEARBY))
            .and(query_param("pagetoken", token))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "OK",
                "results": [place(id, "Next Page", &["natural_feature"])],
                "next_page_token": next
            })))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path(NEARBY))
        .and(query_param("pagetoken", "tok-3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [place("p4", "Too Far", &["natural_feature"])]
        })))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = places_config(&mock_server.uri(), &dir, &["Beach"]);
    let client = places_client(&config);

    let results = client
        .nearby_search(&config.islands[0], "Beach")
        .await
        .expect("Search failed");

    let ids: Vec<&str> = results
        .iter()
        .filter_map(|r| r["place_id"].as_str())
        .collect();
    assert_eq!(ids, vec!["p1", "p2", "p3"]);
}

#[tokio::test]
async fn test_continuation_gives_up_after_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(NEARBY))
        .and(query_param("keyword", "Beach"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [
                place("p1", "Ala Moana Beach Park", &["park"]),
                place("p2", "Waikiki Beach", &["natural_feature"]),
            ],
            "next_page_token": "never-ready"
        })))
        .mount(&mock_server)
        .await;

    // One attempt plus three retries, then the query ends
    Mock::given(method("GET"))
        .and(path(NEARBY))
        .and(query_param("pagetoken", "never-ready"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "INVALID_REQUEST",
            "results": []
        })))
        .expect(4)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = places_config(&mock_server.uri(), &dir, &["Beach"]);
    let client = places_client(&config);

    // Results of the first page survive the failed continuation
    let results = client
        .nearby_search(&config.islands[0], "Beach")
        .await
        .expect("Search failed");
    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn test_failed_continuation_keeps_earlier_pages_in_collection() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(NEARBY))
        .and(query_param("keyword", "Beach"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "results": [place("p1", "Ala Moana Beach Park", &["park"])],
            "next_page_token": "tok-1"
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(NEARBY))
        .and(query_param("pagetoken", "tok-1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = base_config();
    config.places = Some(places_config(&mock_server.uri(), &dir, &["Beach"]));

    let report = collect(&config, SourceKind::Places)
        .await
        .expect("Collection failed");

    assert!(report.failed_groups.is_empty());
    assert_eq!(report.appended, 1);
}

#[tokio::test]
async fn test_fetch_without_listing_uses_place_details() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(DETAILS))
        .and(query_param("place_id", "p9"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "OK",
            "result": place("p9", "Hanauma Bay", &["natural_feature", "park"])
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(DETAILS))
        .and(query_param("place_id", "gone"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "NOT_FOUND"
        })))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = places_config(&mock_server.uri(), &dir, &["Beach"]);
    let fetcher = PlacesFetcher::new(places_client(&config));

    let record = fetcher
        .fetch(&WorkItem::new("p9", "Oahu"))
        .await
        .expect("Details fetch failed");
    assert_eq!(record.text("name").as_deref(), Some("Hanauma Bay"));
    assert_eq!(record.text("types").as_deref(), Some("natural_feature, park"));
    assert_eq!(record.text("place_id").as_deref(), Some("p9"));

    let result = fetcher.fetch(&WorkItem::new("gone", "Oahu")).await;
    assert!(matches!(
        result,
        Err(FetchError::Api { ref status, .. }) if status == "NOT_FOUND"
    ));
}
