//! OpenProject client contract tests against a mock server.

use opsync_openproject::{OpenProjectClient, OpenProjectConfig, UpstreamError};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const AUTH: &str = "Basic YXBpa2V5OnNlY3JldA==";

fn client(server: &MockServer) -> OpenProjectClient {
    let config = OpenProjectConfig::new(server.uri()).with_api_key("secret");
    OpenProjectClient::new(config).unwrap()
}

async fn mount_current_user(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v3/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5,
            "firstName": "Alice",
            "lastName": "Doe",
            "email": "alice@example.com"
        })))
        .mount(server)
        .await;
}

fn work_packages() -> serde_json::Value {
    json!({
        "_embedded": {
            "elements": [
                {
                    "id": 101,
                    "subject": "Ship release",
                    "description": { "format": "markdown", "raw": "Tag and publish" },
                    "estimatedTime": "PT4H",
                    "spentTime": null,
                    "createdAt": "2024-05-01T12:00:00Z",
                    "updatedAt": "2024-05-02T08:30:00Z",
                    "_links": {
                        "project": { "href": "/api/v3/projects/17", "title": "Apollo" },
                        "status": { "href": "/api/v3/statuses/7", "title": "In progress" },
                        "assignee": { "href": "/api/v3/users/5", "title": "Alice Doe" },
                        "responsible": { "href": null },
                        "priority": { "href": "/api/v3/priorities/8", "title": "High" },
                        "children": [ { "href": "/api/v3/work_packages/102", "title": "Changelog" } ]
                    }
                },
                { "id": 99, "_links": {} }
            ]
        }
    })
}

#[tokio::test]
async fn test_connection_sends_basic_auth() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/work_packages"))
        .and(query_param("pageSize", "1"))
        .and(header("authorization", AUTH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"_embedded": {"elements": []}})))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).test_connection().await.unwrap();
}

#[tokio::test]
async fn test_connection_without_api_key() {
    let server = MockServer::start().await;
    let client = OpenProjectClient::new(OpenProjectConfig::new(server.uri())).unwrap();

    let err = client.test_connection().await.unwrap_err();
    assert!(matches!(err, UpstreamError::MissingApiKey));
}

#[tokio::test]
async fn test_connection_reports_rejection() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/work_packages"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client(&server).test_connection().await.unwrap_err();
    assert!(matches!(err, UpstreamError::Connection(_)));
    assert!(err.to_string().starts_with("Connection failed:"));
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_get_tasks_filters_by_current_user() {
    let server = MockServer::start().await;
    mount_current_user(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v3/work_packages"))
        .and(query_param("pageSize", "100"))
        .and(query_param("sortBy", r#"[["updatedAt", "desc"]]"#))
        .and(query_param(
            "filters",
            r#"[{"assignee":{"operator":"=","values":["5"]}}]"#,
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(work_packages()))
        .expect(1)
        .mount(&server)
        .await;

    let tasks = client(&server).get_tasks().await.unwrap();
    assert_eq!(tasks.len(), 2);

    let first = &tasks[0];
    assert_eq!(first.external_id.as_str(), "101");
    assert_eq!(first.title, "Ship release");
    assert_eq!(first.description, "Tag and publish");
    assert_eq!(first.project_id.as_deref(), Some("17"));
    assert_eq!(first.assignee, "Alice Doe");
    assert_eq!(first.responsible, None);
    assert_eq!(first.estimated_hours, Some(4.0));
    assert_eq!(first.spent_hours, None);
    assert_eq!(first.op_updated_at.as_deref(), Some("2024-05-02 08:30:00"));
    assert_eq!(first.related_to.as_ref().map(Vec::len), Some(1));

    let second = &tasks[1];
    assert_eq!(second.external_id.as_str(), "99");
    assert_eq!(second.status, "unknown");
    assert_eq!(second.assignee, "Unassigned");
}

#[tokio::test]
async fn test_get_tasks_adds_project_filter() {
    let server = MockServer::start().await;
    mount_current_user(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v3/projects"))
        .and(query_param("pageSize", "1000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": { "elements": [
                { "id": 17, "name": "Apollo Mission" },
                { "id": 18, "name": "Gemini" },
                { "id": 19, "name": null }
            ] }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v3/work_packages"))
        .and(query_param(
            "filters",
            r#"[{"assignee":{"operator":"=","values":["5"]}},{"project":{"operator":"=","values":["17"]}}]"#,
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"_embedded": {"elements": []}})))
        .expect(1)
        .mount(&server)
        .await;

    let config = OpenProjectConfig::new(server.uri())
        .with_api_key("secret")
        .with_projects(vec!["apollo".to_string()]);
    let tasks = OpenProjectClient::new(config).unwrap().get_tasks().await.unwrap();
    assert!(tasks.is_empty());
}

#[tokio::test]
async fn test_get_tasks_ignores_failed_project_lookup() {
    let server = MockServer::start().await;
    mount_current_user(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v3/projects"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v3/work_packages"))
        .and(query_param(
            "filters",
            r#"[{"assignee":{"operator":"=","values":["5"]}}]"#,
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(work_packages()))
        .expect(1)
        .mount(&server)
        .await;

    let config = OpenProjectConfig::new(server.uri())
        .with_api_key("secret")
        .with_projects(vec!["Apollo".to_string()]);
    let tasks = OpenProjectClient::new(config).unwrap().get_tasks().await.unwrap();
    assert_eq!(tasks.len(), 2);
}

#[tokio::test]
async fn test_get_tasks_fails_on_listing_error() {
    let server = MockServer::start().await;
    mount_current_user(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v3/work_packages"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server).get_tasks().await.unwrap_err();
    assert!(matches!(err, UpstreamError::Status { status: 500 }));
    assert_eq!(err.to_string(), "Request failed with status code 500");
}

#[tokio::test]
async fn test_get_tasks_requires_current_user() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v3/users/me"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = client(&server).get_tasks().await.unwrap_err();
    assert!(matches!(err, UpstreamError::CurrentUser));
}

#[tokio::test]
async fn test_get_tasks_fails_on_unmappable_record() {
    let server = MockServer::start().await;
    mount_current_user(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v3/work_packages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "_embedded": { "elements": [ { "id": 1, "createdAt": "not a date" } ] }
        })))
        .mount(&server)
        .await;

    let err = client(&server).get_tasks().await.unwrap_err();
    assert!(matches!(err, UpstreamError::Mapping(_)));
}

#[tokio::test]
async fn test_sync_configuration_defaults_to_all_projects() {
    let server = MockServer::start().await;
    let config = client(&server).sync_configuration();

    assert_eq!(config.sync_limit, 100);
    assert_eq!(config.sync_projects, vec!["All projects".to_string()]);
    assert_eq!(config.api_base_url, format!("{}/api/v3", server.uri()));
    assert!(config.has_api_key);
}
