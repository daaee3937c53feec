//! Integration tests for the Compute Engine REST client using wiremock

use std::sync::Arc;

use orchestrate_rs::compute::ComputeClient;
use orchestrate_rs::compute::rest::RestComputeClient;
use orchestrate_rs::config::OrchestrateConfig;
use orchestrate_rs::{CreationRequest, CreationStatus, InstanceCreator, InstanceDescriptor, OrchestrateError};
use serde_json::json;
use wiremock::matchers::{
    body_partial_json, header, method, path, query_param, query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

const IMAGE_LINK: &str =
    "https://www.googleapis.com/compute/v1/projects/images/global/images/centos-7-v1";

fn template_json(name: &str, default_size: bool) -> serde_json::Value {
    let mut items = vec![json!({"key": "color", "value": "red"})];
    if default_size {
        items.push(json!({"key": "orchestrate_default_size", "value": "true"}));
    }

    json!({
        "name": name,
        "selfLink": format!("https://www.googleapis.com/compute/v1/projects/media/global/instanceTemplates/{}", name),
        "properties": {
            "machineType": "n1-standard-8",
            "networkInterfaces": [{"network": "global/networks/default", "accessConfigs": [{"type": "ONE_TO_ONE_NAT"}]}],
            "disks": [{
                "boot": true,
                "autoDelete": true,
                "initializeParams": {"sourceImage": IMAGE_LINK, "diskType": "pd-ssd", "diskSizeGb": "200"}
            }],
            "metadata": {"items": items}
        }
    })
}

fn image_json(name: &str) -> serde_json::Value {
    json!({
        "name": name,
        "selfLink": format!("https://www.googleapis.com/compute/v1/projects/images/global/images/{}", name),
        "family": "centos-7",
        "status": "READY"
    })
}

// ============================================================================
// Client
// ============================================================================

#[tokio::test]
async fn test_get_instance_template() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/media/global/instanceTemplates/render-8"))
        .and(header("Authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(template_json("render-8", false)))
        .mount(&mock_server)
        .await;

    let client = RestComputeClient::with_base_url(&mock_server.uri())
        .unwrap()
        .with_access_token("secret-token");
    let template = client
        .get_instance_template("media", "render-8")
        .await
        .expect("Failed to get template");

    assert_eq!(template.name, "render-8");
    assert_eq!(template.properties.machine_type.as_deref(), Some("n1-standard-8"));
    assert_eq!(template.metadata_items().len(), 1);
    assert_eq!(template.properties.disks.len(), 1);
}

#[tokio::test]
async fn test_list_instance_templates_follows_pages() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/media/global/instanceTemplates"))
        .and(query_param("filter", "name = \"render-*\""))
        .and(query_param_is_missing("pageToken"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [template_json("render-16", false)],
            "nextPageToken": "page-2"
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/projects/media/global/instanceTemplates"))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [template_json("render-8", true)]
        })))
        .mount(&mock_server)
        .await;

    let client = RestComputeClient::with_base_url(&mock_server.uri()).unwrap();
    let templates = client
        .list_instance_templates("media", "render-")
        .await
        .expect("Failed to list templates");

    let names: Vec<_> = templates.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["render-16", "render-8"]);
}

#[tokio::test]
async fn test_list_without_items() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/media/global/instanceTemplates"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&mock_server)
        .await;

    let client = RestComputeClient::with_base_url(&mock_server.uri()).unwrap();
    let templates = client.list_instance_templates("media", "none-").await.unwrap();
    assert!(templates.is_empty());
}

#[tokio::test]
async fn test_images() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/images/global/images/centos-7-v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(image_json("centos-7-v1")))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/projects/images/global/images/family/centos-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(image_json("centos-7-v2")))
        .mount(&mock_server)
        .await;

    let client = RestComputeClient::with_base_url(&mock_server.uri()).unwrap();

    let exact = client.get_image("images", "centos-7-v1").await.unwrap();
    assert_eq!(exact.family.as_deref(), Some("centos-7"));
    assert_eq!(exact.self_link, IMAGE_LINK);

    let latest = client.get_image_from_family("images", "centos-7").await.unwrap();
    assert_eq!(latest.name, "centos-7-v2");
}

#[tokio::test]
async fn test_error_message_extracted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/media/global/instanceTemplates/render-99"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {
                "code": 404,
                "message": "The resource 'projects/media/global/instanceTemplates/render-99' was not found"
            }
        })))
        .mount(&mock_server)
        .await;

    let client = RestComputeClient::with_base_url(&mock_server.uri()).unwrap();
    let err = client
        .get_instance_template("media", "render-99")
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    match err {
        OrchestrateError::Compute { status, message } => {
            assert_eq!(status, 404);
            assert!(message.starts_with("The resource"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_insert_instance_posts_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/projects/media/zones/us-central1-a/instances"))
        .and(body_partial_json(json!({"name": "artist-ws", "machineType": "n1-standard-8"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operation-123",
            "status": "PENDING",
            "targetLink": "https://www.googleapis.com/compute/v1/projects/media/zones/us-central1-a/instances/artist-ws"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = RestComputeClient::with_base_url(&mock_server.uri()).unwrap();
    let descriptor = InstanceDescriptor {
        name: "artist-ws".to_string(),
        machine_type: "n1-standard-8".to_string(),
        ..Default::default()
    };

    let operation = client
        .insert_instance("media", "us-central1-a", &descriptor)
        .await
        .unwrap();
    assert_eq!(operation.name, "operation-123");
    assert_eq!(operation.status.as_deref(), Some("PENDING"));
}

// ============================================================================
// End to end
// ============================================================================

async fn mount_render_family(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/projects/media/global/instanceTemplates"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [template_json("render-16", false), template_json("render-8", true)]
        })))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/projects/images/global/images/centos-7-v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(image_json("centos-7-v1")))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/projects/images/global/images/family/centos-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(image_json("centos-7-v2")))
        .mount(mock_server)
        .await;
}

fn creator(mock_server: &MockServer) -> InstanceCreator {
    let mut config = OrchestrateConfig::default();
    config.startup.bucket = "orchestrate-scripts".to_string();

    let client = RestComputeClient::with_base_url(&mock_server.uri()).unwrap();
    InstanceCreator::new(Arc::new(client), config)
}

#[tokio::test]
async fn test_create_from_default_size() {
    let mock_server = MockServer::start().await;
    mount_render_family(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/projects/media/zones/us-central1-a/instances"))
        .and(body_partial_json(json!({
            "name": "artist-ws",
            "description": "Orchestrate instance created from template render size 8",
            "machineType": "https://www.googleapis.com/compute/v1/projects/media/zones/us-central1-a/machineTypes/n1-standard-8",
            "metadata": {"items": [
                {"key": "color", "value": "red"},
                {"key": "startup-script-url", "value": "gs://orchestrate-scripts/remotedesktopconfigure.py"}
            ]}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operation-1",
            "status": "PENDING"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = CreationRequest::new("media", "us-central1-a", "render").with_name("artist-ws");
    let response = creator(&mock_server).create(&request).await.unwrap();

    assert_eq!(response.status, CreationStatus::Submitted);
    assert_eq!(response.name, "artist-ws");
    assert_eq!(response.operation, "operation-1");
}

#[tokio::test]
async fn test_create_conflict() {
    let mock_server = MockServer::start().await;
    mount_render_family(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/projects/media/zones/us-central1-a/instances"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error": {
                "code": 409,
                "message": "The resource 'projects/media/zones/us-central1-a/instances/artist-ws' already exists"
            }
        })))
        .mount(&mock_server)
        .await;

    let request = CreationRequest::new("media", "us-central1-a", "render").with_name("artist-ws");
    let err = creator(&mock_server).create(&request).await.unwrap_err();

    assert_eq!(err.to_string(), "An instance with name artist-ws already exists.");
}

#[tokio::test]
async fn test_dry_run_makes_no_insert() {
    let mock_server = MockServer::start().await;
    mount_render_family(&mock_server).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let request = CreationRequest::new("media", "us-central1-a", "render").with_latest_image(true);
    let descriptor = creator(&mock_server).build_descriptor(&request).await.unwrap();

    let boot = descriptor.boot_disk().unwrap();
    assert_eq!(
        boot.initialize_params.as_ref().unwrap().source_image.as_deref(),
        Some("https://www.googleapis.com/compute/v1/projects/images/global/images/centos-7-v2")
    );
    assert!(descriptor.name.starts_with("render-8-"));
}
