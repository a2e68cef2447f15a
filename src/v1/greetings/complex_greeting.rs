#![forbid(unsafe_code)]

use poem::Request;
use poem_openapi::{ OpenApi, payload::Json };

use crate::utils::greeting_pipeline::GreetingPipeline;
use crate::utils::greeting_types::{GreetingRequest, GreetingResponse};
use crate::utils::greeting_utils;

// ***************************************************************************
//                          Endpoint Definitions
// ***************************************************************************
pub struct ComplexGreetingApi;

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi]
impl ComplexGreetingApi {
    /// Run the full transformation pipeline over a greeting request.
    #[oai(path = "/greetings/complex", method = "post")]
    async fn complex_greeting(&self, http_req: &Request, req: Json<GreetingRequest>) -> Json<GreetingResponse> {
        // Conditional logging depending on log level.
        greeting_utils::debug_request(http_req, &req.0);

        Json(GreetingPipeline::system().process(&req))
    }
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::ComplexGreetingApi;
    use poem::{test::TestClient, Route};
    use poem_openapi::OpenApiService;
    use serde_json::json;

    fn client() -> TestClient<Route> {
        let api_service = OpenApiService::new(ComplexGreetingApi, "Greeting Test", "1.0.0");
        TestClient::new(Route::new().nest("/api", api_service))
    }

    #[tokio::test]
    async fn complex_greeting_endpoint() {
        let body = json!({
            "userContext": {
                "userId": "user123",
                "username": "John",
                "email": "john@example.com",
                "roles": ["USER", "ADMIN"],
                "preferences": {}
            },
            "configuration": {
                "language": "fr",
                "includeTimestamp": false,
                "uppercase": false,
                "prefix": "Hey",
                "suffix": "!",
                "maxLength": 100
            },
            "tags": ["test", "demo"],
            "metadata": {"source": "test"},
            "priority": "HIGH",
            "timestamp": "2024-01-01T10:00:00"
        });

        let resp = client().post("/api/greetings/complex").body_json(&body).send().await;
        resp.assert_status_is_ok();

        let json = resp.json().await;
        let obj = json.value().object();
        obj.get("message").assert_string("Hey Bonjour John !");
        obj.get("status").assert_string("SUCCESS");

        let tags = obj.get("appliedTransformations").string_array();
        assert_eq!(tags, vec!["PREFIX_APPLIED", "LANGUAGE_TRANSLATED", "USERNAME_ADDED", "SUFFIX_APPLIED"]);

        let metadata = obj.get("processingMetadata").object();
        metadata.get("version").assert_string("1.0.0");
        metadata.get("retryCount").assert_i64(0);
        assert!(metadata.get("serverId").string().starts_with("server-"));

        let debug_info = metadata.get("debugInfo").object();
        debug_info.get("requestPriority").assert_string("HIGH");
        debug_info.get("tagsCount").assert_string("2");
        debug_info.get("metadataKeys").assert_string("source");

        let additional = obj.get("additionalData").object();
        additional.get("userRoles").assert_string_array(&["USER", "ADMIN"]);
        additional.get("tags").assert_string_array(&["test", "demo"]);
    }

    #[tokio::test]
    async fn empty_body_greets_in_english() {
        let resp = client().post("/api/greetings/complex").body_json(&json!({})).send().await;
        resp.assert_status_is_ok();

        let json = resp.json().await;
        let obj = json.value().object();
        obj.get("message").assert_string("Hello");
        obj.get("appliedTransformations").assert_string_array(&["LANGUAGE_TRANSLATED"]);
        obj.get("additionalData").object().get("tags").assert_null();
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let resp = client()
            .post("/api/greetings/complex")
            .body_json(&json!({"configuration": {"uppercase": "yes"}}))
            .send()
            .await;
        resp.assert_status(poem::http::StatusCode::BAD_REQUEST);
    }
}
