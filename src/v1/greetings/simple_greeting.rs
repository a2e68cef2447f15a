#![forbid(unsafe_code)]

use poem_openapi::{ OpenApi, payload::Json, param::Path };

use crate::utils::greeting_pipeline::GreetingPipeline;
use crate::utils::greeting_types::GreetingResponse;

// ***************************************************************************
//                          Endpoint Definitions
// ***************************************************************************
pub struct SimpleGreetingApi;

// ***************************************************************************
//                             OpenAPI Endpoint
// ***************************************************************************
#[OpenApi]
impl SimpleGreetingApi {
    #[oai(path = "/greetings/simple/:name", method = "get")]
    async fn simple_greeting(&self, name: Path<String>) -> Json<GreetingResponse> {
        Json(GreetingPipeline::system().simple(&name))
    }
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::SimpleGreetingApi;
    use poem::{test::TestClient, Route};
    use poem_openapi::OpenApiService;

    #[tokio::test]
    async fn simple_greeting_endpoint() {
        let api_service = OpenApiService::new(SimpleGreetingApi, "Greeting Test", "1.0.0");
        let cli = TestClient::new(Route::new().nest("/api", api_service));

        let resp = cli.get("/api/greetings/simple/World").send().await;
        resp.assert_status_is_ok();

        let json = resp.json().await;
        let obj = json.value().object();
        obj.get("message").assert_string("Hello World!");
        obj.get("status").assert_string("SUCCESS");
        obj.get("appliedTransformations").assert_string_array(&["SIMPLE_GREETING"]);

        let metadata = obj.get("processingMetadata").object();
        metadata.get("version").assert_string("1.0.0");
        metadata.get("serverId").assert_string("server-simple");
        metadata.get("debugInfo").object().get("endpoint").assert_string("simple");
        obj.get("additionalData").object().get("inputName").assert_string("World");
    }
}
