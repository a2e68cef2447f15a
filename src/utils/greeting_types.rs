#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use poem_openapi::{Enum, Object};
use serde_json::Value;

use crate::utils::greeting_utils::RequestDebug;

// ***************************************************************************
//                                 Request
// ***************************************************************************
// ---------------------------------------------------------------------------
// GreetingRequest:
// ---------------------------------------------------------------------------
/// The body of a complex greeting request.  Everything but the configuration
/// is optional, and a missing configuration decodes to its default.
#[derive(Object, Debug, Clone, Default)]
#[oai(rename_all = "camelCase")]
pub struct GreetingRequest {
    pub user_context: Option<UserContext>,
    #[oai(default)]
    pub configuration: GreetingConfiguration,
    pub tags: Option<Vec<String>>,
    pub metadata: Option<BTreeMap<String, String>>,
    #[oai(default)]
    pub priority: RequestPriority,
    pub timestamp: Option<NaiveDateTime>,
}

#[derive(Object, Debug, Clone, Default)]
#[oai(rename_all = "camelCase")]
pub struct UserContext {
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    #[oai(default)]
    pub roles: Vec<String>,
    #[oai(default)]
    pub preferences: BTreeMap<String, Value>,
}

#[derive(Object, Debug, Clone, Default)]
#[oai(rename_all = "camelCase")]
pub struct GreetingConfiguration {
    pub language: Option<String>,
    #[oai(default)]
    pub include_timestamp: bool,
    #[oai(default)]
    pub uppercase: bool,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    /// Zero or less disables truncation.
    #[oai(default)]
    pub max_length: i32,
}

#[derive(Enum, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[oai(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl RequestPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestPriority::Low => "LOW",
            RequestPriority::Medium => "MEDIUM",
            RequestPriority::High => "HIGH",
            RequestPriority::Critical => "CRITICAL",
        }
    }
}

// Implement the debug record trait for logging.
impl RequestDebug for GreetingRequest {
    fn get_request_info(&self) -> String {
        let opt = |v: &Option<String>| v.clone().unwrap_or_else(|| "None".to_string());

        let mut s = String::with_capacity(255);
        s.push_str("  Request body:");
        s.push_str("\n    username: ");
        s.push_str(&opt(&self.user_context.as_ref().and_then(|u| u.username.clone())));
        s.push_str("\n    language: ");
        s.push_str(&opt(&self.configuration.language));
        s.push_str("\n    prefix: ");
        s.push_str(&opt(&self.configuration.prefix));
        s.push_str("\n    suffix: ");
        s.push_str(&opt(&self.configuration.suffix));
        s.push_str("\n    uppercase: ");
        s.push_str(&self.configuration.uppercase.to_string());
        s.push_str("\n    maxLength: ");
        s.push_str(&self.configuration.max_length.to_string());
        s.push_str("\n    includeTimestamp: ");
        s.push_str(&self.configuration.include_timestamp.to_string());
        s.push_str("\n    priority: ");
        s.push_str(self.priority.as_str());
        s.push('\n');
        s
    }
}

// ***************************************************************************
//                                 Response
// ***************************************************************************
// ---------------------------------------------------------------------------
// GreetingResponse:
// ---------------------------------------------------------------------------
#[derive(Object, Debug, Clone)]
#[oai(rename_all = "camelCase")]
pub struct GreetingResponse {
    pub message: String,
    pub processing_metadata: ProcessingMetadata,
    pub status: ResponseStatus,
    pub applied_transformations: Vec<Transformation>,
    pub additional_data: BTreeMap<String, Value>,
    pub response_timestamp: NaiveDateTime,
}

#[derive(Object, Debug, Clone)]
#[oai(rename_all = "camelCase")]
pub struct ProcessingMetadata {
    pub processing_time_ms: u64,
    pub server_id: String,
    pub version: String,
    /// Nothing is ever retried, so this is always zero.
    pub retry_count: i32,
    pub debug_info: BTreeMap<String, String>,
}

// Only Success is produced today; the rest are part of the wire contract.
#[derive(Enum, Debug, Clone, Copy, PartialEq, Eq)]
#[oai(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    Success,
    PartialSuccess,
    Error,
    Timeout,
}

// ---------------------------------------------------------------------------
// Transformation:
// ---------------------------------------------------------------------------
/// Tags recorded in `appliedTransformations`, in the order the steps ran.
#[derive(Enum, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[oai(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Transformation {
    PrefixApplied,
    LanguageTranslated,
    UsernameAdded,
    SuffixApplied,
    UppercaseApplied,
    Truncated,
    TimestampAdded,
    SimpleGreeting,
}

impl Transformation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transformation::PrefixApplied => "PREFIX_APPLIED",
            Transformation::LanguageTranslated => "LANGUAGE_TRANSLATED",
            Transformation::UsernameAdded => "USERNAME_ADDED",
            Transformation::SuffixApplied => "SUFFIX_APPLIED",
            Transformation::UppercaseApplied => "UPPERCASE_APPLIED",
            Transformation::Truncated => "TRUNCATED",
            Transformation::TimestampAdded => "TIMESTAMP_ADDED",
            Transformation::SimpleGreeting => "SIMPLE_GREETING",
        }
    }
}
