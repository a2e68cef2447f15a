#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::NaiveDateTime;
use log::{debug, info};
use serde_json::Value;
use uuid::Uuid;

use crate::utils::greeting_types::{
    GreetingRequest, GreetingResponse, ProcessingMetadata, ResponseStatus, Transformation,
};
use crate::utils::greeting_utils::{timestamp_naive_to_str, timestamp_utc_naive};

// ***************************************************************************
//                                Constants
// ***************************************************************************
pub const PIPELINE_VERSION   : &str = "1.0.0";
pub const SERVER_ID_PREFIX   : &str = "server-";
pub const SIMPLE_SERVER_ID   : &str = "server-simple";
const SERVER_ID_TOKEN_LEN    : usize = 8;
const DEFAULT_GREETING       : &str = "Hello";
const TRUNCATION_MARKER      : &str = "...";

// ***************************************************************************
//                               Capabilities
// ***************************************************************************
/// Source of the wall-clock time stamped into messages and responses.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Source of the per-response server identifier.
pub trait ServerIdGenerator {
    fn server_id(&self) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        timestamp_utc_naive()
    }
}

/// Produces "server-" followed by the first 8 characters of a random v4 uuid.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidServerIdGenerator;

impl ServerIdGenerator for UuidServerIdGenerator {
    fn server_id(&self) -> String {
        let token = Uuid::new_v4().simple().to_string();
        format!("{}{}", SERVER_ID_PREFIX, &token[..SERVER_ID_TOKEN_LEN])
    }
}

// ***************************************************************************
//                                 Pipeline
// ***************************************************************************
// ---------------------------------------------------------------------------
// GreetingPipeline:
// ---------------------------------------------------------------------------
/// Applies the fixed sequence of text transformations to a greeting request.
/// The pipeline holds no request state and can be shared freely.
#[derive(Debug, Clone, Default)]
pub struct GreetingPipeline<C = SystemClock, G = UuidServerIdGenerator> {
    clock: C,
    ids: G,
}

impl GreetingPipeline {
    /// The production pipeline, reading the system clock and random uuids.
    pub fn system() -> Self {
        Self::new(SystemClock, UuidServerIdGenerator)
    }
}

impl<C: Clock, G: ServerIdGenerator> GreetingPipeline<C, G> {
    pub fn new(clock: C, ids: G) -> Self {
        Self { clock, ids }
    }

    // -----------------------------------------------------------------------
    // process:
    // -----------------------------------------------------------------------
    /** Build the greeting message one step at a time, recording a tag for
     * each step that changed it.  Absent optional fields make their step a
     * no-op; nothing here fails.
     */
    pub fn process(&self, req: &GreetingRequest) -> GreetingResponse {
        let start = Instant::now();
        let config = &req.configuration;
        let mut applied = Vec::with_capacity(7);
        let mut message = String::new();

        if let Some(prefix) = non_empty(&config.prefix) {
            message.push_str(prefix);
            message.push(' ');
            applied.push(Transformation::PrefixApplied);
        }

        // Always recorded, even when the lookup falls back to the default.
        let greeting = resolve_greeting(config.language.as_deref());
        debug!("Resolved greeting '{}' for language {:?}.", greeting, config.language);
        message.push_str(greeting);
        applied.push(Transformation::LanguageTranslated);

        // An empty username still counts as present.
        if let Some(username) = req.user_context.as_ref().and_then(|u| u.username.as_deref()) {
            message.push(' ');
            message.push_str(username);
            applied.push(Transformation::UsernameAdded);
        }

        if let Some(suffix) = non_empty(&config.suffix) {
            message.push(' ');
            message.push_str(suffix);
            applied.push(Transformation::SuffixApplied);
        }

        if config.uppercase {
            message = message.to_uppercase();
            applied.push(Transformation::UppercaseApplied);
        }

        if let Some(truncated) = truncate(&message, config.max_length) {
            debug!("Truncating greeting of {} characters to {}.", message.chars().count(), config.max_length);
            message = truncated;
            applied.push(Transformation::Truncated);
        }

        if config.include_timestamp {
            message.push_str(" [");
            message.push_str(&timestamp_naive_to_str(self.clock.now()));
            message.push(']');
            applied.push(Transformation::TimestampAdded);
        }

        let processing_time_ms = elapsed_ms(start);
        let metadata = ProcessingMetadata {
            processing_time_ms,
            server_id: self.ids.server_id(),
            version: PIPELINE_VERSION.to_string(),
            retry_count: 0,
            debug_info: build_debug_info(req),
        };

        info!("Greeting processed by {} in {}ms with transformations [{}].",
              metadata.server_id, processing_time_ms, tag_list(&applied));

        GreetingResponse {
            message,
            processing_metadata: metadata,
            status: ResponseStatus::Success,
            applied_transformations: applied,
            additional_data: build_additional_data(req),
            response_timestamp: self.clock.now(),
        }
    }

    // -----------------------------------------------------------------------
    // simple:
    // -----------------------------------------------------------------------
    /** Greet a bare name.  The response has the same shape as the complex
     * greeting but a fixed server id and a single tag.
     */
    pub fn simple(&self, name: &str) -> GreetingResponse {
        let start = Instant::now();
        let message = format!("Hello {}!", name);
        let processing_time_ms = elapsed_ms(start);

        let metadata = ProcessingMetadata {
            processing_time_ms,
            server_id: SIMPLE_SERVER_ID.to_string(),
            version: PIPELINE_VERSION.to_string(),
            retry_count: 0,
            debug_info: BTreeMap::from([("endpoint".to_string(), "simple".to_string())]),
        };

        info!("Simple greeting processed for '{}'.", name);

        GreetingResponse {
            message,
            processing_metadata: metadata,
            status: ResponseStatus::Success,
            applied_transformations: vec![Transformation::SimpleGreeting],
            additional_data: BTreeMap::from([("inputName".to_string(), Value::String(name.to_string()))]),
            response_timestamp: self.clock.now(),
        }
    }
}

// ***************************************************************************
//                             Public Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// resolve_greeting:
// ---------------------------------------------------------------------------
/** Case-insensitive lookup of the greeting word for a language code or name.
 * Unknown or absent languages greet in English.
 */
pub fn resolve_greeting(language: Option<&str>) -> &'static str {
    let language = match language {
        Some(l) => l.to_lowercase(),
        None => return DEFAULT_GREETING,
    };

    match language.as_str() {
        "fr" | "french" => "Bonjour",
        "es" | "spanish" => "Hola",
        "de" | "german" => "Guten Tag",
        "it" | "italian" => "Ciao",
        "jp" | "japanese" => "こんにちは",
        _ => DEFAULT_GREETING,
    }
}

// ***************************************************************************
//                             Private Functions
// ***************************************************************************
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

// ---------------------------------------------------------------------------
// truncate:
// ---------------------------------------------------------------------------
/** Return the first max_length characters followed by "..." when the message
 * is longer than max_length.  Returns None when no truncation applies.
 */
fn truncate(message: &str, max_length: i32) -> Option<String> {
    let max = usize::try_from(max_length).ok().filter(|m| *m > 0)?;
    let (cut, _) = message.char_indices().nth(max)?;
    let mut truncated = String::with_capacity(cut + TRUNCATION_MARKER.len());
    truncated.push_str(&message[..cut]);
    truncated.push_str(TRUNCATION_MARKER);
    Some(truncated)
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn tag_list(applied: &[Transformation]) -> String {
    applied.iter().map(Transformation::as_str).collect::<Vec<_>>().join(", ")
}

// ---------------------------------------------------------------------------
// build_debug_info:
// ---------------------------------------------------------------------------
fn build_debug_info(req: &GreetingRequest) -> BTreeMap<String, String> {
    let tags_count = req.tags.as_ref().map_or(0, Vec::len);
    let metadata_keys = match &req.metadata {
        Some(m) => m.keys().map(String::as_str).collect::<Vec<_>>().join(","),
        None => String::new(),
    };

    BTreeMap::from([
        ("requestPriority".to_string(), req.priority.as_str().to_string()),
        ("tagsCount".to_string(), tags_count.to_string()),
        ("metadataKeys".to_string(), metadata_keys),
    ])
}

// ---------------------------------------------------------------------------
// build_additional_data:
// ---------------------------------------------------------------------------
fn build_additional_data(req: &GreetingRequest) -> BTreeMap<String, Value> {
    let request_timestamp = match req.timestamp {
        Some(ts) => Value::String(timestamp_naive_to_str(ts)),
        None => Value::Null,
    };
    let user_roles = match &req.user_context {
        Some(u) => u.roles.iter().cloned().map(Value::String).collect(),
        None => Vec::new(),
    };
    let tags = match &req.tags {
        Some(t) => Value::Array(t.iter().cloned().map(Value::String).collect()),
        None => Value::Null,
    };

    BTreeMap::from([
        ("requestTimestamp".to_string(), request_timestamp),
        ("userRoles".to_string(), Value::Array(user_roles)),
        ("tags".to_string(), tags),
    ])
}
