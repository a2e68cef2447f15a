#![forbid(unsafe_code)]

use lazy_static::lazy_static;
use log::info;
use poem::{listener::TcpListener, Route};
use poem_openapi::OpenApiService;

// Greeting Utilities
use crate::v1::greetings::complex_greeting::ComplexGreetingApi;
use crate::v1::greetings::simple_greeting::SimpleGreetingApi;
use crate::v1::greetings::version::VersionApi;
use crate::utils::config::{create_dirs_only, init_log, init_runtime_context, RuntimeCtx, GREETING_ARGS};
use crate::utils::errors::Errors;
use crate::utils::greeting_pipeline::PIPELINE_VERSION;

// Modules
mod utils;
mod v1;

// ***************************************************************************
//                                Constants
// ***************************************************************************
const SERVER_NAME : &str = "GreetingServer"; // for poem logging
const API_PREFIX  : &str = "/api";

// ***************************************************************************
//                             Static Variables
// ***************************************************************************
// Lazily initialize the parameters variable so that is has a 'static lifetime.
// We exit if we can't read our parameters.
lazy_static! {
    static ref RUNTIME_CTX: RuntimeCtx = init_runtime_context();
}

// ---------------------------------------------------------------------------
// main:
// ---------------------------------------------------------------------------
#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    // --------------- Initialize Server --------------
    // Announce ourselves.
    println!("Starting greeting_server!");

    // Only create the data directories if that's all that was asked for.
    if GREETING_ARGS.create_dirs_only {
        println!("Data directories created under: {}", create_dirs_only());
        return Ok(());
    }

    // Initialize the server.
    greeting_init();

    // --------------- Main Loop Set Up ---------------
    // Assign base URL.
    let server_url = format!("{}:{}{}",
        RUNTIME_CTX.parms.config.http_addr,
        RUNTIME_CTX.parms.config.http_port,
        API_PREFIX);

    let endpoints = (ComplexGreetingApi, SimpleGreetingApi, VersionApi);
    let api_service =
        OpenApiService::new(endpoints, RUNTIME_CTX.parms.config.title.as_str(), PIPELINE_VERSION)
        .server(server_url);

    // Allow the generated openapi specs to be retrieved from the server.
    let spec = api_service.spec_endpoint();
    let spec_yaml = api_service.spec_endpoint_yaml();

    // Create the routes and run the server.
    let addr = format!("{}{}", "0.0.0.0:", RUNTIME_CTX.parms.config.http_port);
    let ui = api_service.swagger_ui();
    let app = Route::new()
        .nest(API_PREFIX, api_service)
        .nest("/", ui)
        .at("/spec", spec)
        .at("/spec_yaml", spec_yaml);

    // ------------------ Main Loop -------------------
    info!("{} listening on {}.", SERVER_NAME, addr);
    poem::Server::new(TcpListener::bind(addr))
        .name(SERVER_NAME)
        .run(app)
        .await
}

// ***************************************************************************
//                             Private Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// greeting_init:
// ---------------------------------------------------------------------------
/** Initialize logging and force the runtime context to be read. */
fn greeting_init() {
    // Configure our log.
    init_log();

    // Force the reading of input parameters and initialization of runtime context.
    info!("{}", Errors::InputParms(format!("{:#?}", *RUNTIME_CTX)));

    // Log build info.
    print_version_info();
}

// ---------------------------------------------------------------------------
// print_version_info:
// ---------------------------------------------------------------------------
fn print_version_info() {
    info!("\n*** Running GREETING_SERVER={}, API={}.",
          option_env!("CARGO_PKG_VERSION").unwrap_or("unknown"),
          PIPELINE_VERSION);
}
