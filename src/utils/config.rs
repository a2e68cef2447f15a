#![forbid(unsafe_code)]

use anyhow::{Result, anyhow};
use log::{info, error, LevelFilter};
use serde::Deserialize;
use std::{env, fs, path::Path};
use fs_mistrust::Mistrust;
use std::os::unix::fs::PermissionsExt;
use lazy_static::lazy_static;
use structopt::StructOpt;

use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config as LogConfig, Root};
use log4rs::encode::pattern::PatternEncoder;

// Greeting Utilities
use crate::utils::{greeting_utils::get_absolute_path, errors::Errors};

// ***************************************************************************
//                                Constants
// ***************************************************************************
// Directory and file locations. Unless otherwise noted, all files and directories
// are relative to the root directory.
const ENV_GREETING_ROOT_DIR : &str = "GREETING_ROOT_DIR";
const DEFAULT_ROOT_DIR      : &str = "~/.greeting";
const CONFIG_DIR            : &str = "/config";
const LOGS_DIR              : &str = "/logs";
const LOG4RS_CONFIG_FILE    : &str = "/log4rs.yml";     // relative to config dir
const GREETING_CONFIG_FILE  : &str = "/greeting.toml";  // relative to config dir

// Networking.
const DEFAULT_TITLE         : &str = "Greeting Server";
const DEFAULT_HTTP_ADDR     : &str = "http://localhost";
const DEFAULT_HTTP_PORT     : u16  = 8080;

// Console logging used when no log4rs file is installed.
const DEFAULT_LOG_PATTERN   : &str = "{d(%Y-%m-%dT%H:%M:%S%.3f)} {h({l})} {t} - {m}{n}";

// ***************************************************************************
//                             Static Variables
// ***************************************************************************
// Assign the command line arguments BEFORE RUNTIME_CTX is initialized in main.
lazy_static! {
    pub static ref GREETING_ARGS: GreetingArgs = init_greeting_args();
}

// Calculate the data directories BEFORE RUNTIME_CTX is initialized in main.
lazy_static! {
    pub static ref GREETING_DIRS: GreetingDirs = init_greeting_dirs();
}

// ***************************************************************************
//                             Directory Structs
// ***************************************************************************
// ---------------------------------------------------------------------------
// GreetingDirs:
// ---------------------------------------------------------------------------
#[derive(Debug)]
#[allow(dead_code)]
pub struct GreetingDirs {
    pub root_dir: String,
    pub config_dir: String,
    pub logs_dir: String,
}

// ***************************************************************************
//                               Config Structs
// ***************************************************************************
// ---------------------------------------------------------------------------
// GreetingArgs:
// ---------------------------------------------------------------------------
#[derive(Debug, StructOpt)]
#[structopt(name = "greeting_args", about = "Command line arguments for the Greeting Server.")]
pub struct GreetingArgs {
    /// Specify the server's root data directory.
    ///
    /// This directory contains the config and logs subdirectories.
    #[structopt(short, long)]
    pub root_dir: Option<String>,

    /// Create the data directories and then exit.
    ///
    /// The data directories will be rooted at a root directory calculated
    /// using the following priority order:
    ///
    ///   1. If set, the value of the GREETING_ROOT_DIR environment,
    ///
    ///   2. Otherwise, if set, the value of the --root-dir command line argument,
    ///
    ///   3. Otherwise, ~/.greeting
    ///
    #[structopt(short, long)]
    pub create_dirs_only: bool,
}

// ---------------------------------------------------------------------------
// Parms:
// ---------------------------------------------------------------------------
#[derive(Debug)]
#[allow(dead_code)]
pub struct Parms {
    pub config_file: String,
    pub config: Config,
}

// ---------------------------------------------------------------------------
// RuntimeCtx:
// ---------------------------------------------------------------------------
#[derive(Debug)]
#[allow(dead_code)]
pub struct RuntimeCtx {
    pub parms: Parms,
    pub greeting_args: &'static GreetingArgs,
    pub greeting_dirs: &'static GreetingDirs,
}

// ---------------------------------------------------------------------------
// Config:
// ---------------------------------------------------------------------------
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub title: String,
    pub http_addr: String,
    pub http_port: u16,
}

impl Config {
    pub fn new() -> Self {
        Config::default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            http_addr: DEFAULT_HTTP_ADDR.to_string(),
            http_port: DEFAULT_HTTP_PORT,
        }
    }
}

// ***************************************************************************
//                            Directory Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// init_greeting_args:
// ---------------------------------------------------------------------------
/** Get the command line arguments. */
fn init_greeting_args() -> GreetingArgs {
    let args = GreetingArgs::from_args();
    println!("{:?}", args);
    args
}

// ---------------------------------------------------------------------------
// init_greeting_dirs:
// ---------------------------------------------------------------------------
/** Calculate the external data directories.  Any failure results in a panic
 * since the server cannot run without its data directories.
 */
fn init_greeting_dirs() -> GreetingDirs {
    match create_greeting_dirs() {
        Ok(dirs) => dirs,
        Err(e) => panic!("{}", e),
    }
}

// ---------------------------------------------------------------------------
// create_greeting_dirs:
// ---------------------------------------------------------------------------
fn create_greeting_dirs() -> Result<GreetingDirs> {
    let mistrust = get_mistrust()?;

    // Check each directory, creating the ones that don't exist yet.
    let root_dir = get_root_dir();
    check_greeting_dir(&root_dir, "root directory", &mistrust)?;

    let config_dir = root_dir.clone() + CONFIG_DIR;
    check_greeting_dir(&config_dir, "config directory", &mistrust)?;

    let logs_dir = root_dir.clone() + LOGS_DIR;
    check_greeting_dir(&logs_dir, "logs directory", &mistrust)?;

    Ok(GreetingDirs { root_dir, config_dir, logs_dir })
}

// ---------------------------------------------------------------------------
// check_greeting_dir:
// ---------------------------------------------------------------------------
/** Check that the path is absolute and, if it exists, that it is a directory
 * with rwx permissions for the owner only.  If it doesn't exist, create it.
 * The mistrust package creates directories with 0o700 permissions.
 */
fn check_greeting_dir(dir: &str, msgname: &str, mistrust: &Mistrust) -> Result<()> {
    let path = Path::new(dir);
    if !path.is_absolute() {
        return Err(anyhow!(Errors::DataDirectory(format!("{} (must be absolute)", msgname), dir.to_string())));
    }

    if path.exists() {
        if !path.is_dir() {
            return Err(anyhow!(Errors::DataDirectory(format!("{} (must be a directory)", msgname), dir.to_string())));
        }
        let perm = path.metadata().map_err(Errors::IOError)?.permissions().mode();
        if perm & 0o777 != 0o700 {
            return Err(anyhow!(Errors::DataDirectory(format!("{} (must have 0o700 permissions)", msgname), dir.to_string())));
        }
    } else if let Err(e) = mistrust.make_directory(path) {
        return Err(anyhow!("Make directory error for {:?}: {}", path, e));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// get_mistrust:
// ---------------------------------------------------------------------------
/** Configure a new mistrust object for initial directory processing. */
fn get_mistrust() -> Result<Mistrust> {
    Mistrust::builder()
        .ignore_prefix(get_absolute_path("~"))
        .trust_group(0)
        .build()
        .map_err(|e| anyhow!("Mistrust configuration error: {}", e))
}

// ---------------------------------------------------------------------------
// get_root_dir:
// ---------------------------------------------------------------------------
fn get_root_dir() -> String {
    resolve_root_dir(env::var(ENV_GREETING_ROOT_DIR).ok(), GREETING_ARGS.root_dir.clone())
}

// ---------------------------------------------------------------------------
// resolve_root_dir:
// ---------------------------------------------------------------------------
/** Order of precedence:
 *  1. Environment variable
 *  2. Command line --root-dir argument
 *  3. Default location
 */
fn resolve_root_dir(env_dir: Option<String>, arg_dir: Option<String>) -> String {
    let root_dir = env_dir
        .or(arg_dir)
        .unwrap_or_else(|| DEFAULT_ROOT_DIR.to_string());

    get_absolute_path(&root_dir)
}

// ***************************************************************************
//                               Log Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// init_log:
// ---------------------------------------------------------------------------
pub fn init_log() {
    // Use the installed log4rs file when there is one.
    let logconfig = init_log_config();
    if Path::new(&logconfig).exists() {
        if let Err(e) = log4rs::init_file(&logconfig, Default::default()) {
            println!("{}", e);
            panic!("{}", Errors::Log4rsInitialization(logconfig));
        }
        info!("Log4rs initialized using: {}", logconfig);
        return;
    }

    // Otherwise log to the console.
    if let Err(e) = init_console_log() {
        println!("{}", e);
        panic!("{}", Errors::Log4rsInitialization(logconfig));
    }
    info!("Log4rs initialized with console logging, no file found at: {}", logconfig);
}

// ---------------------------------------------------------------------------
// init_log_config:
// ---------------------------------------------------------------------------
fn init_log_config() -> String {
    GREETING_DIRS.config_dir.clone() + LOG4RS_CONFIG_FILE
}

// ---------------------------------------------------------------------------
// init_console_log:
// ---------------------------------------------------------------------------
fn init_console_log() -> Result<()> {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(DEFAULT_LOG_PATTERN)))
        .build();
    let config = LogConfig::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info))?;
    log4rs::init_config(config)?;
    Ok(())
}

// ***************************************************************************
//                             Parms Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// get_parms:
// ---------------------------------------------------------------------------
/** Retrieve the application parameters from the configuration file in the
 * config data directory.  If the file cannot be read the default values are
 * used; a file that cannot be parsed is an error.
 */
fn get_parms() -> Result<Parms> {
    let config_file = get_absolute_path(&(GREETING_DIRS.config_dir.clone() + GREETING_CONFIG_FILE));
    info!("{}", Errors::ReadingConfigFile(config_file.clone()));
    let contents = match fs::read_to_string(&config_file) {
        Ok(c) => c,
        Err(_) => {
            info!("Unable to read configuration at {}. Using default values.", config_file);
            return Ok(Parms { config_file: Default::default(), config: Config::new() });
        }
    };

    let config = parse_config(&contents, &config_file)?;
    Ok(Parms { config_file, config })
}

// ---------------------------------------------------------------------------
// parse_config:
// ---------------------------------------------------------------------------
fn parse_config(contents: &str, config_file: &str) -> Result<Config> {
    match toml::from_str(contents) {
        Ok(c)  => Ok(c),
        Err(e) => {
            let msg = format!("{}\n   {}", Errors::TOMLParseError(config_file.to_string()), e);
            error!("{}", msg);
            Err(anyhow!(msg))
        }
    }
}

// ***************************************************************************
//                             Config Functions
// ***************************************************************************
// ---------------------------------------------------------------------------
// init_runtime_context:
// ---------------------------------------------------------------------------
pub fn init_runtime_context() -> RuntimeCtx {
    // The application aborts if the configuration is unusable.
    let parms = get_parms().expect("FAILED to read configuration file.");
    RuntimeCtx {parms, greeting_args: &GREETING_ARGS, greeting_dirs: &GREETING_DIRS}
}

// ---------------------------------------------------------------------------
// create_dirs_only:
// ---------------------------------------------------------------------------
/** Force the data directories into existence, returning the root. */
pub fn create_dirs_only() -> String {
    GREETING_DIRS.root_dir.clone()
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::new();
        assert_eq!(config.title, "Greeting Server");
        assert_eq!(config.http_addr, "http://localhost");
        assert_eq!(config.http_port, 8080);
    }

    #[test]
    fn parse_partial_config() {
        let config = parse_config("http_port = 9090\n", "greeting.toml").unwrap();
        assert_eq!(config.http_port, 9090);
        assert_eq!(config.title, "Greeting Server");
    }

    #[test]
    fn parse_full_config() {
        let contents = "title = \"Hi\"\nhttp_addr = \"http://example.org\"\nhttp_port = 3001\n";
        let config = parse_config(contents, "greeting.toml").unwrap();
        assert_eq!(config.title, "Hi");
        assert_eq!(config.http_addr, "http://example.org");
        assert_eq!(config.http_port, 3001);
    }

    #[test]
    fn parse_bad_config() {
        let err = parse_config("http_port = \"not a port\"", "greeting.toml").unwrap_err();
        assert!(err.to_string().contains("Unable to parse TOML file: greeting.toml"));
    }

    #[test]
    fn root_dir_precedence() {
        let env_dir = resolve_root_dir(Some("/tmp/from_env".to_string()), Some("/tmp/from_arg".to_string()));
        assert_eq!(env_dir, "/tmp/from_env");

        let arg_dir = resolve_root_dir(None, Some("/tmp/from_arg".to_string()));
        assert_eq!(arg_dir, "/tmp/from_arg");

        let default_dir = resolve_root_dir(None, None);
        assert!(default_dir.ends_with("/.greeting"));
        assert!(Path::new(&default_dir).is_absolute());
    }

    #[test]
    fn relative_dir_rejected() {
        let mistrust = get_mistrust().unwrap();
        let err = check_greeting_dir("relative/dir", "root directory", &mistrust).unwrap_err();
        assert!(err.to_string().contains("must be absolute"));
    }
}
