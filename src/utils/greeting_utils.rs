#![forbid(unsafe_code)]

use path_absolutize::Absolutize;
use std::ops::Deref;
use std::path::Path;
use chrono::{NaiveDateTime, Utc};

use poem::Request;

use log::{debug, LevelFilter};

// ***************************************************************************
//                                Constants
// ***************************************************************************
// ISO-8601 local date-time with fractional seconds, ex: 2024-01-01T10:00:00.123456
pub const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

// ***************************************************************************
// GENERAL PUBLIC FUNCTIONS
// ***************************************************************************
// ---------------------------------------------------------------------------
// get_absolute_path:
// ---------------------------------------------------------------------------
/** Replace tilde (~) and environment variable values in a path name and
 * then construct the absolute path name.  Unlike canonicalize, absolutize
 * does not care whether the file exists.  On any failure the original path
 * is returned unchanged.
 */
pub fn get_absolute_path(path: &str) -> String {
    let s = match shellexpand::full(path) {
        Ok(x) => x,
        Err(_) => return path.to_owned(),
    };

    let p = Path::new(s.deref());
    let p1 = match p.absolutize() {
        Ok(x) => x,
        Err(_) => return path.to_owned(),
    };
    match p1.to_str() {
        Some(x) => x.to_owned(),
        None => path.to_owned(),
    }
}

// ---------------------------------------------------------------------------
// timestamp_utc_naive:
// ---------------------------------------------------------------------------
/** Get the current UTC wall-clock time without an offset. */
pub fn timestamp_utc_naive() -> NaiveDateTime {
    Utc::now().naive_utc()
}

// ---------------------------------------------------------------------------
// timestamp_naive_to_str:
// ---------------------------------------------------------------------------
/** Format a naive datetime the way it appears on the wire, which looks
 * like this:  2022-09-13T14:14:42.719849
 */
pub fn timestamp_naive_to_str(ts: NaiveDateTime) -> String {
    ts.format(NAIVE_TIMESTAMP_FORMAT).to_string()
}

// ***************************************************************************
//                                  Traits
// ***************************************************************************
pub trait RequestDebug {
    fn get_request_info(&self) -> String;
}

// ---------------------------------------------------------------------------
// debug_request:
// ---------------------------------------------------------------------------
// Dump http request information to the log.
pub fn debug_request(http_req: &Request, req: &impl RequestDebug) {
    // Check that debug or higher logging is in effect.
    if log::max_level() < LevelFilter::Debug {
        return;
    }

    let mut s = "\n".to_string();

    // Restate the URI.
    let uri = http_req.uri();
    s += format!("  URI: {:?}\n", uri).as_str();

    // Accumulate the headers
    for v in http_req.headers().iter() {
        s += format!("  Header: {} = {:?} \n", v.0, v.1).as_str();
    }

    // List query parameters.
    if let Some(q) = uri.query() {
        s += format!("  Query Parameters: {:?}\n", q).as_str();
    } else {
        s += "  * No Query Parameters\n";
    }

    // Add the request's information.
    s += req.get_request_info().as_str();

    // Write the single log record.
    debug!("{}", s);
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn absolute_path_expands_tilde() {
        let p = get_absolute_path("~/.greeting");
        assert!(Path::new(&p).is_absolute());
        assert!(!p.contains('~'));
        assert!(p.ends_with("/.greeting"));
    }

    #[test]
    fn absolute_path_keeps_absolute() {
        assert_eq!(get_absolute_path("/var/tmp/greeting"), "/var/tmp/greeting");
    }

    #[test]
    fn naive_timestamp_format() {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
            .and_hms_micro_opt(10, 0, 0, 250_000).unwrap();
        assert_eq!(timestamp_naive_to_str(ts), "2024-01-01T10:00:00.250");

        let whole = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
            .and_hms_opt(10, 0, 0).unwrap();
        assert_eq!(timestamp_naive_to_str(whole), "2024-01-01T10:00:00");
    }
}
