/// HTTP endpoint for the climate observations API.
///
/// Read-only GET surface; all parameters are path segments, no query strings
/// and no request bodies. Every route performs one scoped data-access
/// session, reshapes rows into the wire shape, and responds with JSON
/// (the route listing at `/` is an HTML fragment).
///
/// Endpoints:
/// - GET /                        - Route listing (HTML)
/// - GET /api/v1.0/precipitation  - Rolling year of precipitation, date -> value
/// - GET /api/v1.0/stations       - Station directory
/// - GET /api/v1.0/tobs           - Rolling year of temperature observations
/// - GET /api/v1.0/{start}        - Temperature summary from start date
/// - GET /api/v1.0/{start}/{end}  - Temperature summary over [start, end]
/// - GET /health                  - Service health check

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Value, json};

use crate::db::{ClimateStore, DataError, rolling_year_start};

/// Worker threads pulling requests off the shared server socket.
const WORKER_COUNT: usize = 4;

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

/// Parsed request target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Health,
    Precipitation,
    Stations,
    Tobs,
    /// `/api/v1.0/{start}` — summary from start date, unbounded above.
    SummaryFrom(String),
    /// `/api/v1.0/{start}/{end}` — summary over the closed range.
    SummaryRange(String, String),
    NotFound,
}

/// Maps a request URL to a route. Path parameters pass through verbatim;
/// date validation is the storage engine's problem.
pub fn route(url: &str) -> Route {
    match url {
        "/" => return Route::Home,
        "/health" => return Route::Health,
        "/api/v1.0/precipitation" => return Route::Precipitation,
        "/api/v1.0/stations" => return Route::Stations,
        "/api/v1.0/tobs" => return Route::Tobs,
        _ => {}
    }

    if let Some(rest) = url.strip_prefix("/api/v1.0/") {
        let segments: Vec<&str> = rest.split('/').collect();
        match segments.as_slice() {
            [start] if !start.is_empty() => {
                return Route::SummaryFrom(start.to_string());
            }
            [start, end] if !start.is_empty() && !end.is_empty() => {
                return Route::SummaryRange(start.to_string(), end.to_string());
            }
            _ => {}
        }
    }

    Route::NotFound
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Route listing served at `/`.
pub fn home_body() -> String {
    concat!(
        "Available Routes:<br/>",
        "/api/v1.0/precipitation<br/>",
        "/api/v1.0/stations<br/>",
        "/api/v1.0/tobs<br/>",
        "/api/v1.0/&lt;start&gt;<br/>",
        "/api/v1.0/&lt;start&gt;/&lt;end&gt;"
    )
    .to_string()
}

/// Precipitation for the rolling year, as a date -> value mapping.
///
/// The window start is recomputed from the live maximum date on every call.
/// Duplicate dates collapse with the last row winning, matching mapping
/// construction semantics. An empty dataset degrades to `{}`.
pub fn precipitation(store: &ClimateStore) -> Result<Value, DataError> {
    let session = store.session()?;

    let window_start = match session.last_observation_date() {
        Ok(last) => rolling_year_start(&last)?,
        Err(DataError::EmptyDataset) => return Ok(json!({})),
        Err(e) => return Err(e),
    };

    let mut by_date: BTreeMap<String, Option<f64>> = BTreeMap::new();
    for reading in session.all_precipitation()? {
        if reading.date.as_str() >= window_start.as_str() {
            by_date.insert(reading.date, reading.prcp);
        }
    }

    Ok(json!(by_date))
}

/// The full station directory.
pub fn stations(store: &ClimateStore) -> Result<Value, DataError> {
    let session = store.session()?;
    let stations = session.all_stations()?;
    Ok(json!(stations))
}

/// Temperature observations for the rolling year, ascending by date, each
/// element a single-key `{date: temperature}` object. An empty dataset
/// degrades to `[]`.
pub fn tobs(store: &ClimateStore) -> Result<Value, DataError> {
    let session = store.session()?;

    let window_start = match session.last_observation_date() {
        Ok(last) => rolling_year_start(&last)?,
        Err(DataError::EmptyDataset) => return Ok(json!([])),
        Err(e) => return Err(e),
    };

    let readings = session.observations_in_range(&window_start, None)?;
    let body: Vec<Value> = readings
        .into_iter()
        .map(|r| {
            let mut entry = serde_json::Map::new();
            entry.insert(r.date, json!(r.tobs));
            Value::Object(entry)
        })
        .collect();

    Ok(Value::Array(body))
}

/// Temperature summary for dates >= start.
///
/// Responds with an array containing one object. The two-date route responds
/// with a bare object instead; the asymmetry is load-bearing for existing
/// clients and is kept on purpose.
pub fn summary_from(store: &ClimateStore, start: &str) -> Result<Value, DataError> {
    let session = store.session()?;
    let summary = session.temperature_summary(start, None)?;
    Ok(json!([summary]))
}

/// Temperature summary over the closed range [start, end], as a bare object.
pub fn summary_range(store: &ClimateStore, start: &str, end: &str) -> Result<Value, DataError> {
    let session = store.session()?;
    let summary = session.temperature_summary(start, Some(end))?;
    Ok(json!(summary))
}

// ---------------------------------------------------------------------------
// Response assembly
// ---------------------------------------------------------------------------

type HttpResponse = tiny_http::Response<std::io::Cursor<Vec<u8>>>;

/// Dispatches a parsed route to its handler and assembles the response.
/// Every error is handled here, at the request boundary.
pub fn respond(store: &ClimateStore, route: Route) -> HttpResponse {
    match route {
        Route::Home => html_response(200, home_body()),
        Route::Health => json_response(
            200,
            json!({
                "status": "ok",
                "service": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION")
            }),
        ),
        Route::Precipitation => handler_response(precipitation(store)),
        Route::Stations => handler_response(stations(store)),
        Route::Tobs => handler_response(tobs(store)),
        Route::SummaryFrom(start) => handler_response(summary_from(store, &start)),
        Route::SummaryRange(start, end) => {
            handler_response(summary_range(store, &start, &end))
        }
        Route::NotFound => json_response(
            404,
            json!({
                "error": "Not found",
                "available_endpoints": [
                    "/",
                    "/api/v1.0/precipitation",
                    "/api/v1.0/stations",
                    "/api/v1.0/tobs",
                    "/api/v1.0/{start}",
                    "/api/v1.0/{start}/{end}",
                    "/health"
                ]
            }),
        ),
    }
}

fn handler_response(result: Result<Value, DataError>) -> HttpResponse {
    match result {
        Ok(body) => json_response(200, body),
        Err(e) => json_response(500, json!({ "error": e.to_string() })),
    }
}

/// JSON response with the given status code.
fn json_response(status_code: u16, body: Value) -> HttpResponse {
    let bytes = body.to_string().into_bytes();
    tiny_http::Response::from_data(bytes)
        .with_status_code(tiny_http::StatusCode::from(status_code))
        .with_header(content_type("application/json"))
}

/// HTML response for the route listing.
fn html_response(status_code: u16, body: String) -> HttpResponse {
    tiny_http::Response::from_data(body.into_bytes())
        .with_status_code(tiny_http::StatusCode::from(status_code))
        .with_header(content_type("text/html; charset=utf-8"))
}

fn content_type(value: &str) -> tiny_http::Header {
    // Both strings are static ASCII; construction cannot fail.
    tiny_http::Header::from_bytes(&b"Content-Type"[..], value.as_bytes())
        .unwrap_or_else(|_| unreachable!("static Content-Type header"))
}

// ---------------------------------------------------------------------------
// HTTP server
// ---------------------------------------------------------------------------

/// Starts the endpoint server on the specified port and blocks forever.
///
/// Requests are pulled off the shared listener by a small worker pool; each
/// worker handles one request at a time with its own scoped data session, so
/// there is no shared mutable state between in-flight requests.
pub fn start_endpoint_server(port: u16, store: ClimateStore) -> Result<(), String> {
    let server = tiny_http::Server::http(format!("0.0.0.0:{}", port))
        .map_err(|e| format!("Failed to start HTTP server: {}", e))?;
    let server = Arc::new(server);

    println!("📡 Climate API listening on http://0.0.0.0:{}", port);
    println!("   GET /                       - Route listing");
    println!("   GET /api/v1.0/precipitation - Rolling year of precipitation");
    println!("   GET /api/v1.0/stations      - Station directory");
    println!("   GET /api/v1.0/tobs          - Rolling year of temperatures");
    println!("   GET /api/v1.0/{{start}}       - Summary from start date");
    println!("   GET /api/v1.0/{{start}}/{{end}} - Summary over date range");
    println!("   GET /health                 - Service health check\n");

    let pool = threadpool::ThreadPool::new(WORKER_COUNT);
    for _ in 0..WORKER_COUNT {
        let server = Arc::clone(&server);
        let store = store.clone();
        pool.execute(move || {
            loop {
                let request = match server.recv() {
                    Ok(request) => request,
                    Err(e) => {
                        eprintln!("Failed to receive request: {}", e);
                        continue;
                    }
                };

                let response = respond(&store, route(request.url()));
                if let Err(e) = request.respond(response) {
                    eprintln!("Failed to send response: {}", e);
                }
            }
        });
    }

    pool.join();
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_routes() {
        assert_eq!(route("/"), Route::Home);
        assert_eq!(route("/health"), Route::Health);
        assert_eq!(route("/api/v1.0/precipitation"), Route::Precipitation);
        assert_eq!(route("/api/v1.0/stations"), Route::Stations);
        assert_eq!(route("/api/v1.0/tobs"), Route::Tobs);
    }

    #[test]
    fn test_parameterized_routes() {
        assert_eq!(
            route("/api/v1.0/2017-01-01"),
            Route::SummaryFrom("2017-01-01".to_string())
        );
        assert_eq!(
            route("/api/v1.0/2017-01-01/2017-01-31"),
            Route::SummaryRange("2017-01-01".to_string(), "2017-01-31".to_string())
        );
    }

    #[test]
    fn test_malformed_dates_still_route() {
        // No validation at the routing layer; the engine decides what a
        // nonsense date matches.
        assert_eq!(
            route("/api/v1.0/not-a-date"),
            Route::SummaryFrom("not-a-date".to_string())
        );
    }

    #[test]
    fn test_unknown_paths_are_not_found() {
        assert_eq!(route("/api"), Route::NotFound);
        assert_eq!(route("/api/v1.0/"), Route::NotFound);
        assert_eq!(route("/api/v1.0/a/b/c"), Route::NotFound);
        assert_eq!(route("/api/v2.0/stations"), Route::NotFound);
        assert_eq!(route("/nope"), Route::NotFound);
    }

    #[test]
    fn test_home_lists_every_api_route() {
        let body = home_body();
        assert!(body.contains("/api/v1.0/precipitation"));
        assert!(body.contains("/api/v1.0/stations"));
        assert!(body.contains("/api/v1.0/tobs"));
        assert!(body.contains("start"));
        assert!(body.contains("end"));
    }
}
