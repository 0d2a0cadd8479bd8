//! Remote fetching against a local HTTP server

use mdpdf::{fetch, Error, ErrorCategory, FetchOptions, SourceLocation};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tiny_http::{Header, Response, Server};

const DOCUMENT: &str = "# Moved\n\nThe body | of the *final* endpoint.\n";

/// Start a server on an ephemeral port and return its base URL.
fn start_server(loop_hits: Arc<AtomicUsize>) -> String {
    let server = Server::http("127.0.0.1:0").unwrap();
    let base = format!("http://{}", server.server_addr());
    let absolute = format!("{}/final.md", base);

    std::thread::spawn(move || {
        for request in server.incoming_requests() {
            let location = |target: &str| format!("Location: {}", target).parse::<Header>().unwrap();
            let response = match request.url() {
                "/final.md" => Response::from_string(DOCUMENT).with_header(
                    "Content-Type: text/markdown; charset=utf-8".parse::<Header>().unwrap(),
                ),
                "/moved.md" => Response::from_string("").with_status_code(301).with_header(location("/final.md")),
                "/absolute.md" => Response::from_string("").with_status_code(302).with_header(location(&absolute)),
                "/twice.md" => Response::from_string("").with_status_code(307).with_header(location("moved.md")),
                "/loop.md" => {
                    loop_hits.fetch_add(1, Ordering::SeqCst);
                    Response::from_string("").with_status_code(302).with_header(location("/loop.md"))
                }
                "/nowhere.md" => Response::from_string("").with_status_code(302),
                "/latin1.md" => Response::from_data(b"# caf\xe9\n".to_vec()),
                _ => Response::from_string("Not Found").with_status_code(404),
            };
            let _ = request.respond(response);
        }
    });

    base
}

fn remote(base: &str, path: &str) -> SourceLocation {
    SourceLocation::parse(&format!("{}{}", base, path)).unwrap()
}

#[tokio::test]
async fn plain_fetch_returns_body() {
    let base = start_server(Arc::default());
    let body = fetch(&remote(&base, "/final.md"), &FetchOptions::default()).await.unwrap();
    assert_eq!(body, DOCUMENT);
}

#[tokio::test]
async fn single_301_redirect_yields_final_body() {
    let base = start_server(Arc::default());
    let body = fetch(&remote(&base, "/moved.md"), &FetchOptions::default()).await.unwrap();
    assert_eq!(body, DOCUMENT);
}

#[tokio::test]
async fn absolute_and_chained_redirects_are_followed() {
    let base = start_server(Arc::default());
    let opts = FetchOptions::default();
    assert_eq!(fetch(&remote(&base, "/absolute.md"), &opts).await.unwrap(), DOCUMENT);
    assert_eq!(fetch(&remote(&base, "/twice.md"), &opts).await.unwrap(), DOCUMENT);
}

#[tokio::test]
async fn redirect_cycle_stops_at_limit() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = start_server(hits.clone());
    let opts = FetchOptions {
        max_redirects: 3,
        ..Default::default()
    };

    let err = fetch(&remote(&base, "/loop.md"), &opts).await.unwrap_err();
    assert!(matches!(err, Error::TooManyRedirects { limit: 3, .. }));
    // the first request plus three followed redirects
    assert_eq!(hits.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn chain_longer_than_limit_fails() {
    let base = start_server(Arc::default());
    let opts = FetchOptions {
        max_redirects: 1,
        ..Default::default()
    };
    let err = fetch(&remote(&base, "/twice.md"), &opts).await.unwrap_err();
    assert!(matches!(err, Error::TooManyRedirects { .. }));
}

#[tokio::test]
async fn redirect_without_location_is_transport_error() {
    let base = start_server(Arc::default());
    let err = fetch(&remote(&base, "/nowhere.md"), &FetchOptions::default()).await.unwrap_err();
    assert_eq!(err.category(), Some(ErrorCategory::Transport));
}

#[tokio::test]
async fn not_found_is_http_status_error() {
    let base = start_server(Arc::default());
    let err = fetch(&remote(&base, "/missing.md"), &FetchOptions::default()).await.unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
    assert_eq!(err.exit_code(), 3);
}

#[tokio::test]
async fn unreachable_host_is_network_error() {
    // bind then drop to get a port nothing listens on
    let port = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
    let loc = SourceLocation::parse(&format!("http://127.0.0.1:{}/a.md", port)).unwrap();
    let err = fetch(&loc, &FetchOptions::default()).await.unwrap_err();
    assert!(matches!(err, Error::NetworkError(_)));
}

#[tokio::test]
async fn invalid_utf8_body_is_rejected() {
    let base = start_server(Arc::default());
    let err = fetch(&remote(&base, "/latin1.md"), &FetchOptions::default()).await.unwrap_err();
    assert!(matches!(err, Error::NetworkError(ref m) if m.contains("UTF-8")), "{}", err);
    assert_eq!(err.category(), Some(ErrorCategory::Transport));
}
