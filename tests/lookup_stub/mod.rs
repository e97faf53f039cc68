use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[allow(dead_code)]
#[derive(Debug, Clone, Copy)]
pub enum StubBehavior {
    Match {
        pages: Option<u32>,
        first_publish_year: Option<i32>,
    },
    NoMatch,
    ServerError,
    Slow(Duration),
}

/// Minimal stand-in for the Open Library `search.json` endpoint.
pub struct LookupStub {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl LookupStub {
    pub fn spawn(behavior: StubBehavior) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start lookup stub server");
        let base_url = format!("http://{}", server.server_addr());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&requests);

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };

                let url = request.url().to_string();
                seen.lock().expect("lock seen requests").push(url.clone());

                let path = url.split('?').next().unwrap_or(&url);
                if request.method() != &tiny_http::Method::Get || path != "/search.json" {
                    let _ = request.respond(
                        tiny_http::Response::from_string("not found").with_status_code(404),
                    );
                    continue;
                }

                let body = match behavior {
                    StubBehavior::Match {
                        pages,
                        first_publish_year,
                    } => {
                        let mut doc = serde_json::Map::new();
                        if let Some(pages) = pages {
                            doc.insert("number_of_pages_median".to_owned(), pages.into());
                        }
                        if let Some(year) = first_publish_year {
                            doc.insert("first_publish_year".to_owned(), year.into());
                        }
                        serde_json::json!({ "numFound": 1, "docs": [doc] })
                    }
                    StubBehavior::NoMatch => serde_json::json!({ "numFound": 0, "docs": [] }),
                    StubBehavior::ServerError => {
                        let _ = request.respond(
                            tiny_http::Response::from_string("upstream unavailable")
                                .with_status_code(500),
                        );
                        continue;
                    }
                    StubBehavior::Slow(delay) => {
                        thread::sleep(delay);
                        serde_json::json!({ "numFound": 0, "docs": [] })
                    }
                };

                let header = tiny_http::Header::from_bytes(
                    &b"Content-Type"[..],
                    &b"application/json"[..],
                )
                .expect("content-type header");
                let _ = request.respond(
                    tiny_http::Response::from_string(body.to_string())
                        .with_header(header)
                        .with_status_code(200),
                );
            }
        });

        Self {
            base_url,
            requests,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("lock seen requests").clone()
    }
}

impl Drop for LookupStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
