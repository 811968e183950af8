use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};

use tiny_http::{Header, Response, Server};
use url::Url;

use textpad::worker::{AssetManifest, BackgroundWorker, HttpFetcher, ServedFrom, WorkerError, spawn};

const ASSETS: &[(&str, &str, &str)] = &[
    ("/", "text/html", "<html>root</html>"),
    ("/index.html", "text/html", "<html>index</html>"),
    ("/style.css", "text/css", "body { margin: 0 }"),
];

/// A local asset origin. Unknown paths answer 404.
struct Origin {
    server: Arc<Server>,
    thread: Option<JoinHandle<()>>,
    hits: Arc<AtomicUsize>,
    url: Url,
}

impl Origin {
    fn start(extra: &'static [(&'static str, &'static str, &'static str)]) -> Self {
        let server = Arc::new(Server::http("127.0.0.1:0").unwrap());
        let addr = server.server_addr().to_ip().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let thread = {
            let server = Arc::clone(&server);
            let hits = Arc::clone(&hits);
            thread::spawn(move || {
                for request in server.incoming_requests() {
                    hits.fetch_add(1, Ordering::SeqCst);
                    let path = request.url().to_string();
                    let asset = ASSETS.iter().chain(extra).find(|(p, _, _)| *p == path);
                    let response = match asset {
                        Some((_, content_type, body)) => {
                            let header =
                                Header::from_bytes(&b"Content-Type"[..], content_type.as_bytes())
                                    .unwrap();
                            Response::from_string(*body).with_header(header)
                        }
                        None => Response::from_string("not found").with_status_code(404),
                    };
                    let _ = request.respond(response);
                }
            })
        };
        Self {
            server,
            thread: Some(thread),
            hits,
            url: Url::parse(&format!("http://{addr}/")).unwrap(),
        }
    }

    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Stop serving and close the listening socket.
    fn stop(mut self) {
        self.server.unblock();
        if let Some(thread) = self.thread.take() {
            thread.join().unwrap();
        }
    }
}

fn manifest(origin: &Url, generation: &str) -> AssetManifest {
    AssetManifest::default()
        .with_origin(origin.clone())
        .with_generation(generation)
        .with_urls(ASSETS.iter().map(|(p, _, _)| (*p).to_string()).collect())
}

#[test]
fn test_installed_assets_are_served_offline() {
    let dir = tempfile::tempdir().unwrap();
    let origin = Origin::start(&[]);
    let url = origin.url.clone();
    let worker = BackgroundWorker::new(
        manifest(&url, "textpad-v1"),
        dir.path(),
        HttpFetcher::new().unwrap(),
    );

    assert_eq!(worker.install().unwrap(), ASSETS.len());
    assert!(worker.storage().has("textpad-v1"));
    origin.stop();

    // A fresh worker, as after a restart, with no pooled connections.
    let worker = BackgroundWorker::new(
        manifest(&url, "textpad-v1"),
        dir.path(),
        HttpFetcher::new().unwrap(),
    );
    let served = worker.handle_fetch(&url.join("/style.css").unwrap()).unwrap();
    assert_eq!(served.from, ServedFrom::Cached);
    assert_eq!(served.response.status, 200);
    assert_eq!(served.response.content_type.as_deref(), Some("text/css"));
    assert_eq!(served.response.body, b"body { margin: 0 }");

    // Not cached and the origin is gone.
    let missing = worker.handle_fetch(&url.join("/script.js").unwrap());
    assert!(matches!(missing, Err(WorkerError::Fetch(_))));
}

#[test]
fn test_uncached_requests_go_to_network_without_being_stored() {
    static EXTRA: &[(&str, &str, &str)] = &[("/extra.txt", "text/plain", "fresh")];
    let dir = tempfile::tempdir().unwrap();
    let origin = Origin::start(EXTRA);
    let url = origin.url.clone();
    let worker = BackgroundWorker::new(
        manifest(&url, "textpad-v1"),
        dir.path(),
        HttpFetcher::new().unwrap(),
    );
    worker.install().unwrap();
    let installed_hits = origin.hits();

    let extra = url.join("/extra.txt").unwrap();
    let served = worker.handle_fetch(&extra).unwrap();
    assert_eq!(served.from, ServedFrom::Network);
    assert_eq!(served.response.body, b"fresh");
    assert_eq!(origin.hits(), installed_hits + 1);

    let cache = worker.storage().open("textpad-v1").unwrap();
    assert!(cache.match_url(extra.as_str()).unwrap().is_none());

    // Cached entries do not touch the origin.
    worker.handle_fetch(&url.join("/index.html").unwrap()).unwrap();
    assert_eq!(origin.hits(), installed_hits + 1);
    origin.stop();
}

#[test]
fn test_failed_asset_aborts_install() {
    let dir = tempfile::tempdir().unwrap();
    let origin = Origin::start(&[]);
    let mut urls: Vec<String> = ASSETS.iter().map(|(p, _, _)| (*p).to_string()).collect();
    urls.push("/gone.js".to_string());
    let worker = BackgroundWorker::new(
        manifest(&origin.url, "textpad-v1").with_urls(urls),
        dir.path(),
        HttpFetcher::new().unwrap(),
    );

    let err = worker.install().unwrap_err();
    assert!(matches!(err, WorkerError::InstallStatus { status: 404, .. }));
    assert!(!worker.storage().has("textpad-v1"));
    assert!(worker.storage().keys().unwrap().is_empty());
    origin.stop();
}

#[test]
fn test_new_generation_replaces_old_on_activate() {
    let dir = tempfile::tempdir().unwrap();
    let origin = Origin::start(&[]);

    let old = BackgroundWorker::new(
        manifest(&origin.url, "textpad-v1"),
        dir.path(),
        HttpFetcher::new().unwrap(),
    );
    old.register().unwrap();

    let new = BackgroundWorker::new(
        manifest(&origin.url, "textpad-v2"),
        dir.path(),
        HttpFetcher::new().unwrap(),
    );
    let deleted = new.register().unwrap();
    assert_eq!(deleted, vec!["textpad-v1".to_string()]);
    assert_eq!(new.storage().keys().unwrap(), vec!["textpad-v2".to_string()]);
    origin.stop();
}

#[test]
fn test_register_skips_install_when_generation_present() {
    let dir = tempfile::tempdir().unwrap();
    let origin = Origin::start(&[]);
    let worker = BackgroundWorker::new(
        manifest(&origin.url, "textpad-v1"),
        dir.path(),
        HttpFetcher::new().unwrap(),
    );
    worker.register().unwrap();
    let hits = origin.hits();

    worker.register().unwrap();
    assert_eq!(origin.hits(), hits);
    origin.stop();
}

#[test]
fn test_spawned_worker_answers_fetch_after_register() {
    let dir = tempfile::tempdir().unwrap();
    let origin = Origin::start(&[]);
    let url = origin.url.clone();
    let worker = BackgroundWorker::new(
        manifest(&url, "textpad-v1"),
        dir.path(),
        HttpFetcher::new().unwrap(),
    );
    let handle = spawn(worker).unwrap();

    assert!(handle.send(textpad::worker::WorkerEvent::Register));
    // Events are handled in order, so the install is done by now.
    let served = handle.fetch(url.join("/").unwrap()).unwrap();
    assert_eq!(served.from, ServedFrom::Cached);
    assert_eq!(served.response.body, b"<html>root</html>");

    handle.shutdown();
    origin.stop();
}
