use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use jobwatch::core::client::QueueClient;
use jobwatch::core::error::JwError;
use jobwatch::core::event::PollEvent;
use jobwatch::core::job::JobState;
use jobwatch::core::launcher::JobLauncher;
use jobwatch::core::poller::StatusPoller;
use jobwatch::core::row::build_rows;

/// Minimal HTTP fixture: answers `connections` requests with whatever the
/// handler returns for the request path, then goes away.
fn serve<F>(connections: usize, handler: F) -> String
where
    F: Fn(&str) -> (&'static str, String) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        for _ in 0..connections {
            let (mut stream, _) = match listener.accept() {
                Ok(conn) => conn,
                Err(_) => return,
            };
            let mut buf = [0u8; 2048];
            let n = stream.read(&mut buf).unwrap_or(0);
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            let path = request.split_whitespace().nth(1).unwrap_or("/").to_string();

            let (status, body) = handler(&path);
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    format!("http://{addr}")
}

#[test]
fn query_jobs_round_trip() {
    let url = serve(1, |path| {
        assert_eq!(path, "/query-job");
        (
            "200 OK",
            r#"{
                "3": {"tqueued": 1000.5, "tstarted": 1010.0, "running": true, "finished": false},
                "4": {"tqueued": 2000, "running": false, "finished": false}
            }"#
            .to_string(),
        )
    });

    let client = QueueClient::new(&url).unwrap();
    let map = client.query_jobs().unwrap();

    assert_eq!(map.len(), 2);
    assert_eq!(map["3"].state(), JobState::Running);
    assert_eq!(map["3"].queued_at(), Some(1000.5));
    assert_eq!(map["4"].state(), JobState::Queued);
}

#[test]
fn start_job_round_trip() {
    let url = serve(1, |path| {
        assert_eq!(path, "/start-job");
        ("200 OK", r#"{"jobId": "17"}"#.to_string())
    });

    let client = QueueClient::new(&url).unwrap();
    assert_eq!(client.start_job().unwrap(), 17);
}

#[test]
fn http_error_status_surfaces_as_error() {
    let url = serve(1, |_| ("500 Internal Server Error", "{}".to_string()));

    let client = QueueClient::new(&url).unwrap();
    assert!(matches!(
        client.query_jobs(),
        Err(JwError::BadStatus { status: 500, .. })
    ));
}

#[test]
fn malformed_body_surfaces_as_error() {
    let url = serve(1, |_| ("200 OK", "this is not json".to_string()));

    let client = QueueClient::new(&url).unwrap();
    assert!(matches!(
        client.query_jobs(),
        Err(JwError::MalformedResponse { .. })
    ));
}

#[test]
fn poll_then_launch_then_immediate_refresh() {
    let query_hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&query_hits);
    let url = serve(3, move |path| match path {
        "/query-job" => {
            counter.fetch_add(1, Ordering::SeqCst);
            (
                "200 OK",
                r#"{"7": {"tqueued": 1000, "running": false, "finished": false}}"#.to_string(),
            )
        }
        "/start-job" => ("200 OK", r#"{"jobId": 8}"#.to_string()),
        _ => ("404 Not Found", "{}".to_string()),
    });

    let (tx, rx) = mpsc::channel();
    let client = QueueClient::new(&url).unwrap();
    // An interval this long never fires within the test: every fetch we see
    // below is an immediate one.
    let mut poller = StatusPoller::new(client.clone(), Duration::from_secs(60), tx.clone());
    let launcher = JobLauncher::new(client, tx);

    poller.fire();
    let map = match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
        PollEvent::Status(map) => map,
        other => panic!("expected status, got {other:?}"),
    };
    poller.complete();

    let rows = build_rows(&map, 2000.0);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, "7");
    assert_eq!(rows[0].state, JobState::Queued);

    launcher.trigger();
    match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
        PollEvent::JobStarted(id) => assert_eq!(id, 8),
        other => panic!("expected job start, got {other:?}"),
    }

    // what the host loop does on JobStarted
    poller.fire();
    match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
        PollEvent::Status(_) => {}
        other => panic!("expected status, got {other:?}"),
    }

    assert_eq!(query_hits.load(Ordering::SeqCst), 2);
}

#[test]
fn single_flight_issues_one_request_for_overlapping_polls() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);
    let url = serve(1, move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(300));
        ("200 OK", "{}".to_string())
    });

    let (tx, rx) = mpsc::channel();
    let client = QueueClient::new(&url).unwrap();
    let mut poller = StatusPoller::new(client, Duration::from_secs(60), tx);

    assert!(poller.poll());
    assert!(!poller.poll());
    assert!(!poller.poll());

    match rx.recv_timeout(Duration::from_secs(5)).unwrap() {
        PollEvent::Status(map) => assert!(map.is_empty()),
        other => panic!("expected status, got {other:?}"),
    }
    poller.complete();

    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn poll_failure_reports_and_recovers() {
    // Nothing is listening on this port once the listener is dropped.
    let url = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        format!("http://{}", listener.local_addr().unwrap())
    };

    let (tx, rx) = mpsc::channel();
    let client = QueueClient::new(&url).unwrap();
    let mut poller = StatusPoller::new(client, Duration::from_secs(60), tx);

    assert!(poller.poll());
    match rx.recv_timeout(Duration::from_secs(15)).unwrap() {
        PollEvent::PollFailed(_) => {}
        other => panic!("expected failure, got {other:?}"),
    }
    poller.complete();

    // the guard re-arms, the next tick may try again
    assert!(poller.poll());
}
