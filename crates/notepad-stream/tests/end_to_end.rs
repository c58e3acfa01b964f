//! Client against a live notepad server on a loopback port.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use notepad_server::ServeConfig;
use notepad_stream::prelude::*;
use notepad_stream::ReadyState;
use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

struct Server {
    addr: SocketAddr,
    _root: tempfile::TempDir,
    _shutdown: oneshot::Sender<()>,
}

impl Server {
    async fn start(contents: &str) -> Self {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("data")).unwrap();
        std::fs::write(root.path().join("data/notepad.txt"), contents).unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        let config = ServeConfig::default().root(root.path());
        tokio::spawn(notepad_server::serve_with_shutdown(listener, config, async {
            let _ = rx.await;
        }));

        Self {
            addr,
            _root: root,
            _shutdown: tx,
        }
    }

    fn subscriber(&self) -> Subscriber {
        Subscriber::new(self.client_config()).unwrap()
    }

    fn client_config(&self) -> ClientConfig {
        ClientConfig::new(format!("http://{}", self.addr)).retry(Duration::from_millis(20))
    }
}

/// Accepts a single connection, captures its request head and answers with
/// a fixed event stream.
async fn one_request_server(events: &'static str) -> (SocketAddr, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut head = Vec::new();
        let mut buf = [0_u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            head.extend_from_slice(&buf[..n]);
        }
        let _ = tx.send(String::from_utf8_lossy(&head).to_lowercase());
        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{events}",
            events.len()
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
    });
    (addr, rx)
}

#[tokio::test]
async fn notepad_streams_whole_file_then_closes() {
    let server = Server::start("first line\nsecond line\n").await;
    let options = StreamOptions::default().chunk_size(5).delay_ms(0);
    let mut notepad = NotepadStream::with_options(options)
        .mount(&server.subscriber())
        .unwrap();

    let finished = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(state) = notepad.next_update().await {
            if state.status.is_terminal() {
                break;
            }
        }
    })
    .await;
    assert!(finished.is_ok(), "stream did not finish");

    let state = notepad.state();
    assert_eq!(state.status, Status::Done);
    assert_eq!(state.text, "first line\nsecond line\n");
    assert!(state.meta.ends_with("notepad.txt"));
    assert!(notepad.render().contains("status: done"));
}

#[tokio::test]
async fn raw_callbacks_see_every_chunk_in_order() {
    let server = Server::start("abcdefghij").await;
    let chunks = Arc::new(Mutex::new(Vec::new()));
    let sink = chunks.clone();
    let subscription = server
        .subscriber()
        .subscribe(
            StreamHandlers::new().on_chunk(move |chunk| sink.lock().unwrap().push(chunk)),
            &StreamOptions::default().chunk_size(4).delay_ms(0),
        )
        .unwrap();

    tokio::time::timeout(Duration::from_secs(5), subscription.wait_closed())
        .await
        .expect("closed after done");
    assert!(subscription.is_closed());
    assert_eq!(*chunks.lock().unwrap(), vec!["abcd", "efgh", "ij"]);
}

#[tokio::test]
async fn missing_file_reports_error_and_stops() {
    let server = Server::start("unused").await;
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = errors.clone();
    let subscription = server
        .subscriber()
        .subscribe(
            StreamHandlers::new().on_error(move |signal| sink.lock().unwrap().push(signal)),
            &StreamOptions::default().path("missing.txt"),
        )
        .unwrap();

    tokio::time::timeout(Duration::from_secs(5), subscription.wait_closed())
        .await
        .expect("fatal status closes the connection");
    assert_eq!(subscription.ready_state(), ReadyState::Closed);
    assert!(!subscription.is_closed());
    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message().contains("404"));
}

#[tokio::test]
async fn unmount_mid_stream_stops_delivery() {
    let server = Server::start(&"x".repeat(200)).await;
    let options = StreamOptions::default().chunk_size(1).delay_ms(50);
    let mut notepad = NotepadStream::with_options(options)
        .mount(&server.subscriber())
        .unwrap();

    tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(state) = notepad.next_update().await {
            if !state.text.is_empty() {
                break;
            }
        }
    })
    .await
    .expect("first chunk");

    let handle = notepad.cancel_handle().expect("subscribed");
    assert!(notepad.unmount());
    assert!(handle.is_closed());
    assert!(!handle.cancel());
}

#[tokio::test]
async fn wrong_content_type_is_fatal() {
    let server = Server::start("unused").await;
    let errors = Arc::new(Mutex::new(Vec::new()));
    let sink = errors.clone();
    let subscription = Subscriber::new(server.client_config().endpoint("/health"))
        .unwrap()
        .subscribe(
            StreamHandlers::new().on_error(move |signal| sink.lock().unwrap().push(signal)),
            &StreamOptions::default(),
        )
        .unwrap();

    tokio::time::timeout(Duration::from_secs(5), subscription.wait_closed())
        .await
        .expect("non-event-stream response closes the connection");
    // several retry periods, to catch any reconnect
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(subscription.ready_state(), ReadyState::Closed);
    assert!(!subscription.is_closed());
    let errors = errors.lock().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message().contains("content type"));
}

#[tokio::test]
async fn requests_ask_for_an_uncached_event_stream() {
    let (addr, head) =
        one_request_server("event: meta\ndata: src\n\nevent: done\ndata: \n\n").await;
    let metas = Arc::new(Mutex::new(Vec::new()));
    let sink = metas.clone();
    let subscription = Subscriber::new(ClientConfig::new(format!("http://{addr}")))
        .unwrap()
        .subscribe(
            StreamHandlers::new().on_meta(move |meta| sink.lock().unwrap().push(meta)),
            &StreamOptions::default().chunk_size(8),
        )
        .unwrap();

    tokio::time::timeout(Duration::from_secs(5), subscription.wait_closed())
        .await
        .expect("done closes the connection");
    let head = head.await.unwrap();
    assert!(head.starts_with("get /api/streaming/notepad?chunk_size=8 http/1.1"));
    assert!(head.contains("accept: text/event-stream"));
    assert!(head.contains("cache-control: no-cache"));
    assert!(!head.contains("last-event-id"));
    assert_eq!(*metas.lock().unwrap(), vec!["src"]);
}
