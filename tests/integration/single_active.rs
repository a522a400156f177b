//! At most one notification is ever animating, however many producers
//! push at once.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpStream, UnixStream};
use tokio_util::sync::CancellationToken;

use marqueed::audio::NullAudioSink;
use marqueed::display::{Canvas, DisplayResult, Frame, Presenter, Style};
use marqueed::engine::EngineState;
use marqueed::scheduler::DisplayScheduler;
use marqueed::{transport, web};

/// Presenter that counts concurrently-open canvases and remembers the peak.
struct CountingPresenter {
    open: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    displayed: Arc<AtomicUsize>,
}

struct CountingCanvas {
    open: Arc<AtomicUsize>,
    displayed: Arc<AtomicUsize>,
    released: bool,
}

#[async_trait]
impl Presenter for CountingPresenter {
    async fn acquire(&self) -> DisplayResult<Box<dyn Canvas>> {
        let now_open = self.open.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now_open, Ordering::SeqCst);
        Ok(Box::new(CountingCanvas {
            open: Arc::clone(&self.open),
            displayed: Arc::clone(&self.displayed),
            released: false,
        }))
    }
}

impl Canvas for CountingCanvas {
    fn width(&self) -> u32 {
        5
    }
    fn measure(&self, _text: &str, _style: &Style) -> u32 {
        5
    }
    fn render(&mut self, text: &str, _style: &Style, _blink_visible: bool) -> DisplayResult<Frame> {
        Ok(Frame {
            glyphs: text.to_string(),
            width: 5,
        })
    }
    fn present(&mut self, _frame: &Frame, _offset: i32) -> DisplayResult<()> {
        Ok(())
    }
    fn is_available(&self) -> bool {
        true
    }
    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.open.fetch_sub(1, Ordering::SeqCst);
            self.displayed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn fifty_submissions_across_three_transports_never_overlap_on_screen() {
    let engine = Arc::new(EngineState::new());
    let shutdown = CancellationToken::new();

    // transport 1: local socket
    let dir = tempfile::tempdir().unwrap();
    let socket_path = dir.path().join("marqueed.sock");
    let unix_listener = transport::unix::bind(&socket_path).unwrap();
    let unix_task = tokio::spawn(transport::unix::run(
        unix_listener,
        socket_path.clone(),
        Arc::clone(&engine),
        shutdown.clone(),
    ));

    // transport 2: network socket on an OS-assigned port
    let tcp_listener = transport::tcp::bind(0).await.unwrap();
    let tcp_addr = tcp_listener.local_addr().unwrap();
    let tcp_task = tokio::spawn(transport::tcp::run(
        tcp_listener,
        Arc::clone(&engine),
        shutdown.clone(),
    ));

    // transport 3: HTTP submission endpoint
    let http_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let http_addr = http_listener.local_addr().unwrap();
    let router = web::router(Arc::clone(&engine), dir.path().to_path_buf());
    let http_shutdown = shutdown.clone();
    let http_task = tokio::spawn(async move {
        axum::serve(http_listener, router)
            .with_graceful_shutdown(http_shutdown.cancelled_owned())
            .await
            .unwrap();
    });

    let open = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let displayed = Arc::new(AtomicUsize::new(0));
    let presenter = Arc::new(CountingPresenter {
        open: Arc::clone(&open),
        peak: Arc::clone(&peak),
        displayed: Arc::clone(&displayed),
    });
    let scheduler = DisplayScheduler::new(
        Arc::clone(&engine),
        presenter,
        Arc::new(NullAudioSink::default()),
        shutdown.clone(),
    )
    .with_poll_interval(Duration::from_millis(2));
    let scheduler_task = tokio::spawn(scheduler.run());

    // 50 distinct messages so neither dedup nor suppression interferes
    let mut producers = Vec::new();
    for i in 0..50usize {
        let priority = (i % 5) + 1;
        match i % 3 {
            0 => {
                let path = socket_path.clone();
                producers.push(tokio::spawn(async move {
                    let mut stream = UnixStream::connect(&path).await.unwrap();
                    let record = format!("{}|0|local-{}|white|black|0.001||", priority, i);
                    stream.write_all(record.as_bytes()).await.unwrap();
                    stream.shutdown().await.unwrap();
                }));
            }
            1 => {
                producers.push(tokio::spawn(async move {
                    let mut stream = TcpStream::connect(tcp_addr).await.unwrap();
                    let record = format!("{}|0|net-{}|white|black|0.001||", priority, i);
                    stream.write_all(record.as_bytes()).await.unwrap();
                    stream.shutdown().await.unwrap();
                }));
            }
            _ => {
                producers.push(tokio::spawn(async move {
                    let body = format!(
                        r#"{{"priority":{},"text":"web-{}","speed":0.001}}"#,
                        priority, i
                    );
                    let mut stream = TcpStream::connect(http_addr).await.unwrap();
                    let request = format!(
                        "POST /api/send-message HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    stream.write_all(request.as_bytes()).await.unwrap();
                    // read the response so the server finishes the exchange
                    let mut buf = Vec::new();
                    use tokio::io::AsyncReadExt;
                    let _ = stream.read_to_end(&mut buf).await;
                }));
            }
        }
    }
    for producer in producers {
        producer.await.unwrap();
    }

    // wait until all fifty are admitted and every one has been displayed
    let start = std::time::Instant::now();
    loop {
        let all_admitted = engine.history().len() == 50;
        let drained = engine.queue_len() == 0 && engine.active().is_none();
        if all_admitted && drained && displayed.load(Ordering::SeqCst) == 50 {
            break;
        }
        assert!(
            start.elapsed() < Duration::from_secs(30),
            "pipeline stalled: {} admitted, {} queued, {} displayed",
            engine.history().len(),
            engine.queue_len(),
            displayed.load(Ordering::SeqCst)
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    // every distinct message was admitted and shown exactly once
    assert_eq!(engine.history().len(), 50);
    assert_eq!(displayed.load(Ordering::SeqCst), 50);

    // the invariant: never more than one canvas open at any instant
    assert_eq!(peak.load(Ordering::SeqCst), 1);
    assert_eq!(open.load(Ordering::SeqCst), 0);

    shutdown.cancel();
    unix_task.await.unwrap();
    tcp_task.await.unwrap();
    http_task.await.unwrap();
    scheduler_task.await.unwrap();
}
