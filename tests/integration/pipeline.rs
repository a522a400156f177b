//! End-to-end pipeline tests: socket bytes in, animated marquee out.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;
use tokio_util::sync::CancellationToken;

use marqueed::display::{Canvas, DisplayResult, Frame, Presenter, Style};
use marqueed::engine::{EngineState, SubmitOutcome};
use marqueed::scheduler::DisplayScheduler;
use marqueed::audio::NullAudioSink;
use marqueed::{transport, wire};

/// Presenter that records each message animated to completion.
struct CompletionPresenter {
    completed: Arc<Mutex<Vec<String>>>,
}

struct CompletionCanvas {
    completed: Arc<Mutex<Vec<String>>>,
    text: Option<String>,
    finished: bool,
}

#[async_trait]
impl Presenter for CompletionPresenter {
    async fn acquire(&self) -> DisplayResult<Box<dyn Canvas>> {
        Ok(Box::new(CompletionCanvas {
            completed: Arc::clone(&self.completed),
            text: None,
            finished: false,
        }))
    }
}

impl Canvas for CompletionCanvas {
    fn width(&self) -> u32 {
        10
    }
    fn measure(&self, _text: &str, _style: &Style) -> u32 {
        10
    }
    fn render(&mut self, text: &str, _style: &Style, _blink_visible: bool) -> DisplayResult<Frame> {
        self.text = Some(text.to_string());
        Ok(Frame {
            glyphs: text.to_string(),
            width: 10,
        })
    }
    fn present(&mut self, _frame: &Frame, offset: i32) -> DisplayResult<()> {
        // the final frame sits at offset -(text_width - step)
        if offset <= -5 {
            self.finished = true;
        }
        Ok(())
    }
    fn is_available(&self) -> bool {
        true
    }
    fn release(&mut self) {
        if self.finished {
            if let Some(text) = self.text.take() {
                self.completed.lock().push(text);
            }
        }
    }
}

async fn wait_until(engine: &EngineState, deadline: Duration, done: impl Fn(&EngineState) -> bool) {
    let start = std::time::Instant::now();
    while !done(engine) {
        assert!(start.elapsed() < deadline, "condition not reached in time");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn submitted_record_is_logged_queued_and_animated_to_completion() {
    let engine = Arc::new(EngineState::new());

    // socket transport end to end
    let dir = tempfile::tempdir().unwrap();
    let socket_path = dir.path().join("marqueed.sock");
    let listener = transport::unix::bind(&socket_path).unwrap();
    let shutdown = CancellationToken::new();
    let listener_task = tokio::spawn(transport::unix::run(
        listener,
        socket_path.clone(),
        Arc::clone(&engine),
        shutdown.clone(),
    ));

    let completed = Arc::new(Mutex::new(Vec::new()));
    let presenter = Arc::new(CompletionPresenter {
        completed: Arc::clone(&completed),
    });
    let scheduler = DisplayScheduler::new(
        Arc::clone(&engine),
        presenter,
        Arc::new(NullAudioSink::default()),
        shutdown.clone(),
    )
    .with_poll_interval(Duration::from_millis(5));
    let scheduler_task = tokio::spawn(scheduler.run());

    // eight fields, empty audio and speech
    let mut stream = UnixStream::connect(&socket_path).await.unwrap();
    stream
        .write_all(b"2|0|Hello|#ffffff|#000000|0.001||")
        .await
        .unwrap();
    stream.shutdown().await.unwrap();
    drop(stream);

    wait_until(&engine, Duration::from_secs(5), |e| {
        e.history().len() == 1 && e.queue_len() == 0 && e.active().is_none()
    })
    .await;

    let history = engine.history().recent_first();
    assert_eq!(history[0].text, "Hello");
    assert_eq!(history[0].priority, 2);

    wait_until(&engine, Duration::from_secs(5), |_| {
        completed.lock().as_slice() == ["Hello"]
    })
    .await;

    shutdown.cancel();
    listener_task.await.unwrap();
    scheduler_task.await.unwrap();
}

#[tokio::test]
async fn malformed_record_never_reaches_history_or_queue() {
    let engine = Arc::new(EngineState::new());

    let dir = tempfile::tempdir().unwrap();
    let socket_path = dir.path().join("marqueed.sock");
    let listener = transport::unix::bind(&socket_path).unwrap();
    let shutdown = CancellationToken::new();
    let listener_task = tokio::spawn(transport::unix::run(
        listener,
        socket_path.clone(),
        Arc::clone(&engine),
        shutdown.clone(),
    ));

    let mut stream = UnixStream::connect(&socket_path).await.unwrap();
    stream
        .write_all(b"abc|0|hello|#fff|#000|1.0|x")
        .await
        .unwrap();
    stream.shutdown().await.unwrap();
    drop(stream);

    // give the listener time to process and reject
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(engine.history().is_empty());
    assert_eq!(engine.queue_len(), 0);

    shutdown.cancel();
    listener_task.await.unwrap();
}

#[tokio::test]
async fn ignored_text_is_suppressed_until_expiry_and_clear_does_not_resurrect() {
    let engine = Arc::new(EngineState::new());

    let request = wire::decode_str("1|0|Backup failed|red|black|0.5||").unwrap();
    let SubmitOutcome::Accepted(id) = engine.submit(request.clone()) else {
        panic!("expected acceptance");
    };

    engine.ignore(id, 5).unwrap();
    assert!(engine.history().is_empty());

    // identical normalized text is blocked, case and padding regardless
    let shouting = wire::decode_str("3|0|  BACKUP FAILED |red|black|0.5||").unwrap();
    assert_eq!(engine.submit(shouting), SubmitOutcome::Suppressed);

    // clearing history must not touch the suppression
    engine.clear_history();
    assert_eq!(engine.submit(request), SubmitOutcome::Suppressed);

    // once the table entry lapses, the same text is admissible again
    // (priority 4 so the short dedup window cannot interfere)
    engine.suppression().insert("backup failed".to_string(), Duration::from_millis(30));
    tokio::time::sleep(Duration::from_millis(60)).await;
    let retry = wire::decode_str("4|0|Backup failed|red|black|0.5||").unwrap();
    assert!(engine.submit(retry).is_accepted());
}

#[tokio::test]
async fn duplicate_submissions_inside_window_admit_exactly_one() {
    let engine = Arc::new(EngineState::new());
    let record = "1|0|heartbeat lost|yellow|black|0.5||";

    let outcomes: Vec<SubmitOutcome> = (0..2)
        .map(|_| engine.submit(wire::decode_str(record).unwrap()))
        .collect();

    let admitted = outcomes.iter().filter(|o| o.is_accepted()).count();
    assert_eq!(admitted, 1);
    assert_eq!(engine.queue_len(), 1);
    assert_eq!(engine.history().len(), 1);
}
