//! Byte-transparent relay of the upstream event stream.
//!
//! The relay runs in its own task and feeds the response body through a
//! bounded channel. Every upstream chunk is forwarded unchanged before it is
//! decoded, so the client sees exactly what the upstream service sent. The
//! task stops reading as soon as the client goes away, which drops the
//! upstream response and releases its connection.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use report_core::accumulator::{CompletedReport, ReportAccumulator};
use report_core::generation::GenerationRequest;
use report_core::phase::GenerationPhase;
use report_core::sse::{FrameError, SseDecoder, StreamEvent};
use report_db::models::report::CreateReport;
use report_upstream::{ByteStream, UpstreamError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tracing::Instrument;

use super::sink::ReportSink;

/// Chunks buffered between the relay task and the response body.
const RELAY_BUFFER: usize = 16;

/// Item type of the response body stream. An `Err` aborts the response.
pub type RelayItem = Result<Bytes, UpstreamError>;

/// How a relay task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// The terminal event arrived and persistence was attempted.
    Completed,
    /// The upstream stream closed without a terminal event.
    Incomplete,
    /// The client went away; nothing was persisted.
    ClientDisconnected,
    /// Reading the upstream stream failed or timed out.
    UpstreamFailed,
}

impl RelayOutcome {
    fn phase(self) -> GenerationPhase {
        match self {
            Self::Completed => GenerationPhase::Finished,
            _ => GenerationPhase::Aborted,
        }
    }
}

/// A running relay: the body to hand to the client and the task driving it.
pub struct Relay {
    pub body: ReceiverStream<RelayItem>,
    pub task: JoinHandle<RelayOutcome>,
}

/// Start relaying `upstream` to a new response body.
///
/// `idle_timeout` bounds the silence between two upstream chunks; `None`
/// waits indefinitely.
pub fn spawn_relay(
    upstream: ByteStream,
    request: GenerationRequest,
    sink: Arc<dyn ReportSink>,
    idle_timeout: Option<Duration>,
) -> Relay {
    let (tx, rx) = mpsc::channel(RELAY_BUFFER);

    let span = tracing::info_span!(
        "relay",
        campaign = %request.campaign_name,
        conversation_id = request.conversation_id.as_deref().unwrap_or(""),
    );

    let task = tokio::spawn(
        async move {
            let outcome = run_relay(upstream, request, sink, idle_timeout, tx).await;
            tracing::debug!(?outcome, phase = %outcome.phase(), "Relay finished");
            outcome
        }
        .instrument(span),
    );

    Relay {
        body: ReceiverStream::new(rx),
        task,
    }
}

async fn run_relay(
    mut upstream: ByteStream,
    request: GenerationRequest,
    sink: Arc<dyn ReportSink>,
    idle_timeout: Option<Duration>,
    tx: mpsc::Sender<RelayItem>,
) -> RelayOutcome {
    let mut decoder = SseDecoder::new();
    let mut accumulator = ReportAccumulator::new(request.conversation_id.as_deref());

    loop {
        let next = tokio::select! {
            biased;
            () = tx.closed() => {
                tracing::debug!("Client disconnected, dropping upstream stream");
                return RelayOutcome::ClientDisconnected;
            }
            next = next_chunk(&mut upstream, idle_timeout) => next,
        };

        match next {
            Ok(Some(chunk)) => {
                let frames = decoder.push(&chunk);
                if tx.send(Ok(chunk)).await.is_err() {
                    tracing::debug!("Client disconnected, dropping upstream stream");
                    return RelayOutcome::ClientDisconnected;
                }
                for frame in frames {
                    handle_frame(frame, &mut accumulator, &request, sink.as_ref()).await;
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::error!(error = %e, "Upstream stream failed");
                let _ = tx.send(Err(e)).await;
                return RelayOutcome::UpstreamFailed;
            }
        }
    }

    if decoder.pending() > 0 {
        tracing::debug!(
            pending_bytes = decoder.pending(),
            "Upstream stream ended mid-frame, decoding the remainder",
        );
    }
    if let Some(frame) = decoder.finish() {
        handle_frame(frame, &mut accumulator, &request, sink.as_ref()).await;
    }

    if accumulator.is_finished() {
        RelayOutcome::Completed
    } else {
        tracing::warn!(
            received_chars = accumulator.text().chars().count(),
            "Upstream stream ended without a message_end event; report not saved",
        );
        RelayOutcome::Incomplete
    }
}

/// Await the next upstream chunk, bounded by the idle timeout.
async fn next_chunk(
    upstream: &mut ByteStream,
    idle_timeout: Option<Duration>,
) -> Result<Option<Bytes>, UpstreamError> {
    let next = match idle_timeout {
        Some(limit) => tokio::time::timeout(limit, upstream.next())
            .await
            .map_err(|_| UpstreamError::IdleTimeout(limit.as_secs()))?,
        None => upstream.next().await,
    };
    next.transpose()
}

async fn handle_frame(
    frame: Result<StreamEvent, FrameError>,
    accumulator: &mut ReportAccumulator,
    request: &GenerationRequest,
    sink: &dyn ReportSink,
) {
    let event = match frame {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(error = %e, "Skipping malformed stream frame");
            return;
        }
    };

    if let Some(completed) = accumulator.apply(event) {
        let conversation_id = completed.conversation_id.clone();
        match sink.persist(report_row(request, completed)).await {
            Ok(inserted) => tracing::info!(
                report_id = inserted.id,
                %conversation_id,
                "Generated report saved",
            ),
            Err(e) => tracing::error!(
                error = %e,
                %conversation_id,
                "Failed to save generated report",
            ),
        }
    }
}

/// Row written for a completed generation.
fn report_row(request: &GenerationRequest, completed: CompletedReport) -> CreateReport {
    CreateReport {
        title: request.report_title().to_string(),
        category: request.product_category.clone(),
        summary: request.report_summary(),
        content: completed.content,
        conversation_id: completed.conversation_id,
        kpi_target: request.kpi_target.clone(),
        campaign_name: request.campaign_name.clone(),
        product_category: request.product_category.clone(),
        current_metrics_img: request.image.as_ref().map(|f| f.upload_file_id.clone()),
        input_creative: request.video.as_ref().map(|f| f.upload_file_id.clone()),
        user_id: request.user_id,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use chrono::Utc;
    use futures::stream;
    use report_core::generation::{FileKind, GenerationDraft, UploadedFileRef};
    use report_db::models::report::InsertedReport;

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        saved: Mutex<Vec<CreateReport>>,
        fail: bool,
    }

    #[async_trait]
    impl ReportSink for RecordingSink {
        async fn persist(&self, report: CreateReport) -> Result<InsertedReport, sqlx::Error> {
            self.saved.lock().unwrap().push(report);
            if self.fail {
                return Err(sqlx::Error::PoolTimedOut);
            }
            Ok(InsertedReport {
                id: 1,
                created_at: Utc::now(),
            })
        }
    }

    fn request(conversation_id: Option<&str>) -> GenerationRequest {
        GenerationDraft {
            kpi_target: Some("10000".into()),
            campaign_name: Some("X".into()),
            product_category: Some("skincare".into()),
            conversation_id: conversation_id.map(str::to_string),
            user_id: Some(3),
            ..Default::default()
        }
        .build(Some(UploadedFileRef::local(FileKind::Image, "img1")), None)
        .unwrap()
    }

    fn upstream_of(chunks: &[&'static str]) -> ByteStream {
        let items: Vec<Result<Bytes, UpstreamError>> = chunks
            .iter()
            .map(|c| Ok(Bytes::from_static(c.as_bytes())))
            .collect();
        stream::iter(items).boxed()
    }

    async fn collect_body(mut body: ReceiverStream<RelayItem>) -> (Vec<u8>, Option<UpstreamError>) {
        let mut bytes = Vec::new();
        while let Some(item) = body.next().await {
            match item {
                Ok(chunk) => bytes.extend_from_slice(&chunk),
                Err(e) => return (bytes, Some(e)),
            }
        }
        (bytes, None)
    }

    const HELLO: &str = "data: {\"event\":\"message\",\"answer\":\"Hello \"}\n\n";
    const WORLD: &str = "data: {\"event\":\"message\",\"answer\":\"World\",\"conversation_id\":\"c1\"}\n\n";
    const END: &str = "data: {\"event\":\"message_end\",\"conversation_id\":\"c1\"}\n\n";

    #[tokio::test]
    async fn forwards_bytes_unchanged_and_persists_once() {
        let sink = Arc::new(RecordingSink::default());
        let relay = spawn_relay(
            upstream_of(&[HELLO, WORLD, END]),
            request(None),
            sink.clone(),
            None,
        );

        let (body, error) = collect_body(relay.body).await;
        assert!(error.is_none());
        assert_eq!(body, [HELLO, WORLD, END].concat().into_bytes());
        assert_eq!(relay.task.await.unwrap(), RelayOutcome::Completed);

        let saved = sink.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        let row = &saved[0];
        assert_eq!(row.content, "Hello World");
        assert_eq!(row.conversation_id, "c1");
        assert_eq!(row.title, "X");
        assert_eq!(row.category, "skincare");
        assert_eq!(row.summary, "KPI目標: 10000");
        assert_eq!(row.current_metrics_img.as_deref(), Some("img1"));
        assert_eq!(row.input_creative, None);
        assert_eq!(row.user_id, Some(3));
    }

    #[tokio::test]
    async fn frames_split_across_chunks_are_reassembled() {
        let sink = Arc::new(RecordingSink::default());
        let relay = spawn_relay(
            upstream_of(&[
                "data: {\"event\":\"mess",
                "age\",\"answer\":\"Hi\"}\n",
                "\ndata: {\"event\":\"message_end\"}\n\n",
            ]),
            request(Some("c0")),
            sink.clone(),
            None,
        );

        let (body, _) = collect_body(relay.body).await;
        assert_eq!(
            String::from_utf8(body).unwrap(),
            "data: {\"event\":\"message\",\"answer\":\"Hi\"}\n\ndata: {\"event\":\"message_end\"}\n\n"
        );
        assert_eq!(relay.task.await.unwrap(), RelayOutcome::Completed);

        let saved = sink.saved.lock().unwrap();
        assert_eq!(saved[0].content, "Hi");
        assert_eq!(saved[0].conversation_id, "c0");
    }

    #[tokio::test]
    async fn malformed_frame_is_forwarded_but_skipped() {
        let sink = Arc::new(RecordingSink::default());
        let relay = spawn_relay(
            upstream_of(&[HELLO, "data: {oops\n\n", END]),
            request(None),
            sink.clone(),
            None,
        );

        let (body, _) = collect_body(relay.body).await;
        assert!(String::from_utf8(body).unwrap().contains("{oops"));
        assert_eq!(relay.task.await.unwrap(), RelayOutcome::Completed);
        assert_eq!(sink.saved.lock().unwrap()[0].content, "Hello ");
    }

    #[tokio::test]
    async fn stream_without_terminal_event_is_not_persisted() {
        let sink = Arc::new(RecordingSink::default());
        let relay = spawn_relay(upstream_of(&[HELLO, WORLD]), request(None), sink.clone(), None);

        let (body, error) = collect_body(relay.body).await;
        assert!(error.is_none());
        assert_eq!(body, [HELLO, WORLD].concat().into_bytes());
        assert_eq!(relay.task.await.unwrap(), RelayOutcome::Incomplete);
        assert!(sink.saved.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn persistence_failure_does_not_disturb_the_stream() {
        let sink = Arc::new(RecordingSink {
            fail: true,
            ..Default::default()
        });
        let relay = spawn_relay(upstream_of(&[HELLO, END]), request(None), sink.clone(), None);

        let (body, error) = collect_body(relay.body).await;
        assert!(error.is_none());
        assert_eq!(body, [HELLO, END].concat().into_bytes());
        assert_eq!(relay.task.await.unwrap(), RelayOutcome::Completed);
        assert_eq!(sink.saved.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn upstream_error_aborts_the_body() {
        let sink = Arc::new(RecordingSink::default());
        let items: Vec<Result<Bytes, UpstreamError>> = vec![
            Ok(Bytes::from_static(HELLO.as_bytes())),
            Err(UpstreamError::IdleTimeout(1)),
        ];
        let relay = spawn_relay(stream::iter(items).boxed(), request(None), sink.clone(), None);

        let (body, error) = collect_body(relay.body).await;
        assert_eq!(body, HELLO.as_bytes());
        assert_matches!(error, Some(UpstreamError::IdleTimeout(1)));
        assert_eq!(relay.task.await.unwrap(), RelayOutcome::UpstreamFailed);
        assert!(sink.saved.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn silent_upstream_hits_idle_timeout() {
        let sink = Arc::new(RecordingSink::default());
        let relay = spawn_relay(
            stream::pending::<RelayItem>().boxed(),
            request(None),
            sink.clone(),
            Some(Duration::from_secs(5)),
        );

        let (body, error) = collect_body(relay.body).await;
        assert!(body.is_empty());
        assert_matches!(error, Some(UpstreamError::IdleTimeout(5)));
        assert_eq!(relay.task.await.unwrap(), RelayOutcome::UpstreamFailed);
    }

    #[tokio::test]
    async fn client_disconnect_stops_reading_upstream() {
        let (upstream_tx, upstream_rx) = mpsc::channel::<Result<Bytes, UpstreamError>>(1);
        let sink = Arc::new(RecordingSink::default());
        let relay = spawn_relay(
            ReceiverStream::new(upstream_rx).boxed(),
            request(None),
            sink.clone(),
            None,
        );

        upstream_tx
            .send(Ok(Bytes::from_static(HELLO.as_bytes())))
            .await
            .unwrap();

        let mut body = relay.body;
        let first = body.next().await.unwrap().unwrap();
        assert_eq!(first, HELLO.as_bytes());

        // Client goes away mid-stream.
        drop(body);

        assert_eq!(relay.task.await.unwrap(), RelayOutcome::ClientDisconnected);
        // The relay dropped its end of the upstream stream.
        assert!(upstream_tx.is_closed());
        assert!(sink.saved.lock().unwrap().is_empty());
    }
}
