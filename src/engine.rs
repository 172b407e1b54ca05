// src/engine.rs
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use crate::drivers::{FrameSource, ScopePipeline};
use crate::tick::TickSource;
use crate::types::*;
use crate::view::ScopeSnapshot;
/// Commands handled per loop turn, so a flood of UI commands cannot starve ingestion.
const MAX_COMMANDS_PER_TURN: usize = 10;
const IDLE_SLEEP: Duration = Duration::from_millis(2);
/// Runs the pipeline on its own thread. Snapshots go out on `tx` whenever `ticker` is due;
/// the loop ends on `ScopeCommand::Shutdown`, when `rx_cmd` disconnects, or when nobody
/// listens on `tx` any more.
pub fn spawn_engine<S, T>(
    mut pipeline: ScopePipeline<S>,
    mut ticker: T,
    tx: Sender<ScopeMessage>,
    rx_cmd: Receiver<ScopeCommand>,
) -> JoinHandle<()>
where
    S: FrameSource + Send + 'static,
    T: TickSource + Send + 'static,
{
    thread::spawn(move || {
        log::info!(
            "scope engine started: {} channels at {} Hz",
            pipeline.ingest().channel_count(),
            pipeline.ingest().config().sample_rate_hz
        );
        loop {
            // 1. 处理命令
            let mut shutdown = false;
            for _ in 0..MAX_COMMANDS_PER_TURN {
                match rx_cmd.try_recv() {
                    Ok(ScopeCommand::Shutdown) | Err(TryRecvError::Disconnected) => {
                        shutdown = true;
                        break;
                    }
                    Ok(cmd) => {
                        if let Some(reply) = apply_command(&mut pipeline, cmd) {
                            tx.send(reply).ok();
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                }
            }
            // 2. 拉取数据
            let ingested = match pipeline.pump_once() {
                Ok(n) => n,
                Err(err) => {
                    log::warn!("frame source failed: {err}");
                    if tx.send(ScopeMessage::SourceFailed(err.to_string())).is_err() {
                        break;
                    }
                    0
                }
            };
            if shutdown {
                // last picture of whatever was already ingested
                publish(&pipeline, &tx).ok();
                break;
            }
            // 3. 发布快照
            let ticked = ticker.poll(Instant::now());
            if ticked && publish(&pipeline, &tx).is_err() {
                log::info!("snapshot receiver gone, stopping engine");
                break;
            }
            if ingested == 0 && !ticked {
                thread::sleep(IDLE_SLEEP);
            }
        }
        log::info!("scope engine stopped: {:?}", pipeline.ingest().stats());
        tx.send(ScopeMessage::Stopped).ok();
    })
}
fn apply_command<S: FrameSource>(
    pipeline: &mut ScopePipeline<S>,
    cmd: ScopeCommand,
) -> Option<ScopeMessage> {
    let ingest = pipeline.ingest_mut();
    let result = match cmd {
        ScopeCommand::SetFilter {
            channel,
            purpose,
            params,
        } => {
            if let Err(err) = ingest.set_filter(channel, purpose, params) {
                return Some(ScopeMessage::FilterRejected {
                    channel,
                    purpose,
                    reason: err.to_string(),
                });
            }
            Ok(())
        }
        ScopeCommand::BypassFilter { channel, purpose } => ingest.bypass_filter(channel, purpose),
        ScopeCommand::ResetChannel(channel) => ingest.reset_channel(channel),
        ScopeCommand::Restart => {
            ingest.restart_stream();
            Ok(())
        }
        ScopeCommand::Shutdown => Ok(()),
    };
    if let Err(err) = result {
        log::warn!("ignoring command: {err}");
    }
    None
}
fn publish<S: FrameSource>(
    pipeline: &ScopePipeline<S>,
    tx: &Sender<ScopeMessage>,
) -> Result<(), ()> {
    match pipeline.snapshot() {
        Ok(snapshot) => {
            log::trace!("publishing snapshot at {:?}", snapshot.latest_time);
            tx.send(ScopeMessage::Snapshot(Arc::new(snapshot)))
                .map_err(|_| ())
        }
        Err(err) => {
            // a bad plan is not fatal; keep ingesting
            log::warn!("snapshot failed: {err}");
            Ok(())
        }
    }
}
/// Drains every pending message and returns the newest snapshot, if any arrived.
/// Other messages are logged and discarded; use [`drain_messages`] to keep them.
pub fn latest_snapshot(rx: &Receiver<ScopeMessage>) -> Option<Arc<ScopeSnapshot>> {
    let (latest, events) = drain_messages(rx);
    for event in events {
        log::debug!("discarding engine message {event:?}");
    }
    latest
}
/// Like [`latest_snapshot`] but hands back the non-snapshot messages in arrival order.
pub fn drain_messages(
    rx: &Receiver<ScopeMessage>,
) -> (Option<Arc<ScopeSnapshot>>, Vec<ScopeMessage>) {
    let mut latest = None;
    let mut events = Vec::new();
    while let Ok(msg) = rx.try_recv() {
        match msg {
            ScopeMessage::Snapshot(snapshot) => latest = Some(snapshot),
            other => events.push(other),
        }
    }
    (latest, events)
}
