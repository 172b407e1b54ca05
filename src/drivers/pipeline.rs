use std::collections::VecDeque;
use crate::config::ScopeConfig;
use crate::drivers::frame::Frame;
use crate::drivers::ingest::{SnapshotPlan, StreamIngest};
use crate::drivers::source::FrameSource;
use crate::drivers::ScopeError;
use crate::view::ScopeSnapshot;
/// Upper bound on source polls per pump, so a free-running source cannot stall the caller.
pub const MAX_BATCHES_PER_PUMP: usize = 256;
/// Bounded backlog of not-yet-ingested frames. When full, the oldest frame is evicted.
/// The pipeline drains it after every pulled batch, so only a burst larger than the
/// capacity loses frames.
pub struct FrameQueue {
    frames: VecDeque<Frame>,
    capacity: usize,
}
impl FrameQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
        }
    }
    /// Enqueues `frames`, returning how many older frames were evicted to make room.
    pub fn extend(&mut self, frames: impl IntoIterator<Item = Frame>) -> usize {
        let mut evicted = 0;
        for frame in frames {
            if self.frames.len() == self.capacity {
                self.frames.pop_front();
                evicted += 1;
            }
            self.frames.push_back(frame);
        }
        evicted
    }
    pub fn drain(&mut self) -> impl Iterator<Item = Frame> + '_ {
        self.frames.drain(..)
    }
    pub fn len(&self) -> usize {
        self.frames.len()
    }
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
/// High level pipeline that pulls batches from a source and exposes ready-to-render snapshots.
pub struct ScopePipeline<S: FrameSource> {
    source: S,
    queue: FrameQueue,
    ingest: StreamIngest,
    plan: SnapshotPlan,
}
impl<S: FrameSource> ScopePipeline<S> {
    pub fn new(source: S, config: ScopeConfig) -> Result<Self, ScopeError> {
        let queue = FrameQueue::new(config.frame_queue_capacity);
        let plan = SnapshotPlan::from_config(&config);
        let ingest = StreamIngest::new(config)?;
        Ok(Self {
            source,
            queue,
            ingest,
            plan,
        })
    }
    /// Pulls what the source has right now, ingesting each batch before asking for the next.
    /// Returns the number of frames ingested.
    pub fn pump_once(&mut self) -> Result<usize, ScopeError> {
        let mut ingested = 0;
        for _ in 0..MAX_BATCHES_PER_PUMP {
            let Some(batch) = self.source.next_batch()? else {
                break;
            };
            let evicted = self.queue.extend(batch);
            if evicted > 0 {
                log::warn!("ingest backlog full: dropped {evicted} oldest frames");
                self.ingest.record_backlog_drops(evicted);
            }
            for frame in self.queue.drain() {
                if self.ingest.ingest_frame(&frame) {
                    ingested += 1;
                }
            }
        }
        Ok(ingested)
    }
    pub fn snapshot(&self) -> Result<ScopeSnapshot, ScopeError> {
        self.ingest.snapshot(&self.plan)
    }
    pub fn set_plan(&mut self, plan: SnapshotPlan) {
        self.plan = plan;
    }
    pub fn plan(&self) -> &SnapshotPlan {
        &self.plan
    }
    pub fn ingest(&self) -> &StreamIngest {
        &self.ingest
    }
    pub fn ingest_mut(&mut self) -> &mut StreamIngest {
        &mut self.ingest
    }
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}
