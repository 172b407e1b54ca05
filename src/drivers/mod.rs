// src/drivers/mod.rs
// 声明同级目录下的子模块文件
pub mod error;
pub mod frame;
pub mod ingest;
pub mod pipeline;
pub mod plot;
pub mod source;
// 公开导出这些模块里的结构体，方便外部调用
pub use error::ScopeError;
pub use frame::{decode_str, decode_value, DecodedPayload, Frame};
pub use ingest::{SnapshotPlan, StreamIngest};
pub use pipeline::{FrameQueue, ScopePipeline, MAX_BATCHES_PER_PUMP};
pub use plot::{render_overlay_png, render_spectrum_png, render_sweep_png, PlotStyle};
pub use source::{FrameSource, ManualSource, SimulatedSource};
