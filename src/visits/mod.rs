//! 访问计数
//!
//! 重定向路径只把访问记在内存里，由 [`VisitRecorder`] 批量写回存储。

pub mod recorder;
pub mod sink;

pub use recorder::VisitRecorder;
pub use sink::{VisitFlushError, VisitSink};
