use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::{debug, error, trace, warn};

use crate::config::VisitsConfig;
use crate::visits::VisitSink;

/// 尚未写回存储的访问计数
struct PendingVisits {
    counts: DashMap<Arc<str>, u64>,
    total: AtomicU64,
    flush_lock: Mutex<()>,
    flush_scheduled: AtomicBool,
}

impl PendingVisits {
    fn new() -> Self {
        Self {
            counts: DashMap::new(),
            total: AtomicU64::new(0),
            flush_lock: Mutex::new(()),
            flush_scheduled: AtomicBool::new(false),
        }
    }

    /// 记一次访问，返回缓冲区中的总访问数
    fn add(&self, code: &str) -> u64 {
        // 热点短码走 get_mut，避免每次都分配 Arc
        match self.counts.get_mut(code) {
            Some(mut count) => *count += 1,
            None => {
                *self.counts.entry(Arc::from(code)).or_insert(0) += 1;
            }
        }
        self.total.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// 取出当前快照；快照之后新增的计数留在缓冲区
    fn take(&self) -> Vec<(String, u64)> {
        let codes: Vec<Arc<str>> = self.counts.iter().map(|e| e.key().clone()).collect();

        let mut batch = Vec::with_capacity(codes.len());
        let mut taken = 0u64;
        for code in codes {
            if let Some((code, count)) = self.counts.remove(&code) {
                taken += count;
                batch.push((code.to_string(), count));
            }
        }

        if taken > 0 {
            let _ = self
                .total
                .fetch_update(Ordering::AcqRel, Ordering::Relaxed, |current| {
                    Some(current.saturating_sub(taken))
                });
        }
        batch
    }

    fn put_back(&self, batch: Vec<(String, u64)>) {
        let mut restored = 0u64;
        for (code, count) in batch {
            *self.counts.entry(Arc::from(code.as_str())).or_insert(0) += count;
            restored += count;
        }
        self.total.fetch_add(restored, Ordering::Relaxed);
    }

    fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

/// 访问计数器
///
/// `record` 不触碰存储，只累加内存计数。缓冲的访问数达到阈值时后台触发一次
/// 刷盘，另外由 [`VisitRecorder::start_background_task`] 定期刷盘。刷盘失败且
/// 存储确认未写入时，这批计数放回缓冲区等下一轮；结果未知时丢弃并记错误日志，
/// 宁可少计也不重复计数。
#[derive(Clone)]
pub struct VisitRecorder {
    pending: Arc<PendingVisits>,
    sink: Arc<dyn VisitSink>,
    flush_interval: Duration,
    flush_threshold: u64,
}

impl VisitRecorder {
    pub fn new(sink: Arc<dyn VisitSink>, flush_interval: Duration, flush_threshold: u64) -> Self {
        Self {
            pending: Arc::new(PendingVisits::new()),
            sink,
            flush_interval,
            flush_threshold: flush_threshold.max(1),
        }
    }

    pub fn from_config(sink: Arc<dyn VisitSink>, config: &VisitsConfig) -> Self {
        Self::new(
            sink,
            Duration::from_secs(config.flush_interval_secs.max(1)),
            config.max_visits_before_flush as u64,
        )
    }

    /// 记录一次访问
    pub fn record(&self, code: &str) {
        let buffered = self.pending.add(code);
        trace!("VisitRecorder: {} visits buffered", buffered);

        if buffered >= self.flush_threshold
            && self
                .pending
                .flush_scheduled
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
        {
            let pending = Arc::clone(&self.pending);
            let sink = Arc::clone(&self.sink);
            tokio::spawn(async move {
                match pending.flush_lock.try_lock() {
                    Ok(_guard) => Self::flush_pending(&pending, sink.as_ref()).await,
                    Err(_) => trace!("VisitRecorder: flush in progress, skip threshold flush"),
                }
                pending.flush_scheduled.store(false, Ordering::Release);
            });
        }
    }

    /// 定时刷盘循环，随服务器生命周期运行
    pub async fn start_background_task(&self) {
        loop {
            sleep(self.flush_interval).await;

            match self.pending.flush_lock.try_lock() {
                Ok(_guard) => {
                    trace!("VisitRecorder: scheduled flush");
                    Self::flush_pending(&self.pending, self.sink.as_ref()).await;
                }
                Err(_) => trace!("VisitRecorder: flush in progress, skip scheduled flush"),
            }
        }
    }

    /// 等待进行中的刷盘结束后立即刷盘（关停时调用）
    pub async fn flush(&self) {
        let _guard = self.pending.flush_lock.lock().await;
        Self::flush_pending(&self.pending, self.sink.as_ref()).await;
    }

    /// 缓冲区中尚未写回的访问数
    pub fn buffered(&self) -> u64 {
        self.pending.total()
    }

    async fn flush_pending(pending: &PendingVisits, sink: &dyn VisitSink) {
        let batch = pending.take();
        if batch.is_empty() {
            return;
        }

        let codes = batch.len();
        let visits: u64 = batch.iter().map(|(_, n)| n).sum();

        match sink.flush_visits(batch.clone()).await {
            Ok(()) => debug!("VisitRecorder: flushed {} visits for {} codes", visits, codes),
            Err(e) if e.is_safe_to_retry() => {
                pending.put_back(batch);
                warn!("VisitRecorder: {}; {} visits kept for next flush", e, visits);
            }
            Err(e) => error!("VisitRecorder: {}; dropping {} visits", e, visits),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visits::VisitFlushError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct MockSink {
        stored: std::sync::Mutex<HashMap<String, u64>>,
    }

    impl MockSink {
        fn visits(&self, code: &str) -> u64 {
            self.stored.lock().unwrap().get(code).copied().unwrap_or(0)
        }

        fn total(&self) -> u64 {
            self.stored.lock().unwrap().values().sum()
        }
    }

    #[async_trait]
    impl VisitSink for MockSink {
        async fn flush_visits(&self, updates: Vec<(String, u64)>) -> Result<(), VisitFlushError> {
            let mut stored = self.stored.lock().unwrap();
            for (code, n) in updates {
                *stored.entry(code).or_insert(0) += n;
            }
            Ok(())
        }
    }

    /// 前 `failures` 次刷盘返回给定错误，之后写入成功
    struct FailingSink {
        failures: AtomicUsize,
        error: VisitFlushError,
        inner: MockSink,
    }

    #[async_trait]
    impl VisitSink for FailingSink {
        async fn flush_visits(&self, updates: Vec<(String, u64)>) -> Result<(), VisitFlushError> {
            if self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(self.error.clone());
            }
            self.inner.flush_visits(updates).await
        }
    }

    fn recorder(sink: Arc<dyn VisitSink>) -> VisitRecorder {
        VisitRecorder::new(sink, Duration::from_secs(3600), 1_000_000)
    }

    #[tokio::test]
    async fn test_record_then_flush() {
        let sink = Arc::new(MockSink::default());
        let recorder = recorder(sink.clone());

        recorder.record("a");
        recorder.record("a");
        recorder.record("b");
        assert_eq!(recorder.buffered(), 3);

        recorder.flush().await;

        assert_eq!(recorder.buffered(), 0);
        assert_eq!(sink.visits("a"), 2);
        assert_eq!(sink.visits("b"), 1);
    }

    #[tokio::test]
    async fn test_flush_with_nothing_buffered_is_noop() {
        let sink = Arc::new(MockSink::default());
        let recorder = recorder(sink.clone());
        recorder.flush().await;
        assert_eq!(sink.total(), 0);
    }

    #[tokio::test]
    async fn test_not_applied_batch_is_kept() {
        let sink = Arc::new(FailingSink {
            failures: AtomicUsize::new(1),
            error: VisitFlushError::NotApplied("database is locked".to_string()),
            inner: MockSink::default(),
        });
        let recorder = recorder(sink.clone());

        recorder.record("a");
        recorder.record("a");
        recorder.flush().await;
        assert_eq!(recorder.buffered(), 2);
        assert_eq!(sink.inner.total(), 0);

        recorder.record("a");
        recorder.flush().await;
        assert_eq!(recorder.buffered(), 0);
        assert_eq!(sink.inner.visits("a"), 3);
    }

    #[tokio::test]
    async fn test_indeterminate_batch_is_dropped() {
        let sink = Arc::new(FailingSink {
            failures: AtomicUsize::new(1),
            error: VisitFlushError::Indeterminate("timed out".to_string()),
            inner: MockSink::default(),
        });
        let recorder = recorder(sink.clone());

        recorder.record("a");
        recorder.flush().await;
        assert_eq!(recorder.buffered(), 0);

        recorder.flush().await;
        assert_eq!(sink.inner.total(), 0);
    }

    #[tokio::test]
    async fn test_threshold_triggers_flush() {
        let sink = Arc::new(MockSink::default());
        let recorder = VisitRecorder::new(sink.clone(), Duration::from_secs(3600), 5);

        for _ in 0..5 {
            recorder.record("hot");
        }

        for _ in 0..50 {
            if sink.visits("hot") == 5 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(sink.visits("hot"), 5);
    }

    #[tokio::test]
    async fn test_concurrent_records_with_flushes_lose_nothing() {
        let sink = Arc::new(MockSink::default());
        let recorder = Arc::new(recorder(sink.clone()));

        const TASKS: u64 = 8;
        const PER_TASK: u64 = 500;

        let mut handles = Vec::new();
        for _ in 0..TASKS {
            let r = Arc::clone(&recorder);
            handles.push(tokio::spawn(async move {
                for i in 0..PER_TASK {
                    r.record("shared");
                    if i % 64 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            }));
        }

        let flusher = {
            let r = Arc::clone(&recorder);
            tokio::spawn(async move {
                for _ in 0..5 {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    r.flush().await;
                }
            })
        };

        for handle in handles {
            handle.await.unwrap();
        }
        flusher.await.unwrap();
        recorder.flush().await;

        assert_eq!(sink.visits("shared") + recorder.buffered(), TASKS * PER_TASK);
        assert_eq!(recorder.buffered(), 0);
    }
}
