//! 活动日志服务
//!
//! 调用方只负责把条目投递到通道，写入由 [`ActivityWorker`](super::ActivityWorker)
//! 在后台完成。投递失败只记录日志，不影响业务请求。

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::types::ActivityEntry;

#[derive(Debug)]
pub struct ActivityService {
    tx: mpsc::Sender<ActivityEntry>,
}

impl ActivityService {
    pub fn new(buffer_size: usize) -> (Arc<Self>, mpsc::Receiver<ActivityEntry>) {
        let (tx, rx) = mpsc::channel(buffer_size.max(1));
        (Arc::new(Self { tx }), rx)
    }

    /// Fire-and-forget
    pub fn log(&self, entry: ActivityEntry) {
        match self.tx.try_send(entry) {
            Ok(()) => {}
            Err(TrySendError::Full(entry)) => {
                tracing::warn!(
                    action = %entry.action,
                    item_id = entry.item_id,
                    "Activity channel full, entry dropped"
                );
            }
            Err(TrySendError::Closed(entry)) => {
                tracing::warn!(
                    action = %entry.action,
                    item_id = entry.item_id,
                    "Activity worker stopped, entry dropped"
                );
            }
        }
    }
}
