//! 活动日志后台 Worker
//!
//! 从 mpsc 通道消费 ActivityEntry，写入内存日志并输出到 `activity` 日志目标。
//! 通道关闭或收到 shutdown 信号时退出。

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::storage::ActivityStorage;
use super::types::ActivityEntry;

pub struct ActivityWorker {
    storage: Arc<ActivityStorage>,
}

impl ActivityWorker {
    pub fn new(storage: Arc<ActivityStorage>) -> Self {
        Self { storage }
    }

    fn record(&self, entry: ActivityEntry) {
        tracing::info!(
            target: "activity",
            action = %entry.action,
            item_type = %entry.item_type,
            item_id = entry.item_id,
            user_id = ?entry.user_id,
            notes = %entry.notes,
            "Activity recorded"
        );
        self.storage.append(entry);
    }

    /// 运行 worker（直到通道关闭或取消）
    pub async fn run(self, mut rx: mpsc::Receiver<ActivityEntry>, shutdown: CancellationToken) {
        tracing::info!("📋 Activity log worker started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    // drain what was already queued
                    while let Ok(entry) = rx.try_recv() {
                        self.record(entry);
                    }
                    break;
                }
                entry = rx.recv() => match entry {
                    Some(entry) => self.record(entry),
                    None => break,
                },
            }
        }

        tracing::info!("Activity log worker stopping");
    }
}
