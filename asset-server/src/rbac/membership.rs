//! Role Membership Aggregator
//!
//! 每个角色的 `user_count` 是派生数据：全量扫描用户存储后重新计算。
//! 管理员计入 1 号角色，未分配角色的用户不计入任何角色。
//!
//! 身份变更通过 [`MembershipNotifier`] 通知后台 [`MembershipWorker`]，
//! 积压的多个事件合并为一次重算。

use std::collections::HashMap;
use std::sync::Arc;

use shared::models::{IdentityState, RoleId, UserId, UserRecord};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use crate::rbac::RoleCatalog;
use crate::rbac::seed::ADMINISTRATOR_ROLE_ID;
use crate::store::{StoreResult, UserStore};

/// Identity change that may shift role membership
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityEvent {
    Created(UserId),
    Updated(UserId),
    Deleted(UserId),
}

/// Count users per role
pub fn tally_user_counts(users: &[UserRecord]) -> HashMap<RoleId, u32> {
    let mut counts = HashMap::new();
    for user in users {
        let role_id = match user.identity().state() {
            IdentityState::Admin => ADMINISTRATOR_ROLE_ID,
            IdentityState::RoleAssigned(id) => id,
            IdentityState::Unassigned => continue,
        };
        *counts.entry(role_id).or_insert(0) += 1;
    }
    counts
}

#[derive(Debug, Clone)]
pub struct MembershipAggregator {
    store: Arc<dyn UserStore>,
    catalog: Arc<RoleCatalog>,
    /// 同一时刻只有一次重算，读取和写回之间不会被较早的扫描覆盖
    rescan: Arc<Mutex<()>>,
}

impl MembershipAggregator {
    pub fn new(store: Arc<dyn UserStore>, catalog: Arc<RoleCatalog>) -> Self {
        Self {
            store,
            catalog,
            rescan: Arc::new(Mutex::new(())),
        }
    }

    /// Full rescan; idempotent
    pub async fn recompute_user_counts(&self) -> StoreResult<HashMap<RoleId, u32>> {
        let _guard = self.rescan.lock().await;
        let users = self.store.list_users().await?;
        let counts = tally_user_counts(&users);
        self.catalog.apply_user_counts(&counts);
        tracing::debug!(users = users.len(), roles = counts.len(), "Role user counts recomputed");
        Ok(counts)
    }
}

/// Sender side handed to every identity-mutating path
#[derive(Debug, Clone)]
pub struct MembershipNotifier {
    tx: mpsc::Sender<IdentityEvent>,
}

impl MembershipNotifier {
    pub fn channel(buffer_size: usize) -> (Self, mpsc::Receiver<IdentityEvent>) {
        let (tx, rx) = mpsc::channel(buffer_size.max(1));
        (Self { tx }, rx)
    }

    pub fn notify(&self, event: IdentityEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            // a full queue already guarantees a pending rescan
            Err(TrySendError::Full(event)) => {
                tracing::debug!(?event, "Membership queue full, event coalesced");
            }
            Err(TrySendError::Closed(event)) => {
                tracing::warn!(?event, "Membership worker stopped, event dropped");
            }
        }
    }
}

pub struct MembershipWorker {
    aggregator: MembershipAggregator,
}

impl MembershipWorker {
    pub fn new(aggregator: MembershipAggregator) -> Self {
        Self { aggregator }
    }

    /// 运行 worker（直到通道关闭或取消）
    pub async fn run(self, mut rx: mpsc::Receiver<IdentityEvent>, shutdown: CancellationToken) {
        tracing::info!("👥 Membership worker started");

        loop {
            let event = tokio::select! {
                _ = shutdown.cancelled() => break,
                event = rx.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            let mut coalesced = 1usize;
            while rx.try_recv().is_ok() {
                coalesced += 1;
            }

            match self.aggregator.recompute_user_counts().await {
                Ok(_) => tracing::debug!(?event, coalesced, "Membership refreshed"),
                Err(e) => tracing::warn!(error = %e, "Membership refresh failed"),
            }
        }

        tracing::info!("Membership worker stopping");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rbac::seed::{ASSET_MANAGER_ROLE_ID, READ_ONLY_ROLE_ID};
    use crate::store::MemoryUserStore;
    use async_trait::async_trait;
    use shared::models::{UserIdentity, UserPatch};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    fn user(id: UserId, is_admin: bool, role_id: Option<RoleId>) -> UserRecord {
        UserRecord {
            id,
            username: format!("user{id}"),
            is_admin,
            role_id,
        }
    }

    fn count_of(catalog: &RoleCatalog, id: RoleId) -> u32 {
        catalog.get_role_by_id(id).unwrap().user_count
    }

    #[test]
    fn test_tally_counts_admins_under_administrator() {
        let counts = tally_user_counts(&[
            user(1, true, None),
            // inconsistent legacy row counts once, as an admin
            user(2, true, Some(READ_ONLY_ROLE_ID)),
            user(3, false, Some(READ_ONLY_ROLE_ID)),
            user(4, false, None),
        ]);
        assert_eq!(counts.get(&ADMINISTRATOR_ROLE_ID), Some(&2));
        assert_eq!(counts.get(&READ_ONLY_ROLE_ID), Some(&1));
        assert_eq!(counts.values().sum::<u32>(), 3);
    }

    #[tokio::test]
    async fn test_recompute_is_idempotent() {
        let store = Arc::new(MemoryUserStore::with_users(vec![
            user(1, true, None),
            user(2, false, Some(ASSET_MANAGER_ROLE_ID)),
            user(3, false, Some(ASSET_MANAGER_ROLE_ID)),
        ]));
        let catalog = Arc::new(RoleCatalog::with_seed_roles());
        let aggregator = MembershipAggregator::new(store, catalog.clone());

        let first = aggregator.recompute_user_counts().await.unwrap();
        let before = catalog.get_roles();
        let second = aggregator.recompute_user_counts().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(before, catalog.get_roles());
        assert_eq!(count_of(&catalog, ADMINISTRATOR_ROLE_ID), 1);
        assert_eq!(count_of(&catalog, ASSET_MANAGER_ROLE_ID), 2);
        assert_eq!(count_of(&catalog, READ_ONLY_ROLE_ID), 0);
    }

    /// Store whose first listing is held until released
    #[derive(Debug)]
    struct HeldListingStore {
        inner: MemoryUserStore,
        calls: AtomicUsize,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl UserStore for HeldListingStore {
        async fn get_user(&self, id: UserId) -> StoreResult<Option<UserRecord>> {
            self.inner.get_user(id).await
        }

        async fn list_users(&self) -> StoreResult<Vec<UserRecord>> {
            let snapshot = self.inner.list_users().await?;
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                self.entered.notify_one();
                self.release.notified().await;
            }
            Ok(snapshot)
        }

        async fn create_user(
            &self,
            username: String,
            identity: UserIdentity,
        ) -> StoreResult<UserRecord> {
            self.inner.create_user(username, identity).await
        }

        async fn update_user(&self, id: UserId, patch: UserPatch) -> StoreResult<Option<UserRecord>> {
            self.inner.update_user(id, patch).await
        }

        async fn delete_user(&self, id: UserId) -> StoreResult<bool> {
            self.inner.delete_user(id).await
        }
    }

    #[tokio::test]
    async fn test_older_rescan_never_overwrites_newer_counts() {
        let store = Arc::new(HeldListingStore {
            inner: MemoryUserStore::with_users(vec![user(2, false, Some(READ_ONLY_ROLE_ID))]),
            calls: AtomicUsize::new(0),
            entered: Notify::new(),
            release: Notify::new(),
        });
        let catalog = Arc::new(RoleCatalog::with_seed_roles());
        let aggregator = MembershipAggregator::new(store.clone(), catalog.clone());

        // first rescan reads the old identity, then stalls
        let first = tokio::spawn({
            let aggregator = aggregator.clone();
            async move { aggregator.recompute_user_counts().await }
        });
        store.entered.notified().await;

        store
            .update_user(
                2,
                UserPatch {
                    identity: Some(UserIdentity::admin()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let second = tokio::spawn({
            let aggregator = aggregator.clone();
            async move { aggregator.recompute_user_counts().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;

        store.release.notify_one();
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        assert_eq!(count_of(&catalog, ADMINISTRATOR_ROLE_ID), 1);
        assert_eq!(count_of(&catalog, READ_ONLY_ROLE_ID), 0);
    }

    #[tokio::test]
    async fn test_worker_refreshes_after_events() {
        let store = Arc::new(MemoryUserStore::with_users(vec![user(
            2,
            false,
            Some(READ_ONLY_ROLE_ID),
        )]));
        let catalog = Arc::new(RoleCatalog::with_seed_roles());
        let aggregator = MembershipAggregator::new(store.clone(), catalog.clone());
        let (notifier, rx) = MembershipNotifier::channel(8);
        let token = CancellationToken::new();
        let handle = tokio::spawn(MembershipWorker::new(aggregator).run(rx, token.clone()));

        store
            .update_user(
                2,
                UserPatch {
                    identity: Some(UserIdentity::admin()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        notifier.notify(IdentityEvent::Updated(2));
        // closing the channel lets the worker finish after the last rescan
        drop(notifier);
        handle.await.unwrap();

        assert_eq!(count_of(&catalog, ADMINISTRATOR_ROLE_ID), 1);
        assert_eq!(count_of(&catalog, READ_ONLY_ROLE_ID), 0);
        token.cancel();
    }
}
