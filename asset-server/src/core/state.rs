use std::path::Path;
use std::sync::Arc;

use shared::models::{RoleRecord, UserRecord};

use crate::activity::{ActivityService, ActivityStorage, ActivityWorker};
use crate::auth::JwtService;
use crate::core::{BackgroundTasks, Config, Result, TaskKind};
use crate::rbac::{
    Authorizer, IdentityService, MembershipAggregator, MembershipNotifier, MembershipWorker,
    PROTECTED_USER_ID, RoleCatalog,
};
use crate::store::{MemoryUserStore, UserStore};

/// 服务器状态 - 持有所有服务的共享引用
///
/// 使用 Arc 实现浅拷贝，所有权成本极低。
///
/// | 字段 | 说明 |
/// |------|------|
/// | config | 配置项 (不可变) |
/// | jwt_service | JWT 认证服务 |
/// | users | 用户存储 |
/// | catalog | 角色表 |
/// | authorizer | 权限决策 |
/// | membership | 角色用户数统计 |
/// | identity | 用户身份变更 |
/// | activity / activity_log | 活动日志投递 / 内存日志 |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub jwt_service: Arc<JwtService>,
    pub users: Arc<dyn UserStore>,
    pub catalog: Arc<RoleCatalog>,
    pub authorizer: Authorizer,
    pub membership: MembershipAggregator,
    pub identity: IdentityService,
    pub activity: Arc<ActivityService>,
    pub activity_log: Arc<ActivityStorage>,
}

impl ServerState {
    /// 创建服务器状态并启动后台任务
    ///
    /// 必须在 tokio 运行时内调用。返回的 [`BackgroundTasks`] 由调用方负责关闭。
    pub fn new(
        config: Config,
        users: Arc<dyn UserStore>,
        catalog: Arc<RoleCatalog>,
    ) -> (Self, BackgroundTasks) {
        let mut tasks = BackgroundTasks::new();
        let shutdown = tasks.shutdown_token();

        let (activity, activity_rx) = ActivityService::new(config.activity_buffer);
        let activity_log = Arc::new(ActivityStorage::new(config.activity_retention));
        tasks.spawn(
            "activity_worker",
            TaskKind::Worker,
            ActivityWorker::new(activity_log.clone()).run(activity_rx, shutdown.clone()),
        );

        let membership = MembershipAggregator::new(users.clone(), catalog.clone());
        let (notifier, identity_rx) = MembershipNotifier::channel(config.identity_event_buffer);
        tasks.spawn(
            "membership_worker",
            TaskKind::Listener,
            MembershipWorker::new(membership.clone()).run(identity_rx, shutdown),
        );

        let state = Self {
            jwt_service: Arc::new(JwtService::with_config(config.jwt.clone())),
            authorizer: Authorizer::new(users.clone(), catalog.clone()),
            identity: IdentityService::new(
                users.clone(),
                catalog.clone(),
                notifier,
                activity.clone(),
            ),
            config,
            users,
            catalog,
            membership,
            activity,
            activity_log,
        };

        (state, tasks)
    }

    /// 初始化服务器状态
    ///
    /// 按顺序：
    /// 1. 角色表 (ROLES_FILE 或内置角色)
    /// 2. 用户存储 (USERS_FILE 或仅 1 号管理员)
    /// 3. 后台任务
    /// 4. 首次统计角色用户数
    pub async fn initialize(config: &Config) -> Result<(Self, BackgroundTasks)> {
        let catalog = Arc::new(load_catalog(config.roles_file.as_deref())?);
        let users: Arc<dyn UserStore> = Arc::new(load_users(config.users_file.as_deref())?);

        let (state, tasks) = Self::new(config.clone(), users, catalog);
        state.membership.recompute_user_counts().await?;

        tracing::info!(roles = state.catalog.len(), "Server state initialized");
        Ok((state, tasks))
    }

    pub fn get_jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    pub fn authorizer(&self) -> &Authorizer {
        &self.authorizer
    }
}

fn load_catalog(path: Option<&Path>) -> Result<RoleCatalog> {
    let Some(path) = path else {
        return Ok(RoleCatalog::with_seed_roles());
    };
    let raw = std::fs::read_to_string(path)?;
    let records: Vec<RoleRecord> = serde_json::from_str(&raw)?;
    tracing::info!(path = %path.display(), count = records.len(), "Loaded role snapshot");
    Ok(RoleCatalog::from_records(records))
}

fn load_users(path: Option<&Path>) -> Result<MemoryUserStore> {
    match path {
        Some(path) => Ok(MemoryUserStore::load_from_file(path)?),
        None => {
            tracing::warn!("USERS_FILE not set, starting with the built-in admin account only");
            Ok(MemoryUserStore::with_users(vec![UserRecord {
                id: PROTECTED_USER_ID,
                username: "admin".to_string(),
                is_admin: true,
                role_id: None,
            }]))
        }
    }
}
