//! 活动日志
//!
//! 角色与用户身份变更的记录：[`ActivityService`] 投递，[`ActivityWorker`] 写入。

pub mod service;
pub mod storage;
pub mod types;
pub mod worker;

pub use service::ActivityService;
pub use storage::ActivityStorage;
pub use types::{ActivityAction, ActivityEntry, ItemType};
pub use worker::ActivityWorker;
