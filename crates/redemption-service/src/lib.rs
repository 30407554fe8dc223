//! 积分奖励兑换服务
//!
//! 用户完成任务获得积分，用积分兑换库存有限的奖励。
//! 兑换申请先进入待审批状态，由管理员通过或拒绝。
//!
//! ## 核心保证
//!
//! - 提交只做乐观检查，不扣减积分和库存
//! - 审批通过时，状态流转、库存扣减、余额扣减和积分流水在同一事务内完成
//! - 并发审批下库存和余额都不会变为负数
//! - 终态申请不会再次流转
//!
//! ## 模块结构
//!
//! - `models`: 领域模型定义
//! - `error`: 错误类型定义
//! - `workflow`: 审批状态机（纯业务规则）
//! - `repository`: 数据仓储层（PostgreSQL 与内存实现）
//! - `service`: 业务服务层
//! - `cli`: 运维命令行

pub mod cli;
pub mod error;
pub mod models;
pub mod repository;
pub mod service;
pub mod workflow;

pub use error::{RedemptionError, Result};
pub use models::*;
pub use repository::{
    MemoryStore, RedemptionRequestRepository, RewardRepository, UserRepository,
};
pub use service::{PointLedgerService, RedemptionService, RewardCatalogService, dto};
pub use workflow::{ApprovalSettlement, SettledApproval, SettlementOutcome};
