//! 服务层
//!
//! 实现兑换业务流程，协调仓储层和审批状态机。
//!
//! ## 模块结构
//!
//! - `dto`: 数据传输对象定义
//! - `redemption_service`: 兑换申请提交与审批
//! - `catalog_service`: 奖励目录维护
//! - `ledger_service`: 任务积分入账与余额维护

pub mod catalog_service;
pub mod dto;
pub mod ledger_service;
pub mod redemption_service;

pub use catalog_service::RewardCatalogService;
pub use dto::*;
pub use ledger_service::PointLedgerService;
pub use redemption_service::RedemptionService;
