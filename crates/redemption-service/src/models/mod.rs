//! 领域模型
//!
//! - `amount`: 积分与库存的非负数值类型
//! - `user`: 用户与积分余额
//! - `reward`: 奖励目录
//! - `request`: 兑换申请及其状态机
//! - `ledger`: 积分流水

mod amount;
mod ledger;
mod request;
mod reward;
mod user;

pub use amount::{AmountError, Points, Stock};
pub use ledger::{PointChangeType, PointLedgerEntry};
pub use request::{Decision, RedemptionRequest, RequestStatus};
pub use reward::Reward;
pub use user::{User, UserRole};
