//! 数据仓储层
//!
//! 提供用户积分、奖励目录和兑换申请的数据访问接口。
//!
//! ## 实现
//!
//! - PostgreSQL：生产存储，审批结算在单个事务内完成
//! - 内存：测试和嵌入使用，所有操作在同一把锁下串行执行
//!
//! 服务层只依赖 trait，两种实现可以互换。

mod memory;
mod request_repo;
mod reward_repo;
mod traits;
mod user_repo;

pub use memory::MemoryStore;
pub use request_repo::RedemptionRequestRepository;
pub use reward_repo::RewardRepository;
pub use traits::*;
pub use user_repo::UserRepository;
