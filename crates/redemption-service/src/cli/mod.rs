//! CLI 模块
//!
//! # 使用示例
//!
//! ```bash
//! # 建表
//! reward-redemption migrate
//!
//! # 新建奖励并入账
//! reward-redemption create-reward -n "Movie Ticket" -p 30 -s 2
//! reward-redemption credit -u user-001 -p 100 -r "Daily check-in"
//!
//! # 提交并审批
//! reward-redemption submit -u user-001 -r <reward-id>
//! reward-redemption decide <request-id> -d done -a admin-001
//! ```

pub mod commands;
pub mod runner;

pub use commands::{Cli, Commands};
pub use runner::CommandRunner;
