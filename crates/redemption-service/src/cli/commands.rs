//! CLI 命令定义
//!
//! 使用 clap derive 宏定义运维命令行接口。

use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::models::Decision;

/// 奖励兑换运维工具
///
/// 连接配置中的 PostgreSQL，执行奖励维护、积分入账和兑换审批。
/// 所有结果以 JSON 输出。
#[derive(Parser, Debug)]
#[command(name = "reward-redemption")]
#[command(version, about = "积分奖励兑换运维工具")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 执行数据库迁移
    Migrate,

    /// 列出所有奖励
    Rewards,

    /// 新建奖励
    CreateReward {
        #[arg(short, long)]
        name: String,

        /// 兑换所需积分
        #[arg(short, long)]
        price: i64,

        /// 初始库存
        #[arg(short, long, default_value = "0")]
        stock: i64,

        /// 图片地址
        #[arg(long)]
        image: Option<String>,
    },

    /// 设置奖励剩余库存
    Restock {
        reward_id: Uuid,

        #[arg(short, long)]
        stock: i64,
    },

    /// 删除奖励（存在待审批申请时拒绝）
    DeleteReward { reward_id: Uuid },

    /// 任务积分入账
    Credit {
        #[arg(short, long)]
        user_id: String,

        #[arg(short, long)]
        points: i64,

        /// 关联的任务名
        #[arg(short, long)]
        reference: String,
    },

    /// 查询用户余额和积分流水
    Balance {
        #[arg(short, long)]
        user_id: String,
    },

    /// 提交兑换申请
    Submit {
        #[arg(short, long)]
        user_id: String,

        #[arg(short, long)]
        reward_id: Uuid,
    },

    /// 审批兑换申请
    ///
    /// 决定取值：done / approve / rejected / reject
    Decide {
        request_id: Uuid,

        #[arg(short, long)]
        decision: Decision,

        /// 执行审批的管理员
        #[arg(short, long)]
        admin_id: String,
    },

    /// 列出待审批的兑换申请
    Pending,

    /// 查询用户兑换历史
    History {
        #[arg(short, long)]
        user_id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_create_reward() {
        let cli = Cli::parse_from([
            "reward-redemption",
            "create-reward",
            "--name",
            "Movie Ticket",
            "--price",
            "30",
        ]);
        match cli.command {
            Commands::CreateReward {
                name,
                price,
                stock,
                image,
            } => {
                assert_eq!(name, "Movie Ticket");
                assert_eq!(price, 30);
                assert_eq!(stock, 0);
                assert!(image.is_none());
            }
            _ => panic!("预期 CreateReward 命令"),
        }
    }

    #[test]
    fn test_cli_parse_decide() {
        let request_id = Uuid::new_v4();
        let raw_id = request_id.to_string();
        let cli = Cli::parse_from([
            "reward-redemption",
            "decide",
            raw_id.as_str(),
            "--decision",
            "approve",
            "--admin-id",
            "admin-1",
        ]);
        match cli.command {
            Commands::Decide {
                request_id: id,
                decision,
                admin_id,
            } => {
                assert_eq!(id, request_id);
                assert_eq!(decision, Decision::Done);
                assert_eq!(admin_id, "admin-1");
            }
            _ => panic!("预期 Decide 命令"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_decision() {
        let raw_id = Uuid::new_v4().to_string();
        let result = Cli::try_parse_from([
            "reward-redemption",
            "decide",
            raw_id.as_str(),
            "--decision",
            "maybe",
            "--admin-id",
            "admin-1",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_rejects_malformed_reward_id() {
        let result = Cli::try_parse_from(["reward-redemption", "delete-reward", "not-a-uuid"]);
        assert!(result.is_err());
    }
}
