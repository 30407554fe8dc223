//! 非负整数数值类型
//!
//! 积分余额和奖励库存都是有界的非负整数。
//! 所有运算都显式检查，不会出现负值或溢出。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 数值构造错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("数值不能为负数: {0}")]
    Negative(i64),

    #[error("无法解析为整数: {0:?}")]
    Unparsable(String),
}

macro_rules! non_negative_amount {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
            Serialize, Deserialize, sqlx::Type,
        )]
        #[serde(try_from = "i64", into = "i64")]
        #[sqlx(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const ZERO: Self = Self(0);

            /// 构造数值，负数返回错误
            pub fn new(value: i64) -> Result<Self, AmountError> {
                if value < 0 {
                    return Err(AmountError::Negative(value));
                }
                Ok(Self(value))
            }

            pub const fn value(self) -> i64 {
                self.0
            }
        }

        impl TryFrom<i64> for $name {
            type Error = AmountError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        /// 兼容以文本形式存储的旧数据（如 `"100"`）
        impl FromStr for $name {
            type Err = AmountError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value: i64 = s
                    .trim()
                    .parse()
                    .map_err(|_| AmountError::Unparsable(s.to_string()))?;
                Self::new(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

non_negative_amount!(
    /// 积分数量
    Points
);

non_negative_amount!(
    /// 库存数量
    Stock
);

impl Points {
    /// 扣减积分，结果为负时返回 None
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).and_then(|v| Self::new(v).ok())
    }

    /// 增加积分，溢出时返回 None
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// 余额是否足以支付指定价格
    pub fn covers(self, price: Self) -> bool {
        self.0 >= price.0
    }
}

impl Stock {
    /// 是否至少还有一件可兑换
    pub fn is_available(self) -> bool {
        self.0 >= 1
    }

    /// 取走一件，库存为 0 时返回 None
    pub fn take_one(self) -> Option<Self> {
        if self.is_available() {
            Some(Self(self.0 - 1))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_negative() {
        assert_eq!(Points::new(-1), Err(AmountError::Negative(-1)));
        assert_eq!(Stock::new(0).unwrap(), Stock::ZERO);
    }

    #[test]
    fn test_parse_legacy_text() {
        assert_eq!("100".parse::<Points>().unwrap().value(), 100);
        assert_eq!(" 42 ".parse::<Points>().unwrap().value(), 42);
        assert!(matches!(
            "abc".parse::<Points>(),
            Err(AmountError::Unparsable(_))
        ));
        assert_eq!("-5".parse::<Points>(), Err(AmountError::Negative(-5)));
        assert!("".parse::<Points>().is_err());
    }

    #[test]
    fn test_points_arithmetic() {
        let balance = Points::new(100).unwrap();
        let price = Points::new(30).unwrap();

        assert_eq!(balance.checked_sub(price).unwrap().value(), 70);
        assert!(price.checked_sub(balance).is_none());
        assert!(balance.covers(price));
        assert!(!price.covers(balance));
        assert!(Points::new(i64::MAX).unwrap().checked_add(price).is_none());
    }

    #[test]
    fn test_stock_take_one() {
        let stock = Stock::new(1).unwrap();
        assert!(stock.is_available());

        let empty = stock.take_one().unwrap();
        assert_eq!(empty, Stock::ZERO);
        assert!(!empty.is_available());
        assert!(empty.take_one().is_none());
    }

    #[test]
    fn test_serde_rejects_negative() {
        assert_eq!(serde_json::to_value(Points::new(7).unwrap()).unwrap(), 7);
        assert!(serde_json::from_value::<Stock>(serde_json::json!(-1)).is_err());
        assert_eq!(
            serde_json::from_value::<Stock>(serde_json::json!(3)).unwrap(),
            Stock::new(3).unwrap()
        );
    }
}
