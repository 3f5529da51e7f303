// ==========================================
// 生产执行校验引擎 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑; 数量/重量列为 TEXT,
//       读写两侧经 rust_decimal 转换
// ==========================================

pub mod error;
pub mod license_plate_repo;
pub mod material_repo;
pub mod reservation_repo;
pub mod sqlite_store;
pub mod work_order_repo;

pub use error::{RepositoryError, RepositoryResult};
pub use license_plate_repo::LicensePlateRepository;
pub use material_repo::WoMaterialRepository;
pub use reservation_repo::{ReservationRepository, ReserveOutcome};
pub use sqlite_store::SqliteStateStore;
pub use work_order_repo::{OperationRepository, WorkOrderRepository};

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::warn;

/// 解析 TEXT 列中的十进制数量
pub(crate) fn parse_decimal(field: &str, raw: &str) -> RepositoryResult<Decimal> {
    Decimal::from_str(raw).map_err(|e| RepositoryError::FieldValueError {
        field: field.to_string(),
        message: format!("invalid decimal '{}': {}", raw, e),
    })
}

/// 解析可空的十进制列
pub(crate) fn parse_decimal_opt(field: &str, raw: Option<String>) -> RepositoryResult<Option<Decimal>> {
    match raw {
        Some(s) => Ok(Some(parse_decimal(field, &s)?)),
        None => Ok(None),
    }
}

/// 解析时间戳列 (RFC3339 或 SQLite datetime('now') 格式)
///
/// 时间戳仅用于审计展示, 不参与任何校验判定, 解析失败时
/// 回退为 UNIX 纪元; 回退必须留痕, 否则审计列损坏无从察觉
pub(crate) fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .map(|naive| naive.and_utc())
        })
        .unwrap_or_else(|_| {
            warn!(raw, "时间戳列无法解析, 回退为 UNIX 纪元");
            DateTime::<Utc>::UNIX_EPOCH
        })
}
