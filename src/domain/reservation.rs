// ==========================================
// 生产执行校验引擎 - 数量预留实体
// ==========================================
// 职责: 针对托盘标签的数量占用记录
// 红线: 任意时刻 sum(active.quantity_reserved) ≤ LP.quantity
//       (核心并发不变量, 由存储层原子插入保证)
// ==========================================

use crate::domain::types::ReservationStatus;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// LpReservation - 数量预留
// ==========================================

/// 数量预留: 待消耗的数量占用
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LpReservation {
    pub reservation_id: String,
    pub lp_id: String,
    /// 占用归属的工单 (审计用)
    pub work_order_id: String,
    pub quantity_reserved: Decimal,
    pub status: ReservationStatus,
    /// 操作人标识 (审计用, 鉴权在引擎外完成)
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LpReservation {
    /// 是否仍占用数量
    pub fn is_active(&self) -> bool {
        self.status == ReservationStatus::Active
    }
}
