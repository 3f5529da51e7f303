// ==========================================
// 生产执行校验引擎 - 工单物料实体
// ==========================================
// 职责: 工单+工序维度的计划物料行
// 红线: 本引擎对物料只读
// ==========================================

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// WoMaterial - 工单物料行
// ==========================================

/// 工单物料行 (归属于工单+工序)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WoMaterial {
    pub work_order_id: String,
    pub operation_seq: i64,
    /// 物料 (产品) 标识, 跨单投料时作为期望产品
    pub material_id: String,
    /// 一比一标记: 每个投入单元必须恰好对应一个产出单元
    pub one_to_one: bool,
    /// 计划数量
    pub quantity: Decimal,
    pub created_at: DateTime<Utc>,
}
