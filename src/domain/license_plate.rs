// ==========================================
// 生产执行校验引擎 - 托盘标签实体
// ==========================================
// 职责: 可追溯物理单元 (License Plate)
// 红线: quantity 为在库权威值, 只由消耗/产出事件在引擎外修改;
//       qa_status 只由质检流程或监督员覆盖路径修改
// ==========================================

use crate::domain::types::QaStatus;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// LicensePlate - 托盘标签
// ==========================================

/// 托盘标签: 唯一标识的可追溯物理单元
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicensePlate {
    pub lp_id: String,
    pub product_id: String,
    /// 在库数量 (权威值)
    pub quantity: Decimal,
    pub qa_status: QaStatus,
    /// 工艺阶段后缀, 用于谱系匹配 (可选校验, 见 ValidationPolicy)
    pub stage_suffix: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LicensePlate {
    /// 质检是否放行
    pub fn qa_released(&self) -> bool {
        self.qa_status == QaStatus::Passed
    }
}
