// ==========================================
// 生产执行校验引擎 - 工单与工序实体
// ==========================================
// 职责: 工单主数据与工序路由数据结构
// 红线: current_operation_seq 只由外层生命周期动作推进,
//       且必须以 CAS 方式写入 (校验通过的序号仍是当前序号才允许推进)
// ==========================================

use crate::domain::types::{OperationStatus, WorkOrderStatus};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// WorkOrder - 工单
// ==========================================

/// 工单主数据
///
/// 本引擎只读: 状态与当前工序序号由生命周期动作维护
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrder {
    pub work_order_id: String,
    pub status: WorkOrderStatus,
    /// 当前唯一可操作的工序序号 (1 起始), 在 in_progress 期间单调不减
    pub current_operation_seq: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkOrder {
    /// 工单是否处于可操作状态
    pub fn is_operable(&self) -> bool {
        self.status == WorkOrderStatus::InProgress
    }
}

// ==========================================
// Operation - 工序
// ==========================================

/// 工序 (工单路由中的一步)
///
/// 不变量: 两个实际重量任一为空时, 工序不可完工
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub work_order_id: String,
    /// 工单内唯一, 1 起始
    pub sequence: i64,
    pub status: OperationStatus,
    /// 实际投入重量 (录入前为空)
    pub actual_input_weight: Option<Decimal>,
    /// 实际产出重量 (录入前为空)
    pub actual_output_weight: Option<Decimal>,
    pub updated_at: DateTime<Utc>,
}

impl Operation {
    /// 投入/产出重量是否均已录入
    pub fn weights_recorded(&self) -> bool {
        self.actual_input_weight.is_some() && self.actual_output_weight.is_some()
    }
}
