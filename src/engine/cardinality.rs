// ==========================================
// 生产执行校验引擎 - 一比一基数校验器
// ==========================================
// 职责: one_to_one 物料的投入/产出单元严格 1:1 配对
// 红线: 不允许合并, 不允许拆分; 纯基数/去重检查, 不读数量
// ==========================================

use crate::engine::result::{Violation, ViolationKind};
use crate::engine::store::{StateStore, StoreError};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::instrument;

// ==========================================
// OneToOneCheck - 一比一检查结果
// ==========================================

/// 一比一检查结果
#[derive(Debug, Clone, Serialize)]
pub struct OneToOneCheck {
    /// 该工单+工序是否存在 one_to_one 物料 (规则是否适用)
    pub is_one_to_one: bool,
    pub is_valid: bool,
    pub violation: Option<Violation>,
}

impl OneToOneCheck {
    fn not_applicable() -> Self {
        Self {
            is_one_to_one: false,
            is_valid: true,
            violation: None,
        }
    }

    fn pass() -> Self {
        Self {
            is_one_to_one: true,
            is_valid: true,
            violation: None,
        }
    }

    fn fail(violation: Violation) -> Self {
        Self {
            is_one_to_one: true,
            is_valid: false,
            violation: Some(violation),
        }
    }
}

// ==========================================
// OneToOneValidator - 一比一基数校验器
// ==========================================

/// 一比一基数校验器
pub struct OneToOneValidator<S>
where
    S: StateStore,
{
    store: Arc<S>,
}

impl<S> OneToOneValidator<S>
where
    S: StateStore,
{
    /// 创建新的一比一基数校验器
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// 校验一比一规则
    ///
    /// # 参数
    /// - work_order_id: 工单ID
    /// - operation_seq: 工序序号
    /// - input_unit_ids: 投入单元ID列表
    /// - output_unit_ids: 产出单元ID列表
    ///
    /// # 边界
    /// - 双侧空列表合法 (尚未投料, 0 == 0 不触发基数错误)
    #[instrument(skip(self, input_unit_ids, output_unit_ids), fields(work_order_id = %work_order_id, operation_seq))]
    pub async fn validate_one_to_one_rule(
        &self,
        work_order_id: &str,
        operation_seq: i64,
        input_unit_ids: &[String],
        output_unit_ids: &[String],
    ) -> Result<OneToOneCheck, StoreError> {
        // === 步骤 1: 规则是否适用 ===
        let materials = self.store.list_materials(work_order_id, operation_seq).await?;
        if !materials.iter().any(|m| m.one_to_one) {
            return Ok(OneToOneCheck::not_applicable());
        }

        // === 步骤 2: 基数必须一致 ===
        if input_unit_ids.len() != output_unit_ids.len() {
            return Ok(OneToOneCheck::fail(Violation::new(
                ViolationKind::CardinalityMismatch,
                format!(
                    "One-to-one material requires exactly one input unit per output unit (inputs: {}, outputs: {})",
                    input_unit_ids.len(),
                    output_unit_ids.len()
                ),
            )));
        }

        // === 步骤 3: 两侧各自不得有重复单元 ===
        let distinct_inputs: HashSet<&String> = input_unit_ids.iter().collect();
        if distinct_inputs.len() != input_unit_ids.len() {
            return Ok(OneToOneCheck::fail(Violation::new(
                ViolationKind::DuplicateInputUnit,
                "Duplicate units found in the input list".to_string(),
            )));
        }

        let distinct_outputs: HashSet<&String> = output_unit_ids.iter().collect();
        if distinct_outputs.len() != output_unit_ids.len() {
            return Ok(OneToOneCheck::fail(Violation::new(
                ViolationKind::DuplicateOutputUnit,
                "Duplicate units found in the output list".to_string(),
            )));
        }

        Ok(OneToOneCheck::pass())
    }
}
