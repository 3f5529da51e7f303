// ==========================================
// 生产执行校验引擎 - 工序顺序校验器
// ==========================================
// 职责: 工序严格串行 + 工单可操作状态门禁
// 红线: 任何工序不得越序开工/录重/完工;
//       完工额外要求投入/产出重量均已录入
// ==========================================

use crate::domain::types::RoutingAction;
use crate::engine::result::{RuleResult, Violation, ViolationKind};
use crate::engine::store::StateStore;
use std::sync::Arc;
use tracing::instrument;

// ==========================================
// SequentialRoutingValidator - 工序顺序校验器
// ==========================================

/// 工序顺序校验器
///
/// 被编排器的三个动作复用, 仅以 action 参数化,
/// 避免重复状态/顺序检查
pub struct SequentialRoutingValidator<S>
where
    S: StateStore,
{
    store: Arc<S>,
}

impl<S> SequentialRoutingValidator<S>
where
    S: StateStore,
{
    /// 创建新的工序顺序校验器
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// 校验工序动作是否按序合法
    ///
    /// # 参数
    /// - work_order_id: 工单ID
    /// - operation_seq: 目标工序序号
    /// - action: 动作 (start / record_weights / complete)
    ///
    /// # 返回
    /// - Ok(()): 校验通过
    /// - Err(Violation): 路由违规, reason 可直接呈现给操作员
    #[instrument(skip(self), fields(work_order_id = %work_order_id, operation_seq, action = %action))]
    pub async fn validate_operation_sequence(
        &self,
        work_order_id: &str,
        operation_seq: i64,
        action: RoutingAction,
    ) -> Result<RuleResult, crate::engine::store::StoreError> {
        // 工单与目标工序并发读取
        let (work_order, operation) = futures::try_join!(
            self.store.get_work_order(work_order_id),
            self.store.get_operation(work_order_id, operation_seq),
        )?;

        // === 步骤 1: 工单必须存在且处于执行中 ===
        let work_order = match work_order {
            Some(wo) => wo,
            None => {
                return Ok(Err(Violation::new(
                    ViolationKind::OrderNotInProgress,
                    format!("Work order {} not found; order must be in progress", work_order_id),
                )));
            }
        };

        if !work_order.is_operable() {
            return Ok(Err(Violation::new(
                ViolationKind::OrderNotInProgress,
                format!(
                    "Work order {} must be in progress before operations can be executed (current status: {})",
                    work_order_id, work_order.status
                ),
            )));
        }

        // === 步骤 2: 目标工序必须存在 ===
        let operation = match operation {
            Some(op) => op,
            None => {
                return Ok(Err(Violation::new(
                    ViolationKind::OperationNotFound,
                    format!(
                        "Operation {} not found on work order {}",
                        operation_seq, work_order_id
                    ),
                )));
            }
        };

        // === 步骤 3: 严格串行, 只有当前工序可操作 ===
        if operation_seq != work_order.current_operation_seq {
            return Ok(Err(Violation::new(
                ViolationKind::OutOfSequence,
                format!(
                    "Operation {} cannot be executed out of sequence. Current operation is {}",
                    operation_seq, work_order.current_operation_seq
                ),
            )));
        }

        // === 步骤 4: 完工额外要求重量已录入 ===
        if action == RoutingAction::Complete && !operation.weights_recorded() {
            return Ok(Err(Violation::new(
                ViolationKind::WeightsNotRecorded,
                format!(
                    "Operation {} cannot be completed: actual input and output weights must both be recorded",
                    operation_seq
                ),
            )));
        }

        Ok(Ok(()))
    }
}
