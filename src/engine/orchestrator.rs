// ==========================================
// 生产执行校验引擎 - 执行编排器
// ==========================================
// 职责: 组合各校验器为三个原子前置检查
//       (投料 / 录重 / 完工), 短路失败, 廉价检查在前
// 红线: 编排器是调用方唯一入口; 存储层意外失败一律包装为
//       StoreFailure 裁决, 不得越过编排器边界外抛
// 说明: 引擎只回答 "是否允许", 不执行变更
// ==========================================

use crate::domain::types::{IssueKind, RoutingAction};
use crate::engine::cardinality::OneToOneValidator;
use crate::engine::genealogy::CrossOrderValidator;
use crate::engine::policy::ValidationPolicy;
use crate::engine::quality::QualityGateValidator;
use crate::engine::reservation::ReservationLedgerValidator;
use crate::engine::result::{ExecVerdict, RuleResult, Violation, ViolationKind};
use crate::engine::routing::SequentialRoutingValidator;
use crate::engine::store::{StateStore, StoreError};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// 将存储层失败压平为 StoreFailure 裁决
///
/// 超时/取消同样走这里: 不得静默通过, 也不得静默失败
fn lift(step: Result<RuleResult, StoreError>) -> RuleResult {
    match step {
        Ok(inner) => inner,
        Err(e) => Err(Violation::new(
            ViolationKind::StoreFailure,
            format!("Validation could not be completed: {}", e),
        )),
    }
}

// ==========================================
// ExecutionOrchestrator - 执行编排器
// ==========================================

/// 执行编排器
///
/// 每个动作是一条固定顺序的校验链, 首个失败即止,
/// 其 reason 原样上浮
pub struct ExecutionOrchestrator<S>
where
    S: StateStore,
{
    routing: SequentialRoutingValidator<S>,
    cardinality: OneToOneValidator<S>,
    genealogy: CrossOrderValidator<S>,
    ledger: ReservationLedgerValidator<S>,
    quality: QualityGateValidator<S>,
}

impl<S> ExecutionOrchestrator<S>
where
    S: StateStore,
{
    /// 以默认策略创建编排器
    pub fn new(store: Arc<S>) -> Self {
        Self::with_policy(store, ValidationPolicy::default())
    }

    /// 以指定策略创建编排器
    ///
    /// # 参数
    /// - store: 状态存储端口 (依赖注入)
    /// - policy: 校验策略
    pub fn with_policy(store: Arc<S>, policy: ValidationPolicy) -> Self {
        Self {
            routing: SequentialRoutingValidator::new(store.clone()),
            cardinality: OneToOneValidator::new(store.clone()),
            genealogy: CrossOrderValidator::new(store.clone(), policy),
            ledger: ReservationLedgerValidator::new(store.clone()),
            quality: QualityGateValidator::new(store),
        }
    }

    /// 投料前置检查
    ///
    /// 链路: 工序顺序(start) → 跨单谱系 → 质检门禁(发料) → 预留台账
    #[instrument(skip(self), fields(work_order_id = %work_order_id, operation_seq, unit_id = %unit_id, quantity = %quantity))]
    pub async fn stage_material(
        &self,
        work_order_id: &str,
        operation_seq: i64,
        unit_id: &str,
        quantity: Decimal,
    ) -> ExecVerdict {
        let chain = self
            .stage_material_chain(work_order_id, operation_seq, unit_id, quantity)
            .await;
        self.conclude("stage_material", chain)
    }

    async fn stage_material_chain(
        &self,
        work_order_id: &str,
        operation_seq: i64,
        unit_id: &str,
        quantity: Decimal,
    ) -> RuleResult {
        // === 步骤 1: 工序顺序 ===
        debug!("投料链路: 工序顺序检查");
        lift(
            self.routing
                .validate_operation_sequence(work_order_id, operation_seq, RoutingAction::Start)
                .await,
        )?;

        // === 步骤 2: 跨单谱系 ===
        debug!("投料链路: 跨单谱系检查");
        match self
            .genealogy
            .validate_cross_order_intake(unit_id, work_order_id, operation_seq)
            .await
        {
            Ok(check) => {
                if let Some(violation) = check.violation {
                    return Err(violation);
                }
            }
            Err(e) => return lift(Err(e)),
        }

        // === 步骤 3: 质检门禁 (发料) ===
        debug!("投料链路: 质检门禁检查");
        lift(self.quality.validate_qa_status(unit_id, IssueKind::WoIssue).await)?;

        // === 步骤 4: 预留台账 ===
        debug!("投料链路: 预留余量检查");
        lift(self.ledger.validate_reservation(unit_id, quantity).await)?;

        Ok(())
    }

    /// 录重前置检查
    ///
    /// 链路: 工序顺序(record_weights) → 一比一基数
    #[instrument(skip(self, input_unit_ids, output_unit_ids), fields(work_order_id = %work_order_id, operation_seq))]
    pub async fn record_weights(
        &self,
        work_order_id: &str,
        operation_seq: i64,
        input_unit_ids: &[String],
        output_unit_ids: &[String],
    ) -> ExecVerdict {
        let chain = self
            .record_weights_chain(work_order_id, operation_seq, input_unit_ids, output_unit_ids)
            .await;
        self.conclude("record_weights", chain)
    }

    async fn record_weights_chain(
        &self,
        work_order_id: &str,
        operation_seq: i64,
        input_unit_ids: &[String],
        output_unit_ids: &[String],
    ) -> RuleResult {
        // === 步骤 1: 工序顺序 ===
        debug!("录重链路: 工序顺序检查");
        lift(
            self.routing
                .validate_operation_sequence(
                    work_order_id,
                    operation_seq,
                    RoutingAction::RecordWeights,
                )
                .await,
        )?;

        // === 步骤 2: 一比一基数 ===
        debug!("录重链路: 一比一基数检查");
        match self
            .cardinality
            .validate_one_to_one_rule(work_order_id, operation_seq, input_unit_ids, output_unit_ids)
            .await
        {
            Ok(check) => {
                if let Some(violation) = check.violation {
                    return Err(violation);
                }
            }
            Err(e) => return lift(Err(e)),
        }

        Ok(())
    }

    /// 完工前置检查
    ///
    /// 链路: 工序顺序(complete, 含双侧重量已录入)
    #[instrument(skip(self), fields(work_order_id = %work_order_id, operation_seq))]
    pub async fn complete_operation(
        &self,
        work_order_id: &str,
        operation_seq: i64,
    ) -> ExecVerdict {
        let chain = lift(
            self.routing
                .validate_operation_sequence(work_order_id, operation_seq, RoutingAction::Complete)
                .await,
        );
        self.conclude("complete_operation", chain)
    }

    /// 统一收尾: 记录裁决并转换为顶层结果
    fn conclude(&self, action: &'static str, chain: RuleResult) -> ExecVerdict {
        match &chain {
            Ok(()) => info!(action, "校验通过"),
            Err(v) => warn!(action, kind = ?v.kind, reason = %v.message, "校验拒绝"),
        }
        ExecVerdict::from(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::QaStatus;
    use crate::engine::testing::MockStateStore;

    fn dec(value: i64) -> Decimal {
        Decimal::new(value, 0)
    }

    /// 投料链路全绿的基础场景
    fn staging_store() -> MockStateStore {
        MockStateStore::default()
            .with_in_progress_wo("WO-001", 1, 2)
            .with_material("WO-001", 1, "PROD-A", false, dec(100))
            .with_lp("LP-001", "PROD-A", dec(50), QaStatus::Passed)
    }

    #[tokio::test]
    async fn test_stage_material_happy_path() {
        let orchestrator = ExecutionOrchestrator::new(Arc::new(staging_store()));
        let verdict = orchestrator.stage_material("WO-001", 1, "LP-001", dec(10)).await;
        assert!(verdict.is_valid, "{:?}", verdict.reason);
    }

    #[tokio::test]
    async fn test_stage_material_short_circuits_on_routing() {
        // 工序 2 不是当前工序: 链路应止步于顺序检查
        let orchestrator = ExecutionOrchestrator::new(Arc::new(staging_store()));
        let verdict = orchestrator.stage_material("WO-001", 2, "LP-001", dec(10)).await;
        assert!(!verdict.is_valid);
        assert_eq!(verdict.kind, Some(ViolationKind::OutOfSequence));
        assert!(verdict.reason.unwrap().contains("Current operation is 1"));
    }

    #[tokio::test]
    async fn test_stage_material_genealogy_blocks_wrong_product() {
        let store = staging_store().with_lp("LP-B", "PROD-B", dec(50), QaStatus::Passed);
        let orchestrator = ExecutionOrchestrator::new(Arc::new(store));
        let verdict = orchestrator.stage_material("WO-001", 1, "LP-B", dec(10)).await;
        assert_eq!(verdict.kind, Some(ViolationKind::ProductMismatch));
    }

    #[tokio::test]
    async fn test_stage_material_qa_blocks_quarantine() {
        let store = staging_store().with_lp("LP-Q", "PROD-A", dec(50), QaStatus::Quarantine);
        let orchestrator = ExecutionOrchestrator::new(Arc::new(store));
        let verdict = orchestrator.stage_material("WO-001", 1, "LP-Q", dec(10)).await;
        assert_eq!(verdict.kind, Some(ViolationKind::QaGateBlocked));
        let reason = verdict.reason.unwrap();
        assert!(reason.contains("LP-Q"));
        assert!(reason.contains("Quarantine"));
    }

    #[tokio::test]
    async fn test_stage_material_ledger_blocks_over_request() {
        let store = staging_store().with_active_reservation("LP-001", dec(50));
        let orchestrator = ExecutionOrchestrator::new(Arc::new(store));
        let verdict = orchestrator.stage_material("WO-001", 1, "LP-001", dec(1)).await;
        assert_eq!(verdict.kind, Some(ViolationKind::NoAvailableQuantity));
    }

    #[tokio::test]
    async fn test_record_weights_chain() {
        let store = staging_store().with_material("WO-001", 1, "PROD-CUT", true, dec(10));
        let orchestrator = ExecutionOrchestrator::new(Arc::new(store));

        let inputs = vec!["LP-001".to_string()];
        let outputs = vec!["LP-OUT".to_string()];
        let verdict = orchestrator.record_weights("WO-001", 1, &inputs, &outputs).await;
        assert!(verdict.is_valid);

        let outputs = Vec::new();
        let verdict = orchestrator.record_weights("WO-001", 1, &inputs, &outputs).await;
        assert_eq!(verdict.kind, Some(ViolationKind::CardinalityMismatch));
    }

    #[tokio::test]
    async fn test_complete_operation_requires_weights() {
        let store = Arc::new(staging_store());
        let orchestrator = ExecutionOrchestrator::new(store.clone());

        let verdict = orchestrator.complete_operation("WO-001", 1).await;
        assert_eq!(verdict.kind, Some(ViolationKind::WeightsNotRecorded));

        store.set_weights("WO-001", 1, Some(dec(100)), Some(dec(97)));
        let verdict = orchestrator.complete_operation("WO-001", 1).await;
        assert!(verdict.is_valid);
    }

    #[tokio::test]
    async fn test_store_failure_is_wrapped_not_thrown() {
        let store = Arc::new(staging_store());
        let orchestrator = ExecutionOrchestrator::new(store.clone());
        store.fail_with("connection reset");

        let verdict = orchestrator.stage_material("WO-001", 1, "LP-001", dec(10)).await;
        assert!(!verdict.is_valid);
        assert_eq!(verdict.kind, Some(ViolationKind::StoreFailure));
        assert!(verdict.reason.unwrap().contains("connection reset"));
    }
}
