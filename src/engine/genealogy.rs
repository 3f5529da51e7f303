// ==========================================
// 生产执行校验引擎 - 跨单谱系校验器
// ==========================================
// 职责: 上游工单产出进入下游工单前的谱系核对
// 红线: 产品身份必须匹配且质检合格, 防止错投批次或
//       投入未通过检验的批次
// ==========================================

use crate::engine::policy::ValidationPolicy;
use crate::engine::result::{Violation, ViolationKind};
use crate::engine::store::{StateStore, StoreError};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

// ==========================================
// CrossOrderCheck - 跨单投料检查结果
// ==========================================

/// 跨单投料检查结果
///
/// 通过时也返回双方产品身份, 供审计/日志使用
#[derive(Debug, Clone, Serialize)]
pub struct CrossOrderCheck {
    pub is_valid: bool,
    pub expected_product_id: Option<String>,
    pub actual_product_id: Option<String>,
    /// 阶段后缀: 默认只透传不校验 (见 ValidationPolicy)
    pub expected_stage_suffix: Option<String>,
    pub actual_stage_suffix: Option<String>,
    pub violation: Option<Violation>,
}

// ==========================================
// CrossOrderValidator - 跨单谱系校验器
// ==========================================

/// 跨单谱系校验器
pub struct CrossOrderValidator<S>
where
    S: StateStore,
{
    store: Arc<S>,
    policy: ValidationPolicy,
}

impl<S> CrossOrderValidator<S>
where
    S: StateStore,
{
    /// 创建新的跨单谱系校验器
    pub fn new(store: Arc<S>, policy: ValidationPolicy) -> Self {
        Self { store, policy }
    }

    /// 校验跨单投料
    ///
    /// # 参数
    /// - unit_id: 托盘标签ID
    /// - expected_work_order_id: 下游工单ID
    /// - expected_operation_seq: 下游工序序号
    #[instrument(skip(self), fields(unit_id = %unit_id, expected_work_order_id = %expected_work_order_id, expected_operation_seq))]
    pub async fn validate_cross_order_intake(
        &self,
        unit_id: &str,
        expected_work_order_id: &str,
        expected_operation_seq: i64,
    ) -> Result<CrossOrderCheck, StoreError> {
        // === 步骤 1: 读取托盘标签 ===
        let lp = match self.store.get_license_plate(unit_id).await? {
            Some(lp) => lp,
            None => {
                return Ok(self.fail(
                    None,
                    None,
                    None,
                    None,
                    Violation::new(
                        ViolationKind::ProductMismatch,
                        format!("License plate {} not found", unit_id),
                    ),
                ));
            }
        };

        // === 步骤 2: 读取下游工序的期望物料 ===
        let materials = self
            .store
            .list_materials(expected_work_order_id, expected_operation_seq)
            .await?;
        let expected = match materials.first() {
            Some(material) => material.clone(),
            None => {
                return Ok(self.fail(
                    None,
                    Some(lp.product_id.clone()),
                    None,
                    lp.stage_suffix.clone(),
                    Violation::new(
                        ViolationKind::ProductMismatch,
                        format!(
                            "No expected material defined for work order {} operation {}",
                            expected_work_order_id, expected_operation_seq
                        ),
                    ),
                ));
            }
        };

        // === 步骤 3: 产品身份必须匹配 ===
        if lp.product_id != expected.material_id {
            return Ok(self.fail(
                Some(expected.material_id.clone()),
                Some(lp.product_id.clone()),
                None,
                lp.stage_suffix.clone(),
                Violation::new(
                    ViolationKind::ProductMismatch,
                    format!(
                        "License plate {} carries product {} but work order {} operation {} expects {}",
                        unit_id,
                        lp.product_id,
                        expected_work_order_id,
                        expected_operation_seq,
                        expected.material_id
                    ),
                ),
            ));
        }

        // === 步骤 4: 质检必须合格 ===
        if !lp.qa_released() {
            return Ok(self.fail(
                Some(expected.material_id.clone()),
                Some(lp.product_id.clone()),
                None,
                lp.stage_suffix.clone(),
                Violation::new(
                    ViolationKind::QaGateBlocked,
                    format!(
                        "License plate {} has not passed quality inspection (QA status: {})",
                        unit_id, lp.qa_status
                    ),
                ),
            ));
        }

        // === 步骤 5: 阶段后缀 (策略开启时才强制) ===
        // 上游系统声明了该检查但从未接线; 默认只记录不拦截
        if self.policy.enforce_stage_suffix && lp.stage_suffix.is_none() {
            return Ok(self.fail(
                Some(expected.material_id.clone()),
                Some(lp.product_id.clone()),
                None,
                None,
                Violation::new(
                    ViolationKind::StageSuffixMismatch,
                    format!("License plate {} carries no process-stage suffix", unit_id),
                ),
            ));
        }

        Ok(CrossOrderCheck {
            is_valid: true,
            expected_product_id: Some(expected.material_id),
            actual_product_id: Some(lp.product_id),
            expected_stage_suffix: None,
            actual_stage_suffix: lp.stage_suffix,
            violation: None,
        })
    }

    fn fail(
        &self,
        expected_product_id: Option<String>,
        actual_product_id: Option<String>,
        expected_stage_suffix: Option<String>,
        actual_stage_suffix: Option<String>,
        violation: Violation,
    ) -> CrossOrderCheck {
        CrossOrderCheck {
            is_valid: false,
            expected_product_id,
            actual_product_id,
            expected_stage_suffix,
            actual_stage_suffix,
            violation: Some(violation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::QaStatus;
    use crate::engine::testing::MockStateStore;
    use rust_decimal::Decimal;

    fn store() -> MockStateStore {
        MockStateStore::default()
            .with_material("WO-DOWN", 1, "PROD-A", false, Decimal::new(500, 0))
            .with_lp("LP-100", "PROD-A", Decimal::new(50, 0), QaStatus::Passed)
            .with_lp("LP-200", "PROD-B", Decimal::new(50, 0), QaStatus::Passed)
            .with_lp("LP-300", "PROD-A", Decimal::new(50, 0), QaStatus::Quarantine)
    }

    #[tokio::test]
    async fn test_matching_intake_passes() {
        let validator = CrossOrderValidator::new(Arc::new(store()), ValidationPolicy::default());
        let check = validator
            .validate_cross_order_intake("LP-100", "WO-DOWN", 1)
            .await
            .unwrap();
        assert!(check.is_valid);
        assert_eq!(check.expected_product_id.as_deref(), Some("PROD-A"));
        assert_eq!(check.actual_product_id.as_deref(), Some("PROD-A"));
    }

    #[tokio::test]
    async fn test_product_mismatch() {
        let validator = CrossOrderValidator::new(Arc::new(store()), ValidationPolicy::default());
        let check = validator
            .validate_cross_order_intake("LP-200", "WO-DOWN", 1)
            .await
            .unwrap();
        assert!(!check.is_valid);
        let violation = check.violation.unwrap();
        assert_eq!(violation.kind, ViolationKind::ProductMismatch);
        assert!(violation.message.contains("PROD-B"));
        assert!(violation.message.contains("PROD-A"));
    }

    #[tokio::test]
    async fn test_qa_gate_blocks_intake() {
        let validator = CrossOrderValidator::new(Arc::new(store()), ValidationPolicy::default());
        let check = validator
            .validate_cross_order_intake("LP-300", "WO-DOWN", 1)
            .await
            .unwrap();
        let violation = check.violation.unwrap();
        assert_eq!(violation.kind, ViolationKind::QaGateBlocked);
        assert!(violation.message.contains("LP-300"));
        assert!(violation.message.contains("Quarantine"));
    }

    #[tokio::test]
    async fn test_unknown_unit_fails() {
        let validator = CrossOrderValidator::new(Arc::new(store()), ValidationPolicy::default());
        let check = validator
            .validate_cross_order_intake("LP-404", "WO-DOWN", 1)
            .await
            .unwrap();
        assert!(!check.is_valid);
        assert_eq!(check.violation.unwrap().kind, ViolationKind::ProductMismatch);
    }

    #[tokio::test]
    async fn test_stage_suffix_only_enforced_by_policy() {
        // 默认策略: 无后缀照样放行
        let validator = CrossOrderValidator::new(Arc::new(store()), ValidationPolicy::default());
        let check = validator
            .validate_cross_order_intake("LP-100", "WO-DOWN", 1)
            .await
            .unwrap();
        assert!(check.is_valid);

        // 策略开启: 无后缀拦截
        let policy = ValidationPolicy {
            enforce_stage_suffix: true,
        };
        let validator = CrossOrderValidator::new(Arc::new(store()), policy);
        let check = validator
            .validate_cross_order_intake("LP-100", "WO-DOWN", 1)
            .await
            .unwrap();
        assert_eq!(
            check.violation.unwrap().kind,
            ViolationKind::StageSuffixMismatch
        );

        // 策略开启 + 有后缀: 放行并透传后缀
        let validator = CrossOrderValidator::new(
            Arc::new(store().with_stage_suffix("LP-100", "-S2")),
            policy,
        );
        let check = validator
            .validate_cross_order_intake("LP-100", "WO-DOWN", 1)
            .await
            .unwrap();
        assert!(check.is_valid);
        assert_eq!(check.actual_stage_suffix.as_deref(), Some("-S2"));
    }
}
