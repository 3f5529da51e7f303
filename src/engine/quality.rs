// ==========================================
// 生产执行校验引擎 - 质检门禁校验器
// ==========================================
// 职责: 消耗/产出登记前的质检状态门禁 + 监督员覆盖请求的
//       格式校验
// 红线: 只有 Passed 可放行; 覆盖校验只检查请求合法性,
//       PIN 与凭据库的核对属外部协作方
// ==========================================

use crate::domain::types::{IssueKind, QaStatus};
use crate::engine::result::{RuleResult, Violation, ViolationKind};
use crate::engine::store::{StateStore, StoreError};
use std::sync::Arc;
use tracing::instrument;

/// 监督员 PIN 长度下限
const PIN_MIN_LEN: usize = 4;
/// 监督员 PIN 长度上限
const PIN_MAX_LEN: usize = 6;

// ==========================================
// QualityGateValidator - 质检门禁校验器
// ==========================================

/// 质检门禁校验器
pub struct QualityGateValidator<S>
where
    S: StateStore,
{
    store: Arc<S>,
}

impl<S> QualityGateValidator<S>
where
    S: StateStore,
{
    /// 创建新的质检门禁校验器
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// 校验托盘标签的质检状态
    ///
    /// # 参数
    /// - unit_id: 托盘标签ID
    /// - kind: 发料/产出 (仅影响审计措辞, 规则一致)
    #[instrument(skip(self), fields(unit_id = %unit_id, kind = %kind))]
    pub async fn validate_qa_status(
        &self,
        unit_id: &str,
        kind: IssueKind,
    ) -> Result<RuleResult, StoreError> {
        let lp = self
            .store
            .get_license_plate(unit_id)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                entity: "license_plate".to_string(),
                id: unit_id.to_string(),
            })?;

        if !lp.qa_released() {
            let action = match kind {
                IssueKind::WoIssue => "consumed",
                IssueKind::WoOutput => "registered as output",
            };
            return Ok(Err(Violation::new(
                ViolationKind::QaGateBlocked,
                format!(
                    "License plate {} cannot be {}: QA status is {} (must be Passed)",
                    unit_id, action, lp.qa_status
                ),
            )));
        }

        Ok(Ok(()))
    }

    /// 校验监督员覆盖请求的合法性
    ///
    /// 只做格式检查 (PIN 形态 / 原因非空 / 目标状态已知);
    /// 通过后由引擎外的调用方执行状态变更
    ///
    /// # 参数
    /// - unit_id: 托盘标签ID
    /// - new_status: 目标质检状态 (字符串, 上游原文)
    /// - reason: 覆盖原因
    /// - supervisor_pin: 监督员 PIN (须满足 ^\d{4,6}$)
    #[instrument(skip(self, supervisor_pin), fields(unit_id = %unit_id, new_status = %new_status))]
    pub fn validate_qa_override(
        &self,
        unit_id: &str,
        new_status: &str,
        reason: &str,
        supervisor_pin: &str,
    ) -> RuleResult {
        // === 步骤 1: PIN 形态 ===
        let pin_ok = (PIN_MIN_LEN..=PIN_MAX_LEN).contains(&supervisor_pin.len())
            && supervisor_pin.chars().all(|c| c.is_ascii_digit());
        if !pin_ok {
            return Err(Violation::new(
                ViolationKind::InvalidPinFormat,
                format!(
                    "Supervisor PIN must be {} to {} digits",
                    PIN_MIN_LEN, PIN_MAX_LEN
                ),
            ));
        }

        // === 步骤 2: 原因必填 ===
        if reason.trim().is_empty() {
            return Err(Violation::new(
                ViolationKind::ReasonRequired,
                format!("A reason is required to override QA status of {}", unit_id),
            ));
        }

        // === 步骤 3: 目标状态必须已知 ===
        if QaStatus::from_db_str(new_status).is_none() {
            return Err(Violation::new(
                ViolationKind::InvalidStatus,
                format!(
                    "Invalid QA status '{}': must be one of Passed, Failed, Quarantine, Pending",
                    new_status
                ),
            ));
        }

        Ok(())
    }
}
