// ==========================================
// 生产执行校验引擎 - 预留台账校验器
// ==========================================
// 职责: 计算托盘标签的可用量 = 在库量 - active 预留量,
//       并校验新预留请求不超过可用量
// 红线: 数量为精确十进制, 不走浮点; qty == available 必须放行
// 说明: 本校验器只回答 "是否有余量", 预留行的真正写入
//       由存储层原子插入完成 (乐观预检 + 原子兜底, 见 §并发)
// ==========================================

use crate::engine::result::{RuleResult, Violation, ViolationKind};
use crate::engine::store::{StateStore, StoreError};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

// ==========================================
// AvailabilityCheck - 可用量快照
// ==========================================

/// 可用量快照
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityCheck {
    pub lp_id: String,
    pub total_qty: Decimal,
    pub reserved_qty: Decimal,
    pub available_qty: Decimal,
    pub can_reserve: bool,
}

// ==========================================
// ReservationLedgerValidator - 预留台账校验器
// ==========================================

/// 预留台账校验器
pub struct ReservationLedgerValidator<S>
where
    S: StateStore,
{
    store: Arc<S>,
}

impl<S> ReservationLedgerValidator<S>
where
    S: StateStore,
{
    /// 创建新的预留台账校验器
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// 计算托盘标签的可用量
    ///
    /// # 返回
    /// - Ok(AvailabilityCheck): 快照 {总量, 已预留, 可用, 可否预留}
    /// - Err(StoreError): 托盘标签不存在或存储层失败
    #[instrument(skip(self), fields(lp_id = %lp_id))]
    pub async fn check_available_quantity(
        &self,
        lp_id: &str,
    ) -> Result<AvailabilityCheck, StoreError> {
        let lp = self
            .store
            .get_license_plate(lp_id)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                entity: "license_plate".to_string(),
                id: lp_id.to_string(),
            })?;

        let reservations = self.store.list_active_reservations(lp_id).await?;
        let reserved_qty: Decimal = reservations.iter().map(|r| r.quantity_reserved).sum();
        let available_qty = lp.quantity - reserved_qty;

        Ok(AvailabilityCheck {
            lp_id: lp_id.to_string(),
            total_qty: lp.quantity,
            reserved_qty,
            available_qty,
            can_reserve: available_qty > Decimal::ZERO,
        })
    }

    /// 校验预留请求
    ///
    /// # 参数
    /// - lp_id: 托盘标签ID
    /// - requested_qty: 请求预留数量
    ///
    /// # 返回
    /// - Ok(Ok(())): 余量充足
    /// - Ok(Err(Violation)): 无可用量 / 余量不足
    #[instrument(skip(self), fields(lp_id = %lp_id, requested_qty = %requested_qty))]
    pub async fn validate_reservation(
        &self,
        lp_id: &str,
        requested_qty: Decimal,
    ) -> Result<RuleResult, StoreError> {
        // 非正数请求会把可用量算大, 先于一切余量判断拒绝
        if requested_qty <= Decimal::ZERO {
            return Ok(Err(Violation::new(
                ViolationKind::InvalidQuantity,
                format!(
                    "Requested quantity {} must be a positive amount",
                    requested_qty
                ),
            )));
        }

        let check = self.check_available_quantity(lp_id).await?;

        if !check.can_reserve {
            return Ok(Err(Violation::new(
                ViolationKind::NoAvailableQuantity,
                format!(
                    "License plate {} has no available quantity (total: {}, reserved: {})",
                    lp_id, check.total_qty, check.reserved_qty
                ),
            )));
        }

        if requested_qty > check.available_qty {
            return Ok(Err(Violation::new(
                ViolationKind::InsufficientQuantity,
                format!(
                    "Requested quantity {} exceeds available quantity {} on license plate {} (total: {}, reserved: {})",
                    requested_qty, check.available_qty, lp_id, check.total_qty, check.reserved_qty
                ),
            )));
        }

        Ok(Ok(()))
    }
}
