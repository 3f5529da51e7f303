// ==========================================
// 生产执行校验引擎 - 单元测试内存存储
// ==========================================
// 职责: StateStore 的内存 Mock, 供各校验器单元测试复用
// 说明: 仅在 cfg(test) 下编译
// ==========================================

use crate::domain::types::{
    OperationStatus, QaStatus, ReservationStatus, WorkOrderStatus,
};
use crate::domain::{LicensePlate, LpReservation, Operation, WoMaterial, WorkOrder};
use crate::engine::store::{ReservationInsert, StateStore, StoreError, StoreResult};
use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;

// ==========================================
// MockStateStore - 内存状态存储
// ==========================================

/// 内存版状态存储
///
/// 构建器风格填充测试数据; create_reservation 在单把锁内
/// 完成检查+插入, 满足端口的原子性约定
#[derive(Default)]
pub struct MockStateStore {
    work_orders: Mutex<HashMap<String, WorkOrder>>,
    operations: Mutex<HashMap<String, Vec<Operation>>>,
    materials: Mutex<HashMap<(String, i64), Vec<WoMaterial>>>,
    license_plates: Mutex<HashMap<String, LicensePlate>>,
    reservations: Mutex<Vec<LpReservation>>,
    /// 模拟存储层故障: Some 时所有调用返回 Backend 错误
    backend_failure: Mutex<Option<String>>,
}

impl MockStateStore {
    /// 添加执行中工单及 operation_count 个 Pending 工序
    pub fn with_in_progress_wo(
        self,
        work_order_id: &str,
        current_operation_seq: i64,
        operation_count: i64,
    ) -> Self {
        self.insert_wo(work_order_id, WorkOrderStatus::InProgress, current_operation_seq, operation_count);
        self
    }

    /// 添加已完成工单
    pub fn with_completed_wo(
        self,
        work_order_id: &str,
        current_operation_seq: i64,
        operation_count: i64,
    ) -> Self {
        self.insert_wo(work_order_id, WorkOrderStatus::Completed, current_operation_seq, operation_count);
        self
    }

    /// 添加托盘标签
    pub fn with_lp(self, lp_id: &str, product_id: &str, quantity: Decimal, qa_status: QaStatus) -> Self {
        let now = Utc::now();
        self.license_plates.lock().unwrap().insert(
            lp_id.to_string(),
            LicensePlate {
                lp_id: lp_id.to_string(),
                product_id: product_id.to_string(),
                quantity,
                qa_status,
                stage_suffix: None,
                created_at: now,
                updated_at: now,
            },
        );
        self
    }

    /// 添加工单物料行
    pub fn with_material(
        self,
        work_order_id: &str,
        operation_seq: i64,
        material_id: &str,
        one_to_one: bool,
        quantity: Decimal,
    ) -> Self {
        self.materials
            .lock()
            .unwrap()
            .entry((work_order_id.to_string(), operation_seq))
            .or_default()
            .push(WoMaterial {
                work_order_id: work_order_id.to_string(),
                operation_seq,
                material_id: material_id.to_string(),
                one_to_one,
                quantity,
                created_at: Utc::now(),
            });
        self
    }

    /// 添加 active 预留
    pub fn with_active_reservation(self, lp_id: &str, quantity: Decimal) -> Self {
        let now = Utc::now();
        let seq = self.reservations.lock().unwrap().len();
        self.reservations.lock().unwrap().push(LpReservation {
            reservation_id: format!("RSV-{:04}", seq),
            lp_id: lp_id.to_string(),
            work_order_id: "WO-SEED".to_string(),
            quantity_reserved: quantity,
            status: ReservationStatus::Active,
            created_by: "seed".to_string(),
            created_at: now,
            updated_at: now,
        });
        self
    }

    /// 设置托盘标签的阶段后缀
    pub fn with_stage_suffix(self, lp_id: &str, suffix: &str) -> Self {
        if let Some(lp) = self.license_plates.lock().unwrap().get_mut(lp_id) {
            lp.stage_suffix = Some(suffix.to_string());
        }
        self
    }

    /// 录入工序实际重量
    pub fn set_weights(
        &self,
        work_order_id: &str,
        sequence: i64,
        input: Option<Decimal>,
        output: Option<Decimal>,
    ) {
        if let Some(ops) = self.operations.lock().unwrap().get_mut(work_order_id) {
            if let Some(op) = ops.iter_mut().find(|op| op.sequence == sequence) {
                op.actual_input_weight = input;
                op.actual_output_weight = output;
                op.updated_at = Utc::now();
            }
        }
    }

    /// 模拟后续调用全部失败
    pub fn fail_with(&self, message: &str) {
        *self.backend_failure.lock().unwrap() = Some(message.to_string());
    }

    /// 当前 active 预留总量 (断言用)
    pub fn active_reserved_sum(&self, lp_id: &str) -> Decimal {
        self.reservations
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.lp_id == lp_id && r.is_active())
            .map(|r| r.quantity_reserved)
            .sum()
    }

    fn insert_wo(
        &self,
        work_order_id: &str,
        status: WorkOrderStatus,
        current_operation_seq: i64,
        operation_count: i64,
    ) {
        let now = Utc::now();
        self.work_orders.lock().unwrap().insert(
            work_order_id.to_string(),
            WorkOrder {
                work_order_id: work_order_id.to_string(),
                status,
                current_operation_seq,
                created_at: now,
                updated_at: now,
            },
        );
        let ops = (1..=operation_count)
            .map(|sequence| Operation {
                work_order_id: work_order_id.to_string(),
                sequence,
                status: OperationStatus::Pending,
                actual_input_weight: None,
                actual_output_weight: None,
                updated_at: now,
            })
            .collect();
        self.operations
            .lock()
            .unwrap()
            .insert(work_order_id.to_string(), ops);
    }

    fn check_failure(&self) -> StoreResult<()> {
        if let Some(msg) = self.backend_failure.lock().unwrap().as_ref() {
            return Err(StoreError::Backend(msg.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl StateStore for MockStateStore {
    async fn get_work_order(&self, work_order_id: &str) -> StoreResult<Option<WorkOrder>> {
        self.check_failure()?;
        Ok(self.work_orders.lock().unwrap().get(work_order_id).cloned())
    }

    async fn list_operations(&self, work_order_id: &str) -> StoreResult<Vec<Operation>> {
        self.check_failure()?;
        Ok(self
            .operations
            .lock()
            .unwrap()
            .get(work_order_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_materials(
        &self,
        work_order_id: &str,
        operation_seq: i64,
    ) -> StoreResult<Vec<WoMaterial>> {
        self.check_failure()?;
        Ok(self
            .materials
            .lock()
            .unwrap()
            .get(&(work_order_id.to_string(), operation_seq))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_license_plate(&self, lp_id: &str) -> StoreResult<Option<LicensePlate>> {
        self.check_failure()?;
        Ok(self.license_plates.lock().unwrap().get(lp_id).cloned())
    }

    async fn list_active_reservations(&self, lp_id: &str) -> StoreResult<Vec<LpReservation>> {
        self.check_failure()?;
        Ok(self
            .reservations
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.lp_id == lp_id && r.is_active())
            .cloned()
            .collect())
    }

    async fn create_reservation(
        &self,
        lp_id: &str,
        work_order_id: &str,
        quantity: Decimal,
        created_by: &str,
    ) -> StoreResult<ReservationInsert> {
        self.check_failure()?;
        let total = self
            .license_plates
            .lock()
            .unwrap()
            .get(lp_id)
            .map(|lp| lp.quantity)
            .ok_or_else(|| StoreError::NotFound {
                entity: "license_plate".to_string(),
                id: lp_id.to_string(),
            })?;

        // 单把锁内完成检查+插入
        let mut reservations = self.reservations.lock().unwrap();
        let reserved: Decimal = reservations
            .iter()
            .filter(|r| r.lp_id == lp_id && r.is_active())
            .map(|r| r.quantity_reserved)
            .sum();
        let available = total - reserved;
        if quantity > available {
            return Ok(ReservationInsert::InsufficientAvailability {
                requested: quantity,
                available,
            });
        }

        let now = Utc::now();
        let reservation = LpReservation {
            reservation_id: format!("RSV-{:04}", reservations.len()),
            lp_id: lp_id.to_string(),
            work_order_id: work_order_id.to_string(),
            quantity_reserved: quantity,
            status: ReservationStatus::Active,
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
        };
        reservations.push(reservation.clone());
        Ok(ReservationInsert::Created(reservation))
    }
}
