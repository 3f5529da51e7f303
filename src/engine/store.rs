// ==========================================
// 生产执行校验引擎 - 状态存储端口
// ==========================================
// 职责: 校验器对持久层的唯一依赖 (依赖注入)
// 红线: 校验器只读; 引擎隐含的唯一写入 (预留创建)
//       必须由实现方保证原子性 (见 SqliteStateStore)
// ==========================================

use crate::domain::{LicensePlate, LpReservation, Operation, WoMaterial, WorkOrder};
use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

// ==========================================
// StoreError - 存储层错误
// ==========================================

/// 存储端口错误
///
/// 引擎在链路的每一步捕获该错误并包装为 StoreFailure 裁决,
/// 不向编排器边界外抛出
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    #[error("store backend failure: {0}")]
    Backend(String),

    #[error("store call cancelled or timed out: {0}")]
    Cancelled(String),
}

/// 存储端口 Result 别名
pub type StoreResult<T> = Result<T, StoreError>;

// ==========================================
// ReservationInsert - 原子预留插入结果
// ==========================================

/// 原子预留插入的结果
///
/// 竞争失败 (检查-插入窗口内余量被占) 通过 InsufficientAvailability
/// 返回, 与校验失败同构, 不是另一类错误
#[derive(Debug, Clone)]
pub enum ReservationInsert {
    Created(LpReservation),
    InsufficientAvailability {
        requested: Decimal,
        available: Decimal,
    },
}

// ==========================================
// StateStore - 状态存储端口
// ==========================================

/// 状态存储端口: 工单/工序/物料/托盘标签/预留的读写访问
///
/// 校验器全部通过该端口读取快照; 单元测试以内存 Mock 替换
#[async_trait]
pub trait StateStore: Send + Sync {
    /// 读取工单
    async fn get_work_order(&self, work_order_id: &str) -> StoreResult<Option<WorkOrder>>;

    /// 列出工单的全部工序 (按 sequence 升序)
    async fn list_operations(&self, work_order_id: &str) -> StoreResult<Vec<Operation>>;

    /// 读取指定序号的工序
    async fn get_operation(
        &self,
        work_order_id: &str,
        sequence: i64,
    ) -> StoreResult<Option<Operation>> {
        let operations = self.list_operations(work_order_id).await?;
        Ok(operations.into_iter().find(|op| op.sequence == sequence))
    }

    /// 列出工单+工序的物料行
    async fn list_materials(
        &self,
        work_order_id: &str,
        operation_seq: i64,
    ) -> StoreResult<Vec<WoMaterial>>;

    /// 读取托盘标签
    async fn get_license_plate(&self, lp_id: &str) -> StoreResult<Option<LicensePlate>>;

    /// 列出托盘标签的 active 预留
    async fn list_active_reservations(&self, lp_id: &str) -> StoreResult<Vec<LpReservation>>;

    /// 原子创建预留
    ///
    /// 实现方必须保证 "检查余量 + 插入" 整体原子
    /// (事务或条件插入), 余量不足以 ReservationInsert 形式返回
    async fn create_reservation(
        &self,
        lp_id: &str,
        work_order_id: &str,
        quantity: Decimal,
        created_by: &str,
    ) -> StoreResult<ReservationInsert>;
}
