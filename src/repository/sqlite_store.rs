// ==========================================
// 生产执行校验引擎 - SQLite 状态存储
// ==========================================
// 职责: StateStore 端口的参考实现, 组合各实体仓储
// 说明: 每个实例持有自己的连接; 并发写者各开实例,
//       由 BEGIN IMMEDIATE + busy_timeout 在文件层串行化
// ==========================================

use crate::db;
use crate::domain::{LicensePlate, LpReservation, Operation, WoMaterial, WorkOrder};
use crate::engine::store::{ReservationInsert, StateStore, StoreError, StoreResult};
use crate::repository::error::RepositoryError;
use crate::repository::reservation_repo::ReserveOutcome;
use crate::repository::{
    LicensePlateRepository, ReservationRepository, WoMaterialRepository, WorkOrderRepository,
    OperationRepository,
};
use async_trait::async_trait;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex};

/// 仓储错误映射到存储端口错误
fn map_repo_err(err: RepositoryError) -> StoreError {
    match err {
        RepositoryError::NotFound { entity, id } => StoreError::NotFound { entity, id },
        other => {
            // rusqlite 的 interrupt/超时以消息形式上来, 按取消处理
            let msg = other.to_string();
            if msg.contains("interrupted") {
                StoreError::Cancelled(msg)
            } else {
                StoreError::Backend(msg)
            }
        }
    }
}

// ==========================================
// SqliteStateStore - SQLite 状态存储
// ==========================================

/// SQLite 状态存储
pub struct SqliteStateStore {
    work_orders: WorkOrderRepository,
    operations: OperationRepository,
    materials: WoMaterialRepository,
    license_plates: LicensePlateRepository,
    reservations: ReservationRepository,
}

impl SqliteStateStore {
    /// 打开数据库文件并构建存储 (应用统一 PRAGMA)
    pub fn open(db_path: &str) -> Result<Self, RepositoryError> {
        let conn = db::open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self::from_connection(Arc::new(Mutex::new(conn))))
    }

    /// 从已有连接构建存储
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            work_orders: WorkOrderRepository::new(conn.clone()),
            operations: OperationRepository::new(conn.clone()),
            materials: WoMaterialRepository::new(conn.clone()),
            license_plates: LicensePlateRepository::new(conn.clone()),
            reservations: ReservationRepository::new(conn),
        }
    }

    /// 工单仓储 (生命周期动作的 CAS 推进入口)
    pub fn work_orders(&self) -> &WorkOrderRepository {
        &self.work_orders
    }

    /// 工序仓储
    pub fn operations(&self) -> &OperationRepository {
        &self.operations
    }

    /// 物料仓储
    pub fn materials(&self) -> &WoMaterialRepository {
        &self.materials
    }

    /// 托盘标签仓储
    pub fn license_plates(&self) -> &LicensePlateRepository {
        &self.license_plates
    }

    /// 预留仓储 (释放/消耗迁移入口)
    pub fn reservations(&self) -> &ReservationRepository {
        &self.reservations
    }
}

#[async_trait]
impl StateStore for SqliteStateStore {
    async fn get_work_order(&self, work_order_id: &str) -> StoreResult<Option<WorkOrder>> {
        self.work_orders.find_by_id(work_order_id).map_err(map_repo_err)
    }

    async fn list_operations(&self, work_order_id: &str) -> StoreResult<Vec<Operation>> {
        self.operations
            .list_by_work_order(work_order_id)
            .map_err(map_repo_err)
    }

    async fn list_materials(
        &self,
        work_order_id: &str,
        operation_seq: i64,
    ) -> StoreResult<Vec<WoMaterial>> {
        self.materials
            .list_by_operation(work_order_id, operation_seq)
            .map_err(map_repo_err)
    }

    async fn get_license_plate(&self, lp_id: &str) -> StoreResult<Option<LicensePlate>> {
        self.license_plates.find_by_id(lp_id).map_err(map_repo_err)
    }

    async fn list_active_reservations(&self, lp_id: &str) -> StoreResult<Vec<LpReservation>> {
        self.reservations
            .list_active_by_lp(lp_id)
            .map_err(map_repo_err)
    }

    async fn create_reservation(
        &self,
        lp_id: &str,
        work_order_id: &str,
        quantity: Decimal,
        created_by: &str,
    ) -> StoreResult<ReservationInsert> {
        let outcome = self
            .reservations
            .try_reserve(lp_id, work_order_id, quantity, created_by)
            .map_err(map_repo_err)?;

        Ok(match outcome {
            ReserveOutcome::Created(reservation) => ReservationInsert::Created(reservation),
            ReserveOutcome::Insufficient {
                requested,
                available,
            } => ReservationInsert::InsufficientAvailability {
                requested,
                available,
            },
        })
    }
}
