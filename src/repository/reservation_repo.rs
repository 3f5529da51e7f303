// ==========================================
// 生产执行校验引擎 - 数量预留数据仓储
// ==========================================
// 红线: 预留创建必须 "检查余量 + 插入" 整体原子.
//       实现: BEGIN IMMEDIATE 事务内重算 active 预留和,
//       余量不足不插入; SQLite 单写者 + busy_timeout 把该
//       事务变成预留的串行化点, 引擎侧校验只是乐观预检
// ==========================================

use crate::domain::types::ReservationStatus;
use crate::domain::LpReservation;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{parse_decimal, parse_timestamp};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

// ==========================================
// ReserveOutcome - 原子预留结果
// ==========================================

/// 原子预留的结果: 竞争失败与校验失败同构返回
#[derive(Debug, Clone)]
pub enum ReserveOutcome {
    Created(LpReservation),
    Insufficient {
        requested: Decimal,
        available: Decimal,
    },
}

// ==========================================
// ReservationRepository - 数量预留仓储
// ==========================================

/// 数量预留仓储
/// 职责: lp_reservation 表的读写与原子预留
pub struct ReservationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReservationRepository {
    /// 从共享连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 列出托盘标签的 active 预留
    pub fn list_active_by_lp(&self, lp_id: &str) -> RepositoryResult<Vec<LpReservation>> {
        let conn = self.get_conn()?;
        Self::list_active_with_conn(&conn, lp_id)
    }

    fn list_active_with_conn(
        conn: &Connection,
        lp_id: &str,
    ) -> RepositoryResult<Vec<LpReservation>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT reservation_id, lp_id, work_order_id, quantity_reserved,
                   status, created_by, created_at, updated_at
            FROM lp_reservation
            WHERE lp_id = ?1 AND status = 'ACTIVE'
            ORDER BY created_at ASC
            "#,
        )?;

        let raw_rows = stmt
            .query_map(params![lp_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut reservations = Vec::with_capacity(raw_rows.len());
        for (id, lp, wo, qty_raw, status_raw, created_by, created_at, updated_at) in raw_rows {
            let status = ReservationStatus::from_db_str(&status_raw).ok_or_else(|| {
                RepositoryError::FieldValueError {
                    field: "lp_reservation.status".to_string(),
                    message: format!("unknown status '{}'", status_raw),
                }
            })?;
            reservations.push(LpReservation {
                reservation_id: id,
                lp_id: lp,
                work_order_id: wo,
                quantity_reserved: parse_decimal("lp_reservation.quantity_reserved", &qty_raw)?,
                status,
                created_by: created_by.clone(),
                created_at: parse_timestamp(&created_at),
                updated_at: parse_timestamp(&updated_at),
            });
        }
        Ok(reservations)
    }

    /// 原子创建预留
    ///
    /// BEGIN IMMEDIATE 事务内: 读在库量 → 重算 active 预留和 →
    /// 余量充足才插入. 事务提交前其他写者被 busy_timeout 挡在外面,
    /// 保证 sum(active) ≤ quantity 恒成立
    pub fn try_reserve(
        &self,
        lp_id: &str,
        work_order_id: &str,
        quantity: Decimal,
        created_by: &str,
    ) -> RepositoryResult<ReserveOutcome> {
        // 非正数预留会反向撑大可用量, 在插入点一律拒绝
        // (引擎侧校验只是乐观预检, 这里是不变量的最后防线)
        if quantity <= Decimal::ZERO {
            return Err(RepositoryError::FieldValueError {
                field: "lp_reservation.quantity_reserved".to_string(),
                message: format!("non-positive quantity '{}'", quantity),
            });
        }

        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        // === 步骤 1: 在库量 ===
        let total_raw: Option<String> = tx
            .query_row(
                "SELECT quantity FROM license_plate WHERE lp_id = ?1",
                params![lp_id],
                |row| row.get(0),
            )
            .optional()?;
        let total = match total_raw {
            Some(raw) => parse_decimal("license_plate.quantity", &raw)?,
            None => {
                return Err(RepositoryError::NotFound {
                    entity: "license_plate".to_string(),
                    id: lp_id.to_string(),
                });
            }
        };

        // === 步骤 2: 事务内重算 active 预留和 ===
        let reserved = {
            let mut stmt = tx.prepare(
                "SELECT quantity_reserved FROM lp_reservation WHERE lp_id = ?1 AND status = 'ACTIVE'",
            )?;
            let raw_rows = stmt
                .query_map(params![lp_id], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            let mut sum = Decimal::ZERO;
            for raw in raw_rows {
                sum += parse_decimal("lp_reservation.quantity_reserved", &raw)?;
            }
            sum
        };

        let available = total - reserved;
        if quantity > available {
            debug!(lp_id, %quantity, %available, "预留竞争失败: 余量不足");
            return Ok(ReserveOutcome::Insufficient {
                requested: quantity,
                available,
            });
        }

        // === 步骤 3: 插入并提交 ===
        let now = Utc::now();
        let reservation = LpReservation {
            reservation_id: Uuid::new_v4().to_string(),
            lp_id: lp_id.to_string(),
            work_order_id: work_order_id.to_string(),
            quantity_reserved: quantity,
            status: ReservationStatus::Active,
            created_by: created_by.to_string(),
            created_at: now,
            updated_at: now,
        };
        tx.execute(
            r#"
            INSERT INTO lp_reservation
                (reservation_id, lp_id, work_order_id, quantity_reserved, status, created_by, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, 'ACTIVE', ?5, ?6, ?7)
            "#,
            params![
                reservation.reservation_id,
                reservation.lp_id,
                reservation.work_order_id,
                reservation.quantity_reserved.to_string(),
                reservation.created_by,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )?;
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(ReserveOutcome::Created(reservation))
    }

    /// 释放预留 (放弃消耗)
    pub fn release(&self, reservation_id: &str) -> RepositoryResult<()> {
        self.transition(reservation_id, ReservationStatus::Released)
    }

    /// 消耗预留 (实扣完成, 终态)
    pub fn consume(&self, reservation_id: &str) -> RepositoryResult<()> {
        self.transition(reservation_id, ReservationStatus::Consumed)
    }

    /// 预留状态迁移: 只允许从 ACTIVE 出发
    fn transition(&self, reservation_id: &str, to: ReservationStatus) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            r#"
            UPDATE lp_reservation
            SET status = ?2, updated_at = ?3
            WHERE reservation_id = ?1 AND status = 'ACTIVE'
            "#,
            params![reservation_id, to.to_db_str(), Utc::now().to_rfc3339()],
        )?;

        if changed == 0 {
            let current: Option<String> = conn
                .query_row(
                    "SELECT status FROM lp_reservation WHERE reservation_id = ?1",
                    params![reservation_id],
                    |row| row.get(0),
                )
                .optional()?;
            return match current {
                Some(status) => Err(RepositoryError::InvalidStateTransition {
                    from: status,
                    to: to.to_db_str().to_string(),
                }),
                None => Err(RepositoryError::NotFound {
                    entity: "lp_reservation".to_string(),
                    id: reservation_id.to_string(),
                }),
            };
        }
        Ok(())
    }
}
