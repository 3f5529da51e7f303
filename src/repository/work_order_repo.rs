// ==========================================
// 生产执行校验引擎 - 工单/工序数据仓储
// ==========================================
// 红线: current_operation_seq 的推进必须 CAS 写入
//       (条件 UPDATE, 旧值不匹配即拒绝), 防止两个并发
//       "开工 N" 同时通过校验后双双推进
// ==========================================

use crate::domain::types::{OperationStatus, WorkOrderStatus};
use crate::domain::{Operation, WorkOrder};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{parse_decimal_opt, parse_timestamp};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// WorkOrderRepository - 工单仓储
// ==========================================

/// 工单仓储
/// 职责: work_order 表的读写
pub struct WorkOrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WorkOrderRepository {
    /// 从共享连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按ID查询工单
    pub fn find_by_id(&self, work_order_id: &str) -> RepositoryResult<Option<WorkOrder>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT work_order_id, status, current_operation_seq, created_at, updated_at
            FROM work_order
            WHERE work_order_id = ?1
            "#,
        )?;

        let raw = stmt
            .query_row(params![work_order_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })
            .optional()?;

        let Some((id, status_raw, current_operation_seq, created_at, updated_at)) = raw else {
            return Ok(None);
        };

        let status = WorkOrderStatus::from_db_str(&status_raw).ok_or_else(|| {
            RepositoryError::FieldValueError {
                field: "work_order.status".to_string(),
                message: format!("unknown status '{}'", status_raw),
            }
        })?;

        Ok(Some(WorkOrder {
            work_order_id: id,
            status,
            current_operation_seq,
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
        }))
    }

    /// 插入工单
    pub fn insert(&self, work_order: &WorkOrder) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO work_order (work_order_id, status, current_operation_seq, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                work_order.work_order_id,
                work_order.status.to_db_str(),
                work_order.current_operation_seq,
                work_order.created_at.to_rfc3339(),
                work_order.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// CAS 推进当前工序序号
    ///
    /// 仅当 current_operation_seq 仍等于 expected_seq 时写入 next_seq;
    /// 旧值已被并发请求推进时返回 InvalidStateTransition
    pub fn advance_current_operation(
        &self,
        work_order_id: &str,
        expected_seq: i64,
        next_seq: i64,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            r#"
            UPDATE work_order
            SET current_operation_seq = ?3, updated_at = ?4
            WHERE work_order_id = ?1 AND current_operation_seq = ?2 AND status = 'IN_PROGRESS'
            "#,
            params![work_order_id, expected_seq, next_seq, Utc::now().to_rfc3339()],
        )?;

        if changed == 0 {
            return Err(RepositoryError::InvalidStateTransition {
                from: format!("current_operation_seq={}", expected_seq),
                to: format!("current_operation_seq={}", next_seq),
            });
        }
        Ok(())
    }
}

// ==========================================
// OperationRepository - 工序仓储
// ==========================================

/// 工序仓储
/// 职责: wo_operation 表的读写
pub struct OperationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OperationRepository {
    /// 从共享连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 列出工单全部工序 (按 sequence 升序)
    pub fn list_by_work_order(&self, work_order_id: &str) -> RepositoryResult<Vec<Operation>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT work_order_id, sequence, status,
                   actual_input_weight, actual_output_weight, updated_at
            FROM wo_operation
            WHERE work_order_id = ?1
            ORDER BY sequence ASC
            "#,
        )?;

        let raw_rows = stmt
            .query_map(params![work_order_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut operations = Vec::with_capacity(raw_rows.len());
        for (wo_id, sequence, status_raw, input_raw, output_raw, updated_at) in raw_rows {
            let status = OperationStatus::from_db_str(&status_raw).ok_or_else(|| {
                RepositoryError::FieldValueError {
                    field: "wo_operation.status".to_string(),
                    message: format!("unknown status '{}'", status_raw),
                }
            })?;
            operations.push(Operation {
                work_order_id: wo_id,
                sequence,
                status,
                actual_input_weight: parse_decimal_opt("wo_operation.actual_input_weight", input_raw)?,
                actual_output_weight: parse_decimal_opt("wo_operation.actual_output_weight", output_raw)?,
                updated_at: parse_timestamp(&updated_at),
            });
        }
        Ok(operations)
    }

    /// 插入工序
    pub fn insert(&self, operation: &Operation) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO wo_operation
                (work_order_id, sequence, status, actual_input_weight, actual_output_weight, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                operation.work_order_id,
                operation.sequence,
                operation.status.to_db_str(),
                operation.actual_input_weight.map(|d| d.to_string()),
                operation.actual_output_weight.map(|d| d.to_string()),
                operation.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// 录入工序实际重量
    pub fn record_weights(
        &self,
        work_order_id: &str,
        sequence: i64,
        input_weight: Decimal,
        output_weight: Decimal,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            r#"
            UPDATE wo_operation
            SET actual_input_weight = ?3, actual_output_weight = ?4, updated_at = ?5
            WHERE work_order_id = ?1 AND sequence = ?2
            "#,
            params![
                work_order_id,
                sequence,
                input_weight.to_string(),
                output_weight.to_string(),
                Utc::now().to_rfc3339(),
            ],
        )?;

        if changed == 0 {
            return Err(RepositoryError::NotFound {
                entity: "wo_operation".to_string(),
                id: format!("{}#{}", work_order_id, sequence),
            });
        }
        Ok(())
    }
}
