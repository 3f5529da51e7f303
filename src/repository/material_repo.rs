// ==========================================
// 生产执行校验引擎 - 工单物料数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::WoMaterial;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{parse_decimal, parse_timestamp};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// WoMaterialRepository - 工单物料仓储
// ==========================================

/// 工单物料仓储
/// 职责: wo_material 表的读写
pub struct WoMaterialRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WoMaterialRepository {
    /// 从共享连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 列出工单+工序的物料行
    pub fn list_by_operation(
        &self,
        work_order_id: &str,
        operation_seq: i64,
    ) -> RepositoryResult<Vec<WoMaterial>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT work_order_id, operation_seq, material_id, one_to_one, quantity, created_at
            FROM wo_material
            WHERE work_order_id = ?1 AND operation_seq = ?2
            ORDER BY material_id ASC
            "#,
        )?;

        let raw_rows = stmt
            .query_map(params![work_order_id, operation_seq], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, bool>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut materials = Vec::with_capacity(raw_rows.len());
        for (wo_id, seq, material_id, one_to_one, quantity_raw, created_at) in raw_rows {
            materials.push(WoMaterial {
                work_order_id: wo_id,
                operation_seq: seq,
                material_id,
                one_to_one,
                quantity: parse_decimal("wo_material.quantity", &quantity_raw)?,
                created_at: parse_timestamp(&created_at),
            });
        }
        Ok(materials)
    }

    /// 插入物料行
    pub fn insert(&self, material: &WoMaterial) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO wo_material
                (work_order_id, operation_seq, material_id, one_to_one, quantity, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                material.work_order_id,
                material.operation_seq,
                material.material_id,
                material.one_to_one,
                material.quantity.to_string(),
                material.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}
