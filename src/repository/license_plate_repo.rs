// ==========================================
// 生产执行校验引擎 - 托盘标签数据仓储
// ==========================================
// 红线: qa_status 只经 update_qa_status 修改 (质检流程或
//       监督员覆盖路径的调用方); quantity 由消耗/产出事件修改
// ==========================================

use crate::domain::types::QaStatus;
use crate::domain::LicensePlate;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{parse_decimal, parse_timestamp};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// LicensePlateRepository - 托盘标签仓储
// ==========================================

/// 托盘标签仓储
/// 职责: license_plate 表的读写
pub struct LicensePlateRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LicensePlateRepository {
    /// 从共享连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按ID查询托盘标签
    pub fn find_by_id(&self, lp_id: &str) -> RepositoryResult<Option<LicensePlate>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT lp_id, product_id, quantity, qa_status, stage_suffix, created_at, updated_at
            FROM license_plate
            WHERE lp_id = ?1
            "#,
        )?;

        let raw = stmt
            .query_row(params![lp_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                ))
            })
            .optional()?;

        let Some((id, product_id, quantity_raw, qa_raw, stage_suffix, created_at, updated_at)) = raw
        else {
            return Ok(None);
        };

        let qa_status = QaStatus::from_db_str(&qa_raw).ok_or_else(|| {
            RepositoryError::FieldValueError {
                field: "license_plate.qa_status".to_string(),
                message: format!("unknown QA status '{}'", qa_raw),
            }
        })?;

        Ok(Some(LicensePlate {
            lp_id: id,
            product_id,
            quantity: parse_decimal("license_plate.quantity", &quantity_raw)?,
            qa_status,
            stage_suffix,
            created_at: parse_timestamp(&created_at),
            updated_at: parse_timestamp(&updated_at),
        }))
    }

    /// 插入托盘标签
    pub fn insert(&self, lp: &LicensePlate) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO license_plate
                (lp_id, product_id, quantity, qa_status, stage_suffix, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                lp.lp_id,
                lp.product_id,
                lp.quantity.to_string(),
                lp.qa_status.to_db_str(),
                lp.stage_suffix,
                lp.created_at.to_rfc3339(),
                lp.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// 更新质检状态
    ///
    /// 调用方须先通过覆盖请求校验 (validate_qa_override) 或质检流程
    pub fn update_qa_status(&self, lp_id: &str, qa_status: QaStatus) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let changed = conn.execute(
            r#"
            UPDATE license_plate
            SET qa_status = ?2, updated_at = ?3
            WHERE lp_id = ?1
            "#,
            params![lp_id, qa_status.to_db_str(), Utc::now().to_rfc3339()],
        )?;

        if changed == 0 {
            return Err(RepositoryError::NotFound {
                entity: "license_plate".to_string(),
                id: lp_id.to_string(),
            });
        }
        Ok(())
    }
}
