// ==========================================
// 生产执行校验引擎 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为 (外键每连接开启)
// - 统一 busy_timeout, 减少并发写入时的偶发 busy 错误
//   (预留原子插入依赖单写者事务, busy_timeout 吸收排队等待)
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout (毫秒)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明:
/// - foreign_keys 需要每个连接单独开启
/// - busy_timeout 需要每个连接单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化执行校验相关表结构
///
/// 数量/重量以 TEXT 存储十进制原文, 读写两侧走 rust_decimal,
/// 避免浮点列在边界值上的假阴/假阳
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS work_order (
            work_order_id          TEXT PRIMARY KEY,
            status                 TEXT NOT NULL,
            current_operation_seq  INTEGER NOT NULL DEFAULT 1,
            created_at             TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at             TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS wo_operation (
            work_order_id          TEXT NOT NULL REFERENCES work_order(work_order_id) ON DELETE CASCADE,
            sequence               INTEGER NOT NULL,
            status                 TEXT NOT NULL DEFAULT 'PENDING',
            actual_input_weight    TEXT,
            actual_output_weight   TEXT,
            updated_at             TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (work_order_id, sequence)
        );

        CREATE TABLE IF NOT EXISTS wo_material (
            work_order_id          TEXT NOT NULL REFERENCES work_order(work_order_id) ON DELETE CASCADE,
            operation_seq          INTEGER NOT NULL,
            material_id            TEXT NOT NULL,
            one_to_one             INTEGER NOT NULL DEFAULT 0,
            quantity               TEXT NOT NULL,
            created_at             TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (work_order_id, operation_seq, material_id)
        );

        CREATE TABLE IF NOT EXISTS license_plate (
            lp_id                  TEXT PRIMARY KEY,
            product_id             TEXT NOT NULL,
            quantity               TEXT NOT NULL,
            qa_status              TEXT NOT NULL DEFAULT 'Pending',
            stage_suffix           TEXT,
            created_at             TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at             TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS lp_reservation (
            reservation_id         TEXT PRIMARY KEY,
            lp_id                  TEXT NOT NULL REFERENCES license_plate(lp_id),
            work_order_id          TEXT NOT NULL,
            quantity_reserved      TEXT NOT NULL,
            status                 TEXT NOT NULL DEFAULT 'ACTIVE',
            created_by             TEXT NOT NULL,
            created_at             TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at             TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_lp_reservation_lp_status
            ON lp_reservation (lp_id, status);
        "#,
    )?;
    Ok(())
}
