// ==========================================
// 生产执行校验引擎 - 核心库
// ==========================================
// 系统定位: 制造执行系统的业务规则门禁
// 职责: 回答 "该操作员动作是否允许", 不执行变更
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    IssueKind, OperationStatus, QaStatus, ReservationStatus, RoutingAction, WorkOrderStatus,
};

// 领域实体
pub use domain::{LicensePlate, LpReservation, Operation, WoMaterial, WorkOrder};

// 引擎
pub use engine::{
    AvailabilityCheck, CrossOrderCheck, CrossOrderValidator, ExecVerdict, ExecutionOrchestrator,
    OneToOneCheck, OneToOneValidator, QualityGateValidator, ReservationInsert,
    ReservationLedgerValidator, RuleResult, SequentialRoutingValidator, StateStore, StoreError,
    ValidationPolicy, Violation, ViolationKind,
};

// 仓储
pub use repository::{RepositoryError, RepositoryResult, SqliteStateStore};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "生产执行校验引擎";
