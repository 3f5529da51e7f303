// ==========================================
// 生产执行校验引擎 - 领域类型定义
// ==========================================
// 职责: 工单/工序/质检/预留状态枚举
// 红线: 枚举值与数据库存储字符串一一对应
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 工单状态 (Work Order Status)
// ==========================================
// 生命周期: draft → released → in_progress ⇄ paused → completed
// cancelled 可从任意非终态进入; 本引擎只读该状态, 不做迁移
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkOrderStatus {
    Draft,      // 草稿
    Released,   // 已下达
    InProgress, // 执行中 (唯一可操作状态)
    Paused,     // 暂停
    Completed,  // 已完成
    Cancelled,  // 已取消
}

impl fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkOrderStatus::Draft => write!(f, "DRAFT"),
            WorkOrderStatus::Released => write!(f, "RELEASED"),
            WorkOrderStatus::InProgress => write!(f, "IN_PROGRESS"),
            WorkOrderStatus::Paused => write!(f, "PAUSED"),
            WorkOrderStatus::Completed => write!(f, "COMPLETED"),
            WorkOrderStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl WorkOrderStatus {
    /// 从数据库字符串解析状态
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DRAFT" => Some(WorkOrderStatus::Draft),
            "RELEASED" => Some(WorkOrderStatus::Released),
            "IN_PROGRESS" => Some(WorkOrderStatus::InProgress),
            "PAUSED" => Some(WorkOrderStatus::Paused),
            "COMPLETED" => Some(WorkOrderStatus::Completed),
            "CANCELLED" => Some(WorkOrderStatus::Cancelled),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            WorkOrderStatus::Draft => "DRAFT",
            WorkOrderStatus::Released => "RELEASED",
            WorkOrderStatus::InProgress => "IN_PROGRESS",
            WorkOrderStatus::Paused => "PAUSED",
            WorkOrderStatus::Completed => "COMPLETED",
            WorkOrderStatus::Cancelled => "CANCELLED",
        }
    }
}

// ==========================================
// 工序状态 (Operation Status)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    Pending,    // 未开始
    InProgress, // 执行中
    Completed,  // 已完成
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationStatus::Pending => write!(f, "PENDING"),
            OperationStatus::InProgress => write!(f, "IN_PROGRESS"),
            OperationStatus::Completed => write!(f, "COMPLETED"),
        }
    }
}

impl OperationStatus {
    /// 从数据库字符串解析状态
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(OperationStatus::Pending),
            "IN_PROGRESS" => Some(OperationStatus::InProgress),
            "COMPLETED" => Some(OperationStatus::Completed),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            OperationStatus::Pending => "PENDING",
            OperationStatus::InProgress => "IN_PROGRESS",
            OperationStatus::Completed => "COMPLETED",
        }
    }
}

// ==========================================
// 质检状态 (QA Status)
// ==========================================
// 存储格式: PascalCase (沿用上游 MES 的标签值, 如 "Quarantine")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QaStatus {
    Pending,    // 待检
    Passed,     // 合格
    Failed,     // 不合格
    Quarantine, // 隔离
}

impl fmt::Display for QaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QaStatus::Pending => write!(f, "Pending"),
            QaStatus::Passed => write!(f, "Passed"),
            QaStatus::Failed => write!(f, "Failed"),
            QaStatus::Quarantine => write!(f, "Quarantine"),
        }
    }
}

impl QaStatus {
    /// 从数据库字符串解析状态 (大小写不敏感)
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PENDING" => Some(QaStatus::Pending),
            "PASSED" => Some(QaStatus::Passed),
            "FAILED" => Some(QaStatus::Failed),
            "QUARANTINE" => Some(QaStatus::Quarantine),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            QaStatus::Pending => "Pending",
            QaStatus::Passed => "Passed",
            QaStatus::Failed => "Failed",
            QaStatus::Quarantine => "Quarantine",
        }
    }
}

// ==========================================
// 预留状态 (Reservation Status)
// ==========================================
// 生命周期: active → released (放弃) | consumed (终态, 实扣)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Active,   // 占用中
    Released, // 已释放
    Consumed, // 已消耗
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReservationStatus::Active => write!(f, "ACTIVE"),
            ReservationStatus::Released => write!(f, "RELEASED"),
            ReservationStatus::Consumed => write!(f, "CONSUMED"),
        }
    }
}

impl ReservationStatus {
    /// 从数据库字符串解析状态
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Some(ReservationStatus::Active),
            "RELEASED" => Some(ReservationStatus::Released),
            "CONSUMED" => Some(ReservationStatus::Consumed),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ReservationStatus::Active => "ACTIVE",
            ReservationStatus::Released => "RELEASED",
            ReservationStatus::Consumed => "CONSUMED",
        }
    }
}

// ==========================================
// 工序动作 (Routing Action)
// ==========================================
// 顺序校验器按动作区分规则: complete 额外要求重量已录入
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoutingAction {
    Start,         // 开工
    RecordWeights, // 录入重量
    Complete,      // 完工
}

impl fmt::Display for RoutingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingAction::Start => write!(f, "START"),
            RoutingAction::RecordWeights => write!(f, "RECORD_WEIGHTS"),
            RoutingAction::Complete => write!(f, "COMPLETE"),
        }
    }
}

// ==========================================
// 发料/产出类型 (Issue Kind)
// ==========================================
// 仅用于审计措辞, 质检门禁规则对两者一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    WoIssue,  // 工单发料 (消耗)
    WoOutput, // 工单产出登记
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::WoIssue => write!(f, "WO_ISSUE"),
            IssueKind::WoOutput => write!(f, "WO_OUTPUT"),
        }
    }
}
