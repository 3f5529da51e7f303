// ==========================================
// 生产执行校验引擎 - 校验结果类型
// ==========================================
// 职责: 统一的标签化校验结果 (Ok | Err(kind, message))
// 红线: 校验失败走返回值, 不走异常; 所有规则必须输出 reason
// ==========================================

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ==========================================
// ViolationKind - 违规类别
// ==========================================

/// 违规类别
///
/// 调用方按类别做模式匹配, 不解析 reason 字符串
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    // ===== 路由顺序违规 =====
    OrderNotInProgress,
    OperationNotFound,
    OutOfSequence,
    WeightsNotRecorded,

    // ===== 一比一规则违规 =====
    CardinalityMismatch,
    DuplicateInputUnit,
    DuplicateOutputUnit,

    // ===== 谱系/质检违规 =====
    ProductMismatch,
    StageSuffixMismatch,
    QaGateBlocked,

    // ===== 预留违规 =====
    InvalidQuantity,
    NoAvailableQuantity,
    InsufficientQuantity,

    // ===== 监督员覆盖请求违规 =====
    InvalidPinFormat,
    ReasonRequired,
    InvalidStatus,

    // ===== 兜底: 存储层意外失败 =====
    StoreFailure,
}

// ==========================================
// Violation - 违规 (类别 + 可读原因)
// ==========================================

/// 单条违规: 类别 + 操作员可读的原因
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct Violation {
    pub kind: ViolationKind,
    pub message: String,
}

impl Violation {
    /// 构造违规
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// 单条规则的校验结果
pub type RuleResult = Result<(), Violation>;

// ==========================================
// ExecVerdict - 顶层裁决
// ==========================================

/// 编排器的顶层裁决: 所有动作统一返回 {is_valid, reason}
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecVerdict {
    pub is_valid: bool,
    /// 首个失败规则的类别 (通过时为空)
    pub kind: Option<ViolationKind>,
    /// 首个失败规则的原因原文 (通过时为空)
    pub reason: Option<String>,
}

impl ExecVerdict {
    /// 校验通过
    pub fn pass() -> Self {
        Self {
            is_valid: true,
            kind: None,
            reason: None,
        }
    }

    /// 校验失败
    pub fn fail(violation: Violation) -> Self {
        Self {
            is_valid: false,
            kind: Some(violation.kind),
            reason: Some(violation.message),
        }
    }
}

impl From<RuleResult> for ExecVerdict {
    fn from(result: RuleResult) -> Self {
        match result {
            Ok(()) => ExecVerdict::pass(),
            Err(v) => ExecVerdict::fail(v),
        }
    }
}
