// ==========================================
// 生产执行校验引擎 - 校验策略配置
// ==========================================
// 职责: 引擎级开关, 构造时注入编排器
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// ValidationPolicy - 校验策略
// ==========================================

/// 校验策略
///
/// Default 即生产行为: 阶段后缀匹配保持关闭
/// (上游系统声明了该字段但从未接线, 语义待定)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ValidationPolicy {
    /// 跨单投料时是否强制阶段后缀匹配
    pub enforce_stage_suffix: bool,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            enforce_stage_suffix: false,
        }
    }
}
