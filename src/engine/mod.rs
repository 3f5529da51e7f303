// ==========================================
// 生产执行校验引擎 - 引擎层
// ==========================================
// 职责: 业务规则门禁; 校验器只读存储, 不执行变更
// 红线: 所有规则必须输出 reason; 失败走返回值不走异常
// ==========================================

pub mod cardinality;
pub mod genealogy;
pub mod orchestrator;
pub mod policy;
pub mod quality;
pub mod reservation;
pub mod result;
pub mod routing;
pub mod store;

#[cfg(test)]
pub mod testing;

// 重导出核心类型
pub use cardinality::{OneToOneCheck, OneToOneValidator};
pub use genealogy::{CrossOrderCheck, CrossOrderValidator};
pub use orchestrator::ExecutionOrchestrator;
pub use policy::ValidationPolicy;
pub use quality::QualityGateValidator;
pub use reservation::{AvailabilityCheck, ReservationLedgerValidator};
pub use result::{ExecVerdict, RuleResult, Violation, ViolationKind};
pub use routing::SequentialRoutingValidator;
pub use store::{ReservationInsert, StateStore, StoreError, StoreResult};
