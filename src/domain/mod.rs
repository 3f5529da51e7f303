// ==========================================
// 生产执行校验引擎 - 领域层
// ==========================================
// 职责: 实体与类型定义, 不含业务规则
// ==========================================

pub mod license_plate;
pub mod material;
pub mod reservation;
pub mod types;
pub mod work_order;

pub use license_plate::LicensePlate;
pub use material::WoMaterial;
pub use reservation::LpReservation;
pub use types::{
    IssueKind, OperationStatus, QaStatus, ReservationStatus, RoutingAction, WorkOrderStatus,
};
pub use work_order::{Operation, WorkOrder};
