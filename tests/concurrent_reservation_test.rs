// ==========================================
// 并发预留控制测试
// ==========================================
// 职责: 验证原子预留在多写者竞争下的不变量
//       sum(active reservations) <= license_plate.quantity
// ==========================================


use mes_exec_validation::domain::types::QaStatus;
use mes_exec_validation::engine::{ReservationInsert, StateStore};
use mes_exec_validation::repository::{ReserveOutcome, SqliteStateStore};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::thread;

use crate::test_helpers::{create_test_db, seed_in_progress_wo, seed_lp, seed_material};

fn dec(value: i64) -> Decimal {
    Decimal::new(value, 0)
}

/// 8 个写者各开自己的连接抢同一托盘标签: 总量 10, 每人要 3
///
/// BEGIN IMMEDIATE + busy_timeout 把预留事务串行化,
/// 恰好 3 个成功 (3*3=9 <= 10), 第 4 个起余量只剩 1
#[test]
fn test_concurrent_reservations_never_oversubscribe() {
    let (_tmp, db_path) = create_test_db().unwrap();
    {
        let store = SqliteStateStore::open(&db_path).unwrap();
        seed_in_progress_wo(&store, "WO-001", 1, 1).unwrap();
        seed_material(&store, "WO-001", 1, "PROD-A", false, dec(100)).unwrap();
        seed_lp(&store, "LP-001", "PROD-A", dec(10), QaStatus::Passed).unwrap();
    }

    let mut handles = Vec::new();
    for worker in 0..8 {
        let path = db_path.clone();
        handles.push(thread::spawn(move || {
            let store = SqliteStateStore::open(&path).unwrap();
            let actor = format!("operator-{}", worker);
            store
                .reservations()
                .try_reserve("LP-001", "WO-001", dec(3), &actor)
                .unwrap()
        }));
    }

    let outcomes: Vec<ReserveOutcome> = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .collect();

    let created = outcomes
        .iter()
        .filter(|o| matches!(o, ReserveOutcome::Created(_)))
        .count();
    assert_eq!(created, 3, "恰好 3 个预留成功");

    // 不变量: active 预留和不超过在库量
    let store = SqliteStateStore::open(&db_path).unwrap();
    let reservations = store.reservations().list_active_by_lp("LP-001").unwrap();
    let reserved: Decimal = reservations.iter().map(|r| r.quantity_reserved).sum();
    assert_eq!(reservations.len(), 3);
    assert!(reserved <= dec(10));
    assert_eq!(reserved, dec(9));
}

/// 最后一单位竞争: 总量 1, 10 个写者各要 1, 仅 1 人得手
#[test]
fn test_last_unit_race_single_winner() {
    let (_tmp, db_path) = create_test_db().unwrap();
    {
        let store = SqliteStateStore::open(&db_path).unwrap();
        seed_lp(&store, "LP-LAST", "PROD-A", dec(1), QaStatus::Passed).unwrap();
    }

    let mut handles = Vec::new();
    for worker in 0..10 {
        let path = db_path.clone();
        handles.push(thread::spawn(move || {
            let store = SqliteStateStore::open(&path).unwrap();
            let actor = format!("operator-{}", worker);
            store
                .reservations()
                .try_reserve("LP-LAST", "WO-001", dec(1), &actor)
                .unwrap()
        }));
    }

    let mut winners = 0;
    let mut losers = 0;
    for handle in handles {
        match handle.join().unwrap() {
            ReserveOutcome::Created(_) => winners += 1,
            ReserveOutcome::Insufficient { available, .. } => {
                // 输家看到的余量必须是 0
                assert_eq!(available, Decimal::ZERO);
                losers += 1;
            }
        }
    }
    assert_eq!(winners, 1);
    assert_eq!(losers, 9);
}

/// 校验通过后被抢先: 乐观预检放行, 原子插入兜底拒绝
///
/// 输家得到的是 InsufficientAvailability 结果, 不是错误
#[tokio::test]
async fn test_validate_then_reserve_loser_gets_result_not_error() {
    let (_tmp, db_path) = create_test_db().unwrap();
    let store = Arc::new(SqliteStateStore::open(&db_path).unwrap());
    seed_lp(&store, "LP-001", "PROD-A", dec(5), QaStatus::Passed).unwrap();

    // 两个调用方都先通过余量校验 (各要 5, 余量 5)
    let validator =
        mes_exec_validation::engine::ReservationLedgerValidator::new(store.clone());
    assert!(validator.validate_reservation("LP-001", dec(5)).await.unwrap().is_ok());

    // 第一个写者落库
    let first = store
        .create_reservation("LP-001", "WO-001", dec(5), "operator-1")
        .await
        .unwrap();
    assert!(matches!(first, ReservationInsert::Created(_)));

    // 第二个写者提交时余量已被抢走: 结果形态而非 Err
    let second = store
        .create_reservation("LP-001", "WO-002", dec(5), "operator-2")
        .await
        .unwrap();
    match second {
        ReservationInsert::InsufficientAvailability {
            requested,
            available,
        } => {
            assert_eq!(requested, dec(5));
            assert_eq!(available, Decimal::ZERO);
        }
        other => panic!("expected InsufficientAvailability, got {:?}", other),
    }
}
