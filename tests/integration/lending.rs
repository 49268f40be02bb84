use chrono::Duration;

use library_lending::{
    config::{LendingConfig, PenaltyMode},
    error::{AppError, Entity},
};

use crate::common::{desk, desk_with, start, TestDesk, BOOK, MEMBER};

#[tokio::test]
async fn test_tier_sets_cap_and_duration() {
    for (reputation, cap, days) in [(100, 10, 14), (80, 10, 14), (79, 5, 7), (50, 5, 7), (49, 2, 3), (0, 2, 3)] {
        let desk = TestDesk::seeded(20).await;
        desk.set_reputation(MEMBER, reputation).await;

        for _ in 0..cap {
            let loan = desk.services.lending.borrow_book(MEMBER, BOOK).await.unwrap();
            assert_eq!(loan.due_at - loan.borrowed_at, Duration::days(days));
        }

        let err = desk.services.lending.borrow_book(MEMBER, BOOK).await.unwrap_err();
        assert!(
            matches!(err, AppError::LimitExceeded { member: MEMBER, open, cap: c } if open == cap && c == cap),
            "reputation {}: {:?}",
            reputation,
            err
        );
    }
}

#[tokio::test]
async fn test_borrow_decrements_copies() {
    let desk = TestDesk::seeded(3).await;

    let loan = desk.services.lending.borrow_book(MEMBER, BOOK).await.unwrap();

    assert_eq!(desk.copies(BOOK).await, 2);
    assert_eq!(loan.member_id, MEMBER);
    assert_eq!(loan.book_id, BOOK);
    assert_eq!(loan.borrowed_at, start());
    assert_eq!(loan.due_at, start() + Duration::days(14));
    assert!(loan.returned_at.is_none());
}

#[tokio::test]
async fn test_borrow_without_copies_is_unavailable() {
    let desk = TestDesk::seeded(0).await;

    let err = desk.services.lending.borrow_book(MEMBER, BOOK).await.unwrap_err();

    assert!(matches!(err, AppError::Unavailable { book: BOOK }));
    assert_eq!(desk.copies(BOOK).await, 0);
    assert_eq!(desk.services.lending.open_loan_count(MEMBER).await.unwrap(), 0);
}

#[tokio::test]
async fn test_borrow_checks_run_in_order() {
    let desk = TestDesk::seeded(0).await;

    // unknown member wins over unknown book
    let err = desk.services.lending.borrow_book(2, 987654321).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { entity: Entity::Member, ref key } if key == "2"));

    let err = desk.services.lending.borrow_book(MEMBER, 987654321).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { entity: Entity::Book, ref key } if key == "987654321"));

    // no copies wins over the loan cap
    desk.add_book(1, "Other Book", "Other Author", 5).await;
    desk.set_reputation(MEMBER, 10).await;
    desk.services.lending.borrow_book(MEMBER, 1).await.unwrap();
    desk.services.lending.borrow_book(MEMBER, 1).await.unwrap();
    let err = desk.services.lending.borrow_book(MEMBER, BOOK).await.unwrap_err();
    assert!(matches!(err, AppError::Unavailable { .. }));
}

#[tokio::test]
async fn test_limit_boundary() {
    let desk = TestDesk::seeded(5).await;
    desk.set_reputation(MEMBER, 30).await;

    // one below the cap of 2 still succeeds
    desk.services.lending.borrow_book(MEMBER, BOOK).await.unwrap();
    desk.services.lending.borrow_book(MEMBER, BOOK).await.unwrap();

    let err = desk.services.lending.borrow_book(MEMBER, BOOK).await.unwrap_err();
    assert!(matches!(err, AppError::LimitExceeded { open: 2, cap: 2, .. }));
    assert_eq!(desk.copies(BOOK).await, 3);
}

#[tokio::test]
async fn test_on_time_return_rewards_reputation() {
    let desk = TestDesk::seeded(1).await;
    desk.set_reputation(MEMBER, 60).await;

    let loan = desk.services.lending.borrow_book(MEMBER, BOOK).await.unwrap();
    let receipt = desk
        .services
        .lending
        .return_book(MEMBER, BOOK, Some(loan.due_at))
        .await
        .unwrap();

    assert!(!receipt.was_late());
    assert_eq!(receipt.reputation, 65);
    let member = desk.services.members.get_member(MEMBER).await.unwrap();
    assert_eq!(member.reputation, 65);
    assert_eq!(member.penalty, 0);
}

#[tokio::test]
async fn test_on_time_return_is_clamped_at_100() {
    let desk = TestDesk::seeded(1).await;

    desk.services.lending.borrow_book(MEMBER, BOOK).await.unwrap();
    desk.clock.advance(Duration::days(7));
    desk.services.lending.return_book(MEMBER, BOOK, None).await.unwrap();

    let member = desk.services.members.get_member(MEMBER).await.unwrap();
    assert_eq!(member.reputation, 100);
    assert_eq!(member.penalty, 0);
}

#[tokio::test]
async fn test_late_return_by_five_days() {
    let desk = TestDesk::seeded(1).await;

    let loan = desk.services.lending.borrow_book(MEMBER, BOOK).await.unwrap();
    let receipt = desk
        .services
        .lending
        .return_book(MEMBER, BOOK, Some(loan.due_at + Duration::days(5)))
        .await
        .unwrap();

    assert_eq!(receipt.overdue_days, 5);
    assert_eq!(receipt.penalty_accrued, 25);
    assert_eq!(receipt.penalty_total, 25);
    assert_eq!(receipt.reputation, 75);

    let member = desk.services.members.get_member(MEMBER).await.unwrap();
    assert_eq!(member.penalty, 25);
    assert_eq!(member.reputation, 75);
    // back in the middle tier for the next loan
    let next = desk.services.lending.borrow_book(MEMBER, BOOK).await.unwrap();
    assert_eq!(next.due_at - next.borrowed_at, Duration::days(7));
}

#[tokio::test]
async fn test_extreme_lateness_floors_reputation_at_zero() {
    let desk = TestDesk::seeded(1).await;

    desk.services.lending.borrow_book(MEMBER, BOOK).await.unwrap();
    desk.clock.advance(Duration::days(14 + 25));
    let receipt = desk.services.lending.return_book(MEMBER, BOOK, None).await.unwrap();

    assert_eq!(receipt.penalty_total, 125);
    assert_eq!(receipt.reputation, 0);
    let member = desk.services.members.get_member(MEMBER).await.unwrap();
    assert_eq!(member.reputation, 0);
}

#[tokio::test]
async fn test_cumulative_penalty_compounds_across_returns() {
    let desk = TestDesk::seeded(2).await;

    for expected in [(5, 95), (10, 85)] {
        let loan = desk.services.lending.borrow_book(MEMBER, BOOK).await.unwrap();
        let receipt = desk
            .services
            .lending
            .return_book(MEMBER, BOOK, Some(loan.due_at + Duration::days(1)))
            .await
            .unwrap();
        assert_eq!((receipt.penalty_total, receipt.reputation), expected);
    }
}

#[tokio::test]
async fn test_incremental_mode_charges_each_return_once() {
    let desk = desk_with(LendingConfig {
        penalty_mode: PenaltyMode::Incremental,
        ..LendingConfig::default()
    })
    .await;
    desk.register(MEMBER, "Test User").await;
    desk.add_book(BOOK, "Test Book", "Test Author", 2).await;

    for expected in [(5, 95), (10, 90)] {
        let loan = desk.services.lending.borrow_book(MEMBER, BOOK).await.unwrap();
        let receipt = desk
            .services
            .lending
            .return_book(MEMBER, BOOK, Some(loan.due_at + Duration::days(1)))
            .await
            .unwrap();
        assert_eq!((receipt.penalty_total, receipt.reputation), expected);
    }
}

#[tokio::test]
async fn test_return_restores_copies_regardless_of_lateness() {
    let desk = TestDesk::seeded(2).await;

    let on_time = desk.services.lending.borrow_book(MEMBER, BOOK).await.unwrap();
    desk.services.lending.borrow_book(MEMBER, BOOK).await.unwrap();
    assert_eq!(desk.copies(BOOK).await, 0);

    desk.services
        .lending
        .return_book(MEMBER, BOOK, Some(on_time.due_at))
        .await
        .unwrap();
    assert_eq!(desk.copies(BOOK).await, 1);

    desk.services
        .lending
        .return_book(MEMBER, BOOK, Some(on_time.due_at + Duration::days(30)))
        .await
        .unwrap();
    assert_eq!(desk.copies(BOOK).await, 2);
}

#[tokio::test]
async fn test_return_without_open_loan_is_not_found() {
    let desk = TestDesk::seeded(1).await;

    let err = desk.services.lending.return_book(MEMBER, BOOK, None).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { entity: Entity::Loan, .. }));

    desk.services.lending.borrow_book(MEMBER, BOOK).await.unwrap();
    desk.services.lending.return_book(MEMBER, BOOK, None).await.unwrap();

    let err = desk.services.lending.return_book(MEMBER, BOOK, None).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { entity: Entity::Loan, .. }));
    assert_eq!(desk.copies(BOOK).await, 1);
}

#[tokio::test]
async fn test_return_closes_oldest_loan_and_keeps_dates() {
    let desk = TestDesk::seeded(2).await;

    let first = desk.services.lending.borrow_book(MEMBER, BOOK).await.unwrap();
    desk.clock.advance(Duration::days(1));
    let second = desk.services.lending.borrow_book(MEMBER, BOOK).await.unwrap();

    let receipt = desk.services.lending.return_book(MEMBER, BOOK, None).await.unwrap();
    assert_eq!(receipt.loan.id, first.id);
    assert_eq!(receipt.loan.borrowed_at, first.borrowed_at);
    assert_eq!(receipt.loan.due_at, first.due_at);
    assert_eq!(receipt.loan.returned_at, Some(start() + Duration::days(1)));

    let open = desk.services.lending.list_open_loans(MEMBER).await.unwrap();
    assert_eq!(open, vec![second]);

    let stored = desk.repository.loans.get_by_id(first.id).await.unwrap();
    assert_eq!(stored.returned_at, Some(start() + Duration::days(1)));
}

#[tokio::test]
async fn test_round_trip_restores_copies() {
    let desk = TestDesk::seeded(4).await;

    desk.services.lending.borrow_book(MEMBER, BOOK).await.unwrap();
    desk.services.lending.return_book(MEMBER, BOOK, None).await.unwrap();

    assert_eq!(desk.copies(BOOK).await, 4);
}

#[tokio::test]
async fn test_open_loan_count_tracks_borrows_and_returns() {
    let desk = desk().await;
    desk.register(MEMBER, "Test User").await;
    assert_eq!(desk.services.lending.open_loan_count(MEMBER).await.unwrap(), 0);

    for i in 0..5 {
        desk.add_book(1_000_000_000 + i, &format!("Test Book {}", i + 1), "Test Author", 1)
            .await;
        desk.services
            .lending
            .borrow_book(MEMBER, 1_000_000_000 + i)
            .await
            .unwrap();
    }
    assert_eq!(desk.services.lending.open_loan_count(MEMBER).await.unwrap(), 5);

    desk.services
        .lending
        .return_book(MEMBER, 1_000_000_002, None)
        .await
        .unwrap();
    assert_eq!(desk.services.lending.open_loan_count(MEMBER).await.unwrap(), 4);
    assert_eq!(desk.services.lending.list_open_loans(MEMBER).await.unwrap().len(), 4);
    assert_eq!(desk.services.lending.list_loans(MEMBER).await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_loan_queries_need_a_known_member() {
    let desk = desk().await;

    let err = desk.services.lending.open_loan_count(7).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound { entity: Entity::Member, .. }));
    assert!(desk.services.lending.list_open_loans(7).await.unwrap_err().is_not_found());
    assert!(desk.services.lending.list_loans(7).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_failed_return_leaves_everything_untouched() {
    let desk = TestDesk::seeded(1).await;
    desk.set_reputation(MEMBER, 70).await;

    desk.services.lending.borrow_book(MEMBER, BOOK).await.unwrap();
    let err = desk
        .services
        .lending
        .return_book(MEMBER, BOOK, Some(start() - Duration::hours(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let member = desk.services.members.get_member(MEMBER).await.unwrap();
    assert_eq!((member.penalty, member.reputation), (0, 70));
    assert_eq!(desk.copies(BOOK).await, 0);
    assert_eq!(desk.services.lending.open_loan_count(MEMBER).await.unwrap(), 1);
}

#[tokio::test]
async fn test_return_failing_on_standing_rolls_back_earlier_writes() {
    let desk = TestDesk::seeded(1).await;
    desk.set_reputation(MEMBER, 70).await;
    desk.services.lending.borrow_book(MEMBER, BOOK).await.unwrap();

    // loan close and copy bump succeed, the member update aborts
    sqlx::query(
        "CREATE TRIGGER lock_standing BEFORE UPDATE OF penalty, reputation ON members \
         BEGIN SELECT RAISE(ABORT, 'standing locked'); END",
    )
    .execute(&desk.repository.pool)
    .await
    .unwrap();

    let err = desk
        .services
        .lending
        .return_book(MEMBER, BOOK, Some(start() + Duration::days(17)))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Database(_)));

    sqlx::query("DROP TRIGGER lock_standing")
        .execute(&desk.repository.pool)
        .await
        .unwrap();

    let member = desk.services.members.get_member(MEMBER).await.unwrap();
    assert_eq!((member.penalty, member.reputation), (0, 70));
    assert_eq!(desk.copies(BOOK).await, 0);
    let open = desk.services.lending.list_open_loans(MEMBER).await.unwrap();
    assert_eq!(open.len(), 1);
    assert!(open[0].returned_at.is_none());
}

#[tokio::test]
async fn test_return_on_borrow_day_is_accepted() {
    let desk = TestDesk::seeded(1).await;
    desk.services.lending.borrow_book(MEMBER, BOOK).await.unwrap();
    desk.clock.set(start() + Duration::hours(10));

    let receipt = desk
        .services
        .lending
        .return_book_on(MEMBER, BOOK, start().date_naive())
        .await
        .unwrap();
    assert!(!receipt.was_late());
    assert_eq!(receipt.loan.returned_at, Some(start()));
}
