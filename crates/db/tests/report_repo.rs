//! Integration tests for the `reports` repository.

use report_db::models::report::CreateReport;
use report_db::models::user::CreateUser;
use report_db::repositories::{ReportRepo, UserRepo};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_report(campaign: &str, user_id: Option<i64>) -> CreateReport {
    CreateReport {
        title: campaign.to_string(),
        category: "skincare".to_string(),
        summary: "KPI目標: 10000".to_string(),
        content: format!("Report for {campaign}"),
        conversation_id: "c1".to_string(),
        kpi_target: "10000".to_string(),
        campaign_name: campaign.to_string(),
        product_category: "skincare".to_string(),
        current_metrics_img: Some("img1".to_string()),
        input_creative: None,
        user_id,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn create_returns_id_and_timestamp(pool: PgPool) {
    let inserted = ReportRepo::create(&pool, &new_report("Spring", None))
        .await
        .unwrap();

    let report = ReportRepo::find_by_id(&pool, inserted.id)
        .await
        .unwrap()
        .expect("report should exist");

    assert_eq!(report.created_at, inserted.created_at);
    assert_eq!(report.title, "Spring");
    assert_eq!(report.content, "Report for Spring");
    assert_eq!(report.current_metrics_img.as_deref(), Some("img1"));
    assert_eq!(report.input_creative, None);
}

#[sqlx::test(migrations = "./migrations")]
async fn list_is_newest_first_with_author_name(pool: PgPool) {
    let user = UserRepo::create(
        &pool,
        &CreateUser {
            name: "Aiko".to_string(),
            email: "aiko@example.com".to_string(),
            password_hash: "hash".to_string(),
        },
    )
    .await
    .unwrap();

    let first = ReportRepo::create(&pool, &new_report("First", Some(user.id)))
        .await
        .unwrap();
    let second = ReportRepo::create(&pool, &new_report("Second", None))
        .await
        .unwrap();

    let rows = ReportRepo::list(&pool, 20, 0).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].report.id, second.id);
    assert_eq!(rows[0].user_name, None);
    assert_eq!(rows[1].report.id, first.id);
    assert_eq!(rows[1].user_name.as_deref(), Some("Aiko"));

    let page = ReportRepo::list(&pool, 1, 1).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].report.id, first.id);
}

#[sqlx::test(migrations = "./migrations")]
async fn delete_single_and_many(pool: PgPool) {
    let a = ReportRepo::create(&pool, &new_report("A", None)).await.unwrap();
    let b = ReportRepo::create(&pool, &new_report("B", None)).await.unwrap();
    let c = ReportRepo::create(&pool, &new_report("C", None)).await.unwrap();

    assert!(ReportRepo::delete(&pool, a.id).await.unwrap());
    assert!(!ReportRepo::delete(&pool, a.id).await.unwrap());

    let mut deleted = ReportRepo::delete_many(&pool, &[b.id, c.id, 999_999])
        .await
        .unwrap();
    deleted.sort_unstable();
    assert_eq!(deleted, vec![b.id, c.id]);
    assert!(ReportRepo::list(&pool, 10, 0).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn deleting_author_keeps_report(pool: PgPool) {
    let user = UserRepo::create(
        &pool,
        &CreateUser {
            name: "Ken".to_string(),
            email: "ken@example.com".to_string(),
            password_hash: "hash".to_string(),
        },
    )
    .await
    .unwrap();
    let inserted = ReportRepo::create(&pool, &new_report("Kept", Some(user.id)))
        .await
        .unwrap();

    sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(user.id)
        .execute(&pool)
        .await
        .unwrap();

    let listed = ReportRepo::list(&pool, 10, 0).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].report.id, inserted.id);
    assert_eq!(listed[0].report.user_id, Some(user.id));
    assert_eq!(listed[0].user_name, None);
}

#[sqlx::test(migrations = "./migrations")]
async fn unknown_author_is_stored(pool: PgPool) {
    let inserted = ReportRepo::create(&pool, &new_report("Orphan", Some(999)))
        .await
        .unwrap();

    let report = ReportRepo::find_by_id(&pool, inserted.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(report.user_id, Some(999));
}
