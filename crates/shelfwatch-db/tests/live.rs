//! Live integration tests for shelfwatch-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/shelfwatch-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory. They need `DATABASE_URL`; run with `--ignored`.

use chrono::{NaiveDate, Utc};
use shelfwatch_core::{
    CatalogStore, ExtractionMethod, ProductCandidate, ScrapeEvent, ScrapeStatus,
};
use shelfwatch_db::{
    catalog_stats, insert_scrape_event, list_all_products, list_new_products,
    list_products_by_brand, list_run_events, list_scrape_history, mark_products_seen,
    reset_baseline, PgCatalog,
};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
}

fn candidates(names: &[&str]) -> Vec<ProductCandidate> {
    names.iter().map(|n| ProductCandidate::named(*n)).collect()
}

fn event(brand: &str, status: ScrapeStatus, run_id: Option<Uuid>) -> ScrapeEvent {
    ScrapeEvent {
        run_id,
        brand: brand.to_string(),
        timestamp: Utc::now(),
        products_found: 2,
        new_products: 1,
        status,
        error: None,
        method: ExtractionMethod::Markup,
    }
}

// ---------------------------------------------------------------------------
// Section 1: Reconciliation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn reconcile_inserts_new_products(pool: sqlx::PgPool) {
    let catalog = PgCatalog::new(pool.clone());
    let outcome = catalog
        .reconcile("Hellmann's", &candidates(&["Mayonnaise Light 500g"]), day(10))
        .await
        .expect("reconcile failed");

    assert_eq!(outcome.total, 1);
    assert_eq!(outcome.new, 1);

    let rows = list_products_by_brand(&pool, "Hellmann's").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].first_seen, day(10));
    assert_eq!(rows[0].last_seen, day(10));
    assert!(rows[0].is_new);
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn reconcile_twice_is_idempotent(pool: sqlx::PgPool) {
    let catalog = PgCatalog::new(pool.clone());
    let batch = candidates(&["Ketchup", "Mustard"]);

    catalog.reconcile("Heinz", &batch, day(10)).await.unwrap();
    let second = catalog.reconcile("Heinz", &batch, day(11)).await.unwrap();

    assert_eq!(second.total, 2);
    assert_eq!(second.new, 0);

    let rows = list_all_products(&pool).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.first_seen == day(10)));
    assert!(rows.iter().all(|r| r.last_seen == day(11)));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn reconcile_matches_names_case_insensitively(pool: sqlx::PgPool) {
    let catalog = PgCatalog::new(pool.clone());
    catalog
        .reconcile("Heinz", &candidates(&["Ketchup"]), day(10))
        .await
        .unwrap();
    let outcome = catalog
        .reconcile("Heinz", &candidates(&["KETCHUP"]), day(10))
        .await
        .unwrap();

    assert_eq!(outcome.new, 0);
    let rows = list_products_by_brand(&pool, "Heinz").await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].name, "Ketchup");
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn reconcile_never_erases_attributes(pool: sqlx::PgPool) {
    let catalog = PgCatalog::new(pool.clone());
    let mut first = ProductCandidate::named("Ketchup");
    first.category = Some("sauces".to_string());
    catalog.reconcile("Heinz", &[first], day(10)).await.unwrap();
    catalog
        .reconcile("Heinz", &candidates(&["Ketchup"]), day(11))
        .await
        .unwrap();

    let rows = list_products_by_brand(&pool, "Heinz").await.unwrap();
    assert_eq!(rows[0].category.as_deref(), Some("sauces"));
}

// ---------------------------------------------------------------------------
// Section 2: Reports and maintenance
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn new_products_window_uses_first_seen(pool: sqlx::PgPool) {
    let catalog = PgCatalog::new(pool.clone());
    catalog
        .reconcile("Heinz", &candidates(&["Ketchup"]), day(1))
        .await
        .unwrap();
    catalog
        .reconcile("Heinz", &candidates(&["Ketchup", "Mustard"]), day(20))
        .await
        .unwrap();

    let recent = list_new_products(&pool, day(15)).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].name, "Mustard");
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn reset_baseline_backdates_but_keeps_order(pool: sqlx::PgPool) {
    let catalog = PgCatalog::new(pool.clone());
    catalog
        .reconcile("Heinz", &candidates(&["Ketchup"]), day(20))
        .await
        .unwrap();

    let updated = reset_baseline(&pool, day(1)).await.unwrap();
    assert_eq!(updated, 1);
    let rows = list_all_products(&pool).await.unwrap();
    assert_eq!(rows[0].first_seen, day(1));
    assert_eq!(rows[0].last_seen, day(20));

    // A baseline after last_seen clamps to last_seen.
    let future = NaiveDate::from_ymd_opt(2026, 4, 30).unwrap();
    reset_baseline(&pool, future).await.unwrap();
    let rows = list_all_products(&pool).await.unwrap();
    assert_eq!(rows[0].first_seen, day(20));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn mark_products_seen_clears_flags(pool: sqlx::PgPool) {
    let catalog = PgCatalog::new(pool.clone());
    catalog
        .reconcile("Heinz", &candidates(&["Ketchup", "Mustard"]), day(10))
        .await
        .unwrap();

    assert_eq!(mark_products_seen(&pool).await.unwrap(), 2);
    assert_eq!(mark_products_seen(&pool).await.unwrap(), 0);
    let rows = list_all_products(&pool).await.unwrap();
    assert!(rows.iter().all(|r| !r.is_new));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn catalog_stats_counts_products_and_brands(pool: sqlx::PgPool) {
    let catalog = PgCatalog::new(pool.clone());
    catalog
        .reconcile("Heinz", &candidates(&["Ketchup", "Mustard"]), day(10))
        .await
        .unwrap();
    catalog
        .reconcile("Condito", &candidates(&["Tzatziki"]), day(2))
        .await
        .unwrap();
    catalog
        .record_scrape_event(&event("Heinz", ScrapeStatus::Success, None))
        .await
        .unwrap();

    let stats = catalog_stats(&pool, day(5)).await.unwrap();
    assert_eq!(stats.total_products, 3);
    assert_eq!(stats.new_products, 2);
    assert_eq!(stats.brands[0].brand, "Heinz");
    assert_eq!(stats.brands[0].products, 2);
    assert!(stats.last_scrape_at.is_some());
}

// ---------------------------------------------------------------------------
// Section 3: Scrape history
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn scrape_history_is_newest_first_and_filterable(pool: sqlx::PgPool) {
    let run_id = Uuid::new_v4();
    insert_scrape_event(&pool, &event("Heinz", ScrapeStatus::Success, Some(run_id)))
        .await
        .unwrap();
    insert_scrape_event(&pool, &event("Condito", ScrapeStatus::Partial, Some(run_id)))
        .await
        .unwrap();
    insert_scrape_event(&pool, &event("Heinz", ScrapeStatus::Error, None))
        .await
        .unwrap();

    let all = list_scrape_history(&pool, 50, None).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].status, "error");

    let heinz = list_scrape_history(&pool, 50, Some("Heinz")).await.unwrap();
    assert_eq!(heinz.len(), 2);

    let limited = list_scrape_history(&pool, 1, None).await.unwrap();
    assert_eq!(limited.len(), 1);

    let run = list_run_events(&pool, run_id).await.unwrap();
    assert_eq!(run.len(), 2);
    assert_eq!(run[0].brand, "Heinz");
    assert_eq!(run[1].status().unwrap(), ScrapeStatus::Partial);
}
