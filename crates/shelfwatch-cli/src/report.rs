//! Read-only catalog reports plus the two maintenance commands.

use chrono::{Days, NaiveDate};
use shelfwatch_core::BrandsFile;

/// `today` minus `days`.
///
/// # Errors
///
/// Returns an error if the result is before the earliest representable date.
pub(crate) fn days_before(today: NaiveDate, days: u32) -> anyhow::Result<NaiveDate> {
    today
        .checked_sub_days(Days::new(u64::from(days)))
        .ok_or_else(|| anyhow::anyhow!("{days} days before {today} is out of range"))
}

/// Shorten `text` to `max` characters, marking the cut with `...`.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max).collect::<String>())
    } else {
        text.to_string()
    }
}

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("\u{2014}")
}

/// The configured spelling of `name` when it is a known brand.
fn canonical_brand<'a>(brands: &'a BrandsFile, name: &'a str) -> &'a str {
    brands.get(name).map_or(name, |b| b.name.as_str())
}

pub(crate) async fn run_new(pool: &sqlx::PgPool, since: NaiveDate) -> anyhow::Result<()> {
    let products = shelfwatch_db::list_new_products(pool, since).await?;

    if products.is_empty() {
        println!("no new products since {since}");
        return Ok(());
    }

    let header = format!("{:<12}{:<20}{:<42}CATEGORY", "FIRST SEEN", "BRAND", "PRODUCT");
    println!("{header}");
    for p in &products {
        println!(
            "{:<12}{:<20}{:<42}{}",
            p.first_seen.format("%Y-%m-%d"),
            truncate(&p.brand, 18),
            truncate(&p.name, 38),
            or_dash(p.category.as_deref())
        );
    }
    println!();
    println!("{} new product(s) since {since}", products.len());

    Ok(())
}

pub(crate) async fn run_products(
    pool: &sqlx::PgPool,
    brands: &BrandsFile,
    brand: Option<&str>,
) -> anyhow::Result<()> {
    let products = match brand {
        Some(name) => {
            shelfwatch_db::list_products_by_brand(pool, canonical_brand(brands, name)).await?
        }
        None => shelfwatch_db::list_all_products(pool).await?,
    };

    if products.is_empty() {
        println!(
            "no products found{}; run `shelfwatch scrape` first",
            brand.map(|b| format!(" for {b}")).unwrap_or_default()
        );
        return Ok(());
    }

    let header = format!(
        "{:<20}{:<42}{:<12}{:<12}URL",
        "BRAND", "PRODUCT", "FIRST SEEN", "LAST SEEN"
    );
    println!("{header}");
    for p in &products {
        let marker = if p.is_new { "*" } else { " " };
        println!(
            "{:<20}{marker}{:<41}{:<12}{:<12}{}",
            truncate(&p.brand, 18),
            truncate(&p.name, 37),
            p.first_seen.format("%Y-%m-%d"),
            p.last_seen.format("%Y-%m-%d"),
            or_dash(p.url.as_deref())
        );
    }
    println!();
    println!("{} product(s); * = not yet marked seen", products.len());

    Ok(())
}

pub(crate) async fn run_history(
    pool: &sqlx::PgPool,
    brands: &BrandsFile,
    limit: i64,
    brand: Option<&str>,
) -> anyhow::Result<()> {
    let brand = brand.map(|name| canonical_brand(brands, name));
    let events = shelfwatch_db::list_scrape_history(pool, limit, brand).await?;

    if events.is_empty() {
        println!("no scrape history yet");
        return Ok(());
    }

    let header = format!(
        "{:<18}{:<20}{:<8}{:<10}{:>6}{:>5}  ERROR",
        "TIME", "BRAND", "METHOD", "STATUS", "FOUND", "NEW"
    );
    println!("{header}");
    for event in &events {
        println!(
            "{:<18}{:<20}{:<8}{:<10}{:>6}{:>5}  {}",
            event.scraped_at.format("%Y-%m-%d %H:%M"),
            truncate(&event.brand, 18),
            event.method().as_str(),
            event.status()?.as_str(),
            event.products_found,
            event.new_products,
            event
                .error
                .as_deref()
                .map_or_else(String::new, |e| truncate(e, 60))
        );
    }

    Ok(())
}

pub(crate) async fn run_stats(pool: &sqlx::PgPool, since: NaiveDate) -> anyhow::Result<()> {
    let stats = shelfwatch_db::catalog_stats(pool, since).await?;

    println!("Total products: {}", stats.total_products);
    println!("New since {since}: {}", stats.new_products);
    println!(
        "Last scrape: {}",
        stats.last_scrape_at.map_or_else(
            || "\u{2014}".to_string(),
            |t| t.format("%Y-%m-%d %H:%M UTC").to_string()
        )
    );

    if !stats.brands.is_empty() {
        println!();
        println!("{:<24}{:>8}", "BRAND", "PRODUCTS");
        for row in &stats.brands {
            println!("{:<24}{:>8}", row.brand, row.products);
        }
    }

    Ok(())
}

pub(crate) async fn run_baseline(pool: &sqlx::PgPool, baseline: NaiveDate) -> anyhow::Result<()> {
    let updated = shelfwatch_db::reset_baseline(pool, baseline).await?;
    println!("backdated first_seen to {baseline} (or last_seen, if earlier) on {updated} product(s)");
    Ok(())
}

pub(crate) async fn run_mark_seen(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let updated = shelfwatch_db::mark_products_seen(pool).await?;
    println!("marked {updated} product(s) as seen");
    Ok(())
}

pub(crate) fn run_brands(brands: &BrandsFile) {
    let header = format!("{:<24}{:<8}{:<5}{:>5}  STATE", "BRAND", "METHOD", "JS", "URLS");
    println!("{header}");
    for brand in &brands.brands {
        let state = if brand.urls.is_empty() {
            brand.skip_reason()
        } else {
            "active".to_string()
        };
        println!(
            "{:<24}{:<8}{:<5}{:>5}  {}",
            brand.name,
            brand.method.as_str(),
            if brand.needs_js { "yes" } else { "no" },
            brand.urls.len(),
            state
        );
    }
}
