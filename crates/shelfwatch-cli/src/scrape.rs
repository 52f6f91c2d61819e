//! `scrape` command: build the extraction strategies from config, run the
//! orchestrator against Postgres (or an in-memory catalog for `--dry-run`)
//! and print a per-brand summary.

use std::time::Duration;

use chrono::NaiveDate;
use shelfwatch_core::{
    load_brands, load_brands_from_json, AppConfig, BrandsFile, CatalogStore, ExtractionMethod,
    MemoryCatalog,
};
use shelfwatch_db::PgCatalog;
use shelfwatch_scraper::{
    BrandOutcome, MarkupStrategy, Orchestrator, PageFetcher, ScreenshotService, Strategies,
    VisionClient, VisionStrategy,
};

#[derive(Debug, Clone)]
pub(crate) struct ScrapeOptions<'a> {
    pub brand: Option<&'a str>,
    pub method: Option<ExtractionMethod>,
    pub skip_screenshot: bool,
    pub dry_run: bool,
}

/// Load the brand list, preferring inline JSON over the brands file.
///
/// # Errors
///
/// Returns an error if the source cannot be read, parsed or validated.
pub(crate) fn load_brand_list(config: &AppConfig) -> anyhow::Result<BrandsFile> {
    let brands = match &config.brands_json {
        Some(raw) => load_brands_from_json(raw)?,
        None => load_brands(&config.brands_path)?,
    };
    Ok(brands)
}

fn build_strategies(
    config: &AppConfig,
    skip_screenshot: bool,
) -> anyhow::Result<(MarkupStrategy, VisionStrategy)> {
    let fetcher = PageFetcher::new(
        config.request_timeout_secs,
        &config.user_agent,
        &config.browser_bin,
        config.max_retries,
        config.retry_backoff_base_secs,
    )
    .map_err(|e| anyhow::anyhow!("failed to build page fetcher: {e}"))?;

    let screenshots = ScreenshotService::new(
        config.screenshot_dir.clone(),
        config.screenshot_api_key.clone(),
        &config.browser_bin,
        config.request_timeout_secs,
    )
    .map_err(|e| anyhow::anyhow!("failed to build screenshot service: {e}"))?
    .with_retries(config.max_retries, config.retry_backoff_base_secs);

    let client = config
        .anthropic_api_key
        .as_deref()
        .map(|key| {
            VisionClient::new(
                key,
                &config.vision_model,
                &config.vision_api_url,
                config.request_timeout_secs.saturating_mul(2),
                config.max_retries,
                config.retry_backoff_base_secs,
            )
        })
        .transpose()
        .map_err(|e| anyhow::anyhow!("failed to build vision client: {e}"))?;

    Ok((
        MarkupStrategy::new(fetcher),
        VisionStrategy::new(screenshots, client).reuse_screenshots(skip_screenshot),
    ))
}

/// Scrape one brand or all of them.
///
/// Per-brand failures are reported in the summary, not returned.
///
/// # Errors
///
/// Returns an error if the brands cannot be loaded, a named brand is
/// unknown, a client cannot be built, or the database is unreachable.
pub(crate) async fn run_scrape(
    config: &AppConfig,
    options: &ScrapeOptions<'_>,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let brands = load_brand_list(config)?;
    let (markup, vision) = build_strategies(config, options.skip_screenshot)?;
    let strategies = Strategies {
        markup: &markup,
        vision: &vision,
        method_override: options.method,
    };

    if options.dry_run {
        let catalog = MemoryCatalog::new();
        let outcomes = execute(config, &catalog, &brands, options.brand, &strategies, today).await?;
        print_outcomes(&outcomes);
        println!("dry-run: nothing was written to the database");
        return Ok(());
    }

    let pool = crate::connect(config).await?;
    let catalog = PgCatalog::new(pool);
    let outcomes = execute(config, &catalog, &brands, options.brand, &strategies, today).await?;
    print_outcomes(&outcomes);
    Ok(())
}

async fn execute(
    config: &AppConfig,
    catalog: &dyn CatalogStore,
    brands: &BrandsFile,
    brand_filter: Option<&str>,
    strategies: &Strategies<'_>,
    today: NaiveDate,
) -> anyhow::Result<Vec<BrandOutcome>> {
    let orchestrator = Orchestrator::new(
        catalog,
        Duration::from_millis(config.url_delay_ms),
        Duration::from_millis(config.brand_delay_ms),
    );

    match brand_filter {
        Some(name) => {
            let outcome = orchestrator
                .run_named(brands, name, strategies, today)
                .await?;
            Ok(vec![outcome])
        }
        None => {
            let summary = orchestrator.run_all(&brands.brands, strategies, today).await;
            println!("run {}", summary.run_id);
            Ok(summary.brands)
        }
    }
}

fn print_outcomes(outcomes: &[BrandOutcome]) {
    let header = format!(
        "{:<24}{:<8}{:<10}{:>7}{:>6}",
        "BRAND", "METHOD", "STATUS", "FOUND", "NEW"
    );
    println!("{header}");
    for outcome in outcomes {
        let event = &outcome.event;
        println!(
            "{:<24}{:<8}{:<10}{:>7}{:>6}",
            event.brand,
            event.method.as_str(),
            event.status.as_str(),
            event.products_found,
            event.new_products
        );
    }

    let found: i64 = outcomes
        .iter()
        .map(|o| i64::from(o.event.products_found))
        .sum();
    let new: i64 = outcomes
        .iter()
        .map(|o| i64::from(o.event.new_products))
        .sum();
    println!();
    println!(
        "scraped {} brand(s): {found} products found, {new} new",
        outcomes.len()
    );

    for outcome in outcomes.iter().filter(|o| !o.new_names.is_empty()) {
        println!();
        println!("new at {}:", outcome.event.brand);
        for name in &outcome.new_names {
            println!("  - {name}");
        }
    }

    for outcome in outcomes {
        if let Some(error) = &outcome.event.error {
            eprintln!(
                "{}: {} ({})",
                outcome.event.brand, error, outcome.event.status
            );
        }
    }
}
