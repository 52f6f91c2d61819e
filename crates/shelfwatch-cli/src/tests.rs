use chrono::NaiveDate;

use super::*;

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["shelfwatch", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli =
        Cli::try_parse_from(["shelfwatch", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["shelfwatch"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn scrape_defaults_to_all_brands_and_configured_methods() {
    let cli = Cli::try_parse_from(["shelfwatch", "scrape"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Scrape {
            brand: None,
            method: None,
            skip_screenshot: false,
            dry_run: false,
        })
    ));
}

#[test]
fn scrape_with_brand_method_and_flags() {
    let cli = Cli::try_parse_from([
        "shelfwatch",
        "scrape",
        "--brand",
        "Heinz",
        "--method",
        "vision",
        "--skip-screenshot",
        "--dry-run",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Scrape {
            brand: Some(ref b),
            method: Some(MethodArg::Vision),
            skip_screenshot: true,
            dry_run: true,
        }) if b == "Heinz"
    ));
}

#[test]
fn scrape_rejects_unknown_method() {
    let result = Cli::try_parse_from(["shelfwatch", "scrape", "--method", "ocr"]);
    assert!(result.is_err());
}

#[test]
fn method_arg_maps_to_extraction_method() {
    assert_eq!(ExtractionMethod::from(MethodArg::Markup), ExtractionMethod::Markup);
    assert_eq!(ExtractionMethod::from(MethodArg::Vision), ExtractionMethod::Vision);
}

#[test]
fn new_days_is_optional() {
    let cli = Cli::try_parse_from(["shelfwatch", "new"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::New { days: None })));

    let cli = Cli::try_parse_from(["shelfwatch", "new", "--days", "7"]).unwrap();
    assert!(matches!(cli.command, Some(Commands::New { days: Some(7) })));
}

#[test]
fn history_defaults_to_fifty_events() {
    let cli = Cli::try_parse_from(["shelfwatch", "history"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::History {
            limit: 50,
            brand: None
        })
    ));
}

#[test]
fn history_with_limit_and_brand() {
    let cli = Cli::try_parse_from([
        "shelfwatch",
        "history",
        "--limit",
        "5",
        "--brand",
        "condito",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::History {
            limit: 5,
            brand: Some(ref b)
        }) if b == "condito"
    ));
}

#[test]
fn products_with_brand_filter() {
    let cli = Cli::try_parse_from(["shelfwatch", "products", "--brand", "Condito"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Products { brand: Some(ref b) }) if b == "Condito"
    ));
}

#[test]
fn parses_maintenance_commands() {
    assert!(matches!(
        Cli::try_parse_from(["shelfwatch", "baseline", "--days", "60"])
            .unwrap()
            .command,
        Some(Commands::Baseline { days: Some(60) })
    ));
    assert!(matches!(
        Cli::try_parse_from(["shelfwatch", "mark-seen"]).unwrap().command,
        Some(Commands::MarkSeen)
    ));
    assert!(matches!(
        Cli::try_parse_from(["shelfwatch", "stats"]).unwrap().command,
        Some(Commands::Stats)
    ));
    assert!(matches!(
        Cli::try_parse_from(["shelfwatch", "brands"]).unwrap().command,
        Some(Commands::Brands)
    ));
}

#[test]
fn days_before_subtracts_calendar_days() {
    let today = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
    assert_eq!(
        report::days_before(today, 15).unwrap(),
        NaiveDate::from_ymd_opt(2026, 10, 4).unwrap()
    );
    assert_eq!(report::days_before(today, 0).unwrap(), today);
    assert!(report::days_before(NaiveDate::MIN, 1).is_err());
}

#[test]
fn truncate_marks_cut_text() {
    assert_eq!(report::truncate("Tzatziki", 20), "Tzatziki");
    assert_eq!(report::truncate("Μαγιονέζα Light 500g", 9), "Μαγιονέζα...");
}

#[test]
fn only_brands_and_dry_run_skip_the_database() {
    let needs = |args: &[&str]| {
        Cli::try_parse_from(args)
            .unwrap()
            .command
            .unwrap()
            .needs_database()
    };
    assert!(!needs(&["shelfwatch", "brands"]));
    assert!(!needs(&["shelfwatch", "scrape", "--dry-run"]));
    assert!(needs(&["shelfwatch", "scrape"]));
    assert!(needs(&["shelfwatch", "stats"]));
    assert!(needs(&["shelfwatch", "db", "ping"]));
}
