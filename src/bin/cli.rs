use polars::prelude::{AnyValue, DataFrame};
use portfolio_audit::{
    AuditConfig, CostProjection, EmptyDocumentPolicy, PortfolioReport, PortfolioRow,
    ProjectDocument, StatusPolicy, audit_portfolio, load_config_from_json, save_config_to_json,
    save_report_to_csv, save_report_to_json,
};
use std::io::{self, Write};

fn cell(av: &AnyValue<'_>) -> String {
    match av {
        AnyValue::Null => String::new(),
        AnyValue::Float64(v) => format!("{v:.2}"),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        _ => av.to_string(),
    }
}

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.chars().count()).collect();
    for (ci, col) in columns.iter().enumerate() {
        for row_idx in 0..df.height() {
            if let Ok(ref av) = col.get(row_idx) {
                widths[ci] = widths[ci].max(cell(av).chars().count());
            }
        }
    }

    let sep = {
        let mut s = String::from("+");
        for w in &widths {
            s.push_str(&"-".repeat(w + 2));
            s.push('+');
        }
        s
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');

    out.push('|');
    for (i, name) in col_names.iter().enumerate() {
        out.push(' ');
        out.push_str(&format!("{:<width$}", name, width = widths[i]));
        out.push_str(" |");
    }
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');

    for row_idx in 0..df.height() {
        out.push('|');
        for (ci, col) in columns.iter().enumerate() {
            let s = col.get(row_idx).map(|av| cell(&av)).unwrap_or_default();
            out.push(' ');
            out.push_str(&format!("{:<width$}", s, width = widths[ci]));
            out.push_str(" |");
        }
        out.push('\n');
    }

    out.push_str(&sep);
    out.push('\n');
    out
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  add <path>...                      Queue schedule exports (MSPDI XML)\n  list                               List queued documents\n  clear                              Remove all queued documents\n  policy <spi|integrity>             Status policy: SPI only, or SPI plus integrity score\n  empty <drop|keep>                  Drop documents without tasks, or keep them as low-confidence rows\n  threshold <0-10>                   Score below which a project counts as low integrity\n  cost <base_rate> <stress>          Enable daily burn projection (stress as fraction, e.g. 0.15)\n  cost off                           Disable daily burn projection\n  config show                        Show audit configuration\n  config load <json_path>            Load audit configuration from JSON file\n  config save <json_path>            Save audit configuration to JSON file\n  report                             Audit queued documents and print the consolidated table\n  rank <spi|score>                   Print projects ranked by SPI or integrity score\n  export <json|csv> <path>           Audit queued documents and write the report\n  quit|exit                          Exit"
    );
}

fn print_config(config: &AuditConfig) {
    println!("Status policy      : {}", config.status_policy);
    println!("Empty documents    : {:?}", config.empty_document_policy);
    println!("Low integrity below: {}", config.low_integrity_threshold);
    match &config.cost_projection {
        Some(projection) => println!(
            "Daily burn         : {:.2} (base {:.2}, stress {:.2})",
            projection.effective_rate(),
            projection.base_daily_rate,
            projection.operational_stress
        ),
        None => println!("Daily burn         : off"),
    }
}

fn print_summary(report: &PortfolioReport) {
    let summary = &report.summary;
    println!("Projects           : {}", summary.project_count);
    println!(
        "Recoverable total  : {:.2}",
        summary.total_recoverable_investment
    );
    println!("Mean SPI           : {:.2}", summary.mean_spi);
    println!("Mean CPI           : {:.2}", summary.mean_cpi);
    println!("Low integrity      : {}", summary.low_integrity_count);
    if let Some(rate) = summary.effective_daily_rate {
        println!("Daily burn         : {:.2}", rate);
    }
    for rejected in &report.rejected {
        println!("Rejected {}: {}", rejected.name, rejected.reason);
    }
}

fn print_ranking(title: &str, rows: &[&PortfolioRow]) {
    println!("{title}:");
    for (idx, row) in rows.iter().enumerate() {
        println!(
            "  {:>2}. {:<28} SPI {:.2}  score {}  {}",
            idx + 1,
            row.name,
            row.spi,
            row.score,
            row.status
        );
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portfolio_audit=warn".into()),
        )
        .with_writer(io::stderr)
        .init();

    let mut config = AuditConfig::default();
    let mut documents: Vec<ProjectDocument> = Vec::new();

    println!("Portfolio Audit (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "add" => {
                let paths: Vec<&str> = parts.collect();
                if paths.is_empty() {
                    println!("Usage: add <path>...");
                    continue;
                }
                for path in paths {
                    match ProjectDocument::read(path) {
                        Ok(doc) => {
                            println!("Queued {} as {}.", path, doc.name);
                            documents.push(doc);
                        }
                        Err(e) => println!("Error reading {}: {}", path, e),
                    }
                }
            }
            "list" => {
                if documents.is_empty() {
                    println!("No documents queued.");
                }
                for (idx, doc) in documents.iter().enumerate() {
                    println!("  {}. {} ({} bytes)", idx + 1, doc.name, doc.bytes.len());
                }
            }
            "clear" => {
                documents.clear();
                println!("Cleared document queue.");
            }
            "policy" => match parts.next().map(str::parse::<StatusPolicy>) {
                Some(Ok(policy)) => {
                    config.status_policy = policy;
                    println!("Status policy set to {policy}.");
                }
                _ => println!("Usage: policy <spi|integrity>"),
            },
            "empty" => match parts.next().map(str::parse::<EmptyDocumentPolicy>) {
                Some(Ok(policy)) => {
                    config.empty_document_policy = policy;
                    println!("Empty document policy set to {policy:?}.");
                }
                _ => println!("Usage: empty <drop|keep>"),
            },
            "threshold" => match parts.next().map(str::parse::<u8>) {
                Some(Ok(threshold)) => {
                    let mut candidate = config.clone();
                    candidate.low_integrity_threshold = threshold;
                    match candidate.validate() {
                        Ok(()) => {
                            config = candidate;
                            println!("Low integrity threshold set to {threshold}.");
                        }
                        Err(e) => println!("Error: {}", e),
                    }
                }
                _ => println!("Usage: threshold <0-10>"),
            },
            "cost" => {
                let rate_s = parts.next();
                let stress_s = parts.next();
                match (rate_s, stress_s) {
                    (Some("off"), None) => {
                        config.cost_projection = None;
                        println!("Daily burn projection disabled.");
                    }
                    (Some(rate_s), Some(stress_s)) => {
                        let (Ok(rate), Ok(stress)) = (rate_s.parse::<f64>(), stress_s.parse::<f64>())
                        else {
                            println!("Invalid float");
                            continue;
                        };
                        let mut candidate = config.clone();
                        candidate.cost_projection = Some(CostProjection::new(rate, stress));
                        match candidate.validate() {
                            Ok(()) => {
                                config = candidate;
                                print_config(&config);
                            }
                            Err(e) => println!("Error: {}", e),
                        }
                    }
                    _ => println!("Usage: cost <base_rate> <stress> | cost off"),
                }
            }
            "config" => match (parts.next(), parts.next()) {
                (Some("show"), _) => print_config(&config),
                (Some("load"), Some(path)) => match load_config_from_json(path) {
                    Ok(loaded) => {
                        config = loaded;
                        println!("Configuration loaded from {}.", path);
                    }
                    Err(e) => println!("Error loading configuration: {}", e),
                },
                (Some("save"), Some(path)) => match save_config_to_json(&config, path) {
                    Ok(()) => println!("Configuration saved to {}.", path),
                    Err(e) => println!("Error saving configuration: {}", e),
                },
                _ => println!("Usage: config show | config load <json_path> | config save <json_path>"),
            },
            "report" => {
                let report = audit_portfolio(&config, &documents);
                match report.to_dataframe() {
                    Ok(df) => println!("{}", render_df_as_text_table(&df)),
                    Err(e) => println!("Error building table: {}", e),
                }
                print_summary(&report);
            }
            "rank" => {
                let report = audit_portfolio(&config, &documents);
                match parts.next() {
                    Some("spi") => print_ranking("Ranked by SPI", &report.ranked_by_spi()),
                    Some("score") => {
                        print_ranking("Ranked by integrity score", &report.ranked_by_score())
                    }
                    _ => println!("Usage: rank <spi|score>"),
                }
            }
            "export" => {
                let fmt = parts.next();
                let path = parts.next();
                match (fmt, path) {
                    (Some(fmt @ ("json" | "csv")), Some(path)) => {
                        let report = audit_portfolio(&config, &documents);
                        let res = if fmt == "json" {
                            save_report_to_json(&report, path)
                        } else {
                            save_report_to_csv(&report, path)
                        };
                        match res {
                            Ok(()) => println!("Report exported to {}.", path),
                            Err(e) => println!("Error exporting report: {}", e),
                        }
                    }
                    _ => println!("Usage: export <json|csv> <path>"),
                }
            }
            other => println!("Unknown command '{}'. Type 'help'.", other),
        }
    }
}
