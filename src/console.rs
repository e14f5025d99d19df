//! Startup banner for interactive terminals.
//! Used by: main.

use colored::Colorize;

use crate::config::Config;

pub fn print_banner() {
    println!();
    println!("{}", "╔═══════════════════════════════════════════╗".cyan());
    println!("║  {}                       ║", "turnstile v0.1.0".bold().white());
    println!("║  {}  ║", "rate-limited file server with overrides".dimmed());
    println!("{}", "╚═══════════════════════════════════════════╝".cyan());
    println!();
}

pub fn print_startup(config: &Config) {
    println!("{} {}", "✓".green().bold(), "Server ready".white().bold());
    println!("  {} {}", "→".dimmed(), format!("http://{}", config.address).cyan().underline());
    println!("  {} {}", "files:".dimmed(), config.file_dir.display());
    println!();
    println!("{}", "Endpoints:".white().bold());
    println!("  {} {}      {}", "GET ".green(), "/".white(), "Browse files".dimmed());
    println!("  {} {} {}", "POST".yellow(), "/upload".white(), "Upload a file".dimmed());
    println!("  {} {} {}", "POST".yellow(), "/setaccess".white(), "Allow or deny a client".dimmed());
    println!("  {} {} {}", "POST".yellow(), "/setadmin".white(), "Grant or revoke an administrator".dimmed());
    println!("  {} {} {}", "GET ".green(), "/metrics".white(), "Telemetry".dimmed());
    println!("  {} {} {}", "GET ".green(), "/health".white(), "Health check".dimmed());
    println!();
    println!("{}", "Limits:".white().bold());
    println!("  {}", limits_summary(config).yellow());
    println!();
}

/// Blocking starts with access L+1, so the limit reads as "more than L".
fn limits_summary(config: &Config) -> String {
    format!(
        "more than {} accesses within {}s blocks for {}s, idle clients forgotten after {}s",
        config.access_count_limit, config.time_limit_secs, config.restore_delay_secs, config.existence_secs,
    )
}
