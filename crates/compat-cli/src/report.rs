//! Human-readable run summary.

use colored::Colorize;
use compat_core::pipeline::RunReport;

/// Print the final compatibility summary to standard output.
pub fn print(report: &RunReport) {
    println!(
        "Extracted {} archive(s), {} already extracted",
        report.extracted, report.already_extracted
    );
    println!("Base installation provides {} module(s)", report.base_modules);
    println!();

    println!(
        "{} ({})",
        "Compatible extensions".green().bold(),
        report.compatible.len()
    );
    for id in &report.compatible {
        println!("  {id}");
    }

    println!(
        "{} ({})",
        "Incompatible extensions".red().bold(),
        report.incompatible.len()
    );
    for result in &report.incompatible {
        println!("  {}", result.extension_id);
        println!("    missing modules:");
        for module in &result.missing_modules {
            println!("      {module}");
        }
    }

    if !report.skipped.is_empty() {
        println!(
            "{} ({})",
            "Skipped packages".yellow().bold(),
            report.skipped.len()
        );
        for skipped in &report.skipped {
            println!("  {}: {}", skipped.name, skipped.reason);
        }
    }

    println!();
    println!(
        "Cataloged {} package(s): {} MSI, {} all-users",
        report.cataloged, report.msi_count, report.all_users_count
    );
}
