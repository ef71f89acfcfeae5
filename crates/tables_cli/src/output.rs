use colored::*;
use tables_validator::Report;

pub fn print_validation_report(report: &Report, format: &str) {
    match format {
        "json" => print_json_report(report),
        _ => print_text_report(report),
    }
}

fn print_text_report(report: &Report) {
    println!("\n{}", "═".repeat(60));
    println!("{}", "  VALIDATION REPORT".bold());
    println!("{}", "═".repeat(60));

    if report.valid {
        println!("\n{} {}", "✓".green().bold(), "Validation PASSED".green().bold());
    } else {
        println!("\n{} {}", "✗".red().bold(), "Validation FAILED".red().bold());
    }

    if !report.errors.is_empty() {
        println!("\n{}", "Errors:".red().bold());
        for (i, error) in report.errors.iter().enumerate() {
            println!("  {}. {} {}", i + 1, error.code().bold(), error.message().red());
        }
    }

    for task in &report.tasks {
        let status = if task.valid { "valid".green() } else { "invalid".red() };
        println!("\n{} {} ({})", "Table:".bold(), task.place, status);

        if !task.errors.is_empty() {
            println!("\n{}", "Errors:".red().bold());
            for (i, error) in task.errors.iter().enumerate() {
                let position = match (error.row_number(), error.field_number()) {
                    (Some(row), Some(field)) => format!("[row {row}, field {field}] "),
                    (Some(row), None) => format!("[row {row}] "),
                    (None, Some(field)) => format!("[field {field}] "),
                    (None, None) => String::new(),
                };
                println!(
                    "  {}. {}{} {}",
                    i + 1,
                    position,
                    error.code().bold(),
                    error.message().red()
                );
            }
        }

        if !task.warnings.is_empty() {
            println!("\n{}", "Warnings:".yellow().bold());
            for (i, warning) in task.warnings.iter().enumerate() {
                println!("  {}. {}", i + 1, warning.yellow());
            }
        }

        println!("\n{}", "Summary:".bold());
        println!("  Rows checked:   {}", task.stats.rows);
        println!("  Total errors:   {}", task.stats.errors);
        println!("  Total warnings: {}", task.stats.warnings);
        println!("  Seconds:        {}", task.stats.seconds);
    }
    println!("{}", "═".repeat(60));
}

fn print_json_report(report: &Report) {
    match serde_json::to_string_pretty(report) {
        Ok(output) => println!("{output}"),
        Err(err) => print_error(&format!("Failed to serialize report: {err}")),
    }
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.green());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message.red());
}
