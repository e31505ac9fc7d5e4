use anyhow::{Context, Result};
use cli::Cli;
use data::Expansion;
use indicatif::{ProgressBar, ProgressStyle};
use labels::LabelRun;
use std::process::ExitCode;

mod cli;
mod config;
mod data;
mod labels;
mod layout;
mod logging;
mod sinks;
mod units;

fn main() -> ExitCode {
    if let Err(e) = try_main() {
        eprintln!("{}: {e:#}", console::style("Error").red());
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn try_main() -> Result<()> {
    use clap::Parser;
    let cli = Cli::parse();
    logging::init(cli.log_level(), cli.logfile.as_deref(), cli.logformat.clone())?;

    if cli.newlabelfile.is_some() || cli.newfieldfile.is_some() {
        if let Some(path) = &cli.newlabelfile {
            config::create_label_file(path)
                .with_context(|| "Failed to create label type template")?;
        }
        if let Some(path) = &cli.newfieldfile {
            config::create_field_file(path)
                .with_context(|| "Failed to create field template")?;
        }
        return Ok(());
    }

    let Cli {
        label_file,
        label_type,
        field_file,
        data_file,
        output_file,
        quantity,
        enumeration,
        quiet,
        ..
    } = cli;
    let run = LabelRun {
        label_file,
        label_type: label_type.context("--labeltype is required")?,
        field_file,
        data_file: data_file.context("--datafile is required")?,
        output_file: output_file.context("--outputfile is required")?,
        expansion: quantity
            .zip(enumeration)
            .map(|(quantity, enumeration)| Expansion {
                quantity,
                enumeration,
            }),
    };

    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        let progress = ProgressBar::new(0);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .with_context(|| "Failed to parse progress style")?
                .progress_chars("#>-"),
        );
        progress.set_message("Rendering labels...");
        progress
    };

    let stats = run
        .render(&progress)
        .with_context(|| format!("Failed to create labels in {}", run.output_file.display()))?;

    if !quiet {
        println!(
            "Wrote {} label(s) on {} page(s) to {}",
            stats.label_count,
            stats.page_count,
            run.output_file.display()
        );
    }
    Ok(())
}
