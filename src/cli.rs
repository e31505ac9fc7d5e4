use crate::logging::LogFormat;
use clap::{ArgGroup, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
#[clap(group(ArgGroup::new("level").args(["debug", "info", "warn", "error"])))]
pub struct Cli {
    /// Creates an empty CSV file for label types
    #[clap(long, value_name = "PATH", conflicts_with_all = ["label_type", "output_file", "data_file"])]
    pub newlabelfile: Option<PathBuf>,

    /// CSV file defining the label types
    #[clap(long = "labelfile", value_name = "PATH", default_value = "labeltypes.csv")]
    pub label_file: PathBuf,

    /// Name of the label type to be used
    #[clap(
        long = "labeltype",
        value_name = "NAME",
        required_unless_present_any = ["newlabelfile", "newfieldfile"]
    )]
    pub label_type: Option<String>,

    /// Creates an empty CSV file for label fields
    #[clap(long, value_name = "PATH", conflicts_with_all = ["label_type", "output_file", "data_file"])]
    pub newfieldfile: Option<PathBuf>,

    /// CSV file defining the label fields
    #[clap(long = "fieldfile", value_name = "PATH", default_value = "labelfields.csv")]
    pub field_file: PathBuf,

    /// CSV file containing data for labels
    #[clap(
        long = "datafile",
        value_name = "PATH",
        required_unless_present_any = ["newlabelfile", "newfieldfile"]
    )]
    pub data_file: Option<PathBuf>,

    /// Name of PDF file to be created
    #[clap(
        long = "outputfile",
        value_name = "PATH",
        required_unless_present_any = ["newlabelfile", "newfieldfile"]
    )]
    pub output_file: Option<PathBuf>,

    /// Column holding the number of casks of the given beer
    #[clap(long, value_name = "COLUMN", requires = "enumeration")]
    pub quantity: Option<String>,

    /// Generated column numbering each cask from 1
    #[clap(long = "enum", value_name = "COLUMN", requires = "quantity")]
    pub enumeration: Option<String>,

    /// Turns on debug logging
    #[clap(long)]
    pub debug: bool,

    /// Turns on info logging
    #[clap(long)]
    pub info: bool,

    /// Only logs warnings and errors (the default)
    #[clap(long)]
    pub warn: bool,

    /// Only logs errors
    #[clap(long)]
    pub error: bool,

    /// Layout of log messages, e.g. "{timestamp} {level} {message}"
    #[clap(long, value_name = "FORMAT")]
    pub logformat: Option<LogFormat>,

    /// Writes log messages to this file instead of stderr
    #[clap(long, value_name = "PATH")]
    pub logfile: Option<PathBuf>,

    /// Hides the progress bar and summary
    #[clap(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// The log level picked on the command line, if any.
    pub fn log_level(&self) -> Option<log::LevelFilter> {
        if self.debug {
            Some(log::LevelFilter::Debug)
        } else if self.info {
            Some(log::LevelFilter::Info)
        } else if self.warn {
            Some(log::LevelFilter::Warn)
        } else if self.error {
            Some(log::LevelFilter::Error)
        } else {
            None
        }
    }
}
