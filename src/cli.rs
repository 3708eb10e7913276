use crate::clusters::ClusterSelection;
use crate::utils::Result;
use chrono::Datelike;
use clap::{ArgAction, ArgGroup, Args, Parser, Subcommand};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use once_cell::sync::Lazy;
use std::{
    io::Write,
    path::{Path, PathBuf},
};

pub static FULL_VERSION: Lazy<String> = Lazy::new(|| {
    format!(
        "{}-{}",
        env!("CARGO_PKG_VERSION"),
        env!("VERGEN_GIT_DESCRIBE")
    )
});

#[derive(Parser)]
#[command(name="phylocnv",
          author="Stephen Nayfach <snayfach@gladstone.ucsf.edu>",
          version=&**FULL_VERSION,
          about="Estimate the abundance, gene content and allele frequencies of microbes from metagenomes",
          long_about = None,
          disable_help_subcommand = true,
          after_help = format!("Copyright (C) 2015-{}     Stephen Nayfach
Freely distributed under the GNU General Public License (GPLv3)", chrono::Utc::now().year()),
          help_template = "{name} {version}\n{author}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[clap(short = 'v')]
    #[clap(long = "verbose")]
    #[clap(action = ArgAction::Count, help = "Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)")]
    pub verbosity: u8,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Assign each read to its best-hit genome cluster")]
    Map(MapArgs),
    #[clap(about = "Estimate pangene coverage and copy number")]
    Cov(CovArgs),
    #[clap(about = "Write reassigned reads of each genome cluster to FASTQ")]
    Extract(ExtractArgs),
    #[clap(about = "Call consensus alleles and reference allele frequencies")]
    Snps(SnpsArgs),
}

#[derive(Args, Debug)]
pub struct CommonArgs {
    #[clap(required = true)]
    #[clap(short = 'o')]
    #[clap(long = "out")]
    #[clap(help = "Output directory")]
    #[clap(value_name = "OUT")]
    #[arg(value_parser = check_dir_exists)]
    pub out_dir: PathBuf,

    #[clap(required = true)]
    #[clap(short = 'd')]
    #[clap(long = "db-dir")]
    #[clap(help = "Reference database directory with one sub-directory per genome cluster")]
    #[clap(value_name = "DB_DIR")]
    #[arg(value_parser = check_dir_exists)]
    pub db_dir: PathBuf,

    #[clap(short = 't')]
    #[clap(long = "threads")]
    #[clap(help = "Number of threads")]
    #[clap(value_name = "THREADS")]
    #[clap(default_value = "1")]
    #[arg(value_parser = threads_in_range)]
    pub num_threads: usize,
}

#[derive(Args, Debug, Default)]
#[command(group(ArgGroup::new("selection").multiple(false)))]
pub struct SelectionArgs {
    #[clap(help_heading("Genome-cluster selection"))]
    #[clap(long = "gc-id")]
    #[clap(value_name = "ID")]
    #[clap(help = "Use a single genome cluster")]
    #[clap(group = "selection")]
    pub gc_id: Option<String>,

    #[clap(help_heading("Genome-cluster selection"))]
    #[clap(long = "gc-list")]
    #[clap(value_name = "IDS")]
    #[clap(help = "Comma-separated list of genome clusters")]
    #[clap(group = "selection")]
    pub gc_list: Option<String>,

    #[clap(help_heading("Genome-cluster selection"))]
    #[clap(long = "gc-cov")]
    #[clap(value_name = "COV")]
    #[clap(help = "Genome clusters with at least this coverage")]
    #[clap(group = "selection")]
    #[arg(value_parser = ensure_non_negative_float)]
    pub gc_cov: Option<f64>,

    #[clap(help_heading("Genome-cluster selection"))]
    #[clap(long = "gc-rbun")]
    #[clap(value_name = "FRAC")]
    #[clap(help = "Genome clusters with at least this relative abundance")]
    #[clap(group = "selection")]
    #[arg(value_parser = ensure_unit_float)]
    pub gc_rbun: Option<f64>,

    #[clap(help_heading("Genome-cluster selection"))]
    #[clap(long = "gc-topn")]
    #[clap(value_name = "N")]
    #[clap(help = "The N most abundant genome clusters")]
    #[clap(group = "selection")]
    pub gc_topn: Option<usize>,
}

impl SelectionArgs {
    pub fn selection(&self) -> ClusterSelection {
        if let Some(id) = &self.gc_id {
            ClusterSelection::Id(id.clone())
        } else if let Some(list) = &self.gc_list {
            ClusterSelection::List(
                list.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect(),
            )
        } else if let Some(cov) = self.gc_cov {
            ClusterSelection::MinCoverage(cov)
        } else if let Some(rbun) = self.gc_rbun {
            ClusterSelection::MinRelAbundance(rbun)
        } else if let Some(n) = self.gc_topn {
            ClusterSelection::TopN(n)
        } else {
            ClusterSelection::All
        }
    }
}

#[derive(Parser, Debug)]
#[command(arg_required_else_help(true))]
pub struct MapArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub selection: SelectionArgs,

    #[clap(long = "pid")]
    #[clap(value_name = "PID")]
    #[clap(help = "Minimum percent identity of an alignment to compete for a read")]
    #[clap(default_value = "93")]
    #[arg(value_parser = ensure_percent)]
    pub pid_min: f64,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "seed")]
    #[clap(value_name = "SEED")]
    #[clap(help = "Seed for breaking ties between equally good genome clusters")]
    #[clap(default_value = "1")]
    pub seed: u64,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "tax-mask")]
    #[clap(help = "Discard alignments to the genome each read was simulated from")]
    #[clap(requires = "tax_map")]
    pub tax_mask: bool,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "tax-map")]
    #[clap(value_name = "FILE")]
    #[clap(help = "Tab-delimited map of read run accession to source genome id")]
    #[arg(value_parser = check_file_exists)]
    pub tax_map: Option<PathBuf>,
}

#[derive(Parser, Debug)]
#[command(arg_required_else_help(true))]
pub struct CovArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub selection: SelectionArgs,

    #[clap(help_heading("Advanced"))]
    #[clap(long = "bedcov")]
    #[clap(value_name = "COMMAND")]
    #[clap(help = "Interval coverage command, run as '<COMMAND> -abam <BAM> -b <BED>'")]
    #[clap(default_value = "coverageBed")]
    pub bedcov: String,
}

#[derive(Parser, Debug)]
#[command(arg_required_else_help(true))]
pub struct ExtractArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub selection: SelectionArgs,
}

#[derive(Parser, Debug)]
#[command(arg_required_else_help(true))]
pub struct SnpsArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub selection: SelectionArgs,
}

pub fn init_verbose(args: &Cli) {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };

    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            let level = record.level();
            let mut style = buf.style();
            match record.level() {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                style.value(level),
                record.args()
            )
        })
        .filter_level(filter_level)
        .init();
}

fn threads_in_range(s: &str) -> Result<usize> {
    let thread: usize = s
        .parse()
        .map_err(|_| format!("`{}` is not a valid thread number", s))?;
    if thread >= 1 {
        Ok(thread)
    } else {
        Err("Number of threads must be at least 1".into())
    }
}

fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        Err(format!("File does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn check_dir_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.is_dir() {
        Err(format!("Directory does not exist: {}", path.display()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn parse_float(s: &str) -> Result<f64> {
    s.parse::<f64>()
        .map_err(|e| format!("Could not parse float: {}", e))
}

fn ensure_unit_float(s: &str) -> Result<f64> {
    let value = parse_float(s)?;
    if !(0.0..=1.0).contains(&value) {
        Err(format!(
            "The value must be between 0.0 and 1.0, got: {}",
            value
        ))
    } else {
        Ok(value)
    }
}

fn ensure_percent(s: &str) -> Result<f64> {
    let value = parse_float(s)?;
    if !(0.0..=100.0).contains(&value) {
        Err(format!("The value must be between 0 and 100, got: {}", value))
    } else {
        Ok(value)
    }
}

fn ensure_non_negative_float(s: &str) -> Result<f64> {
    let value = parse_float(s)?;
    if value < 0.0 || !value.is_finite() {
        Err(format!("The value must be non-negative, got: {}", value))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> std::result::Result<Cli, clap::Error> {
        Cli::try_parse_from(args)
    }

    #[test]
    fn test_ensure_percent() {
        assert_eq!(ensure_percent("97.5"), Ok(97.5));
        assert!(ensure_percent("101").is_err());
        assert!(ensure_percent("abc").is_err());
    }

    #[test]
    fn test_selection_defaults_to_all() {
        assert_eq!(SelectionArgs::default().selection(), ClusterSelection::All);
    }

    #[test]
    fn test_selection_list() {
        let args = SelectionArgs {
            gc_list: Some("57955, 56116,".to_string()),
            ..Default::default()
        };
        assert_eq!(
            args.selection(),
            ClusterSelection::List(vec!["57955".into(), "56116".into()])
        );
    }

    #[test]
    fn test_map_args() {
        let dir = tempfile::tempdir().unwrap();
        let d = dir.path().to_str().unwrap();
        let cli = parse(&["phylocnv", "map", "-o", d, "-d", d, "--gc-topn", "3"]).unwrap();
        match cli.command {
            Command::Map(args) => {
                assert_eq!(args.pid_min, 93.0);
                assert_eq!(args.selection.selection(), ClusterSelection::TopN(3));
                assert!(!args.tax_mask);
            }
            _ => panic!("expected map"),
        }
    }

    #[test]
    fn test_selection_options_are_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let d = dir.path().to_str().unwrap();
        assert!(parse(&[
            "phylocnv", "cov", "-o", d, "-d", d, "--gc-topn", "3", "--gc-id", "57955"
        ])
        .is_err());
    }

    #[test]
    fn test_tax_mask_requires_map() {
        let dir = tempfile::tempdir().unwrap();
        let d = dir.path().to_str().unwrap();
        assert!(parse(&["phylocnv", "map", "-o", d, "-d", d, "--tax-mask"]).is_err());
    }
}
