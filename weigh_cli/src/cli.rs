//! CLI argument definitions and shared statics.

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;
use weigh_traits::ReadingSlot;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "weigh", version, about = "Stable-weight capture CLI")]
pub struct Cli {
    /// Path to config TOML (typed). Without it the built-in simulator defaults apply.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Optional fleet CSV (strict header) used to look up vehicles
    #[arg(long, value_name = "FILE")]
    pub fleet: Option<PathBuf>,

    /// Print results and errors as JSON instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Also write the result as pretty JSON to this file (atomic replace)
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Single-reading slots selectable on the command line.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum SlotArg {
    Gross,
    Tare,
}

impl From<SlotArg> for ReadingSlot {
    fn from(s: SlotArg) -> Self {
        match s {
            SlotArg::Gross => ReadingSlot::Gross,
            SlotArg::Tare => ReadingSlot::Tare,
        }
    }
}

/// Knobs shared by every capturing command.
#[derive(Args, Debug, Clone, Default)]
pub struct CaptureOpts {
    /// Give up a capture after this many ms (overrides capture.max_wait_ms; 0 = never)
    #[arg(long, value_name = "MS")]
    pub max_wait_ms: Option<u64>,
    /// Poll from the main thread instead of a background poller
    #[arg(long, action = ArgAction::SetTrue)]
    pub direct: bool,
    /// Commit the latest reading after this many ms even if it never settled
    #[arg(
        long,
        value_name = "MS",
        long_help = "Operator override: once this many milliseconds have passed, commit the most recent reading whether or not it is stable.\n\nUseful with capture.auto_capture = false, where nothing is committed unless someone asks for it."
    )]
    pub capture_after_ms: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Capture one stable gross or tare weight
    Capture {
        #[arg(value_enum)]
        slot: SlotArg,
        /// Enter the weight by hand instead of reading the configured source
        #[arg(long, value_name = "WEIGHT")]
        weight: Option<f64>,
        #[command(flatten)]
        opts: CaptureOpts,
    },
    /// Capture every axle of a vehicle in order and report the total
    Axles {
        /// Vehicle to look up (fleet CSV or [vehicle]); defaults to the configured vehicle
        #[arg(long, value_name = "ID")]
        vehicle: Option<String>,
        #[command(flatten)]
        opts: CaptureOpts,
    },
    /// Capture gross then tare and print the net weight
    ///
    /// The gross is checked against [vehicle].max_gross when one is configured.
    Ticket {
        #[command(flatten)]
        opts: CaptureOpts,
    },
    /// Quick health check (config valid, source answers one poll)
    SelfCheck,
}
