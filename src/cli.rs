use std::env;
use std::path::PathBuf;

use kompensator::types::MeteringRecord;

/// Default port for `--serve`.
#[cfg(feature = "api")]
pub const DEFAULT_PORT: u16 = 3000;

/// Where the metering data comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// One record from `--energy`/`--months`/`--tgphi`/`--active-power`/`--pv`.
    Manual(MeteringRecord),
    /// Extraction outcomes from a CSV batch.
    Invoices {
        path: PathBuf,
        has_photovoltaic: bool,
    },
}

pub struct CliOptions {
    pub input: Option<Input>,
    pub config: Option<PathBuf>,
    pub preset: Option<String>,
    pub list_devices: bool,
    pub report_out: Option<PathBuf>,
    #[cfg(feature = "api")]
    pub serve: bool,
    #[cfg(feature = "api")]
    pub port: u16,
}

pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(args)
}

fn parse_args_from(args: Vec<String>) -> Result<CliOptions, String> {
    if args.len() == 1 && (args[0] == "--help" || args[0] == "-h") {
        print_usage();
        std::process::exit(0);
    }
    parse_options(&args)
}

fn parse_options(args: &[String]) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut energy: Option<f64> = None;
    let mut months: Option<u32> = None;
    let mut tangent: Option<f64> = None;
    let mut active_power: Option<f64> = None;
    let mut has_pv = false;
    let mut invoices: Option<PathBuf> = None;
    let mut config = None;
    let mut preset = None;
    let mut list_devices = false;
    let mut report_out = None;
    #[cfg(feature = "api")]
    let mut serve = false;
    #[cfg(feature = "api")]
    let mut port = DEFAULT_PORT;

    while i < args.len() {
        match args[i].as_str() {
            "--energy" => {
                i += 1;
                let v = parse_value::<f64>(args, i, "--energy", "reactive energy in kvarh")?;
                if energy.replace(v).is_some() {
                    return Err("--energy provided more than once".to_string());
                }
            }
            "--months" => {
                i += 1;
                let v = parse_value::<u32>(args, i, "--months", "a whole number of months")?;
                if months.replace(v).is_some() {
                    return Err("--months provided more than once".to_string());
                }
            }
            "--tgphi" => {
                i += 1;
                let v = parse_value::<f64>(args, i, "--tgphi", "a power factor tangent")?;
                if tangent.replace(v).is_some() {
                    return Err("--tgphi provided more than once".to_string());
                }
            }
            "--active-power" => {
                i += 1;
                let v = parse_value::<f64>(args, i, "--active-power", "active power in kW")?;
                if active_power.replace(v).is_some() {
                    return Err("--active-power provided more than once".to_string());
                }
            }
            "--pv" => has_pv = true,
            "--invoices" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --invoices (expected a CSV file path)",
                )?;
                if invoices.replace(PathBuf::from(path)).is_some() {
                    return Err("--invoices provided more than once".to_string());
                }
            }
            "--config" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --config (expected a TOML file path)",
                )?;
                if config.replace(PathBuf::from(path)).is_some() {
                    return Err("--config provided more than once".to_string());
                }
            }
            "--preset" => {
                i += 1;
                let name = args.next_or_err(
                    i,
                    "missing value for --preset (expected a preset name)",
                )?;
                if preset.replace(name.to_string()).is_some() {
                    return Err("--preset provided more than once".to_string());
                }
            }
            "--list-devices" => list_devices = true,
            "--report-out" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --report-out (expected a file path)",
                )?;
                if report_out.replace(PathBuf::from(path)).is_some() {
                    return Err("--report-out provided more than once".to_string());
                }
            }
            #[cfg(feature = "api")]
            "--serve" => serve = true,
            #[cfg(feature = "api")]
            "--port" => {
                i += 1;
                port = parse_value::<u16>(args, i, "--port", "a u16 port")?;
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if config.is_some() && preset.is_some() {
        return Err(
            "arguments `--config` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }

    let manual_flags = months.is_some() || tangent.is_some() || active_power.is_some();
    let input = match (energy, invoices) {
        (Some(_), Some(_)) => {
            return Err(
                "arguments `--energy` and `--invoices` are mutually exclusive; choose one input"
                    .to_string(),
            );
        }
        (Some(e), None) => {
            let mut record = MeteringRecord::new(e, months.unwrap_or(1)).with_photovoltaic(has_pv);
            record.power_factor_tangent = tangent;
            record.active_power_kw = active_power;
            Some(Input::Manual(record))
        }
        (None, Some(path)) => {
            if manual_flags {
                return Err(
                    "--months, --tgphi and --active-power only apply with --energy".to_string(),
                );
            }
            Some(Input::Invoices {
                path,
                has_photovoltaic: has_pv,
            })
        }
        (None, None) => {
            if manual_flags {
                return Err("--energy is required for a manual calculation".to_string());
            }
            None
        }
    };

    #[cfg(feature = "api")]
    let idle = input.is_none() && !list_devices && !serve;
    #[cfg(not(feature = "api"))]
    let idle = input.is_none() && !list_devices;
    if idle {
        return Err("nothing to do: give --energy, --invoices or --list-devices".to_string());
    }

    if report_out.is_some() && input.is_none() {
        return Err("--report-out needs a calculation (--energy or --invoices)".to_string());
    }

    Ok(CliOptions {
        input,
        config,
        preset,
        list_devices,
        report_out,
        #[cfg(feature = "api")]
        serve,
        #[cfg(feature = "api")]
        port,
    })
}

fn parse_value<T: std::str::FromStr>(
    args: &[String],
    index: usize,
    flag: &str,
    expected: &str,
) -> Result<T, String> {
    let raw = args.next_or_err(index, &format!("missing value for {flag} (expected {expected})"))?;
    raw.parse::<T>()
        .map_err(|_| format!("{flag} value \"{raw}\" is not {expected}"))
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("kompensator: reactive-power compensator sizing");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  kompensator --energy <kvarh> [--months <n>] [--tgphi <x>] [--active-power <kw>] [--pv]");
    eprintln!("  kompensator --invoices <csv> [--pv]");
    eprintln!("  kompensator --list-devices");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>        Load engine settings from a TOML file");
    eprintln!("  --preset <name>        Use a built-in preset (tiered, flat)");
    eprintln!("  --report-out <path>    Export the result to CSV");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                Start the REST API server");
        eprintln!("  --port <u16>           API server port (default: 3000)");
    }
    eprintln!("  --help                 Show this help message");
    eprintln!();
    eprintln!("Log verbosity follows RUST_LOG (default: kompensator=info).");
}
