//! CLI entry point for the AXI firewall generator binary.

use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use firewall_core::{ConfigWrite, Dimensions, FirewallConfig, RequestVector, ValidationHarness};
use firewall_gen as _;
use firewall_gen::errors::{GenError, LoadPolicy};
use firewall_gen::hdl::emit_hdl;
use firewall_gen::output::write_generated;
use firewall_gen::report::{render_log, render_summary};
use firewall_gen::request_format::load_requests;
use firewall_gen::rule_format::load_rules;
use firewall_gen::testbench::{emit_testbench, TestbenchConfig, TimeUnit};
use tracing::debug;
use tracing_subscriber::EnvFilter;
#[cfg(test)]
use rstest as _;
#[cfg(test)]
use tempfile as _;

const USAGE_TEXT: &str = "\
Usage: axi-firewall <command> [options]

Commands:
  hdl                            Emit rules_array.vhd, wrapper.vhd and interface_AXI.vhd
  testbench [<rules> <requests>] Emit Interface_AXI_tb.vhd from rule and request files
  check     [<rules> <requests>] Replay requests against the rules and report failures

Options:
  -d, --mem-depth <n>   Number of rule slots (default: 8)
  -w, --mem-width <n>   Rule word and data width in bits (default: 16)
  -o, --output <dir>    Output directory (default: .; hdl and testbench)
      --period <n>      Test-bench clock period (default: 10)
      --unit <unit>     Test-bench time unit: fs, ps, ns, us, ms, sec (default: us)
      --log <file>      Write the failure log to <file> (check only)
      --skip-malformed  Drop malformed records instead of aborting
  -h, --help            Show this help message

Input files default to memory_configuration.txt and request.txt.
Set RUST_LOG (e.g. RUST_LOG=debug) for diagnostic output on stderr.

Examples:
  axi-firewall hdl -d 16 -w 31 -o vhdl
  axi-firewall testbench rules.txt requests.txt --period 5 --unit ns
  axi-firewall check rules.txt requests.txt --log test_bench.log
";

const DEFAULT_RULES: &str = "memory_configuration.txt";
const DEFAULT_REQUESTS: &str = "request.txt";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Hdl(HdlArgs),
    Testbench(TestbenchArgs),
    Check(CheckArgs),
}

#[derive(Debug, PartialEq, Eq)]
struct HdlArgs {
    config: FirewallConfig,
    output: PathBuf,
}

#[derive(Debug, PartialEq, Eq)]
struct InputFiles {
    rules: PathBuf,
    requests: PathBuf,
}

#[derive(Debug, PartialEq, Eq)]
struct TestbenchArgs {
    config: FirewallConfig,
    inputs: InputFiles,
    output: PathBuf,
    timing: TestbenchConfig,
    policy: LoadPolicy,
}

#[derive(Debug, PartialEq, Eq)]
struct CheckArgs {
    config: FirewallConfig,
    inputs: InputFiles,
    log: Option<PathBuf>,
    policy: LoadPolicy,
}

#[derive(Debug)]
enum ParseResult {
    Command(Command),
    Help,
}

/// Every option any command accepts; each command rejects the ones it has no use for.
#[derive(Debug, Default)]
struct RawOptions {
    config: FirewallConfig,
    output: Option<PathBuf>,
    period: Option<u64>,
    unit: Option<TimeUnit>,
    log: Option<PathBuf>,
    skip_malformed: bool,
    positional: Vec<PathBuf>,
}

impl RawOptions {
    fn inputs(&mut self) -> Result<InputFiles, String> {
        let mut positional = std::mem::take(&mut self.positional).into_iter();
        let rules = positional
            .next()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_RULES));
        let requests = positional
            .next()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REQUESTS));
        if positional.next().is_some() {
            return Err("too many input paths provided".to_string());
        }
        Ok(InputFiles { rules, requests })
    }

    const fn policy(&self) -> LoadPolicy {
        if self.skip_malformed {
            LoadPolicy::Skip
        } else {
            LoadPolicy::Abort
        }
    }

    fn output(&mut self) -> PathBuf {
        self.output.take().unwrap_or_else(|| PathBuf::from("."))
    }

    fn timing(&self) -> TestbenchConfig {
        let defaults = TestbenchConfig::default();
        TestbenchConfig {
            period: self.period.unwrap_or(defaults.period),
            unit: self.unit.unwrap_or(defaults.unit),
        }
    }
}

fn parse_args(mut args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let first = args.next().ok_or_else(|| "missing command".to_string())?;

    if first == "--help" || first == "-h" {
        return Ok(ParseResult::Help);
    }

    let command_str = first.to_string_lossy().to_string();

    match command_str.as_str() {
        "hdl" => parse_hdl_args(args)
            .map(Command::Hdl)
            .map(ParseResult::Command),
        "testbench" => parse_testbench_args(args)
            .map(Command::Testbench)
            .map(ParseResult::Command),
        "check" => parse_check_args(args)
            .map(Command::Check)
            .map(ParseResult::Command),
        other => Err(format!("unknown command: {other}")),
    }
}

fn take_value(
    args: &mut impl Iterator<Item = OsString>,
    flag: &OsString,
) -> Result<String, String> {
    args.next()
        .map(|value| value.to_string_lossy().to_string())
        .ok_or_else(|| format!("missing value for {}", flag.to_string_lossy()))
}

fn parse_value<T: FromStr>(value: &str, flag: &OsString) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("invalid value for {}: {value}", flag.to_string_lossy()))
}

#[allow(clippy::while_let_on_iterator)]
fn parse_options(mut args: impl Iterator<Item = OsString>) -> Result<RawOptions, String> {
    let mut options = RawOptions::default();

    while let Some(arg) = args.next() {
        if arg == "--help" || arg == "-h" {
            return Err(USAGE_TEXT.to_string());
        }

        if arg == "-d" || arg == "--mem-depth" {
            let value = take_value(&mut args, &arg)?;
            options.config.depth = parse_value(&value, &arg)?;
            continue;
        }

        if arg == "-w" || arg == "--mem-width" {
            let value = take_value(&mut args, &arg)?;
            options.config.word_width = parse_value(&value, &arg)?;
            continue;
        }

        if arg == "-o" || arg == "--output" {
            options.output = Some(PathBuf::from(take_value(&mut args, &arg)?));
            continue;
        }

        if arg == "--period" {
            let value = take_value(&mut args, &arg)?;
            let period: u64 = parse_value(&value, &arg)?;
            if period == 0 {
                return Err("--period must be greater than zero".to_string());
            }
            options.period = Some(period);
            continue;
        }

        if arg == "--unit" {
            let value = take_value(&mut args, &arg)?;
            options.unit = Some(value.parse()?);
            continue;
        }

        if arg == "--log" {
            options.log = Some(PathBuf::from(take_value(&mut args, &arg)?));
            continue;
        }

        if arg == "--skip-malformed" {
            options.skip_malformed = true;
            continue;
        }

        if arg.to_string_lossy().starts_with('-') {
            return Err(format!("unknown option: {}", arg.to_string_lossy()));
        }

        options.positional.push(PathBuf::from(arg));
    }

    Ok(options)
}

fn reject(present: bool, option: &str, command: &str) -> Result<(), String> {
    if present {
        Err(format!("{option} is not accepted by {command}"))
    } else {
        Ok(())
    }
}

fn parse_hdl_args(args: impl Iterator<Item = OsString>) -> Result<HdlArgs, String> {
    let mut options = parse_options(args)?;
    reject(!options.positional.is_empty(), "an input path", "hdl")?;
    reject(options.log.is_some(), "--log", "hdl")?;
    reject(
        options.period.is_some() || options.unit.is_some(),
        "a test-bench timing option",
        "hdl",
    )?;
    reject(options.skip_malformed, "--skip-malformed", "hdl")?;

    Ok(HdlArgs {
        config: options.config,
        output: options.output(),
    })
}

fn parse_testbench_args(args: impl Iterator<Item = OsString>) -> Result<TestbenchArgs, String> {
    let mut options = parse_options(args)?;
    reject(options.log.is_some(), "--log", "testbench")?;

    Ok(TestbenchArgs {
        config: options.config,
        inputs: options.inputs()?,
        output: options.output(),
        timing: options.timing(),
        policy: options.policy(),
    })
}

fn parse_check_args(args: impl Iterator<Item = OsString>) -> Result<CheckArgs, String> {
    let mut options = parse_options(args)?;
    reject(options.output.is_some(), "--output", "check")?;
    reject(
        options.period.is_some() || options.unit.is_some(),
        "a test-bench timing option",
        "check",
    )?;

    Ok(CheckArgs {
        config: options.config,
        inputs: options.inputs()?,
        log: options.log.take(),
        policy: options.policy(),
    })
}

fn report_error(e: &GenError) {
    eprintln!("{}", e.format_for_stderr());
}

fn dimensions(config: &FirewallConfig) -> Result<Dimensions, i32> {
    let dims = config.dimensions().map_err(|e| {
        report_error(&e.into());
        1
    })?;
    debug!(
        depth = dims.depth(),
        word_width = dims.word_width(),
        id_width = dims.id_width(),
        addr_width = dims.addr_width(),
        "derived dimensions"
    );
    Ok(dims)
}

fn load_inputs(
    inputs: &InputFiles,
    dims: &Dimensions,
    policy: LoadPolicy,
) -> Result<(Vec<ConfigWrite>, Vec<RequestVector>), GenError> {
    let rules = load_rules(&inputs.rules, dims)?.resolve(policy, &inputs.rules)?;
    let requests = load_requests(&inputs.requests, dims)?.resolve(policy, &inputs.requests)?;
    Ok((rules, requests))
}

fn print_written(paths: &[PathBuf]) {
    for path in paths {
        println!("Generated {}", path.display());
    }
}

fn run_hdl(args: &HdlArgs) -> Result<(), i32> {
    let dims = dimensions(&args.config)?;

    let written = write_generated(&args.output, &emit_hdl(&dims)).map_err(|e| {
        report_error(&e);
        1
    })?;
    print_written(&written);

    Ok(())
}

fn run_testbench(args: &TestbenchArgs) -> Result<(), i32> {
    let dims = dimensions(&args.config)?;

    let result = load_inputs(&args.inputs, &dims, args.policy)
        .and_then(|(rules, requests)| emit_testbench(&dims, &args.timing, &rules, &requests))
        .and_then(|bench| write_generated(&args.output, &[bench]));

    match result {
        Ok(written) => {
            print_written(&written);
            Ok(())
        }
        Err(e) => {
            report_error(&e);
            Err(1)
        }
    }
}

fn write_log(path: &Path, contents: &str) -> Result<(), GenError> {
    fs::write(path, contents).map_err(|e| GenError::io(path, &e))
}

fn run_check(args: &CheckArgs) -> Result<(), i32> {
    let dims = dimensions(&args.config)?;

    let (rules, requests) = load_inputs(&args.inputs, &dims, args.policy).map_err(|e| {
        report_error(&e);
        1
    })?;

    let mut harness = ValidationHarness::new(dims);
    for failure in harness.configure(&rules) {
        eprintln!(
            "{}: error: rule for slot {} rejected: {}",
            args.inputs.rules.display(),
            failure.index,
            failure.error
        );
    }
    let report = harness.run(&requests);

    for outcome in report.failures() {
        println!("test {} FAILED: {}", outcome.test_number, outcome.context);
    }

    println!();
    println!("{}", render_summary(&report));

    if let Some(log) = &args.log {
        if let Err(e) = write_log(log, &render_log(&report)) {
            report_error(&e);
            return Err(1);
        }
    }

    if report.all_passed() {
        Ok(())
    } else {
        Err(1)
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() {
    init_tracing();

    let exit_code = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Help) => {
            println!("{USAGE_TEXT}");
            0
        }
        Ok(ParseResult::Command(command)) => {
            let result = match command {
                Command::Hdl(args) => run_hdl(&args),
                Command::Testbench(args) => run_testbench(&args),
                Command::Check(args) => run_check(&args),
            };
            match result {
                Ok(()) => 0,
                Err(code) => code,
            }
        }
        Err(error) => {
            if error.starts_with("Usage:") {
                println!("{error}");
            } else {
                eprintln!("error: {error}");
                eprintln!("{USAGE_TEXT}");
            }
            1
        }
    };

    std::process::exit(exit_code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::ffi::OsString;
    use std::path::PathBuf;

    fn os(args: &[&str]) -> impl Iterator<Item = OsString> {
        args.iter()
            .map(|arg| OsString::from(*arg))
            .collect::<Vec<_>>()
            .into_iter()
    }

    #[test]
    fn parses_hdl_command() {
        let result = parse_hdl_args(os(&["-d", "16", "--mem-width", "31", "-o", "vhdl"]))
            .expect("valid hdl args should parse");

        assert_eq!(
            result,
            HdlArgs {
                config: FirewallConfig {
                    depth: 16,
                    word_width: 31,
                },
                output: PathBuf::from("vhdl"),
            }
        );
    }

    #[test]
    fn testbench_defaults_inputs_and_timing() {
        let result =
            parse_testbench_args(os(&[])).expect("testbench without args should parse");

        assert_eq!(
            result,
            TestbenchArgs {
                config: FirewallConfig::default(),
                inputs: InputFiles {
                    rules: PathBuf::from("memory_configuration.txt"),
                    requests: PathBuf::from("request.txt"),
                },
                output: PathBuf::from("."),
                timing: TestbenchConfig::default(),
                policy: LoadPolicy::Abort,
            }
        );
    }

    #[test]
    fn parses_testbench_timing() {
        let result = parse_testbench_args(os(&[
            "rules.txt",
            "reqs.txt",
            "--period",
            "5",
            "--unit",
            "ns",
            "--skip-malformed",
        ]))
        .expect("timing options should parse");

        assert_eq!(result.inputs.rules, PathBuf::from("rules.txt"));
        assert_eq!(result.inputs.requests, PathBuf::from("reqs.txt"));
        assert_eq!(
            result.timing,
            TestbenchConfig {
                period: 5,
                unit: TimeUnit::Ns,
            }
        );
        assert_eq!(result.policy, LoadPolicy::Skip);
    }

    #[test]
    fn parses_check_with_log() {
        let result = parse_check_args(os(&["r.txt", "--log", "out.log"]))
            .expect("check args should parse");

        assert_eq!(result.inputs.rules, PathBuf::from("r.txt"));
        assert_eq!(result.inputs.requests, PathBuf::from("request.txt"));
        assert_eq!(result.log, Some(PathBuf::from("out.log")));
    }

    #[test]
    fn parses_help_flag() {
        let result = parse_args(os(&["--help"])).expect("help should parse without error");
        assert!(matches!(result, ParseResult::Help));
    }

    #[test]
    fn subcommand_help_returns_usage() {
        let error = parse_check_args(os(&["-h"])).expect_err("help inside a command");
        assert!(error.starts_with("Usage:"));
    }

    #[test]
    fn rejects_unknown_command() {
        let error = parse_args(os(&["unknown"])).expect_err("unknown command should fail parse");
        assert!(error.contains("unknown command"));
    }

    #[rstest]
    #[case::hdl_inputs(&["hdl", "rules.txt"], "input path")]
    #[case::hdl_log(&["hdl", "--log", "x"], "--log")]
    #[case::check_output(&["check", "-o", "dir"], "--output")]
    #[case::check_timing(&["check", "--unit", "ns"], "timing")]
    #[case::testbench_log(&["testbench", "--log", "x"], "--log")]
    #[case::extra_input(&["check", "a", "b", "c"], "too many")]
    #[case::missing_value(&["hdl", "-d"], "missing value")]
    #[case::bad_number(&["hdl", "-w", "wide"], "invalid value")]
    #[case::zero_period(&["testbench", "--period", "0"], "greater than zero")]
    #[case::bad_unit(&["testbench", "--unit", "minutes"], "unknown time unit")]
    #[case::unknown_option(&["check", "--verbose"], "unknown option")]
    fn rejects_invalid_options(#[case] args: &[&str], #[case] message: &str) {
        let error = parse_args(os(args)).expect_err("invalid options should fail parse");
        assert!(error.contains(message), "{error}");
    }
}
