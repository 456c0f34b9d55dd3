//! knit generator CLI.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use knit_diagnostic::DiagnosticQueue;
use knit_ir::Host;
use knitc::{load_model, run, DirSink, GenerateOptions, MemorySink};

fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        return ExitCode::FAILURE;
    }

    match args[1].as_str() {
        "generate" => generate(&args[2..]),
        "check" => check(&args[2..]),
        "help" | "--help" | "-h" => {
            print_usage();
            ExitCode::SUCCESS
        }
        other => {
            eprintln!("error: unknown command `{other}`");
            print_usage();
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_env("KNIT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_usage() {
    eprintln!("Usage: knitc <command> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  generate <model.json>   Generate companion sources");
    eprintln!("    --out <dir>           Output directory (default: generated)");
    eprintln!("    --rounds <n>          Round budget (default: 8)");
    eprintln!("  check <model.json>      Analyze without writing artifacts");
}

struct GenerateArgs {
    model: String,
    out_dir: PathBuf,
    rounds: Option<u32>,
}

fn parse_generate_args(args: &[String]) -> Result<GenerateArgs, String> {
    let mut model: Option<String> = None;
    let mut out_dir = PathBuf::from("generated");
    let mut rounds: Option<u32> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--out" if i + 1 < args.len() => {
                out_dir = PathBuf::from(&args[i + 1]);
                i += 2;
            }
            "--rounds" if i + 1 < args.len() => {
                rounds = Some(
                    args[i + 1]
                        .parse()
                        .map_err(|_| format!("--rounds expects a number, got `{}`", args[i + 1]))?,
                );
                i += 2;
            }
            arg if !arg.starts_with('-') && model.is_none() => {
                model = Some(arg.to_owned());
                i += 1;
            }
            other => return Err(format!("unexpected argument `{other}`")),
        }
    }

    match model {
        Some(model) => Ok(GenerateArgs {
            model,
            out_dir,
            rounds,
        }),
        None => Err("missing model file".to_owned()),
    }
}

fn generate(args: &[String]) -> ExitCode {
    let parsed = match parse_generate_args(args) {
        Ok(parsed) => parsed,
        Err(message) => {
            eprintln!("error: {message}");
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    let mut host = match load_model(Path::new(&parsed.model)) {
        Ok(host) => host,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut options = GenerateOptions::default();
    if let Some(rounds) = parsed.rounds {
        options.max_rounds = rounds;
    }

    let mut sink = DirSink::new(parsed.out_dir);
    let mut diags = DiagnosticQueue::new();
    let summary = match run(&mut host, &mut sink, &mut diags, &options) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("error: failed to write artifacts: {e}");
            return ExitCode::FAILURE;
        }
    };

    report(&host, &diags);
    eprintln!(
        "generated {} module(s) in {} round(s), {} failed",
        summary.generated, summary.rounds, summary.failed
    );
    if diags.has_errors() || summary.failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn check(args: &[String]) -> ExitCode {
    let Some(model) = args.first() else {
        eprintln!("error: missing model file");
        print_usage();
        return ExitCode::FAILURE;
    };

    let mut host = match load_model(Path::new(model)) {
        Ok(host) => host,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut sink = MemorySink::new();
    let mut diags = DiagnosticQueue::new();
    let summary = match run(&mut host, &mut sink, &mut diags, &GenerateOptions::default()) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    report(&host, &diags);
    if diags.has_errors() || summary.failed > 0 {
        ExitCode::FAILURE
    } else {
        eprintln!("ok: {} module(s), {} round(s)", summary.generated, summary.rounds);
        ExitCode::SUCCESS
    }
}

fn report(host: &Host, diags: &DiagnosticQueue) {
    for diagnostic in diags.iter() {
        match diagnostic.origin {
            Some(origin) => eprintln!("{diagnostic}\n  --> {}", host.describe(origin)),
            None => eprintln!("{diagnostic}"),
        }
    }
}
