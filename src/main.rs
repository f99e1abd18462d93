use std::env;
use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use godeco::{
    generate, parse, GenerateOptions, GodecoConfig, Gofmt, Passthrough, SourceDb,
    SourceFormatter,
};

#[derive(Parser, Debug)]
#[command(
    name = "godeco",
    version,
    about = "Generate a decorator implementation for a Go interface",
    after_help = "Example:\n  godeco --type Store store.go > store_decorator.go"
)]
struct Cli {
    /// Interface name
    #[arg(
        short = 't',
        long = "type",
        value_name = "NAME",
        required_unless_present = "dump_model"
    )]
    type_name: Option<String>,

    /// Additional path to import (can be repeated)
    #[arg(short, long = "import", value_name = "PATH")]
    imports: Vec<String>,

    /// Write the generated code to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    out: Option<PathBuf>,

    /// Skip formatting the generated code
    #[arg(long)]
    no_format: bool,

    /// Formatter binary (default: gofmt)
    #[arg(long, value_name = "PROGRAM")]
    gofmt: Option<String>,

    /// Configuration file (default: ./godeco.toml when present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the parsed interfaces and imports as JSON instead of generating
    #[arg(long)]
    dump_model: bool,

    /// Enable verbose debug logging (or set GODECO_DEBUG=1)
    #[arg(short, long)]
    debug: bool,

    /// Go source file (stdin when omitted)
    file: Option<PathBuf>,
}

/// Marks an error that has already been printed with source context.
#[derive(Debug)]
struct Reported;

impl fmt::Display for Reported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("error already reported")
    }
}

impl std::error::Error for Reported {}

/// Diagnostics on stderr.
struct Log {
    debug: bool,
    color: ColorChoice,
}

impl Log {
    fn new(debug: bool) -> Self {
        let from_env = matches!(
            env::var("GODECO_DEBUG"),
            Ok(val) if val == "1" || val.eq_ignore_ascii_case("true")
        );
        let color = if atty::is(atty::Stream::Stderr) {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        };
        Self {
            debug: debug || from_env,
            color,
        }
    }

    fn debug(&self, msg: &str) {
        if self.debug {
            eprintln!("[godeco] {msg}");
        }
    }

    fn warn(&self, msg: &str) {
        self.emit(Color::Yellow, "warning", msg);
    }

    fn error(&self, msg: &str) {
        self.emit(Color::Red, "error", msg);
    }

    fn emit(&self, color: Color, label: &str, msg: &str) {
        let mut stderr = StandardStream::stderr(self.color);
        let _ = stderr.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
        let _ = write!(stderr, "{label}");
        let _ = stderr.reset();
        let _ = writeln!(stderr, ": {msg}");
    }
}

fn main() {
    let cli = Cli::parse();
    let log = Log::new(cli.debug);

    if let Err(err) = run(&cli, &log) {
        if err.downcast_ref::<Reported>().is_none() {
            log.error(&format!("{err:#}"));
        }
        std::process::exit(1);
    }
}

fn run(cli: &Cli, log: &Log) -> Result<()> {
    let config = match &cli.config {
        Some(path) => GodecoConfig::load_from_path(path)?,
        None => GodecoConfig::load()?.unwrap_or_default(),
    };

    let (name, source) = read_input(cli.file.as_deref())?;
    log.debug(&format!("searching {name}"));

    let unit = match parse(&source) {
        Ok(unit) => unit,
        Err(err) => {
            SourceDb::new(name, source).report_parse_error(&err, log.color);
            return Err(Reported.into());
        }
    };

    if cli.dump_model {
        println!("{}", serde_json::to_string_pretty(&unit)?);
        return Ok(());
    }

    let type_name = cli.type_name.as_deref().context("--type is required")?;
    let options = config
        .generate
        .imports()
        .iter()
        .chain(&cli.imports)
        .fold(GenerateOptions::new(type_name), |options, path| {
            options.with_import(path)
        });
    log.debug(&format!("type name: {type_name}"));
    log.debug(&format!("additional imports `{}`", options.imports.join(",")));

    let formatter: Box<dyn SourceFormatter> = if cli.no_format || !config.generate.format() {
        Box::new(Passthrough)
    } else {
        let program = cli.gofmt.as_deref().unwrap_or(config.generate.gofmt());
        Box::new(Gofmt::new(program))
    };

    let generated = generate(&unit, &options, formatter.as_ref())?;
    for warning in &generated.warnings {
        log.warn(&warning.message);
    }
    log.debug(&format!("len: {}", generated.code.len()));

    write_output(cli.out.as_deref(), &generated.code)?;
    if let Some(out) = &cli.out {
        log.debug(&format!("wrote {}", out.display()));
    }
    Ok(())
}

/// Read the source file, or stdin when no file is given.
fn read_input(file: Option<&Path>) -> Result<(String, String)> {
    match file {
        Some(path) => {
            if path.extension().and_then(|e| e.to_str()) != Some("go") {
                bail!("{} is not a .go file", path.display());
            }
            let source = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok((path.display().to_string(), source))
        }
        None => {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .context("failed to read stdin")?;
            Ok(("<stdin>".to_string(), source))
        }
    }
}

fn write_output(out: Option<&Path>, code: &str) -> Result<()> {
    let mut code = code.to_string();
    if !code.ends_with('\n') {
        code.push('\n');
    }
    match out {
        Some(path) => {
            fs::write(path, code).with_context(|| format!("failed to write {}", path.display()))
        }
        None => {
            print!("{code}");
            Ok(())
        }
    }
}
