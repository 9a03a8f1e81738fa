//! tidyrun CLI binary entry point.
//! Delegates to the library for make/tidy/format/ls and prints results.

use clap::Parser;
use std::io;
use std::path::Path;
use std::time::Duration;
use tidyrun::cache::AnalysisCache;
use tidyrun::cancel::CancellationToken;
use tidyrun::catalog::{self, Catalog, Filter, FirstLineMarker};
use tidyrun::cli::{Cli, Commands};
use tidyrun::config::{self, Effective, Overrides};
use tidyrun::invoke::{ClangTidy, Engine};
use tidyrun::output::{self, HumanReporter};
use tidyrun::tidy::{self, Silent, TidyOptions};
use tidyrun::utils::{error_prefix, header, info_prefix, note_prefix};
use tidyrun::{format, rules, Result, TidyError};

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn build_catalog(
    eff: &Effective,
    extensions: Option<Vec<String>>,
    compile_db: Option<&Path>,
) -> Result<Catalog> {
    let filter = Filter {
        extensions,
        reserved: eff.reserved.clone(),
        ..Default::default()
    }
    .with_globs(&eff.exclude_globs);
    let marker = FirstLineMarker::new(eff.ignore_marker.as_str());
    match compile_db {
        Some(build) => catalog::from_compile_commands(&eff.root, build, &filter, &marker),
        None => catalog::discover(&eff.root, &filter, &marker),
    }
}

fn cmd_make(eff: &Effective, nop: bool) -> Result<i32> {
    if nop {
        let stdout = io::stdout();
        rules::print(&eff.dsl, &mut stdout.lock())?;
    } else {
        let target = eff.compiled_config();
        let compiled = rules::compile(&eff.dsl, &target)?;
        println!(
            "{} {} ({} checks)",
            info_prefix(),
            target.display(),
            compiled.checks.len()
        );
    }
    Ok(0)
}

struct TidyArgs {
    fix: bool,
    no_headers: bool,
    nop: bool,
    compile_commands: bool,
}

fn cmd_tidy(eff: &Effective, args: TidyArgs) -> Result<i32> {
    let build = catalog::find_build_root(&eff.root, &eff.build_dirs)?;
    let config_path = eff.compiled_config();
    rules::compile(&eff.dsl, &config_path)?;

    let catalog = build_catalog(
        eff,
        Some(eff.accepted_extensions(args.no_headers)),
        args.compile_commands.then_some(build.as_path()),
    )?;

    let mut cache = AnalysisCache::new(&build, &config_path);
    let mut analyzer = ClangTidy::new(eff.analyzer.as_str(), &build);
    analyzer.fix = args.fix;
    analyzer.timeout = eff.timeout_secs.map(Duration::from_secs);
    let mut engine = Engine::new(analyzer, &mut cache);

    let opts = TidyOptions {
        exclude: eff.exclude.clone(),
        only: eff.only.clone(),
        short: eff.short,
        dry_run: args.nop,
    };
    let cancel = CancellationToken::on_interrupt();

    if eff.output == "json" {
        let report = tidy::run_tidy(&catalog, &mut engine, &opts, &cancel, &mut Silent)?;
        output::print_tidy_json(&report);
        return Ok(report.exit_code());
    }

    if config::load_config(&eff.root).is_none() {
        eprintln!("{} No tidyrun.toml found; using defaults.", note_prefix());
    }
    let mut reporter = HumanReporter::new(io::stdout(), output::use_colors(&eff.output));
    let report = tidy::run_tidy(&catalog, &mut engine, &opts, &cancel, &mut reporter)?;
    if args.nop {
        return Ok(0);
    }
    reporter.summary(&report);
    Ok(report.exit_code())
}

fn cmd_format(eff: &Effective, nop: bool) -> Result<i32> {
    let catalog = build_catalog(eff, Some(eff.extensions.clone()), None)?;
    let projects = format::run_format(&catalog, &eff.formatter, !nop);
    for project in &projects {
        let title = if project.name.is_empty() {
            "."
        } else {
            project.name.as_str()
        };
        println!("{}", header(title, '-'));
        for r in &project.results {
            println!("{}", r.file);
            if let Some(msg) = &r.message {
                eprintln!("{} {}", error_prefix(), msg);
            }
        }
        println!();
    }
    Ok(if format::failures(&projects) > 0 { 1 } else { 0 })
}

fn cmd_ls(eff: &Effective, grouped: bool, all: bool, no_headers: bool) -> Result<i32> {
    let extensions = if all {
        None
    } else {
        Some(eff.accepted_extensions(no_headers))
    };
    let catalog = build_catalog(eff, extensions, None)?;
    for line in output::list_lines(&catalog, grouped) {
        println!("{}", line);
    }
    Ok(0)
}

fn report_error(e: &TidyError) {
    if let TidyError::AnalyzerFailed { output, .. } = e {
        print!("{}", output);
    }
    eprintln!("{} {}", error_prefix(), e);
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut overrides = Overrides {
        root: cli.root.clone(),
        ..Default::default()
    };
    if let Commands::Tidy {
        filters,
        short,
        only,
        output,
        ..
    } = &cli.cmd
    {
        overrides.exclude = filters.clone();
        overrides.only = only.clone();
        overrides.output = output.clone();
        overrides.short = short.then_some(true);
    }
    let eff = config::resolve_effective(&overrides);
    log::debug!("project root {}", eff.root.display());

    let result = match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(0)
        }
        Commands::Make { nop } => cmd_make(&eff, nop),
        Commands::Tidy {
            fix,
            no_headers,
            nop,
            compile_commands,
            ..
        } => cmd_tidy(
            &eff,
            TidyArgs {
                fix,
                no_headers,
                nop,
                compile_commands,
            },
        ),
        Commands::Format { nop } => cmd_format(&eff, nop),
        Commands::Ls {
            grouped,
            all,
            no_headers,
        } => cmd_ls(&eff, grouped, all, no_headers),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            report_error(&e);
            std::process::exit(e.exit_code());
        }
    }
}
