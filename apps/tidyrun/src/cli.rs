//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tidyrun",
    version,
    about = "Incremental clang-tidy runner",
    long_about = "tidyrun: compile a rule list into .clang-tidy, run clang-tidy over a source tree with cached results, and report warnings with a CI-friendly exit status.\n\nConfiguration precedence: CLI > tidyrun.toml > defaults.",
    after_help = "Examples:\n  tidyrun make --nop\n  tidyrun tidy --short\n  tidyrun tidy external_ tests/ --only readability-magic-numbers\n  tidyrun ls --grouped\n  tidyrun format --nop",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[arg(
        long,
        global = true,
        help = "Project root (default: nearest directory with tidyrun.toml or .git)"
    )]
    pub root: Option<String>,
    #[arg(short, long, global = true, action = clap::ArgAction::Count, help = "More logging (-v debug, -vv trace)")]
    pub verbose: u8,
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current tidyrun version.")]
    Version,
    /// Compile the rule list
    #[command(
        about = "Write .clang-tidy from the rule list",
        long_about = "Compile the rule list (default: ./clang-tidy) into .clang-tidy at the project root."
    )]
    Make {
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Print the compiled config instead of writing it")]
        nop: bool,
    },
    /// Run clang-tidy over the project
    #[command(
        about = "Run clang-tidy on all source files",
        long_about = "Recompile .clang-tidy, then analyze every discovered file, reusing cached results whose inputs did not change. Exits 1 when any warning was found.",
        after_help = "Examples:\n  tidyrun tidy\n  tidyrun tidy libs/gui --short\n  tidyrun tidy --only modernize-use-auto,readability-magic-numbers --output json"
    )]
    Tidy {
        #[arg(help = "Skip files whose path contains any of these substrings")]
        filters: Vec<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Ask clang-tidy to apply fixes")]
        fix: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Move to the next project after the first file with warnings")]
        short: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Only analyze implementation files")]
        no_headers: bool,
        #[arg(long, value_delimiter = ',', help = "Only count and print these warning classes")]
        only: Vec<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "List files without analyzing")]
        nop: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Take the file list from compile_commands.json")]
        compile_commands: bool,
    },
    /// Run clang-format over the project
    #[command(
        about = "Format all source files in place",
        long_about = "Run the formatter (default: clang-format -i) on every discovered file."
    )]
    Format {
        #[arg(long, action = clap::ArgAction::SetTrue, help = "List files without formatting")]
        nop: bool,
    },
    /// List discovered files
    #[command(about = "List source files", long_about = "List the files tidy would analyze, in analysis order.")]
    Ls {
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Group files under their directory")]
        grouped: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "List every file, not only C/C++ sources")]
        all: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Leave out header files")]
        no_headers: bool,
    },
}
