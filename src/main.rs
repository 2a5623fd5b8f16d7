use clap::{Args, Parser as ClapParser, Subcommand};
use drl_lang::cli::{self, CheckOptions, CliError, Mode};
use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "drl")]
#[command(about = "DRL - evaluate expressions and render templates against JSON data")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ContextArgs {
    /// JSON context (reads from stdin if neither this nor --file is given)
    #[arg(short, long, conflicts_with = "file")]
    context: Option<String>,

    /// Read the JSON context from a file
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Reference indicator
    #[arg(long = "ref", default_value = "$")]
    ref_indicator: String,

    /// Key delimiter
    #[arg(long = "delim", default_value = ">")]
    key_delimiter: String,

    /// Pretty-print the output
    #[arg(short, long)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an expression
    Eval {
        /// The expression to evaluate
        expression: String,

        #[command(flatten)]
        context: ContextArgs,
    },

    /// Render a template
    Render {
        /// Template text, or a JSON tree of templates with --tree
        template: String,

        /// Treat the template as a JSON tree whose string leaves are templates
        #[arg(long)]
        tree: bool,

        /// Omit entries that render to null or the empty string (with --tree)
        #[arg(long)]
        drop_empty: bool,

        #[command(flatten)]
        context: ContextArgs,
    },

    /// List the built-in functions
    Functions,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("DRL_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Eval {
            expression,
            context,
        } => run_check(expression, Mode::Expression, false, context),
        Commands::Render {
            template,
            tree,
            drop_empty,
            context,
        } => {
            let mode = if tree { Mode::TemplateTree } else { Mode::Template };
            run_check(template, mode, drop_empty, context)
        }
        Commands::Functions => {
            for line in cli::describe_functions() {
                println!("{}", line);
            }
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn read_context(args: &ContextArgs) -> Result<Option<String>, CliError> {
    Ok(match (&args.context, &args.file) {
        (Some(json), _) => Some(json.clone()),
        (None, Some(path)) => Some(fs::read_to_string(path)?),
        (None, None) if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        (None, None) => None,
    })
}

fn run_check(input: String, mode: Mode, drop_empty: bool, args: ContextArgs) -> Result<(), CliError> {
    let options = CheckOptions {
        input,
        context: read_context(&args)?,
        ref_indicator: args.ref_indicator,
        key_delimiter: args.key_delimiter,
        drop_empty,
        mode,
    };

    let output = cli::execute_check(&options)?;
    let json = if args.pretty {
        drl_lang::to_json_pretty(&output)
    } else {
        drl_lang::to_json(&output)
    };
    println!("{}", json);
    Ok(())
}
