//! Binary entrypoint for the mushcode CLI.
//!
//! Commands:
//! - `eval <expr> [--args <text>] [--actor <n>]` - evaluate softcode and print the result
//! - `parse <line>` - show how a raw line splits into invocations
//! - `lock <expr> --subject <n>` - evaluate a lock key for a subject
//! - `repl [--actor <n>]` - read lines from stdin and run them as commands (Ctrl-C interrupts a running line)
//! - `functions` - list registered functions and their arity
//! - `init` - write a starter `mushcode.toml`
//!
//! See the library crate docs for module-level details: `mushcode::`.
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

use mushcode::commands::{CommandProcessor, EchoHandler};
use mushcode::config::Config;
use mushcode::engine::{standard_evaluator, CommandParser, ExecutionContext, ExpressionEvaluator};
use mushcode::locks::LockExpressionEngine;
use mushcode::metadata::MetadataCatalogs;
use mushcode::world::{Dbref, InMemoryWorld};

#[derive(Parser)]
#[command(name = "mushcode")]
#[command(about = "Softcode command and expression engine for text-world servers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "mushcode.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an expression and print the result
    Eval {
        expr: String,
        /// Raw argument text tokenized into %0, %1, ...
        #[arg(short, long)]
        args: Option<String>,
        /// Dbref of the acting object
        #[arg(long, default_value_t = 1)]
        actor: Dbref,
    },
    /// Split a raw input line into invocations
    Parse { line: String },
    /// Evaluate a lock key
    Lock {
        expr: String,
        /// Dbref being tested against the key
        #[arg(short, long)]
        subject: Dbref,
    },
    /// Interactive command loop on stdin
    Repl {
        #[arg(long, default_value_t = 1)]
        actor: Dbref,
    },
    /// List registered functions
    Functions,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init { force } = cli.command {
        init_logging(&Config::default(), cli.verbose);
        if !force && tokio::fs::try_exists(&cli.config).await.unwrap_or(false) {
            return Err(anyhow!(
                "{} already exists (use --force to overwrite)",
                cli.config
            ));
        }
        Config::create_default(&cli.config).await?;
        info!("Configuration file created at {}", cli.config);
        return Ok(());
    }

    let (config, load_error) = match Config::load(&cli.config).await {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    init_logging(&config, cli.verbose);
    if let Some(e) = load_error {
        warn!("{}; using built-in defaults", e);
    }

    let catalogs = MetadataCatalogs::load(&config.metadata).await?;
    let world = Arc::new(demo_world());

    match cli.command {
        Commands::Eval { expr, args, actor } => {
            let evaluator =
                standard_evaluator(Arc::clone(&catalogs.functions), world, config.engine.max_depth);
            let mut ctx = ExecutionContext::new(actor, args.as_deref());
            let out = evaluator.evaluate(&mut ctx, &expr)?;
            println!("{}", out);
        }
        Commands::Parse { line } => {
            for (i, invocation) in CommandParser::new().parse(&line).iter().enumerate() {
                println!("{}: {}", i, invocation);
                for switch in invocation.switches() {
                    println!("   switch {} {:?}", switch.name, switch.argument);
                }
                println!("   target   {:?}", invocation.target());
                println!("   argument {:?}", invocation.argument());
            }
        }
        Commands::Lock { expr, subject } => {
            let engine = LockExpressionEngine::new();
            if let Err(e) = engine.parse(&expr) {
                warn!("Lock key does not parse: {}", e);
            }
            println!("{}", engine.evaluate(&expr, &subject));
        }
        Commands::Repl { actor } => {
            let evaluator =
                standard_evaluator(Arc::clone(&catalogs.functions), world, config.engine.max_depth);
            run_repl(evaluator, catalogs, actor).await?;
        }
        Commands::Functions => {
            let evaluator =
                standard_evaluator(Arc::clone(&catalogs.functions), world, config.engine.max_depth);
            let registry = evaluator.registry();
            for name in registry.names() {
                let arity = match registry.catalog().get(name) {
                    Some(def) => match def.max_args {
                        Some(max) => format!("{}..{}", def.min_args, max),
                        None => format!("{}..", def.min_args),
                    },
                    None => "any".to_string(),
                };
                println!("{:<10} {}", name, arity);
            }
            let mut aliases: Vec<_> = registry.aliases().collect();
            aliases.sort_unstable();
            for (alias, target) in aliases {
                println!("{:<10} -> {}", alias, target);
            }
        }
        Commands::Init { .. } => {}
    }

    Ok(())
}

/// Objects available to `get()`/`xget()` from the command line: the actor
/// `#1` standing in room `#0`.
fn demo_world() -> InMemoryWorld {
    let world = InMemoryWorld::new();
    world.add_object(0, "Room Zero", None);
    world.add_object(1, "One", Some(0));
    world.set_attribute(0, "DESC", "You are in Room Zero.");
    world
}

async fn run_repl(
    evaluator: ExpressionEvaluator,
    catalogs: MetadataCatalogs,
    actor: Dbref,
) -> Result<()> {
    let processor = Arc::new(CommandProcessor::new(evaluator, catalogs.commands));
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    info!("REPL ready for #{}; Ctrl-D or Ctrl-C to exit", actor);

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => break,
        };
        let Some(line) = line else { break };

        // Evaluation is synchronous; run it off the runtime so Ctrl-C can
        // raise the cancel flag while it is in progress.
        let worker = Arc::clone(&processor);
        let mut job =
            tokio::task::spawn_blocking(move || worker.process(actor, &line, &EchoHandler));
        let outcomes = tokio::select! {
            done = &mut job => done?,
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted; cancelling the running command");
                processor.cancel_flag().cancel();
                let outcomes = job.await?;
                processor.cancel_flag().reset();
                outcomes
            }
        };
        for outcome in outcomes {
            for out in outcome.lines {
                println!("{}", out);
            }
        }
    }
    info!("REPL closed");
    Ok(())
}

fn init_logging(config: &Config, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity can only raise the configured level
    let configured = config
        .logging
        .level
        .parse::<log::LevelFilter>()
        .unwrap_or(log::LevelFilter::Info);
    let level = match verbosity {
        0 => configured,
        1 => configured.max(log::LevelFilter::Debug),
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(level);

    let file = config.logging.file.as_ref().and_then(|path| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });

    if let Some(f) = file {
        let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
        // Mirror to the console only when someone is watching it
        let is_tty = atty::is(atty::Stream::Stdout);
        builder.format(move |fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let line = format!("{} [{}] {}", ts, record.level(), record.args());
            if let Ok(mut guard) = write_mutex.lock() {
                let _ = writeln!(guard, "{}", line);
            }
            if is_tty {
                writeln!(fmt, "{}", line)
            } else {
                Ok(())
            }
        });
    } else {
        builder.format(|fmt, record| {
            let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
        });
    }
    let _ = builder.try_init();
}
