mod cli;

use anyhow::Context;
use condconf::config::RawConditionalConfig;
use condconf::source::Source;
use condconf::value::{Value, Variables};
use std::path::Path;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("CONDCONF_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Evaluate(eval_cli) => evaluate(eval_cli),
        cli::Command::Dev(dev_cli) => dev(dev_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

pub fn evaluate(cli: cli::EvaluateCommand) -> anyhow::Result<()> {
    let source = load(&cli.input)?;
    let context = context(&cli.context)?;

    let external_variables = context
        .keys()
        .cloned()
        .chain(cli.context.external.iter().cloned());
    let config = RawConditionalConfig::from_source(&source, external_variables)?;

    let evaluation = config.eval(&context)?;
    if cli.output.flat {
        output(&cli.output, &evaluation.flatten())
    } else {
        output(&cli.output, &evaluation)
    }
}

fn load(input: &cli::InputArgs) -> anyhow::Result<Source> {
    match &input.file {
        Some(file_path) => Source::load_file(file_path)
            .with_context(|| format!("Failed to load {}", file_path.display())),
        None => Ok(Source::from_reader(&mut std::io::stdin().lock())?),
    }
}

/// External variable values from --context and -D, in that order
fn context(args: &cli::ContextArgs) -> anyhow::Result<Variables> {
    let mut context = match &args.context_file {
        Some(path) => load_context(path)
            .with_context(|| format!("Failed to load context from {}", path.display()))?,
        None => Variables::new(),
    };

    for define in &args.defines {
        let (name, value) = define
            .split_once('=')
            .with_context(|| format!("Expected NAME=VALUE, got `{define}`"))?;
        let value = serde_json::from_str::<Value>(value)
            .unwrap_or_else(|_| Value::String(value.to_owned()));
        tracing::debug!(name, %value, "defined");
        context.insert(name.trim().to_owned(), value);
    }

    Ok(context)
}

fn load_context(path: &Path) -> anyhow::Result<Variables> {
    let text = std::fs::read_to_string(path)?;
    let is_json = path.extension().is_some_and(|extension| extension == "json");

    Ok(if is_json {
        serde_json::from_str(&text)?
    } else {
        serde_yaml::from_str(&text)?
    })
}

fn output<T: serde::Serialize>(output: &cli::OutputArgs, value: &T) -> anyhow::Result<()> {
    match output.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), value)?,
        cli::OutputFormat::Json => serde_json::to_writer_pretty(std::io::stdout(), value)?,
    };

    Ok(())
}

/// (condconf-)developer utilities
///
/// A quick way to expose internal structures for debugging purposes
pub fn dev(cli: cli::DevCommand) -> anyhow::Result<()> {
    use cli::DevSubCommand::*;

    let source = load(&cli.input)?;
    let parsed = condconf::parser::parse(source.text())?;

    match cli.command {
        Ast => println!("{parsed:#?}"),
        Externals => {
            for name in condconf::validate::free_variables(&parsed) {
                println!("{name}")
            }
        }
    }

    Ok(())
}
