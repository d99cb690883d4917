use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{bail, Context};
use colored::Colorize;
use fcf_stream::{
    open_stream, AccessMode, CommandChannel, CommandDispatcher, Record, RecordStream,
    SourceDescriptor, StreamConfig,
};
use serde_json::Value;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => StreamConfig::load(path)?,
        None => StreamConfig::default(),
    };
    match cli.command {
        Command::Run(args) => cmd_run(args, &config),
        Command::Emit(args) => cmd_emit(args, &config),
        Command::Inspect(args) => cmd_inspect(args, &cli.format),
    }
}

/// Prints each command and clears the run flag once `max` is reached.
struct PrintDispatcher<'a> {
    keep_running: &'a AtomicBool,
    max: Option<usize>,
    executed: usize,
}

impl CommandDispatcher for PrintDispatcher<'_> {
    fn execute(&mut self, command: Record) -> String {
        self.executed += 1;
        let id = command.get("id").and_then(Value::as_str).unwrap_or("-").to_string();
        println!("{} {} {}", "▶".cyan(), id.yellow().bold(), Value::Object(command));
        if self.max.is_some_and(|max| self.executed >= max) {
            self.keep_running.store(false, Ordering::SeqCst);
        }
        format!("printed {id}")
    }
}

fn cmd_run(args: RunArgs, config: &StreamConfig) -> anyhow::Result<()> {
    let channel = CommandChannel::open(&args.location, config)?;
    let keep_running = AtomicBool::new(true);
    let mut dispatcher = PrintDispatcher {
        keep_running: &keep_running,
        max: args.max,
        executed: 0,
    };
    let executed = channel.run(&keep_running, &mut dispatcher)?;
    println!("{} {} commands executed", "✓".green().bold(), executed);
    Ok(())
}

fn cmd_emit(args: EmitArgs, config: &StreamConfig) -> anyhow::Result<()> {
    let records = if args.records.is_empty() {
        let mut input = String::new();
        std::io::stdin().read_to_string(&mut input).context("reading stdin")?;
        parse_records(&input)?
    } else {
        args.records
            .iter()
            .map(|text| parse_records(text))
            .collect::<anyhow::Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect()
    };

    let mut stream = open_stream(&args.location, AccessMode::Write, config)?;
    let count = records.len();
    for record in records {
        stream.put(record)?;
    }
    stream.close()?;
    println!("{} Wrote {} records to {}", "✓".green().bold(), count, args.location.bold());
    Ok(())
}

fn cmd_inspect(args: InspectArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let descriptor = SourceDescriptor::resolve(&args.location)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&descriptor)?),
        OutputFormat::Text => {
            println!("URI:     {}", descriptor.uri.bold());
            println!("Scheme:  {}", descriptor.scheme);
            println!("Path:    {}", descriptor.path);
            println!("Framing: {}", descriptor.framing.to_string().cyan());
            let looping = if descriptor.loop_eligible { "yes".green() } else { "no".dimmed() };
            println!("FIFO:    {looping}");
        }
    }
    Ok(())
}

/// Parse a concatenated stream of JSON objects.
fn parse_records(text: &str) -> anyhow::Result<Vec<Record>> {
    let mut records = Vec::new();
    for value in serde_json::Deserializer::from_str(text).into_iter::<Value>() {
        match value.context("invalid JSON")? {
            Value::Object(map) => records.push(map),
            other => bail!("want: object, got: {other}"),
        }
    }
    Ok(records)
}
