//! `urlquery` CLI — turn JSON into URL query strings and back.
//!
//! ## Usage
//!
//! ```sh
//! # Encode JSON to a query string (stdin → stdout)
//! echo '{"q":"rust","page":{"n":2}}' | urlquery encode
//!
//! # Encode from file to file, with dotted keys
//! urlquery --style dot encode -i request.json -o request.query
//!
//! # Decode a query string to pretty-printed JSON; index-keyed groups
//! # become arrays
//! echo 'q=rust&page%5Bn%5D=2&tags%5B0%5D=a' | urlquery decode
//!
//! # Show the unescaped key/value pairs
//! echo '{"child":{"desc":"a b"}}' | urlquery pairs
//! ```
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`);
//! `-v` raises the default to `debug`.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{Map, Value};
use std::io::{self, Read};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use urlquery_core::{Config, Decoder, Encoder, KeyStyle};

#[derive(Parser)]
#[command(
    name = "urlquery",
    version,
    about = "Encode JSON to URL query strings and decode them back"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// How nested keys are joined
    #[arg(long, value_enum, global = true, default_value_t = Style::Bracket)]
    style: Style,

    /// Longest sequence a decoded index may create
    #[arg(long, global = true, default_value_t = urlquery_core::config::DEFAULT_MAX_SEQUENCE_LEN)]
    max_seq_len: usize,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Style {
    /// `child[desc]`, `children[0][desc]`
    Bracket,
    /// `child.desc`, `children.0.desc`
    Dot,
}

impl From<Style> for KeyStyle {
    fn from(style: Style) -> Self {
        match style {
            Style::Bracket => KeyStyle::Bracket,
            Style::Dot => KeyStyle::Dot,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a JSON object or array to a query string
    Encode {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Decode a query string to JSON
    Decode {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Print the unescaped `key=value` pairs a JSON value encodes to, one per line
    Pairs {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::default()
        .with_key_style(cli.style.into())
        .with_max_sequence_len(cli.max_seq_len);
    debug!(?config, "starting");

    match cli.command {
        Commands::Encode { input, output } => {
            let value = read_json(input.as_deref())?;
            let mut encoder = Encoder::with_config(config);
            let query = encoder
                .marshal(&value)
                .context("Failed to encode JSON to a query string")?;
            write_output(output.as_deref(), &format!("{query}\n"))?;
        }
        Commands::Decode { input, output } => {
            let query = read_input(input.as_deref())?;
            let mut decoder = Decoder::with_config(config);
            let value: Value = decoder
                .unmarshal(query.trim_end())
                .context("Failed to decode query string")?;
            let value = restore_arrays(value, decoder.config().max_sequence_len)?;
            let pretty = serde_json::to_string_pretty(&value)?;
            write_output(output.as_deref(), &format!("{pretty}\n"))?;
        }
        Commands::Pairs { input } => {
            let value = read_json(input.as_deref())?;
            let mut encoder = Encoder::with_config(config);
            let pairs = encoder
                .marshal_pairs(&value)
                .context("Failed to encode JSON to query pairs")?;
            let mut out = String::new();
            for (key, value) in pairs {
                out.push_str(key);
                out.push('=');
                out.push_str(value);
                out.push('\n');
            }
            write_output(None, &out)?;
        }
    }

    Ok(())
}

/// Turn objects keyed only by canonical indices (`0`, `1`, ...) back into
/// arrays, filling gaps with `null`.
fn restore_arrays(value: Value, limit: usize) -> Result<Value> {
    let Value::Object(map) = value else {
        return Ok(value);
    };
    let indexed = !map.is_empty()
        && map
            .keys()
            .all(|k| k.parse::<usize>().is_ok_and(|i| i.to_string() == *k));
    if !indexed {
        return map
            .into_iter()
            .map(|(k, v)| Ok((k, restore_arrays(v, limit)?)))
            .collect::<Result<Map<_, _>>>()
            .map(Value::Object);
    }

    let mut items = Vec::new();
    for (k, v) in map {
        let index: usize = k.parse()?;
        if index >= limit {
            anyhow::bail!("Sequence index {index} exceeds --max-seq-len {limit}");
        }
        if index >= items.len() {
            items.resize(index + 1, Value::Null);
        }
        items[index] = restore_arrays(v, limit)?;
    }
    Ok(Value::Array(items))
}

/// Log to stderr so stdout stays clean for piping.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_json(path: Option<&str>) -> Result<Value> {
    let text = read_input(path)?;
    serde_json::from_str(&text).context("Input is not valid JSON")
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
