use anyhow::{anyhow, Context, Result};
use ixbrl_triples::core::config::IxbrlConfig;
use ixbrl_triples::ixbrl::{write_ntriples, Ixbrl};
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::str::FromStr;
use structopt::StructOpt;

#[derive(Debug)]
enum OutputFormat {
    NTriples,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ntriples" | "nt" => Ok(OutputFormat::NTriples),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("unknown output format '{}'", s)),
        }
    }
}

#[derive(StructOpt, Debug)]
#[structopt(name = "ixbrl-triples", about = "Convert an iXBRL document into triples")]
struct Opt {
    /// iXBRL document to parse
    #[structopt(parse(from_os_str))]
    input: PathBuf,

    /// Output format: ntriples or json
    #[structopt(short, long, default_value = "ntriples")]
    format: OutputFormat,

    /// Write to this file instead of stdout
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();
    let opt = Opt::from_args();

    if !opt.input.exists() {
        return Err(anyhow!("Input file does not exist: {:?}", opt.input));
    }

    let config = IxbrlConfig::from_env()?;
    log::debug!("Config: {:?}", config);

    let content = fs::read_to_string(&opt.input)
        .with_context(|| format!("Failed to read {:?}", opt.input))?;
    let ixbrl = Ixbrl::parse(&content, config)
        .with_context(|| format!("Failed to parse {:?}", opt.input))?;
    let triples = ixbrl.triples()?;
    log::info!("Emitted {} triples", triples.len());

    let mut out: Box<dyn Write> = match &opt.output {
        Some(path) => Box::new(BufWriter::new(
            fs::File::create(path).with_context(|| format!("Failed to create {:?}", path))?,
        )),
        None => Box::new(BufWriter::new(io::stdout())),
    };

    match opt.format {
        OutputFormat::NTriples => write_ntriples(&mut out, &triples)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &triples)?;
            writeln!(out)?;
        }
    }
    out.flush()?;

    Ok(())
}
