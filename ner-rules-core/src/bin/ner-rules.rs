//! ner-rules — aplica o motor de regras e/ou a uniformização a um arquivo CoNLL-U Plus
//!
//! Uso:
//!   cargo run -p ner-rules-core --features cli -- --rules regras.json entrada.conllup saida.conllup
//!   cargo run -p ner-rules-core --features cli -- --mode uniform --minw 2 entrada.conllup saida.conllup

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ner_rules_core::{Mode, Pipeline, RuleSet};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ner-rules")]
#[command(about = "Pós-processamento de anotações NER em CoNLL-U Plus")]
struct Cli {
    /// rules, uniform ou rules_then_uniform
    #[arg(short, long, default_value = "rules")]
    mode: Mode,

    /// Documento JSON com as regras (obrigatório nos modos com regras)
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// Tamanho mínimo, em tokens, das entidades uniformizadas
    #[arg(long, default_value_t = 2)]
    minw: usize,

    /// Arquivo CoNLL-U Plus de entrada
    input: PathBuf,

    /// Arquivo CoNLL-U Plus de saída
    output: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let rules = cli
        .rules
        .as_deref()
        .map(RuleSet::from_path)
        .transpose()
        .context("falha ao carregar as regras")?;

    let pipeline = Pipeline::new(rules, cli.minw);
    let report = pipeline
        .run_paths(cli.mode, &cli.input, &cli.output)
        .with_context(|| format!("falha ao processar {}", cli.input.display()))?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
