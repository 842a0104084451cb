use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use lrgen::{
    automaton::{LR0Automaton, LR1Automaton},
    build::Method,
    lalr::LalrKernels,
    syntax::Definition,
};
use std::{fs, path::PathBuf, time::Instant};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The method to construct the parsing table.
    #[arg(long, value_enum, default_value_t = MethodArg::Lalr)]
    method: MethodArg,

    /// Write the rendered table to this path instead of the standard output.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write the item sets of the automaton to this path.
    #[arg(long)]
    automaton: Option<PathBuf>,

    /// The path of grammar definition file.
    input: PathBuf,
}

#[derive(Debug, Copy, Clone, PartialEq, ValueEnum)]
enum MethodArg {
    Slr,
    Lr1,
    Lalr,
    Lr0,
}

impl From<MethodArg> for Method {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Slr => Method::Slr,
            MethodArg::Lr1 => Method::Lr1,
            MethodArg::Lalr => Method::Lalr,
            MethodArg::Lr0 => Method::Lr0,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    tracing::debug!("parsed CLI args = {:?}", args);

    process_file(&args)
        .with_context(|| anyhow::anyhow!("errored during processing {}", args.input.display()))?;

    Ok(())
}

fn process_file(args: &Args) -> anyhow::Result<()> {
    let method = Method::from(args.method);

    let s = Instant::now();
    let def = Definition::from_file(&args.input)?;
    tracing::info!("from_file: {:?} elapsed", s.elapsed());

    for nonterminal in def.grammar.nonterminals() {
        if def.grammar.productions_of(nonterminal.id()).next().is_none() {
            println!(
                "[warning] The nonterminal {} has no associated production rule",
                nonterminal
            );
        }
    }

    if let Some(path) = &args.automaton {
        let g = def.grammar.augment()?;
        let rendered = match method {
            Method::Slr | Method::Lr0 => LR0Automaton::new(&g)?.state_map().display(&g).to_string(),
            Method::Lr1 => LR1Automaton::new(&g)?.state_map().display(&g).to_string(),
            Method::Lalr => LalrKernels::new(&g)?.states().display(&g).to_string(),
        };
        fs::write(path, rendered)
            .with_context(|| format!("failed to write `{}'", path.display()))?;
    }

    let s = Instant::now();
    let table = def.config(method).build(&def.grammar)?;
    tracing::info!(%method, states = table.len(), "build: {:?} elapsed", s.elapsed());

    match &args.output {
        Some(path) => fs::write(path, table.to_string())
            .with_context(|| format!("failed to write `{}'", path.display()))?,
        None => print!("{}", table),
    }

    Ok(())
}
