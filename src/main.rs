use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use keytrie::{codec, KeyBatch, KeyId, QueryCursor, Trie};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "keytrie", about = "Static dictionary builder and query tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a word list (one key per line) into a dictionary file.
    Build {
        /// Input word list; blank lines are skipped.
        words: PathBuf,
        /// Output dictionary file.
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Look up a key and print its id.
    Lookup {
        /// Dictionary file.
        dictionary: PathBuf,
        /// Key to search for.
        key: String,
    },
    /// Print the key assigned to an id.
    Get {
        /// Dictionary file.
        dictionary: PathBuf,
        /// Key id.
        id: KeyId,
    },
    /// Print every id and key, one per line.
    Dump {
        /// Dictionary file.
        dictionary: PathBuf,
    },
    /// Print dictionary statistics.
    Info {
        /// Dictionary file.
        dictionary: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Build { words, output } => run_build(words, output),
        Commands::Lookup { dictionary, key } => run_lookup(dictionary, key),
        Commands::Get { dictionary, id } => run_get(dictionary, id),
        Commands::Dump { dictionary } => run_dump(dictionary),
        Commands::Info { dictionary } => run_info(dictionary),
    }
}

fn run_build(words: PathBuf, output: PathBuf) -> Result<()> {
    let reader = BufReader::new(
        File::open(&words)
            .with_context(|| format!("failed to open word list {}", words.display()))?,
    );

    let mut batch = KeyBatch::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        batch
            .push(line.as_bytes())
            .with_context(|| format!("rejected key on line {}", idx + 1))?;
    }

    let trie = Trie::build(batch).context("dictionary build failed")?;
    codec::save_to_path(&trie, &output)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!(
        "{} keys, {} nodes, {} tail bytes -> {}",
        trie.num_keys(),
        trie.num_nodes(),
        trie.tail_bytes(),
        output.display()
    );
    Ok(())
}

fn run_lookup(dictionary: PathBuf, key: String) -> Result<()> {
    let trie = open_dictionary(&dictionary)?;
    let mut cursor = QueryCursor::new();
    cursor.set_query(key.as_bytes())?;
    match trie.lookup(&mut cursor) {
        Some(id) => println!("{id}"),
        None => println!("not found"),
    }
    Ok(())
}

fn run_get(dictionary: PathBuf, id: KeyId) -> Result<()> {
    let trie = open_dictionary(&dictionary)?;
    let mut cursor = QueryCursor::new();
    trie.reverse_lookup(id, &mut cursor)?;
    let key = cursor.matched_key().unwrap_or_default();
    println!("{}", String::from_utf8_lossy(key));
    Ok(())
}

fn run_dump(dictionary: PathBuf) -> Result<()> {
    let trie = open_dictionary(&dictionary)?;
    let mut cursor = QueryCursor::new();
    for id in 0..trie.num_keys() {
        trie.reverse_lookup(id, &mut cursor)?;
        let key = cursor.matched_key().unwrap_or_default();
        println!("{id}\t{}", String::from_utf8_lossy(key));
    }
    Ok(())
}

fn run_info(dictionary: PathBuf) -> Result<()> {
    let trie = open_dictionary(&dictionary)?;
    println!("keys:       {}", trie.num_keys());
    println!("nodes:      {}", trie.num_nodes());
    println!("tail bytes: {}", trie.tail_bytes());
    Ok(())
}

fn open_dictionary(path: &PathBuf) -> Result<Trie> {
    codec::load_from_path(path)
        .with_context(|| format!("failed to load dictionary {}", path.display()))
}
