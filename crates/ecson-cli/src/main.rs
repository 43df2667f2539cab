use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ecson_core::{ComponentRegistry, EcsonConfig};
use ecson_doc::{validate_components, validate_document, SceneDocument};
use ecson_ir::{classify_delta, compile_with, decompile, portable_subset, CanonicalScene, CompileOptions};
use ecson_ops::{apply_many, apply_many_checked, decode_op, Migrations, OpWire, PatchOp};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "ecson",
    version,
    about = "ECSON: scene document ops, Canonical IR compiler and delta classifier"
)]
struct Cli {
    /// Path to an ecson.toml (default: ./ecson.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty scene document containing only a root entity
    New {
        /// Scene name
        #[arg()]
        name: String,

        /// Fixed document id (generated when omitted)
        #[arg(long)]
        id: Option<String>,

        /// Fixed root entity id (generated when omitted)
        #[arg(long)]
        root_id: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check a document's structure and component singletons
    Validate {
        /// Path to the document JSON
        #[arg()]
        file: PathBuf,
    },

    /// Compile a document into Canonical IR
    Compile {
        #[arg()]
        file: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Fail on wires whose endpoints do not resolve
        #[arg(long)]
        strict_wires: bool,
    },

    /// Turn Canonical IR back into a document
    Decompile {
        /// Path to the IR JSON
        #[arg()]
        file: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Apply ops (one op or an array) to a document
    Apply {
        /// Path to the document JSON
        #[arg()]
        file: PathBuf,

        /// Path to the op JSON
        #[arg()]
        ops: PathBuf,

        /// Where to write the mutated document (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write the inverse ops here, in the order that undoes the edit
        #[arg(long)]
        inverse_out: Option<PathBuf>,

        /// Enforce singleton components from the built-in registry
        #[arg(long)]
        checked: bool,
    },

    /// Classify ops into renderer deltas
    Classify {
        /// Path to the op JSON (one op or an array)
        #[arg()]
        ops: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Compile then decompile, and check the portable subset survives
    Roundtrip {
        #[arg()]
        file: PathBuf,
    },

    /// Print the content hash of a document's compiled IR
    Hash {
        #[arg()]
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = EcsonConfig::discover(cli.config.as_deref()).context("failed to load config")?;

    // Logs go to stderr so JSON on stdout stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log.filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::New {
            name,
            id,
            root_id,
            output,
        } => cmd_new(&config, name, id, root_id, output),
        Commands::Validate { file } => cmd_validate(&file),
        Commands::Compile {
            file,
            output,
            strict_wires,
        } => cmd_compile(&config, &file, output, strict_wires),
        Commands::Decompile { file, output } => cmd_decompile(&config, &file, output),
        Commands::Apply {
            file,
            ops,
            output,
            inverse_out,
            checked,
        } => cmd_apply(&config, &file, &ops, output, inverse_out, checked),
        Commands::Classify { ops, output } => cmd_classify(&config, &ops, output),
        Commands::Roundtrip { file } => cmd_roundtrip(&config, &file),
        Commands::Hash { file } => cmd_hash(&config, &file),
    }
}

fn read_document(path: &Path) -> Result<SceneDocument> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read document: {}", path.display()))?;
    SceneDocument::from_json(&text)
        .with_context(|| format!("failed to parse document: {}", path.display()))
}

fn read_ir(path: &Path) -> Result<CanonicalScene> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read IR: {}", path.display()))?;
    CanonicalScene::from_json(&text)
        .with_context(|| format!("failed to parse IR: {}", path.display()))
}

/// One op object or an array of them.
fn read_ops(path: &Path) -> Result<Vec<PatchOp>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read ops: {}", path.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse ops: {}", path.display()))?;
    let items = match value {
        Value::Array(items) => items,
        single => vec![single],
    };
    let migrations = Migrations::builtin();
    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            let wire: OpWire =
                serde_json::from_value(item).with_context(|| format!("op {i} is malformed"))?;
            decode_op(wire, &migrations).with_context(|| format!("op {i} could not be decoded"))
        })
        .collect()
}

fn write_json<T: Serialize>(config: &EcsonConfig, value: &T, output: Option<&Path>) -> Result<()> {
    let text = if config.output.pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    match output {
        Some(path) => {
            std::fs::write(path, text + "\n")
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "wrote output");
        }
        None => println!("{}", text),
    }
    Ok(())
}

fn error_list(errors: Vec<ecson_core::EcsonError>) -> anyhow::Error {
    let msgs: Vec<String> = errors.into_iter().map(|e| e.to_string()).collect();
    anyhow::anyhow!("Validation errors:\n  {}", msgs.join("\n  "))
}

fn cmd_new(
    config: &EcsonConfig,
    name: String,
    id: Option<String>,
    root_id: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    let doc = match (id, root_id) {
        (None, None) => SceneDocument::new(name),
        (id, root_id) => SceneDocument::with_ids(
            id.unwrap_or_else(ecson_core::id::generate_id),
            root_id.unwrap_or_else(ecson_core::id::generate_id),
            name,
        ),
    };
    write_json(config, &doc, output.as_deref())
}

fn cmd_validate(file: &Path) -> Result<()> {
    let doc = read_document(file)?;
    validate_document(&doc).map_err(error_list)?;
    validate_components(&doc, &ComponentRegistry::builtin()).map_err(error_list)?;
    println!(
        "{}: ok ({} entities, {} assets, {} wires)",
        file.display(),
        doc.entity_count(),
        doc.assets.len(),
        doc.wiring.len()
    );
    Ok(())
}

fn compile_options(config: &EcsonConfig, strict_wires: bool) -> CompileOptions {
    let mut options = CompileOptions::from(&config.compile);
    options.strict_wires |= strict_wires;
    options
}

fn cmd_compile(
    config: &EcsonConfig,
    file: &Path,
    output: Option<PathBuf>,
    strict_wires: bool,
) -> Result<()> {
    let doc = read_document(file)?;
    let ir = compile_with(&doc, &compile_options(config, strict_wires))
        .with_context(|| format!("failed to compile {}", file.display()))?;
    write_json(config, &ir, output.as_deref())
}

fn cmd_decompile(config: &EcsonConfig, file: &Path, output: Option<PathBuf>) -> Result<()> {
    let ir = read_ir(file)?;
    let doc = decompile(&ir).with_context(|| format!("failed to decompile {}", file.display()))?;
    write_json(config, &doc, output.as_deref())
}

fn cmd_apply(
    config: &EcsonConfig,
    file: &Path,
    ops_path: &Path,
    output: Option<PathBuf>,
    inverse_out: Option<PathBuf>,
    checked: bool,
) -> Result<()> {
    let mut doc = read_document(file)?;
    let ops = read_ops(ops_path)?;
    let mut inverses = if checked {
        apply_many_checked(&mut doc, &ops, &ComponentRegistry::builtin())
    } else {
        apply_many(&mut doc, &ops)
    }
    .context("ops were rejected; the document was not changed")?;
    info!(applied = ops.len(), "applied ops");

    if let Some(path) = inverse_out {
        inverses.reverse();
        write_json(config, &inverses, Some(&path))?;
    }
    write_json(config, &doc, output.as_deref())
}

fn cmd_classify(config: &EcsonConfig, ops_path: &Path, output: Option<PathBuf>) -> Result<()> {
    let ops = read_ops(ops_path)?;
    let deltas: Vec<_> = ops.iter().map(classify_delta).collect();
    write_json(config, &deltas, output.as_deref())
}

fn cmd_roundtrip(config: &EcsonConfig, file: &Path) -> Result<()> {
    let doc = read_document(file)?;
    let ir = compile_with(&doc, &compile_options(config, false)).context("compile failed")?;
    let back = decompile(&ir).context("decompile failed")?;
    if back != portable_subset(&doc) {
        anyhow::bail!("round trip changed portable fields of {}", file.display());
    }
    println!(
        "{}: portable subset preserved ({} nodes)",
        file.display(),
        ir.nodes.len()
    );
    Ok(())
}

fn cmd_hash(config: &EcsonConfig, file: &Path) -> Result<()> {
    let doc = read_document(file)?;
    let ir = compile_with(&doc, &compile_options(config, false)).context("compile failed")?;
    println!("{}", ir.content_hash()?);
    Ok(())
}
