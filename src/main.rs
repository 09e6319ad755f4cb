use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use taproot::{Context, Decode, Directory, File, Registry};

#[derive(Parser)]
#[command(name = "taproot", about = "Browse ROOT-format data containers", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Recursively list the directory tree
    Ls {
        file: PathBuf,
        /// Emit the listing as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show container metadata
    Info {
        file: PathBuf,
    },
}

#[derive(Serialize)]
struct KeyRow {
    path: String,
    name: String,
    title: String,
    class: String,
    cycle: u16,
    bytes: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match Cli::parse().command {
        // ── Ls ───────────────────────────────────────────────────────────────
        Commands::Ls { file, json } => {
            let f = File::open(&file)?;
            let registry = Registry::default();
            let ctx = Context::new(&registry, &f);

            let mut rows = Vec::new();
            collect(f.root(), &ctx, "/", &mut rows);

            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                println!("{}: '{}' (version {})", file.display(), f.name(), f.version());
                println!("{:<40} {:<20} {:>10}  Title", "Path;cycle", "Class", "Bytes");
                for row in &rows {
                    println!(
                        "{:<40} {:<20} {:>10}  {}",
                        format!("{}{};{}", row.path, row.name, row.cycle),
                        row.class,
                        row.bytes,
                        row.title,
                    );
                }
            }
        }

        // ── Info ─────────────────────────────────────────────────────────────
        Commands::Info { file } => {
            let f = File::open(&file)?;
            let registry = Registry::default();

            println!("── container ───────────────────────────────────────────");
            println!("  Path            {}", file.display());
            println!("  Name            '{}'", f.name());
            println!("  Title           '{}'", f.title());
            println!("  Format version  {}", f.version());
            println!("  Wide offsets    {}", f.is_large());
            println!("  Begin / End     {} / {} B", f.begin(), f.end());
            println!("  Storage units   {}", f.units());
            println!("  Compression     {}", f.compression());
            println!("  Schema record   seek={} ({} B)", f.seek_info(), f.nbytes_info());
            println!("  Root keys       {}", f.root().keys().len());
            println!("  Known classes   {}", registry.len());
        }
    }

    Ok(())
}

/// Walk a directory tree, descending into every nested directory key.
/// A failed sub-directory decode aborts that branch only.
fn collect(dir: &Directory, ctx: &Context<'_>, path: &str, rows: &mut Vec<KeyRow>) {
    for key in dir.keys() {
        rows.push(KeyRow {
            path: path.to_owned(),
            name: key.name().to_owned(),
            title: key.title().to_owned(),
            class: key.class_name().to_owned(),
            cycle: key.cycle(),
            bytes: key.obj_len(),
        });
        if key.class_name() != "TDirectory" {
            continue;
        }
        match key.value(ctx) {
            Ok(obj) => {
                if let Some(sub) = obj.as_any().downcast_ref::<Directory>() {
                    let sub_path = format!("{path}{}/", key.name());
                    collect(sub, ctx, &sub_path, rows);
                }
            }
            Err(err) => eprintln!("**error** {}{}: {err}", path, key.name()),
        }
    }
}
