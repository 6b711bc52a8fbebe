use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use canopy::config::IngestOptions;
use canopy::content::MemoryContentStore;
use canopy::identity::{Group, MemoryDirectory, User};
use canopy::{do_ingest, Catalog};

const USAGE: &str = "usage: canopy-ingest <user|-> <group> <path> [--reference] [--localip IP] [--include EXPR] [--no-compress]";

struct Args {
    user: String,
    group: String,
    path: PathBuf,
    opts: IngestOptions,
}

fn parse_args(mut argv: impl Iterator<Item = String>) -> anyhow::Result<Args> {
    let mut positional = Vec::new();
    let mut opts = IngestOptions::default();
    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "--reference" => opts.is_reference = true,
            "--no-compress" => opts.compress = false,
            "--localip" => opts.local_ip = Some(argv.next().context("--localip needs a value")?),
            "--include" => opts.include_pattern = Some(argv.next().context("--include needs a value")?),
            "-h" | "--help" => bail!(USAGE),
            s if s.starts_with("--") => bail!("unknown option {s}\n{USAGE}"),
            _ => positional.push(arg),
        }
    }
    let [user, group, path]: [String; 3] = positional.try_into().map_err(|_| anyhow::anyhow!(USAGE))?;
    let user = if user == "-" { whoami::username() } else { user };
    Ok(Args { user, group, path: PathBuf::from(path), opts })
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let args = parse_args(std::env::args().skip(1))?;
    info!(
        target: "canopy",
        "canopy-ingest: user='{}', group='{}', path='{}', reference={}, compress={}",
        args.user, args.group, args.path.display(), args.opts.is_reference, args.opts.compress
    );

    let directory = Arc::new(MemoryDirectory::new());
    let group = directory.add_group(Group::new(&args.group));
    let user = directory.add_user(User::new(&args.user).with_groups([group.id()]));
    let catalog = Catalog::builder().directory(directory).build();
    let content = Arc::new(MemoryContentStore::new());

    let report = do_ingest(&catalog, content.clone(), &user, &group, &args.path, &args.opts)
        .with_context(|| format!("ingesting {}", args.path.display()))?;
    let counts = catalog.tree().counts()?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    println!(
        "tree: {} collections, {} resources; content: {} objects, {} bytes stored",
        counts.collections,
        counts.resources,
        content.object_count(),
        content.stored_bytes()
    );
    Ok(())
}
