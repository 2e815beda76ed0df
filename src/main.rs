mod catalog;
mod guide;
mod store;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::info;

use catalog::DeviceDraft;
use guide::GuideConfig;
use store::{JsonStore, Store};

const DEFAULT_DATA_DIR: &str = "data";

const USAGE: &str = "Usage: trouble-guide [data-dir] [device-id]\n       \
     trouble-guide <data-dir> import <device-id> <file.json>\n       \
     trouble-guide <data-dir> set-device <device-id|-> <name> <model> <core-device> <brand> [image-url]\n       \
     trouble-guide <data-dir> remove-device <device-id>\n       \
     trouble-guide <data-dir> remove-tree <device-id>\n       \
     trouble-guide <data-dir> check\n\
     \n\
     Example:\n  trouble-guide ./data hair-dryer-pro-2024\n\
     \n\
     Logging: set RUST_LOG=info or RUST_LOG=debug for verbose output";

fn main() -> Result<()> {
    // Initialize logging. Control verbosity with RUST_LOG env var:
    //   RUST_LOG=info   trouble-guide   # store writes + sessions
    //   RUST_LOG=debug  trouble-guide   # + every navigator transition
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().skip(1).any(|a| a == "-h" || a == "--help") {
        println!("{USAGE}");
        return Ok(());
    }

    let data_dir = args
        .get(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

    let mut store = JsonStore::open(&data_dir)
        .with_context(|| format!("failed to open data directory {}", data_dir.display()))?;

    let arg = |i: usize| args.get(i).map(String::as_str).context(USAGE);

    match args.get(2).map(String::as_str) {
        Some("import") => return import_file(&mut store, arg(3)?, Path::new(arg(4)?)),
        Some("set-device") => {
            let draft = DeviceDraft {
                id: if arg(3)? == "-" { String::new() } else { arg(3)?.to_string() },
                name: arg(4)?.to_string(),
                model: arg(5)?.to_string(),
                core_device: arg(6)?.to_string(),
                brand_name: arg(7)?.to_string(),
                image_url: args.get(8).cloned().unwrap_or_default(),
            };
            let device = draft.into_device()?;
            let id = device.id.clone();
            store.upsert_device(device)?;
            println!("Saved device {id}");
            return Ok(());
        }
        Some("remove-device") => {
            catalog::delete_device_cascade(&mut store, arg(3)?)?;
            println!("Removed device {} and its procedures", arg(3)?);
            return Ok(());
        }
        Some("remove-tree") => {
            store.delete_tree(arg(3)?)?;
            println!("Removed procedures for {}", arg(3)?);
            return Ok(());
        }
        Some("check") => return check_trees(&store),
        _ => {}
    }

    let config = GuideConfig::from_env(args.get(2).cloned());
    info!("Using data directory {}", store.dir().display());

    guide::run(&store, &config, io::stdin().lock(), io::stdout())
}

/// Validate a JSON procedure file and store it as `device_id`'s decision tree.
fn import_file<S: Store>(store: &mut S, device_id: &str, file: &Path) -> Result<()> {
    if file.extension().and_then(|e| e.to_str()) != Some("json") {
        bail!("please select a JSON file (got {})", file.display());
    }

    let devices = store.devices()?;
    let device = devices
        .iter()
        .find(|d| d.id == device_id)
        .with_context(|| format!("unknown device '{device_id}'"))?;

    let content =
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;

    let tree = guide::import::import_tree(device_id, &content)
        .with_context(|| format!("rejected {}", file.display()))?;

    store.upsert_tree(tree)?;
    println!("Decision tree successfully imported for {}!", device.name);
    Ok(())
}

/// Report integrity problems in every stored tree. Fails if any were found.
fn check_trees<S: Store>(store: &S) -> Result<()> {
    let devices = store.devices()?;
    let mut problems = 0;

    for (device_id, tree) in store.trees()? {
        if !devices.iter().any(|d| d.id == device_id) {
            println!("{device_id}: no such device");
            problems += 1;
        }
        if device_id != tree.device_id {
            println!("{device_id}: stored under the wrong key (deviceId is {})", tree.device_id);
            problems += 1;
        }
        if let Err(errors) = tree.validate() {
            for e in &errors {
                println!("{device_id}: {e}");
            }
            problems += errors.len();
        }
        for orphan in tree.unreachable() {
            println!("{device_id}: warning: node {orphan} is unreachable");
        }
    }

    if problems > 0 {
        bail!("{problems} problem(s) found");
    }
    println!("All decision trees are valid.");
    Ok(())
}
