//! Dokankit CLI - Exercise the path engine and dispatcher from a shell
//!
//! Usage:
//!   dokankit normalize 'a\b\..\c'          # Print canonical paths
//!   dokankit match -i '*.TXT' a.txt b.md   # Print names matching a pattern
//!   dokankit ls ./data docs --pattern '*.md'
//!   dokankit cat ./data docs/readme.md
//!   dokankit --config mount.json config    # Print the effective config

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dokankit::{
    AdapterConfig, CreateArgs, CreationDisposition, Dispatcher, FileMetadata, MirrorFs,
    RequestInfo, StatusCode,
};
use tracing::{debug, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Dokankit - User-mode filesystem adapter
#[derive(Parser, Debug)]
#[command(name = "dokankit")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON config file (device options, volume information, free space)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    subcommand: SubCmd,
}

#[derive(Subcommand, Debug)]
enum SubCmd {
    /// Print the canonical form of each path
    Normalize {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Print the names that match a wildcard pattern
    Match {
        /// Compare case-insensitively
        #[arg(short = 'i', long)]
        ignore_case: bool,

        pattern: String,

        names: Vec<String>,
    },
    /// List a directory of a host root through the dispatcher
    Ls {
        root: PathBuf,

        #[arg(default_value = "/")]
        dir: String,

        /// Wildcard filter applied during enumeration
        #[arg(long, default_value = "*")]
        pattern: String,

        /// Emit entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a file of a host root through the dispatcher
    Cat { root: PathBuf, file: String },
    /// Print the effective configuration as JSON
    Config,
}

/// Handle id used for the single handle each command opens.
const HANDLE: u64 = 1;
const CHUNK: usize = 64 * 1024;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => AdapterConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => AdapterConfig::default(),
    };

    match args.subcommand {
        SubCmd::Normalize { paths } => normalize(&paths),
        SubCmd::Match {
            ignore_case,
            pattern,
            names,
        } => {
            for name in names
                .iter()
                .filter(|name| dokankit::matches(Some(name.as_str()), Some(pattern.as_str()), !ignore_case))
            {
                println!("{name}");
            }
            Ok(())
        }
        SubCmd::Ls {
            root,
            dir,
            pattern,
            json,
        } => list(config, root, &dir, &pattern, json),
        SubCmd::Cat { root, file } => cat(config, root, &file),
        SubCmd::Config => {
            println!("{}", config.to_json_pretty()?);
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "dokankit=debug,warn",
        _ => "dokankit=trace,debug",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn normalize(paths: &[String]) -> Result<()> {
    let mut failed = 0;
    for raw in paths {
        match dokankit::normalize(raw) {
            Ok(path) => println!("{path}"),
            Err(err) => {
                eprintln!("dokankit: {raw}: {err}");
                failed += 1;
            }
        }
    }
    if failed > 0 {
        bail!("{failed} path(s) could not be normalized");
    }
    Ok(())
}

fn mirror(config: AdapterConfig, root: PathBuf) -> Result<Dispatcher> {
    let fs = MirrorFs::new(&root)
        .with_context(|| format!("Failed to mirror: {}", root.display()))?;
    debug!(root = %fs.root().display(), "mirroring");
    Ok(Dispatcher::builder(Arc::new(fs)).config(config).build())
}

/// Open `raw_path` read-only, run `f`, then clean up and close.
fn with_handle<T>(
    dispatcher: &Dispatcher,
    raw_path: &str,
    directory: bool,
    f: impl FnOnce(&RequestInfo) -> Result<T>,
) -> Result<T> {
    let req = RequestInfo::new(HANDLE).process_id(std::process::id());
    let mut args = CreateArgs::new(CreationDisposition::OpenExisting);
    if directory {
        args = args.directory();
    }
    dispatcher
        .create(&req, raw_path, &args)
        .map_err(|status| status_error("open", raw_path, status))?;

    let result = f(&req);
    let released = release(dispatcher, &req, raw_path);
    match (result, released) {
        (Ok(_), Err(err)) => Err(err),
        (result, _) => result,
    }
}

/// Cleanup then close, always attempting both. Reports the first failure.
fn release(dispatcher: &Dispatcher, req: &RequestInfo, raw_path: &str) -> Result<()> {
    let cleanup = dispatcher.cleanup(req, raw_path);
    if let Err(status) = cleanup {
        warn!(path = raw_path, %status, "cleanup failed");
    }
    let close = dispatcher.close(req, raw_path);
    if let Err(status) = close {
        warn!(path = raw_path, %status, "close failed");
    }
    cleanup
        .map_err(|status| status_error("cleanup", raw_path, status))
        .and(close.map_err(|status| status_error("close", raw_path, status)))
}

fn status_error(op: &str, path: &str, status: StatusCode) -> anyhow::Error {
    anyhow::anyhow!("{op} {path}: {status}")
}

/// Paths given on the command line are relative to the mirrored root.
fn rooted(raw: &str) -> String {
    format!("/{}", raw.trim_start_matches(['/', '\\']))
}

fn list(config: AdapterConfig, root: PathBuf, dir: &str, pattern: &str, json: bool) -> Result<()> {
    let dispatcher = mirror(config, root)?;
    let dir = rooted(dir);
    let entries: Vec<FileMetadata> = with_handle(&dispatcher, &dir, true, |req| {
        dispatcher
            .enumerate_with_pattern(req, &dir, pattern)
            .map_err(|status| status_error("list", &dir, status))
    })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    for entry in entries {
        let marker = if entry.is_directory() { "d" } else { "-" };
        println!("{marker} {:>12} {}", entry.size, entry.name);
    }
    Ok(())
}

fn cat(config: AdapterConfig, root: PathBuf, file: &str) -> Result<()> {
    let dispatcher = mirror(config, root)?;
    let file = rooted(file);
    let file = file.as_str();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    with_handle(&dispatcher, file, false, |req| {
        let mut buf = vec![0u8; CHUNK];
        let mut offset: i64 = 0;
        loop {
            let n = dispatcher
                .read(req, file, &mut buf, offset)
                .map_err(|status| status_error("read", file, status))?;
            if n == 0 {
                break;
            }
            out.write_all(&buf[..n])?;
            offset += i64::try_from(n)?;
        }
        out.flush()?;
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let args = Args::try_parse_from(["dokankit", "normalize", "a\\b", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
        assert!(matches!(args.subcommand, SubCmd::Normalize { paths } if paths == ["a\\b"]));
    }

    #[test]
    fn ls_defaults() {
        let args = Args::try_parse_from(["dokankit", "ls", "/tmp"]).unwrap();
        match args.subcommand {
            SubCmd::Ls { dir, pattern, json, .. } => {
                assert_eq!(dir, "/");
                assert_eq!(pattern, "*");
                assert!(!json);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn release_reports_cleanup_failure_and_still_closes() {
        let fs = Arc::new(dokankit::MemoryFs::new());
        fs.add_file("/a.txt", b"a").unwrap();
        let dispatcher = Dispatcher::new(fs.clone());
        let req = RequestInfo::new(HANDLE);
        dispatcher
            .create(&req, "/a.txt", &CreateArgs::new(CreationDisposition::OpenExisting))
            .unwrap();

        let err = release(&dispatcher, &req, "/../a.txt").unwrap_err().to_string();
        assert!(err.starts_with("cleanup /../a.txt"), "{err}");
        assert_eq!(dispatcher.open_handles(), 0);
        assert_eq!(fs.open_handle_count(), 0);
    }

    #[test]
    fn command_line_paths_are_rooted() {
        assert_eq!(rooted("docs/a.txt"), "/docs/a.txt");
        assert_eq!(rooted("\\docs"), "/docs");
        assert_eq!(rooted("/"), "/");
    }

    #[test]
    fn lists_through_the_dispatcher() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), b"a").unwrap();
        std::fs::write(dir.path().join("b.md"), b"b").unwrap();

        let dispatcher = mirror(AdapterConfig::default(), dir.path().to_path_buf()).unwrap();
        let names = with_handle(&dispatcher, "/", true, |req| {
            dispatcher
                .enumerate_with_pattern(req, "/", "*.txt")
                .map_err(|status| status_error("list", "/", status))
        })
        .unwrap();
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].name, "a.txt");
        assert_eq!(dispatcher.open_handles(), 0);
    }

    #[test]
    fn open_failure_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let dispatcher = mirror(AdapterConfig::default(), dir.path().to_path_buf()).unwrap();
        let err = with_handle(&dispatcher, "/missing.txt", false, |_| Ok(())).unwrap_err();
        assert!(err.to_string().contains("/missing.txt"));
        assert!(err.to_string().contains("ObjectNameNotFound"));
    }
}
