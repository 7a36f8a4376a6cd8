//! `packetsort`: writes out-of-order packets into one id-ordered file.
#![forbid(unsafe_code)]

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cli::{demo, PacketWriter, WriteError, WriteOutcome};

#[derive(Parser, Debug)]
#[command(
    name = "packetsort",
    version,
    about = "Store packets in id order no matter the order they arrive in",
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the twenty sample packets in shuffled order and print the result.
    Demo {
        #[arg(long, env = "PACKETSORT_OUT", default_value = "results.dat")]
        out: PathBuf,

        #[arg(long, help = "Seed for the shuffle (random when omitted)")]
        seed: Option<u64>,

        #[arg(long, help = "fsync after every insertion")]
        sync: bool,
    },
    /// Write raw packet files, one packet per file, in argument order.
    Ingest {
        #[arg(long, env = "PACKETSORT_OUT")]
        out: PathBuf,

        #[arg(long, help = "fsync after every insertion")]
        sync: bool,

        #[arg(value_name = "PACKET", required = true)]
        packets: Vec<PathBuf>,
    },
    /// Print the contents of a backing file.
    Dump {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

#[derive(Debug, Default, PartialEq, Eq)]
struct IngestSummary {
    stored: usize,
    dropped: usize,
    duplicates: usize,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Demo { out: path, seed, sync } => {
            let contents = demo::run(&path, seed, sync, &mut out)?;
            print_contents(&contents, &mut out)?;
        }
        Command::Ingest {
            out: path,
            sync,
            packets,
        } => {
            let summary = ingest(&path, sync, &packets)?;
            writeln!(
                out,
                "stored {} packet(s), dropped {}, skipped {} duplicate(s)",
                summary.stored, summary.dropped, summary.duplicates
            )?;
        }
        Command::Dump { file } => {
            let contents =
                fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
            print_contents(&contents, &mut out)?;
        }
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Writes every packet file in `packets` into a fresh backing file at `out`.
///
/// Duplicate ids are logged and skipped; any other failure aborts.
fn ingest(out: &Path, sync: bool, packets: &[PathBuf]) -> Result<IngestSummary> {
    let mut writer = PacketWriter::create(out, sync)?;
    let mut summary = IngestSummary::default();

    for path in packets {
        let raw = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        match writer.write(&raw) {
            Ok(WriteOutcome::Stored { .. }) => summary.stored += 1,
            Ok(WriteOutcome::Dropped) => {
                info!(packet = %path.display(), len = raw.len(), "ingest.dropped");
                summary.dropped += 1;
            }
            Err(WriteError::DuplicateIdentifier(id)) => {
                warn!(packet = %path.display(), id, "ingest.duplicate");
                summary.duplicates += 1;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("writing {}", path.display()));
            }
        }
    }

    info!(
        path = %out.display(),
        stored = summary.stored,
        intervals = writer.index().len(),
        bytes = writer.index().total_len(),
        "ingest.done"
    );
    Ok(summary)
}

fn print_contents<W: Write>(contents: &[u8], out: &mut W) -> io::Result<()> {
    writeln!(out, "\nFILE CONTENT:")?;
    writeln!(out, "{}", String::from_utf8_lossy(contents))
}

#[cfg(test)]
mod tests {
    use super::*;
    use packet::encode_packet;
    use tempfile::tempdir;

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["packetsort", "demo", "--seed", "5", "--out", "x.dat"])
            .unwrap();
        match cli.command {
            Command::Demo { out, seed, sync } => {
                assert_eq!(out, PathBuf::from("x.dat"));
                assert_eq!(seed, Some(5));
                assert!(!sync);
            }
            other => panic!("unexpected command {other:?}"),
        }

        assert!(Cli::try_parse_from(["packetsort", "ingest", "--out", "o.dat"]).is_err());
        assert!(Cli::try_parse_from(["packetsort", "dump", "f.dat"]).is_ok());
    }

    #[test]
    fn ingest_orders_and_skips_duplicates() -> Result<()> {
        let dir = tempdir()?;
        let inputs = [
            (3u16, b"ccc".to_vec()),
            (1, b"a".to_vec()),
            (3, b"dup".to_vec()),
            (2, b"bb".to_vec()),
        ];
        let mut paths = Vec::new();
        for (i, (id, payload)) in inputs.iter().enumerate() {
            let p = dir.path().join(format!("p{i}.pkt"));
            fs::write(&p, encode_packet(*id, payload))?;
            paths.push(p);
        }
        let short = dir.path().join("short.pkt");
        fs::write(&short, b"zz\x00\x09")?;
        paths.push(short);

        let out = dir.path().join("out.dat");
        let summary = ingest(&out, false, &paths)?;
        assert_eq!(
            summary,
            IngestSummary {
                stored: 3,
                dropped: 1,
                duplicates: 1
            }
        );
        assert_eq!(fs::read(&out)?, b"abbccc");
        Ok(())
    }

    #[test]
    fn ingest_missing_packet_file_fails() -> Result<()> {
        let dir = tempdir()?;
        let out = dir.path().join("out.dat");
        let missing = vec![dir.path().join("nope.pkt")];
        assert!(ingest(&out, false, &missing).is_err());
        Ok(())
    }

    #[test]
    fn print_contents_matches_console_layout() -> io::Result<()> {
        let mut buf = Vec::new();
        print_contents(b"aaabb", &mut buf)?;
        assert_eq!(buf, b"\nFILE CONTENT:\naaabb\n");
        Ok(())
    }
}
