use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};

use telempack_core::{
    Dialect, PacketBody, PacketReader, SNIFF_WINDOW, Strictness, StreamError, parse_header,
    record_length, sniff,
};

#[derive(Parser, Debug)]
#[command(name = "telempack")]
#[command(version)]
#[command(
    about = "Structural reader and checker for packetized telemetry streams.",
    long_about = None,
    after_help = "Examples:\n  telempack sniff stream.d2s\n  telempack verify stream.d2s\n  telempack verify stream.d3b --header"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Detect the content kind, version, tag style and namespace usage of an
    /// input and print them as JSON.
    Sniff {
        /// Path to a packetized stream or standalone document
        input: PathBuf,
    },
    /// Read every packet of a stream, checking framing, header
    /// well-formedness and declared data lengths. Halts at the first defect.
    Verify {
        /// Path to a packetized stream
        input: PathBuf,

        /// Echo header payloads as they are read
        #[arg(long)]
        header: bool,

        /// Suppress the per-packet listing
        #[arg(long)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Sniff { input } => cmd_sniff(input),
        Commands::Verify {
            input,
            header,
            quiet,
        } => cmd_verify(input, header, quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

fn cmd_sniff(input: PathBuf) -> Result<(), CliError> {
    let mut file = File::open(&input)
        .with_context(|| format!("Failed to open input file: {}", input.display()))
        .map_err(CliError::from)?;
    let mut head = Vec::new();
    file.by_ref()
        .take(SNIFF_WINDOW as u64)
        .read_to_end(&mut head)
        .with_context(|| format!("Failed to read input file: {}", input.display()))
        .map_err(CliError::from)?;

    let info = sniff(&head).map_err(|err| {
        CliError::new(
            err.to_string(),
            Some("the input is not a recognized telemetry stream or document".to_string()),
        )
    })?;

    let json = serde_json::to_string_pretty(&info)
        .context("Failed to serialize detection result")
        .map_err(CliError::from)?;
    println!("{json}");
    Ok(())
}

fn cmd_verify(input: PathBuf, print_headers: bool, quiet: bool) -> Result<(), CliError> {
    let file = File::open(&input)
        .with_context(|| format!("Failed to open input file: {}", input.display()))
        .map_err(CliError::from)?;

    let mut reader = PacketReader::open(file).map_err(|err| stream_cli_error(&err))?;
    let info = reader.stream_info().clone();
    let dialect = info
        .version
        .as_deref()
        .map(Dialect::from_version)
        .unwrap_or(Dialect::Legacy);
    if !quiet {
        println!(
            "content {:?}, version {}, tag style {:?}, namespaces {}",
            info.content,
            info.version.as_deref().unwrap_or("(none)"),
            info.tag_style,
            info.namespaces
        );
    }

    // Verify-level expected sizes: stricter than framing, which tolerates
    // longer variable-dialect records.
    let mut expected_size: [Option<Option<usize>>; 100] = [None; 100];
    let mut data_count = [0u64; 100];
    let mut packets = 0u64;
    let mut headers = 0u64;
    let mut data = 0u64;

    loop {
        let at = reader.offset();
        let packet = match reader.next_packet() {
            Ok(Some(packet)) => packet,
            Ok(None) => break,
            Err(err) => return Err(stream_cli_error(&err)),
        };
        packets += 1;

        if !quiet {
            println!(
                "{at:>10}  |{}|{}| {} bytes",
                packet.tag, packet.id, packet.length
            );
        }

        match &packet.body {
            PacketBody::Header(header) => {
                headers += 1;
                if print_headers {
                    println!("{}", header.text);
                }
                // Out-of-band headers frame without being parsed, so
                // well-formedness is checked here.
                if let Err(err) = parse_header(&header.text, header.dialect()) {
                    print_error_context(&header.text, err.line());
                    return Err(CliError::new(
                        format!("in header for packet id {}: {err}", packet.id),
                        None,
                    ));
                }
            }
            PacketBody::DataHeader(data_header) => {
                headers += 1;
                if print_headers {
                    println!("{}", data_header.header.text);
                }
                // Re-resolve strictly so sizing defects surface with their
                // source line, even where advisory framing shrugged.
                if let Some(tree) = data_header.header.cached_tree() {
                    if let Err(err) = record_length(tree, dialect, Strictness::Strict) {
                        print_error_context(&data_header.header.text, err.line());
                        return Err(CliError::new(
                            format!("in header for packet id {}: {err}", packet.id),
                            None,
                        ));
                    }
                }
                expected_size[packet.id as usize] = Some(data_header.record_length);
                data_count[packet.id as usize] = 0;
            }
            PacketBody::Data(_) => {
                data += 1;
                data_count[packet.id as usize] += 1;
                if let Some(Some(size)) = expected_size[packet.id as usize] {
                    if packet.length != size {
                        return Err(CliError::new(
                            format!(
                                "data packet {} of id {}: size mismatch, expected {} read {}",
                                data_count[packet.id as usize], packet.id, size, packet.length
                            ),
                            None,
                        ));
                    }
                }
            }
            PacketBody::Unknown(_) => {}
        }
    }

    if !quiet {
        println!(
            "{} packets read: {} headers, {} data, {} bytes total",
            packets,
            headers,
            data,
            reader.offset()
        );
    }
    println!("{}: no structural defects found", input.display());
    Ok(())
}

fn stream_cli_error(err: &StreamError) -> CliError {
    let hint = match err {
        StreamError::Frame { .. } => {
            Some("are the type lengths correct in the data header packet?".to_string())
        }
        StreamError::UndefinedPacketId { .. } => {
            Some("data packets must follow a header with the same id".to_string())
        }
        _ => None,
    };
    CliError::new(err.to_string(), hint)
}

/// Print a header payload with a cursor on the offending line. Only lines
/// within six of the target are shown, and long lines are clipped.
fn print_error_context(text: &str, line: u32) {
    for (index, raw) in text.lines().enumerate() {
        let line_no = (index + 1) as u32;
        if line > 0 && line_no.abs_diff(line) > 6 {
            continue;
        }
        let shown: String = if raw.chars().count() > 80 {
            let clipped: String = raw.chars().take(76).collect();
            format!("{clipped} ...")
        } else {
            raw.to_string()
        };
        if line_no == line {
            eprintln!("    {line_no:3}---> {shown}");
        } else {
            eprintln!("    {line_no:3}     {shown}");
        }
    }
}
