use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, info};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use syno_file_station::client::SynoClient;
use syno_file_station::entities::{ApiInfo, FileInfo};
use syno_file_station::file_station::supported_apis;
use syno_file_station::session::Session;
use syno_file_station::utils::format_time;
use tabwriter::TabWriter;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser)]
#[command(name = "synocli", version, about = "CLI for Synology NAS")]
struct Cli {
    /// Address of the Synology NAS, e.g. https://10.0.0.10:5001
    #[arg(long, env = "SYNOLOGY_HOST")]
    address: String,

    /// Username to login
    #[arg(long, env = "SYNOLOGY_USERNAME")]
    user: Option<String>,

    /// Password
    #[arg(long, env = "SYNOLOGY_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Output display format
    #[arg(long, value_enum, default_value_t = Format::Human, global = true)]
    format: Format,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Accept self-signed TLS certificates
    #[arg(long)]
    insecure: bool,

    /// Request timeout in milliseconds
    #[arg(long, default_value_t = 3000)]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Human,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// API info commands
    #[command(subcommand)]
    Api(ApiCommand),

    /// FileStation commands
    #[command(subcommand, visible_alias = "fs")]
    Filestation(FileStationCommand),
}

#[derive(Subcommand)]
enum ApiCommand {
    /// List APIs reported by the NAS
    #[command(visible_alias = "ls")]
    List,
}

#[derive(Subcommand)]
enum FileStationCommand {
    /// List shared folders, or the content of a folder
    #[command(visible_alias = "ls")]
    List {
        /// Folder to list; shared folders are listed when empty or "/"
        #[arg(long, default_value = "")]
        path: String,
    },

    /// Stat a specific path
    Stat {
        #[arg(long)]
        path: String,
    },

    /// Download a file
    #[command(visible_alias = "dl")]
    Download {
        #[arg(long)]
        path: String,

        /// Destination file; standard output when omitted
        #[arg(long)]
        dest: Option<PathBuf>,
    },

    /// Calculate the MD5 of a file on the NAS
    Md5 {
        #[arg(long)]
        path: String,
    },
}

fn init_tracing(debug: bool) {
    let default = if debug {
        "syno_file_station=debug,synocli=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let client = SynoClient::builder()
        .host(&cli.address)
        .timeout(cli.timeout)
        .accept_invalid_certs(cli.insecure)
        .build()?;

    match cli.command {
        Command::Api(ApiCommand::List) => {
            let apis = client.query_api_info().await?;
            print_apis(&apis.iter().collect::<Vec<_>>(), cli.format)?;
        }
        Command::Filestation(command) => {
            let user = cli.user.as_deref().context("--user required")?;
            let password = cli.password.as_deref().context("--password required")?;

            let session = client.login(user, password).await?;
            let result = run_file_station(&session, command, cli.format).await;

            if let Err(err) = session.logout().await {
                debug!("{err:#}");
            }
            result?;
        }
    }

    Ok(())
}

async fn run_file_station(session: &Session, command: FileStationCommand, format: Format) -> Result<()> {
    match command {
        FileStationCommand::List { path } => {
            let files = if path.is_empty() || path == "/" {
                session.list_shares().await?
            } else {
                session.list(&path).await?
            };
            print_listing(&files, format)
        }
        FileStationCommand::Stat { path } => {
            let files = session.stat(&path).await?;
            print_stat(&files, format)
        }
        FileStationCommand::Download { path, dest } => {
            let written = match dest {
                Some(dest) => {
                    let mut file = tokio::fs::File::create(&dest)
                        .await
                        .with_context(|| format!("Failed to create {}", dest.display()))?;
                    session.download(&path, &mut file).await?
                }
                None => session.download(&path, &mut tokio::io::stdout()).await?,
            };
            info!("Downloaded {written} bytes from {path}");
            Ok(())
        }
        FileStationCommand::Md5 { path } => {
            let hash = session.md5(&path).await?;
            match format {
                Format::Human => println!("{hash} {path}"),
                Format::Json => print_json(&serde_json::json!({ "path": path, "md5": hash }))?,
            }
            Ok(())
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_apis(apis: &[&ApiInfo], format: Format) -> Result<()> {
    if format == Format::Json {
        return print_json(apis);
    }

    let rows = apis
        .iter()
        .map(|api| {
            let mark = if supported_apis().contains(&api.name.as_str()) { "*" } else { "" };
            vec![
                format!("{}{mark}", api.name),
                api.min_version.to_string(),
                api.max_version.to_string(),
                api.path.clone(),
            ]
        })
        .collect::<Vec<_>>();
    print_table(&["API", "Min", "Max", "Path"], &rows)
}

fn print_listing(files: &[FileInfo], format: Format) -> Result<()> {
    if format == Format::Json {
        return print_json(files);
    }

    let rows = files
        .iter()
        .map(|file| {
            vec![
                (if file.isdir { "DIR" } else { "" }).to_string(),
                file.mode_string(),
                file.additional.owner.user.clone(),
                file.additional.owner.group.clone(),
                file.calculate_size(),
                file.name.clone(),
            ]
        })
        .collect::<Vec<_>>();
    print_table(&["", "Mode", "Owner", "Group", "Size", "Name"], &rows)
}

fn print_stat(files: &[FileInfo], format: Format) -> Result<()> {
    if format == Format::Json {
        return print_json(files);
    }

    for file in files {
        let additional = &file.additional;
        println!("File: {}", file.path);
        println!("Size: {:>10}  File Type: {}", file.calculate_size(), file.kind());
        println!(
            "Owner: {:>10} ({})  Group: {} ({})",
            additional.owner.user, additional.owner.uid, additional.owner.group, additional.owner.gid
        );
        println!("Mode: {}", file.mode_string());
        println!("Access: {}", format_time(&additional.time.atime));
        println!("Modify: {}", format_time(&additional.time.mtime));
        println!("Change: {}", format_time(&additional.time.ctime));
        println!(" Birth: {}", format_time(&additional.time.crtime));
    }
    Ok(())
}

/// Prints left-aligned columns separated by two spaces
fn print_table(header: &[&str], rows: &[Vec<String>]) -> Result<()> {
    print!("{}", render_table(header, rows)?);
    Ok(())
}

fn render_table(header: &[&str], rows: &[Vec<String>]) -> Result<String> {
    let mut tw = TabWriter::new(Vec::new()).padding(2);
    writeln!(tw, "{}", header.join("\t"))?;
    for row in rows {
        writeln!(tw, "{}", row.join("\t"))?;
    }
    let table = tw
        .into_inner()
        .map_err(|_| anyhow!("Failed to render table"))?;
    Ok(String::from_utf8(table)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_table_aligns_columns() {
        let rows = vec![
            vec!["home".to_string(), "1.0 KiB".to_string()],
            vec!["photo".to_string(), "12 B".to_string()],
        ];
        let table = render_table(&["Name", "Size"], &rows).unwrap();

        assert_eq!(table, "Name   Size\nhome   1.0 KiB\nphoto  12 B\n");
    }
}
