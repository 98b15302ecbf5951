//! Chunk Upload CLI
//!
//! A command-line tool for sending files to a chunk upload endpoint.

use chunked_upload::{
    parse_size, AssetRef, ChunkPlan, LogLevel, UploadOptions, UploadSession, UploadSource,
    UploadStrategy, Uploader, UploaderConfig,
};
use clap::{Arg, ArgMatches, Command};
use std::path::Path;

fn cli() -> Command {
    Command::new("chunk-upload")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Upload files in chunks and print the resulting asset URI")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Verbose output")
                .action(clap::ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("JSON configuration file")
                .global(true),
        )
        .arg(
            Arg::new("chunk-size")
                .long("chunk-size")
                .help("Chunk size, e.g. 2MiB or 1048576")
                .global(true),
        )
        .subcommand(
            Command::new("upload")
                .about("Upload a file")
                .arg(Arg::new("path").help("File to upload").required(true))
                .arg(Arg::new("endpoint").long("endpoint").help("Upload endpoint URL"))
                .arg(Arg::new("user-id").long("user-id").help("User identifier"))
                .arg(Arg::new("key").long("key").help("Access key"))
                .arg(Arg::new("token").long("token").help("Bearer token"))
                .arg(
                    Arg::new("uri-field")
                        .long("uri-field")
                        .help("Response field holding the asset URI"),
                )
                .arg(
                    Arg::new("concurrency")
                        .long("concurrency")
                        .help("Chunks in flight at once")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    Arg::new("timeout")
                        .long("timeout")
                        .help("Per-request timeout in seconds")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(Arg::new("name").long("name").help("File name sent to the endpoint"))
                .arg(
                    Arg::new("session")
                        .long("session")
                        .help("Session file; a failed upload resumes from it"),
                ),
        )
        .subcommand(
            Command::new("plan")
                .about("Show how a file would be split into chunks")
                .arg(Arg::new("path").help("File to inspect").required(true)),
        )
        .subcommand(
            Command::new("url")
                .about("Render the public URL of an asset URI")
                .arg(Arg::new("uri").help("Asset URI").required(true))
                .arg(Arg::new("base").long("base").help("Asset base URL")),
        )
}

fn load_config(matches: &ArgMatches) -> Result<UploaderConfig, Box<dyn std::error::Error>> {
    let config = match matches.get_one::<String>("config") {
        Some(path) => UploaderConfig::from_file(path)?,
        None => UploaderConfig::default(),
    };
    apply_global_flags(config.with_env()?, matches)
}

fn apply_global_flags(
    mut config: UploaderConfig,
    matches: &ArgMatches,
) -> Result<UploaderConfig, Box<dyn std::error::Error>> {
    if let Some(size) = matches.get_one::<String>("chunk-size") {
        config.chunk_size = parse_size(size)?;
    }

    Ok(config)
}

fn apply_upload_flags(mut config: UploaderConfig, matches: &ArgMatches) -> UploaderConfig {
    if let Some(endpoint) = matches.get_one::<String>("endpoint") {
        config = config.endpoint(endpoint);
    }
    if let Some(user_id) = matches.get_one::<String>("user-id") {
        config = config.user_id(user_id);
    }
    if let Some(key) = matches.get_one::<String>("key") {
        config = config.access_key(key);
    }
    if let Some(token) = matches.get_one::<String>("token") {
        config = config.auth_token(token);
    }
    if let Some(field) = matches.get_one::<String>("uri-field") {
        config = config.uri_field(field);
    }
    if let Some(concurrency) = matches.get_one::<usize>("concurrency") {
        config = config.concurrency(*concurrency);
    }
    if let Some(timeout) = matches.get_one::<u64>("timeout") {
        config = config.timeout_secs(*timeout);
    }
    config
}

async fn run_upload(
    config: UploaderConfig,
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = matches
        .get_one::<String>("path")
        .ok_or("missing file path")?;
    let config = apply_upload_flags(config, matches);
    let uri_field = config.uri_field.clone();
    let asset_base = config.asset_base_url.clone();
    let uploader = Uploader::new(config)?;

    let mut source = UploadSource::from_path(path).await?;
    if let Some(name) = matches.get_one::<String>("name") {
        source = source.with_name(name);
    }

    let options = UploadOptions::new()
        .strategy(UploadStrategy::Auto)
        .on_progress(|progress| {
            println!(
                "Upload progress: chunk {}/{} ({}%)",
                progress.chunks_acknowledged, progress.total_chunks, progress.percent
            );
        });

    let result = match matches.get_one::<String>("session") {
        Some(session_path) => {
            let mut session = if Path::new(session_path).exists() {
                let session = UploadSession::load(session_path)?;
                println!(
                    "Resuming session {} at {}%",
                    session.upload_id,
                    session.percent()
                );
                session
            } else {
                UploadSession::new(&source, uploader.config().chunk_size)?
            };

            let result = uploader
                .upload_with_session(&source, &mut session, options)
                .await;
            session.save(session_path)?;
            result?
        }
        None => uploader.upload(&source, options).await?,
    };

    let uri = result.require_asset_uri(&uri_field)?;
    println!(
        "Uploaded {} ({} bytes, {} chunks) in {} ms",
        result.file_name, result.size, result.chunks, result.duration_ms
    );
    println!("{}", uri);
    if let Some(base) = asset_base {
        println!("{}", AssetRef::new(uri).public_url(&base));
    }

    Ok(())
}

async fn run_plan(
    config: &UploaderConfig,
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = matches
        .get_one::<String>("path")
        .ok_or("missing file path")?;
    let source = UploadSource::from_path(path).await?;
    let plan = ChunkPlan::new(source.size(), config.chunk_size)?;

    println!(
        "{}: {} bytes, {} chunks of up to {} bytes",
        source.name(),
        plan.file_size(),
        plan.total_chunks(),
        plan.chunk_size()
    );
    for chunk in plan.chunks() {
        println!(
            "  {}. bytes {}..{} ({} bytes)",
            chunk.index,
            chunk.start,
            chunk.end,
            chunk.len()
        );
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = cli().get_matches();

    let level = if matches.get_flag("verbose") {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    };
    env_logger::Builder::from_default_env()
        .filter_level(level.into())
        .init();

    let config = load_config(&matches)?;

    match matches.subcommand() {
        Some(("upload", sub_matches)) => run_upload(config, sub_matches).await?,
        Some(("plan", sub_matches)) => run_plan(&config, sub_matches).await?,
        Some(("url", sub_matches)) => {
            let uri = sub_matches
                .get_one::<String>("uri")
                .ok_or("missing asset URI")?;
            let base = sub_matches
                .get_one::<String>("base")
                .cloned()
                .or(config.asset_base_url)
                .ok_or("no asset base URL; pass --base or set UPLOAD_ASSET_BASE_URL")?;
            println!("{}", AssetRef::new(uri.as_str()).public_url(&base));
        }
        _ => {
            eprintln!("No subcommand provided. Use --help for usage information.");
            std::process::exit(1);
        }
    }

    Ok(())
}
