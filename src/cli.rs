// Command line interface

use anyhow::{anyhow, Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::config::{load_destinations, save_destinations, select_destination, serializer_for};
use crate::domain::naming::{NameParser, NameParserType};
use crate::domain::template::{CustomUploaderParser, FunctionRegistry, ParseContext};
use crate::domain::uploader::{migrate, needs_migration, CustomUploaderItem, TemplateCompiler};
use crate::transport::{upload, ReqwestTransport, UploadData, DEFAULT_TIMEOUT};

fn input_arg() -> Arg {
    Arg::new("input")
        .short('i')
        .long("input")
        .value_name("TEXT")
        .help("Text available to templates as {input}")
}

fn filename_arg() -> Arg {
    Arg::new("filename")
        .short('f')
        .long("filename")
        .value_name("NAME")
        .help("File name available to templates as {filename}")
}

fn destination_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("destination")
                .required(true)
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Destination file (.sxcu JSON or YAML list)"),
        )
        .arg(
            Arg::new("name")
                .short('n')
                .long("name")
                .value_name("NAME")
                .help("Destination to use when the file holds several"),
        )
}

pub fn build_cli() -> Command {
    Command::new("custom-uploader")
        .about("Custom upload destination templates")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("parse")
                .about("Interpret a template against a request context")
                .arg(Arg::new("template").required(true).value_name("TEMPLATE"))
                .arg(input_arg())
                .arg(filename_arg()),
        )
        .subcommand(
            Command::new("name")
                .about("Expand %name tokens")
                .arg(Arg::new("pattern").required(true).value_name("PATTERN"))
                .arg(
                    Arg::new("type")
                        .short('t')
                        .long("type")
                        .value_name("TYPE")
                        .default_value("text")
                        .help("text, filename, filepath or url"),
                )
                .arg(
                    Arg::new("counter")
                        .short('c')
                        .long("counter")
                        .value_name("NUMBER")
                        .value_parser(clap::value_parser!(u64))
                        .help("Current auto-increment value"),
                )
                .arg(
                    Arg::new("timezone")
                        .short('z')
                        .long("timezone")
                        .value_name("ZONE")
                        .help("IANA time zone, e.g. Europe/Berlin"),
                )
                .arg(
                    Arg::new("preview")
                        .long("preview")
                        .action(ArgAction::SetTrue)
                        .help("Print errors inline instead of failing"),
                ),
        )
        .subcommand(
            Command::new("migrate")
                .about("Upgrade destinations written with older syntaxes")
                .arg(
                    Arg::new("destination")
                        .required(true)
                        .value_name("FILE")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("write")
                        .short('w')
                        .long("write")
                        .action(ArgAction::SetTrue)
                        .help("Save the migrated file instead of printing it"),
                ),
        )
        .subcommand(destination_args(
            Command::new("request")
                .about("Print the request a destination would send")
                .arg(input_arg())
                .arg(filename_arg()),
        ))
        .subcommand(destination_args(
            Command::new("upload")
                .about("Upload a file or text to a destination")
                .arg(
                    Arg::new("file")
                        .long("file")
                        .value_name("PATH")
                        .value_parser(clap::value_parser!(PathBuf)),
                )
                .arg(input_arg())
                .arg(
                    Arg::new("timeout")
                        .long("timeout")
                        .value_name("SECONDS")
                        .value_parser(clap::value_parser!(u64)),
                ),
        ))
}

pub async fn run(matches: ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("parse", args)) => run_parse(args),
        Some(("name", args)) => run_name(args),
        Some(("migrate", args)) => run_migrate(args),
        Some(("request", args)) => run_request(args),
        Some(("upload", args)) => run_upload(args).await,
        _ => Err(anyhow!("Unknown command")),
    }
}

fn string_arg<'a>(args: &'a ArgMatches, name: &str) -> Option<&'a str> {
    args.get_one::<String>(name).map(|s| s.as_str())
}

fn run_parse(args: &ArgMatches) -> Result<()> {
    let template = string_arg(args, "template").unwrap_or_default();
    let registry = FunctionRegistry::new();
    let context = ParseContext::for_request(string_arg(args, "filename"), string_arg(args, "input"));
    let parser = CustomUploaderParser::new(&registry, context);

    let output = parser.parse_with_names(template, &mut NameParser::default())?;
    println!("{}", output);
    Ok(())
}

fn run_name(args: &ArgMatches) -> Result<()> {
    let pattern = string_arg(args, "pattern").unwrap_or_default();
    let parser_type: NameParserType = string_arg(args, "type")
        .unwrap_or("text")
        .parse()
        .map_err(|e: String| anyhow!(e))?;

    let mut names = NameParser::new(parser_type)
        .with_auto_increment_number(args.get_one::<u64>("counter").copied().unwrap_or(0))
        .with_preview(args.get_flag("preview"));
    if let Some(zone) = string_arg(args, "timezone") {
        let zone = zone
            .parse::<chrono_tz::Tz>()
            .map_err(|e| anyhow!("Invalid time zone \"{}\": {}", zone, e))?;
        names = names.with_time_zone(zone);
    }

    println!("{}", names.parse(pattern)?);
    Ok(())
}

fn run_migrate(args: &ArgMatches) -> Result<()> {
    let path = destination_path(args)?;
    let items = load_destinations(path)?;
    let outdated = items.iter().filter(|item| needs_migration(item)).count();
    let items: Vec<CustomUploaderItem> = items.into_iter().map(migrate).collect();

    if args.get_flag("write") {
        if outdated > 0 {
            save_destinations(path, &items)?;
        }
        info!(path = %path.display(), migrated = outdated, "Migrated destination file");
    } else {
        println!("{}", serializer_for(path).serialize(&items)?);
    }
    Ok(())
}

fn run_request(args: &ArgMatches) -> Result<()> {
    let item = load_item(args)?;
    let mut compiler = TemplateCompiler::new(Arc::new(FunctionRegistry::new()));
    let context = ParseContext::for_request(string_arg(args, "filename"), string_arg(args, "input"));

    let request = compiler.build_request(&item, &context)?;
    println!("{}", serde_json::to_string_pretty(&request)?);
    Ok(())
}

async fn run_upload(args: &ArgMatches) -> Result<()> {
    let item = load_item(args)?;
    let file = match args.get_one::<PathBuf>("file") {
        Some(path) => Some(read_upload(path)?),
        None => None,
    };
    let timeout = args
        .get_one::<u64>("timeout")
        .map(|secs| Duration::from_secs(*secs))
        .unwrap_or(DEFAULT_TIMEOUT);

    let transport = ReqwestTransport::new(timeout)?;
    let mut compiler = TemplateCompiler::new(Arc::new(FunctionRegistry::new()));
    let result = upload(
        &mut compiler,
        &item,
        &transport,
        file.as_ref(),
        string_arg(args, "input"),
    )
    .await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    if result.url.is_none() && result.shortened_url.is_none() {
        return Err(anyhow!("Upload to \"{}\" did not produce a URL", item.name));
    }
    Ok(())
}

fn destination_path(args: &ArgMatches) -> Result<&Path> {
    args.get_one::<PathBuf>("destination")
        .map(PathBuf::as_path)
        .context("A destination file is required")
}

/// Load the selected destination, migrated in memory
fn load_item(args: &ArgMatches) -> Result<CustomUploaderItem> {
    let items = load_destinations(destination_path(args)?)?;
    let item = select_destination(items, string_arg(args, "name"))?;
    Ok(migrate(item))
}

fn read_upload(path: &Path) -> Result<UploadData> {
    let bytes = std::fs::read(path).with_context(|| format!("Could not read {}", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .context("Upload path has no file name")?;
    Ok(UploadData::new(file_name, bytes))
}
