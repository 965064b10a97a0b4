use plotdeck::api::{ChartEngine, parse_configuration, parse_rows};
use plotdeck::export::{ExportFormat, ExportRequest, default_filename};
use plotdeck::render::NullRenderer;
use std::fs;
use std::path::PathBuf;

const USAGE: &str = "usage: render_chart --config <path> --data <path> [--out <path>] [--format svg|png|pdf] [--width N --height N]";

#[derive(Debug)]
struct CliArgs {
    config: PathBuf,
    data: PathBuf,
    out: Option<PathBuf>,
    format: ExportFormat,
    size: Option<(u32, u32)>,
}

fn main() {
    let _ = plotdeck::telemetry::init_default_tracing();
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args = parse_args()?;
    let raw_config = read(&args.config)?;
    let raw_rows = read(&args.data)?;
    let mut config = parse_configuration(&raw_config).map_err(|err| err.to_string())?;
    let rows = parse_rows(&raw_rows).map_err(|err| err.to_string())?;
    if let Some((width, height)) = args.size {
        config = config.with_size(width, height);
    }

    let out = args.out.clone().unwrap_or_else(|| {
        PathBuf::from(default_filename(config.display_title(), args.format))
    });

    let mut engine = ChartEngine::new(NullRenderer::default(), config);
    engine.set_rows(rows);
    let outcome = engine.render().map_err(|err| err.to_string())?;
    if !outcome.is_rendered() {
        println!("{}", outcome.message());
        return Ok(());
    }

    let filename = out
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| out.display().to_string());
    let artifact = engine
        .export(&ExportRequest::new(args.format, filename))
        .map_err(|err| err.to_string())?;
    fs::write(&out, &artifact.bytes)
        .map_err(|err| format!("failed to write `{}`: {err}", out.display()))?;
    println!(
        "wrote {} ({} bytes, {})",
        out.display(),
        artifact.len(),
        artifact.mime_type()
    );
    Ok(())
}

fn read(path: &PathBuf) -> Result<String, String> {
    fs::read_to_string(path).map_err(|err| format!("failed to read `{}`: {err}", path.display()))
}

fn parse_args() -> Result<CliArgs, String> {
    let mut args = std::env::args().skip(1);
    let mut config = None::<PathBuf>;
    let mut data = None::<PathBuf>;
    let mut out = None::<PathBuf>;
    let mut format = ExportFormat::Svg;
    let mut width = None::<u32>;
    let mut height = None::<u32>;

    while let Some(flag) = args.next() {
        let mut value = |name: &str| {
            args.next()
                .ok_or_else(|| format!("missing value for {name}"))
        };
        match flag.as_str() {
            "--config" => config = Some(PathBuf::from(value("--config")?)),
            "--data" => data = Some(PathBuf::from(value("--data")?)),
            "--out" => out = Some(PathBuf::from(value("--out")?)),
            "--format" => {
                format = ExportFormat::parse(&value("--format")?).map_err(|err| err.to_string())?;
            }
            "--width" => width = Some(parse_dimension("--width", &value("--width")?)?),
            "--height" => height = Some(parse_dimension("--height", &value("--height")?)?),
            "--help" | "-h" => return Err(USAGE.to_owned()),
            other => return Err(format!("unknown argument `{other}`\n{USAGE}")),
        }
    }

    let size = match (width, height) {
        (Some(width), Some(height)) => Some((width, height)),
        (None, None) => None,
        _ => return Err("--width and --height must be given together".to_owned()),
    };

    Ok(CliArgs {
        config: config.ok_or_else(|| USAGE.to_owned())?,
        data: data.ok_or_else(|| USAGE.to_owned())?,
        out,
        format,
        size,
    })
}

fn parse_dimension(flag: &str, value: &str) -> Result<u32, String> {
    match value.parse::<u32>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(format!("{flag} expects a positive integer, got `{value}`")),
    }
}
