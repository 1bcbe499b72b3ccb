mod app;
mod ui;

use anyhow::{bail, Context, Result};
use app::App;
use clap::Parser;
use city_poster::{
    categorize, export_filename, generate_poster, load_elements, FontSource, LatLon,
    PixelRatio, PosterRequest, PosterView, ProgressObserver, RenderOptions, Theme,
};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::DefaultTerminal;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Render a city map poster from OpenStreetMap data
#[derive(Parser, Debug)]
#[command(name = "city-poster", version)]
struct Cli {
    /// Overpass JSON or GeoJSON files with the area's features
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Theme JSON file or built-in theme name
    #[arg(long, default_value = "feature_based")]
    theme: String,

    #[arg(long)]
    city: String,

    #[arg(long, default_value = "")]
    country: String,

    #[arg(long, allow_hyphen_values = true)]
    lat: f64,

    #[arg(long, allow_hyphen_values = true)]
    lon: f64,

    /// Horizontal radius around the center, in meters
    #[arg(long, default_value_t = 10_000.0)]
    radius: f64,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    /// Export pixel ratio
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=3))]
    ratio: u32,

    /// Output PNG path [default: {city}_{theme}_{HD|QHD|4K}.png]
    #[arg(long)]
    out: Option<PathBuf>,

    /// JSON file with render options
    #[arg(long)]
    config: Option<PathBuf>,

    /// Font file for labels, may be repeated
    #[arg(long)]
    font: Vec<PathBuf>,

    /// Print progress lines instead of the terminal UI
    #[arg(long)]
    plain: bool,

    /// Write logs here (the terminal UI otherwise discards them)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    let options = load_options(&cli)?;
    let theme = load_theme(&cli.theme)?;

    let mut elements = Vec::new();
    for path in &cli.inputs {
        let loaded = load_elements(path).with_context(|| format!("reading {}", path.display()))?;
        info!(path = %path.display(), elements = loaded.len(), "loaded input");
        elements.extend(loaded);
    }
    let data = categorize(elements);

    let request = PosterRequest {
        city: cli.city.clone(),
        country: cli.country.clone(),
        center: LatLon::new(cli.lat, cli.lon),
        radius_m: cli.radius,
    };
    let ratio = PixelRatio::from_factor(cli.ratio).unwrap_or_default();
    let out = cli
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(export_filename(&request.city, &theme.name, ratio)));

    if cli.plain {
        return run_plain(&data, &theme, &request, &options, ratio, &out);
    }

    let mut terminal = ratatui::init();
    terminal.clear()?;
    let mut app = App::new(&data, &theme, &request, &options);
    let result = run(&mut terminal, &mut app, ratio, &out);
    ratatui::restore();
    result
}

fn init_tracing(cli: &Cli) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match (&cli.log_file, cli.plain) {
        (Some(path), _) => {
            let file = File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;
            builder.with_writer(Mutex::new(file)).with_ansi(false).init();
        }
        (None, true) => builder.with_writer(std::io::stderr).init(),
        // the UI owns the screen
        (None, false) => {}
    }
    Ok(())
}

fn load_options(cli: &Cli) -> Result<RenderOptions> {
    let mut options = match &cli.config {
        Some(path) => RenderOptions::load(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => RenderOptions::default(),
    };
    if let Some(width) = cli.width {
        options.width = width;
    }
    if let Some(height) = cli.height {
        options.height = height;
    }
    if !cli.font.is_empty() {
        options.fonts = FontSource::Files(cli.font.clone());
    }
    Ok(options)
}

fn load_theme(arg: &str) -> Result<Theme> {
    let path = Path::new(arg);
    if path.is_file() {
        return Theme::load(path).with_context(|| format!("reading theme {arg}"));
    }
    match Theme::builtin(arg) {
        Some(theme) => Ok(theme),
        None => bail!(
            "unknown theme {arg:?}, expected a file or one of: {}",
            Theme::builtin_names().join(", ")
        ),
    }
}

fn run_plain(
    data: &city_poster::CategorizedMapData,
    theme: &Theme,
    request: &PosterRequest,
    options: &RenderOptions,
    ratio: PixelRatio,
    out: &Path,
) -> Result<()> {
    let observer: ProgressObserver = Box::new(|p| {
        println!("{:>3}% {}", p.percent, p.stage);
    });
    let job = generate_poster(data, theme, request, options, Some(observer))?;
    let (stage, error) = job.run();

    let mut view = PosterView::new();
    view.install(stage);
    if let Some(error) = error {
        bail!("render failed: {error}");
    }
    save(&view, ratio, out)
}

fn save(view: &PosterView, ratio: PixelRatio, out: &Path) -> Result<()> {
    let png = view.export(ratio)?;
    std::fs::write(out, &png).with_context(|| format!("writing {}", out.display()))?;
    info!(path = %out.display(), bytes = png.len(), "poster saved");
    Ok(())
}

fn run(terminal: &mut DefaultTerminal, app: &mut App, ratio: PixelRatio, out: &Path) -> Result<()> {
    app.start()?;

    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        // Don't block on input while a job has chunks left
        let timeout = if app.is_rendering() {
            Duration::ZERO
        } else {
            Duration::from_millis(100)
        };
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => app.cancel_or_quit(),
                        KeyCode::Char('r') if !app.is_rendering() => app.start()?,
                        KeyCode::Char('s') if !app.is_rendering() => {
                            save(&app.view, ratio, out)?;
                        }
                        _ => {}
                    }
                }
            }
        }

        app.tick();

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
