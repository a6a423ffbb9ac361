use crossterm::{
    cursor::{Hide, Show},
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use std::env;
use std::fs::OpenOptions;
use std::io::{BufWriter, Stdout, stdout};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use nightfire::config::{Config, LoggingConfig, parse_hex_color};
use nightfire::effects::{Effect, NightCityEffect};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn print_usage() {
    eprintln!("nightfire - fireworks over a night city in your terminal");
    eprintln!();
    eprintln!("Usage: nightfire [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config PATH      Read settings from a TOML file");
    eprintln!("  --seed N           Seed the simulation for a reproducible show");
    eprintln!("  --auto             Launch fireworks on a timer");
    eprintln!("  --bg-color RRGGBB  Colour of the sky near the horizon (e.g., --bg-color 1a1b26)");
    eprintln!();
    eprintln!("Controls: space = launch, click = launch here, a = toggle auto launch");
    eprintln!("Press 'q', ESC, or Ctrl+C to exit");
}

fn run_effect<E: Effect>(config: &Config) -> std::io::Result<()> {
    let stdout = stdout();
    let mut stdout = BufWriter::with_capacity(1024 * 64, stdout);

    terminal::enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, Hide, Clear(ClearType::All), EnableMouseCapture)?;

    let result = event_loop::<E>(&mut stdout, config);

    execute!(stdout, Show, LeaveAlternateScreen, DisableMouseCapture)?;
    terminal::disable_raw_mode()?;

    result
}

fn event_loop<E: Effect>(stdout: &mut BufWriter<Stdout>, config: &Config) -> std::io::Result<()> {
    let (cols, rows) = terminal::size()?;
    let mut effect = E::new(cols as usize, rows as usize * 2, config);

    let mut last_frame = Instant::now();
    let mut accumulator = 0.0f32;
    let fixed_dt = config.step();
    let max_backlog = fixed_dt * config.display.max_catch_up_steps.max(1) as f32;

    loop {
        if event::poll(Duration::from_millis(1))? {
            let event = event::read()?;
            match &event {
                Event::Key(key_event) => {
                    if key_event.code == KeyCode::Char('q')
                        || key_event.code == KeyCode::Esc
                        || (key_event.code == KeyCode::Char('c')
                            && key_event.modifiers.contains(event::KeyModifiers::CONTROL))
                    {
                        break;
                    }
                    effect.handle_event(&event);
                }
                Event::Resize(cols, rows) => {
                    info!(cols, rows, "terminal resized, rebuilding scene");
                    effect = E::new(*cols as usize, *rows as usize * 2, config);
                    execute!(stdout, Clear(ClearType::All))?;
                }
                _ => {
                    effect.handle_event(&event);
                }
            }
        }

        let now = Instant::now();
        let frame_time = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;

        // The simulation itself never clamps dt; stalls are absorbed here.
        accumulator = (accumulator + frame_time).min(max_backlog);

        while accumulator >= fixed_dt {
            effect.update(fixed_dt);
            accumulator -= fixed_dt;
        }

        effect.render(stdout)?;
    }

    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> nightfire::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_ansi(false);

    // The terminal belongs to the renderer, so logs go to a file or nowhere.
    let installed = match &logging.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder.with_writer(Mutex::new(file)).try_init()
        }
        None => builder.with_writer(std::io::sink).try_init(),
    };
    if let Err(err) = installed {
        eprintln!("nightfire: logging disabled: {err}");
    }
    Ok(())
}

fn fail(message: &str) -> ! {
    eprintln!("{message}");
    eprintln!();
    print_usage();
    std::process::exit(1);
}

fn parse_args() -> nightfire::Result<Option<Config>> {
    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut seed: Option<u64> = None;
    let mut auto = false;
    let mut bg_color: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        let value = args.get(i + 1);
        match args[i].as_str() {
            "--config" => {
                let Some(path) = value else { fail("--config requires a path") };
                config_path = Some(PathBuf::from(path));
                i += 2;
            }
            "--seed" => {
                let Some(n) = value.and_then(|v| v.parse().ok()) else {
                    fail("--seed requires an unsigned integer")
                };
                seed = Some(n);
                i += 2;
            }
            "--bg-color" => {
                let Some(hex) = value else { fail("--bg-color requires a hex color value") };
                if parse_hex_color(hex).is_none() {
                    fail(&format!(
                        "Invalid hex color: {hex}\nExpected format: RRGGBB (e.g., 1a1b26)"
                    ));
                }
                bg_color = Some(hex.clone());
                i += 2;
            }
            "--auto" => {
                auto = true;
                i += 1;
            }
            "help" | "--help" | "-h" => {
                print_usage();
                return Ok(None);
            }
            arg => fail(&format!("Unknown option: {arg}")),
        }
    }

    let mut config = match config_path {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    if seed.is_some() {
        config.simulation.seed = seed;
    }
    if auto {
        config.launch.auto = true;
    }
    if bg_color.is_some() {
        config.display.bg_color = bg_color;
    }
    config.validate()?;
    Ok(Some(config))
}

fn run() -> nightfire::Result<()> {
    let Some(config) = parse_args()? else {
        return Ok(());
    };
    init_logging(&config.logging)?;

    info!(seed = ?config.simulation.seed, auto = config.launch.auto, "nightfire starting");
    run_effect::<NightCityEffect>(&config)?;
    info!("nightfire stopped");
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("nightfire: {err}");
        std::process::exit(1);
    }
}
