use clap::Parser;
use color_eyre::Result;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture, KeyEventKind};
use crossterm::execute;
use datavis::{App, AppConfig, AppEvent, Args, CacheManager, DatasetStore, HttpUploader};
use ratatui::DefaultTerminal;
use std::sync::mpsc::channel;
use std::sync::Arc;
use std::time::Duration;

fn render(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    terminal.draw(|frame| frame.render_widget(app, frame.area()))?;
    Ok(())
}

fn run(
    mut terminal: DefaultTerminal,
    args: &Args,
    config: AppConfig,
    cache: &CacheManager,
) -> Result<()> {
    let poll_interval = Duration::from_millis(config.performance.event_poll_interval_ms);
    let check_backend = args.check_backend || config.backend.check_on_start;

    let (tx, rx) = channel::<AppEvent>();
    let uploader = Arc::new(HttpUploader::new(&config.backend)?);
    tracing::info!(url = uploader.upload_url(), "backend configured");
    let store = DatasetStore::in_cache(cache);
    let mut app = App::new(tx.clone(), config, store, uploader)?;
    if args.debug {
        app.enable_debug();
    }
    if check_backend {
        app.check_backend();
    }
    if let Some(path) = &args.upload {
        app.upload_form.set_path(path);
        tx.send(AppEvent::SubmitUpload)?;
    }
    render(&mut terminal, &mut app)?;

    loop {
        if crossterm::event::poll(poll_interval)? {
            match crossterm::event::read()? {
                crossterm::event::Event::Key(key) if key.kind == KeyEventKind::Press => {
                    tx.send(AppEvent::Key(key))?
                }
                crossterm::event::Event::Mouse(mouse) => tx.send(AppEvent::Mouse(mouse))?,
                crossterm::event::Event::Resize(cols, rows) => {
                    tx.send(AppEvent::Resize(cols, rows))?
                }
                _ => {}
            }
        } else if app.is_animating() {
            tx.send(AppEvent::Tick)?;
        }

        let updated = match rx.recv_timeout(Duration::from_millis(0)) {
            Ok(event) => {
                match event {
                    AppEvent::Exit => break,
                    AppEvent::Crash(msg) => {
                        return Err(color_eyre::eyre::eyre!(msg));
                    }
                    event => {
                        if let Some(event) = app.event(&event) {
                            tx.send(event)?;
                        }
                    }
                }
                true
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => false,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        };

        if updated {
            render(&mut terminal, &mut app)?;
        }
    }
    Ok(())
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.clear_cache {
        match CacheManager::new(datavis::APP_NAME) {
            Ok(cache) => {
                if let Err(e) = cache.clear_all() {
                    eprintln!("Error clearing cache: {}", e);
                    std::process::exit(1);
                }
                println!("Cache cleared successfully");
            }
            Err(_e) => println!("No cache to clear"),
        }
        return Ok(Some(()));
    }

    if args.generate_config {
        match datavis::ConfigManager::new(datavis::APP_NAME) {
            Ok(manager) => match manager.write_default_config(args.force) {
                Ok(path) => {
                    println!("Configuration written to {}", path.display());
                    return Ok(Some(()));
                }
                Err(e) => {
                    eprintln!("Error writing config: {}", e);
                    std::process::exit(1);
                }
            },
            Err(e) => {
                eprintln!("Error initializing config manager: {}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(None)
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    color_eyre::install()?;

    let mut config = AppConfig::load(datavis::APP_NAME)?;
    config.apply_args(&args);
    config.validate()?;

    let cache = CacheManager::new(datavis::APP_NAME)?;
    let log_file = datavis::logging::init_logging(&config.logging, &cache)?;
    tracing::info!(log = %log_file.display(), "datavis starting");

    let terminal = ratatui::init();
    execute!(std::io::stdout(), EnableMouseCapture)?;
    let result = run(terminal, &args, config, &cache);
    let _ = execute!(std::io::stdout(), DisableMouseCapture);
    ratatui::restore();
    if let Err(e) = result {
        tracing::error!(error = %e, "exited with error");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
