mod cli;

use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::Result;
use skycast_core::{AppError, ConfigError};
use skycast_ui::{bridge, WeatherModel};

use cli::Command;

// Slack on top of the response wait so the timer message always lands first
const WAIT_MARGIN: Duration = Duration::from_secs(1);

fn main() -> Result<()> {
    // Initialize core
    skycast_core::init()?;

    let mut app = match skycast_core::App::new() {
        Ok(app) => app,
        Err(e) => {
            if let Some(config_error) = e.downcast_ref::<ConfigError>() {
                eprintln!("{}", config_error.user_message());
            }
            return Err(e);
        }
    };
    app.initialize()?;

    bridge::initialize_weather_services(app.config())?;
    let mut model = WeatherModel::from_bridge(app.config().weather.response_timeout())
        .map_err(AppError::from)?;

    tracing::info!("Skycast started");
    println!("Skycast - type `help` for commands");
    println!("{}", cli::render_saved(model.session()));

    run(&mut model)?;

    app.shutdown()?;
    Ok(())
}

fn run(model: &mut WeatherModel) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        if command == Command::Quit {
            break;
        }

        // Messages that landed while waiting for input
        model.poll_channel();
        dispatch(model, command);
    }

    Ok(())
}

fn dispatch(model: &mut WeatherModel, command: Command) {
    let today = chrono::Local::now().date_naive();

    match command {
        Command::Search(text) => {
            if text.is_empty() {
                model.set_search_text("");
                model.dismiss_suggestions();
                return;
            }
            model.set_search_text(&text);
            println!("{}", cli::render_suggestions(model.session()));
        }
        Command::Pick(index) => {
            let Some(city) = model.session().visible_suggestions().get(index).cloned() else {
                println!("No suggestion at position {}", index + 1);
                return;
            };
            model.dismiss_suggestions();
            show_city(model, &city, today);
        }
        Command::Select(city) => {
            if !model.session().directory().contains(&city) {
                println!("Unknown city: {city}");
                return;
            }
            show_city(model, &city, today);
        }
        Command::Open(index) => {
            let Some(city) = model.session().saved_cities().get(index).cloned() else {
                println!("No saved city at position {}", index + 1);
                return;
            };
            show_city(model, &city, today);
        }
        Command::Save => {
            let city = match model.session().selected() {
                Some(city) if model.session().can_save() => city.to_string(),
                _ => {
                    println!("Nothing to save");
                    return;
                }
            };
            model.add_city(&city);
            println!("Saved {city}");
            println!("{}", cli::render_saved(model.session()));
        }
        Command::Remove => {
            let city = match model.session().selected() {
                Some(city) if model.session().can_remove() => city.to_string(),
                _ => {
                    println!("Nothing to remove");
                    return;
                }
            };
            model.remove_city(&city);
            println!("Removed {city}");
            println!("{}", cli::render_saved(model.session()));
        }
        Command::Close => {
            model.set_dialog_open(false);
        }
        Command::List => {
            println!("{}", cli::render_saved(model.session()));
        }
        Command::Show => {
            if model.session().selected().is_some() {
                model.set_dialog_open(true);
            }
            println!("{}", cli::render_detail(model.session(), today));
        }
        Command::Help => println!("{}", cli::HELP),
        Command::Quit => {}
    }
}

/// Select `city`, wait out any fetch it starts, then print the detail view
fn show_city(model: &mut WeatherModel, city: &str, today: chrono::NaiveDate) {
    model.select_city(city);

    if model.session().is_loading() {
        println!("{}", cli::render_detail(model.session(), today));
        let limit = model.response_timeout() + WAIT_MARGIN;
        if !model.wait_for_fetch(limit) {
            tracing::warn!(city, "Fetch still pending after {:?}", limit);
        }
    }

    println!("{}", cli::render_detail(model.session(), today));
}
