#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

/*
 * CORS2SNR downloads daily CORS observations and charts their SNR.
 * This program is shipped under Mozilla Public V2 license.
 */

use env_logger::{Builder, Target};

use log::{error, info, warn};

use hifitime::prelude::{Epoch, TimeScale};

mod cli;
mod download;
mod error;
mod extract;
mod render;
mod request;
mod runtime;
mod settings;
mod shell;
mod utils;

#[cfg(test)]
mod mock;

use crate::{
    cli::Cli,
    extract::RinexSource,
    render::Renderer,
    runtime::Runtime,
    shell::{
        Controller, MAP_URL, State,
        terminal::{Action, TerminalForm},
    },
    utils::open_with_web_browser,
};

#[tokio::main]
pub async fn main() {
    let mut builder = Builder::from_default_env();

    builder
        .target(Target::Stdout)
        .format_timestamp_secs()
        .format_module_path(false)
        .init();

    let t_utc = match Epoch::now() {
        Ok(t) => t.to_time_scale(TimeScale::UTC),
        Err(e) => {
            error!("Failed to determine system time: {}", e);
            std::process::exit(1);
        },
    };

    let runtime = Runtime::new(t_utc);

    // cli
    let cli = Cli::new();

    if cli.map() {
        info!("{} - opening {}", runtime.now(), MAP_URL);
        if let Err(e) = open_with_web_browser(MAP_URL) {
            error!("{} - {}", runtime.now(), e);
            std::process::exit(1);
        }
        return;
    }

    let settings = match cli.settings(&runtime) {
        Ok(settings) => settings,
        Err(e) => {
            error!("{} - invalid configuration: {}", runtime.now(), e);
            std::process::exit(1);
        },
    };

    info!(
        "{} - deployed in {}, downloads: {}",
        runtime.now(),
        runtime.resources().display(),
        settings.downloads.display()
    );

    let mut form = TerminalForm::new(
        std::io::stdin().lock(),
        std::io::stdout(),
        cli.fields(),
        cli.interactive(),
        Renderer::new(&settings.html),
        settings.open_browser,
    );

    form.load_header(&settings.header_image);

    let mut controller = match Controller::new(form, RinexSource, settings, runtime.clone()) {
        Ok(controller) => controller,
        Err(e) => {
            error!("{} - {}", runtime.now(), e);
            std::process::exit(1);
        },
    };

    let mut action = Action::Submit;

    loop {
        match action {
            Action::Submit => {
                controller.submit().await;
            },
            Action::Map => {
                if let Err(e) = controller.open_map() {
                    warn!("{} - {}", runtime.now(), e);
                }
            },
            Action::Quit => break,
        }
        action = controller.form_mut().next_action();
    }

    info!("{} - uptime: {}", runtime.now(), runtime.uptime());

    if controller.state() == State::Failed {
        std::process::exit(1);
    }
}
