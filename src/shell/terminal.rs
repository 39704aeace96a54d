use log::{error, info, warn};

use std::{
    io::{BufRead, Write},
    path::Path,
};

use colored::*;

use crate::{
    error::Error,
    extract::ChannelSeries,
    render::Renderer,
    shell::{FieldValues, FormView, Level},
    utils::open_with_web_browser,
};

/// Next user action, once a run terminated
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    Submit,
    Map,
    Quit,
}

/// [FormView] on a text terminal. Charts are rendered to HTML
/// and opened with the web browser.
pub struct TerminalForm<R: BufRead, W: Write> {
    input: R,
    output: W,
    fields: FieldValues,
    interactive: bool,
    renderer: Renderer,
    open_browser: bool,
}

impl<R: BufRead, W: Write> TerminalForm<R, W> {
    /// Builds a new [TerminalForm]. Prefilled fields are used as prompt
    /// defaults when interactive, as is otherwise.
    pub fn new(
        input: R,
        output: W,
        fields: FieldValues,
        interactive: bool,
        renderer: Renderer,
        open_browser: bool,
    ) -> Self {
        Self {
            input,
            output,
            fields,
            interactive,
            renderer,
            open_browser,
        }
    }

    /// Attaches the header image, when it can be loaded
    pub fn load_header(&mut self, path: &Path) {
        match std::fs::metadata(path) {
            Ok(meta) if meta.is_file() => {
                self.renderer.header = Some(path.to_path_buf());
            },
            Ok(_) => warn!("Could not load header image: {} is not a file", path.display()),
            Err(e) => warn!("Could not load header image: {}", e),
        }
    }

    #[cfg(test)]
    pub fn output(&self) -> &W {
        &self.output
    }

    fn write(&mut self, content: &str) {
        let result = write!(self.output, "{}", content).and_then(|_| self.output.flush());
        if let Err(e) = result {
            error!("terminal output: {}", e);
        }
    }

    /// Reads one line, None on end of input
    fn read_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim().to_string()),
            Err(e) => {
                error!("terminal input: {}", e);
                None
            },
        }
    }

    /// Prompts for one field. An empty answer keeps the previous value.
    fn prompt(&mut self, label: &str, previous: &str) -> String {
        self.write(&format!("{} [{}]: ", label, previous));
        match self.read_line() {
            Some(answer) if !answer.is_empty() => answer,
            _ => previous.to_string(),
        }
    }

    /// Asks for the next [Action]. Non interactive forms always quit.
    pub fn next_action(&mut self) -> Action {
        if !self.interactive {
            return Action::Quit;
        }

        self.write("[s]ubmit again, [m]ap of NOAA CORS network, [q]uit: ");

        match self.read_line().as_deref().map(str::to_lowercase).as_deref() {
            Some("s") | Some("submit") => Action::Submit,
            Some("m") | Some("map") => Action::Map,
            _ => Action::Quit,
        }
    }
}

impl<R: BufRead, W: Write> FormView for TerminalForm<R, W> {
    fn field_values(&mut self) -> FieldValues {
        if self.interactive {
            let previous = self.fields.clone();
            self.fields = FieldValues {
                station: self.prompt("Station code", &previous.station),
                year: self.prompt("Year", &previous.year),
                month: self.prompt("Month", &previous.month),
                day: self.prompt("Day", &previous.day),
                start_hour: self.prompt("Start hour", &previous.start_hour),
                end_hour: self.prompt("End hour", &previous.end_hour),
            };
        }
        self.fields.clone()
    }

    fn set_status(&mut self, status: &str, level: Level) {
        let status = match level {
            Level::Progress | Level::Error => status.red(),
            Level::Success => status.green(),
        };
        self.write(&format!("{}\n", status));
    }

    fn show_modal_chart(&mut self, title: &str, channels: &[ChannelSeries]) -> Result<(), Error> {
        let path = self.renderer.render(title, channels)?;
        let path = path.to_string_lossy().to_string();

        info!("{}: chart available in {}", title, path);

        if self.open_browser {
            if let Err(e) = open_with_web_browser(&path) {
                warn!("{}", e);
            }
        }

        if self.interactive {
            self.write(&format!("Chart available in {}. Press Enter to close.", path));
            let _ = self.read_line();
        }

        Ok(())
    }
}
