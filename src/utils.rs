use std::process::Command;

use crate::error::Error;

/// Parses one integer form field. Surrounding whitespace is tolerated.
pub fn parse_integer(field: &'static str, value: &str) -> Result<i32, Error> {
    value
        .trim()
        .parse::<i32>()
        .map_err(|_| Error::InvalidInteger {
            field,
            value: value.to_string(),
        })
}

/// Opens this path or URL with the preferred web browser
#[cfg(target_os = "linux")]
pub fn open_with_web_browser(target: &str) -> Result<(), Error> {
    let web_browsers = vec!["xdg-open", "firefox", "chromium"];
    for browser in web_browsers {
        let child = Command::new(browser).args([target]).spawn();
        if child.is_ok() {
            return Ok(());
        }
    }
    Err(Error::Browser(target.to_string()))
}

/// Opens this path or URL with the preferred web browser
#[cfg(target_os = "macos")]
pub fn open_with_web_browser(target: &str) -> Result<(), Error> {
    Command::new("open")
        .args([target])
        .output()
        .map_err(|_| Error::Browser(target.to_string()))?;
    Ok(())
}

/// `cmd` command line that opens this path or URL. `start` takes its first
/// quoted argument as the window title, hence the empty title.
#[cfg(any(target_os = "windows", test))]
fn start_command(target: &str) -> String {
    format!(r#"/C start "" "{}""#, target)
}

/// Opens this path or URL with the preferred web browser
#[cfg(target_os = "windows")]
pub fn open_with_web_browser(target: &str) -> Result<(), Error> {
    use std::os::windows::process::CommandExt;

    // passed verbatim: cmd does not follow the usual argument escaping
    Command::new("cmd")
        .raw_arg(start_command(target))
        .output()
        .map_err(|_| Error::Browser(target.to_string()))?;
    Ok(())
}
