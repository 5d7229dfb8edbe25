//! ScreenCapture - capture a screen region or window, copy it to the clipboard

use anyhow::{anyhow, bail, Context};
use app::{CaptureSession, HeadlessChrome, JsonSettingsStore, SessionEvent, SessionState};
use capture::{Rect, ScreenSource};
use crossbeam_channel::unbounded;
use export::{save_png, Compositor, SystemClipboard};
use overlay::SelectionOutcome;
use scene::SettingsStore;
use std::path::PathBuf;

const USAGE: &str = "usage:
  screencapture region <x> <y> <width> <height> [--save <file.png>] [--settings <file.json>]
  screencapture window <x> <y> [--save <file.png>] [--settings <file.json>]";

/// Parsed command line
#[derive(Debug, PartialEq)]
struct Command {
    selection: SelectionOutcome,
    save: Option<PathBuf>,
    settings: Option<PathBuf>,
}

impl Command {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> anyhow::Result<Self> {
        let mut args = args.into_iter();
        let mode = args.next().ok_or_else(|| anyhow!("missing command\n{}", USAGE))?;

        let mut positional = Vec::new();
        let mut save = None;
        let mut settings = None;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--save" => save = Some(PathBuf::from(flag_value(&mut args, "--save")?)),
                "--settings" => settings = Some(PathBuf::from(flag_value(&mut args, "--settings")?)),
                _ => positional.push(arg),
            }
        }

        let selection = match (mode.as_str(), positional.as_slice()) {
            ("region", [x, y, w, h]) => SelectionOutcome::Region(Rect::new(
                number(x, "x")?,
                number(y, "y")?,
                number(w, "width")?,
                number(h, "height")?,
            )),
            ("window", [x, y]) => SelectionOutcome::WindowAt {
                x: number(x, "x")?,
                y: number(y, "y")?,
            },
            _ => bail!("unrecognized arguments\n{}", USAGE),
        };

        Ok(Self {
            selection,
            save,
            settings,
        })
    }
}

fn flag_value(args: &mut impl Iterator<Item = String>, flag: &str) -> anyhow::Result<String> {
    args.next().ok_or_else(|| anyhow!("{} needs a value", flag))
}

fn number<T: std::str::FromStr>(value: &str, name: &str) -> anyhow::Result<T> {
    value
        .parse()
        .map_err(|_| anyhow!("invalid {}: {:?}", name, value))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let command = Command::parse(std::env::args().skip(1))?;
    run(command)
}

#[cfg(windows)]
fn run(command: Command) -> anyhow::Result<()> {
    use windows::Win32::UI::HiDpi::{
        SetProcessDpiAwarenessContext, DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2,
    };

    // Physical pixels everywhere, so selection and capture rectangles agree
    unsafe {
        let _ = SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2);
    }
    log::debug!("[SESSION] Virtual screen {:?}", capture::gdi::virtual_screen_rect());
    capture_with(capture::GdiScreen::new(), command)
}

#[cfg(not(windows))]
fn run(_command: Command) -> anyhow::Result<()> {
    bail!("screen capture is only available on Windows")
}

#[cfg_attr(not(windows), allow(dead_code))]
fn capture_with<S: ScreenSource>(screen: S, command: Command) -> anyhow::Result<()> {
    let settings = match command.settings {
        Some(path) => JsonSettingsStore::new(path),
        None => JsonSettingsStore::default_location(),
    };
    let compositor = Compositor::from_settings(&settings.load());
    let clipboard = SystemClipboard::new().context("opening clipboard")?;

    let (tx, rx) = unbounded();
    let chrome = HeadlessChrome::new(tx.clone());
    let notices = chrome.notices();
    let mut session = CaptureSession::new(screen, clipboard, chrome, compositor, Box::new(settings));

    session.handle(SessionEvent::Selection(command.selection));
    if session.drain(&rx) != SessionState::Annotating {
        bail!("nothing was captured");
    }

    session.handle(SessionEvent::Export);
    session.drain(&rx);

    if let Some(message) = notices.lock().first() {
        bail!("{}", message);
    }
    if let (Some(path), Some(pixels)) = (command.save.as_deref(), session.last_export()) {
        save_png(pixels, path).with_context(|| format!("saving {:?}", path))?;
    }

    tx.send(SessionEvent::Close)?;
    session.run(&rx);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn parses_region_with_save() {
        let command = Command::parse(args("region 10 -20 300 200 --save out.png")).unwrap();
        assert_eq!(command.selection, SelectionOutcome::Region(Rect::new(10, -20, 300, 200)));
        assert_eq!(command.save, Some(PathBuf::from("out.png")));
        assert_eq!(command.settings, None);
    }

    #[test]
    fn parses_window_point() {
        let command = Command::parse(args("window 5 6 --settings s.json")).unwrap();
        assert_eq!(command.selection, SelectionOutcome::WindowAt { x: 5, y: 6 });
        assert_eq!(command.settings, Some(PathBuf::from("s.json")));
    }

    #[test]
    fn rejects_bad_input() {
        assert!(Command::parse(args("")).is_err());
        assert!(Command::parse(args("region 1 2 3")).is_err());
        assert!(Command::parse(args("region 1 2 -3 4")).is_err());
        assert!(Command::parse(args("window 1 2 --save")).is_err());
        assert!(Command::parse(args("record 1 2")).is_err());
    }
}
