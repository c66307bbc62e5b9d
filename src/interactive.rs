//! Interactive text menu
//!
//! Asks for the same fields the CLI takes, shows a summary and returns the
//! answers once the user confirms. Generic over reader and writer so it can
//! be driven from tests.

use crate::codec::Mode;
use crate::settings::Settings;
use anyhow::Result;
use std::io::{BufRead, Write};
use std::path::PathBuf;

/// End of input while a question was open; treated like declining
#[derive(Debug, thiserror::Error)]
#[error("Input closed before the menu was completed")]
struct InputClosed;

pub struct Menu<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Read one trimmed line; end of input is `InputClosed`
    fn read_answer(&mut self) -> Result<String> {
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(InputClosed.into());
        }
        Ok(line.trim().to_string())
    }

    fn ask(&mut self, prompt: &str, default: &str) -> Result<String> {
        write!(self.output, "{} [{}]: ", prompt, default)?;
        let answer = self.read_answer()?;
        Ok(if answer.is_empty() {
            default.to_string()
        } else {
            answer
        })
    }

    fn ask_yes_no(&mut self, prompt: &str, default: bool) -> Result<bool> {
        let hint = if default { "Y/n" } else { "y/N" };
        loop {
            write!(self.output, "{} [{}]: ", prompt, hint)?;
            match self.read_answer()?.to_lowercase().as_str() {
                "" => return Ok(default),
                "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => writeln!(self.output, "Please answer y or n.")?,
            }
        }
    }

    fn ask_mode(&mut self, default: Mode) -> Result<Mode> {
        writeln!(self.output, "\nChoose encoding method:")?;
        for (idx, mode) in Mode::ALL.iter().enumerate() {
            let marker = if *mode == default { "   [default]" } else { "" };
            writeln!(self.output, "  {}) {}{}", idx + 1, mode.describe(), marker)?;
        }

        let default_choice = Mode::ALL
            .iter()
            .position(|m| *m == default)
            .map(|idx| idx + 1)
            .unwrap_or(1);
        loop {
            write!(self.output, "Enter 1, 2 or 3 [{}]: ", default_choice)?;
            match self.read_answer()?.as_str() {
                "" => return Ok(default),
                "1" => return Ok(Mode::Percent),
                "2" => return Ok(Mode::Base64),
                "3" => return Ok(Mode::Dual),
                _ => writeln!(self.output, "Please enter 1, 2 or 3.")?,
            }
        }
    }

    /// Run the menu. `Ok(None)` means the user declined at the summary or
    /// closed the input; read and write failures are errors.
    pub fn run(&mut self, defaults: &Settings) -> Result<Option<Settings>> {
        match self.ask_all(defaults) {
            Err(e) if e.is::<InputClosed>() => {
                writeln!(self.output, "\nCanceled.")?;
                Ok(None)
            }
            other => other,
        }
    }

    fn ask_all(&mut self, defaults: &Settings) -> Result<Option<Settings>> {
        writeln!(self.output, "{}", "=".repeat(60))?;
        writeln!(self.output, " DualCrypt - Interactive Mode")?;
        writeln!(self.output, "{}", "=".repeat(60))?;

        let src = self.ask("Source directory", &defaults.src.to_string_lossy())?;
        let dst = self.ask("Destination directory", &defaults.dst.to_string_lossy())?;
        let mode = self.ask_mode(defaults.mode)?;
        let minify = self.ask_yes_no("Enable light minify?", defaults.minify)?;
        let protect = self.ask_yes_no(
            "Inject protection (right-click / Ctrl+U / F12)?",
            defaults.protect,
        )?;

        writeln!(self.output, "\nSummary:")?;
        writeln!(self.output, "  src = {}", src)?;
        writeln!(self.output, "  dst = {}", dst)?;
        writeln!(self.output, "  encoding = {}", mode)?;
        writeln!(self.output, "  minify = {}", minify)?;
        writeln!(self.output, "  protection = {}", protect)?;

        if !self.ask_yes_no("Proceed?", true)? {
            writeln!(self.output, "Canceled.")?;
            return Ok(None);
        }

        Ok(Some(Settings {
            src: PathBuf::from(src),
            dst: PathBuf::from(dst),
            mode,
            minify,
            protect,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run_menu(input: &str, defaults: &Settings) -> (Result<Option<Settings>>, String) {
        let mut menu = Menu::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        let result = menu.run(defaults);
        let output = String::from_utf8(menu.into_output()).unwrap();
        (result, output)
    }

    #[test]
    fn test_all_defaults() {
        let (result, output) = run_menu("\n\n\n\n\n\n", &Settings::default());
        assert_eq!(result.unwrap(), Some(Settings::default()));
        assert!(output.contains("Source directory [src]: "));
        assert!(output.contains("Destination directory [dist]: "));
        assert!(output.contains("  1) Percent-encode   [default]"));
        assert!(output.contains("  encoding = percent"));
    }

    #[test]
    fn test_custom_answers() {
        let (result, _) = run_menu("site\nout\n3\nn\nyes\ny\n", &Settings::default());
        let settings = result.unwrap().unwrap();
        assert_eq!(settings.src, PathBuf::from("site"));
        assert_eq!(settings.dst, PathBuf::from("out"));
        assert_eq!(settings.mode, Mode::Dual);
        assert!(!settings.minify);
        assert!(settings.protect);
    }

    #[test]
    fn test_remembered_defaults_offered() {
        let remembered = Settings {
            src: PathBuf::from("pages"),
            dst: PathBuf::from("public"),
            mode: Mode::Base64,
            minify: false,
            protect: false,
        };
        let (result, output) = run_menu("\n\n\n\n\n\n", &remembered);
        assert_eq!(result.unwrap(), Some(remembered));
        assert!(output.contains("Source directory [pages]: "));
        assert!(output.contains("Enter 1, 2 or 3 [2]: "));
        assert!(output.contains("Enable light minify? [y/N]: "));
    }

    #[test]
    fn test_reprompts_on_bad_answers() {
        let (result, output) = run_menu("\n\n9\n2\nmaybe\ny\n\n\n", &Settings::default());
        let settings = result.unwrap().unwrap();
        assert_eq!(settings.mode, Mode::Base64);
        assert!(output.contains("Please enter 1, 2 or 3."));
        assert!(output.contains("Please answer y or n."));
    }

    #[test]
    fn test_decline_at_summary() {
        let (result, output) = run_menu("\n\n\n\n\nn\n", &Settings::default());
        assert_eq!(result.unwrap(), None);
        assert!(output.ends_with("Canceled.\n"));
    }

    #[test]
    fn test_closed_input_cancels() {
        let (result, output) = run_menu("src\n", &Settings::default());
        assert_eq!(result.unwrap(), None);
        assert!(output.ends_with("\nCanceled.\n"));
    }

    struct BrokenInput;

    impl std::io::Read for BrokenInput {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("terminal gone"))
        }
    }

    #[test]
    fn test_read_failure_is_error() {
        let mut menu = Menu::new(std::io::BufReader::new(BrokenInput), Vec::new());
        let err = menu.run(&Settings::default()).unwrap_err();
        assert!(err.to_string().contains("terminal gone"));
        let output = String::from_utf8(menu.into_output()).unwrap();
        assert!(!output.contains("Canceled."));
    }
}
