// UI layer: the interactive prompt loop. Reads a line, sends it to the
// model, prints the reply and journals the turn.

use std::fmt;
use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::Context;
use chrono::Utc;
use crossterm::cursor::MoveToColumn;
use crossterm::style::Stylize;
use crossterm::terminal::{Clear, ClearType};
use dialoguer::theme::Theme;
use dialoguer::Input;
use tracing::{debug, error};

use crate::api::{Generate, OllamaClient};
use crate::config::ChatConfig;
use crate::error::ChatError;
use crate::journal::{HostInfo, Journal, LogEntry};
use crate::spinner::Spinner;

const PROMPT_MARKER: &str = ">";
const INTERRUPTED: &str = "\n🧠  Chat interrupted. Exiting...";
const EXIT_COMMANDS: &[&str] = &[":exit", "exit", "quit"];

/// True for `:exit`, `exit` and `quit` in any letter case.
pub fn is_exit_command(line: &str) -> bool {
    let line = line.trim();
    EXIT_COMMANDS.iter().any(|cmd| line.eq_ignore_ascii_case(cmd))
}

/// Source of user prompts. `Ok(None)` means input is exhausted.
pub trait LineSource {
    fn read_line(&mut self) -> Result<Option<String>, ChatError>;
}

/// Renders the prompt as a bare `> ` instead of dialoguer's `prompt: `.
struct ChatTheme;

impl Theme for ChatTheme {
    fn format_input_prompt(
        &self,
        f: &mut dyn fmt::Write,
        prompt: &str,
        _default: Option<&str>,
    ) -> fmt::Result {
        write!(f, "{} ", prompt)
    }

    fn format_input_prompt_selection(
        &self,
        f: &mut dyn fmt::Write,
        prompt: &str,
        sel: &str,
    ) -> fmt::Result {
        write!(f, "{} {}", prompt, sel)
    }
}

/// Reads prompts from the terminal with dialoguer, or line by line from
/// stdin when it is piped (so end of input is seen instead of re-prompting).
pub struct TerminalInput {
    interactive: bool,
}

impl TerminalInput {
    pub fn new() -> Self {
        Self {
            interactive: io::stdin().is_terminal(),
        }
    }
}

impl Default for TerminalInput {
    fn default() -> Self {
        Self::new()
    }
}

impl LineSource for TerminalInput {
    fn read_line(&mut self) -> Result<Option<String>, ChatError> {
        if self.interactive {
            let line: String = Input::with_theme(&ChatTheme)
                .with_prompt(PROMPT_MARKER)
                .allow_empty(true)
                .interact_text()
                .map_err(ChatError::from_prompt)?;
            return Ok(Some(line));
        }

        let mut stdout = io::stdout();
        write!(stdout, "{} ", PROMPT_MARKER)?;
        stdout.flush()?;
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}

/// Why the loop stopped.
#[derive(Debug)]
pub enum LoopExit {
    /// An exit command was typed.
    Quit,
    /// Ctrl-C at the prompt.
    Interrupted,
    /// Input ran out.
    EndOfInput,
    /// A turn failed; the error was already shown to the user.
    Failed(ChatError),
}

/// One chat session: a model, a session id and where turns get recorded.
pub struct ChatLoop<'a, G> {
    client: &'a G,
    journal: &'a Journal,
    model: String,
    session_id: String,
    styled: bool,
}

impl<'a, G: Generate> ChatLoop<'a, G> {
    pub fn new(
        client: &'a G,
        journal: &'a Journal,
        model: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            journal,
            model: model.into(),
            session_id: session_id.into(),
            styled: false,
        }
    }

    /// Colour headings and errors (only worth it on a real terminal).
    pub fn styled(mut self, styled: bool) -> Self {
        self.styled = styled;
        self
    }

    /// Run until the user quits, input ends or a turn fails. Only failures
    /// writing to `out` are returned as errors.
    pub fn run<L: LineSource, W: Write>(&self, input: &mut L, out: &mut W) -> io::Result<LoopExit> {
        writeln!(
            out,
            "🤖 Starting chat with model '{}' | Type ':exit' to quit\n",
            self.model
        )?;

        loop {
            let line = match input.read_line() {
                Ok(Some(line)) => line,
                Ok(None) => {
                    writeln!(out, "\n🧠  Goodbye!\n")?;
                    return Ok(LoopExit::EndOfInput);
                }
                Err(e) if e.is_interrupted() => {
                    writeln!(out, "{}", INTERRUPTED)?;
                    return Ok(LoopExit::Interrupted);
                }
                Err(e) => return self.fail(out, e),
            };

            let prompt = line.trim();
            if is_exit_command(prompt) {
                writeln!(out, "\n🧠  Goodbye!\n")?;
                return Ok(LoopExit::Quit);
            }
            if prompt.is_empty() {
                continue;
            }

            if let Err(e) = self.turn(prompt, out) {
                return self.fail(out, e);
            }
        }
    }

    fn turn<W: Write>(&self, prompt: &str, out: &mut W) -> Result<(), ChatError> {
        let mut spinner = Spinner::start("Thinking...");
        let result = self.client.generate(&self.model, prompt);
        spinner.stop();
        let reply = result?;

        let heading = "[Response]";
        if self.styled {
            writeln!(out, "\n{}\n{}\n", heading.bold().cyan(), reply.text())?;
        } else {
            writeln!(out, "\n{}\n{}\n", heading, reply.text())?;
        }

        let entry = LogEntry::new(
            &self.session_id,
            &self.model,
            prompt,
            &reply,
            HostInfo::capture(),
            Utc::now(),
        );
        self.journal.append(&entry)?;
        debug!(session = %self.session_id, hash = %entry.prompt_hash, "turn complete");
        Ok(())
    }

    fn fail<W: Write>(&self, out: &mut W, e: ChatError) -> io::Result<LoopExit> {
        error!("chat loop stopped: {}", e);
        if self.styled {
            writeln!(out, "{} {}", "[ERROR]".red().bold(), e)?;
        } else {
            writeln!(out, "[ERROR] {}", e)?;
        }
        Ok(LoopExit::Failed(e))
    }
}

/// Wipe whatever the spinner left on the current line, then say goodbye.
fn report_interrupt<W: Write>(out: &mut W) -> io::Result<()> {
    crossterm::queue!(out, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
    writeln!(out, "{}", INTERRUPTED)?;
    out.flush()
}

/// Ctrl-C outside the prompt (a request in flight, or piped input) ends the
/// process the same way an interrupt at the prompt ends the loop. The
/// blocking request itself cannot be cancelled, so the process exits.
pub fn install_interrupt_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        // Nothing useful can be done if stdout is already gone.
        let _ = report_interrupt(&mut io::stdout());
        std::process::exit(0);
    })
    .context("Failed to install Ctrl-C handler")
}

/// Wire the real client, journal and terminal together and run the chat.
/// Blocks until the session ends.
pub fn run_chat(config: &ChatConfig, model: &str, session_id: &str) -> anyhow::Result<LoopExit> {
    install_interrupt_handler()?;
    let client = OllamaClient::new(config)?;
    let journal = Journal::new(config.log_file.clone());
    debug!(url = client.url(), journal = %journal.path().display(), "chat starting");

    let mut stdout = io::stdout();
    let styled = stdout.is_terminal();
    let chat = ChatLoop::new(&client, &journal, model, session_id).styled(styled);
    let exit = chat.run(&mut TerminalInput::new(), &mut stdout)?;
    Ok(exit)
}
