use std::io::{self, BufRead, Write};

use tracing::{info, warn};

use super::command::{Command, HELP};
use crate::kernel::{Driver, KernelError, ProcessState, MAX_DISKS};

/// Reads commands line by line and applies them to a `Driver`.
/// Errors are reported to the user and the loop carries on.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Console<R, W> {
        Console { input, output }
    }

    /// Asks for whichever of memory size and disk count was not supplied,
    /// repeating each question until the answer is usable.
    pub fn configure(
        &mut self,
        memory_size: Option<usize>,
        num_disks: Option<usize>,
    ) -> io::Result<(usize, usize)> {
        writeln!(self.output, "    ============================================")?;
        writeln!(self.output, "   |       Welcome to Priority Scheduling       |")?;
        writeln!(self.output, "    ============================================\n")?;

        let memory_size = match memory_size {
            Some(size) => size,
            None => self.prompt_number(
                "How much memory (in bytes) are in the system?",
                "Please enter a valid memory size.",
                |size| size > 0,
            )?,
        };

        let num_disks = match num_disks {
            Some(disks) => disks,
            None => self.prompt_number(
                &format!("How many hard disks are there? (1-{})", MAX_DISKS),
                &format!("Please enter a valid disk number (1-{}).", MAX_DISKS),
                |disks| (1..=MAX_DISKS).contains(&disks),
            )?,
        };

        writeln!(self.output)?;
        Ok((memory_size, num_disks))
    }

    /// Runs until `q`/`Q` or the end of input.
    pub fn run(&mut self, driver: &mut Driver) -> io::Result<()> {
        writeln!(
            self.output,
            "Starting simulation... For a full list of commands, type \"commands\"."
        )?;
        writeln!(self.output, "Enter 'Q' or 'q' to quit.\n")?;

        let config = driver.config();
        info!(
            "Console attached to {} bytes of memory, {} disks, {} I/O devices",
            config.memory_size(),
            config.num_disks(),
            config.num_io_devices()
        );

        loop {
            write!(self.output, ">> ")?;
            self.output.flush()?;

            let Some(line) = self.read_line()? else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            let command = match line.parse::<Command>() {
                Ok(command) => command,
                Err(err) => {
                    writeln!(self.output, "ERROR: {}", err)?;
                    continue;
                }
            };

            match Self::execute(driver, command) {
                Ok(report) => self.output.write_all(report.as_bytes())?,
                Err(err) => {
                    warn!("{:?} rejected: {}", command, err);
                    writeln!(self.output, "ERROR: {}", err)?;
                }
            }

            if command == Command::Quit {
                break;
            }
        }

        self.output.flush()
    }

    fn execute(driver: &mut Driver, command: Command) -> Result<String, KernelError> {
        let report = match command {
            Command::Admit { priority, memory } => {
                let pid = driver.admit(priority, memory)?;
                format!("Adding new process {}...\n", pid)
            }
            Command::Terminate => {
                let pid = driver.terminate_running()?;
                format!("Terminating process {}...\n", pid)
            }
            Command::RequestDevice { kind, device_id } => {
                let pid = driver.request_device(kind, device_id)?;
                format!("Process {} requesting {} {}...\n", pid, kind, device_id)
            }
            Command::Interrupt { kind, device_id } => {
                let pid = driver.device_interrupt(kind, device_id)?;
                let state = match driver.running() {
                    Some(pcb) if pcb.get_id() == pid => ProcessState::Running,
                    _ => ProcessState::Ready,
                };
                format!(
                    "Interrupting {} {}, process {} finished, now {}\n",
                    kind, device_id, pid, state
                )
            }
            Command::Snapshot(target) => driver.snapshot(target),
            Command::Help => HELP.to_string(),
            Command::Quit => String::from("Thank you for using Priority Scheduler!\n"),
        };

        Ok(report)
    }

    fn prompt_number(
        &mut self,
        question: &str,
        retry: &str,
        is_valid: impl Fn(usize) -> bool,
    ) -> io::Result<usize> {
        writeln!(self.output, "{}", question)?;

        loop {
            write!(self.output, ">> ")?;
            self.output.flush()?;

            let line = self.read_line()?.ok_or_else(|| {
                io::Error::new(io::ErrorKind::UnexpectedEof, "input ended during setup")
            })?;

            match line.trim().parse() {
                Ok(value) if is_valid(value) => return Ok(value),
                _ => writeln!(self.output, "{}", retry)?,
            }
        }
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}
