use std::str::FromStr;

use thiserror::Error;

use crate::kernel::{DeviceKind, SnapshotTarget};

/// One line of console input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Admit { priority: i64, memory: i64 },
    Terminate,
    RequestDevice { kind: DeviceKind, device_id: usize },
    Interrupt { kind: DeviceKind, device_id: usize },
    Snapshot(SnapshotTarget),
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Invalid command '{0}'. Type \"commands\" for help")]
    Unknown(String),

    #[error("Missing {0}")]
    MissingArgument(&'static str),

    #[error("'{value}' is not a valid {what}")]
    InvalidNumber { what: &'static str, value: String },

    #[error("Invalid snapshot option '{0}'. Expected r, d, i or m")]
    InvalidSnapshotTarget(String),

    #[error("Unexpected argument '{0}'")]
    UnexpectedArgument(String),
}

pub const HELP: &str = "Command Information:
\tA <priority level> <memory size> : Create a new process
\tt : Terminate current process in CPU
\td <disk number> : Process in CPU requests <disk number>
\tp <device number> : Process in CPU requests I/O <device number>
\tD <disk number> : Interrupt from <disk number>. Process finished task.
\tP <device number> : Interrupt from I/O <device number>. Process finished task.
\tS <r, d, i OR m> : Snapshot of System
\t\t S r : Ready Queue information
\t\t S d : Disk information
\t\t S i : I/O device information
\t\t S m : Memory information
\t'Q' or 'q' to exit program.
";

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut inputs = line.split_ascii_whitespace();
        let name = inputs.next().ok_or(CommandError::MissingArgument("command"))?;

        let command = match name {
            "A" => Command::Admit {
                priority: parse_number(inputs.next(), "priority level")?,
                memory: parse_number(inputs.next(), "memory size")?,
            },
            "t" => Command::Terminate,
            "d" => Command::RequestDevice {
                kind: DeviceKind::Disk,
                device_id: parse_number(inputs.next(), "disk number")?,
            },
            "p" => Command::RequestDevice {
                kind: DeviceKind::Other,
                device_id: parse_number(inputs.next(), "device number")?,
            },
            "D" => Command::Interrupt {
                kind: DeviceKind::Disk,
                device_id: parse_number(inputs.next(), "disk number")?,
            },
            "P" => Command::Interrupt {
                kind: DeviceKind::Other,
                device_id: parse_number(inputs.next(), "device number")?,
            },
            "S" => Command::Snapshot(parse_snapshot_target(inputs.next())?),
            "commands" => Command::Help,
            "q" | "Q" => Command::Quit,
            _ => return Err(CommandError::Unknown(line.trim().to_string())),
        };

        if let Some(extra) = inputs.next() {
            return Err(CommandError::UnexpectedArgument(extra.to_string()));
        }

        Ok(command)
    }
}

fn parse_number<T: FromStr>(input: Option<&str>, what: &'static str) -> Result<T, CommandError> {
    let value = input.ok_or(CommandError::MissingArgument(what))?;
    value.parse().map_err(|_| CommandError::InvalidNumber {
        what,
        value: value.to_string(),
    })
}

fn parse_snapshot_target(input: Option<&str>) -> Result<SnapshotTarget, CommandError> {
    match input.ok_or(CommandError::MissingArgument("snapshot option"))? {
        "r" => Ok(SnapshotTarget::Ready),
        "d" => Ok(SnapshotTarget::Disks),
        "i" => Ok(SnapshotTarget::OtherDevices),
        "m" => Ok(SnapshotTarget::Memory),
        other => Err(CommandError::InvalidSnapshotTarget(other.to_string())),
    }
}
