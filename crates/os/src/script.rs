use anyhow::{Context, Result, bail};
use kernel::{IoOperation, Kernel};

/// One line of a disk script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiskCommand {
    Create(String),
    Write { name: String, data: String },
    Read(String),
    Delete(String),
    List,
}

/// Parses a script, one command per line. Blank lines and lines starting
/// with `#` are skipped.
///
/// ```text
/// create notes
/// write notes "hello world"
/// read notes
/// ls
/// delete notes
/// ```
pub fn parse_script(text: &str) -> Result<Vec<DiskCommand>> {
    let mut commands = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let command = parse_line(line).with_context(|| format!("line {}: {}", idx + 1, line))?;
        commands.push(command);
    }
    Ok(commands)
}

fn parse_line(line: &str) -> Result<DiskCommand> {
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let name = |rest: &str| -> Result<String> {
        if rest.is_empty() {
            bail!("`{}` needs a filename", verb);
        }
        Ok(rest.to_string())
    };

    match verb.to_ascii_lowercase().as_str() {
        "create" => Ok(DiskCommand::Create(name(rest)?)),
        "read" => Ok(DiskCommand::Read(name(rest)?)),
        "delete" => Ok(DiskCommand::Delete(name(rest)?)),
        "ls" => Ok(DiskCommand::List),
        "write" => {
            let Some((file, data)) = rest.split_once(char::is_whitespace) else {
                bail!("usage: write NAME \"DATA\"");
            };
            let data = data.trim();
            if data.len() < 2 || !data.starts_with('"') || !data.ends_with('"') {
                bail!("write data must be wrapped in double quotes");
            }
            Ok(DiskCommand::Write {
                name: file.to_string(),
                data: data[1..data.len() - 1].to_string(),
            })
        }
        other => bail!("unknown command `{}`", other),
    }
}

/// Runs every command through the kernel. A failing command has already been
/// reported on the console, so the script carries on. Returns the number of
/// failed commands.
pub fn execute(kernel: &mut Kernel, commands: &[DiskCommand]) -> usize {
    let mut failures = 0;
    for command in commands {
        let result = match command {
            DiskCommand::Create(name) => kernel.perform_io(IoOperation::Create, name, &[]).map(drop),
            DiskCommand::Write { name, data } => kernel
                .perform_io(IoOperation::Write, name, data.as_bytes())
                .map(drop),
            DiskCommand::Read(name) => kernel.perform_io(IoOperation::Read, name, &[]).map(drop),
            DiskCommand::Delete(name) => kernel.perform_io(IoOperation::Delete, name, &[]).map(drop),
            DiskCommand::List => kernel.list_files().map(drop),
        };
        if result.is_err() {
            failures += 1;
        }
    }
    failures
}
