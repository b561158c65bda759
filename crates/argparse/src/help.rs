//! Help text for a command: usage line, description and two-column argument tables.

use std::collections::HashSet;

use crate::argument::{ArgRef, Argument};
use crate::command::CommandId;
use crate::named_arg::NamedArg;
use crate::parser::ArgumentParser;

/// Render rows as two aligned columns.
pub(crate) fn render_table(rows: &[(String, String)], indent: &str) -> String {
    let width = rows
        .iter()
        .map(|(left, _)| left.chars().count())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for (left, right) in rows {
        if right.is_empty() {
            out.push_str(&format!("{indent}{left}\n"));
        } else {
            out.push_str(&format!("{indent}{left:width$}  {right}\n"));
        }
    }
    out
}

/// `-s VALUE, --long=VALUE` as shown in the help table.
fn named_arg_names(arg: &NamedArg) -> String {
    let mut names = String::new();
    if let Some(short) = arg.short_name {
        names.push('-');
        names.push(short);
        if arg.has_value {
            names.push(' ');
            names.push_str(arg.value_placeholder());
        }
        if !arg.long_name.is_empty() {
            names.push_str(", ");
        }
    }
    if !arg.long_name.is_empty() {
        names.push_str("--");
        names.push_str(&arg.long_name);
        if arg.has_value {
            names.push('=');
            names.push_str(arg.value_placeholder());
        }
    }
    names
}

struct Section {
    header: String,
    rows: Vec<(String, String)>,
}

impl ArgumentParser {
    /// `dnf5 [GLOBAL OPTIONS] repo [OPTIONS] list [OPTIONS] [ARGUMENTS]`
    pub fn usage(&self, cmd: CommandId) -> String {
        let mut usage = String::new();
        let mut current = Some(cmd);
        while let Some(id) = current {
            let command = &self.commands[id.0];
            let mut part = command.id().to_string();
            if !self.named_args_of(id).is_empty() {
                part.push_str(if command.parent.is_some() {
                    " [OPTIONS]"
                } else {
                    " [GLOBAL OPTIONS]"
                });
            }
            if !self.positional_args_of(id).is_empty() {
                part.push_str(" [ARGUMENTS]");
            }
            usage = format!("{part} {usage}");
            current = command.parent;
        }
        if !self.commands_of(cmd).is_empty() {
            usage.push_str("<COMMAND> ...");
        }
        usage.trim_end().to_string()
    }

    /// Full help text of `cmd`.
    ///
    /// Arguments registered in one of the command's groups are listed under the
    /// group header; the rest go under the command's own section headers.
    pub fn help(&self, cmd: CommandId) -> String {
        let command = &self.commands[cmd.0];
        let mut out = format!("Usage:\n  {}\n", self.usage(cmd));
        if !command.long_description().is_empty() {
            out.push_str("\nDescription:\n");
            for line in command.long_description().lines() {
                out.push_str(&format!("  {line}\n"));
            }
        }

        let storage = self.resolve_alias(cmd);
        let storage_cmd = &self.commands[storage.0];
        let mut grouped: HashSet<ArgRef> = HashSet::new();
        let mut sections = Vec::new();

        let commands: Vec<ArgRef> = self.commands_of(cmd).iter().map(|&c| c.into()).collect();
        let named: Vec<ArgRef> = self.named_args_of(cmd).iter().map(|&a| a.into()).collect();
        let positional: Vec<ArgRef> = self
            .positional_args_of(cmd)
            .iter()
            .map(|&a| a.into())
            .collect();

        for (members, header) in [
            (&commands, storage_cmd.commands_help_header()),
            (&named, storage_cmd.named_args_help_header()),
            (&positional, storage_cmd.positional_args_help_header()),
        ] {
            if header.is_empty() || members.is_empty() {
                continue;
            }
            for &group in self.groups_of(cmd) {
                let group = &self.groups[group.0];
                let rows: Vec<(String, String)> = group
                    .arguments
                    .iter()
                    .filter(|&&arg| members.contains(&arg))
                    .map(|&arg| {
                        grouped.insert(arg);
                        self.help_row(arg)
                    })
                    .collect();
                if !rows.is_empty() {
                    sections.push(Section {
                        header: group.header().to_string(),
                        rows,
                    });
                }
            }
            let rows: Vec<(String, String)> = members
                .iter()
                .filter(|&&arg| !grouped.contains(&arg))
                .map(|&arg| self.help_row(arg))
                .collect();
            if !rows.is_empty() {
                sections.push(Section {
                    header: header.to_string(),
                    rows,
                });
            }
        }

        let all_rows: Vec<(String, String)> = sections
            .iter()
            .flat_map(|section| section.rows.iter().cloned())
            .collect();
        let table = render_table(&all_rows, "  ");
        let mut lines = table.lines();
        for section in &sections {
            out.push_str(&format!("\n{}\n", section.header));
            for line in lines.by_ref().take(section.rows.len()) {
                out.push_str(line);
                out.push('\n');
            }
        }
        out
    }

    /// Print the help of `cmd` to stdout.
    pub fn print_help(&self, cmd: CommandId) {
        print!("{}", self.help(cmd));
    }

    fn help_row(&self, arg: ArgRef) -> (String, String) {
        let left = match arg {
            ArgRef::Named(id) => named_arg_names(&self.named_args[id.0]),
            other => self.argument(other).id().to_string(),
        };
        (left, self.argument(arg).description().to_string())
    }
}
