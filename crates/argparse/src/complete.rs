//! Shell completion: a parse pass that stops at one argv slot and prints
//! candidates for it.

use std::io::{self, Write};

use tracing::debug;

use crate::argument::Argument;
use crate::command::CommandId;
use crate::help::render_table;
use crate::named_arg::NamedArgId;
use crate::parser::{ArgumentParser, Completion};
use crate::positional_arg::PositionalArgId;

impl ArgumentParser {
    /// Print completion candidates for `args[complete_arg_idx]` to stdout.
    ///
    /// Never fails: parse errors and write errors are dropped.
    pub fn complete<I, S>(&mut self, args: I, complete_arg_idx: usize)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        if let Err(err) = self.complete_to(args, complete_arg_idx, &mut out) {
            debug!(%err, "failed to write completion output");
        }
    }

    /// Like [`complete`](Self::complete) but writes into `out`.
    pub fn complete_to<I, S, W>(
        &mut self,
        args: I,
        complete_arg_idx: usize,
        out: &mut W,
    ) -> io::Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        W: Write + ?Sized,
    {
        let argv: Vec<String> = args.into_iter().map(Into::into).collect();
        if complete_arg_idx < 1 || complete_arg_idx >= argv.len() {
            return Ok(());
        }

        self.completion = Some(Completion {
            target: complete_arg_idx,
            output: String::new(),
        });
        if let Err(err) = self.parse_argv(&argv) {
            debug!(%err, "parse error ignored during completion");
        }
        let output = self
            .completion
            .take()
            .map(|completion| completion.output)
            .unwrap_or_default();
        out.write_all(output.as_bytes())?;
        out.flush()
    }

    fn emit(&mut self, line: &str) {
        if let Some(completion) = &mut self.completion {
            completion.output.push_str(line);
            completion.output.push('\n');
        }
    }

    /// Candidates for `arg`, the word under the cursor inside command `cmd`.
    pub(crate) fn print_complete(
        &mut self,
        cmd: CommandId,
        arg: &str,
        named_args: &[NamedArgId],
        used_positional: usize,
    ) {
        let add_description = self.complete_add_description;
        let mut table: Vec<(String, String)> = Vec::new();
        let mut suggestions: Vec<String> = Vec::new();
        let mut last = String::new();

        if !arg.starts_with('-') {
            for &sub in self.commands_of(cmd) {
                let command = &self.commands[sub.0];
                if !command.complete() || !command.id().starts_with(arg) {
                    continue;
                }
                if add_description {
                    table.push((
                        command.id().to_string(),
                        format!("({})", command.description()),
                    ));
                } else {
                    suggestions.push(command.id().to_string());
                }
                last = format!("{} ", command.id());
            }

            let positional_args = self.positional_args_of(cmd);
            if last.is_empty() && used_positional < positional_args.len() {
                let pending = positional_args[used_positional];
                self.complete_positional(pending, arg);
                return;
            }
        }

        if arg.starts_with('-') {
            for &id in named_args {
                let named = &self.named_args[id.0];
                if !named.complete() {
                    continue;
                }
                if let Some(short) = named.short_name {
                    let name = format!("-{short}");
                    if arg == "-" || arg == name {
                        if add_description {
                            let mut shown = name.clone();
                            if named.has_value {
                                shown.push_str(named.value_placeholder());
                            }
                            table.push((shown, format!("({})", named.description())));
                        } else {
                            suggestions.push(name.clone());
                        }
                        last = name;
                        if !named.has_value {
                            last.push(' ');
                        }
                    }
                }
                if !named.long_name.is_empty() {
                    let mut name = format!("--{}", named.long_name);
                    if name.starts_with(arg) {
                        if named.has_value {
                            name.push('=');
                        }
                        if add_description {
                            let mut shown = name.clone();
                            if named.has_value {
                                shown.push_str(named.value_placeholder());
                            }
                            table.push((shown, format!("({})", named.description())));
                        } else {
                            suggestions.push(name.clone());
                        }
                        if !named.has_value {
                            name.push(' ');
                        }
                        last = name;
                    }
                }
            }
        }

        if table.len() > 1 {
            let rendered = render_table(&table, "");
            for line in rendered.lines() {
                self.emit(line);
            }
        } else if suggestions.len() > 1 {
            for suggestion in suggestions {
                self.emit(&suggestion);
            }
        } else if !last.is_empty() && last != arg {
            self.emit(&last);
        }
    }

    /// Delegate to the positional argument's completion hook.
    pub(crate) fn complete_positional(&mut self, id: PositionalArgId, arg: &str) {
        let positional = &self.positional_args[id.0];
        if !positional.complete() {
            return;
        }
        let Some(hook) = positional.complete_hook.clone() else {
            return;
        };
        let candidates = hook(arg);
        if let [single] = candidates.as_slice() {
            if single != arg {
                self.emit(single);
            }
            return;
        }
        for candidate in &candidates {
            self.emit(candidate);
        }
    }
}
