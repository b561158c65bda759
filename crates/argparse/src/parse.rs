//! Recursive-descent scan of argv over the registered command tree.

use tracing::{debug, trace};

use crate::argument::Argument;
use crate::command::CommandId;
use crate::error::{Error, MAX_ATTACHED_DEPTH, Result};
use crate::named_arg::NamedArgId;
use crate::option::Priority;
use crate::parser::ArgumentParser;
use crate::positional_arg::PositionalArgId;

impl ArgumentParser {
    /// Parse a full command line. `args[0]` is the program name.
    ///
    /// Parse counts are not reset; call [`reset_parse_count`](Self::reset_parse_count)
    /// before parsing the same tree again.
    pub fn parse<I, S>(&mut self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = args.into_iter().map(Into::into).collect();
        self.parse_argv(&argv)
    }

    pub(crate) fn parse_argv(&mut self, argv: &[String]) -> Result<()> {
        let root = self.require_root()?;
        self.selected_command = Some(root);
        if argv.is_empty() {
            return Ok(());
        }
        self.parse_command(root, argv, 0)
    }

    pub(crate) fn completion_target(&self) -> Option<usize> {
        self.completion.as_ref().map(|completion| completion.target)
    }

    /// Named arguments a command may match: its own, plus its ancestors' when
    /// inheritance is enabled.
    pub(crate) fn eligible_named_args(&self, cmd: CommandId) -> Vec<NamedArgId> {
        let mut named_args = self.named_args_of(cmd).to_vec();
        if self.inherit_named_args() {
            let mut parent = self.commands[cmd.0].parent;
            while let Some(id) = parent {
                named_args.extend_from_slice(self.named_args_of(id));
                parent = self.commands[id.0].parent;
            }
        }
        named_args
    }

    /// `argv[0]` is the token that selected `cmd`; `offset` is its absolute index.
    fn parse_command(&mut self, cmd: CommandId, argv: &[String], offset: usize) -> Result<()> {
        let option = argv[0].as_str();

        let alias_args = self.commands[cmd.0]
            .alias
            .as_ref()
            .map(|alias| alias.attached_named_args.clone())
            .unwrap_or_default();
        for attached in alias_args {
            let target = self.get_named_arg(&attached.id_path, false)?;
            let mut args = vec![option.to_string()];
            if self.named_args[target.0].has_value {
                args.push(attached.value);
            }
            self.parse_long(target, option, &args, 0)?;
        }

        let storage = self.resolve_alias(cmd);
        let subcommands = self.commands_of(storage).to_vec();
        let positional_args = self.positional_args_of(storage).to_vec();
        let named_args = self.eligible_named_args(cmd);

        let mut used_positional = 0;
        let mut short_option_idx = 0;
        let mut i = 1;
        while i < argv.len() {
            if let Some(target) = self.completion_target() {
                if offset + i > target {
                    return Ok(());
                }
                if offset + i == target {
                    self.print_complete(storage, &argv[i], &named_args, used_positional);
                    return Ok(());
                }
            }

            let token = argv[i].as_str();
            let mut used = false;

            if let Some(rest) = token.strip_prefix('-') {
                if let Some(long) = rest.strip_prefix('-') {
                    let name = long.split_once('=').map_or(long, |(name, _)| name);
                    let matched = named_args.iter().copied().find(|&arg| {
                        let long_name = &self.named_args[arg.0].long_name;
                        !long_name.is_empty() && long_name == name
                    });
                    if let Some(arg) = matched {
                        trace!(token, arg = self.named_args[arg.0].id(), "long option");
                        i += self.parse_long(arg, long, &argv[i..], 0)?;
                        used = true;
                    }
                } else if let Some(short) = rest[short_option_idx..].chars().next() {
                    let matched = named_args
                        .iter()
                        .copied()
                        .find(|&arg| self.named_args[arg.0].short_name == Some(short));
                    if let Some(arg) = matched {
                        trace!(token, arg = self.named_args[arg.0].id(), "short option");
                        let consumed =
                            self.parse_short(arg, &rest[short_option_idx..], &argv[i..], 0)?;
                        if consumed > 0 {
                            i += consumed;
                            short_option_idx = 0;
                        } else {
                            short_option_idx += short.len_utf8();
                        }
                        used = true;
                    }
                }
            }

            if !used {
                let matched = subcommands
                    .iter()
                    .copied()
                    .find(|&sub| self.commands[sub.0].id() == token);
                if let Some(sub) = matched {
                    // Checked against the subcommand's own conflicts, so a container
                    // reached without any of its subcommands is rejected too.
                    if let Some(conflict) = self.conflict_argument(sub) {
                        return Err(self.conflict_error(token.to_string(), conflict));
                    }
                    debug!(command = token, "dispatching to subcommand");
                    self.selected_command = Some(sub);
                    self.parse_command(sub, &argv[i..], offset + i)?;
                    i = argv.len();
                    used = true;
                    if self.completion.is_some() {
                        return Ok(());
                    }
                }
            }

            if !used && !token.starts_with('-') && used_positional < positional_args.len() {
                let arg = positional_args[used_positional];
                trace!(token, arg = self.positional_args[arg.0].id(), "positional");
                i += self.parse_positional(arg, &argv[i..], offset + i)?;
                if self.positional_args[arg.0].is_exhausted() {
                    used_positional += 1;
                }
                used = true;
            }

            if !used {
                return Err(Error::UnknownArgument {
                    command: self.commands[cmd.0].id().to_string(),
                    argument: token.to_string(),
                });
            }
        }

        self.commands[cmd.0].base_mut().parse_count += 1;

        for &arg in &positional_args {
            let positional = &self.positional_args[arg.0];
            if positional.is_required() && positional.parse_count() == 0 {
                return Err(Error::MissingPositionalArgument {
                    argument: positional.id().to_string(),
                    command: self.commands[cmd.0].id().to_string(),
                });
            }
        }

        if let Some(hook) = self.commands[storage.0].items.parse_hook.clone() {
            hook(&*self, storage, option, argv)?;
        }
        Ok(())
    }

    /// `option` is the token without the leading `--`. Returns consumed tokens.
    pub(crate) fn parse_long(
        &mut self,
        id: NamedArgId,
        option: &str,
        argv: &[String],
        depth: usize,
    ) -> Result<usize> {
        if depth > MAX_ATTACHED_DEPTH {
            return Err(Error::AttachedArgumentsTooDeep {
                argument: format!("--{option}"),
            });
        }
        if let Some(conflict) = self.conflict_argument(id) {
            return Err(self.conflict_error(format!("--{option}"), conflict));
        }

        let arg = &self.named_args[id.0];
        let assigned = option.split_once('=');
        let (value, consumed) = if arg.has_value {
            match assigned {
                Some((_, value)) => (value.to_string(), 1),
                None => match argv.get(1) {
                    Some(value) => (value.clone(), 2),
                    None => {
                        return Err(Error::NamedArgMissingValue {
                            option: format!("--{option}"),
                        });
                    }
                },
            }
        } else {
            if assigned.is_some() {
                return Err(Error::NamedArgValueNotExpected {
                    option: format!("--{option}"),
                });
            }
            (arg.const_value.clone(), 1)
        };

        self.finish_named(id, option, &value)?;

        let attached = self.named_args[id.0].attached_named_args.clone();
        if !attached.is_empty() {
            let long_name = assigned.map_or(option, |(name, _)| name);
            for target in attached {
                let target_id = self.get_named_arg(&target.id_path, false)?;
                let mut invocation = long_name.to_string();
                if self.named_args[target_id.0].has_value {
                    invocation.push('=');
                    invocation.push_str(&target.value.replace("${}", &value));
                }
                let args = [invocation.clone()];
                self.parse_long(target_id, &invocation, &args, depth + 1)?;
            }
        }
        Ok(consumed)
    }

    /// `option` starts at the short name being parsed and may continue with
    /// bundled flags or an inline value. Returns consumed tokens; zero means the
    /// caller continues with the next character of the same token.
    pub(crate) fn parse_short(
        &mut self,
        id: NamedArgId,
        option: &str,
        argv: &[String],
        depth: usize,
    ) -> Result<usize> {
        let short_len = option.chars().next().map_or(0, char::len_utf8);
        let (short, rest) = option.split_at(short_len);

        if depth > MAX_ATTACHED_DEPTH {
            return Err(Error::AttachedArgumentsTooDeep {
                argument: format!("-{short}"),
            });
        }
        if let Some(conflict) = self.conflict_argument(id) {
            return Err(self.conflict_error(format!("-{short}"), conflict));
        }

        let arg = &self.named_args[id.0];
        let (value, consumed) = if arg.has_value {
            if !rest.is_empty() {
                (rest.to_string(), 1)
            } else {
                match argv.get(1) {
                    Some(value) => (value.clone(), 2),
                    None => {
                        return Err(Error::NamedArgMissingValue {
                            option: format!("-{short}"),
                        });
                    }
                }
            }
        } else {
            (arg.const_value.clone(), usize::from(rest.is_empty()))
        };

        self.finish_named(id, short, &value)?;

        for target in self.named_args[id.0].attached_named_args.clone() {
            let target_id = self.get_named_arg(&target.id_path, false)?;
            let mut args = vec![short.to_string()];
            if self.named_args[target_id.0].has_value {
                args.push(target.value.replace("${}", &value));
            }
            self.parse_short(target_id, short, &args, depth + 1)?;
        }
        Ok(consumed)
    }

    /// Store the value, count the occurrence and run the hook.
    fn finish_named(&mut self, id: NamedArgId, option: &str, value: &str) -> Result<()> {
        let arg = &self.named_args[id.0];
        if arg.store_value
            && let Some(linked) = &arg.value
        {
            linked
                .borrow_mut()
                .set_from_str(Priority::CommandLine, value)
                .map_err(|err| Error::InvalidValue {
                    argument: arg.display_names(),
                    reason: err.to_string(),
                })?;
        }
        self.named_args[id.0].base_mut().parse_count += 1;
        if let Some(hook) = self.named_args[id.0].parse_hook.clone() {
            hook(&*self, id, option, value)?;
        }
        Ok(())
    }

    /// `argv[0]` is the first value; `offset` is its absolute index.
    fn parse_positional(
        &mut self,
        id: PositionalArgId,
        argv: &[String],
        offset: usize,
    ) -> Result<usize> {
        if let Some(conflict) = self.conflict_argument(id) {
            return Err(self.conflict_error(argv[0].clone(), conflict));
        }

        let nvals = self.positional_args[id.0].nvals;
        let usable = 1 + argv[1..]
            .iter()
            .take_while(|token| !token.starts_with('-'))
            .count();
        let count = nvals.tokens(usable);

        if let Some(target) = self.completion_target()
            && target >= offset
            && target < offset + count
        {
            self.complete_positional(id, &argv[target - offset]);
            return Ok(count);
        }

        let arg = &self.positional_args[id.0];
        if argv.len() < count || argv[1..count].iter().any(|token| token.starts_with('-')) {
            return Err(Error::PositionalArgumentFewValues {
                argument: arg.id().to_string(),
            });
        }

        if arg.store_value
            && let Some(values) = &arg.values
        {
            let mut values = values.borrow_mut();
            for (idx, token) in argv[..count].iter().enumerate() {
                if values.len() <= idx {
                    let Some(init) = &arg.init_value else {
                        return Err(Error::InvalidPositionalArgument {
                            argument: arg.id().to_string(),
                            reason: "no init value to grow the value list",
                        });
                    };
                    values.push(init.borrow().clone_box());
                }
                values[idx]
                    .set_from_str(Priority::CommandLine, token)
                    .map_err(|err| Error::InvalidValue {
                        argument: arg.id().to_string(),
                        reason: err.to_string(),
                    })?;
            }
        }

        self.positional_args[id.0].base_mut().parse_count += 1;
        if let Some(hook) = self.positional_args[id.0].parse_hook.clone() {
            hook(&*self, id, &argv[..count])?;
        }
        Ok(count)
    }
}
