//! `repo` and its subcommands.

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{Result, bail};
use dnf5_argparse::option::{OptionBool, SharedValues};
use dnf5_argparse::{ArgCount, ArgRef, ArgumentParser, CommandId, GroupId};

use super::{Command, add_command, add_flag, add_specs, strings};
use crate::backend::{Repo, TransactionBackend};
use crate::context::Context;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Filter {
    All,
    Enabled,
    Disabled,
}

struct RepoFilter {
    all: Rc<RefCell<OptionBool>>,
    disabled: Rc<RefCell<OptionBool>>,
}

impl RepoFilter {
    fn register(parser: &mut ArgumentParser, cmd: CommandId) -> Result<Self> {
        let (all_arg, all) = add_flag(parser, cmd, "all", "show all repos")?;
        let (enabled_arg, _) = add_flag(parser, cmd, "enabled", "show enabled repos (default)")?;
        let (disabled_arg, disabled) = add_flag(parser, cmd, "disabled", "show disabled repos")?;
        parser.add_conflict_args_group([
            ArgRef::from(all_arg),
            ArgRef::from(enabled_arg),
            ArgRef::from(disabled_arg),
        ]);
        Ok(Self { all, disabled })
    }

    fn filter(&self) -> Filter {
        if self.all.borrow().value() {
            Filter::All
        } else if self.disabled.borrow().value() {
            Filter::Disabled
        } else {
            Filter::Enabled
        }
    }

    fn matches(&self, repo: &Repo) -> bool {
        match self.filter() {
            Filter::All => true,
            Filter::Enabled => repo.enabled,
            Filter::Disabled => !repo.enabled,
        }
    }
}

struct RepoListCommand {
    filter: RepoFilter,
}

impl Command for RepoListCommand {
    fn run(&self, _ctx: &Context, backend: &mut dyn TransactionBackend) -> Result<()> {
        let repos: Vec<Repo> = backend
            .repos()
            .into_iter()
            .filter(|repo| self.filter.matches(repo))
            .collect();
        if repos.is_empty() {
            println!("No repositories to list.");
            return Ok(());
        }

        let show_status = self.filter.filter() == Filter::All;
        let id_width = repos
            .iter()
            .map(|repo| repo.id.len())
            .chain(["repo id".len()])
            .max()
            .unwrap_or(0);
        let name_width = repos
            .iter()
            .map(|repo| repo.name.len())
            .chain(["repo name".len()])
            .max()
            .unwrap_or(0);

        if show_status {
            println!("{:id_width$} {:name_width$} status", "repo id", "repo name");
        } else {
            println!("{:id_width$} repo name", "repo id");
        }
        for repo in &repos {
            if show_status {
                let status = if repo.enabled { "enabled" } else { "disabled" };
                println!("{:id_width$} {:name_width$} {status}", repo.id, repo.name);
            } else {
                println!("{:id_width$} {}", repo.id, repo.name);
            }
        }
        Ok(())
    }
}

struct RepoInfoCommand {
    filter: RepoFilter,
    repo_specs: SharedValues,
}

impl Command for RepoInfoCommand {
    fn run(&self, _ctx: &Context, backend: &mut dyn TransactionBackend) -> Result<()> {
        let wanted = strings(&self.repo_specs);
        let repos: Vec<Repo> = backend
            .repos()
            .into_iter()
            .filter(|repo| wanted.is_empty() || wanted.contains(&repo.id))
            .filter(|repo| !wanted.is_empty() || self.filter.matches(repo))
            .collect();
        if let Some(missing) = wanted
            .iter()
            .find(|id| !repos.iter().any(|repo| &repo.id == *id))
        {
            bail!("No matching repository: {missing}");
        }

        for (idx, repo) in repos.iter().enumerate() {
            if idx > 0 {
                println!();
            }
            println!("Repo ID        : {}", repo.id);
            println!("Name           : {}", repo.name);
            println!(
                "Status         : {}",
                if repo.enabled { "enabled" } else { "disabled" }
            );
            for (key, value) in &repo.options {
                println!("{key:15}: {value}");
            }
        }
        Ok(())
    }
}

pub(super) fn register(
    parser: &mut ArgumentParser,
    root: CommandId,
    group: GroupId,
) -> Result<Vec<(CommandId, Box<dyn Command>)>> {
    let repo = add_command(parser, root, Some(group), "repo", "Manage repositories")?;

    let list = add_command(parser, repo, None, "list", "List repositories")?;
    let list_filter = RepoFilter::register(parser, list)?;

    let info = add_command(parser, repo, None, "info", "Print details about repositories")?;
    let info_filter = RepoFilter::register(parser, info)?;
    let repo_specs = add_specs(
        parser,
        info,
        "repo_specs",
        ArgCount::Unlimited,
        "List of repository ids",
    )?;

    let list_action: Box<dyn Command> = Box::new(RepoListCommand {
        filter: list_filter,
    });
    let info_action: Box<dyn Command> = Box::new(RepoInfoCommand {
        filter: info_filter,
        repo_specs,
    });
    Ok(vec![(list, list_action), (info, info_action)])
}
