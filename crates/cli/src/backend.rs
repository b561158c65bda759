//! Transaction backends.
//!
//! Commands describe what the user asked for as a [`Goal`]. A backend resolves
//! it into a [`Transaction`], downloads what it needs and runs it. Each step
//! either succeeds or reports a list of problems.

use std::fmt;
use std::io::Write;

use indexmap::IndexMap;
use tracing::debug;

use crate::config::ConfigMain;

pub type Problems = Vec<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Install,
    Remove,
    Upgrade,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Install => "Installing",
            Self::Remove => "Removing",
            Self::Upgrade => "Upgrading",
        })
    }
}

/// Requested package actions, in command-line order.
#[derive(Debug, Default, Clone)]
pub struct Goal {
    pub items: Vec<(Action, String)>,
    /// Upgrade everything when no specs were given.
    pub upgrade_all: bool,
    pub minimal: bool,
}

impl Goal {
    pub fn add(&mut self, action: Action, spec: &str) {
        self.items.push((action, spec.to_string()));
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub items: Vec<(Action, String)>,
}

impl Transaction {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageQuery {
    pub keys: Vec<String>,
    pub installed: bool,
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repo {
    pub id: String,
    pub name: String,
    pub enabled: bool,
    pub options: IndexMap<String, String>,
}

pub trait TransactionBackend {
    fn resolve(&mut self, goal: &Goal) -> Result<Transaction, Problems>;

    fn download(&mut self, transaction: &Transaction) -> Result<(), Problems>;

    fn run(&mut self, transaction: &Transaction) -> Result<(), Problems>;

    /// Package names matching `query`.
    fn query(&self, query: &PackageQuery) -> Vec<String>;

    fn repos(&self) -> Vec<Repo>;
}

/// Backend that validates the request and prints what would happen.
pub struct DryRun<W> {
    out: W,
    config: ConfigMain,
    repo_setopts: Vec<(String, String)>,
}

impl<W: Write> DryRun<W> {
    /// `repo_setopts` are `REPO_ID.OPTION` keys with their values.
    pub fn new(out: W, config: ConfigMain, repo_setopts: Vec<(String, String)>) -> Self {
        Self {
            out,
            config,
            repo_setopts,
        }
    }

    fn print(&mut self, line: &str) -> Result<(), Problems> {
        writeln!(self.out, "{line}").map_err(|err| vec![format!("failed to write output: {err}")])
    }
}

fn valid_spec(spec: &str) -> bool {
    !spec.is_empty()
        && spec.chars().all(|c| {
            c.is_ascii_alphanumeric() || "._+-*?[]@/:~^".contains(c)
        })
}

impl<W: Write> TransactionBackend for DryRun<W> {
    fn resolve(&mut self, goal: &Goal) -> Result<Transaction, Problems> {
        let problems: Problems = goal
            .items
            .iter()
            .filter(|(_, spec)| !valid_spec(spec))
            .map(|(_, spec)| format!("No match for argument: {spec}"))
            .collect();
        if !problems.is_empty() {
            return Err(problems);
        }

        let mut transaction = Transaction::default();
        for item in &goal.items {
            if !transaction.items.contains(item) {
                transaction.items.push(item.clone());
            }
        }
        if goal.upgrade_all {
            transaction.items.push((Action::Upgrade, "*".to_string()));
        }
        debug!(
            items = transaction.items.len(),
            best = self.config.best(),
            minimal = goal.minimal,
            "resolved goal"
        );
        Ok(transaction)
    }

    fn download(&mut self, transaction: &Transaction) -> Result<(), Problems> {
        if self.config.refresh() {
            debug!("metadata refresh requested, nothing to refresh in a dry run");
        }
        debug!(items = transaction.items.len(), "no packages to download");
        Ok(())
    }

    fn run(&mut self, transaction: &Transaction) -> Result<(), Problems> {
        let installroot = self.config.installroot();
        if self.config.debuglevel() > 2 {
            self.print(&format!("Installroot: {installroot}"))?;
        }
        for (action, spec) in &transaction.items {
            self.print(&format!("Dry run: {action} {spec}"))?;
        }
        Ok(())
    }

    fn query(&self, query: &PackageQuery) -> Vec<String> {
        debug!(?query, "no package metadata loaded");
        Vec::new()
    }

    fn repos(&self) -> Vec<Repo> {
        let mut repos: IndexMap<String, Repo> = IndexMap::new();
        for (key, value) in &self.repo_setopts {
            let Some((id, option)) = key.rsplit_once('.') else {
                continue;
            };
            let repo = repos.entry(id.to_string()).or_insert_with(|| Repo {
                id: id.to_string(),
                name: id.to_string(),
                enabled: true,
                options: IndexMap::new(),
            });
            match option {
                "name" => repo.name = value.clone(),
                "enabled" => {
                    repo.enabled = !matches!(
                        value.to_ascii_lowercase().as_str(),
                        "0" | "no" | "false" | "off"
                    )
                }
                _ => {}
            }
            repo.options.insert(option.to_string(), value.clone());
        }
        repos.into_values().collect()
    }
}
