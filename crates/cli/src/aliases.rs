//! Command-line aliases loaded from TOML drop-in files.
//!
//! Each `*.conf` file holds `version = "1.0"` and one table per element, keyed by
//! the element's id path. Elements are groups, clones of existing named
//! arguments, new named arguments and command aliases. A broken element is
//! reported and skipped; the rest of the file still loads.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use dnf5_argparse::{Argument, ArgumentParser, CommandId, GroupId};
use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, error, warn};

const CONF_FILE_VERSION: &str = "1.0";

/// Replaces the default search path; entries are separated like `PATH`.
pub const ALIASES_DIRS_ENV: &str = "DNF5_ALIASES_DIRS";

#[derive(Debug, Deserialize)]
struct AliasFile {
    version: Option<toml::Value>,
    #[serde(flatten)]
    elements: IndexMap<String, toml::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Element {
    Group(GroupElement),
    ClonedNamedArg(ClonedNamedArgElement),
    NamedArg(NamedArgElement),
    Command(CommandElement),
}

#[derive(Debug, Deserialize)]
struct GroupElement {
    header: String,
    #[serde(flatten)]
    unknown: IndexMap<String, toml::Value>,
}

#[derive(Debug, Deserialize)]
struct ClonedNamedArgElement {
    source: String,
    long_name: Option<String>,
    short_name: Option<String>,
    group_id: Option<String>,
    #[serde(default)]
    complete: bool,
    #[serde(flatten)]
    unknown: IndexMap<String, toml::Value>,
}

#[derive(Debug, Deserialize)]
struct NamedArgElement {
    long_name: Option<String>,
    short_name: Option<String>,
    descr: Option<String>,
    #[serde(default)]
    has_value: bool,
    value_help: Option<String>,
    const_value: Option<String>,
    group_id: Option<String>,
    #[serde(default)]
    complete: bool,
    #[serde(default)]
    attached_named_args: Vec<AttachedArg>,
    #[serde(flatten)]
    unknown: IndexMap<String, toml::Value>,
}

#[derive(Debug, Deserialize)]
struct CommandElement {
    attached_command: String,
    descr: Option<String>,
    group_id: Option<String>,
    #[serde(default)]
    complete: bool,
    #[serde(default)]
    attached_named_args: Vec<AttachedArg>,
    #[serde(flatten)]
    unknown: IndexMap<String, toml::Value>,
}

#[derive(Debug, Deserialize)]
struct AttachedArg {
    id_path: String,
    value: Option<String>,
    #[serde(flatten)]
    unknown: IndexMap<String, toml::Value>,
}

/// Directories searched for alias files, in load order.
pub fn alias_dirs() -> Vec<PathBuf> {
    if let Some(value) = env::var_os(ALIASES_DIRS_ENV) {
        return env::split_paths(&value)
            .filter(|path| !path.as_os_str().is_empty())
            .collect();
    }
    let mut paths = vec![
        PathBuf::from("/usr/share/dnf5/aliases.d"),
        PathBuf::from("/etc/dnf/dnf5-aliases.d"),
    ];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("dnf5").join("aliases.d"));
    }
    paths
}

/// Load every directory in order. Returns the reported problems.
pub fn load_cmdline_aliases(parser: &mut ArgumentParser, dirs: &[PathBuf]) -> Vec<String> {
    let mut problems = Vec::new();
    for dir in dirs {
        problems.extend(load_dir(parser, dir));
    }
    problems
}

/// Load `*.conf` files of `dir` sorted by name. A missing directory is not an error.
pub fn load_dir(parser: &mut ArgumentParser, dir: &Path) -> Vec<String> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!(dir = %dir.display(), %err, "alias directory skipped");
            return Vec::new();
        }
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "conf"))
        .collect();
    files.sort();

    let mut problems = Vec::new();
    for file in files {
        problems.extend(load_file(parser, &file));
    }
    problems
}

fn report(problems: &mut Vec<String>, message: String) {
    error!("{message}");
    problems.push(message);
}

/// Load one alias file. Returns the reported problems.
pub fn load_file(parser: &mut ArgumentParser, path: &Path) -> Vec<String> {
    let mut problems = Vec::new();
    let file = match read_alias_file(path) {
        Ok(file) => file,
        Err(err) => {
            report(&mut problems, format!("{err:#}"));
            return problems;
        }
    };

    match &file.version {
        Some(toml::Value::String(version)) if version == CONF_FILE_VERSION => {}
        Some(toml::Value::String(version)) => {
            report(
                &mut problems,
                format!(
                    "Unsupported version \"{version}\" in file \"{}\", \
                     \"{CONF_FILE_VERSION}\" expected",
                    path.display()
                ),
            );
            return problems;
        }
        Some(_) => {
            report(
                &mut problems,
                format!(
                    "Bad value type of attribute \"version\" in file \"{}\"",
                    path.display()
                ),
            );
            return problems;
        }
        None => {
            report(
                &mut problems,
                format!("Missing attribute \"version\" in file \"{}\"", path.display()),
            );
            return problems;
        }
    }

    let mut loaded = 0;
    for (id_path, options) in file.elements {
        if !options.is_table() {
            warn!(key = %id_path, file = %path.display(), "unknown key in alias file");
            continue;
        }
        match load_element(parser, path, &id_path, options) {
            Ok(()) => loaded += 1,
            Err(err) => report(
                &mut problems,
                format!(
                    "Element \"{id_path}\" in file \"{}\": {err:#}",
                    path.display()
                ),
            ),
        }
    }
    debug!(file = %path.display(), loaded, "alias file loaded");
    problems
}

fn read_alias_file(path: &Path) -> Result<AliasFile> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read alias file \"{}\"", path.display()))?;
    toml::from_str(&text).with_context(|| format!("syntax error in file \"{}\"", path.display()))
}

fn warn_unknown(path: &Path, id_path: &str, unknown: &IndexMap<String, toml::Value>) {
    for key in unknown.keys() {
        warn!(
            attribute = %key,
            element = id_path,
            file = %path.display(),
            "unknown attribute in alias file"
        );
    }
}

fn short_name(value: Option<&str>) -> Result<Option<char>> {
    let Some(value) = value else {
        return Ok(None);
    };
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(short), None) => Ok(Some(short)),
        _ => bail!("The \"short_name\" attribute must be one character long"),
    }
}

fn require_name(long_name: &str, short_name: Option<char>) -> Result<()> {
    if long_name.is_empty() && short_name.is_none() {
        bail!("At least one of the attributes \"long_name\" and \"short_name\" must be set");
    }
    Ok(())
}

fn find_group(
    parser: &ArgumentParser,
    parent: CommandId,
    group_id: Option<&str>,
) -> Result<Option<GroupId>> {
    group_id
        .map(|id| {
            parser
                .child_group(parent, id)
                .with_context(|| format!("Group \"{id}\" not found"))
        })
        .transpose()
}

/// Check the targets of attached arguments before anything is created.
fn check_attached(
    parser: &ArgumentParser,
    path: &Path,
    id_path: &str,
    attached: &[AttachedArg],
) -> Result<()> {
    for arg in attached {
        warn_unknown(path, id_path, &arg.unknown);
        parser
            .get_named_arg(&arg.id_path, false)
            .with_context(|| format!("Attached named argument \"{}\" not found", arg.id_path))?;
    }
    Ok(())
}

fn load_element(
    parser: &mut ArgumentParser,
    path: &Path,
    id_path: &str,
    options: toml::Value,
) -> Result<()> {
    let (parent_path, id) = id_path.rsplit_once('.').unwrap_or(("", id_path));
    if id.is_empty() {
        bail!("Empty or bad element id path");
    }
    let parent = parser
        .get_command(parent_path)
        .with_context(|| format!("Parent command \"{parent_path}\" not found"))?;
    let element: Element = options.try_into().context("Bad element definition")?;

    match element {
        Element::Group(group) => {
            warn_unknown(path, id_path, &group.unknown);
            if parser.child_group(parent, id).is_err() {
                let new_group = parser.add_new_group(id);
                parser.group_mut(new_group).set_header(&group.header);
                parser.register_group(parent, new_group)?;
            }
        }

        Element::ClonedNamedArg(clone) => {
            warn_unknown(path, id_path, &clone.unknown);
            if parser.child_named_arg(parent, id).is_ok() {
                bail!("Named argument \"{id_path}\" already registered");
            }
            let source = parser
                .get_named_arg(&clone.source, false)
                .with_context(|| format!("Source \"{}\" not found", clone.source))?;
            let group = find_group(parser, parent, clone.group_id.as_deref())?;
            let short = short_name(clone.short_name.as_deref())?;
            let long = clone.long_name.unwrap_or_default();
            require_name(&long, short)?;

            let alias = parser.add_named_arg_alias(source, id, &long, short, group)?;
            parser.named_arg_mut(alias).set_complete(clone.complete);
            parser.register_named_arg(parent, alias)?;
        }

        Element::NamedArg(named) => {
            warn_unknown(path, id_path, &named.unknown);
            if parser.child_named_arg(parent, id).is_ok() {
                bail!("Named argument \"{id_path}\" already registered");
            }
            let group = find_group(parser, parent, named.group_id.as_deref())?;
            let short = short_name(named.short_name.as_deref())?;
            let long = named.long_name.clone().unwrap_or_default();
            require_name(&long, short)?;
            check_attached(parser, path, id_path, &named.attached_named_args)?;

            let arg_id = parser.add_new_named_arg(id)?;
            let arg = parser.named_arg_mut(arg_id);
            arg.set_long_name(&long);
            if let Some(short) = short {
                arg.set_short_name(short);
            }
            if let Some(descr) = &named.descr {
                arg.set_description(descr);
            }
            arg.set_has_value(named.has_value);
            if let Some(value_help) = &named.value_help {
                arg.set_arg_value_help(value_help);
            }
            if let Some(const_value) = &named.const_value {
                arg.set_const_value(const_value);
            }
            arg.set_complete(named.complete);
            for attached in &named.attached_named_args {
                arg.attach_named_arg(&attached.id_path, attached.value.as_deref().unwrap_or(""));
            }
            if let Some(group) = group {
                parser.group_register_argument(group, arg_id)?;
            }
            parser.register_named_arg(parent, arg_id)?;
        }

        Element::Command(command) => {
            warn_unknown(path, id_path, &command.unknown);
            if parser.child_command(parent, id).is_ok() {
                bail!("Command \"{id_path}\" already registered");
            }
            let attached_command = parser
                .get_command(&command.attached_command)
                .with_context(|| {
                    format!("Attached command \"{}\" not found", command.attached_command)
                })?;
            let group = find_group(parser, parent, command.group_id.as_deref())?;
            check_attached(parser, path, id_path, &command.attached_named_args)?;

            let alias_id = parser.add_new_command_alias(id, attached_command)?;
            let alias = parser.command_mut(alias_id);
            if let Some(descr) = &command.descr {
                alias.set_description(descr);
            }
            alias.set_complete(command.complete);
            if let Some(target) = alias.alias_mut() {
                for attached in &command.attached_named_args {
                    let value = attached.value.as_deref().unwrap_or("");
                    target.attach_named_arg(&attached.id_path, value);
                }
            }
            if let Some(group) = group {
                parser.group_register_argument(group, alias_id)?;
            }
            parser.register_command(parent, alias_id)?;
        }
    }
    debug!(element = id_path, "alias element loaded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use dnf5_argparse::ArgRef;
    use dnf5_argparse::option::{self, OptionBool};

    struct Fixture {
        parser: ArgumentParser,
        installed: Rc<RefCell<OptionBool>>,
        setopts: Rc<RefCell<Vec<String>>>,
    }

    fn fixture() -> Fixture {
        let mut parser = ArgumentParser::new();
        parser.set_inherit_named_args(true);
        let root = parser.add_new_command("dnf5").unwrap();
        parser.set_root_command(root);

        let setopts = Rc::new(RefCell::new(Vec::new()));
        let sink = setopts.clone();
        let setopt = parser.add_new_named_arg("setopt").unwrap();
        let arg = parser.named_arg_mut(setopt);
        arg.set_long_name("setopt");
        arg.set_has_value(true);
        arg.set_parse_hook_func(move |_, _, _, value| {
            sink.borrow_mut().push(value.to_string());
            Ok(())
        });
        parser.register_named_arg(root, setopt).unwrap();

        let repoquery = parser.add_new_command("repoquery").unwrap();
        parser.register_command(root, repoquery).unwrap();
        let installed = option::shared(OptionBool::new(false));
        let arg_id = parser.add_new_named_arg("installed").unwrap();
        let arg = parser.named_arg_mut(arg_id);
        arg.set_long_name("installed");
        arg.set_const_value("true");
        arg.link_value(installed.clone());
        parser.register_named_arg(repoquery, arg_id).unwrap();

        Fixture {
            parser,
            installed,
            setopts,
        }
    }

    fn write(dir: &Path, name: &str, text: &str) {
        fs::write(dir.join(name), text).unwrap();
    }

    #[test]
    fn loads_every_element_type() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "50-aliases.conf",
            r#"
version = "1.0"

["repoquery.aliases"]
type = "group"
header = "Aliases:"

["repoquery.inst"]
type = "cloned_named_arg"
source = "repoquery.installed"
long_name = "inst"
group_id = "aliases"

["skip-broken"]
type = "named_arg"
long_name = "skip-broken"
descr = "Resolve depsolve problems by skipping packages"
attached_named_args = [ { id_path = "setopt", value = "skip_broken=1" } ]

["rq"]
type = "command"
attached_command = "repoquery"
descr = "Alias for repoquery"
attached_named_args = [ { id_path = "repoquery.installed" } ]
"#,
        );

        let mut f = fixture();
        let problems = load_dir(&mut f.parser, dir.path());
        assert!(problems.is_empty(), "{problems:?}");

        let repoquery = f.parser.get_command("repoquery").unwrap();
        let group = f.parser.child_group(repoquery, "aliases").unwrap();
        let inst = f.parser.get_named_arg("repoquery.inst", false).unwrap();
        assert_eq!(f.parser.group(group).header(), "Aliases:");
        assert_eq!(f.parser.group(group).arguments(), &[ArgRef::from(inst)]);
        assert!(!f.parser.named_arg(inst).complete());

        f.parser
            .parse(["dnf5", "repoquery", "--inst", "--skip-broken"])
            .unwrap();
        assert!(f.installed.borrow().value());
        assert_eq!(*f.setopts.borrow(), ["skip_broken=1"]);

        let mut g = fixture();
        assert!(load_dir(&mut g.parser, dir.path()).is_empty());
        let rq = g.parser.get_command("rq").unwrap();
        g.parser.parse(["dnf5", "rq"]).unwrap();
        assert_eq!(g.parser.selected_command(), Some(rq));
        assert_eq!(g.parser.resolve_alias(rq), g.parser.get_command("repoquery").unwrap());
        assert!(g.installed.borrow().value());
        assert!(g.setopts.borrow().is_empty());
    }

    #[test]
    fn files_load_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "20-use.conf",
            r#"
version = "1.0"
["qi"]
type = "cloned_named_arg"
source = "repoquery.installed"
long_name = "qi"
group_id = "mine"
"#,
        );
        write(
            dir.path(),
            "10-group.conf",
            "version = \"1.0\"\n[mine]\ntype = \"group\"\nheader = \"Mine:\"\n",
        );
        write(dir.path(), "30-ignored.txt", "not toml at all [");

        let mut f = fixture();
        let problems = load_dir(&mut f.parser, dir.path());
        assert!(problems.is_empty(), "{problems:?}");
        assert!(f.parser.get_named_arg("qi", false).is_ok());
    }

    #[test]
    fn bad_version_or_syntax_skips_the_file() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "a.conf",
            "version = \"2.0\"\n[x]\ntype = \"named_arg\"\nlong_name = \"x\"\n",
        );
        write(dir.path(), "b.conf", "[y]\ntype = \"named_arg\"\nlong_name = \"y\"\n");
        write(dir.path(), "c.conf", "version = \"1.0\"\n[z\n");

        let mut f = fixture();
        let problems = load_dir(&mut f.parser, dir.path());
        assert_eq!(problems.len(), 3, "{problems:?}");
        assert!(problems[0].contains("Unsupported version \"2.0\""));
        assert!(problems[1].contains("Missing attribute \"version\""));
        assert!(problems[2].contains("syntax error"));
        assert_eq!(f.parser.named_args_of(f.parser.root_command().unwrap()).len(), 1);
    }

    #[test]
    fn broken_elements_are_skipped_individually() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "aliases.conf",
            r#"
version = "1.0"

[setopt]
type = "named_arg"
long_name = "setopt2"

["nosuch.cmd"]
type = "command"
attached_command = "repoquery"

[bad-short]
type = "named_arg"
short_name = "xy"

[no-names]
type = "cloned_named_arg"
source = "setopt"

[weird]
type = "widget"

[dangling]
type = "named_arg"
long_name = "dangling"
attached_named_args = [ { id_path = "nope" } ]

[good]
type = "named_arg"
long_name = "good"
"#,
        );

        let mut f = fixture();
        let problems = load_dir(&mut f.parser, dir.path());
        assert_eq!(problems.len(), 6, "{problems:?}");
        assert!(problems[0].contains("already registered"));
        assert!(problems[1].contains("Parent command \"nosuch\" not found"));
        assert!(problems[2].contains("one character long"));
        assert!(problems[3].contains("At least one of the attributes"));
        assert!(problems[4].contains("Bad element definition"));
        assert!(problems[5].contains("Attached named argument \"nope\" not found"));

        assert!(f.parser.get_named_arg("good", false).is_ok());
        assert!(f.parser.get_named_arg("dangling", false).is_err());
    }

    #[test]
    fn missing_directory_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = fixture();
        let problems = load_cmdline_aliases(&mut f.parser, &[dir.path().join("absent")]);
        assert!(problems.is_empty());
    }
}
