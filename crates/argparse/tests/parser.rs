use std::cell::RefCell;
use std::rc::Rc;

use dnf5_argparse::option::{self, ConfigOption, OptionBool, OptionString};
use dnf5_argparse::{
    ArgCount, ArgRef, Argument, ArgumentParser, CommandId, ConflictingArg, Error, NamedArgId,
    PositionalArgId,
};

fn complete(parser: &mut ArgumentParser, argv: &[&str], idx: usize) -> String {
    let mut out = Vec::new();
    parser
        .complete_to(argv.iter().copied(), idx, &mut out)
        .unwrap();
    String::from_utf8(out).unwrap()
}

fn flag(
    parser: &mut ArgumentParser,
    cmd: CommandId,
    long: &str,
    short: Option<char>,
) -> NamedArgId {
    let id = parser.add_new_named_arg(long).unwrap();
    let arg = parser.named_arg_mut(id);
    arg.set_long_name(long);
    if let Some(short) = short {
        arg.set_short_name(short);
    }
    arg.set_const_value("true");
    parser.register_named_arg(cmd, id).unwrap();
    id
}

struct Repoquery {
    parser: ArgumentParser,
    root: CommandId,
    repoquery: CommandId,
    global_arg: NamedArgId,
    installed: NamedArgId,
    info: NamedArgId,
    keys: PositionalArgId,
    installed_option: Rc<RefCell<OptionBool>>,
    keys_values: dnf5_argparse::option::SharedValues,
    selected: Rc<RefCell<Option<CommandId>>>,
}

fn repoquery_tree() -> Repoquery {
    let mut parser = ArgumentParser::new();
    let root = parser.add_new_command("test").unwrap();
    parser
        .command_mut(root)
        .set_description("Unit test for testing ArgumentParser");
    parser.command_mut(root).set_commands_help_header("List of commands:");
    parser.command_mut(root).set_named_args_help_header("Global arguments:");
    parser.set_root_command(root);

    flag(&mut parser, root, "help", Some('h'));
    let global_arg = flag(&mut parser, root, "global_arg", None);

    let repoquery = parser.add_new_command("repoquery").unwrap();
    parser
        .command_mut(repoquery)
        .set_description("search for packages matching keyword");
    let selected = Rc::new(RefCell::new(None));
    let sink = selected.clone();
    parser.set_command_parse_hook_func(repoquery, move |_, cmd, _, _| {
        *sink.borrow_mut() = Some(cmd);
        Ok(())
    });
    parser.register_command(root, repoquery).unwrap();

    let available = flag(&mut parser, repoquery, "available", None);
    parser
        .named_arg_mut(available)
        .link_value(option::shared(OptionBool::new(true)));
    let installed = flag(&mut parser, repoquery, "installed", None);
    let installed_option = option::shared(OptionBool::new(false));
    parser
        .named_arg_mut(installed)
        .link_value(installed_option.clone());
    let info = flag(&mut parser, repoquery, "info", None);
    let nevra = flag(&mut parser, repoquery, "nevra", None);
    parser.add_conflict_argument(info, nevra);

    let keys_values = parser.add_new_values();
    let init = parser.add_init_value(OptionString::empty());
    let keys = parser
        .add_new_positional_arg(
            "keys",
            ArgCount::Unlimited,
            Some(init),
            Some(keys_values.clone()),
        )
        .unwrap();
    parser.register_positional_arg(repoquery, keys).unwrap();

    Repoquery {
        parser,
        root,
        repoquery,
        global_arg,
        installed,
        info,
        keys,
        installed_option,
        keys_values,
        selected,
    }
}

#[test]
fn ids_with_dots_are_rejected() {
    let mut parser = ArgumentParser::new();
    assert!(matches!(
        parser.add_new_command("bad.id"),
        Err(Error::ArgumentInvalidId { .. })
    ));
    assert!(matches!(
        parser.add_new_named_arg("bad.id"),
        Err(Error::ArgumentInvalidId { .. })
    ));
    assert!(matches!(
        parser.add_new_positional_arg("bad.id", ArgCount::Unlimited, None, None),
        Err(Error::ArgumentInvalidId { .. })
    ));
}

#[test]
fn path_lookup() {
    let t = repoquery_tree();
    let parser = &t.parser;

    assert_eq!(parser.root_command(), Some(t.root));
    assert_eq!(parser.get_command("repoquery").unwrap(), t.repoquery);
    assert!(parser.get_command("unknowncmd").is_err());
    assert!(parser.get_command("global_arg").is_err());

    assert_eq!(parser.get_named_arg("global_arg", false).unwrap(), t.global_arg);
    assert_eq!(parser.get_named_arg("global_arg", true).unwrap(), t.global_arg);
    assert_eq!(
        parser.get_named_arg("repoquery.installed", false).unwrap(),
        t.installed
    );
    assert!(parser.get_named_arg("repoquery.global_arg", false).is_err());
    assert_eq!(
        parser.get_named_arg("repoquery.global_arg", true).unwrap(),
        t.global_arg
    );
    assert!(parser.get_named_arg("unknowncmd.installed", true).is_err());
    assert!(parser.get_named_arg("repoquery.unknown", true).is_err());
    assert!(parser.get_named_arg("repoquery.keys", true).is_err());

    assert_eq!(parser.get_positional_arg("repoquery.keys", false).unwrap(), t.keys);
    assert_eq!(parser.get_positional_arg("repoquery.keys", true).unwrap(), t.keys);
    assert!(parser.get_positional_arg("unknowncmd.keys", true).is_err());
    assert!(parser.get_positional_arg("repoquery.installed", true).is_err());

    assert_eq!(parser.commands_of(t.root), &[t.repoquery]);
    assert_eq!(parser.named_args_of(t.root).len(), 2);
    assert!(parser.positional_args_of(t.root).is_empty());
    assert_eq!(parser.child_named_arg(t.repoquery, "info").unwrap(), t.info);
    assert!(parser.child_command(t.repoquery, "repoquery").is_err());
    assert_eq!(parser.named_arg(t.info).parse_count(), 0);
}

#[test]
fn repoquery_parses_and_selects_command() {
    let mut t = repoquery_tree();
    t.parser
        .parse(["test", "repoquery", "--installed", "--info"])
        .unwrap();
    assert_eq!(*t.selected.borrow(), Some(t.repoquery));
    assert_eq!(t.parser.selected_command(), Some(t.repoquery));
    assert!(t.installed_option.borrow().value());
}

#[test]
fn info_and_nevra_conflict() {
    let mut t = repoquery_tree();
    let err = t
        .parser
        .parse(["test", "repoquery", "--nevra", "--info"])
        .unwrap_err();
    match err {
        Error::ConflictingArguments {
            argument,
            conflicting,
        } => {
            assert_eq!(argument, "--info");
            assert_eq!(conflicting, ConflictingArg::Named("--nevra".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unlimited_positional_stores_every_value() {
    let mut t = repoquery_tree();
    t.parser
        .parse(["test", "repoquery", "--info", "abc", "def"])
        .unwrap();
    let stored = option::values_as(&t.keys_values, |opt: &OptionString| {
        opt.value().to_string()
    });
    assert_eq!(stored, ["abc", "def"]);
}

#[test]
fn positional_is_not_repeated_by_default() {
    let mut t = repoquery_tree();
    let err = t
        .parser
        .parse(["test", "repoquery", "abc", "--info", "def", "gh"])
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Unknown argument \"def\" for command \"repoquery\""
    );
}

#[test]
fn repeated_positional_collects_through_hook() {
    let mut t = repoquery_tree();
    t.parser
        .positional_arg_mut(t.keys)
        .set_nrepeats(ArgCount::Unlimited);
    let key_vals = Rc::new(RefCell::new(Vec::new()));
    let sink = key_vals.clone();
    t.parser
        .positional_arg_mut(t.keys)
        .set_parse_hook_func(move |_, _, values| {
            sink.borrow_mut().extend(values.iter().cloned());
            Ok(())
        });

    t.parser
        .parse(["test", "repoquery", "abc", "--info", "def", "gh"])
        .unwrap();
    assert_eq!(*key_vals.borrow(), ["abc", "def", "gh"]);
    assert_eq!(t.parser.positional_arg(t.keys).parse_count(), 2);
}

struct Install {
    parser: ArgumentParser,
    install: CommandId,
    assumeyes: NamedArgId,
    packages: dnf5_argparse::option::SharedValues,
}

fn install_tree() -> Install {
    let mut parser = ArgumentParser::new();
    let root = parser.add_new_command("prog").unwrap();
    parser.set_root_command(root);
    let install = parser.add_new_command("install").unwrap();
    parser.command_mut(install).set_description("Install packages");
    let remove = parser.add_new_command("remove").unwrap();
    parser.command_mut(remove).set_description("Remove packages");
    let info = parser.add_new_command("info").unwrap();
    parser.command_mut(info).set_description("Show package details");
    for cmd in [install, remove, info] {
        parser.register_command(root, cmd).unwrap();
    }

    let assumeyes = flag(&mut parser, install, "assumeyes", Some('y'));
    let packages = parser.add_new_values();
    let init = parser.add_init_value(OptionString::empty());
    let specs = parser
        .add_new_positional_arg(
            "packages",
            ArgCount::AtLeastOne,
            Some(init),
            Some(packages.clone()),
        )
        .unwrap();
    parser.register_positional_arg(install, specs).unwrap();

    Install {
        parser,
        install,
        assumeyes,
        packages,
    }
}

#[test]
fn install_with_flag_and_packages() {
    let mut t = install_tree();
    t.parser
        .parse(["prog", "install", "-y", "foo", "bar"])
        .unwrap();
    assert_eq!(t.parser.selected_command(), Some(t.install));
    assert_eq!(t.parser.named_arg(t.assumeyes).parse_count(), 1);
    let stored = option::values_as(&t.packages, |opt: &OptionString| opt.value().to_string());
    assert_eq!(stored, ["foo", "bar"]);
}

#[test]
fn install_without_packages_is_missing_a_positional() {
    let mut t = install_tree();
    let err = t.parser.parse(["prog", "install"]).unwrap_err();
    assert!(matches!(
        err,
        Error::MissingPositionalArgument { ref argument, ref command }
            if argument == "packages" && command == "install"
    ));
}

#[test]
fn at_least_one_stops_at_dash_token() {
    let mut t = install_tree();
    t.parser
        .parse(["prog", "install", "foo", "bar", "--assumeyes"])
        .unwrap();
    let stored = option::values_as(&t.packages, |opt: &OptionString| opt.value().to_string());
    assert_eq!(stored, ["foo", "bar"]);
    assert_eq!(t.parser.named_arg(t.assumeyes).parse_count(), 1);
}

#[test]
fn reset_then_reparse_gives_identical_results() {
    let mut t = install_tree();
    let calls = Rc::new(RefCell::new(0));
    let sink = calls.clone();
    t.parser
        .named_arg_mut(t.assumeyes)
        .set_parse_hook_func(move |_, _, _, _| {
            *sink.borrow_mut() += 1;
            Ok(())
        });

    let argv = ["prog", "install", "-y", "foo"];
    t.parser.parse(argv).unwrap();
    let first = (
        t.parser.named_arg(t.assumeyes).parse_count(),
        t.parser.command(t.install).parse_count(),
    );
    t.parser.reset_parse_count();
    assert_eq!(t.parser.named_arg(t.assumeyes).parse_count(), 0);
    t.parser.parse(argv).unwrap();
    let second = (
        t.parser.named_arg(t.assumeyes).parse_count(),
        t.parser.command(t.install).parse_count(),
    );
    assert_eq!(first, second);
    assert_eq!(*calls.borrow(), 2);
}

#[test]
fn later_conflicting_argument_is_reported() {
    for (first, second) in [("a", "b"), ("b", "a")] {
        let mut parser = ArgumentParser::new();
        let root = parser.add_new_command("prog").unwrap();
        parser.set_root_command(root);
        let cmd = parser.add_new_command("cmd").unwrap();
        parser.register_command(root, cmd).unwrap();
        let a = flag(&mut parser, cmd, "a", None);
        let b = flag(&mut parser, cmd, "b", None);
        parser.add_conflict_argument(a, b);

        let err = parser
            .parse(["prog", "cmd", &format!("--{first}"), &format!("--{second}")])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("\"--{second}\" not allowed together with named argument \"--{first}\"")
        );
    }
}

#[test]
fn subcommand_conflicting_with_parsed_option() {
    let mut parser = ArgumentParser::new();
    let root = parser.add_new_command("prog").unwrap();
    parser.set_root_command(root);
    let offline = flag(&mut parser, root, "offline", None);
    let install = parser.add_new_command("install").unwrap();
    parser.register_command(root, install).unwrap();
    parser.add_conflict_argument(install, offline);

    let err = parser.parse(["prog", "--offline", "install"]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "\"install\" not allowed together with named argument \"--offline\""
    );
}

#[test]
fn conflicting_container_is_rejected_with_or_without_subcommand() {
    let mut parser = ArgumentParser::new();
    let root = parser.add_new_command("prog").unwrap();
    parser.set_root_command(root);
    let x = flag(&mut parser, root, "x", None);
    let repo = parser.add_new_command("repo").unwrap();
    parser.register_command(root, repo).unwrap();
    let list = parser.add_new_command("list").unwrap();
    parser.register_command(repo, list).unwrap();
    parser.add_conflict_argument(repo, x);

    let expected = "\"repo\" not allowed together with named argument \"--x\"";
    for argv in [&["prog", "--x", "repo", "list"][..], &["prog", "--x", "repo"]] {
        parser.reset_parse_count();
        let err = parser.parse(argv.iter().copied()).unwrap_err();
        assert_eq!(err.to_string(), expected);
    }
}

#[test]
fn inherited_named_args_need_the_switch() {
    let mut parser = ArgumentParser::new();
    let root = parser.add_new_command("prog").unwrap();
    parser.set_root_command(root);
    let verbose = flag(&mut parser, root, "verbose", Some('v'));
    let install = parser.add_new_command("install").unwrap();
    parser.register_command(root, install).unwrap();

    let err = parser.parse(["prog", "install", "-v"]).unwrap_err();
    assert!(matches!(
        err,
        Error::UnknownArgument { ref command, ref argument }
            if command == "install" && argument == "-v"
    ));

    parser.reset_parse_count();
    parser.set_inherit_named_args(true);
    parser.parse(["prog", "install", "-v"]).unwrap();
    assert_eq!(parser.named_arg(verbose).parse_count(), 1);
}

#[test]
fn named_alias_behaves_like_its_source() {
    let mut parser = ArgumentParser::new();
    let root = parser.add_new_command("prog").unwrap();
    parser.set_root_command(root);
    let best = flag(&mut parser, root, "best", None);
    let nobest = flag(&mut parser, root, "no-best", None);
    parser.add_conflict_argument(best, nobest);

    let value = option::shared(OptionBool::new(false));
    let calls = Rc::new(RefCell::new(Vec::new()));
    let sink = calls.clone();
    let arg = parser.named_arg_mut(best);
    arg.link_value(value.clone());
    arg.set_description("try the best available package versions");
    arg.set_parse_hook_func(move |parser, id, _, _| {
        sink.borrow_mut().push(parser.named_arg(id).long_name().to_string());
        Ok(())
    });

    let group = parser.add_new_group("solver");
    parser.register_group(root, group).unwrap();
    let alias = parser
        .add_named_arg_alias(best, "best-alias", "prefer-best", Some('B'), Some(group))
        .unwrap();
    parser.register_named_arg(root, alias).unwrap();

    assert_eq!(parser.named_arg(alias).description(), "Alias for '--best'");
    assert!(!parser.named_arg(alias).complete());
    assert_eq!(parser.group(group).arguments(), &[ArgRef::Named(alias)]);
    assert!(parser.conflict_arguments(alias).contains(&ArgRef::Named(nobest)));

    parser.parse(["prog", "--prefer-best"]).unwrap();
    assert!(value.borrow().value());
    parser.reset_parse_count();
    parser.parse(["prog", "-B"]).unwrap();
    assert_eq!(*calls.borrow(), ["prefer-best", "prefer-best"]);

    parser.reset_parse_count();
    let err = parser.parse(["prog", "--no-best", "--prefer-best"]).unwrap_err();
    assert!(matches!(err, Error::ConflictingArguments { .. }));

    parser.reset_parse_count();
    parser.set_complete_add_description(false);
    assert_eq!(complete(&mut parser, &["prog", "--"], 1), "--best\n--no-best\n");
}

#[test]
fn attached_named_args_substitute_the_value() {
    let mut parser = ArgumentParser::new();
    let root = parser.add_new_command("prog").unwrap();
    parser.set_root_command(root);

    let setopt = flag(&mut parser, root, "setopt", None);
    parser.named_arg_mut(setopt).set_has_value(true);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    parser
        .named_arg_mut(setopt)
        .set_parse_hook_func(move |_, _, option, value| {
            sink.borrow_mut().push((option.to_string(), value.to_string()));
            Ok(())
        });

    let skip = flag(&mut parser, root, "skip", Some('s'));
    parser.named_arg_mut(skip).set_has_value(true);
    parser
        .named_arg_mut(skip)
        .attach_named_arg("setopt", "excludepkgs=${}");

    parser.parse(["prog", "--skip", "kernel"]).unwrap();
    parser.reset_parse_count();
    parser.parse(["prog", "-s", "glibc"]).unwrap();

    assert_eq!(
        *seen.borrow(),
        [
            (
                "skip=excludepkgs=kernel".to_string(),
                "excludepkgs=kernel".to_string()
            ),
            ("s".to_string(), "excludepkgs=glibc".to_string()),
        ]
    );
}

#[test]
fn command_alias_injects_attached_args_and_runs_target_hook() {
    let mut parser = ArgumentParser::new();
    let root = parser.add_new_command("prog").unwrap();
    parser.set_root_command(root);
    let refresh = flag(&mut parser, root, "refresh", None);
    let refresh_value = option::shared(OptionBool::new(false));
    parser
        .named_arg_mut(refresh)
        .link_value(refresh_value.clone());

    let upgrade = parser.add_new_command("upgrade").unwrap();
    parser.register_command(root, upgrade).unwrap();
    let specs = parser
        .add_new_positional_arg("specs", ArgCount::Unlimited, None, None)
        .unwrap();
    parser.register_positional_arg(upgrade, specs).unwrap();
    let hooked = Rc::new(RefCell::new(Vec::new()));
    let sink = hooked.clone();
    parser.set_command_parse_hook_func(upgrade, move |_, cmd, option, argv| {
        sink.borrow_mut().push((cmd, option.to_string(), argv.len()));
        Ok(())
    });

    let update = parser.add_new_command_alias("update", upgrade).unwrap();
    parser
        .command_mut(update)
        .alias_mut()
        .unwrap()
        .attach_named_arg("refresh", "");
    parser.command_mut(update).set_complete(false);
    parser.register_command(root, update).unwrap();

    parser.parse(["prog", "update", "vim"]).unwrap();
    assert_eq!(parser.selected_command(), Some(update));
    assert_eq!(parser.resolve_alias(update), upgrade);
    assert!(refresh_value.borrow().value());
    assert_eq!(parser.positional_arg(specs).parse_count(), 1);
    assert_eq!(*hooked.borrow(), [(upgrade, "update".to_string(), 2)]);
    assert_eq!(parser.invocation(update), ["prog", "upgrade"]);

    // hidden from completion
    parser.reset_parse_count();
    assert_eq!(complete(&mut parser, &["prog", "up"], 1), "upgrade \n");
}

#[test]
fn missing_command_names_the_invocation() {
    let mut parser = ArgumentParser::new();
    let root = parser.add_new_command("dnf5").unwrap();
    parser.set_root_command(root);
    let repo = parser.add_new_command("repo").unwrap();
    parser.register_command(root, repo).unwrap();
    parser.set_command_parse_hook_func(repo, |parser, cmd, _, _| {
        if parser.selected_command() == Some(cmd) {
            return Err(parser.missing_command_error(cmd));
        }
        Ok(())
    });

    let err = parser.parse(["dnf5", "repo"]).unwrap_err();
    assert_eq!(err.to_string(), "Missing command for \"dnf5 repo\"");
}

#[test]
fn prefilled_values_take_one_token_each() {
    let mut parser = ArgumentParser::new();
    let root = parser.add_new_command("prog").unwrap();
    parser.set_root_command(root);
    let resize = parser.add_new_command("resize").unwrap();
    parser.register_command(root, resize).unwrap();

    let prefilled: Vec<Box<dyn ConfigOption>> = vec![
        Box::new(OptionString::empty()),
        Box::new(option::OptionNumber::with_range(1, 1, 100)),
    ];
    let values = parser.add_values(prefilled);
    let arg = parser
        .add_new_positional_arg_with_values("volume", values.clone())
        .unwrap();
    assert_eq!(parser.positional_arg(arg).nvals(), ArgCount::Exactly(2));
    parser.register_positional_arg(resize, arg).unwrap();

    parser.parse(["prog", "resize", "home", "42"]).unwrap();
    let stored: Vec<String> = values.borrow().iter().map(|v| v.value_string()).collect();
    assert_eq!(stored, ["home", "42"]);

    parser.reset_parse_count();
    let err = parser.parse(["prog", "resize", "home", "500"]).unwrap_err();
    assert!(matches!(err, Error::InvalidValue { ref argument, .. } if argument == "volume"));

    parser.reset_parse_count();
    let err = parser.parse(["prog", "resize", "home"]).unwrap_err();
    assert!(matches!(err, Error::PositionalArgumentFewValues { .. }));

    let empty = parser.add_new_values();
    assert!(matches!(
        parser.add_new_positional_arg_with_values("nothing", empty),
        Err(Error::InvalidPositionalArgument { .. })
    ));
}

fn optional_then_required() -> (ArgumentParser, PositionalArgId, PositionalArgId) {
    let mut parser = ArgumentParser::new();
    let root = parser.add_new_command("prog").unwrap();
    parser.set_root_command(root);
    let a = parser
        .add_new_positional_arg("a", ArgCount::Optional, None, None)
        .unwrap();
    parser.register_positional_arg(root, a).unwrap();
    let b = parser
        .add_new_positional_arg("b", ArgCount::Exactly(1), None, None)
        .unwrap();
    parser.register_positional_arg(root, b).unwrap();
    (parser, a, b)
}

#[test]
fn optional_positional_moves_on_after_one_token() {
    let (mut parser, a, b) = optional_then_required();
    parser.parse(["prog", "x", "y"]).unwrap();
    assert_eq!(parser.positional_arg(a).parse_count(), 1);
    assert_eq!(parser.positional_arg(b).parse_count(), 1);

    let (mut parser, _, _) = optional_then_required();
    let err = parser.parse(["prog", "x"]).unwrap_err();
    assert!(
        matches!(err, Error::MissingPositionalArgument { ref argument, .. } if argument == "b"),
        "{err}"
    );

    let (mut parser, _, _) = optional_then_required();
    let err = parser.parse(["prog", "x", "y", "z"]).unwrap_err();
    assert!(
        matches!(err, Error::UnknownArgument { ref argument, .. } if argument == "z"),
        "{err}"
    );
}

#[test]
fn optional_positionals_may_be_absent() {
    let mut parser = ArgumentParser::new();
    let root = parser.add_new_command("prog").unwrap();
    parser.set_root_command(root);
    let maybe = parser
        .add_new_positional_arg("maybe", ArgCount::Optional, None, None)
        .unwrap();
    parser.register_positional_arg(root, maybe).unwrap();
    let once = parser
        .add_new_positional_arg("once", ArgCount::Exactly(1), None, None)
        .unwrap();
    parser.positional_arg_mut(once).set_nrepeats(ArgCount::Optional);
    parser.register_positional_arg(root, once).unwrap();

    parser.parse(["prog"]).unwrap();
    assert_eq!(parser.positional_arg(maybe).parse_count(), 0);
    assert_eq!(parser.positional_arg(once).parse_count(), 0);

    parser.reset_parse_count();
    parser.parse(["prog", "x", "y"]).unwrap();
    assert_eq!(parser.positional_arg(maybe).parse_count(), 1);
    assert_eq!(parser.positional_arg(once).parse_count(), 1);

    parser.reset_parse_count();
    assert!(matches!(
        parser.parse(["prog", "x", "y", "z"]),
        Err(Error::UnknownArgument { .. })
    ));
}

#[test]
fn user_data_is_visible_to_hooks() {
    let mut parser = ArgumentParser::new();
    let root = parser.add_new_command("prog").unwrap();
    parser.set_root_command(root);
    let repo = flag(&mut parser, root, "fedora", None);

    let seen = Rc::new(RefCell::new(None));
    let sink = seen.clone();
    let arg = parser.named_arg_mut(repo);
    arg.set_user_data(Rc::new(String::from("Fedora 40")));
    arg.set_parse_hook_func(move |parser, id, _, _| {
        let name = parser
            .named_arg(id)
            .user_data()
            .and_then(|data| data.downcast_ref::<String>())
            .cloned();
        *sink.borrow_mut() = name;
        Ok(())
    });

    parser.parse(["prog", "--fedora"]).unwrap();
    assert_eq!(seen.borrow().as_deref(), Some("Fedora 40"));
}

#[test]
fn parse_without_root_fails() {
    let mut parser = ArgumentParser::new();
    assert!(matches!(
        parser.parse(["prog"]),
        Err(Error::RootCommandNotSet)
    ));
}

mod completion {
    use super::*;

    #[test]
    fn ambiguous_prefix_lists_both_commands() {
        let mut t = install_tree();
        assert_eq!(
            complete(&mut t.parser, &["prog", "in"], 1),
            "install  (Install packages)\ninfo     (Show package details)\n"
        );

        t.parser.set_complete_add_description(false);
        assert_eq!(complete(&mut t.parser, &["prog", "in"], 1), "install\ninfo\n");
    }

    #[test]
    fn unique_prefix_completes_with_trailing_space() {
        let mut t = install_tree();
        assert_eq!(complete(&mut t.parser, &["prog", "inst"], 1), "install \n");
    }

    #[test]
    fn complete_word_prints_nothing_more() {
        let mut t = install_tree();
        assert_eq!(complete(&mut t.parser, &["prog", "install "], 1), "");
    }

    #[test]
    fn named_args_complete_with_value_marker() {
        let mut parser = ArgumentParser::new();
        let root = parser.add_new_command("prog").unwrap();
        parser.set_root_command(root);
        flag(&mut parser, root, "assumeyes", Some('y'));
        let installroot = flag(&mut parser, root, "installroot", None);
        parser.named_arg_mut(installroot).set_has_value(true);
        parser
            .named_arg_mut(installroot)
            .set_arg_value_help("ABSOLUTE_PATH");

        assert_eq!(complete(&mut parser, &["prog", "--ins"], 1), "--installroot=\n");
        assert_eq!(complete(&mut parser, &["prog", "--assu"], 1), "--assumeyes \n");
        assert_eq!(complete(&mut parser, &["prog", "-y"], 1), "-y \n");
        assert_eq!(
            complete(&mut parser, &["prog", "--"], 1),
            format!(
                "{:27}  ()\n--installroot=ABSOLUTE_PATH  ()\n",
                "--assumeyes"
            )
        );
    }

    #[test]
    fn errors_before_the_target_are_swallowed() {
        let mut t = install_tree();
        assert_eq!(
            complete(&mut t.parser, &["prog", "--bogus", "inst"], 2),
            ""
        );
        // the parser stays usable afterwards
        t.parser.reset_parse_count();
        t.parser.parse(["prog", "install", "foo"]).unwrap();
    }

    #[test]
    fn nested_command_completion() {
        let mut t = install_tree();
        assert_eq!(
            complete(&mut t.parser, &["prog", "install", "-"], 2),
            format!("{:11}  ()\n--assumeyes  ()\n", "-y")
        );
    }
}
