use std::cell::RefCell;
use std::rc::Rc;

use dnf5_argparse::ArgumentParser;

use crate::config::ConfigMain;

/// State shared by argument hooks and command actions.
pub struct Context {
    pub parser: ArgumentParser,
    pub config: ConfigMain,
    /// `--setopt` values with a `REPO_ID.` prefix, applied when repositories load.
    pub repo_setopts: Rc<RefCell<Vec<(String, String)>>>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    pub fn new() -> Self {
        let mut parser = ArgumentParser::new();
        parser.set_inherit_named_args(true);
        Self {
            parser,
            config: ConfigMain::new(),
            repo_setopts: Rc::new(RefCell::new(Vec::new())),
        }
    }
}
