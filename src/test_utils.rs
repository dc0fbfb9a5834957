//! Test utilities shared across test modules
//!
//! Sandboxed paths, an in-memory record store and scripted collaborators.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::path::Path;
use tempfile::TempDir;

use crate::context::Context;
use crate::error::Result;
use crate::link::{LinkCreator, SymlinkCreator};
use crate::paths::Paths;
use crate::prompt::Prompter;
use crate::settings::LinkKind;
use crate::store::MemoryStore;

/// Create a Paths struct for testing using a temporary directory
///
/// The data root lives at `<temp>/facprof` and the Factorio data directory
/// (where the active link goes) at `<temp>/factorio`.
pub fn setup_test_paths(temp_dir: &TempDir) -> Paths {
    Paths::from_base(
        temp_dir.path().join("facprof"),
        temp_dir.path().join("factorio"),
    )
}

/// Real symlinks, counting every creation
#[derive(Debug, Default)]
pub struct CountingLinks {
    created: Cell<usize>,
}

impl CountingLinks {
    pub fn count(&self) -> usize {
        self.created.get()
    }
}

impl LinkCreator for CountingLinks {
    fn create_link(&self, link: &Path, target: &Path, kind: LinkKind) -> Result<()> {
        SymlinkCreator.create_link(link, target, kind)?;
        self.created.set(self.created.get() + 1);
        Ok(())
    }
}

/// Prompter returning pre-recorded answers in order
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    choices: RefCell<VecDeque<Option<usize>>>,
    inputs: RefCell<VecDeque<Option<String>>>,
    pub asked: Cell<usize>,
}

impl ScriptedPrompter {
    pub fn choices(choices: impl IntoIterator<Item = Option<usize>>) -> Self {
        Self {
            choices: RefCell::new(choices.into_iter().collect()),
            ..Default::default()
        }
    }

    pub fn with_inputs(self, inputs: impl IntoIterator<Item = &'static str>) -> Self {
        *self.inputs.borrow_mut() = inputs.into_iter().map(|s| Some(s.to_string())).collect();
        self
    }
}

impl Prompter for ScriptedPrompter {
    fn choose(&self, _prompt: &str, _options: &[&str], _default: usize) -> Result<Option<usize>> {
        self.asked.set(self.asked.get() + 1);
        Ok(self.choices.borrow_mut().pop_front().flatten())
    }

    fn input(&self, _prompt: &str) -> Result<Option<String>> {
        Ok(self.inputs.borrow_mut().pop_front().flatten())
    }
}

/// Everything a core operation needs, rooted in a temp directory
pub struct Fixture {
    pub temp_dir: TempDir,
    pub paths: Paths,
    pub store: MemoryStore,
    pub links: CountingLinks,
}

impl Fixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let paths = setup_test_paths(&temp_dir);
        paths.ensure_dirs().expect("create data dirs");
        let store = MemoryStore::new(&paths.profiles_dir);
        Self {
            temp_dir,
            paths,
            store,
            links: CountingLinks::default(),
        }
    }

    pub fn ctx(&self) -> Context<'_> {
        Context::new(&self.paths, &self.store, &self.links)
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }
}
