use crate::link::LinkCreator;
use crate::paths::Paths;
use crate::store::RecordStore;

/// Collaborators every profile operation works against
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub paths: &'a Paths,
    pub store: &'a dyn RecordStore,
    pub links: &'a dyn LinkCreator,
}

impl<'a> Context<'a> {
    pub fn new(paths: &'a Paths, store: &'a dyn RecordStore, links: &'a dyn LinkCreator) -> Self {
        Self {
            paths,
            store,
            links,
        }
    }
}
