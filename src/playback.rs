pub(crate) mod engine;
pub(crate) mod events;
pub(crate) mod opts;
pub(crate) mod state;
