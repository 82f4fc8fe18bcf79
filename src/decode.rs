pub(crate) mod composite;
pub(crate) mod cursor;
pub(crate) mod preparer;
pub(crate) mod worker;
