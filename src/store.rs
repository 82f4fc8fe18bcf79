pub(crate) mod apng;
pub(crate) mod frame;
