pub(crate) mod display;
pub(crate) mod driver;
