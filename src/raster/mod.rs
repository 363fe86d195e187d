pub(crate) mod buffer;
pub(crate) mod color;
pub(crate) mod composite;
