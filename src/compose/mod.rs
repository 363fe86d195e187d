pub(crate) mod book;
pub(crate) mod layer;
pub(crate) mod mosaic;
pub(crate) mod pipeline;
pub(crate) mod recipe;
pub(crate) mod watermark;
