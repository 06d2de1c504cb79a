pub(crate) mod fonts;
pub(crate) mod pending;
pub(crate) mod raster;
