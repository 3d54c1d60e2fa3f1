pub(crate) mod annotation;
pub(crate) mod layer;
pub(crate) mod raster;
