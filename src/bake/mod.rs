pub(crate) mod baker;
pub(crate) mod composite;
pub(crate) mod resample;
pub(crate) mod result;
