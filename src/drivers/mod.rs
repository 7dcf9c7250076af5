//! Pin drivers.

pub mod sysfs_gpio;
