// Domain layer: core models, uninstall stages and ports (interfaces).

pub mod model;
pub mod ports;
pub mod stage;
