// Domain layer: transient check results and the ports the checks talk through.

pub mod model;
pub mod ports;
