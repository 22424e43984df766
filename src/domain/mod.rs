// Domain layer: models, ports and the pure seat-chart rules. No I/O here.

pub mod decoder;
pub mod model;
pub mod ports;
pub mod schema;
pub mod template;
