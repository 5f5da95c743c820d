mod campaign;
mod health_check;
mod recipients;

pub use campaign::*;
pub use health_check::*;
pub use recipients::*;
