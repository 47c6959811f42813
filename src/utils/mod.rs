pub mod linalg;
pub mod mvn;
pub mod plot;
pub mod state;
