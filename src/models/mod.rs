pub mod observation;
pub mod schema;

pub use observation::*;
pub use schema::*;
