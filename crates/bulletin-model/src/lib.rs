pub mod request;
pub mod response;
pub mod bulletin;

pub use request::*;
pub use response::*;
pub use bulletin::*;
