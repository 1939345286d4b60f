pub mod ids;
pub mod order;
pub mod product;
pub mod status;
pub mod user;
pub mod warehouse;

pub use ids::*;
pub use order::*;
pub use product::*;
pub use status::*;
pub use user::*;
pub use warehouse::*;
