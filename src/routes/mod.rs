pub mod table;

pub use table::{RouteKey, RouteTable};
