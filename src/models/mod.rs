pub mod annotation;
pub mod forecast;
pub mod mobility;
pub mod record;
pub mod series;

pub use annotation::*;
pub use forecast::*;
pub use mobility::*;
pub use record::*;
pub use series::*;
