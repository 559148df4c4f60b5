pub mod analytics;
pub mod annotations;
pub mod covid;
pub mod eda;
pub mod warehouse;
