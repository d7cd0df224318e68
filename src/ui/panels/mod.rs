pub mod bottom;
pub mod central;
pub mod top;
