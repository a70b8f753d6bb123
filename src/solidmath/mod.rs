pub mod fixed_point;
pub mod full_math;

pub use primitive_types::U256;
