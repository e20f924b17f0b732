pub mod persistence;
pub mod secrets;
pub mod silence;
