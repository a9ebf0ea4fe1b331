pub mod func;
pub mod time;
