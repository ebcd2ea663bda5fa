pub mod constants;
pub mod prog_utils;
