pub mod packages;
pub mod run;
pub mod status;
