pub mod models;
pub mod run;
