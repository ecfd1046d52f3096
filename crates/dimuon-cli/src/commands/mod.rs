pub mod run;
pub mod split;
