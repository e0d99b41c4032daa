pub mod evaluate;
pub mod interpret;
pub mod rules;
pub mod samples;
