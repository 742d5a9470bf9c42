// Domain logic modules
pub mod email;
pub mod pdf;
pub mod summarize;
