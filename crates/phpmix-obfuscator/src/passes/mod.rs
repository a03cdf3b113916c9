pub mod arithmetic;
pub mod array_access;
pub mod comment_stripper;
pub mod control_flow;
pub mod junk;
pub mod shuffle;
pub mod string_rewriter;
