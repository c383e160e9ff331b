// Not every helper is used by every test binary
#![allow(unused_imports, dead_code)]

mod test_setup;
pub use test_setup::*;
