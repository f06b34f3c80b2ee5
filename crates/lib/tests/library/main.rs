mod common;
mod compile_tests;
mod ordering_tests;
