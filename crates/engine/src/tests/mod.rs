mod hybrid_test;
mod support;
