mod concurrency_tests;
mod flatten_tests;
