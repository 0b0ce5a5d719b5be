mod composition_tests;
mod dispatch_tests;
mod sandbox_tests;
