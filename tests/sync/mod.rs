// Test module entry point for sync tests
// Pull, push, explicit transfers and ignore rules against mock and local stores


mod ignore_tests;
mod local_store_tests;
mod push_tests;
