pub mod native_iterator;
