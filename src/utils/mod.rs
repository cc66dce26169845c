pub mod debounce;
pub mod id;

pub use debounce::Debouncer;
pub use id::make_id;
