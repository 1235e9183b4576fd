pub mod dispatcher;
pub mod outcome;
pub mod retry;

pub use dispatcher::Dispatcher;
