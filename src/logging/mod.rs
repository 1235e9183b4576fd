pub mod dispatch_logger;

pub use dispatch_logger::DispatchLogger;
