//! Command dispatch for lock operations

mod dispatcher;

pub use dispatcher::{
    CommandDispatcher, DispatchError, DispatchHandle, DispatcherConfig, Operation,
};
