//! Posts: the domain type, the paging coordinator and optimistic creation.

mod creator;
mod mediator;
mod outcome;
mod types;

#[cfg(test)]
pub mod testing;

pub use creator::PostCreator;
pub use mediator::PostsMediator;
pub use outcome::{FailureKind, LoadOutcome, LoadTrigger, PageSource};
pub use types::{Origin, Post};
