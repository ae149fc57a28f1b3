//! File Persistence - JSONL Journal and Atomic State Snapshots

pub mod journal;
pub mod repository_impl;
pub mod snapshot;

pub use repository_impl::FileRepository;
