pub mod archive;
pub mod checksum;
pub mod coordinator;
pub mod fsops;
pub mod lock;
pub mod restore;
pub mod retention;
pub mod storage;
pub mod workdir;
