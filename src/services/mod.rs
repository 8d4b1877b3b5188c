pub(crate) mod credentials;
pub(crate) mod storage;
pub(crate) mod submissions;
pub(crate) mod tasks;
