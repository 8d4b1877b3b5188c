pub(crate) mod auth;
pub(crate) mod errors;
pub(crate) mod extract;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod router;
pub(crate) mod tasks;
pub(crate) mod upload;
pub(crate) mod users;
pub(crate) mod validation;
