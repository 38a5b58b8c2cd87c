// Handlers are organized by security tier:
// public (no auth) -> protected (bearer token) -> restricted (bearer token + global-role checks)
pub mod protected;
pub mod public;
pub mod restricted;
