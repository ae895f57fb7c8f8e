//! Authentication and authorization
//!
//! - `password`: Argon2id hashing and the `CredentialHasher` capability
//! - `jwt`: HS256 access tokens carrying the user id
//! - `policy`: pure role/ownership decisions over an [`policy::Actor`]

pub mod jwt;
pub mod password;
pub mod policy;

pub use policy::Actor;
