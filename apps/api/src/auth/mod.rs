// Authentication primitives: tokens, password hashing, Google sign-in

pub mod google;
pub mod jwt;
pub mod password;
