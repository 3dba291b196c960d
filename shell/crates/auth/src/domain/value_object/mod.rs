pub mod access_token;
pub mod cookie_scope;
pub mod email;
pub mod user_role;
