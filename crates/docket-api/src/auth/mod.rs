pub mod session;

pub use session::{
    Identity, JwtSessionResolver, SessionClaims, SessionContext, SessionResolver,
    ACCESS_TOKEN_COOKIE, ID_TOKEN_COOKIE, ID_TOKEN_HEADER,
};
