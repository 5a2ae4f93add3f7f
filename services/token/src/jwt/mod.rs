pub mod claims;
pub mod issuer;
pub mod serializer;

pub use claims::{TokenClaims, ACCESS_TOKEN_TTL};
pub use issuer::{IssuedToken, TokenIssuer};
pub use serializer::JwtSerializer;
