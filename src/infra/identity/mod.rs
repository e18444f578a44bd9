pub mod jwt_identity;
