//! Business logic services.
//!
//! # Services
//!
//! - `accounts` - Registration, confirmation, login and password reset
//! - `email` - Outbound email gateway (SMTP, disabled, recording)
//! - `password` - Argon2id credential hashing
//! - `token` - Signed bearer tokens

pub mod accounts;
pub mod email;
pub mod password;
pub mod token;

pub use accounts::{AccountError, AccountService, AccountSettings};
pub use email::{DisabledEmailGateway, EmailGateway, SmtpEmailGateway, TransportError};
pub use password::{CredentialHasher, HashError};
pub use token::{Claims, TokenError, TokenIssuer};
